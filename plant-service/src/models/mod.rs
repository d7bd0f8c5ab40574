pub mod plant;

pub use plant::{ConversationTurn, PlantRecord, Role};
