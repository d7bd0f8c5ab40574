pub mod chat;
pub mod plants;
pub mod scan;

pub use chat::*;
pub use plants::*;
pub use scan::*;
