pub mod chat;
pub mod health;
pub mod plants;
pub mod scan;
