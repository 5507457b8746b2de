pub mod analyze;
pub mod chat;
pub mod compare;
pub mod summarize;
