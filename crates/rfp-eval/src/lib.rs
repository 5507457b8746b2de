pub mod agents;
pub mod chunker;
pub mod document;
pub mod errors;
pub mod insights;
pub mod models;
pub mod orchestration;
pub mod prompt_template;
pub mod providers;
pub mod report;
pub mod search;
pub mod session;
pub mod summarizer;
pub mod token_counter;
