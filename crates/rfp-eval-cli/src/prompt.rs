use anyhow::Result;
use rfp_eval::models::message::Message;

pub mod rustyline;

pub trait Prompt {
    /// Show an agent reply
    fn render(&mut self, message: &Message);
    /// Show a status line that is not part of the conversation
    fn notify(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&self);
    fn close(&self);
    fn ready(&self) {
        println!("Ready! Type your input, or 'exit' to quit.");
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Only set for messages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Nothing to send, prompt again
    Message,  // User sent a message
    Reset,    // User wants a fresh conversation
    Exit,     // User wants to exit the session
}

impl Input {
    pub fn of(input_type: InputType) -> Self {
        Self {
            input_type,
            content: None,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            input_type: InputType::Message,
            content: Some(text.into()),
        }
    }
}
