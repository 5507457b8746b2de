//! The multi-agent turn loop.
//!
//! A group chat first runs every evaluation role once in the fixed order, then routes
//! follow-up questions by topic. Who has spoken is tracked explicitly in
//! [`TurnState`], independent of how much history the prompts get to see.
mod group_chat;
mod history;
mod selection;
mod termination;
mod turn;

pub use group_chat::GroupChat;
pub use history::{HistoryReducer, DEFAULT_HISTORY_WINDOW};
pub use selection::{KeywordClassifier, PromptClassifier, SelectionStrategy, TopicClassifier};
pub use termination::{
    CompletionJudge, KeywordJudge, PromptJudge, TerminationStrategy, DEFAULT_MAXIMUM_ITERATIONS,
};
pub use turn::{LoopState, SpokenSet, TurnState};
