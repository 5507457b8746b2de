//! These models represent the objects passed around by the evaluation pipeline
//!
//! There are a few related formats we need to interact with:
//! - transcript messages, exchanged between the user and the evaluation agents
//! - openai chat messages, sent from an agent to the completion endpoint
//! - persisted document summaries, written once per uploaded document
//!
//! We always convert external formats into these internal structs at the edge,
//! so the orchestration never touches raw JSON.
pub mod agent_role;
pub mod message;
pub mod role;
pub mod summary;
