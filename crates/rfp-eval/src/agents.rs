mod agent;
mod registry;

pub use agent::EvaluationAgent;
pub use registry::{AgentContext, AgentPrompts, AgentRegistry};
