use super::agent_role::AgentRole;
use super::role::Role;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message in the evaluation transcript, either from the user or from one of the agents
pub struct Message {
    pub role: Role,
    /// The agent that produced this message, unset for user input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<AgentRole>,
    pub created: i64,
    pub content: String,
}

impl Message {
    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Message {
            role: Role::User,
            name: None,
            created: Utc::now().timestamp(),
            content: String::new(),
        }
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            name: None,
            created: Utc::now().timestamp(),
            content: String::new(),
        }
    }

    /// Append text content to the message
    pub fn with_text<S: AsRef<str>>(mut self, text: S) -> Self {
        self.content.push_str(text.as_ref());
        self
    }

    /// Attribute the message to an agent
    pub fn with_name(mut self, agent: AgentRole) -> Self {
        self.name = Some(agent);
        self
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// The agent that spoke this message, if any
    pub fn speaker(&self) -> Option<AgentRole> {
        self.name
    }

    /// Transcript label: `user` or the agent's display name
    pub fn author(&self) -> String {
        match self.name {
            Some(agent) => agent.to_string(),
            None => match self.role {
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
        }
    }
}
