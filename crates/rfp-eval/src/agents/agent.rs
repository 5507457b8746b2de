use tracing::debug;

use crate::errors::{EvalError, EvalResult};
use crate::models::agent_role::AgentRole;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::providers::base::{CompletionOptions, Provider};

/// One evaluation role bound to its composed instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationAgent {
    role: AgentRole,
    instructions: String,
}

impl EvaluationAgent {
    pub fn new(role: AgentRole, instructions: impl Into<String>) -> Self {
        Self {
            role,
            instructions: instructions.into(),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn name(&self) -> String {
        self.role.to_string()
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Produce this agent's next turn. The instructions are the system prompt and
    /// `history` is the conversation as the agent should see it.
    pub async fn respond(
        &self,
        provider: &dyn Provider,
        history: &[Message],
    ) -> EvalResult<Message> {
        debug!(agent = %self.role, history = history.len(), "Agent responding");
        let (reply, usage) = provider
            .complete(&self.instructions, history, &CompletionOptions::default())
            .await
            .map_err(|e| EvalError::Service(format!("{} failed to respond: {}", self.role, e)))?;
        debug!(agent = %self.role, ?usage, "Agent responded");

        Ok(Message {
            role: Role::Assistant,
            ..reply
        }
        .with_name(self.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    #[tokio::test]
    async fn test_respond_names_the_reply() {
        let provider = MockProvider::with_texts(&["Meets 9 of 12 requirements."]);
        let agent = EvaluationAgent::new(AgentRole::RfpCompliance, "Compare RFP and proposal");
        let history = vec![Message::user().with_text("Evaluate the proposal")];

        let reply = agent.respond(&provider, &history).await.unwrap();
        assert_eq!(reply.text(), "Meets 9 of 12 requirements.");
        assert_eq!(reply.speaker(), Some(AgentRole::RfpCompliance));
        assert_eq!(reply.role, Role::Assistant);

        let calls = provider.calls();
        assert_eq!(calls[0].system, "Compare RFP and proposal");
        assert_eq!(calls[0].messages, history);
    }

    #[tokio::test]
    async fn test_provider_failure_is_service_error() {
        let provider = MockProvider::with_results(vec![Err("timeout".to_string())]);
        let agent = EvaluationAgent::new(AgentRole::LegalCompliance, "Check policies");

        let err = agent.respond(&provider, &[]).await.unwrap_err();
        assert!(matches!(err, EvalError::Service(_)));
        assert!(err.to_string().contains("LegalCompliance failed to respond"));
    }
}
