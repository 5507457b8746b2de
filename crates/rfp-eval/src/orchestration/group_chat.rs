use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{error, info};

use super::history::HistoryReducer;
use super::selection::SelectionStrategy;
use super::termination::TerminationStrategy;
use super::turn::{LoopState, TurnState};
use crate::agents::AgentRegistry;
use crate::errors::{EvalError, EvalResult};
use crate::models::message::Message;
use crate::providers::base::Provider;

/// A conversation between the user and the evaluation agents.
///
/// Each [`invoke`](GroupChat::invoke) runs agent turns until the termination strategy
/// stops it. The full transcript is kept; prompts only see the reduced window.
pub struct GroupChat {
    provider: Arc<dyn Provider>,
    registry: AgentRegistry,
    selection: SelectionStrategy,
    termination: TerminationStrategy,
    reducer: HistoryReducer,
    transcript: Vec<Message>,
    turn: TurnState,
    state: LoopState,
}

impl GroupChat {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: AgentRegistry,
        selection: SelectionStrategy,
        termination: TerminationStrategy,
        reducer: HistoryReducer,
    ) -> EvalResult<Self> {
        let missing = registry.missing_roles();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|role| role.to_string()).collect();
            return Err(EvalError::Configuration(format!(
                "Agents missing from the registry: {}",
                names.join(", ")
            )));
        }

        Ok(Self {
            provider,
            registry,
            selection,
            termination,
            reducer,
            transcript: Vec::new(),
            turn: TurnState::default(),
            state: LoopState::Idle,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.turn
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn add_user_message(&mut self, text: impl AsRef<str>) {
        self.transcript.push(Message::user().with_text(text));
        if self.state == LoopState::Idle {
            self.state = LoopState::AwaitingUserInput;
        }
    }

    /// Settle the loop after an invocation stream was dropped before it finished.
    /// Replies already yielded stay in the transcript.
    pub fn interrupt(&mut self) {
        self.state = if self.transcript.is_empty() {
            LoopState::Idle
        } else {
            LoopState::AwaitingUserInput
        };
    }

    /// Forget the conversation, including which agents have spoken
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.turn = TurnState::default();
        self.state = LoopState::Idle;
    }

    /// Run agent turns for the pending user message, yielding each reply once it is
    /// part of the transcript. A failed turn ends the stream with the error; replies
    /// already yielded stay in the transcript.
    pub fn invoke(&mut self) -> BoxStream<'_, EvalResult<Message>> {
        Box::pin(async_stream::stream! {
            if self.transcript.is_empty() {
                yield Err(EvalError::Configuration(
                    "Add a user message before invoking the chat".to_string(),
                ));
            } else {
                self.turn.turns_taken = 0;
                loop {
                    let reply = match self.take_turn().await {
                        Ok(reply) => reply,
                        Err(e) => {
                            error!("Agent turn failed: {}", e);
                            self.state = LoopState::AwaitingUserInput;
                            yield Err(e);
                            break;
                        }
                    };
                    yield Ok(reply.clone());

                    // Let the consumer render the reply before the next model call
                    tokio::task::yield_now().await;

                    match self.check_termination(&reply).await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => {
                            error!("Termination check failed: {}", e);
                            self.state = LoopState::AwaitingUserInput;
                            yield Err(e);
                            break;
                        }
                    }
                }
            }
            self.state = LoopState::AwaitingUserInput;
        })
    }

    async fn take_turn(&mut self) -> EvalResult<Message> {
        self.state = LoopState::SelectingAgent;
        let history = self.reducer.reduce(&self.transcript);
        let last = self
            .transcript
            .last()
            .ok_or_else(|| EvalError::Configuration("The transcript is empty".to_string()))?;

        let role = self
            .selection
            .select_next(last, self.turn.spoken, history)
            .await;
        let agent = self.registry.get(role).ok_or_else(|| {
            EvalError::Configuration(format!("No agent registered for {}", role))
        })?;

        self.state = LoopState::AgentResponding;
        info!("{} is responding", role);
        let reply = agent.respond(self.provider.as_ref(), history).await?;

        self.transcript.push(reply.clone());
        self.turn.record(role);
        Ok(reply)
    }

    async fn check_termination(&mut self, reply: &Message) -> EvalResult<bool> {
        self.state = LoopState::CheckingTermination;
        let history = self.reducer.reduce(&self.transcript);
        let done = self
            .termination
            .should_terminate(reply, self.turn.turns_taken, history)
            .await?;
        if done {
            info!("Invocation complete after {} turns", self.turn.turns_taken);
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentContext, AgentPrompts};
    use crate::models::agent_role::AgentRole;
    use crate::models::summary::ProposalSummary;
    use crate::providers::mock::MockProvider;
    use futures::StreamExt;
    use strum::IntoEnumIterator;

    const PROMPTS: &str = r#"{
        "rfp_compliance": "You are {{ rfp_compliance }}.",
        "legal_compliance": "You are {{ legal_compliance }}.",
        "vendor_evaluation": "You are {{ vendor_evaluation }}.",
        "market_intelligence": "You are {{ market_intelligence }}.",
        "negotiation_strategy": "You are {{ negotiation_strategy }}.",
        "evaluation_report": "You are {{ evaluation_report }}."
    }"#;

    fn registry(prompts: &str) -> AgentRegistry {
        let context = AgentContext {
            rfp_summary: "RFP".into(),
            proposal: ProposalSummary {
                vendor_name: "Contoso".into(),
                legal_summary: "SOC 2".into(),
                overall_summary: "Hosting".into(),
            },
            policy_context: "Policies".into(),
            vendor_insights: "History".into(),
            market_insights: "Market".into(),
        };
        AgentRegistry::build(&AgentPrompts::from_template(prompts), &context)
    }

    fn chat(provider: Arc<MockProvider>, window: usize) -> GroupChat {
        GroupChat::new(
            provider,
            registry(PROMPTS),
            SelectionStrategy::default(),
            TerminationStrategy::default(),
            HistoryReducer::new(window),
        )
        .unwrap()
    }

    async fn invoke(chat: &mut GroupChat) -> Vec<EvalResult<Message>> {
        chat.invoke().collect().await
    }

    fn speakers(replies: &[EvalResult<Message>]) -> Vec<AgentRole> {
        replies
            .iter()
            .filter_map(|r| r.as_ref().ok().and_then(|m| m.speaker()))
            .collect()
    }

    #[test]
    fn test_incomplete_registry_is_rejected() {
        let result = GroupChat::new(
            Arc::new(MockProvider::with_texts(&[])),
            registry(r#"{"rfp_compliance": "Check."}"#),
            SelectionStrategy::default(),
            TerminationStrategy::default(),
            HistoryReducer::default(),
        );
        match result {
            Err(EvalError::Configuration(message)) => {
                assert!(message.contains("LegalCompliance"));
                assert!(message.contains("EvaluationReport"));
            }
            _ => panic!("expected configuration error"),
        }
    }

    #[tokio::test]
    async fn test_initial_evaluation_runs_every_agent_once() {
        let provider = Arc::new(MockProvider::with_texts(&[
            "rfp", "legal", "vendor", "market", "negotiation", "report",
        ]));
        let mut chat = chat(provider.clone(), 10);
        assert_eq!(chat.state(), LoopState::Idle);

        chat.add_user_message("Evaluate the Contoso proposal");
        assert_eq!(chat.state(), LoopState::AwaitingUserInput);
        let replies = invoke(&mut chat).await;

        assert_eq!(speakers(&replies), AgentRole::iter().collect::<Vec<_>>());
        assert_eq!(chat.transcript().len(), 7);
        assert_eq!(chat.transcript()[6].text(), "report");
        assert!(chat.turn_state().spoken.is_complete());
        assert_eq!(chat.turn_state().turns_taken, 6);
        assert_eq!(chat.state(), LoopState::AwaitingUserInput);

        let calls = provider.calls();
        assert_eq!(
            calls[0].system,
            "You are RFPCompliance.\n\n### RFP Summary:\nRFP\n### Proposal Summary:\nHosting"
        );
        assert_eq!(calls[0].messages.len(), 1);
        // each agent sees the replies before it
        assert_eq!(calls[5].messages.len(), 6);
        assert_eq!(calls[5].messages[5].speaker(), Some(AgentRole::NegotiationStrategy));
    }

    #[tokio::test]
    async fn test_follow_up_routes_by_topic() {
        let provider = Arc::new(MockProvider::with_texts(&[
            "rfp",
            "legal",
            "vendor",
            "market",
            "negotiation",
            "report",
            "Two gaps remain.",
            "## Final Recommendation\nAward with conditions",
        ]));
        let mut chat = chat(provider, 10);
        chat.add_user_message("Evaluate");
        invoke(&mut chat).await;

        chat.add_user_message("Are there any compliance issues?");
        let replies = invoke(&mut chat).await;

        assert_eq!(
            speakers(&replies),
            vec![AgentRole::LegalCompliance, AgentRole::EvaluationReport]
        );
        assert_eq!(chat.turn_state().turns_taken, 2);
        assert_eq!(chat.transcript().len(), 10);
    }

    #[tokio::test]
    async fn test_history_window_bounds_prompts() {
        let provider = Arc::new(MockProvider::with_texts(&[]));
        let mut chat = chat(provider.clone(), 3);
        chat.add_user_message("Evaluate");
        invoke(&mut chat).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls.iter().all(|call| call.messages.len() <= 3));
        // the sequence still completes although early turns left the window
        assert!(chat.turn_state().spoken.is_complete());
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_transcript() {
        let provider = Arc::new(MockProvider::with_results(vec![
            Ok(Message::assistant().with_text("rfp")),
            Err("deployment unavailable".to_string()),
            Ok(Message::assistant().with_text("legal")),
        ]));
        let mut chat = chat(provider, 10);
        chat.add_user_message("Evaluate");

        let replies = invoke(&mut chat).await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].is_ok());
        assert!(matches!(replies[1], Err(EvalError::Service(_))));
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.state(), LoopState::AwaitingUserInput);

        // the next invocation resumes the sequence where it stopped
        chat.add_user_message("Continue");
        let replies = invoke(&mut chat).await;
        assert_eq!(speakers(&replies)[0], AgentRole::LegalCompliance);
    }

    #[tokio::test]
    async fn test_interrupt_after_dropped_stream() {
        let provider = Arc::new(MockProvider::with_texts(&["rfp", "legal"]));
        let mut chat = chat(provider, 10);
        chat.add_user_message("Evaluate");

        {
            let mut stream = chat.invoke();
            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first.speaker(), Some(AgentRole::RfpCompliance));
        }
        assert_eq!(chat.state(), LoopState::AgentResponding);

        chat.interrupt();
        assert_eq!(chat.state(), LoopState::AwaitingUserInput);
        assert_eq!(chat.transcript().len(), 2);

        chat.add_user_message("Continue");
        let replies = invoke(&mut chat).await;
        assert_eq!(speakers(&replies)[0], AgentRole::LegalCompliance);
    }

    #[tokio::test]
    async fn test_reset() {
        let provider = Arc::new(MockProvider::with_texts(&[]));
        let mut chat = chat(provider, 10);
        chat.add_user_message("Evaluate");
        invoke(&mut chat).await;

        chat.reset();
        assert!(chat.transcript().is_empty());
        assert!(chat.turn_state().spoken.is_empty());
        assert_eq!(chat.state(), LoopState::Idle);

        let replies = invoke(&mut chat).await;
        assert!(matches!(replies[0], Err(EvalError::Configuration(_))));
    }
}
