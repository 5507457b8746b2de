use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{EvalError, EvalResult};
use crate::models::agent_role::AgentRole;
use crate::models::message::Message;
use crate::prompt_template::load_prompt_file;
use crate::providers::base::{CompletionOptions, Provider};

pub const DEFAULT_MAXIMUM_ITERATIONS: usize = 6;

/// Decides whether the evaluation is finished after a turn
#[async_trait]
pub trait CompletionJudge: Send + Sync {
    async fn is_complete(&self, last_message: &Message, history: &[Message])
        -> EvalResult<bool>;
}

#[derive(Serialize)]
struct TerminationPromptContext<'a> {
    last_message: &'a str,
}

/// Asks the model for a yes/no verdict on the last message
pub struct PromptJudge {
    provider: Arc<dyn Provider>,
}

impl PromptJudge {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionJudge for PromptJudge {
    async fn is_complete(
        &self,
        last_message: &Message,
        history: &[Message],
    ) -> EvalResult<bool> {
        let system = load_prompt_file(
            "termination.md",
            &TerminationPromptContext {
                last_message: last_message.text(),
            },
        )?;
        let (reply, _) = self
            .provider
            .complete(&system, history, &CompletionOptions::default())
            .await
            .map_err(EvalError::service)?;

        let verdict = reply.text().trim().to_lowercase().contains("yes");
        debug!("Termination model answered {:?}", reply.text());
        Ok(verdict)
    }
}

/// Offline judge: the evaluation is complete once the message mentions one of the
/// configured phrases
#[derive(Debug, Clone)]
pub struct KeywordJudge {
    phrases: Vec<String>,
}

impl Default for KeywordJudge {
    fn default() -> Self {
        Self::new(&["final recommendation"])
    }
}

impl KeywordJudge {
    pub fn new(phrases: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl CompletionJudge for KeywordJudge {
    async fn is_complete(
        &self,
        last_message: &Message,
        _history: &[Message],
    ) -> EvalResult<bool> {
        let text = last_message.text().to_lowercase();
        Ok(self.phrases.iter().any(|p| text.contains(p.as_str())))
    }
}

/// Ends an invocation after a maximum number of turns, or when the judge finds a
/// turn of one of the terminal agents conclusive
pub struct TerminationStrategy {
    judge: Box<dyn CompletionJudge>,
    agents: Vec<AgentRole>,
    maximum_iterations: usize,
}

impl Default for TerminationStrategy {
    fn default() -> Self {
        Self::new(Box::new(KeywordJudge::default()))
    }
}

impl TerminationStrategy {
    pub fn new(judge: Box<dyn CompletionJudge>) -> Self {
        Self {
            judge,
            agents: vec![AgentRole::EvaluationReport],
            maximum_iterations: DEFAULT_MAXIMUM_ITERATIONS,
        }
    }

    pub fn with_maximum_iterations(mut self, maximum_iterations: usize) -> Self {
        self.maximum_iterations = maximum_iterations;
        self
    }

    /// Restrict which agents' turns are judged
    pub fn with_agents(mut self, agents: Vec<AgentRole>) -> Self {
        self.agents = agents;
        self
    }

    pub fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    pub async fn should_terminate(
        &self,
        last_message: &Message,
        turns_taken: usize,
        history: &[Message],
    ) -> EvalResult<bool> {
        if turns_taken >= self.maximum_iterations {
            debug!("Maximum of {} turns reached", self.maximum_iterations);
            return Ok(true);
        }

        match last_message.speaker() {
            Some(agent) if self.agents.contains(&agent) => {
                self.judge.is_complete(last_message, history).await
            }
            _ => Ok(false),
        }
    }
}
