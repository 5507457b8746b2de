use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use super::turn::SpokenSet;
use crate::errors::{EvalError, EvalResult};
use crate::models::agent_role::AgentRole;
use crate::models::message::Message;
use crate::prompt_template::load_prompt_file;
use crate::providers::base::{CompletionOptions, Provider};

/// Routes a free-form message to the role best placed to answer it
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    async fn classify(&self, last_message: &Message, history: &[Message])
        -> EvalResult<AgentRole>;
}

/// Rule table routing on topic keywords. The first matching rule wins; no match
/// routes to the report.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(AgentRole, Vec<String>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let rules: [(AgentRole, &[&str]); 5] = [
            (
                AgentRole::LegalCompliance,
                &["compliance", "compliant", "legal", "regulat", "policy", "policies"],
            ),
            (
                AgentRole::VendorEvaluation,
                &["vendor history", "reputation", "credib", "track record", "past clients"],
            ),
            (
                AgentRole::MarketIntelligence,
                &["industry", "trend", "market", "competitor"],
            ),
            (
                AgentRole::NegotiationStrategy,
                &["negotiat", "pricing", "discount", "leverage"],
            ),
            (
                AgentRole::EvaluationReport,
                &["report", "modif", "revise", "update", "summary"],
            ),
        ];
        Self {
            rules: rules
                .into_iter()
                .map(|(role, words)| (role, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        }
    }
}

impl KeywordClassifier {
    pub fn classify_text(&self, text: &str) -> AgentRole {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(role, _)| *role)
            .unwrap_or(AgentRole::EvaluationReport)
    }
}

#[async_trait]
impl TopicClassifier for KeywordClassifier {
    async fn classify(
        &self,
        last_message: &Message,
        _history: &[Message],
    ) -> EvalResult<AgentRole> {
        Ok(self.classify_text(last_message.text()))
    }
}

#[derive(Serialize)]
struct SelectionPromptContext {
    agents: Vec<String>,
    legal_compliance: String,
    vendor_evaluation: String,
    market_intelligence: String,
    negotiation_strategy: String,
    evaluation_report: String,
    author: String,
    last_message: String,
}

/// Asks the model to name the next participant
pub struct PromptClassifier {
    provider: Arc<dyn Provider>,
}

impl PromptClassifier {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    fn render(last_message: &Message) -> EvalResult<String> {
        let context = SelectionPromptContext {
            agents: AgentRole::iter().map(|role| role.to_string()).collect(),
            legal_compliance: AgentRole::LegalCompliance.to_string(),
            vendor_evaluation: AgentRole::VendorEvaluation.to_string(),
            market_intelligence: AgentRole::MarketIntelligence.to_string(),
            negotiation_strategy: AgentRole::NegotiationStrategy.to_string(),
            evaluation_report: AgentRole::EvaluationReport.to_string(),
            author: last_message.author(),
            last_message: last_message.text().to_string(),
        };
        Ok(load_prompt_file("selection.md", &context)?)
    }
}

#[async_trait]
impl TopicClassifier for PromptClassifier {
    async fn classify(
        &self,
        last_message: &Message,
        history: &[Message],
    ) -> EvalResult<AgentRole> {
        let system = Self::render(last_message)?;
        let (reply, _) = self
            .provider
            .complete(&system, history, &CompletionOptions::default())
            .await
            .map_err(EvalError::service)?;

        let choice = AgentRole::parse_loose(reply.text());
        debug!("Selection model answered {:?}, parsed as {:?}", reply.text(), choice);
        Ok(choice.unwrap_or(AgentRole::EvaluationReport))
    }
}

/// Decides which agent speaks next.
///
/// Until every role has spoken, roles are taken in evaluation order without asking
/// the classifier. After that the classifier routes each turn. The chosen role is
/// never the speaker of the last message.
pub struct SelectionStrategy {
    classifier: Box<dyn TopicClassifier>,
    fallback: KeywordClassifier,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::new(Box::new(KeywordClassifier::default()))
    }
}

impl SelectionStrategy {
    pub fn new(classifier: Box<dyn TopicClassifier>) -> Self {
        Self {
            classifier,
            fallback: KeywordClassifier::default(),
        }
    }

    pub async fn select_next(
        &self,
        last_message: &Message,
        already_spoken: SpokenSet,
        history: &[Message],
    ) -> AgentRole {
        let previous = last_message.speaker();

        if !already_spoken.is_complete() {
            let next = AgentRole::iter()
                .find(|role| !already_spoken.contains(*role) && Some(*role) != previous);
            if let Some(role) = next {
                debug!("Next in evaluation sequence: {}", role);
                return role;
            }
        }

        let choice = match self.classifier.classify(last_message, history).await {
            Ok(role) => role,
            Err(e) => {
                warn!("Topic classification failed, routing by keyword: {}", e);
                self.fallback.classify_text(last_message.text())
            }
        };

        if Some(choice) == previous {
            return if choice == AgentRole::EvaluationReport {
                AgentRole::NegotiationStrategy
            } else {
                AgentRole::EvaluationReport
            };
        }
        choice
    }
}
