use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::{error, info, warn};

use super::agent::EvaluationAgent;
use crate::errors::EvalResult;
use crate::insights::InsightProvider;
use crate::models::agent_role::AgentRole;
use crate::models::summary::ProposalSummary;
use crate::prompt_template::{load_prompt, load_prompt_file};

/// Role instructions keyed by role key (`rfp_compliance`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentPrompts {
    prompts: HashMap<String, String>,
}

impl AgentPrompts {
    /// Render the prompt template file and parse it as a JSON object of instructions.
    /// A template that fails to render or parse yields no prompts.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match load_prompt_file(path, &Self::template_context()) {
            Ok(rendered) => Self::parse(&rendered),
            Err(e) => {
                error!("Failed to render agent prompts {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_template(template: &str) -> Self {
        match load_prompt(template, &Self::template_context()) {
            Ok(rendered) => Self::parse(&rendered),
            Err(e) => {
                error!("Failed to render agent prompts: {}", e);
                Self::default()
            }
        }
    }

    // The templates refer to the agents by display name, e.g. {{ legal_compliance }}
    fn template_context() -> HashMap<&'static str, String> {
        AgentRole::iter()
            .map(|role| (role.key(), role.to_string()))
            .collect()
    }

    fn parse(rendered: &str) -> Self {
        let map = match serde_json::from_str::<Value>(rendered) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                error!("Agent prompts must render to a JSON object");
                return Self::default();
            }
            Err(e) => {
                error!("Agent prompts JSON parsing failed: {}", e);
                return Self::default();
            }
        };

        let prompts = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key, text)),
                other => {
                    warn!("Ignoring non-text agent prompt {}: {}", key, other);
                    None
                }
            })
            .collect();
        Self { prompts }
    }

    pub fn get(&self, role: AgentRole) -> Option<&str> {
        self.prompts.get(role.key()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }
}

/// Everything retrieved or summarized for one vendor, ready to be folded into instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContext {
    pub rfp_summary: String,
    pub proposal: ProposalSummary,
    pub policy_context: String,
    pub vendor_insights: String,
    pub market_insights: String,
}

impl AgentContext {
    /// Query the context providers for a vendor: policies for its legal summary, its
    /// history by name and the market report for `industry`.
    pub async fn gather(
        rfp_summary: String,
        proposal: ProposalSummary,
        legal: &dyn InsightProvider,
        vendor: &dyn InsightProvider,
        market: &dyn InsightProvider,
        industry: &str,
    ) -> EvalResult<Self> {
        let policy_context = legal.insights(&proposal.legal_summary).await?;
        let vendor_insights = vendor.insights(&proposal.vendor_name).await?;
        let market_insights = market.insights(industry).await?;
        info!(
            vendor = %proposal.vendor_name,
            "Gathered context from {}, {} and {}",
            legal.name(),
            vendor.name(),
            market.name()
        );

        Ok(Self {
            rfp_summary,
            proposal,
            policy_context,
            vendor_insights,
            market_insights,
        })
    }
}

/// The evaluation agents for one vendor
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentRole, EvaluationAgent>,
}

impl AgentRegistry {
    pub fn build(prompts: &AgentPrompts, context: &AgentContext) -> Self {
        let mut agents = BTreeMap::new();
        for role in AgentRole::iter() {
            let Some(prompt) = prompts.get(role) else {
                error!("No instructions for {}, agent not created", role);
                continue;
            };
            let instructions = compose_instructions(role, prompt, context);
            agents.insert(role, EvaluationAgent::new(role, instructions));
        }
        Self { agents }
    }

    pub fn get(&self, role: AgentRole) -> Option<&EvaluationAgent> {
        self.agents.get(&role)
    }

    /// Agents in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &EvaluationAgent> {
        self.agents.values()
    }

    pub fn missing_roles(&self) -> Vec<AgentRole> {
        AgentRole::iter()
            .filter(|role| !self.agents.contains_key(role))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn compose_instructions(role: AgentRole, prompt: &str, context: &AgentContext) -> String {
    match role {
        AgentRole::RfpCompliance => format!(
            "{}\n\n### RFP Summary:\n{}\n### Proposal Summary:\n{}",
            prompt, context.rfp_summary, context.proposal.overall_summary
        ),
        AgentRole::LegalCompliance => format!(
            "{}\n\n### Vendor Legal Summary:\n{}\n\n### Retrieved Policy Context:\n{}",
            prompt, context.proposal.legal_summary, context.policy_context
        ),
        AgentRole::VendorEvaluation => {
            format!("{}\n\n### Vendor Insights:\n{}", prompt, context.vendor_insights)
        }
        AgentRole::MarketIntelligence => {
            format!("{}\n\n### Market Insights:\n{}", prompt, context.market_insights)
        }
        AgentRole::NegotiationStrategy | AgentRole::EvaluationReport => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn context() -> AgentContext {
        AgentContext {
            rfp_summary: "## Purpose\nCloud hosting".into(),
            proposal: ProposalSummary {
                vendor_name: "Northwind Traders".into(),
                legal_summary: "ISO 27001".into(),
                overall_summary: "Managed Kubernetes".into(),
            },
            policy_context: "Vendors must hold ISO 27001.".into(),
            vendor_insights: "### **Vendor:** Northwind Traders".into(),
            market_insights: "### Market Intelligence Report for Cloud Computing".into(),
        }
    }

    fn prompts() -> AgentPrompts {
        AgentPrompts::from_template(
            r#"{
                "rfp_compliance": "You are {{ rfp_compliance }}.",
                "legal_compliance": "You are {{ legal_compliance }}.",
                "vendor_evaluation": "You are {{ vendor_evaluation }}.",
                "market_intelligence": "You are {{ market_intelligence }}.",
                "negotiation_strategy": "Build on {{ rfp_compliance }} and {{ legal_compliance }}.",
                "evaluation_report": "You are {{ evaluation_report }}."
            }"#,
        )
    }

    #[test]
    fn test_prompts_render_agent_names() {
        let prompts = prompts();
        assert_eq!(prompts.len(), 6);
        assert_eq!(
            prompts.get(AgentRole::RfpCompliance),
            Some("You are RFPCompliance.")
        );
        assert_eq!(
            prompts.get(AgentRole::NegotiationStrategy),
            Some("Build on RFPCompliance and LegalCompliance.")
        );
    }

    #[test]
    fn test_invalid_json_gives_empty_prompts() {
        assert!(AgentPrompts::from_template("{\"rfp_compliance\": \"unterminated}").is_empty());
        assert!(AgentPrompts::from_template("[\"not\", \"an object\"]").is_empty());
        assert!(AgentPrompts::from_template("{{ undefined_variable }}").is_empty());
        assert!(AgentPrompts::load("missing_agent_prompts.jinja").is_empty());
    }

    #[test]
    fn test_bundled_prompts_cover_every_role() {
        let prompts = AgentPrompts::load("agent_prompts.jinja");
        for role in AgentRole::iter() {
            let prompt = prompts.get(role).unwrap();
            assert!(prompt.contains(&role.to_string()), "{} prompt", role);
        }
    }

    #[test]
    fn test_instruction_composition() {
        let registry = AgentRegistry::build(&prompts(), &context());
        assert_eq!(registry.len(), 6);
        assert!(registry.missing_roles().is_empty());

        assert_eq!(
            registry.get(AgentRole::RfpCompliance).unwrap().instructions(),
            "You are RFPCompliance.\n\n### RFP Summary:\n## Purpose\nCloud hosting\n### Proposal Summary:\nManaged Kubernetes"
        );
        assert_eq!(
            registry.get(AgentRole::LegalCompliance).unwrap().instructions(),
            "You are LegalCompliance.\n\n### Vendor Legal Summary:\nISO 27001\n\n### Retrieved Policy Context:\nVendors must hold ISO 27001."
        );
        assert_eq!(
            registry.get(AgentRole::VendorEvaluation).unwrap().instructions(),
            "You are VendorEvaluation.\n\n### Vendor Insights:\n### **Vendor:** Northwind Traders"
        );
        assert!(registry
            .get(AgentRole::MarketIntelligence)
            .unwrap()
            .instructions()
            .ends_with("### Market Insights:\n### Market Intelligence Report for Cloud Computing"));
        assert_eq!(
            registry.get(AgentRole::EvaluationReport).unwrap().instructions(),
            "You are EvaluationReport."
        );

        let order: Vec<_> = registry.iter().map(|a| a.role()).collect();
        assert_eq!(order, AgentRole::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_prompt_omits_role() {
        let prompts = AgentPrompts::from_template(r#"{"rfp_compliance": "Check the RFP."}"#);
        let registry = AgentRegistry::build(&prompts, &context());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.missing_roles().len(), 5);
        assert!(registry.get(AgentRole::EvaluationReport).is_none());
    }

    struct Echo(&'static str);

    #[async_trait]
    impl InsightProvider for Echo {
        fn name(&self) -> &str {
            self.0
        }

        async fn insights(&self, topic: &str) -> EvalResult<String> {
            Ok(format!("{}: {}", self.0, topic))
        }
    }

    #[tokio::test]
    async fn test_gather_context() {
        let proposal = context().proposal;
        let gathered = AgentContext::gather(
            "rfp".into(),
            proposal,
            &Echo("legal"),
            &Echo("vendor"),
            &Echo("market"),
            "Cloud Computing",
        )
        .await
        .unwrap();

        assert_eq!(gathered.policy_context, "legal: ISO 27001");
        assert_eq!(gathered.vendor_insights, "vendor: Northwind Traders");
        assert_eq!(gathered.market_insights, "market: Cloud Computing");
    }
}
