use serde::{Deserialize, Serialize};

/// How the cost of a whitespace-delimited word is estimated when packing chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEstimate {
    /// Every word counts as one token
    #[default]
    Words,
    /// Every word counts as its character length plus the separating space
    Characters,
}

impl TokenEstimate {
    pub fn word_cost(&self, word: &str) -> usize {
        match self {
            TokenEstimate::Words => 1,
            TokenEstimate::Characters => word.chars().count() + 1,
        }
    }

    /// Approximate token count of a text
    pub fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().map(|w| self.word_cost(w)).sum()
    }
}
