use crate::models::message::Message;

pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Bounds how much of the transcript a prompt gets to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryReducer {
    pub target_count: usize,
}

impl Default for HistoryReducer {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl HistoryReducer {
    pub fn new(target_count: usize) -> Self {
        Self { target_count }
    }

    /// The most recent `target_count` messages
    pub fn reduce<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        let start = history.len().saturating_sub(self.target_count);
        &history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message::user().with_text(format!("message {}", i)))
            .collect()
    }

    #[test]
    fn test_short_history_is_untouched() {
        let messages = history(4);
        assert_eq!(HistoryReducer::default().reduce(&messages), &messages[..]);
    }

    #[test]
    fn test_keeps_most_recent() {
        let messages = history(25);
        let reduced = HistoryReducer::default().reduce(&messages);
        assert_eq!(reduced.len(), 10);
        assert_eq!(reduced[0].text(), "message 15");
        assert_eq!(reduced[9].text(), "message 24");
    }

    #[test]
    fn test_zero_window() {
        let messages = history(3);
        assert!(HistoryReducer::new(0).reduce(&messages).is_empty());
    }
}
