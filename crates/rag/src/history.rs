//! Bounded conversation history.
//!
//! Both operations are pure: history comes in by value and goes out by
//! value. Persistence between requests belongs to the caller.

use avocado_config::RetrievalConfig;
use avocado_core::conversation::{ConversationHistory, ConversationTurn};

pub const DEFAULT_MAX_TURNS: usize = 20;
pub const DEFAULT_EXCERPT_TURNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryManager {
    max_turns: usize,
    excerpt_turns: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS, DEFAULT_EXCERPT_TURNS)
    }
}

impl From<&RetrievalConfig> for HistoryManager {
    fn from(config: &RetrievalConfig) -> Self {
        Self::new(config.history_max_turns, config.history_excerpt_turns)
    }
}

impl HistoryManager {
    /// `max_turns` is clamped to at least one.
    pub fn new(max_turns: usize, excerpt_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            excerpt_turns,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append `turn`, then evict from the front down to the bound.
    pub fn append(&self, history: ConversationHistory, turn: ConversationTurn) -> ConversationHistory {
        let mut turns = history.into_turns();
        turns.push(turn);
        let excess = turns.len().saturating_sub(self.max_turns);
        turns.drain(..excess);
        ConversationHistory::from_turns(turns)
    }

    /// The most recent turns as `Question:`/`Answer:` pairs, oldest first.
    pub fn excerpt(&self, history: &ConversationHistory) -> String {
        history
            .last_n(self.excerpt_turns)
            .iter()
            .map(|turn| format!("Question: {}\nAnswer: {}\n\n", turn.question, turn.answer))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn::new(format!("q{i}"), format!("a{i}"))
    }

    #[test]
    fn append_under_bound_keeps_everything() {
        let manager = HistoryManager::default();
        let history = (1..=5).fold(ConversationHistory::new(), |h, i| manager.append(h, turn(i)));
        assert_eq!(history.len(), 5);
        assert_eq!(history.turns()[0], turn(1));
    }

    #[test]
    fn twenty_five_turns_keep_six_through_twenty_five() {
        let manager = HistoryManager::default();
        let history = (1..=25).fold(ConversationHistory::new(), |h, i| manager.append(h, turn(i)));

        assert_eq!(history.len(), 20);
        let expected: Vec<ConversationTurn> = (6..=25).map(turn).collect();
        assert_eq!(history.turns(), expected.as_slice());
    }

    #[test]
    fn oversized_input_is_trimmed_on_append() {
        let manager = HistoryManager::new(4, 2);
        let history = ConversationHistory::from_turns((1..=10).map(turn).collect());
        let history = manager.append(history, turn(11));
        let expected: Vec<ConversationTurn> = (8..=11).map(turn).collect();
        assert_eq!(history.turns(), expected.as_slice());
    }

    #[test]
    fn length_is_min_of_total_and_bound() {
        let manager = HistoryManager::default();
        for n in [0, 7, 20] {
            for m in [1, 5, 14, 30] {
                let start = ConversationHistory::from_turns((0..n).map(turn).collect());
                let history = (0..m).fold(start, |h, i| manager.append(h, turn(100 + i)));
                assert_eq!(history.len(), (n + m).min(20));
                assert_eq!(history.turns().last(), Some(&turn(100 + m - 1)));
            }
        }
    }

    #[test]
    fn excerpt_formats_last_three_oldest_first() {
        let manager = HistoryManager::default();
        let history = ConversationHistory::from_turns((1..=5).map(turn).collect());
        assert_eq!(
            manager.excerpt(&history),
            "Question: q3\nAnswer: a3\n\nQuestion: q4\nAnswer: a4\n\nQuestion: q5\nAnswer: a5\n\n"
        );
    }

    #[test]
    fn excerpt_of_short_or_empty_history() {
        let manager = HistoryManager::default();
        assert_eq!(manager.excerpt(&ConversationHistory::new()), "");
        let one = ConversationHistory::from_turns(vec![turn(1)]);
        assert_eq!(manager.excerpt(&one), "Question: q1\nAnswer: a1\n\n");
    }
}
