//! Summarization scheduling.
//!
//! Every `interval` retained nodes, the most recent `interval` nodes are
//! folded into the story's running summary.

use storyloom_core::story::StoryNode;

/// Default number of nodes between summaries.
pub const DEFAULT_SUMMARY_INTERVAL: usize = 5;

/// Separator between node texts in a summarization batch.
const BATCH_SEPARATOR: &str = "\n\n";

/// Decides when history is due for compression and what to compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizationScheduler {
    interval: usize,
}

impl SummarizationScheduler {
    /// Creates a scheduler firing every `interval` nodes. An interval of
    /// zero is treated as one.
    #[must_use]
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    /// The configured interval.
    #[must_use]
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Whether a story holding `node_count` retained nodes is due.
    #[must_use]
    pub fn should_trigger(&self, node_count: usize) -> bool {
        node_count > 0 && node_count % self.interval == 0
    }

    /// Returns the concatenated text of the last `interval` nodes when
    /// `retained` (including the node just appended) is due, oldest first.
    #[must_use]
    pub fn due_batch(&self, retained: &[StoryNode]) -> Option<String> {
        if !self.should_trigger(retained.len()) {
            return None;
        }
        let start = retained.len() - self.interval;
        Some(
            retained[start..]
                .iter()
                .map(|node| node.generated_text.as_str())
                .collect::<Vec<_>>()
                .join(BATCH_SEPARATOR),
        )
    }
}

impl Default for SummarizationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_INTERVAL)
    }
}

/// Lossy fallback used when the summarizer is unavailable: the raw batch is
/// appended verbatim to whatever summary already exists.
#[must_use]
pub fn degraded_summary(current: Option<&str>, raw_batch: &str) -> String {
    match current.filter(|s| !s.trim().is_empty()) {
        Some(existing) => format!("{existing}{BATCH_SEPARATOR}{raw_batch}"),
        None => raw_batch.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storyloom_core::story::ActionType;
    use uuid::Uuid;

    fn nodes(count: usize) -> Vec<StoryNode> {
        (0..count)
            .map(|i| StoryNode {
                id: Uuid::new_v4(),
                story_id: Uuid::nil(),
                parent_node_id: None,
                action_type: ActionType::Continue,
                user_input: String::new(),
                generated_text: format!("beat {i}"),
                token_start: 0,
                token_end: 2,
                created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_should_trigger_only_on_positive_multiples() {
        let scheduler = SummarizationScheduler::new(5);

        let fired: Vec<usize> = (0..=16).filter(|&n| scheduler.should_trigger(n)).collect();

        assert_eq!(fired, vec![5, 10, 15]);
    }

    #[test]
    fn test_zero_interval_is_clamped_to_one() {
        let scheduler = SummarizationScheduler::new(0);

        assert_eq!(scheduler.interval(), 1);
        assert!(scheduler.should_trigger(1));
        assert!(!scheduler.should_trigger(0));
    }

    #[test]
    fn test_due_batch_joins_last_interval_nodes_in_order() {
        let scheduler = SummarizationScheduler::new(5);
        let history = nodes(10);

        let batch = scheduler.due_batch(&history).unwrap();

        assert_eq!(batch, "beat 5\n\nbeat 6\n\nbeat 7\n\nbeat 8\n\nbeat 9");
    }

    #[test]
    fn test_due_batch_is_none_off_cycle() {
        let scheduler = SummarizationScheduler::new(5);

        assert!(scheduler.due_batch(&nodes(4)).is_none());
        assert!(scheduler.due_batch(&nodes(6)).is_none());
    }

    #[test]
    fn test_degraded_summary_appends_raw_text() {
        assert_eq!(degraded_summary(None, "raw"), "raw");
        assert_eq!(degraded_summary(Some(""), "raw"), "raw");
        assert_eq!(degraded_summary(Some("old"), "raw"), "old\n\nraw");
    }
}
