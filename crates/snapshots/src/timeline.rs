//! Merging heterogeneous event collections into one chronological feed.
//!
//! Each event-bearing sub-record (ward round, nursing note, anesthesia observation...) knows how
//! to describe itself as a [`TimelineEntry`]. A snapshot's timeline is the merge of all of its
//! sources, newest first.
//!
//! Entries whose timestamp is missing or unparsable are kept and sort as if dated at the Unix
//! epoch, after every dated entry. Ties keep their source order.

use flow_types::timestamp::timestamp_millis;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One uniformly shaped event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Uppercase event tag, e.g. `WARD_ROUND`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Timestamp as sent by the service; may be empty.
    pub at: String,
    pub label: String,
}

impl TimelineEntry {
    pub fn new(kind: &str, at: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            at: at.into(),
            label: label.into(),
        }
    }

    /// Milliseconds since the epoch used for ordering (0 when `at` is unparsable).
    pub fn sort_key(&self) -> i64 {
        timestamp_millis(&self.at)
    }
}

/// A sub-record that contributes one entry to a timeline.
pub trait TimelineEvent {
    fn timeline_entry(&self) -> TimelineEntry;
}

/// A snapshot that can build its own timeline from its event-bearing collections.
pub trait Timeline {
    fn to_timeline(&self) -> Vec<TimelineEntry>;
}

/// Entries for every event in `events`.
pub fn entries<'a, E>(events: impl IntoIterator<Item = &'a E>) -> Vec<TimelineEntry>
where
    E: TimelineEvent + 'a,
{
    events.into_iter().map(TimelineEvent::timeline_entry).collect()
}

/// Flattens `sources` and stable-sorts the result newest first.
pub fn merge_timeline<I>(sources: I) -> Vec<TimelineEntry>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = TimelineEntry>,
{
    let mut merged: Vec<TimelineEntry> = sources.into_iter().flatten().collect();
    merged.sort_by_key(|entry| Reverse(entry.sort_key()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(kind: &str, at: &str) -> TimelineEntry {
        TimelineEntry::new(kind, at, kind.to_lowercase())
    }

    #[test]
    fn merges_sources_newest_first() {
        let rounds = vec![
            entry("WARD_ROUND", "2024-05-01T08:00:00Z"),
            entry("WARD_ROUND", "2024-05-03T08:00:00Z"),
        ];
        let notes = vec![entry("NURSING_NOTE", "2024-05-02T20:00:00+03:00")];

        let merged = merge_timeline([rounds, notes]);
        let order: Vec<_> = merged.iter().map(|e| e.at.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "2024-05-03T08:00:00Z",
                "2024-05-02T20:00:00+03:00",
                "2024-05-01T08:00:00Z"
            ]
        );
    }

    #[test]
    fn undated_entries_are_kept_last_in_source_order() {
        let merged = merge_timeline([
            vec![entry("A", ""), entry("B", "2024-01-01")],
            vec![entry("C", "garbage")],
        ]);
        let kinds: Vec<_> = merged.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["B", "A", "C"]);
    }

    #[test]
    fn serialises_kind_as_type() {
        let json = serde_json::to_value(entry("VITALS", "")).expect("serialise");
        assert_eq!(json["type"], "VITALS");
        assert!(json.get("kind").is_none());
    }

    fn at_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => (2000u32..2030, 1u32..13, 1u32..29, 0u32..24)
                .prop_map(|(y, m, d, h)| format!("{y:04}-{m:02}-{d:02}T{h:02}:00:00Z")),
            1 => Just(String::new()),
            1 => Just("not a date".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn merged_timeline_is_ordered_and_complete(
            a in proptest::collection::vec(at_strategy(), 0..8),
            b in proptest::collection::vec(at_strategy(), 0..8),
        ) {
            let first: Vec<_> = a.iter().map(|at| entry("A", at)).collect();
            let second: Vec<_> = b.iter().map(|at| entry("B", at)).collect();
            let total = first.len() + second.len();

            let merged = merge_timeline([first, second]);
            prop_assert_eq!(merged.len(), total);
            for pair in merged.windows(2) {
                prop_assert!(pair[0].sort_key() >= pair[1].sort_key());
            }
        }
    }
}
