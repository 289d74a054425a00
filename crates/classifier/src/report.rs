use std::time::Duration;

use serde::Serialize;

/// Counters for one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyReport {
    /// Valid target words processed.
    pub targets: usize,
    /// Valid candidate words processed.
    pub candidates: usize,
    /// Entries in either list rejected by the canonicalizer.
    pub invalid: usize,
    /// Candidates whose key is not of interest. Nothing was written for them.
    pub skipped_uninterested: usize,
    /// Members newly appended to a group, targets included.
    pub appended: usize,
    /// Words the ledger had already recorded.
    pub already_seen: usize,
    /// Words whose append failed; a re-run picks them up.
    pub failed: usize,
    /// Pending marks confirmed during recovery.
    pub recovered: usize,
    /// Wall time of the run.
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ClassifyReport {
    /// True when every valid word is accounted for in the store.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Per-thread tally merged after a parallel scan.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Tally {
    pub seen_valid: usize,
    pub invalid: usize,
    pub skipped: usize,
    pub appended: usize,
    pub already_seen: usize,
    pub failed: usize,
}

impl Tally {
    pub fn merge(mut self, other: Tally) -> Tally {
        self.seen_valid += other.seen_valid;
        self.invalid += other.invalid;
        self.skipped += other.skipped;
        self.appended += other.appended;
        self.already_seen += other.already_seen;
        self.failed += other.failed;
        self
    }

    pub fn add(&mut self, outcome: WordOutcome) {
        match outcome {
            WordOutcome::Invalid => self.invalid += 1,
            WordOutcome::Skipped => {
                self.seen_valid += 1;
                self.skipped += 1;
            }
            WordOutcome::Appended => {
                self.seen_valid += 1;
                self.appended += 1;
            }
            WordOutcome::AlreadySeen => {
                self.seen_valid += 1;
                self.already_seen += 1;
            }
            WordOutcome::Failed => {
                self.seen_valid += 1;
                self.failed += 1;
            }
        }
    }
}

/// What happened to one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WordOutcome {
    Invalid,
    Skipped,
    Appended,
    AlreadySeen,
    Failed,
}
