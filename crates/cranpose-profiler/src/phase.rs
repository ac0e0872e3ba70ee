//! Render phases and the per-commit records stored in a [`RenderLedger`].
//!
//! [`RenderLedger`]: crate::RenderLedger

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Classification of a single commit of a profiled component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// First commit of the component. Happens once per ledger lifecycle.
    Mount,
    /// Regular re-render.
    Update,
    /// Re-render scheduled while another component was committing.
    NestedUpdate,
}

impl RenderPhase {
    pub const ALL: [RenderPhase; 3] = [
        RenderPhase::Mount,
        RenderPhase::Update,
        RenderPhase::NestedUpdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RenderPhase::Mount => "mount",
            RenderPhase::Update => "update",
            RenderPhase::NestedUpdate => "nested-update",
        }
    }

    /// Dense index used by per-phase tables.
    pub(crate) fn slot(self) -> usize {
        match self {
            RenderPhase::Mount => 0,
            RenderPhase::Update => 1,
            RenderPhase::NestedUpdate => 2,
        }
    }

    /// True for both update flavours.
    pub fn is_update(self) -> bool {
        !matches!(self, RenderPhase::Mount)
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mount" => Ok(RenderPhase::Mount),
            "update" => Ok(RenderPhase::Update),
            "nested-update" => Ok(RenderPhase::NestedUpdate),
            other => Err(format!(
                "unknown render phase {other:?}; expected mount, update or nested-update"
            )),
        }
    }
}

/// Measurements the UI engine reports for one commit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CommitInfo {
    pub phase: RenderPhase,
    pub actual_duration: Duration,
    pub base_duration: Duration,
    pub start_time: Duration,
    pub commit_time: Duration,
}

impl CommitInfo {
    pub fn new(phase: RenderPhase) -> Self {
        Self {
            phase,
            actual_duration: Duration::ZERO,
            base_duration: Duration::ZERO,
            start_time: Duration::ZERO,
            commit_time: Duration::ZERO,
        }
    }

    pub fn mount() -> Self {
        Self::new(RenderPhase::Mount)
    }

    pub fn update() -> Self {
        Self::new(RenderPhase::Update)
    }

    pub fn nested_update() -> Self {
        Self::new(RenderPhase::NestedUpdate)
    }

    pub fn with_durations(mut self, actual: Duration, base: Duration) -> Self {
        self.actual_duration = actual;
        self.base_duration = base;
        self
    }

    pub fn with_timestamps(mut self, start: Duration, commit: Duration) -> Self {
        self.start_time = start;
        self.commit_time = commit;
        self
    }
}

/// Immutable entry appended to the ledger for every commit.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRecord {
    /// 1-based position in the ledger.
    pub ordinal: usize,
    pub phase: RenderPhase,
    pub actual_duration: Duration,
    pub base_duration: Duration,
    pub start_time: Duration,
    pub commit_time: Duration,
    pub recorded_at: Instant,
}

impl RenderRecord {
    pub(crate) fn from_commit(ordinal: usize, commit: &CommitInfo) -> Self {
        Self {
            ordinal,
            phase: commit.phase,
            actual_duration: commit.actual_duration,
            base_duration: commit.base_duration,
            start_time: commit.start_time,
            commit_time: commit.commit_time,
            recorded_at: Instant::now(),
        }
    }
}

/// Formats the tail of a history as `#3 update → #4 nested-update`.
///
/// At most `limit` trailing entries are printed; earlier entries are
/// summarised as `… N earlier`.
pub fn format_phases(records: &[RenderRecord], limit: usize) -> String {
    if records.is_empty() {
        return "(no renders)".to_string();
    }
    let skipped = records.len().saturating_sub(limit);
    let mut out = String::new();
    if skipped > 0 {
        out.push_str(&format!("… {skipped} earlier → "));
    }
    for (i, record) in records[skipped..].iter().enumerate() {
        if i > 0 {
            out.push_str(" → ");
        }
        out.push_str(&format!("#{} {}", record.ordinal, record.phase));
    }
    out
}
