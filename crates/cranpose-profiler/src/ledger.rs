//! Append-only render log for one component identity.

use crate::cache::{CacheProvider, RecordView, ViewKey};
use crate::error::ProfilerError;
use crate::phase::{CommitInfo, RenderPhase, RenderRecord};
use std::rc::Rc;

/// Ordered record of every commit of one component.
///
/// The ledger is the source of truth; cached views handed out by
/// [`CacheProvider`] are projections of it. Per-phase counters are kept in
/// step with `records` so counts never require a scan.
#[derive(Debug)]
pub struct RenderLedger {
    component: Rc<str>,
    records: Vec<RenderRecord>,
    phase_counts: [usize; 3],
    max_renders: usize,
}

impl RenderLedger {
    pub fn new(component: impl Into<Rc<str>>, max_renders: usize) -> Self {
        Self {
            component: component.into(),
            records: Vec::new(),
            phase_counts: [0; 3],
            max_renders,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn max_renders(&self) -> usize {
        self.max_renders
    }

    /// Appends one commit, enforcing phase order and the render ceiling.
    ///
    /// On error the ledger is left untouched.
    pub fn append(&mut self, commit: &CommitInfo) -> Result<&RenderRecord, ProfilerError> {
        let count = self.records.len();
        let mount_out_of_place = match commit.phase {
            RenderPhase::Mount => count > 0,
            _ => count == 0,
        };
        if mount_out_of_place {
            return Err(ProfilerError::PhaseOrder {
                component: self.component.to_string(),
                phase: commit.phase,
                count,
            });
        }
        if count >= self.max_renders {
            log::error!(
                "{} exceeded the render ceiling of {}",
                self.component,
                self.max_renders
            );
            return Err(ProfilerError::InfiniteLoop {
                component: self.component.to_string(),
                limit: self.max_renders,
            });
        }

        self.phase_counts[commit.phase.slot()] += 1;
        self.records
            .push(RenderRecord::from_commit(count + 1, commit));
        log::trace!("{} render #{} ({})", self.component, count + 1, commit.phase);
        Ok(&self.records[count])
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn phase_count(&self, phase: RenderPhase) -> usize {
        self.phase_counts[phase.slot()]
    }

    pub fn has_mounted(&self) -> bool {
        self.phase_counts[RenderPhase::Mount.slot()] > 0
    }

    pub fn last_record(&self) -> Option<&RenderRecord> {
        self.records.last()
    }

    pub fn last_phase(&self) -> Option<RenderPhase> {
        self.records.last().map(|record| record.phase)
    }

    pub fn render_at(&self, index: usize) -> Option<&RenderRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }

    /// Full history as a frozen view, served from `cache` when still valid.
    pub fn history(&self, cache: &dyn CacheProvider) -> RecordView {
        cache.get_or_compute(ViewKey::History, &mut || Rc::from(self.records.as_slice()))
    }

    /// Records of one phase, in ledger order, served from `cache` when still valid.
    pub fn renders_by_phase(&self, phase: RenderPhase, cache: &dyn CacheProvider) -> RecordView {
        cache.get_or_compute(ViewKey::Phase(phase), &mut || {
            self.records
                .iter()
                .filter(|record| record.phase == phase)
                .cloned()
                .collect()
        })
    }

    /// Cached mount flag; recomputed from the counters after invalidation.
    pub fn has_mounted_cached(&self, cache: &dyn CacheProvider) -> bool {
        cache.mounted_or_compute(&mut || self.has_mounted())
    }

    /// Drops every record. Calling it on an empty ledger is a no-op.
    pub fn clear(&mut self) {
        if self.records.is_empty() {
            return;
        }
        log::trace!("{} ledger cleared after {} renders", self.component, self.records.len());
        self.records.clear();
        self.phase_counts = [0; 3];
    }
}

#[cfg(test)]
#[path = "tests/ledger_tests.rs"]
mod tests;
