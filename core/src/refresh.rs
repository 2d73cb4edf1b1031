//! Dashboard refresh: fetch, normalize, aggregate, apply.
//!
//! RULE: Results are applied in issuance order. A refresh issued earlier
//! that completes later than a newer one is stale and is dropped, so the
//! dashboard never steps back to older data.

use crate::{
    aggregate::{compute_statistics, DerivedStatistics},
    config::DeskConfig,
    demo::{augment_for_demo, AugmentedStatistics},
    error::DeskResult,
    normalize::normalize_batch,
    rng::{DeskRng, RngBank, StreamSlot},
    source::ComplaintSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Stale,
}

/// Hands out tickets and keeps the newest applied result.
pub struct RefreshCoordinator<T> {
    next_sequence: u64,
    applied: Option<(RefreshTicket, T)>,
}

impl<T> Default for RefreshCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RefreshCoordinator<T> {
    pub fn new() -> Self {
        Self { next_sequence: 1, applied: None }
    }

    pub fn issue(&mut self) -> RefreshTicket {
        let ticket = RefreshTicket(self.next_sequence);
        self.next_sequence += 1;
        ticket
    }

    /// Apply `result` unless a newer ticket has already been applied.
    pub fn complete(&mut self, ticket: RefreshTicket, result: T) -> RefreshOutcome {
        if let Some((applied, _)) = &self.applied {
            if *applied >= ticket {
                log::warn!(
                    "dropping stale refresh #{} (already showing #{})",
                    ticket.0,
                    applied.0
                );
                return RefreshOutcome::Stale;
            }
        }
        self.applied = Some((ticket, result));
        RefreshOutcome::Applied
    }

    pub fn current(&self) -> Option<&T> {
        self.applied.as_ref().map(|(_, result)| result)
    }

    pub fn last_applied(&self) -> Option<RefreshTicket> {
        self.applied.as_ref().map(|(ticket, _)| *ticket)
    }
}

/// A fetched and aggregated view waiting to be applied.
#[derive(Debug, Clone)]
pub struct PendingRefresh {
    ticket: RefreshTicket,
    view: AugmentedStatistics,
}

impl PendingRefresh {
    pub fn ticket(&self) -> RefreshTicket {
        self.ticket
    }

    pub fn view(&self) -> &AugmentedStatistics {
        &self.view
    }
}

/// One dashboard: a source plus the pipeline that turns its output into statistics.
///
/// `refresh` prepares and applies in one call, so it is always applied.
/// Callers that overlap fetches use `prepare` and `apply` separately;
/// a pending refresh applied after a newer one comes back `Stale`.
pub struct Dashboard<S: ComplaintSource> {
    source: S,
    config: DeskConfig,
    queue_rng: DeskRng,
    demo_rng: DeskRng,
    coordinator: RefreshCoordinator<AugmentedStatistics>,
}

impl<S: ComplaintSource> Dashboard<S> {
    pub fn new(source: S, config: DeskConfig, bank: &RngBank) -> Self {
        Self {
            source,
            queue_rng: bank.for_stream(StreamSlot::Queue),
            demo_rng: bank.for_stream(StreamSlot::Demo),
            config,
            coordinator: RefreshCoordinator::new(),
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run one full refresh. On a fetch error the previously applied
    /// statistics stay in place and the error is returned.
    pub fn refresh(&mut self) -> DeskResult<RefreshOutcome> {
        let pending = self.prepare()?;
        Ok(self.apply(pending))
    }

    /// Issue a ticket, fetch, normalize and aggregate. Nothing is shown
    /// until the result is passed to `apply`.
    pub fn prepare(&mut self) -> DeskResult<PendingRefresh> {
        let ticket = self.coordinator.issue();
        let raws = self.source.fetch().map_err(|e| {
            log::warn!("refresh #{} from {} failed: {e}", ticket.sequence(), self.source.name());
            e
        })?;

        let batch = normalize_batch(raws);
        let stats = compute_statistics(&batch.records, &self.config, &mut self.queue_rng);
        let view = self.present(stats);
        Ok(PendingRefresh { ticket, view })
    }

    pub fn apply(&mut self, pending: PendingRefresh) -> RefreshOutcome {
        self.coordinator.complete(pending.ticket, pending.view)
    }

    /// Statistics as last applied.
    pub fn current(&self) -> Option<&AugmentedStatistics> {
        self.coordinator.current()
    }

    pub fn last_applied(&self) -> Option<RefreshTicket> {
        self.coordinator.last_applied()
    }

    fn present(&mut self, stats: DerivedStatistics) -> AugmentedStatistics {
        if self.config.demo_augmentation {
            augment_for_demo(stats, &self.config, &mut self.demo_rng)
        } else {
            AugmentedStatistics {
                monthly_flags: vec![Default::default(); stats.monthly_buckets.len()],
                stats,
                category_placeholder: false,
            }
        }
    }
}
