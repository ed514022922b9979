//! Election lifecycle state machine
//!
//! Sole owner of the phase value: `Setup` → `Open` → `Closed`, no skipped
//! states, no backward transition except a full reset. Every transition is
//! totally ordered by the store's exclusive guard, and the side effects
//! that announce a transition (roster on open, final result on close) are
//! published only after the transition has committed.

use std::sync::Arc;

use crate::errors::Result;
use crate::types::{Candidate, ElectionPhase, TallyResult, Verdict};

use super::device::{DeviceChannel, DeviceEvent};
use super::store::ElectionStore;

/// Minimum number of candidates required to open the election
pub const MIN_CANDIDATES: usize = 2;

/// The lifecycle component
pub struct Lifecycle {
    store: Arc<ElectionStore>,
    device: DeviceChannel,
}

impl Lifecycle {
    pub fn new(store: Arc<ElectionStore>, device: DeviceChannel) -> Self {
        Self { store, device }
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> Result<ElectionPhase> {
        self.store.phase().await
    }

    /// Open the election for voting.
    ///
    /// Legal only from `Setup` and only with at least [`MIN_CANDIDATES`]
    /// candidates registered. Publishes the finalized roster to the device
    /// and returns it.
    pub async fn open_election(&self) -> Result<Vec<Candidate>> {
        let roster = self.store.transition_open().await?;

        tracing::info!("🟢 Election opened with {} candidates", roster.len());
        self.device.publish(DeviceEvent::CandidateRoster {
            candidates: roster.clone(),
        });

        Ok(roster)
    }

    /// Close the election and finalize the result.
    ///
    /// Legal only from `Open`. The tally computed here is the
    /// authoritative record; it is published to the device and returned.
    pub async fn close_election(&self) -> Result<TallyResult> {
        let tally = self.store.transition_close().await?;

        match &tally.verdict {
            Some(Verdict::Winner(winner)) => tracing::info!(
                "🏁 Election closed: winner={} with {} votes, {} voters",
                winner.name,
                winner.votes,
                tally.total_voters
            ),
            Some(Verdict::Tie { votes, candidates }) => tracing::info!(
                "🏁 Election closed: {}-way tie at {} votes, {} voters",
                candidates.len(),
                votes,
                tally.total_voters
            ),
            None => tracing::warn!("🏁 Election closed without candidates"),
        }

        self.device.publish(DeviceEvent::FinalResult {
            tally: tally.clone(),
        });

        Ok(tally)
    }

    /// Discard all election data and return to a fresh `Setup`.
    ///
    /// Legal from any phase. Candidates, voters and ballots are cleared
    /// and identity counters restart.
    pub async fn reset(&self) -> Result<()> {
        self.store.transition_reset().await?;
        tracing::warn!("♻️ Election reset: all candidates, voters and ballots cleared");
        Ok(())
    }
}
