//! Ballot ledger
//!
//! Records at most one ballot per voter. The uniqueness race between two
//! casts for the same voter is settled inside the store, where the
//! existing-ballot check and the insert share one exclusive guard; the
//! loser is reported as [`CastOutcome::Duplicate`], a recoverable outcome
//! the caller is informed of, never a system fault.

use std::sync::Arc;

use crate::errors::Result;
use crate::types::{Ballot, BallotId, CandidateId, VoterId};

use super::device::{DeviceChannel, DeviceEvent};
use super::store::ElectionStore;

/// Result of a cast attempt that reached the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    /// The ballot was recorded
    Recorded(Ballot),

    /// The voter already holds a ballot; nothing was mutated
    Duplicate {
        voter_id: VoterId,
        existing_ballot: BallotId,
    },
}

impl CastOutcome {
    /// Whether a ballot was recorded by this attempt
    pub fn was_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    /// The recorded ballot, when this attempt won
    pub fn ballot(&self) -> Option<&Ballot> {
        match self {
            Self::Recorded(ballot) => Some(ballot),
            Self::Duplicate { .. } => None,
        }
    }
}

/// The ballot ledger
pub struct BallotLedger {
    store: Arc<ElectionStore>,
    device: DeviceChannel,
}

impl BallotLedger {
    pub fn new(store: Arc<ElectionStore>, device: DeviceChannel) -> Self {
        Self { store, device }
    }

    /// Cast a ballot for the given voter and candidate.
    ///
    /// Preconditions, checked in order: the election is open, the voter is
    /// known, the voter holds no ballot yet, the candidate is known. The
    /// outcome is reported to the device channel after the store commit and
    /// never affects it.
    pub async fn cast_ballot(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<CastOutcome> {
        match self.store.insert_ballot(voter_id, candidate_id).await {
            Ok(CastOutcome::Recorded(ballot)) => {
                tracing::info!(
                    "🗳️  Ballot recorded: ballot_id={}, voter_id={}, candidate_id={}",
                    ballot.id,
                    ballot.voter_id,
                    ballot.candidate_id
                );
                self.device.publish(DeviceEvent::vote_recorded(&ballot));
                Ok(CastOutcome::Recorded(ballot))
            }
            Ok(CastOutcome::Duplicate {
                voter_id,
                existing_ballot,
            }) => {
                tracing::info!(
                    "⚠️ Duplicate vote attempt: voter_id={}, existing_ballot={}",
                    voter_id,
                    existing_ballot
                );
                self.device
                    .publish(DeviceEvent::vote_duplicate(voter_id, existing_ballot));
                Ok(CastOutcome::Duplicate {
                    voter_id,
                    existing_ballot,
                })
            }
            Err(error) => {
                tracing::warn!(
                    "🗳️  Vote failed: voter_id={}, candidate_id={}, error={}",
                    voter_id,
                    candidate_id,
                    error
                );
                self.device.publish(DeviceEvent::vote_error(
                    Some(voter_id),
                    Some(candidate_id),
                    &error,
                ));
                Err(error)
            }
        }
    }

    /// All ballots, ascending by identity
    pub async fn list_ballots(&self) -> Result<Vec<Ballot>> {
        self.store.ballots().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::types::ElectionPhase;

    async fn open_ledger() -> (Arc<ElectionStore>, BallotLedger) {
        let store = Arc::new(ElectionStore::for_testing());
        let (device, _rx) = DeviceChannel::new(32);
        store
            .insert_candidate("Alice".to_string(), None)
            .await
            .unwrap();
        store
            .insert_candidate("Bob".to_string(), None)
            .await
            .unwrap();
        store.transition_open().await.unwrap();
        (store.clone(), BallotLedger::new(store, device))
    }

    #[tokio::test]
    async fn test_cast_fails_outside_open_phase() {
        let store = Arc::new(ElectionStore::for_testing());
        let (device, _rx) = DeviceChannel::new(32);
        let ledger = BallotLedger::new(store.clone(), device);

        let result = ledger.cast_ballot(1, 1).await;
        match result {
            Err(Error::IllegalState { phase, .. }) => assert_eq!(phase, ElectionPhase::Setup),
            other => panic!("expected illegal state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cast_unknown_voter_not_found() {
        let (_store, ledger) = open_ledger().await;

        let result = ledger.cast_ballot(99, 1).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "voter", .. })));
    }

    #[tokio::test]
    async fn test_cast_unknown_candidate_not_found() {
        let (store, ledger) = open_ledger().await;
        let voter = store.upsert_voter(100).await.unwrap().voter().clone();

        let result = ledger.cast_ballot(voter.id, 99).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "candidate",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_takes_precedence_over_unknown_candidate() {
        let (store, ledger) = open_ledger().await;
        let voter = store.upsert_voter(100).await.unwrap().voter().clone();
        ledger.cast_ballot(voter.id, 1).await.unwrap();

        // Second attempt names a nonexistent candidate; the existing-ballot
        // check still comes first.
        let outcome = ledger.cast_ballot(voter.id, 99).await.unwrap();
        assert!(matches!(outcome, CastOutcome::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_mutates_nothing() {
        let (store, ledger) = open_ledger().await;
        let voter = store.upsert_voter(100).await.unwrap().voter().clone();

        let first = ledger.cast_ballot(voter.id, 1).await.unwrap();
        let recorded = first.ballot().unwrap().clone();

        let second = ledger.cast_ballot(voter.id, 2).await.unwrap();
        assert!(!second.was_recorded());

        let ballots = ledger.list_ballots().await.unwrap();
        assert_eq!(ballots, vec![recorded]);
    }

    #[tokio::test]
    async fn test_cast_outcomes_notify_device() {
        let store = Arc::new(ElectionStore::for_testing());
        let (device, mut rx) = DeviceChannel::new(32);
        store
            .insert_candidate("Alice".to_string(), None)
            .await
            .unwrap();
        store
            .insert_candidate("Bob".to_string(), None)
            .await
            .unwrap();
        store.transition_open().await.unwrap();
        let ledger = BallotLedger::new(store.clone(), device);
        let voter = store.upsert_voter(100).await.unwrap().voter().clone();

        ledger.cast_ballot(voter.id, 1).await.unwrap();
        ledger.cast_ballot(voter.id, 1).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            DeviceEvent::VoteOutcome {
                status: crate::engine::device::VoteStatus::Success,
                ballot_id: Some(1),
                ..
            }
        ));

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            DeviceEvent::VoteOutcome {
                status: crate::engine::device::VoteStatus::Duplicate,
                ballot_id: Some(1),
                ..
            }
        ));
    }
}
