//! In-process election store
//!
//! The single source of truth for candidates, voters and ballots, plus the
//! lifecycle phase cell. Three append-mostly tables with two uniqueness
//! constraints (voter↔biometric identifier, voter↔ballot) enforced at the
//! point of insertion: every check-then-write of one operation happens under
//! one exclusive guard, so the second of two racing writers observes the
//! first one's row instead of creating a duplicate. Read-only pre-checks
//! elsewhere in the engine are latency optimizations, never the correctness
//! mechanism.
//!
//! Every store access is bounded by the configured timeout and fails with
//! [`Error::Unavailable`] instead of hanging.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;

use crate::config::EngineConfig;
use crate::errors::{Error, Result};
use crate::types::{
    Ballot, BallotId, BiometricId, Candidate, CandidateId, ElectionPhase, TallyResult, Voter,
    VoterId,
};

use super::ledger::CastOutcome;
use super::lifecycle::MIN_CANDIDATES;
use super::registry::RegisterOutcome;
use super::tally;

/// First identity handed out by each table counter, also after a reset.
const INITIAL_ID: u32 = 1;

/// Auto-increment identity counter for one table
#[derive(Debug)]
struct IdCounter {
    next: u32,
}

impl IdCounter {
    fn new() -> Self {
        Self { next: INITIAL_ID }
    }

    /// Hand out the next identity and advance the counter
    fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// All election state, guarded as one unit
///
/// A single guard keeps the phase-gate check atomic with the write it
/// gates and makes lifecycle transitions totally ordered.
#[derive(Debug)]
struct StoreInner {
    phase: ElectionPhase,
    candidates: BTreeMap<CandidateId, Candidate>,
    voters: BTreeMap<VoterId, Voter>,
    voter_by_biometric: HashMap<BiometricId, VoterId>,
    ballots: BTreeMap<BallotId, Ballot>,
    ballot_by_voter: HashMap<VoterId, BallotId>,
    candidate_ids: IdCounter,
    voter_ids: IdCounter,
    ballot_ids: IdCounter,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            phase: ElectionPhase::Setup,
            candidates: BTreeMap::new(),
            voters: BTreeMap::new(),
            voter_by_biometric: HashMap::new(),
            ballots: BTreeMap::new(),
            ballot_by_voter: HashMap::new(),
            candidate_ids: IdCounter::new(),
            voter_ids: IdCounter::new(),
            ballot_ids: IdCounter::new(),
        }
    }
}

/// The election store
pub struct ElectionStore {
    inner: RwLock<StoreInner>,
    access_timeout: Duration,
}

impl ElectionStore {
    /// Create an empty store in the `Setup` phase
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::new()),
            access_timeout: config.store_timeout(),
        }
    }

    /// Create a store with testing configuration
    pub fn for_testing() -> Self {
        Self::new(&EngineConfig::for_testing())
    }

    /// Acquire the shared guard within the bounded timeout
    async fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, StoreInner>> {
        timeout(self.access_timeout, self.inner.read())
            .await
            .map_err(|_| Error::unavailable(operation))
    }

    /// Acquire the exclusive guard within the bounded timeout
    async fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, StoreInner>> {
        timeout(self.access_timeout, self.inner.write())
            .await
            .map_err(|_| Error::unavailable(operation))
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> Result<ElectionPhase> {
        Ok(self.read("phase").await?.phase)
    }

    /// Insert a new candidate. Legal only during `Setup`.
    ///
    /// The caller validates the name; the store only gates and assigns.
    pub async fn insert_candidate(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Candidate> {
        let mut inner = self.write("add_candidate").await?;

        if !inner.phase.is_setup() {
            return Err(Error::illegal_state("add_candidate", inner.phase));
        }

        let id = inner.candidate_ids.allocate();
        let candidate = Candidate {
            id,
            name,
            description,
            registered_at: Utc::now(),
        };
        inner.candidates.insert(id, candidate.clone());

        Ok(candidate)
    }

    /// Remove a candidate. Legal only during `Setup`.
    pub async fn remove_candidate(&self, id: CandidateId) -> Result<Candidate> {
        let mut inner = self.write("remove_candidate").await?;

        if !inner.phase.is_setup() {
            return Err(Error::illegal_state("remove_candidate", inner.phase));
        }

        inner
            .candidates
            .remove(&id)
            .ok_or_else(|| Error::not_found("candidate", id))
    }

    /// All candidates, ascending by identity
    pub async fn candidates(&self) -> Result<Vec<Candidate>> {
        let inner = self.read("list_candidates").await?;
        Ok(inner.candidates.values().cloned().collect())
    }

    /// Register a voter for the given biometric identifier, idempotently.
    ///
    /// The lookup and the insert happen under one exclusive guard: exactly
    /// one voter row can ever exist per biometric identifier, and the loser
    /// of a concurrent duplicate registration observes the winner's row as
    /// [`RegisterOutcome::Existing`].
    pub async fn upsert_voter(&self, biometric_id: BiometricId) -> Result<RegisterOutcome> {
        let mut inner = self.write("register_voter").await?;

        if let Some(&voter_id) = inner.voter_by_biometric.get(&biometric_id) {
            let voter = inner
                .voters
                .get(&voter_id)
                .cloned()
                .ok_or_else(|| Error::internal("biometric index points at a missing voter"))?;
            return Ok(RegisterOutcome::Existing(voter));
        }

        let id = inner.voter_ids.allocate();
        let voter = Voter {
            id,
            biometric_id,
            registered_at: Utc::now(),
        };
        inner.voters.insert(id, voter.clone());
        inner.voter_by_biometric.insert(biometric_id, id);

        Ok(RegisterOutcome::Created(voter))
    }

    /// Look up a voter by biometric identifier
    pub async fn find_voter(&self, biometric_id: BiometricId) -> Result<Option<Voter>> {
        let inner = self.read("find_voter").await?;
        let voter = inner
            .voter_by_biometric
            .get(&biometric_id)
            .and_then(|voter_id| inner.voters.get(voter_id))
            .cloned();
        Ok(voter)
    }

    /// All voters, ascending by identity
    pub async fn voters(&self) -> Result<Vec<Voter>> {
        let inner = self.read("list_voters").await?;
        Ok(inner.voters.values().cloned().collect())
    }

    /// Record a ballot, enforcing the one-vote-per-voter invariant.
    ///
    /// Preconditions are checked in a fixed order under one exclusive
    /// guard: lifecycle phase, known voter, no existing ballot, known
    /// candidate. A duplicate is reported as [`CastOutcome::Duplicate`]
    /// with nothing mutated.
    pub async fn insert_ballot(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<CastOutcome> {
        let mut inner = self.write("cast_ballot").await?;

        if !inner.phase.is_open() {
            return Err(Error::illegal_state("cast_ballot", inner.phase));
        }
        if !inner.voters.contains_key(&voter_id) {
            return Err(Error::not_found("voter", voter_id));
        }
        if let Some(&existing_ballot) = inner.ballot_by_voter.get(&voter_id) {
            return Ok(CastOutcome::Duplicate {
                voter_id,
                existing_ballot,
            });
        }
        if !inner.candidates.contains_key(&candidate_id) {
            return Err(Error::not_found("candidate", candidate_id));
        }

        let id = inner.ballot_ids.allocate();
        let ballot = Ballot {
            id,
            voter_id,
            candidate_id,
            cast_at: Utc::now(),
        };
        inner.ballots.insert(id, ballot.clone());
        inner.ballot_by_voter.insert(voter_id, id);

        Ok(CastOutcome::Recorded(ballot))
    }

    /// All ballots, ascending by identity
    pub async fn ballots(&self) -> Result<Vec<Ballot>> {
        let inner = self.read("list_ballots").await?;
        Ok(inner.ballots.values().cloned().collect())
    }

    /// Consistent snapshot of candidates and ballots for tallying
    pub async fn snapshot(&self) -> Result<(Vec<Candidate>, Vec<Ballot>)> {
        let inner = self.read("compute_tally").await?;
        Ok((
            inner.candidates.values().cloned().collect(),
            inner.ballots.values().cloned().collect(),
        ))
    }

    /// Transition `Setup` → `Open`, returning the finalized roster.
    ///
    /// Called only by the lifecycle component, which owns the phase.
    pub(crate) async fn transition_open(&self) -> Result<Vec<Candidate>> {
        let mut inner = self.write("open_election").await?;

        if !inner.phase.is_setup() {
            return Err(Error::illegal_state("open_election", inner.phase));
        }
        if inner.candidates.len() < MIN_CANDIDATES {
            return Err(Error::precondition(format!(
                "opening requires at least {MIN_CANDIDATES} candidates, have {}",
                inner.candidates.len()
            )));
        }

        inner.phase = ElectionPhase::Open;
        Ok(inner.candidates.values().cloned().collect())
    }

    /// Transition `Open` → `Closed`, returning the authoritative tally.
    ///
    /// The tally is computed under the same guard that flips the phase, so
    /// no ballot can slip in between the count and the transition.
    pub(crate) async fn transition_close(&self) -> Result<TallyResult> {
        let mut inner = self.write("close_election").await?;

        if !inner.phase.is_open() {
            return Err(Error::illegal_state("close_election", inner.phase));
        }

        let candidates: Vec<Candidate> = inner.candidates.values().cloned().collect();
        let ballots: Vec<Ballot> = inner.ballots.values().cloned().collect();
        let result = tally::compute(&candidates, &ballots);

        inner.phase = ElectionPhase::Closed;
        Ok(result)
    }

    /// Clear all election data and return to a fresh `Setup`.
    ///
    /// Identity counters restart from the beginning. Legal from any phase.
    pub(crate) async fn transition_reset(&self) -> Result<()> {
        let mut inner = self.write("reset_election").await?;
        *inner = StoreInner::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment() {
        let mut counter = IdCounter::new();
        assert_eq!(counter.allocate(), INITIAL_ID);
        assert_eq!(counter.allocate(), INITIAL_ID + 1);
        assert_eq!(counter.allocate(), INITIAL_ID + 2);
    }

    #[tokio::test]
    async fn test_candidate_insertion_assigns_sequential_ids() {
        let store = ElectionStore::for_testing();

        let first = store
            .insert_candidate("Alice".to_string(), None)
            .await
            .unwrap();
        let second = store
            .insert_candidate("Bob".to_string(), Some("challenger".to_string()))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.description.as_deref(), Some("challenger"));
    }

    #[tokio::test]
    async fn test_upsert_voter_is_idempotent() {
        let store = ElectionStore::for_testing();

        let first = store.upsert_voter(500).await.unwrap();
        let second = store.upsert_voter(500).await.unwrap();

        assert!(matches!(first, RegisterOutcome::Created(_)));
        match second {
            RegisterOutcome::Existing(voter) => assert_eq!(voter.id, first.voter().id),
            other => panic!("expected existing voter, got {other:?}"),
        }
        assert_eq!(store.voters().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ballot_uniqueness_enforced_at_insert() {
        let store = ElectionStore::for_testing();
        store
            .insert_candidate("Alice".to_string(), None)
            .await
            .unwrap();
        store
            .insert_candidate("Bob".to_string(), None)
            .await
            .unwrap();
        store.transition_open().await.unwrap();
        let voter = store.upsert_voter(100).await.unwrap().voter().clone();

        let first = store.insert_ballot(voter.id, 1).await.unwrap();
        let second = store.insert_ballot(voter.id, 2).await.unwrap();

        assert!(matches!(first, CastOutcome::Recorded(_)));
        assert!(matches!(second, CastOutcome::Duplicate { .. }));
        assert_eq!(store.ballots().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_restarts_counters() {
        let store = ElectionStore::for_testing();
        store
            .insert_candidate("Alice".to_string(), None)
            .await
            .unwrap();
        store.upsert_voter(700).await.unwrap();

        store.transition_reset().await.unwrap();

        assert_eq!(store.phase().await.unwrap(), ElectionPhase::Setup);
        assert!(store.candidates().await.unwrap().is_empty());
        assert!(store.voters().await.unwrap().is_empty());
        assert!(store.ballots().await.unwrap().is_empty());

        let candidate = store
            .insert_candidate("Carol".to_string(), None)
            .await
            .unwrap();
        assert_eq!(candidate.id, INITIAL_ID);
    }

    #[tokio::test]
    async fn test_store_access_times_out_as_unavailable() {
        let config = EngineConfig {
            store_timeout_ms: 20,
            device_channel_capacity: 8,
        };
        let store = ElectionStore::new(&config);

        // Hold the exclusive guard so every access must wait it out.
        let _guard = store.inner.write().await;

        let result = store.phase().await;
        assert!(matches!(result, Err(Error::Unavailable { .. })));

        let result = store.upsert_voter(1).await;
        assert!(matches!(result, Err(Error::Unavailable { .. })));
    }
}
