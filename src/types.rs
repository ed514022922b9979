//! # Core Types for the Election Coordination Engine
//!
//! This module defines the fundamental data structures used throughout the
//! engine: the three persisted entities (candidates, voters, ballots), the
//! lifecycle phase value that gates every mutation, and the derived tally
//! types produced at finalization.
//!
//! ## Identity Design
//!
//! - **Sequential integers**: every entity receives a small integer identity
//!   from a per-table counter at creation time; counters restart on reset
//! - **Biometric separation**: voters are known to the outside world only by
//!   the opaque identifier their scanning device presents; the internal
//!   voter id never leaves the coordinator except in notifications
//! - **Immutability**: candidates and voters are never mutated after
//!   creation, ballots never after casting
//!
//! ## Usage Example
//!
//! ```rust
//! use urna::types::{ElectionPhase, Voter};
//! use chrono::Utc;
//!
//! let phase = ElectionPhase::Setup;
//! assert!(phase.is_setup());
//! assert!(!phase.is_open());
//!
//! let voter = Voter {
//!     id: 1,
//!     biometric_id: 123,
//!     registered_at: Utc::now(),
//! };
//! assert_eq!(voter.biometric_id, 123);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a candidate, assigned on creation and stable for the
/// election's lifetime.
pub type CandidateId = u32;

/// Identity of a voter, assigned on first registration of their
/// biometric identifier.
pub type VoterId = u32;

/// Identity of a ballot, assigned at cast time. Ballot ordering by
/// identity is the only ordering the engine relies on.
pub type BallotId = u32;

/// Opaque identifier presented by the scanning device to identify a
/// person before they are known to the engine as a [`Voter`].
///
/// The engine never interprets the value; fingerprint scanners report
/// small numeric slot ids, but any 64-bit value is accepted.
pub type BiometricId = u64;

/// The election lifecycle phase
///
/// A single process-wide value with three states, owned exclusively by the
/// lifecycle component. Every mutating operation is gated on it:
///
/// - `Setup`: candidate changes are legal, voting is not
/// - `Open`: voting is legal, candidate changes are not
/// - `Closed`: terminal; the tally computed at close is authoritative
///
/// The only backward transition is a full reset, which discards all
/// election data and returns to a fresh `Setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionPhase {
    Setup,
    Open,
    Closed,
}

impl ElectionPhase {
    /// Check whether the election is still being configured
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup)
    }

    /// Check whether the election is currently accepting ballots
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Check whether the election has been finalized
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::Setup => "setup",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        write!(f, "{phase}")
    }
}

/// An eligible candidate
///
/// Candidates are created and deleted only during the `Setup` phase and are
/// never mutated otherwise. At least two candidates must exist before the
/// election may open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Sequential identity, stable for the election's lifetime
    pub id: CandidateId,

    /// Display name as it appears on the device and the dashboard.
    /// Guaranteed non-blank by the registry.
    pub name: String,

    /// Optional free-form description shown alongside the name
    pub description: Option<String>,

    /// When this candidate record was created
    pub registered_at: DateTime<Utc>,
}

/// A registered voter
///
/// Created exactly once per distinct biometric identifier; a repeat
/// registration of the same identifier returns the existing record.
/// Voters are never mutated or deleted during an election.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voter {
    /// Sequential identity, assigned on first registration
    pub id: VoterId,

    /// The external biometric identifier this voter registered with.
    /// Unique across all voters.
    pub biometric_id: BiometricId,

    /// When this voter first registered
    pub registered_at: DateTime<Utc>,
}

/// A single recorded vote, linking one voter to one candidate
///
/// At most one ballot exists per voter; the store enforces this at
/// insertion time. Ballots are immutable once created and are never
/// deleted except by a full election reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ballot {
    /// Sequential identity, assigned at cast time
    pub id: BallotId,

    /// The voter who cast this ballot
    pub voter_id: VoterId,

    /// The candidate this ballot is for
    pub candidate_id: CandidateId,

    /// When this ballot was recorded
    pub cast_at: DateTime<Utc>,
}

/// Per-candidate vote count within a [`TallyResult`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateStanding {
    /// The candidate being counted
    pub candidate_id: CandidateId,

    /// Candidate display name, carried so result consumers need no
    /// second lookup
    pub name: String,

    /// Number of ballots referencing this candidate (0 if none)
    pub votes: u64,
}

/// Classification of a tally: a clear winner, or a tie-set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Verdict {
    /// Exactly one candidate holds the highest vote count. Valid even at
    /// zero votes when every other candidate also has zero and only one
    /// candidate exists.
    Winner(CandidateStanding),

    /// More than one candidate shares the highest vote count
    Tie {
        /// The shared maximum vote count
        votes: u64,
        /// Every candidate at that count, name-ascending
        candidates: Vec<CandidateStanding>,
    },
}

/// Aggregated election result
///
/// A pure function of the candidate and ballot sets at the moment of
/// computation; nothing here is persisted as its own entity. The result
/// computed when the lifecycle transitions to `Closed` is the
/// authoritative record of the election.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallyResult {
    /// All candidates with their counts, ordered by votes descending,
    /// ties broken by name ascending
    pub standings: Vec<CandidateStanding>,

    /// Total distinct voters who cast a ballot. Equal to the ballot
    /// count, since each voter holds at most one ballot.
    pub total_voters: u64,

    /// Winner-or-tie classification. `None` only when no candidates
    /// exist, which is reachable only before the election opens.
    pub verdict: Option<Verdict>,
}

impl TallyResult {
    /// The winning candidate, if the verdict is a clear win
    pub fn winner(&self) -> Option<&CandidateStanding> {
        match &self.verdict {
            Some(Verdict::Winner(standing)) => Some(standing),
            _ => None,
        }
    }

    /// Whether the outcome is a tie
    pub fn is_tie(&self) -> bool {
        matches!(&self.verdict, Some(Verdict::Tie { .. }))
    }
}
