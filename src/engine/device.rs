//! Outbound device notification channel
//!
//! The engine reports registration outcomes, vote outcomes, the candidate
//! roster and the final result to the physical scanning device through a
//! bounded queue. Delivery is fire-and-report: an operation's success is
//! decided by the store commit alone, and a notification that cannot be
//! enqueued is logged and dropped, never propagated and never rolled back.
//!
//! The transport draining the queue (the MQTT bridge) lives outside the
//! engine; [`DeviceMessage::to_payload`] renders the JSON it forwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::types::{
    Ballot, BallotId, BiometricId, Candidate, CandidateId, TallyResult, Voter, VoterId,
};

/// Outcome reported for a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Created,
    Exists,
    Error,
}

/// Outcome reported for a vote attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Success,
    Duplicate,
    Error,
}

/// A notification for the device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Result of a voter registration attempt
    RegistrationOutcome {
        status: RegistrationStatus,
        biometric_id: BiometricId,
        voter_id: Option<VoterId>,
        detail: Option<String>,
    },

    /// Result of a vote attempt
    VoteOutcome {
        status: VoteStatus,
        voter_id: Option<VoterId>,
        ballot_id: Option<BallotId>,
        candidate_id: Option<CandidateId>,
        detail: Option<String>,
    },

    /// The finalized candidate roster, published when the election opens
    /// and whenever the device asks for it afterwards
    CandidateRoster { candidates: Vec<Candidate> },

    /// Placeholder answer when the roster is requested before the
    /// election has opened
    RosterPending,

    /// The authoritative result, published when the election closes
    FinalResult { tally: TallyResult },
}

impl DeviceEvent {
    /// Registration succeeded with a fresh voter record
    pub fn registration_created(voter: &Voter) -> Self {
        Self::RegistrationOutcome {
            status: RegistrationStatus::Created,
            biometric_id: voter.biometric_id,
            voter_id: Some(voter.id),
            detail: None,
        }
    }

    /// Registration hit an already-registered biometric identifier
    pub fn registration_exists(voter: &Voter) -> Self {
        Self::RegistrationOutcome {
            status: RegistrationStatus::Exists,
            biometric_id: voter.biometric_id,
            voter_id: Some(voter.id),
            detail: None,
        }
    }

    /// Registration failed before anything was committed
    pub fn registration_error(biometric_id: BiometricId, error: &Error) -> Self {
        Self::RegistrationOutcome {
            status: RegistrationStatus::Error,
            biometric_id,
            voter_id: None,
            detail: Some(error.to_string()),
        }
    }

    /// A ballot was recorded
    pub fn vote_recorded(ballot: &Ballot) -> Self {
        Self::VoteOutcome {
            status: VoteStatus::Success,
            voter_id: Some(ballot.voter_id),
            ballot_id: Some(ballot.id),
            candidate_id: Some(ballot.candidate_id),
            detail: None,
        }
    }

    /// The voter already holds a ballot; nothing was mutated
    pub fn vote_duplicate(voter_id: VoterId, existing_ballot: BallotId) -> Self {
        Self::VoteOutcome {
            status: VoteStatus::Duplicate,
            voter_id: Some(voter_id),
            ballot_id: Some(existing_ballot),
            candidate_id: None,
            detail: None,
        }
    }

    /// The vote attempt failed before anything was committed
    pub fn vote_error(
        voter_id: Option<VoterId>,
        candidate_id: Option<CandidateId>,
        error: &Error,
    ) -> Self {
        Self::VoteOutcome {
            status: VoteStatus::Error,
            voter_id,
            ballot_id: None,
            candidate_id,
            detail: Some(error.to_string()),
        }
    }
}

/// An enqueued notification with its delivery envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceMessage {
    /// Unique message identity, for downstream deduplication
    pub message_id: Uuid,

    /// When the engine emitted this message
    pub emitted_at: DateTime<Utc>,

    /// The notification itself
    pub event: DeviceEvent,
}

impl DeviceMessage {
    fn new(event: DeviceEvent) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        }
    }

    /// Render the JSON payload forwarded to the device transport
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sending half of the device notification queue
///
/// Cheap to clone; every engine component holds one.
#[derive(Debug, Clone)]
pub struct DeviceChannel {
    tx: mpsc::Sender<DeviceMessage>,
}

impl DeviceChannel {
    /// Create a channel with the given queue capacity, returning the
    /// receiving half for the transport to drain
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeviceMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueue a notification without blocking.
    ///
    /// A full or disconnected queue is logged and the message dropped;
    /// the committed operation behind it stands regardless.
    pub fn publish(&self, event: DeviceEvent) {
        let message = DeviceMessage::new(event);
        if let Err(err) = self.tx.try_send(message) {
            tracing::warn!("📡 Device notification dropped: {err}");
        }
    }
}
