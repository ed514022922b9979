//! Inbound command boundary
//!
//! Every external event — a device message or an API call — arrives as a
//! [`Command`] and is routed to the owning component by
//! [`ElectionEngine::dispatch`]. Devices identify voters by biometric
//! identifier, so a cast command is resolved to an internal voter identity
//! before it reaches the ledger. Every command returns a definite outcome
//! synchronously; only `Unavailable` leaves the caller to retry.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{BiometricId, Candidate, CandidateId, TallyResult};

use super::device::DeviceEvent;
use super::ledger::CastOutcome;
use super::registry::RegisterOutcome;
use super::ElectionEngine;

/// A command accepted by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Register a candidate (setup only)
    AddCandidate {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },

    /// Remove a candidate (setup only)
    RemoveCandidate { candidate_id: CandidateId },

    /// Register the voter holding this biometric identifier
    RegisterVoter { biometric_id: BiometricId },

    /// Cast a ballot; the device knows the voter only by biometric
    /// identifier
    CastBallot {
        biometric_id: BiometricId,
        candidate_id: CandidateId,
    },

    /// Ask for the candidate roster (answered with a placeholder before
    /// the election opens)
    RequestCandidates,

    /// Open the election for voting
    OpenElection,

    /// Close the election and finalize the result
    CloseElection,

    /// Discard all election data and restart setup
    ResetElection,
}

/// The definite outcome of a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    CandidateAdded(Candidate),
    CandidateRemoved(Candidate),
    VoterRegistered(RegisterOutcome),
    BallotCast(CastOutcome),
    /// The roster as published, or `None` when the election has not
    /// opened yet
    CandidatesPublished { roster: Option<Vec<Candidate>> },
    ElectionOpened { candidates: Vec<Candidate> },
    ElectionClosed { tally: TallyResult },
    ElectionReset,
}

impl ElectionEngine {
    /// Route a command to the owning component
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::AddCandidate { name, description } => {
                let candidate = self.candidates.add_candidate(&name, description).await?;
                Ok(CommandOutcome::CandidateAdded(candidate))
            }
            Command::RemoveCandidate { candidate_id } => {
                let removed = self.candidates.remove_candidate(candidate_id).await?;
                Ok(CommandOutcome::CandidateRemoved(removed))
            }
            Command::RegisterVoter { biometric_id } => {
                let outcome = self.voters.register_voter(biometric_id).await?;
                Ok(CommandOutcome::VoterRegistered(outcome))
            }
            Command::CastBallot {
                biometric_id,
                candidate_id,
            } => {
                let voter = match self.voters.identify(biometric_id).await {
                    Ok(voter) => voter,
                    Err(error) => {
                        // The ledger was never reached, so the device is
                        // answered from here.
                        self.device
                            .publish(DeviceEvent::vote_error(None, Some(candidate_id), &error));
                        return Err(error);
                    }
                };
                let outcome = self.ledger.cast_ballot(voter.id, candidate_id).await?;
                Ok(CommandOutcome::BallotCast(outcome))
            }
            Command::RequestCandidates => {
                if self.lifecycle.phase().await?.is_setup() {
                    self.device.publish(DeviceEvent::RosterPending);
                    return Ok(CommandOutcome::CandidatesPublished { roster: None });
                }
                let candidates = self.candidates.list_candidates().await?;
                self.device.publish(DeviceEvent::CandidateRoster {
                    candidates: candidates.clone(),
                });
                Ok(CommandOutcome::CandidatesPublished {
                    roster: Some(candidates),
                })
            }
            Command::OpenElection => {
                let candidates = self.lifecycle.open_election().await?;
                Ok(CommandOutcome::ElectionOpened { candidates })
            }
            Command::CloseElection => {
                let tally = self.lifecycle.close_election().await?;
                Ok(CommandOutcome::ElectionClosed { tally })
            }
            Command::ResetElection => {
                self.lifecycle.reset().await?;
                Ok(CommandOutcome::ElectionReset)
            }
        }
    }
}
