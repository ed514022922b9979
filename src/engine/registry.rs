//! Candidate and voter identity registries
//!
//! The candidate registry manages the eligible-candidate set during the
//! setup phase. The voter registry maps external biometric identifiers to
//! internal voter identities, idempotently: registering the same identifier
//! twice is a success that returns the existing voter, not an error.

use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::input_error;
use crate::types::{BiometricId, Candidate, CandidateId, Voter};

use super::device::{DeviceChannel, DeviceEvent};
use super::store::ElectionStore;

/// Result of a registration attempt
///
/// Both variants carry the voter the biometric identifier now resolves to;
/// `Existing` is the intentional idempotent path, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// A fresh voter record was created
    Created(Voter),

    /// The biometric identifier was already registered
    Existing(Voter),
}

impl RegisterOutcome {
    /// The voter this registration resolved to
    pub fn voter(&self) -> &Voter {
        match self {
            Self::Created(voter) | Self::Existing(voter) => voter,
        }
    }

    /// Whether this registration created a new voter record
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Registry of eligible candidates
pub struct CandidateRegistry {
    store: Arc<ElectionStore>,
}

impl CandidateRegistry {
    pub fn new(store: Arc<ElectionStore>) -> Self {
        Self { store }
    }

    /// Add a candidate. Legal only during setup; the name must not be blank.
    pub async fn add_candidate(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Candidate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(input_error!("candidate name must not be blank"));
        }

        let candidate = self
            .store
            .insert_candidate(name.to_string(), description)
            .await?;

        tracing::info!(
            "📋 Candidate registered: id={}, name={}",
            candidate.id,
            candidate.name
        );
        Ok(candidate)
    }

    /// Remove a candidate. Legal only during setup.
    pub async fn remove_candidate(&self, id: CandidateId) -> Result<Candidate> {
        let removed = self.store.remove_candidate(id).await?;
        tracing::info!("🗑️ Candidate removed: id={}, name={}", removed.id, removed.name);
        Ok(removed)
    }

    /// All candidates, ascending by identity. Side-effect free.
    pub async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        self.store.candidates().await
    }
}

/// Registry mapping biometric identifiers to voter identities
pub struct VoterRegistry {
    store: Arc<ElectionStore>,
    device: DeviceChannel,
}

impl VoterRegistry {
    pub fn new(store: Arc<ElectionStore>, device: DeviceChannel) -> Self {
        Self { store, device }
    }

    /// Register the given biometric identifier, idempotently.
    ///
    /// The outcome is reported to the device channel after the store
    /// commit; a notification that cannot be delivered never rolls the
    /// registration back.
    pub async fn register_voter(&self, biometric_id: BiometricId) -> Result<RegisterOutcome> {
        match self.store.upsert_voter(biometric_id).await {
            Ok(outcome) => {
                let voter = outcome.voter();
                if outcome.was_created() {
                    tracing::info!(
                        "👤 Voter registered: biometric_id={}, voter_id={}",
                        biometric_id,
                        voter.id
                    );
                    self.device.publish(DeviceEvent::registration_created(voter));
                } else {
                    tracing::info!(
                        "👤 Voter already registered: biometric_id={}, voter_id={}",
                        biometric_id,
                        voter.id
                    );
                    self.device.publish(DeviceEvent::registration_exists(voter));
                }
                Ok(outcome)
            }
            Err(error) => {
                tracing::warn!(
                    "👤 Voter registration failed: biometric_id={}, error={}",
                    biometric_id,
                    error
                );
                self.device
                    .publish(DeviceEvent::registration_error(biometric_id, &error));
                Err(error)
            }
        }
    }

    /// Resolve a biometric identifier to its registered voter
    pub async fn identify(&self, biometric_id: BiometricId) -> Result<Voter> {
        self.store
            .find_voter(biometric_id)
            .await?
            .ok_or_else(|| Error::not_found("voter", biometric_id))
    }

    /// All voters, ascending by identity
    pub async fn list_voters(&self) -> Result<Vec<Voter>> {
        self.store.voters().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::device::RegistrationStatus;

    fn registries() -> (CandidateRegistry, VoterRegistry) {
        let store = Arc::new(ElectionStore::for_testing());
        let (device, _rx) = DeviceChannel::new(32);
        (
            CandidateRegistry::new(store.clone()),
            VoterRegistry::new(store, device),
        )
    }

    #[tokio::test]
    async fn test_blank_candidate_name_rejected() {
        let (candidates, _) = registries();

        let result = candidates.add_candidate("   ", None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = candidates.add_candidate("", None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_candidate_name_is_trimmed() {
        let (candidates, _) = registries();

        let candidate = candidates.add_candidate("  Alice  ", None).await.unwrap();
        assert_eq!(candidate.name, "Alice");
    }

    #[tokio::test]
    async fn test_remove_unknown_candidate_not_found() {
        let (candidates, _) = registries();

        let result = candidates.remove_candidate(42).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_candidates_ascending() {
        let (candidates, _) = registries();
        candidates.add_candidate("Carol", None).await.unwrap();
        candidates.add_candidate("Alice", None).await.unwrap();
        candidates.add_candidate("Bob", None).await.unwrap();

        let listed = candidates.list_candidates().await.unwrap();
        let ids: Vec<CandidateId> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_registration_notifies_device() {
        let store = Arc::new(ElectionStore::for_testing());
        let (device, mut rx) = DeviceChannel::new(32);
        let voters = VoterRegistry::new(store, device);

        voters.register_voter(123).await.unwrap();
        voters.register_voter(123).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            DeviceEvent::RegistrationOutcome {
                status: RegistrationStatus::Created,
                biometric_id: 123,
                voter_id: Some(1),
                ..
            }
        ));

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            DeviceEvent::RegistrationOutcome {
                status: RegistrationStatus::Exists,
                voter_id: Some(1),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_identify_unknown_biometric_not_found() {
        let (_, voters) = registries();

        let result = voters.identify(999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
