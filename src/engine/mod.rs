//! The election coordination engine
//!
//! One store, four components around it: the candidate and voter
//! registries, the ballot ledger and the lifecycle state machine, plus the
//! tally computation over committed state and the two interface boundaries
//! (inbound commands, outbound device notifications).

pub mod commands;
pub mod device;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod store;
pub mod tally;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::types::TallyResult;

// Re-export the engine surface
pub use commands::{Command, CommandOutcome};
pub use device::{DeviceChannel, DeviceEvent, DeviceMessage, RegistrationStatus, VoteStatus};
pub use ledger::{BallotLedger, CastOutcome};
pub use lifecycle::{Lifecycle, MIN_CANDIDATES};
pub use registry::{CandidateRegistry, RegisterOutcome, VoterRegistry};
pub use store::ElectionStore;

/// The assembled engine
///
/// Construction wires every component to one shared store and one device
/// channel; the receiving half of the channel is handed to the caller for
/// the device transport to drain.
pub struct ElectionEngine {
    store: Arc<ElectionStore>,
    pub candidates: CandidateRegistry,
    pub voters: VoterRegistry,
    pub ledger: BallotLedger,
    pub lifecycle: Lifecycle,
    device: DeviceChannel,
}

impl ElectionEngine {
    /// Assemble an engine from configuration
    pub fn new(config: &EngineConfig) -> (Self, mpsc::Receiver<DeviceMessage>) {
        let store = Arc::new(ElectionStore::new(config));
        let (device, rx) = DeviceChannel::new(config.device_channel_capacity);

        let engine = Self {
            candidates: CandidateRegistry::new(store.clone()),
            voters: VoterRegistry::new(store.clone(), device.clone()),
            ledger: BallotLedger::new(store.clone(), device.clone()),
            lifecycle: Lifecycle::new(store.clone(), device.clone()),
            store,
            device,
        };
        (engine, rx)
    }

    /// Assemble an engine with testing configuration
    pub fn for_testing() -> (Self, mpsc::Receiver<DeviceMessage>) {
        Self::new(&EngineConfig::for_testing())
    }

    /// Compute the tally over the current committed state.
    ///
    /// Valid in any phase; authoritative once the election has closed.
    /// Pure: repeated calls over the same ballot set yield identical
    /// results and nothing is mutated.
    pub async fn compute_tally(&self) -> Result<TallyResult> {
        let (candidates, ballots) = self.store.snapshot().await?;
        Ok(tally::compute(&candidates, &ballots))
    }
}
