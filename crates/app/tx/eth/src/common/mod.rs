//! Capability registry: one chain at one protocol fork.
//!
//! Transactions hold an `Arc<Common>` and ask it which upgrades are active to
//! decide which fields, fee rules and signature checks apply. A `Common` is
//! immutable once built; deriving a registry for another fork produces a new
//! value.

mod chain;
pub mod config;
mod hardfork;
mod params;

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

pub use chain::Chain;
pub use config::{load_config, load_config_from_str, ChainConfig, ConfigError};
pub use hardfork::{eip, Hardfork};
pub use params::GasParams;

/// Registry construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("unknown hardfork: {0}")]
    UnknownFork(String),
}

/// Chain id, fork and explicitly enabled upgrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    chain_name: String,
    chain_id: u64,
    hardfork: Hardfork,
    extra_eips: BTreeSet<u32>,
}

impl Common {
    /// Registry for a well-known chain.
    pub fn new(chain: Chain, hardfork: Hardfork) -> Self {
        Self {
            chain_name: chain.name().to_string(),
            chain_id: chain.id(),
            hardfork,
            extra_eips: BTreeSet::new(),
        }
    }

    /// Registry from a chain selector (name or decimal id) and a fork name.
    pub fn from_names(chain: &str, hardfork: &str) -> Result<Self, CommonError> {
        let chain: Chain = chain.parse()?;
        let hardfork: Hardfork = hardfork.parse()?;
        Ok(Self::new(chain, hardfork))
    }

    /// Registry for a chain that is not in the well-known list.
    pub fn custom(name: impl Into<String>, chain_id: u64, hardfork: Hardfork) -> Self {
        Self {
            chain_name: name.into(),
            chain_id,
            hardfork,
            extra_eips: BTreeSet::new(),
        }
    }

    /// Registry for `chain_id` at the default fork: the well-known chain if
    /// there is one, otherwise a custom chain carrying that id.
    pub fn for_chain_id(chain_id: u64) -> Self {
        match Chain::from_id(chain_id) {
            Ok(chain) => Self::new(chain, Hardfork::default()),
            Err(_) => {
                tracing::debug!(chain_id, "using custom chain registry");
                Self::custom(format!("custom-{chain_id}"), chain_id, Hardfork::default())
            }
        }
    }

    /// Copy of this registry with additional upgrades switched on.
    pub fn with_eips(&self, eips: impl IntoIterator<Item = u32>) -> Self {
        let mut next = self.clone();
        next.extra_eips.extend(eips);
        next
    }

    /// Copy of this registry at another fork.
    pub fn with_hardfork(&self, hardfork: Hardfork) -> Self {
        let mut next = self.clone();
        next.hardfork = hardfork;
        next
    }

    /// Convenience for sharing the registry between transactions.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Whether `eip` is active: either the configured fork is at or after the
    /// fork that introduced it, or it was enabled explicitly.
    pub fn is_active(&self, eip: u32) -> bool {
        if self.extra_eips.contains(&eip) {
            return true;
        }
        Hardfork::activating(eip).is_some_and(|fork| self.hardfork >= fork)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    pub fn at_or_after(&self, hardfork: Hardfork) -> bool {
        self.hardfork >= hardfork
    }

    /// Upgrades enabled outside of the fork schedule.
    pub fn extra_eips(&self) -> impl Iterator<Item = u32> + '_ {
        self.extra_eips.iter().copied()
    }

    pub fn gas_params(&self) -> GasParams {
        GasParams::for_common(self)
    }
}

impl Default for Common {
    fn default() -> Self {
        Self::new(Chain::Mainnet, Hardfork::default())
    }
}
