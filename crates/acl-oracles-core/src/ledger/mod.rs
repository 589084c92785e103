//! Read-only ledger capabilities consumed by the oracles.
//!
//! The oracles never hold a reference to a concrete token or hatch contract.
//! They resolve the configured address through a [`LedgerView`] at decision
//! time, so reconfiguring a token takes effect on the next call.

mod memory;

pub use memory::{InMemoryLedger, TokenBalances};

use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no token ledger deployed at {0}")]
    UnknownToken(Address),

    #[error("no contribution ledger deployed at {0}")]
    UnknownHatch(Address),

    #[error("account {account} holds {balance}, needs {needed}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        needed: U256,
    },

    #[error("balance overflow")]
    Overflow,
}

/// ERC20-style balance lookup for a single token.
pub trait BalanceLedger {
    fn balance_of(&self, account: Address) -> Result<U256, LedgerError>;
}

/// Cumulative amount each account has contributed to a hatch.
pub trait ContributionLedger {
    fn contributions(&self, account: Address) -> Result<U256, LedgerError>;
}

/// Everything an oracle may read from its host environment.
pub trait LedgerView {
    /// Token ledger deployed at `token`.
    fn token(&self, token: Address) -> Result<&dyn BalanceLedger, LedgerError>;

    /// Contribution ledger of the hatch deployed at `hatch`.
    fn hatch(&self, hatch: Address) -> Result<&dyn ContributionLedger, LedgerError>;

    /// Whether code is deployed at `address`.
    fn is_contract(&self, address: Address) -> bool;
}
