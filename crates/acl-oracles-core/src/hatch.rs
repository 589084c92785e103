//! Hatch contribution app.
//!
//! Keeps the cumulative amount each account has contributed. Every
//! contribution goes through the permission gate with params
//! `[contributor, value]`, which is what lets a [`HatchOracle`] grant cap
//! contributions per account.
//!
//! [`HatchOracle`]: crate::oracle::HatchOracle

use crate::acl::{address_to_word, PermissionGate};
use crate::ledger::{ContributionLedger, LedgerError};
use alloy_primitives::{keccak256, Address, B256, U256};
use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

lazy_static! {
    pub static ref CONTRIBUTE_ROLE: B256 = keccak256("CONTRIBUTE_ROLE");
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HatchError {
    #[error("{contributor} is not allowed to contribute {value}")]
    AuthFailed { contributor: Address, value: U256 },

    #[error("contribution total overflow")]
    Overflow,
}

#[derive(Debug)]
pub struct Hatch {
    address: Address,
    contributions: RwLock<BTreeMap<Address, U256>>,
}

impl Hatch {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            contributions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Contribute `value` on behalf of `from`, if the gate allows it.
    pub fn contribute(
        &self,
        gate: &dyn PermissionGate,
        from: Address,
        value: U256,
    ) -> Result<(), HatchError> {
        let how = [address_to_word(from), value];
        if !gate.can_perform(from, self.address, *CONTRIBUTE_ROLE, &how) {
            tracing::debug!(event = "hatch_contribution_denied", hatch = %self.address, %from, %value);
            return Err(HatchError::AuthFailed {
                contributor: from,
                value,
            });
        }
        self.record(from, value)?;
        tracing::info!(event = "hatch_contribution", hatch = %self.address, %from, %value);
        Ok(())
    }

    /// Add to `account`'s total without consulting any gate.
    pub fn record(&self, account: Address, value: U256) -> Result<(), HatchError> {
        let mut book = self
            .contributions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let total = book.entry(account).or_insert(U256::ZERO);
        *total = total.checked_add(value).ok_or(HatchError::Overflow)?;
        Ok(())
    }

    pub fn total_contributed(&self) -> U256 {
        self.contributions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(*v))
    }
}

impl ContributionLedger for Hatch {
    fn contributions(&self, account: Address) -> Result<U256, LedgerError> {
        Ok(self
            .contributions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}
