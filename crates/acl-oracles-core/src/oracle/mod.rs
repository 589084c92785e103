//! ACL oracles.
//!
//! An oracle is a read-only predicate the ACL consults for grants carrying an
//! oracle param. Both oracles here follow the same lifecycle:
//!
//! 1. `initialize` stores the configuration exactly once
//! 2. `can_perform` decides against the configured token ledger
//! 3. setters change the configuration behind a [`PermissionGate`]
//!
//! Gated setters on an uninitialized oracle fail with `AuthFailed`: the gate
//! is never consulted for an app that has not been initialized. The decision
//! function itself never consults the gate and reports `NotInitialized`.

mod hatch;
mod token_balance;

pub use hatch::{HatchConfig, HatchOracle, SET_RATIO_ROLE, SET_SCORE_TOKEN_ROLE};
pub use token_balance::{
    BalanceQuery, TokenBalanceConfig, TokenBalanceOracle, SET_BALANCE_ROLE, SET_TOKEN_ROLE,
};

use crate::acl::{word_to_address, PermissionGate};
use crate::errors::{OracleError, OracleKind};
use crate::ledger::LedgerView;
use alloy_primitives::{Address, B256, U256};

/// Fixed-point denominator of ratios, in parts per million.
pub const PPM: u64 = 1_000_000;

pub trait AclOracle {
    /// Address the oracle is deployed at. Oracle params refer to it.
    fn address(&self) -> Address;

    fn can_perform(
        &self,
        ledger: &dyn LedgerView,
        who: Address,
        app: Address,
        role: B256,
        how: &[U256],
    ) -> Result<bool, OracleError>;
}

/// Decode an account passed as a call param.
pub(crate) fn decode_subject(word: U256, oracle: OracleKind) -> Result<Address, OracleError> {
    let subject = word_to_address(word).ok_or(OracleError::SenderTooBig { oracle })?;
    if subject == Address::ZERO {
        return Err(OracleError::SenderZero { oracle });
    }
    Ok(subject)
}

pub(crate) fn require_auth(
    gate: &dyn PermissionGate,
    initialized: bool,
    caller: Address,
    app: Address,
    role: B256,
) -> Result<(), OracleError> {
    if !initialized {
        tracing::debug!(event = "oracle_auth_uninitialized", %app, %caller);
        return Err(OracleError::AuthFailed);
    }
    if !gate.can_perform(caller, app, role, &[]) {
        tracing::debug!(event = "oracle_auth_denied", %app, %caller, %role);
        return Err(OracleError::AuthFailed);
    }
    Ok(())
}
