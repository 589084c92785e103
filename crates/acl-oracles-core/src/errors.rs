use crate::ledger::LedgerError;
use thiserror::Error;

/// Stable reason codes, one per oracle failure.
///
/// These match the revert strings the deployed oracles use so logs and CLI
/// output can be correlated with on-chain failures. The token balance
/// oracle's sender codes have no on-chain counterpart and follow the same
/// naming.
pub mod reason_codes {
    pub const INIT_NOT_INITIALIZED: &str = "INIT_NOT_INITIALIZED";
    pub const INIT_ALREADY_INITIALIZED: &str = "INIT_ALREADY_INITIALIZED";
    pub const APP_AUTH_FAILED: &str = "APP_AUTH_FAILED";
    pub const ORACLE_TOKEN_NOT_CONTRACT: &str = "ORACLE_TOKEN_NOT_CONTRACT";
    pub const HATCH_ORACLE_TOKEN_NOT_CONTRACT: &str = "HATCH_ORACLE_TOKEN_NOT_CONTRACT";
    pub const TOKEN_BALANCE_ORACLE_SENDER_TOO_BIG: &str = "TOKEN_BALANCE_ORACLE_SENDER_TOO_BIG";
    pub const TOKEN_BALANCE_ORACLE_SENDER_ZERO: &str = "TOKEN_BALANCE_ORACLE_SENDER_ZERO";
    pub const HATCH_ORACLE_PARAMS_MISSING: &str = "HATCH_ORACLE_PARAMS_MISSING";
    pub const HATCH_ORACLE_SENDER_TOO_BIG: &str = "HATCH_ORACLE_SENDER_TOO_BIG";
    pub const HATCH_ORACLE_SENDER_ZERO: &str = "HATCH_ORACLE_SENDER_ZERO";
    pub const MATH_OVERFLOW: &str = "MATH_OVERFLOW";
    pub const LEDGER_ERROR: &str = "LEDGER_ERROR";
}

/// Which oracle raised an error. Reason codes are namespaced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    TokenBalance,
    Hatch,
}

/// Oracle failures. All are terminal: nothing is retried locally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle has not been initialized")]
    NotInitialized,

    #[error("oracle was already initialized")]
    AlreadyInitialized,

    #[error("token {token} is not a contract")]
    TokenNotContract {
        oracle: OracleKind,
        token: alloy_primitives::Address,
    },

    #[error("expected at least {expected} params, got {actual}")]
    ParamsMissing { expected: usize, actual: usize },

    #[error("encoded sender does not fit in an address")]
    SenderTooBig { oracle: OracleKind },

    #[error("sender is the zero address")]
    SenderZero { oracle: OracleKind },

    /// Rejected by the permission gate, not by the oracle's own decision.
    #[error("caller is not authorized")]
    AuthFailed,

    #[error("capacity computation overflowed")]
    MathOverflow,

    #[error("ledger lookup failed: {0}")]
    Ledger(#[from] LedgerError),
}

impl OracleError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotInitialized => reason_codes::INIT_NOT_INITIALIZED,
            Self::AlreadyInitialized => reason_codes::INIT_ALREADY_INITIALIZED,
            Self::TokenNotContract { oracle, .. } => match oracle {
                OracleKind::TokenBalance => reason_codes::ORACLE_TOKEN_NOT_CONTRACT,
                OracleKind::Hatch => reason_codes::HATCH_ORACLE_TOKEN_NOT_CONTRACT,
            },
            Self::ParamsMissing { .. } => reason_codes::HATCH_ORACLE_PARAMS_MISSING,
            Self::SenderTooBig { oracle } => match oracle {
                OracleKind::TokenBalance => reason_codes::TOKEN_BALANCE_ORACLE_SENDER_TOO_BIG,
                OracleKind::Hatch => reason_codes::HATCH_ORACLE_SENDER_TOO_BIG,
            },
            Self::SenderZero { oracle } => match oracle {
                OracleKind::TokenBalance => reason_codes::TOKEN_BALANCE_ORACLE_SENDER_ZERO,
                OracleKind::Hatch => reason_codes::HATCH_ORACLE_SENDER_ZERO,
            },
            Self::AuthFailed => reason_codes::APP_AUTH_FAILED,
            Self::MathOverflow => reason_codes::MATH_OVERFLOW,
            Self::Ledger(_) => reason_codes::LEDGER_ERROR,
        }
    }

}
