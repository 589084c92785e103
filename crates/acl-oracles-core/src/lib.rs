//! ACL oracles for Aragon-style permission gates.
//!
//! Two oracles are provided:
//!
//! - [`TokenBalanceOracle`](oracle::TokenBalanceOracle): allows an action when the
//!   subject holds at least a minimum token balance.
//! - [`HatchOracle`](oracle::HatchOracle): allows a contribution when it fits in the
//!   subject's remaining capacity, derived from a score token balance and a
//!   parts-per-million ratio.
//!
//! ```text
//! ┌──────────────┐  can_perform(who, where, what, how)  ┌────────────────┐
//! │  Hatch app   │─────────────────────────────────────▶│    AclGate     │
//! └──────────────┘                                      │ (Acl + params) │
//!                                                       └───────┬────────┘
//!                                         Oracle param          │
//!                                  ┌────────────────────────────▼─────┐
//!                                  │  TokenBalanceOracle / HatchOracle │
//!                                  └────────────────┬─────────────────┘
//!                                                   │ balance_of / contributions
//!                                           ┌───────▼───────┐
//!                                           │  LedgerView   │
//!                                           └───────────────┘
//! ```
//!
//! Ledgers, permission gates and oracle lookups are injected through traits so
//! the decision logic never talks to a concrete chain.

pub mod acl;
pub mod errors;
pub mod hatch;
pub mod init;
pub mod ledger;
pub mod oracle;
pub mod scenario;

pub use acl::{Acl, AclError, AclGate, OracleDirectory, OracleRegistry, PermissionGate};
pub use acl::{Operator, ParamError, PermissionParam, ANY_ENTITY};
pub use errors::{reason_codes, OracleError, OracleKind};
pub use hatch::{Hatch, HatchError, CONTRIBUTE_ROLE};
pub use init::Initializable;
pub use ledger::{BalanceLedger, ContributionLedger, InMemoryLedger, LedgerError, LedgerView};
pub use oracle::{AclOracle, HatchOracle, TokenBalanceOracle, PPM};

/// Shorthand for the 256-bit integers every oracle works in.
pub use alloy_primitives::{Address, B256, U256};
