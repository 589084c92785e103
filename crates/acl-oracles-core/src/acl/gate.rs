use super::Acl;
use crate::ledger::LedgerView;
use crate::oracle::AclOracle;
use alloy_primitives::{Address, B256, U256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Permission check wrapping every state-changing entry point of an app.
pub trait PermissionGate {
    fn can_perform(&self, who: Address, app: Address, role: B256, how: &[U256]) -> bool;
}

/// Resolves oracle addresses referenced by oracle params.
pub trait OracleDirectory {
    fn oracle(&self, address: Address) -> Option<&dyn AclOracle>;
}

#[derive(Clone, Default)]
pub struct OracleRegistry {
    oracles: BTreeMap<Address, Arc<dyn AclOracle + Send + Sync>>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `oracle` under its own app address, replacing any previous one.
    pub fn register(&mut self, oracle: Arc<dyn AclOracle + Send + Sync>) {
        self.oracles.insert(oracle.address(), oracle);
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}

impl OracleDirectory for OracleRegistry {
    fn oracle(&self, address: Address) -> Option<&dyn AclOracle> {
        let oracle = self.oracles.get(&address)?;
        let oracle: &dyn AclOracle = oracle.as_ref();
        Some(oracle)
    }
}

/// [`PermissionGate`] backed by an [`Acl`] and the environment its oracle
/// params need.
#[derive(Clone, Copy)]
pub struct AclGate<'a> {
    acl: &'a Acl,
    ledger: &'a dyn LedgerView,
    oracles: &'a dyn OracleDirectory,
}

impl<'a> AclGate<'a> {
    pub fn new(acl: &'a Acl, ledger: &'a dyn LedgerView, oracles: &'a dyn OracleDirectory) -> Self {
        Self {
            acl,
            ledger,
            oracles,
        }
    }
}

impl PermissionGate for AclGate<'_> {
    fn can_perform(&self, who: Address, app: Address, role: B256, how: &[U256]) -> bool {
        self.acl
            .has_permission(self.ledger, self.oracles, who, app, role, how)
    }
}
