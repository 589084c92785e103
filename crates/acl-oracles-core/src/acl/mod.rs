//! Access control list with parameterised grants.
//!
//! Flow of a permission check:
//! 1. Look up the grant for `(who, app, role)`, falling back to `ANY_ENTITY`
//! 2. An empty param list grants unconditionally
//! 3. Otherwise every param must hold; oracle params consult the oracle
//!    registered at the param's address

mod gate;
mod params;


pub use gate::{AclGate, OracleDirectory, OracleRegistry, PermissionGate};
pub use params::{
    address_to_word, word_to_address, Operator, ParamError, PermissionParam,
    BLOCK_NUMBER_PARAM_ID, LOGIC_OP_PARAM_ID, MAX_ARGUMENT_INDEX, ORACLE_PARAM_ID,
    PARAM_VALUE_PARAM_ID, TIMESTAMP_PARAM_ID,
};

use crate::ledger::LedgerView;
use alloy_primitives::{Address, B256, U256};
use std::collections::BTreeMap;
use thiserror::Error;

/// Wildcard entity: a grant to it applies to every caller.
pub const ANY_ENTITY: Address = Address::new([0xff; 20]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("sender {sender} may not create permissions")]
    AuthFailed { sender: Address },

    #[error("permission already exists for role {role} on {app}")]
    PermissionExists { app: Address, role: B256 },

    #[error("{entity} already holds role {role} on {app}")]
    AlreadyGranted {
        entity: Address,
        app: Address,
        role: B256,
    },

    #[error("sender {sender} is not the manager of role {role} on {app}")]
    NotManager {
        sender: Address,
        app: Address,
        role: B256,
    },

    #[error("invalid permission param: {0}")]
    InvalidParam(#[from] ParamError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PermissionKey {
    entity: Address,
    app: Address,
    role: B256,
}

#[derive(Debug, Clone)]
pub struct Acl {
    root: Address,
    grants: BTreeMap<PermissionKey, Vec<PermissionParam>>,
    managers: BTreeMap<(Address, B256), Address>,
}

impl Acl {
    /// New ACL where `root` may create permissions.
    pub fn new(root: Address) -> Self {
        Self {
            root,
            grants: BTreeMap::new(),
            managers: BTreeMap::new(),
        }
    }

    /// Grant `role` on `app` to `entity` and make `manager` its manager.
    pub fn create_permission(
        &mut self,
        sender: Address,
        entity: Address,
        app: Address,
        role: B256,
        manager: Address,
    ) -> Result<(), AclError> {
        if sender != self.root {
            return Err(AclError::AuthFailed { sender });
        }
        if self.managers.contains_key(&(app, role)) {
            return Err(AclError::PermissionExists { app, role });
        }
        self.managers.insert((app, role), manager);
        self.grants
            .insert(PermissionKey { entity, app, role }, Vec::new());
        tracing::info!(event = "acl_create_permission", %entity, %app, %role, %manager);
        Ok(())
    }

    pub fn grant_permission(
        &mut self,
        sender: Address,
        entity: Address,
        app: Address,
        role: B256,
    ) -> Result<(), AclError> {
        self.insert_grant(sender, entity, app, role, Vec::new())
    }

    /// Grant with params given as packed wire words. Words are decoded here
    /// and rejected as a whole if any one is invalid.
    pub fn grant_permission_p(
        &mut self,
        sender: Address,
        entity: Address,
        app: Address,
        role: B256,
        params: &[U256],
    ) -> Result<(), AclError> {
        let decoded = params
            .iter()
            .map(|word| PermissionParam::decode(*word))
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_grant(sender, entity, app, role, decoded)
    }

    pub fn revoke_permission(
        &mut self,
        sender: Address,
        entity: Address,
        app: Address,
        role: B256,
    ) -> Result<(), AclError> {
        self.require_manager(sender, app, role)?;
        if self
            .grants
            .remove(&PermissionKey { entity, app, role })
            .is_some()
        {
            tracing::info!(event = "acl_revoke_permission", %entity, %app, %role);
        }
        Ok(())
    }

    pub fn set_permission_manager(
        &mut self,
        sender: Address,
        new_manager: Address,
        app: Address,
        role: B256,
    ) -> Result<(), AclError> {
        self.require_manager(sender, app, role)?;
        self.managers.insert((app, role), new_manager);
        Ok(())
    }

    pub fn permission_manager(&self, app: Address, role: B256) -> Option<Address> {
        self.managers.get(&(app, role)).copied()
    }

    /// Params of the grant held by `entity`, if any.
    pub fn permission_params(
        &self,
        entity: Address,
        app: Address,
        role: B256,
    ) -> Option<&[PermissionParam]> {
        self.grants
            .get(&PermissionKey { entity, app, role })
            .map(Vec::as_slice)
    }

    pub fn has_permission(
        &self,
        ledger: &dyn LedgerView,
        oracles: &dyn OracleDirectory,
        who: Address,
        app: Address,
        role: B256,
        how: &[U256],
    ) -> bool {
        let ctx = EvalContext {
            ledger,
            oracles,
            who,
            app,
            role,
            how,
        };
        self.grant_holds(&ctx, who) || self.grant_holds(&ctx, ANY_ENTITY)
    }

    fn grant_holds(&self, ctx: &EvalContext<'_>, entity: Address) -> bool {
        let key = PermissionKey {
            entity,
            app: ctx.app,
            role: ctx.role,
        };
        match self.grants.get(&key) {
            Some(params) => params.iter().all(|param| ctx.evaluate(param)),
            None => false,
        }
    }

    fn insert_grant(
        &mut self,
        sender: Address,
        entity: Address,
        app: Address,
        role: B256,
        params: Vec<PermissionParam>,
    ) -> Result<(), AclError> {
        self.require_manager(sender, app, role)?;
        let key = PermissionKey { entity, app, role };
        if self.grants.contains_key(&key) {
            return Err(AclError::AlreadyGranted { entity, app, role });
        }
        tracing::info!(
            event = "acl_grant_permission",
            %entity,
            %app,
            %role,
            params = params.len()
        );
        self.grants.insert(key, params);
        Ok(())
    }

    fn require_manager(&self, sender: Address, app: Address, role: B256) -> Result<(), AclError> {
        if self.permission_manager(app, role) != Some(sender) {
            return Err(AclError::NotManager { sender, app, role });
        }
        Ok(())
    }
}

struct EvalContext<'a> {
    ledger: &'a dyn LedgerView,
    oracles: &'a dyn OracleDirectory,
    who: Address,
    app: Address,
    role: B256,
    how: &'a [U256],
}

impl EvalContext<'_> {
    fn evaluate(&self, param: &PermissionParam) -> bool {
        let (op, value, compared_to) = match *param {
            PermissionParam::Argument { index, op, value } => {
                let Some(arg) = self.how.get(usize::from(index)) else {
                    return false;
                };
                (op, *arg & params::value_mask(), value)
            }
            PermissionParam::Constant { op, value } => (op, value, value),
            PermissionParam::Oracle { op, oracle } => {
                let verdict = U256::from(u8::from(self.check_oracle(oracle)));
                (op, verdict, U256::from(1u8))
            }
        };

        if op == Operator::Ret {
            return !value.is_zero();
        }
        op.compare(value, compared_to)
    }

    fn check_oracle(&self, address: Address) -> bool {
        let Some(oracle) = self.oracles.oracle(address) else {
            tracing::debug!(event = "acl_oracle_missing", oracle = %address);
            return false;
        };
        match oracle.can_perform(self.ledger, self.who, self.app, self.role, self.how) {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::debug!(
                    event = "acl_oracle_failed",
                    oracle = %address,
                    reason = e.reason_code(),
                    "{}",
                    e
                );
                false
            }
        }
    }
}
