use super::{decode_subject, require_auth, AclOracle};
use crate::acl::PermissionGate;
use crate::errors::{OracleError, OracleKind};
use crate::init::Initializable;
use crate::ledger::LedgerView;
use alloy_primitives::{keccak256, Address, B256, U256};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref SET_TOKEN_ROLE: B256 = keccak256("SET_TOKEN_ROLE");
    pub static ref SET_BALANCE_ROLE: B256 = keccak256("SET_BALANCE_ROLE");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalanceConfig {
    pub token: Address,
    pub min_balance: U256,
}

/// Who is checked and against which minimum, decoded from the call params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceQuery {
    /// No params: the caller against the configured minimum.
    Configured,
    /// `[min_balance]`: the caller against an explicit minimum.
    MinBalance(U256),
    /// `[subject, min_balance, ..]`: another account against an explicit minimum.
    Subject { subject: Address, min_balance: U256 },
}

impl BalanceQuery {
    pub fn from_params(how: &[U256]) -> Result<Self, OracleError> {
        match how {
            [] => Ok(Self::Configured),
            [min_balance] => Ok(Self::MinBalance(*min_balance)),
            [subject, min_balance, ..] => Ok(Self::Subject {
                subject: decode_subject(*subject, OracleKind::TokenBalance)?,
                min_balance: *min_balance,
            }),
        }
    }

    fn resolve(self, who: Address, config: &TokenBalanceConfig) -> (Address, U256) {
        match self {
            Self::Configured => (who, config.min_balance),
            Self::MinBalance(min_balance) => (who, min_balance),
            Self::Subject {
                subject,
                min_balance,
            } => (subject, min_balance),
        }
    }
}

/// Allows an action when the subject holds at least a minimum token balance.
#[derive(Debug)]
pub struct TokenBalanceOracle {
    address: Address,
    config: Initializable<TokenBalanceConfig>,
}

impl TokenBalanceOracle {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            config: Initializable::new(),
        }
    }

    pub fn initialize(&self, token: Address, min_balance: U256) -> Result<(), OracleError> {
        self.config.initialize(TokenBalanceConfig { token, min_balance })?;
        tracing::info!(event = "oracle_initialized", oracle = %self.address, %token, %min_balance);
        Ok(())
    }

    pub fn has_initialized(&self) -> bool {
        self.config.has_initialized()
    }

    pub fn token(&self) -> Result<Address, OracleError> {
        Ok(self.config.get()?.token)
    }

    pub fn min_balance(&self) -> Result<U256, OracleError> {
        Ok(self.config.get()?.min_balance)
    }

    pub fn set_token(
        &self,
        gate: &dyn PermissionGate,
        ledger: &dyn LedgerView,
        caller: Address,
        token: Address,
    ) -> Result<(), OracleError> {
        require_auth(
            gate,
            self.has_initialized(),
            caller,
            self.address,
            *SET_TOKEN_ROLE,
        )?;
        if !ledger.is_contract(token) {
            return Err(OracleError::TokenNotContract {
                oracle: OracleKind::TokenBalance,
                token,
            });
        }
        self.config.update(|c| c.token = token)?;
        tracing::info!(event = "oracle_token_set", oracle = %self.address, %token);
        Ok(())
    }

    pub fn set_min_balance(
        &self,
        gate: &dyn PermissionGate,
        caller: Address,
        min_balance: U256,
    ) -> Result<(), OracleError> {
        require_auth(
            gate,
            self.has_initialized(),
            caller,
            self.address,
            *SET_BALANCE_ROLE,
        )?;
        self.config.update(|c| c.min_balance = min_balance)?;
        tracing::info!(event = "oracle_min_balance_set", oracle = %self.address, %min_balance);
        Ok(())
    }
}

impl AclOracle for TokenBalanceOracle {
    fn address(&self) -> Address {
        self.address
    }

    fn can_perform(
        &self,
        ledger: &dyn LedgerView,
        who: Address,
        _app: Address,
        _role: B256,
        how: &[U256],
    ) -> Result<bool, OracleError> {
        let config = self.config.get()?;
        let (subject, required) = BalanceQuery::from_params(how)?.resolve(who, &config);
        let balance = ledger.token(config.token)?.balance_of(subject)?;

        let allowed = balance >= required;
        if !allowed {
            tracing::debug!(
                event = "token_balance_denied",
                oracle = %self.address,
                %subject,
                %balance,
                %required
            );
        }
        Ok(allowed)
    }
}
