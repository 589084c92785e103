use super::{BalanceLedger, ContributionLedger, LedgerError, LedgerView};
use alloy_primitives::{Address, U256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Balances of one in-memory token.
#[derive(Debug, Clone, Default)]
pub struct TokenBalances {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
}

impl TokenBalances {
    pub fn mint(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self.balance(to) + amount;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                balance,
                needed: amount,
            });
        }
        self.balances.insert(from, balance - amount);
        let credited = self.balance(to) + amount;
        self.balances.insert(to, credited);
        Ok(())
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or(U256::ZERO)
    }
}

impl BalanceLedger for TokenBalances {
    fn balance_of(&self, account: Address) -> Result<U256, LedgerError> {
        Ok(self.balance(account))
    }
}

/// In-memory host environment: tokens, hatches and plain contract addresses.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    tokens: BTreeMap<Address, TokenBalances>,
    hatches: BTreeMap<Address, Arc<dyn ContributionLedger + Send + Sync>>,
    contracts: BTreeSet<Address>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy an empty token at `token`, or return the one already there.
    pub fn deploy_token(&mut self, token: Address) -> &mut TokenBalances {
        self.tokens.entry(token).or_default()
    }

    pub fn token_mut(&mut self, token: Address) -> Result<&mut TokenBalances, LedgerError> {
        self.tokens
            .get_mut(&token)
            .ok_or(LedgerError::UnknownToken(token))
    }

    pub fn register_hatch(
        &mut self,
        address: Address,
        hatch: Arc<dyn ContributionLedger + Send + Sync>,
    ) {
        self.hatches.insert(address, hatch);
    }

    /// Mark `address` as holding code without giving it any ledger role.
    pub fn deploy_contract(&mut self, address: Address) {
        self.contracts.insert(address);
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("tokens", &self.tokens)
            .field("hatches", &self.hatches.keys().collect::<Vec<_>>())
            .field("contracts", &self.contracts)
            .finish()
    }
}

impl LedgerView for InMemoryLedger {
    fn token(&self, token: Address) -> Result<&dyn BalanceLedger, LedgerError> {
        self.tokens
            .get(&token)
            .map(|t| t as &dyn BalanceLedger)
            .ok_or(LedgerError::UnknownToken(token))
    }

    fn hatch(&self, hatch: Address) -> Result<&dyn ContributionLedger, LedgerError> {
        match self.hatches.get(&hatch) {
            Some(ledger) => {
                let ledger: &dyn ContributionLedger = ledger.as_ref();
                Ok(ledger)
            }
            None => Err(LedgerError::UnknownHatch(hatch)),
        }
    }

    fn is_contract(&self, address: Address) -> bool {
        self.tokens.contains_key(&address)
            || self.hatches.contains_key(&address)
            || self.contracts.contains(&address)
    }
}
