//! Write-once configuration cell.
//!
//! Oracles hold their configuration in an [`Initializable`]: it is empty until
//! `initialize` succeeds exactly once, and can afterwards only be changed in
//! place through [`Initializable::update`].

use crate::errors::OracleError;
use std::sync::{PoisonError, RwLock};

#[derive(Debug)]
pub struct Initializable<T> {
    slot: RwLock<Option<T>>,
}

impl<T> Default for Initializable<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T: Clone> Initializable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`. Fails with `AlreadyInitialized` on every call after the first.
    pub fn initialize(&self, value: T) -> Result<(), OracleError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(OracleError::AlreadyInitialized);
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn has_initialized(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Copy of the stored value.
    pub fn get(&self) -> Result<T, OracleError> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(OracleError::NotInitialized)
    }

    /// Mutate the stored value. Never initializes an empty cell.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), OracleError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let value = slot.as_mut().ok_or(OracleError::NotInitialized)?;
        f(value);
        Ok(())
    }
}
