use super::{decode_subject, require_auth, AclOracle, PPM};
use crate::acl::PermissionGate;
use crate::errors::{OracleError, OracleKind};
use crate::init::Initializable;
use crate::ledger::LedgerView;
use alloy_primitives::{keccak256, Address, B256, U256};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref SET_SCORE_TOKEN_ROLE: B256 = keccak256("SET_SCORE_TOKEN_ROLE");
    pub static ref SET_RATIO_ROLE: B256 = keccak256("SET_RATIO_ROLE");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchConfig {
    pub score_token: Address,
    /// Contribution allowed per unit of score, in parts per million.
    pub ratio: U256,
    pub hatch: Address,
}

impl HatchConfig {
    /// `floor(score * ratio / PPM)`.
    pub fn capacity(&self, score: U256) -> Result<U256, OracleError> {
        let scaled = score
            .checked_mul(self.ratio)
            .ok_or(OracleError::MathOverflow)?;
        Ok(scaled / U256::from(PPM))
    }
}

/// Allows a hatch contribution when it fits in the contributor's remaining
/// capacity. Expects params `[subject, contribution]`.
#[derive(Debug)]
pub struct HatchOracle {
    address: Address,
    config: Initializable<HatchConfig>,
}

impl HatchOracle {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            config: Initializable::new(),
        }
    }

    pub fn initialize(
        &self,
        score_token: Address,
        ratio: U256,
        hatch: Address,
    ) -> Result<(), OracleError> {
        self.config.initialize(HatchConfig {
            score_token,
            ratio,
            hatch,
        })?;
        tracing::info!(
            event = "oracle_initialized",
            oracle = %self.address,
            %score_token,
            %ratio,
            %hatch
        );
        Ok(())
    }

    pub fn has_initialized(&self) -> bool {
        self.config.has_initialized()
    }

    pub fn score_token(&self) -> Result<Address, OracleError> {
        Ok(self.config.get()?.score_token)
    }

    pub fn ratio(&self) -> Result<U256, OracleError> {
        Ok(self.config.get()?.ratio)
    }

    pub fn hatch(&self) -> Result<Address, OracleError> {
        Ok(self.config.get()?.hatch)
    }

    pub fn set_score_token(
        &self,
        gate: &dyn PermissionGate,
        ledger: &dyn LedgerView,
        caller: Address,
        score_token: Address,
    ) -> Result<(), OracleError> {
        require_auth(
            gate,
            self.has_initialized(),
            caller,
            self.address,
            *SET_SCORE_TOKEN_ROLE,
        )?;
        if !ledger.is_contract(score_token) {
            return Err(OracleError::TokenNotContract {
                oracle: OracleKind::Hatch,
                token: score_token,
            });
        }
        self.config.update(|c| c.score_token = score_token)?;
        tracing::info!(event = "oracle_score_token_set", oracle = %self.address, %score_token);
        Ok(())
    }

    pub fn set_ratio(
        &self,
        gate: &dyn PermissionGate,
        caller: Address,
        ratio: U256,
    ) -> Result<(), OracleError> {
        require_auth(
            gate,
            self.has_initialized(),
            caller,
            self.address,
            *SET_RATIO_ROLE,
        )?;
        self.config.update(|c| c.ratio = ratio)?;
        tracing::info!(event = "oracle_ratio_set", oracle = %self.address, %ratio);
        Ok(())
    }

    /// Amount `account` may still contribute: capacity minus what it already
    /// contributed, never below zero.
    pub fn allowance(&self, ledger: &dyn LedgerView, account: Address) -> Result<U256, OracleError> {
        let config = self.config.get()?;
        let score = ledger.token(config.score_token)?.balance_of(account)?;
        self.allowance_for(ledger, &config, account, score)
    }

    fn allowance_for(
        &self,
        ledger: &dyn LedgerView,
        config: &HatchConfig,
        account: Address,
        score: U256,
    ) -> Result<U256, OracleError> {
        let capacity = config.capacity(score)?;
        let contributed = ledger.hatch(config.hatch)?.contributions(account)?;
        Ok(capacity.saturating_sub(contributed))
    }
}

impl AclOracle for HatchOracle {
    fn address(&self) -> Address {
        self.address
    }

    fn can_perform(
        &self,
        ledger: &dyn LedgerView,
        _who: Address,
        _app: Address,
        _role: B256,
        how: &[U256],
    ) -> Result<bool, OracleError> {
        let config = self.config.get()?;
        let [subject, contribution, ..] = how else {
            return Err(OracleError::ParamsMissing {
                expected: 2,
                actual: how.len(),
            });
        };
        let subject = decode_subject(*subject, OracleKind::Hatch)?;

        let score = ledger.token(config.score_token)?.balance_of(subject)?;
        if score.is_zero() {
            tracing::debug!(event = "hatch_oracle_denied", oracle = %self.address, %subject, reason = "zero_score");
            return Ok(false);
        }

        let allowance = self.allowance_for(ledger, &config, subject, score)?;
        let allowed = *contribution <= allowance;
        if !allowed {
            tracing::debug!(
                event = "hatch_oracle_denied",
                oracle = %self.address,
                %subject,
                %contribution,
                %allowance
            );
        }
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hatch::Hatch;
    use crate::ledger::InMemoryLedger;
    use crate::oracle::test_support::{addr, word, FixedGate};
    use std::sync::Arc;

    const RATIO: u64 = 100 * PPM;
    const SCORE_TOKEN_BALANCE: u64 = 1000;

    struct Fixture {
        ledger: InMemoryLedger,
        oracle: HatchOracle,
        hatch: Arc<Hatch>,
        score_token: Address,
        app_manager: Address,
        score900: Address,
        score100: Address,
        score0: Address,
    }

    fn fixture() -> Fixture {
        let score_token = addr(0x50);
        let app_manager = addr(0x01);
        let score900 = addr(0x02);
        let score100 = addr(0x03);
        let score0 = addr(0x04);
        let hatch = Arc::new(Hatch::new(addr(0x0b)));

        let mut ledger = InMemoryLedger::new();
        let token = ledger.deploy_token(score_token);
        token
            .mint(score900, U256::from(SCORE_TOKEN_BALANCE))
            .unwrap();
        token
            .transfer(score900, score100, U256::from(SCORE_TOKEN_BALANCE / 10))
            .unwrap();
        ledger.register_hatch(hatch.address(), hatch.clone());

        Fixture {
            ledger,
            oracle: HatchOracle::new(addr(0x0c)),
            hatch,
            score_token,
            app_manager,
            score900,
            score100,
            score0,
        }
    }

    fn initialized() -> Fixture {
        let f = fixture();
        f.oracle
            .initialize(f.score_token, U256::from(RATIO), f.hatch.address())
            .unwrap();
        f
    }

    fn check(f: &Fixture, subject: Address, contribution: u64) -> bool {
        f.oracle
            .can_perform(
                &f.ledger,
                ANY,
                ANY,
                B256::ZERO,
                &[word(subject), U256::from(contribution)],
            )
            .unwrap()
    }

    fn set_ratio(f: &Fixture, ratio: u64) {
        f.oracle
            .set_ratio(&FixedGate(true), f.app_manager, U256::from(ratio))
            .unwrap();
    }

    const ANY: Address = Address::new([0xff; 20]);

    #[test]
    fn initialize_sets_variables() {
        let f = initialized();
        assert_eq!(f.oracle.score_token().unwrap(), f.score_token);
        assert_eq!(f.oracle.ratio().unwrap(), U256::from(RATIO));
        assert_eq!(f.oracle.hatch().unwrap(), f.hatch.address());
        assert!(f.oracle.has_initialized());
    }

    #[test]
    fn reinitialization_fails() {
        let f = initialized();
        assert_eq!(
            f.oracle
                .initialize(f.score_token, U256::from(RATIO), f.hatch.address()),
            Err(OracleError::AlreadyInitialized)
        );
    }

    #[test]
    fn set_score_token() {
        let mut f = initialized();
        let new_score = addr(0x51);
        f.ledger
            .deploy_token(new_score)
            .mint(f.app_manager, U256::from(100))
            .unwrap();
        f.oracle
            .set_score_token(&FixedGate(true), &f.ledger, f.app_manager, new_score)
            .unwrap();
        assert_eq!(f.oracle.score_token().unwrap(), new_score);
    }

    #[test]
    fn set_score_token_rejects_non_contract() {
        let f = initialized();
        let non_contract = addr(0x05);
        let err = f
            .oracle
            .set_score_token(&FixedGate(true), &f.ledger, f.app_manager, non_contract)
            .unwrap_err();
        assert_eq!(
            err,
            OracleError::TokenNotContract {
                oracle: OracleKind::Hatch,
                token: non_contract
            }
        );
        assert_eq!(err.reason_code(), "HATCH_ORACLE_TOKEN_NOT_CONTRACT");
    }

    #[test]
    fn ratio_100_per_score() {
        let f = initialized();
        assert!(check(&f, f.score900, 90000));
        assert!(check(&f, f.score100, 10000));
        assert!(!check(&f, f.score900, 90001));
        assert!(!check(&f, f.score100, 10001));
        assert!(!check(&f, f.score0, 1));
    }

    #[test]
    fn ratio_1_per_score() {
        let f = initialized();
        set_ratio(&f, PPM);
        assert!(check(&f, f.score900, 900));
        assert!(check(&f, f.score100, 100));
        assert!(!check(&f, f.score900, 901));
        assert!(!check(&f, f.score100, 101));
    }

    #[test]
    fn ratio_1_per_100_score() {
        let f = initialized();
        set_ratio(&f, PPM / 100);
        assert!(check(&f, f.score900, 9));
        assert!(check(&f, f.score100, 1));
        assert!(!check(&f, f.score900, 10));
        assert!(!check(&f, f.score100, 2));
    }

    #[test]
    fn zero_score_denies_even_zero_contribution() {
        let f = initialized();
        assert!(!check(&f, f.score0, 0));
    }

    #[test]
    fn missing_params() {
        let f = initialized();
        let err = f
            .oracle
            .can_perform(&f.ledger, ANY, ANY, B256::ZERO, &[word(f.score900)])
            .unwrap_err();
        assert_eq!(
            err,
            OracleError::ParamsMissing {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(err.reason_code(), "HATCH_ORACLE_PARAMS_MISSING");
    }

    #[test]
    fn sender_too_big() {
        let f = initialized();
        let how = [U256::from(2u8).pow(U256::from(160u8)), U256::from(100)];
        assert_eq!(
            f.oracle.can_perform(&f.ledger, ANY, ANY, B256::ZERO, &how),
            Err(OracleError::SenderTooBig { oracle: OracleKind::Hatch })
        );
    }

    #[test]
    fn sender_zero() {
        let f = initialized();
        let how = [U256::ZERO, U256::from(1000)];
        assert_eq!(
            f.oracle.can_perform(&f.ledger, ANY, ANY, B256::ZERO, &how),
            Err(OracleError::SenderZero { oracle: OracleKind::Hatch })
        );
    }

    #[test]
    fn capacity_overflow_is_an_error() {
        let f = fixture();
        f.oracle
            .initialize(f.score_token, U256::MAX, f.hatch.address())
            .unwrap();
        assert_eq!(
            f.oracle
                .can_perform(&f.ledger, ANY, ANY, B256::ZERO, &[word(f.score900), U256::from(1)]),
            Err(OracleError::MathOverflow)
        );
    }

    #[test]
    fn allowance_subtracts_prior_contributions() {
        let f = initialized();
        assert_eq!(
            f.oracle.allowance(&f.ledger, f.score900).unwrap(),
            U256::from(90000)
        );

        f.hatch.record(f.score900, U256::from(40000)).unwrap();
        assert_eq!(
            f.oracle.allowance(&f.ledger, f.score900).unwrap(),
            U256::from(50000)
        );
        assert!(check(&f, f.score900, 50000));
        assert!(!check(&f, f.score900, 50001));
    }

    #[test]
    fn allowance_saturates_after_ratio_drop() {
        let f = initialized();
        f.hatch.record(f.score100, U256::from(10000)).unwrap();
        set_ratio(&f, PPM);
        assert_eq!(
            f.oracle.allowance(&f.ledger, f.score100).unwrap(),
            U256::ZERO
        );
        assert!(!check(&f, f.score100, 1));
    }

    #[test]
    fn uninitialized_oracle() {
        let f = fixture();
        assert_eq!(
            f.oracle
                .set_score_token(&FixedGate(true), &f.ledger, f.app_manager, f.score_token),
            Err(OracleError::AuthFailed)
        );
        assert_eq!(
            f.oracle
                .set_ratio(&FixedGate(true), f.app_manager, U256::ZERO),
            Err(OracleError::AuthFailed)
        );
        assert_eq!(
            f.oracle.can_perform(
                &f.ledger,
                f.app_manager,
                ANY,
                B256::ZERO,
                &[word(f.score0), U256::from(1)]
            ),
            Err(OracleError::NotInitialized)
        );
        assert_eq!(
            f.oracle.allowance(&f.ledger, f.app_manager),
            Err(OracleError::NotInitialized)
        );
    }
}
