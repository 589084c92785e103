use acl_oracles_core::oracle::{SET_BALANCE_ROLE, SET_TOKEN_ROLE};
use acl_oracles_core::{
    Acl, AclGate, AclOracle, Address, InMemoryLedger, Operator, OracleError, OracleKind,
    OracleRegistry, PermissionGate, PermissionParam, TokenBalanceOracle, ANY_ENTITY, B256, U256,
};
use std::sync::Arc;

const APP_MANAGER: Address = Address::new([0x01; 20]);
const ACCOUNT_1: Address = Address::new([0x02; 20]);
const ACCOUNT_2: Address = Address::new([0x03; 20]);
const NON_CONTRACT: Address = Address::new([0x04; 20]);
const TOKEN: Address = Address::new([0x70; 20]);
const VOTING_APP: Address = Address::new([0xaa; 20]);

const VOTING_ADMIN: Address = Address::new([0x09; 20]);

fn vote_role() -> B256 {
    alloy_primitives::keccak256("CREATE_VOTES_ROLE")
}

/// Creates `role` on the voting app and hands it to anyone passing the oracle.
fn guard_with_oracle(dao: &mut Dao, role: B256) {
    dao.acl
        .create_permission(APP_MANAGER, VOTING_ADMIN, VOTING_APP, role, APP_MANAGER)
        .unwrap();
    let param = PermissionParam::oracle(Operator::Eq, dao.oracle.address())
        .unwrap()
        .encode();
    dao.acl
        .grant_permission_p(APP_MANAGER, ANY_ENTITY, VOTING_APP, role, &[param])
        .unwrap();
}

struct Dao {
    acl: Acl,
    ledger: InMemoryLedger,
    oracles: OracleRegistry,
    oracle: Arc<TokenBalanceOracle>,
}

impl Dao {
    fn new() -> Self {
        let mut ledger = InMemoryLedger::new();
        let token = ledger.deploy_token(TOKEN);
        token.mint(APP_MANAGER, U256::from(1000)).unwrap();
        token.transfer(APP_MANAGER, ACCOUNT_1, U256::from(50)).unwrap();

        let oracle = Arc::new(TokenBalanceOracle::new(Address::new([0x0a; 20])));
        let mut oracles = OracleRegistry::new();
        oracles.register(oracle.clone());

        Self {
            acl: Acl::new(APP_MANAGER),
            ledger,
            oracles,
            oracle,
        }
    }

    fn gate(&self) -> AclGate<'_> {
        AclGate::new(&self.acl, &self.ledger, &self.oracles)
    }

    fn grant(&mut self, role: B256) {
        let app = self.oracle.address();
        self.acl
            .create_permission(APP_MANAGER, APP_MANAGER, app, role, APP_MANAGER)
            .unwrap();
    }
}

#[test]
fn test_setters_need_the_role() {
    let mut dao = Dao::new();
    dao.oracle.initialize(TOKEN, U256::from(100)).unwrap();

    assert_eq!(
        dao.oracle
            .set_min_balance(&dao.gate(), APP_MANAGER, U256::from(5)),
        Err(OracleError::AuthFailed)
    );

    dao.grant(*SET_BALANCE_ROLE);
    dao.oracle
        .set_min_balance(&dao.gate(), APP_MANAGER, U256::from(5))
        .unwrap();
    assert_eq!(dao.oracle.min_balance().unwrap(), U256::from(5));

    // only the grantee holds the role
    assert_eq!(
        dao.oracle
            .set_min_balance(&dao.gate(), ACCOUNT_1, U256::from(6)),
        Err(OracleError::AuthFailed)
    );
}

#[test]
fn test_set_token_checks_permission_before_contract() {
    let mut dao = Dao::new();
    dao.oracle.initialize(TOKEN, U256::from(100)).unwrap();

    assert_eq!(
        dao.oracle
            .set_token(&dao.gate(), &dao.ledger, APP_MANAGER, NON_CONTRACT),
        Err(OracleError::AuthFailed)
    );

    dao.grant(*SET_TOKEN_ROLE);
    assert_eq!(
        dao.oracle
            .set_token(&dao.gate(), &dao.ledger, APP_MANAGER, NON_CONTRACT),
        Err(OracleError::TokenNotContract {
            oracle: OracleKind::TokenBalance,
            token: NON_CONTRACT
        })
    );
}

#[test]
fn test_uninitialized_setters_fail_auth_even_with_the_role() {
    let mut dao = Dao::new();
    dao.grant(*SET_TOKEN_ROLE);
    dao.grant(*SET_BALANCE_ROLE);

    assert_eq!(
        dao.oracle
            .set_token(&dao.gate(), &dao.ledger, APP_MANAGER, TOKEN),
        Err(OracleError::AuthFailed)
    );
    assert_eq!(
        dao.oracle
            .set_min_balance(&dao.gate(), APP_MANAGER, U256::ZERO),
        Err(OracleError::AuthFailed)
    );
}

#[test]
fn test_oracle_guards_another_app() {
    let mut dao = Dao::new();
    dao.oracle.initialize(TOKEN, U256::from(100)).unwrap();

    let role = vote_role();
    guard_with_oracle(&mut dao, role);

    let gate = dao.gate();
    assert!(gate.can_perform(APP_MANAGER, VOTING_APP, role, &[]));
    assert!(!gate.can_perform(ACCOUNT_1, VOTING_APP, role, &[]));
    assert!(!gate.can_perform(ACCOUNT_2, VOTING_APP, role, &[]));

    // the call's own params reach the oracle as the minimum balance
    assert!(gate.can_perform(ACCOUNT_1, VOTING_APP, role, &[U256::from(50)]));
    assert!(!gate.can_perform(APP_MANAGER, VOTING_APP, role, &[U256::from(951)]));
}

#[test]
fn test_uninitialized_oracle_denies_through_acl() {
    let mut dao = Dao::new();
    let role = vote_role();
    guard_with_oracle(&mut dao, role);

    assert!(!dao.gate().can_perform(ACCOUNT_1, VOTING_APP, role, &[]));
    assert_eq!(
        dao.oracle
            .can_perform(&dao.ledger, ACCOUNT_1, VOTING_APP, role, &[]),
        Err(OracleError::NotInitialized)
    );
}
