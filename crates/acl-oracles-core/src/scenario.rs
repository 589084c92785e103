//! Scenario files: an in-memory environment plus a list of oracle queries.
//!
//! ```yaml
//! tokens:
//!   - address: "0x7070707070707070707070707070707070707070"
//!     balances:
//!       "0x0101010101010101010101010101010101010101": "1000"
//! oracles:
//!   - kind: token_balance
//!     address: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
//!     token: "0x7070707070707070707070707070707070707070"
//!     min_balance: "100"
//! queries:
//!   - name: holder passes
//!     oracle: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
//!     who: "0x0101010101010101010101010101010101010101"
//! ```
//!
//! Numbers are strings, decimal or `0x`-prefixed hex, so 256-bit values
//! survive YAML parsing.

use crate::acl::{OracleDirectory, OracleRegistry};
use crate::errors::OracleError;
use crate::hatch::{Hatch, HatchError};
use crate::ledger::{InMemoryLedger, LedgerError};
use crate::oracle::{HatchOracle, TokenBalanceOracle};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{field}: '{value}' is not an address")]
    InvalidAddress { field: String, value: String },

    #[error("{field}: '{value}' is not a 256-bit unsigned integer")]
    InvalidNumber { field: String, value: String },

    #[error("{field}: oracle {oracle} is already defined")]
    DuplicateOracle { field: String, oracle: Address },

    #[error("query '{query}' refers to unknown oracle {oracle}")]
    UnknownOracle { query: String, oracle: Address },

    #[error("oracle {oracle}: {source}")]
    Oracle {
        oracle: Address,
        #[source]
        source: OracleError,
    },

    #[error("ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("hatch setup failed: {0}")]
    Hatch(#[from] HatchError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,

    #[serde(default)]
    pub hatches: Vec<HatchSpec>,

    /// Extra addresses that hold code but are neither tokens nor hatches.
    #[serde(default)]
    pub contracts: Vec<String>,

    #[serde(default)]
    pub oracles: Vec<OracleSpec>,

    #[serde(default)]
    pub queries: Vec<QuerySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenSpec {
    pub address: String,
    #[serde(default)]
    pub balances: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HatchSpec {
    pub address: String,
    #[serde(default)]
    pub contributions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum OracleSpec {
    TokenBalance {
        address: String,
        token: String,
        min_balance: String,
        #[serde(default = "default_true")]
        initialize: bool,
    },
    Hatch {
        address: String,
        score_token: String,
        ratio: String,
        hatch: String,
        #[serde(default = "default_true")]
        initialize: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySpec {
    #[serde(default)]
    pub name: Option<String>,
    pub oracle: String,
    pub who: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl OracleSpec {
    fn address(&self) -> &str {
        match self {
            Self::TokenBalance { address, .. } | Self::Hatch { address, .. } => address,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    pub name: String,
    pub oracle: Address,
    pub who: Address,
    pub allowed: Option<bool>,
    pub reason_code: Option<&'static str>,
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Ledger and oracles built from a scenario.
pub struct Environment {
    pub ledger: InMemoryLedger,
    pub oracles: OracleRegistry,
}

impl Scenario {
    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn build(&self) -> Result<Environment, ScenarioError> {
        let mut ledger = InMemoryLedger::new();

        for (i, spec) in self.tokens.iter().enumerate() {
            let field = format!("tokens[{i}]");
            let token = parse_address(&format!("{field}.address"), &spec.address)?;
            let balances = ledger.deploy_token(token);
            for (holder, amount) in &spec.balances {
                let holder = parse_address(&format!("{field}.balances"), holder)?;
                let amount = parse_number(&format!("{field}.balances"), amount)?;
                balances.mint(holder, amount)?;
            }
        }

        for (i, spec) in self.hatches.iter().enumerate() {
            let field = format!("hatches[{i}]");
            let hatch = Hatch::new(parse_address(&format!("{field}.address"), &spec.address)?);
            for (account, amount) in &spec.contributions {
                let account = parse_address(&format!("{field}.contributions"), account)?;
                let amount = parse_number(&format!("{field}.contributions"), amount)?;
                hatch.record(account, amount)?;
            }
            ledger.register_hatch(hatch.address(), Arc::new(hatch));
        }

        for (i, contract) in self.contracts.iter().enumerate() {
            ledger.deploy_contract(parse_address(&format!("contracts[{i}]"), contract)?);
        }

        let mut oracles = OracleRegistry::new();
        for (i, spec) in self.oracles.iter().enumerate() {
            let field = format!("oracles[{i}]");
            let address = parse_address(&format!("{field}.address"), spec.address())?;
            if oracles.oracle(address).is_some() {
                return Err(ScenarioError::DuplicateOracle {
                    field: format!("{field}.address"),
                    oracle: address,
                });
            }
            match spec {
                OracleSpec::TokenBalance {
                    token,
                    min_balance,
                    initialize,
                    ..
                } => {
                    let oracle = TokenBalanceOracle::new(address);
                    if *initialize {
                        oracle
                            .initialize(
                                parse_address(&format!("{field}.token"), token)?,
                                parse_number(&format!("{field}.min_balance"), min_balance)?,
                            )
                            .map_err(|source| ScenarioError::Oracle {
                                oracle: address,
                                source,
                            })?;
                    }
                    oracles.register(Arc::new(oracle));
                }
                OracleSpec::Hatch {
                    score_token,
                    ratio,
                    hatch,
                    initialize,
                    ..
                } => {
                    let oracle = HatchOracle::new(address);
                    if *initialize {
                        oracle
                            .initialize(
                                parse_address(&format!("{field}.score_token"), score_token)?,
                                parse_number(&format!("{field}.ratio"), ratio)?,
                                parse_address(&format!("{field}.hatch"), hatch)?,
                            )
                            .map_err(|source| ScenarioError::Oracle {
                                oracle: address,
                                source,
                            })?;
                    }
                    oracles.register(Arc::new(oracle));
                }
            }
        }

        tracing::debug!(
            event = "scenario_built",
            tokens = self.tokens.len(),
            hatches = self.hatches.len(),
            oracles = oracles.len()
        );
        Ok(Environment { ledger, oracles })
    }

    /// Build the environment and run every query in order.
    ///
    /// Oracle failures are reported per query; only malformed scenarios fail
    /// the whole evaluation.
    pub fn evaluate(&self) -> Result<Vec<QueryOutcome>, ScenarioError> {
        let env = self.build()?;
        let mut outcomes = Vec::with_capacity(self.queries.len());

        for (i, query) in self.queries.iter().enumerate() {
            let field = format!("queries[{i}]");
            let name = query.name.clone().unwrap_or_else(|| field.clone());
            let oracle_address = parse_address(&format!("{field}.oracle"), &query.oracle)?;
            let who = parse_address(&format!("{field}.who"), &query.who)?;
            let how = query
                .params
                .iter()
                .map(|p| parse_number(&format!("{field}.params"), p))
                .collect::<Result<Vec<_>, _>>()?;

            let oracle = env
                .oracles
                .oracle(oracle_address)
                .ok_or_else(|| ScenarioError::UnknownOracle {
                    query: name.clone(),
                    oracle: oracle_address,
                })?;

            let outcome = match oracle.can_perform(&env.ledger, who, Address::ZERO, B256::ZERO, &how) {
                Ok(allowed) => QueryOutcome {
                    name,
                    oracle: oracle_address,
                    who,
                    allowed: Some(allowed),
                    reason_code: None,
                    error: None,
                },
                Err(e) => QueryOutcome {
                    name,
                    oracle: oracle_address,
                    who,
                    allowed: None,
                    reason_code: Some(e.reason_code()),
                    error: Some(e.to_string()),
                },
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

pub fn parse_address(field: &str, value: &str) -> Result<Address, ScenarioError> {
    Address::from_str(value.trim()).map_err(|_| ScenarioError::InvalidAddress {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_number(field: &str, value: &str) -> Result<U256, ScenarioError> {
    U256::from_str(value.trim()).map_err(|_| ScenarioError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
tokens:
  - address: "0x5050505050505050505050505050505050505050"
    balances:
      "0x0202020202020202020202020202020202020202": "900"
      "0x0303030303030303030303030303030303030303": "100"
hatches:
  - address: "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b"
    contributions:
      "0x0303030303030303030303030303030303030303": "60"
oracles:
  - kind: hatch
    address: "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"
    score_token: "0x5050505050505050505050505050505050505050"
    ratio: "1000000"
    hatch: "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b"
  - kind: token_balance
    address: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
    token: "0x5050505050505050505050505050505050505050"
    min_balance: "0x64"
    initialize: false
queries:
  - name: full capacity
    oracle: "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"
    who: "0xffffffffffffffffffffffffffffffffffffffff"
    params: ["0x0202020202020202020202020202020202020202", "900"]
  - name: after prior contributions
    oracle: "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"
    who: "0xffffffffffffffffffffffffffffffffffffffff"
    params: ["0x0303030303030303030303030303030303030303", "41"]
  - oracle: "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"
    who: "0xffffffffffffffffffffffffffffffffffffffff"
    params: ["0x0202020202020202020202020202020202020202"]
  - name: uninitialized
    oracle: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
    who: "0x0202020202020202020202020202020202020202"
"#;

    #[test]
    fn test_evaluate_scenario() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let outcomes = scenario.evaluate().unwrap();
        assert_eq!(outcomes.len(), 4);

        assert_eq!(outcomes[0].name, "full capacity");
        assert_eq!(outcomes[0].allowed, Some(true));

        assert_eq!(outcomes[1].allowed, Some(false));

        assert_eq!(outcomes[2].name, "queries[2]");
        assert_eq!(outcomes[2].allowed, None);
        assert_eq!(
            outcomes[2].reason_code,
            Some("HATCH_ORACLE_PARAMS_MISSING")
        );
        assert!(outcomes[2].is_error());

        assert_eq!(outcomes[3].reason_code, Some("INIT_NOT_INITIALIZED"));
    }

    #[test]
    fn test_unknown_oracle_fails_evaluation() {
        let scenario = Scenario::from_yaml(
            r#"
queries:
  - oracle: "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"
    who: "0x0202020202020202020202020202020202020202"
"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.evaluate(),
            Err(ScenarioError::UnknownOracle { .. })
        ));
    }

    #[test]
    fn test_invalid_values_name_the_field() {
        let scenario = Scenario::from_yaml(
            r#"
tokens:
  - address: "not-an-address"
"#,
        )
        .unwrap();
        let err = scenario.build().err().unwrap();
        assert!(err.to_string().contains("tokens[0].address"), "{err}");

        let err = parse_number("ratio", "-5").unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidNumber { .. }));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = Scenario::from_yaml("tokenz: []\n");
        assert!(matches!(result, Err(ScenarioError::Parse(_))));

        let misspelled = Scenario::from_yaml(
            r#"
oracles:
  - kind: token_balance
    address: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
    token: "0x5050505050505050505050505050505050505050"
    min_balance: "100"
    initialise: false
"#,
        );
        assert!(matches!(misspelled, Err(ScenarioError::Parse(_))));
    }

    #[test]
    fn test_duplicate_oracle_address_is_rejected() {
        let scenario = Scenario::from_yaml(
            r#"
oracles:
  - kind: token_balance
    address: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
    token: "0x5050505050505050505050505050505050505050"
    min_balance: "100"
  - kind: hatch
    address: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"
    score_token: "0x5050505050505050505050505050505050505050"
    ratio: "1000000"
    hatch: "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b"
"#,
        )
        .unwrap();
        let err = scenario.build().err().unwrap();
        assert!(
            matches!(&err, ScenarioError::DuplicateOracle { field, .. } if field == "oracles[1].address"),
            "{err}"
        );
    }

    #[test]
    fn test_hatch_errors_are_not_relabelled() {
        let err = ScenarioError::from(HatchError::Overflow);
        assert!(matches!(err, ScenarioError::Hatch(HatchError::Overflow)));
        assert_eq!(
            err.to_string(),
            "hatch setup failed: contribution total overflow"
        );
    }
}
