//! Permission params.
//!
//! On the wire a param is one packed 256-bit word:
//!
//! ```text
//!  255      248 247      240 239                                        0
//! ┌────────────┬────────────┬──────────────────────────────────────────┐
//! │  param id  │  operator  │                 value                    │
//! └────────────┴────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Words are decoded into [`PermissionParam`] once, when a grant is stored.
//! Evaluation only ever sees the tagged form.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub const BLOCK_NUMBER_PARAM_ID: u8 = 200;
pub const TIMESTAMP_PARAM_ID: u8 = 201;
pub const ORACLE_PARAM_ID: u8 = 203;
pub const LOGIC_OP_PARAM_ID: u8 = 204;
pub const PARAM_VALUE_PARAM_ID: u8 = 205;

/// Highest param id that refers to a positional call argument.
pub const MAX_ARGUMENT_INDEX: u8 = 199;

const VALUE_BITS: usize = 240;
const ID_SHIFT: usize = 248;
const ADDRESS_BITS: usize = 160;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("operator {0} does not exist")]
    InvalidOperator(u8),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("logic operator '{}' is not supported", .0.as_str())]
    UnsupportedOperator(Operator),

    #[error("param id {0} is not supported")]
    UnsupportedParam(u8),

    #[error("oracle param value does not fit in an address")]
    OracleAddressTooBig,

    #[error("param value does not fit in 240 bits")]
    ValueTooBig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    None = 0,
    Eq = 1,
    Neq = 2,
    Gt = 3,
    Lt = 4,
    Gte = 5,
    Lte = 6,
    Ret = 7,
    Not = 8,
    And = 9,
    Or = 10,
    Xor = 11,
    IfElse = 12,
}

impl Operator {
    pub fn from_u8(op: u8) -> Result<Self, ParamError> {
        Ok(match op {
            0 => Self::None,
            1 => Self::Eq,
            2 => Self::Neq,
            3 => Self::Gt,
            4 => Self::Lt,
            5 => Self::Gte,
            6 => Self::Lte,
            7 => Self::Ret,
            8 => Self::Not,
            9 => Self::And,
            10 => Self::Or,
            11 => Self::Xor,
            12 => Self::IfElse,
            other => return Err(ParamError::InvalidOperator(other)),
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Ret => "ret",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::IfElse => "if_else",
        }
    }

    /// Operators that combine other params by index.
    pub fn is_logic(&self) -> bool {
        matches!(
            self,
            Self::Not | Self::And | Self::Or | Self::Xor | Self::IfElse
        )
    }

    /// Compare `value` against `compared_to`. `None`, `Ret` and logic
    /// operators never hold here; `Ret` is resolved by the caller.
    pub fn compare(&self, value: U256, compared_to: U256) -> bool {
        match self {
            Self::Eq => value == compared_to,
            Self::Neq => value != compared_to,
            Self::Gt => value > compared_to,
            Self::Lt => value < compared_to,
            Self::Gte => value >= compared_to,
            Self::Lte => value <= compared_to,
            _ => false,
        }
    }
}

impl FromStr for Operator {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "gte" => Self::Gte,
            "lte" => Self::Lte,
            "ret" => Self::Ret,
            "not" => Self::Not,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "if_else" | "ifelse" => Self::IfElse,
            _ => return Err(ParamError::UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// A decoded permission param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermissionParam {
    /// Compares the call argument at `index` against `value`.
    Argument {
        index: u8,
        op: Operator,
        value: U256,
    },
    /// Consults the oracle deployed at `oracle`; its verdict counts as `1` or `0`.
    Oracle { op: Operator, oracle: Address },
    /// Compares `value` against itself.
    Constant { op: Operator, value: U256 },
}

impl PermissionParam {
    pub fn argument(index: u8, op: Operator, value: U256) -> Result<Self, ParamError> {
        if index > MAX_ARGUMENT_INDEX {
            return Err(ParamError::UnsupportedParam(index));
        }
        check_operator(op)?;
        if value.bit_len() > VALUE_BITS {
            return Err(ParamError::ValueTooBig);
        }
        Ok(Self::Argument { index, op, value })
    }

    pub fn oracle(op: Operator, oracle: Address) -> Result<Self, ParamError> {
        check_operator(op)?;
        Ok(Self::Oracle { op, oracle })
    }

    pub fn constant(op: Operator, value: U256) -> Result<Self, ParamError> {
        check_operator(op)?;
        if value.bit_len() > VALUE_BITS {
            return Err(ParamError::ValueTooBig);
        }
        Ok(Self::Constant { op, value })
    }

    pub fn decode(word: U256) -> Result<Self, ParamError> {
        let id = (word >> ID_SHIFT).to::<u8>();
        let op = ((word >> VALUE_BITS) & U256::from(0xffu8)).to::<u8>();
        let value = word & value_mask();
        let op = Operator::from_u8(op)?;

        match id {
            0..=MAX_ARGUMENT_INDEX => Self::argument(id, op, value),
            ORACLE_PARAM_ID => {
                let oracle = word_to_address(value).ok_or(ParamError::OracleAddressTooBig)?;
                Self::oracle(op, oracle)
            }
            PARAM_VALUE_PARAM_ID => Self::constant(op, value),
            other => Err(ParamError::UnsupportedParam(other)),
        }
    }

    /// Pack back into the wire word. Inverse of [`PermissionParam::decode`].
    pub fn encode(&self) -> U256 {
        let (id, op, value) = match *self {
            Self::Argument { index, op, value } => (index, op, value),
            Self::Oracle { op, oracle } => (ORACLE_PARAM_ID, op, address_to_word(oracle)),
            Self::Constant { op, value } => (PARAM_VALUE_PARAM_ID, op, value),
        };
        (U256::from(id) << ID_SHIFT) | (U256::from(op.as_u8()) << VALUE_BITS) | (value & value_mask())
    }

    pub fn op(&self) -> Operator {
        match self {
            Self::Argument { op, .. } | Self::Oracle { op, .. } | Self::Constant { op, .. } => *op,
        }
    }
}

fn check_operator(op: Operator) -> Result<(), ParamError> {
    if op.is_logic() {
        return Err(ParamError::UnsupportedOperator(op));
    }
    Ok(())
}

pub(crate) fn value_mask() -> U256 {
    (U256::from(1u8) << VALUE_BITS) - U256::from(1u8)
}

/// Left-pad an address into a 256-bit word.
pub fn address_to_word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Read a word as an address. `None` when it uses more than 160 bits.
pub fn word_to_address(word: U256) -> Option<Address> {
    if word.bit_len() > ADDRESS_BITS {
        return None;
    }
    let bytes = word.to_be_bytes::<32>();
    Some(Address::from_slice(&bytes[12..]))
}
