//! Permission param command arguments.

use acl_oracles_core::Operator;
use clap::{Args, Subcommand, ValueEnum};

#[derive(Args, Clone, Debug)]
pub struct ParamArgs {
    #[command(subcommand)]
    pub cmd: ParamCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ParamCommand {
    /// Pack a param into its 256-bit word
    Encode(ParamEncodeArgs),

    /// Unpack a 256-bit word and print it as JSON
    Decode(ParamDecodeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Consult an oracle contract
    Oracle,
    /// Compare a call argument
    Arg,
    /// Compare a constant against itself
    Constant,
}

#[derive(Args, Clone, Debug)]
pub struct ParamEncodeArgs {
    #[arg(long, value_enum)]
    pub kind: ParamKind,

    /// Comparison operator (eq, neq, gt, lt, gte, lte, ret, none)
    #[arg(long)]
    pub op: Operator,

    /// Oracle address for `oracle`, otherwise a decimal or 0x-hex number
    #[arg(long)]
    pub value: String,

    /// Argument index, required for `arg`
    #[arg(long, required_if_eq("kind", "arg"))]
    pub index: Option<u8>,
}

#[derive(Args, Clone, Debug)]
pub struct ParamDecodeArgs {
    /// Packed word, decimal or 0x-hex
    pub word: String,
}
