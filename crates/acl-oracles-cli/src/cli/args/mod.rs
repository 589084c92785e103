use clap::{Parser, Subcommand};

pub mod check;
pub mod param;
pub use check::*;
pub use param::*;

#[derive(Parser)]
#[command(
    name = "acl-oracles",
    version,
    about = "Evaluate token-balance and hatch ACL oracles against scenario files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate every query of a scenario file
    Check(CheckArgs),
    /// Encode or decode packed permission params
    Param(ParamArgs),
    Version,
}
