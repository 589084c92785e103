use acl_oracles_core::acl::PermissionParam;
use acl_oracles_core::scenario::{parse_address, parse_number};
use acl_oracles_core::{B256, U256};
use anyhow::{Context, Result};

use crate::cli::args::{ParamArgs, ParamCommand, ParamDecodeArgs, ParamEncodeArgs, ParamKind};
use crate::exit_codes;

pub fn run(args: ParamArgs) -> Result<i32> {
    match args.cmd {
        ParamCommand::Encode(a) => encode(a),
        ParamCommand::Decode(a) => decode(a),
    }
}

fn encode(args: ParamEncodeArgs) -> Result<i32> {
    let param = build(&args)?;
    println!("{}", to_hex(param.encode()));
    Ok(exit_codes::OK)
}

fn build(args: &ParamEncodeArgs) -> Result<PermissionParam> {
    let param = match args.kind {
        ParamKind::Oracle => {
            let oracle = parse_address("--value", &args.value)?;
            PermissionParam::oracle(args.op, oracle)
        }
        ParamKind::Arg => {
            let index = args.index.context("--index is required for arg params")?;
            PermissionParam::argument(index, args.op, parse_number("--value", &args.value)?)
        }
        ParamKind::Constant => {
            PermissionParam::constant(args.op, parse_number("--value", &args.value)?)
        }
    };
    param.context("invalid permission param")
}

fn decode(args: ParamDecodeArgs) -> Result<i32> {
    let word = parse_number("word", &args.word)?;
    let param = PermissionParam::decode(word)
        .with_context(|| format!("cannot decode {}", to_hex(word)))?;
    let json = serde_json::to_string_pretty(&param).context("failed to serialize param")?;
    println!("{json}");
    Ok(exit_codes::OK)
}

fn to_hex(word: U256) -> String {
    B256::from(word.to_be_bytes::<32>()).to_string()
}
