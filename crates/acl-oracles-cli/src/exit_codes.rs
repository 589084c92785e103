//! Exit codes of the `acl-oracles` binary. Scripts depend on these values.

pub const OK: i32 = 0;
pub const QUERY_FAILED: i32 = 1; // At least one query returned an oracle error
pub const CONFIG_ERROR: i32 = 2; // Unreadable scenario, bad arguments or malformed input
