#![no_main]

use acl_oracles_core::{PermissionParam, U256};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: [u8; 32]| {
    let word = U256::from_be_bytes(data);
    if let Ok(param) = PermissionParam::decode(word) {
        assert_eq!(param.encode(), word);
        assert_eq!(PermissionParam::decode(param.encode()), Ok(param));
    }
});
