use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};

use crate::error::{LedgerError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

// SHA-256("abc"), FIPS 180-2 appendix B.1
const SELF_TEST_INPUT: &[u8] = b"abc";
const SELF_TEST_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Io(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(LedgerError::Io("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Lowercase hex SHA-256, the encoding used for block hashes on the wire.
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

/// Known-answer test for the hashing primitive. A node refuses to start
/// if this fails.
pub fn hashing_self_test() -> Result<()> {
    let digest = sha256_hex(SELF_TEST_INPUT);
    if digest != SELF_TEST_DIGEST {
        return Err(LedgerError::HashingUnavailable(format!(
            "SHA-256 known-answer test failed: got {digest}"
        )));
    }
    Ok(())
}
