//! User code generation
//!
//! Every peer picks a random eight-digit code at startup. The code is the
//! peer's identity for the whole session; nicks can change, codes cannot.

use rand::RngExt;

/// Smallest user code
pub const MIN_USER_CODE: u32 = 10_000_000;

/// Largest user code
pub const MAX_USER_CODE: u32 = 99_999_999;

/// Generate a random eight-digit user code
pub fn generate_user_code() -> u32 {
    let bytes: [u8; 4] = rand::rng().random();
    let span = MAX_USER_CODE - MIN_USER_CODE + 1;
    MIN_USER_CODE + u32::from_be_bytes(bytes) % span
}
