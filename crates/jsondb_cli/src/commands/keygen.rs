//! Keygen command implementation.

use jsondb_core::SecretKey;

/// Prints a fresh 256-bit key in the hex form used by `--key` and the
/// `db.secret_key` setting.
pub fn run() {
    println!("{}", SecretKey::generate().to_hex());
}
