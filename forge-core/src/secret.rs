//! Per-payload secret generation

use rand::Rng;
use rand::distr::Alphanumeric;

/// Generates an alphanumeric string of `length` characters
///
/// Draws from the thread-local CSPRNG, which is seeded from the OS.
pub fn generate_secure_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Replaces every occurrence of `secret` in `text` with `<redacted>`
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "<redacted>")
}
