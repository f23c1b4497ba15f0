//! Template code generation
//!
//! Codes look like `CS-2024-7QX41B`: a fixed prefix, the 4-digit calendar
//! year, and a short uppercase base-36 token. Clock and randomness are
//! injected so generation is a pure function of its inputs and can be
//! retried by the registry on a uniqueness conflict.

use carbonweb_config::CodesConfig;
use rand::Rng;

/// Characters allowed in the random code suffix
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a candidate template code for the given calendar year
pub fn generate_code<R: Rng>(rng: &mut R, year: i32, policy: &CodesConfig) -> String {
    let suffix: String = (0..policy.random_length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{}-{:04}-{}", policy.prefix, year, suffix)
}

/// Check whether a string has the shape of a generated code
///
/// Used to short-circuit lookups by code before scanning the registry.
pub fn is_valid_code(code: &str, policy: &CodesConfig) -> bool {
    let mut parts = code.splitn(3, '-');
    let (prefix, year, suffix) = match (parts.next(), parts.next(), parts.next()) {
        (Some(p), Some(y), Some(s)) => (p, y, s),
        _ => return false,
    };

    prefix == policy.prefix
        && year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == policy.random_length
        && suffix.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

// ==================== Tests ====================
