use rand::Rng;
use regex::Regex;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RUN_CODE_LENGTH: usize = 7;
const SHORT_ID_LENGTH: usize = 6;

pub const TEST_CASE_PREFIX: &str = "TC";
pub const STEP_PREFIX: &str = "STEP";

/// Public run code: 7 characters over [A-Z0-9], e.g. `A3F9K2M`. Collisions
/// are tolerated; the code is a search alias for humans, not a primary key.
pub fn run_code() -> String {
    random_code(RUN_CODE_LENGTH)
}

/// Prefixed short id for nested records, e.g. `TC3F9K2A` or `STEPB61X0P`.
pub fn short_id(prefix: &str) -> String {
    format!("{}{}", prefix, random_code(SHORT_ID_LENGTH))
}

/// Whether a path segment has the shape of a run code rather than an
/// internal uuid. Uuids contain hyphens and lowercase hex, so the two
/// namespaces never overlap.
pub fn looks_like_run_code(value: &str) -> bool {
    Regex::new(r"^[A-Z0-9]{7}$")
        .map(|pattern| pattern.is_match(value))
        .unwrap_or(false)
}

fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
