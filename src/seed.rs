use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::{info, warn};

pub const SEED_LEN: usize = 4;

const SEED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of distinct 4-character base-36 seeds.
const SEED_SPACE: u64 = 36 * 36 * 36 * 36;

static SEED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4}$").unwrap());
static LOOSE_SEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{4}$").unwrap());

/// A room seed is exactly four upper-case letters or digits.
pub fn is_valid(seed: &str) -> bool {
    SEED_RE.is_match(seed)
}

pub fn random_seed() -> String {
    let mut rng = rand::rng();
    (0..SEED_LEN)
        .map(|_| SEED_ALPHABET[rng.random_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Base-36 value of a seed. Case-insensitive.
pub fn seed_value(seed: &str) -> Option<u64> {
    if !LOOSE_SEED_RE.is_match(seed) {
        return None;
    }
    u64::from_str_radix(seed, 36).ok()
}

/// Deterministic random source for everything derived from a seed.
pub fn rng_for(seed: &str) -> Option<StdRng> {
    seed_value(seed).map(StdRng::seed_from_u64)
}

/// Successor of `old` in a room's seed sequence. Always the same for the
/// same input.
pub fn next_seed(old: &str) -> Option<String> {
    let Some(mut rng) = rng_for(old) else {
        warn!("Invalid old seed received for generation: {}", old);
        return None;
    };

    let next = to_base36(rng.random_range(0..SEED_SPACE));
    info!("Generated new seed {} from old seed {}", next, old);
    Some(next)
}

fn to_base36(mut value: u64) -> String {
    let mut digits = Vec::with_capacity(SEED_LEN);
    while value > 0 {
        let d = (value % 36) as u8;
        digits.push(if d < 10 { b'0' + d } else { b'A' + d - 10 });
        value /= 36;
    }
    while digits.len() < SEED_LEN {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&b| b as char).collect()
}
