//! Provably fair outcome derivation.
//!
//! Every bet's outcome is a pure function of a (server seed, client seed,
//! nonce) triple. The server seed is generated fresh per bet and its
//! SHA-256 hash is stored with the record, so any party can later
//! recompute the outcome and confirm the commitment.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Number of discrete outcomes. Rolls are uniform over [0, 9999]; the
/// exposed result is `roll / 100` with two decimal digits. This bounds
/// win-chance granularity to 0.01%.
pub const OUTCOME_STATES: u32 = 10_000;

/// Derive the roll for a seed triple.
///
/// HMAC-SHA256 keyed with the server seed over `"{client_seed}-{nonce}"`;
/// the first four digest bytes, read big-endian (equivalently the first
/// eight hex characters of the digest), reduced mod 10 000.
pub fn derive_roll(server_seed: &str, client_seed: &str, nonce: u64) -> u32 {
    let mut mac = HmacSha256::new_from_slice(server_seed.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(format!("{}-{}", client_seed, nonce).as_bytes());
    let digest = mac.finalize().into_bytes();

    let head: [u8; 4] = digest[..4].try_into().expect("digest is 32 bytes");
    u32::from_be_bytes(head) % OUTCOME_STATES
}

/// Exposed form of a roll: two-decimal value in [0.00, 99.99].
pub fn roll_value(roll: u32) -> f64 {
    f64::from(roll) / 100.0
}

/// Generate a fresh server seed: 32 bytes from the OS RNG, hex-encoded.
pub fn generate_server_seed() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a client seed when the caller did not supply one.
pub fn generate_client_seed() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 commitment hash of a seed string, hex-encoded.
pub fn seed_hash(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}
