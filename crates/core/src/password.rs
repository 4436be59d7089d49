//! PBKDF2-SHA256 password hashing, verification, and reset-password generation.
//!
//! New hashes use the PHC string format (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`)
//! with a fresh 16-byte salt per call, so the iteration count and salt travel
//! with the hash. Verification also accepts the passlib modular format
//! (`$pbkdf2-sha256$<rounds>$<salt>$<checksum>`, adapted base64) found in rows
//! written by older tooling.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::CoreError;

/// Length of the plaintext password handed out by a password reset.
pub const RESET_PASSWORD_LEN: usize = 8;

const SALT_LEN: usize = 16;

const PBKDF2_SHA256_PREFIX: &str = "$pbkdf2-sha256$";

/// Tunable key-derivation parameters.
///
/// The default iteration count is the one recommended by the `pbkdf2` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub rounds: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            rounds: Params::default().rounds,
        }
    }
}

impl HashParams {
    fn to_pbkdf2(self) -> Params {
        Params {
            rounds: self.rounds,
            ..Params::default()
        }
    }
}

/// Hash a plaintext password with PBKDF2-SHA256 and a random salt.
///
/// Returns the PHC-formatted hash string. Hashing the same plaintext twice
/// yields two different strings.
pub fn hash_password(password: &str, params: HashParams) -> Result<String, CoreError> {
    if params.rounds == 0 {
        return Err(CoreError::Validation(
            "PBKDF2 round count must be positive".into(),
        ));
    }

    let mut salt_bytes = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;

    let hash = Pbkdf2.hash_password_customized(
        password.as_bytes(),
        None,
        None,
        params.to_pbkdf2(),
        &salt,
    )?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `Ok(true)` on a match and `Ok(false)` on a mismatch. A stored
/// value that is not a recognisable PBKDF2-SHA256 hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CoreError> {
    if let Some(legacy) = LegacyHash::parse(hash)? {
        return Ok(legacy.verify(password));
    }

    let parsed = PasswordHash::new(hash)?;
    match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Generate a random password of `len` characters drawn uniformly from
/// `[A-Za-z0-9]`.
pub fn generate_password(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// A hash in passlib's modular `pbkdf2_sha256` format.
struct LegacyHash {
    rounds: u32,
    salt: Vec<u8>,
    checksum: Vec<u8>,
}

impl LegacyHash {
    /// Returns `Ok(None)` when `hash` is not in the legacy shape at all, so the
    /// caller can fall through to PHC parsing.
    fn parse(hash: &str) -> Result<Option<Self>, CoreError> {
        let Some(rest) = hash.strip_prefix(PBKDF2_SHA256_PREFIX) else {
            return Ok(None);
        };

        let fields: Vec<&str> = rest.split('$').collect();
        let [rounds, salt, checksum] = fields.as_slice() else {
            return Ok(None);
        };
        // PHC strings carry `i=<rounds>` here; a bare number marks passlib.
        if rounds.is_empty() || !rounds.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }

        let rounds: u32 = rounds
            .parse()
            .map_err(|_| CoreError::MalformedHash("round count out of range".into()))?;
        if rounds == 0 {
            return Err(CoreError::MalformedHash("round count is zero".into()));
        }

        let salt = decode_ab64(salt)?;
        let checksum = decode_ab64(checksum)?;
        if checksum.is_empty() {
            return Err(CoreError::MalformedHash("empty checksum".into()));
        }

        Ok(Some(Self {
            rounds,
            salt,
            checksum,
        }))
    }

    fn verify(&self, password: &str) -> bool {
        let mut derived = vec![0u8; self.checksum.len()];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &self.salt, self.rounds, &mut derived);
        derived.ct_eq(&self.checksum).into()
    }
}

/// Decode passlib's adapted base64 (`.` instead of `+`, no padding).
fn decode_ab64(encoded: &str) -> Result<Vec<u8>, CoreError> {
    STANDARD_NO_PAD
        .decode(encoded.replace('.', "+"))
        .map_err(|e| CoreError::MalformedHash(format!("invalid adapted base64: {e}")))
}
