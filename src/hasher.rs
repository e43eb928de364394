use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::HashError;
use crate::kdf::KdfParams;
use crate::record::HashRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub params: KdfParams,
    pub salt_len: usize,
    pub key_len: usize,
}

impl HasherConfig {
    /// PBKDF2-HMAC-SHA1, 1000 iterations, 24-byte salt and key.
    pub const LEGACY: Self = Self {
        params: KdfParams::Pbkdf2Sha1 { iterations: 1000 },
        salt_len: 24,
        key_len: 24,
    };

    pub const STANDARD: Self = Self {
        params: KdfParams::Argon2id {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        },
        salt_len: 16,
        key_len: 32,
    };

    pub const PARANOID: Self = Self {
        params: KdfParams::Argon2id {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        },
        salt_len: 16,
        key_len: 32,
    };

    pub fn validate(&self) -> Result<(), HashError> {
        self.params.check(self.salt_len, self.key_len)
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::LEGACY
    }
}

pub fn create(secret: &str) -> Result<String, HashError> {
    create_with(secret, &HasherConfig::LEGACY)
}

pub fn create_with(secret: &str, config: &HasherConfig) -> Result<String, HashError> {
    config.validate()?;

    let mut salt = vec![0u8; config.salt_len];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| HashError::unavailable(format!("secure random source failed: {e}")))?;

    let mut derived_key = vec![0u8; config.key_len];
    config
        .params
        .derive(secret.as_bytes(), &salt, &mut derived_key)?;

    Ok(HashRecord::new(config.params, salt, derived_key)?.to_string())
}

/// A wrong secret is `Ok(false)`; an unparseable record is
/// [`HashError::MalformedRecord`].
pub fn verify(secret: &str, encoded: &str) -> Result<bool, HashError> {
    let record = parse_logged(encoded)?;

    let mut candidate = Zeroizing::new(vec![0u8; record.derived_key().len()]);
    record
        .params()
        .derive(secret.as_bytes(), record.salt(), &mut candidate)?;

    Ok(candidate.as_slice().ct_eq(record.derived_key()).into())
}

pub fn needs_rehash(encoded: &str, config: &HasherConfig) -> Result<bool, HashError> {
    let record = parse_logged(encoded)?;

    Ok(record.params().is_weaker_than(&config.params)
        || record.salt().len() < config.salt_len
        || record.derived_key().len() < config.key_len)
}

fn parse_logged(encoded: &str) -> Result<HashRecord, HashError> {
    HashRecord::parse(encoded).inspect_err(|e| tracing::warn!("rejecting stored hash: {e}"))
}
