use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use hmac::Hmac;
use sha1::Sha1;

use crate::error::HashError;

const ARGON2ID_TAG: &str = "argon2id";
const ARGON2_MIN_SALT_LEN: usize = 8;

// Ceilings keep a stored record from demanding unbounded time or memory.
pub const MAX_ITERATIONS: u32 = 10_000_000;
pub const MAX_ARGON2_MEMORY_KIB: u32 = 1024 * 1024;

// Untagged first field means PBKDF2-HMAC-SHA1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfParams {
    Pbkdf2Sha1 {
        iterations: u32,
    },
    Argon2id {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl KdfParams {
    pub fn name(&self) -> &'static str {
        match self {
            KdfParams::Pbkdf2Sha1 { .. } => "PBKDF2-HMAC-SHA1",
            KdfParams::Argon2id { .. } => "Argon2id",
        }
    }

    pub fn iterations(&self) -> u32 {
        match *self {
            KdfParams::Pbkdf2Sha1 { iterations } | KdfParams::Argon2id { iterations, .. } => {
                iterations
            }
        }
    }

    #[must_use]
    pub fn with_iterations(self, iterations: u32) -> Self {
        match self {
            KdfParams::Pbkdf2Sha1 { .. } => KdfParams::Pbkdf2Sha1 { iterations },
            KdfParams::Argon2id {
                memory_kib,
                parallelism,
                ..
            } => KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            },
        }
    }

    /// Different scheme, or any cost below `target`'s.
    pub fn is_weaker_than(&self, target: &KdfParams) -> bool {
        match (*self, *target) {
            (
                KdfParams::Pbkdf2Sha1 { iterations },
                KdfParams::Pbkdf2Sha1 {
                    iterations: wanted,
                },
            ) => iterations < wanted,
            (
                KdfParams::Argon2id {
                    memory_kib,
                    iterations,
                    parallelism,
                },
                KdfParams::Argon2id {
                    memory_kib: wanted_memory,
                    iterations: wanted_iterations,
                    parallelism: wanted_parallelism,
                },
            ) => {
                memory_kib < wanted_memory
                    || iterations < wanted_iterations
                    || parallelism < wanted_parallelism
            }
            _ => true,
        }
    }

    pub fn check(&self, salt_len: usize, output_len: usize) -> Result<(), HashError> {
        if salt_len == 0 {
            return Err(HashError::unavailable("salt must not be empty"));
        }
        if output_len == 0 {
            return Err(HashError::unavailable("output length must be >= 1"));
        }
        if self.iterations() > MAX_ITERATIONS {
            return Err(HashError::unavailable(format!(
                "iteration count {} exceeds maximum of {MAX_ITERATIONS}",
                self.iterations()
            )));
        }

        match *self {
            KdfParams::Pbkdf2Sha1 { iterations } => {
                if iterations == 0 {
                    return Err(HashError::unavailable("PBKDF2 iterations must be >= 1"));
                }
                Ok(())
            }
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                if memory_kib > MAX_ARGON2_MEMORY_KIB {
                    return Err(HashError::unavailable(format!(
                        "Argon2 memory {memory_kib} KiB exceeds maximum of {MAX_ARGON2_MEMORY_KIB} KiB"
                    )));
                }
                if salt_len < ARGON2_MIN_SALT_LEN {
                    return Err(HashError::unavailable(format!(
                        "Argon2 salt must be at least {ARGON2_MIN_SALT_LEN} bytes"
                    )));
                }
                argon2_params(memory_kib, iterations, parallelism, Some(output_len)).map(|_| ())
            }
        }
    }

    pub fn derive(&self, secret: &[u8], salt: &[u8], output: &mut [u8]) -> Result<(), HashError> {
        self.check(salt.len(), output.len())?;

        tracing::debug!(
            scheme = self.name(),
            iterations = self.iterations(),
            salt_len = salt.len(),
            output_len = output.len(),
            "deriving key"
        );

        match *self {
            KdfParams::Pbkdf2Sha1 { iterations } => {
                pbkdf2::pbkdf2::<Hmac<Sha1>>(secret, salt, iterations, output)
                    .map_err(|e| HashError::unavailable(format!("PBKDF2 failed: {e}")))
            }
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => {
                let params =
                    argon2_params(memory_kib, iterations, parallelism, Some(output.len()))?;
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                    .hash_password_into(secret, salt, output)
                    .map_err(|e| HashError::unavailable(format!("Argon2 derivation failed: {e}")))
            }
        }
    }
}

fn argon2_params(
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    output_len: Option<usize>,
) -> Result<Params, HashError> {
    Params::new(memory_kib, iterations, parallelism, output_len)
        .map_err(|e| HashError::unavailable(format!("Invalid Argon2 parameters: {e}")))
}

impl fmt::Display for KdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KdfParams::Pbkdf2Sha1 { iterations } => write!(f, "{iterations}"),
            KdfParams::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => write!(
                f,
                "{ARGON2ID_TAG},m={memory_kib},t={iterations},p={parallelism}"
            ),
        }
    }
}

impl FromStr for KdfParams {
    type Err = HashError;

    fn from_str(field: &str) -> Result<Self, HashError> {
        match field.split_once(',') {
            Some((ARGON2ID_TAG, costs)) => parse_argon2id(costs),
            Some((tag, _)) => Err(HashError::malformed(format!("unknown scheme tag `{tag}`"))),
            None => {
                let iterations = parse_cost(field, "iteration count")?;
                if iterations == 0 {
                    return Err(HashError::malformed("iteration count must be >= 1"));
                }
                Ok(KdfParams::Pbkdf2Sha1 { iterations })
            }
        }
    }
}

fn parse_argon2id(costs: &str) -> Result<KdfParams, HashError> {
    let mut parts = costs.split(',');
    let mut next = |key: &str| -> Result<u32, HashError> {
        let part = parts
            .next()
            .ok_or_else(|| HashError::malformed(format!("missing Argon2 parameter `{key}`")))?;
        let value = part
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| HashError::malformed(format!("expected `{key}=`, found `{part}`")))?;
        parse_cost(value, key)
    };

    let memory_kib = next("m")?;
    let iterations = next("t")?;
    let parallelism = next("p")?;

    if parts.next().is_some() {
        return Err(HashError::malformed("unexpected trailing Argon2 parameter"));
    }

    Params::new(memory_kib, iterations, parallelism, None)
        .map_err(|e| HashError::malformed(format!("invalid Argon2 parameters: {e}")))?;

    Ok(KdfParams::Argon2id {
        memory_kib,
        iterations,
        parallelism,
    })
}

// `u32::from_str` accepts a leading `+`; records never contain one.
fn parse_cost(value: &str, what: &str) -> Result<u32, HashError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HashError::malformed(format!(
            "{what} `{value}` is not a decimal number"
        )));
    }
    value
        .parse()
        .map_err(|_| HashError::malformed(format!("{what} `{value}` is out of range")))
}
