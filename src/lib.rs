pub mod error;
pub mod hasher;
pub mod kdf;
pub mod record;

pub use error::HashError;
pub use hasher::{create, create_with, needs_rehash, verify, HasherConfig};
pub use kdf::KdfParams;
pub use record::HashRecord;
