//! SSH authentication.
//!
//! - Private key loading with an ordered list of algorithm parsers
//! - Session handshake, host key pinning and login

mod keys;
mod session;

pub use keys::{normalize_key_material, KeyAlgorithm, KeyLoader, LoadedKey};
pub use session::Authenticator;
