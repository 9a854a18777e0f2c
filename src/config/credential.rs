//! Remote login credentials.

use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// A secret string that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How the remote user authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    PrivateKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::PrivateKey => "private_key",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" => Ok(AuthMethod::Password),
            "private_key" | "privatekey" | "key" => Ok(AuthMethod::PrivateKey),
            _ => Err(AuthError::UnsupportedMethod(s.trim().to_string())),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential material for exactly one auth method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(Secret),
    PrivateKey {
        material: Secret,
        passphrase: Option<Secret>,
        /// Environment variable the key material was read from.
        source_env: String,
    },
}

impl Credential {
    /// The auth method this credential belongs to.
    pub fn method(&self) -> AuthMethod {
        match self {
            Credential::Password(_) => AuthMethod::Password,
            Credential::PrivateKey { .. } => AuthMethod::PrivateKey,
        }
    }
}
