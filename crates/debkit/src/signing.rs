//! Detached Ed25519 signatures over the control and data members.
//!
//! A signed package carries two extra `ar` members after the three standard
//! ones: `_sigcontrol` and `_sigdata`. Each holds the base64 encoded
//! signature of the corresponding member's bytes. dpkg ignores members whose
//! name starts with `_`, so signed packages install like unsigned ones.
//!
//! Key files hold a base64 encoded 32 byte key, the secret seed for signing
//! and the public key for verification.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fs;
use std::path::Path;

/// Member holding the signature of `control.tar.gz`.
pub const CONTROL_SIGNATURE: &str = "_sigcontrol";

/// Member holding the signature of `data.tar.gz`.
pub const DATA_SIGNATURE: &str = "_sigdata";

/// A named `ar` member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member identifier.
    pub name: String,
    /// Member contents.
    pub data: Vec<u8>,
}

impl Member {
    /// Create a member.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Signs package members with an Ed25519 key.
#[derive(Debug, Clone)]
pub struct PackageSigner {
    key: SigningKey,
}

impl PackageSigner {
    /// Wrap an existing key.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Load the secret key from a base64 key file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = read_key(path)?;
        Ok(Self::new(SigningKey::from_bytes(&bytes)))
    }

    /// The matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Signature member for `member`.
    fn sign(&self, signature_name: &str, member: &[u8]) -> Member {
        let signature = self.key.sign(member);
        let mut text = STANDARD.encode(signature.to_bytes());
        text.push('\n');
        Member::new(signature_name, text.into_bytes())
    }
}

/// Signature members for the control and data members, or none without a
/// signer.
pub fn maybe_sign(signer: Option<&PackageSigner>, control: &[u8], data: &[u8]) -> Vec<Member> {
    match signer {
        Some(signer) => {
            log::debug!("Signing package members");
            vec![
                signer.sign(CONTROL_SIGNATURE, control),
                signer.sign(DATA_SIGNATURE, data),
            ]
        }
        None => Vec::new(),
    }
}

/// Load a public key from a base64 key file.
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey> {
    let bytes = read_key(path)?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| Error::Key {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Base64 text for a public key, the format [`load_verifying_key`] reads.
#[must_use]
pub fn encode_key(bytes: &[u8; 32]) -> String {
    STANDARD.encode(bytes)
}

/// Check a signature member against the member it covers.
pub fn verify_member(
    key: &VerifyingKey,
    signature_name: &str,
    signature: &[u8],
    member: &[u8],
) -> Result<()> {
    let invalid = |message: String| Error::Signature {
        member: signature_name.to_string(),
        message,
    };

    let text = std::str::from_utf8(signature).map_err(|e| invalid(e.to_string()))?;
    let raw = STANDARD
        .decode(text.trim())
        .map_err(|e| invalid(e.to_string()))?;
    let bytes: [u8; 64] = raw
        .try_into()
        .map_err(|raw: Vec<u8>| invalid(format!("expected 64 bytes, found {}", raw.len())))?;

    key.verify(member, &Signature::from_bytes(&bytes))
        .map_err(|e| invalid(e.to_string()))
}

fn read_key(path: &Path) -> Result<[u8; 32]> {
    let key_error = |message: String| Error::Key {
        path: path.to_path_buf(),
        message,
    };

    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let raw = STANDARD
        .decode(text.trim())
        .map_err(|e| key_error(format!("not base64: {e}")))?;
    raw.try_into()
        .map_err(|raw: Vec<u8>| key_error(format!("expected 32 bytes, found {}", raw.len())))
}
