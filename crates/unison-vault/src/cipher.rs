// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `enc:v1:` envelope and the two-branch decode path.
//!
//! Envelope layout: `enc:v1:` followed by base64 of `nonce || ciphertext || tag`.
//! Decoding never fails. A value that cannot be decrypted is re-read as
//! plaintext JSON, and if that fails too the caller gets an empty object.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};
use tracing::warn;
use unison_core::ContextError;
use zeroize::Zeroizing;

use crate::crypto::{self, NONCE_LEN, TAG_LEN};

/// Marker prepended to every encrypted blob.
pub const ENVELOPE_PREFIX: &str = "enc:v1:";

/// Which branch of the decode path produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DecodePath {
    /// Authenticated decryption succeeded.
    Decrypted,
    /// The stored text parsed as plain JSON.
    Plaintext,
    /// Nothing readable; an empty object was substituted.
    Empty,
}

/// Result of [`PayloadCipher::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    pub path: DecodePath,
    /// True when the configured decode branch was not the one that produced
    /// `value`.
    pub fallback: bool,
}

/// Symmetric cipher for stored payloads. Without a key it is a pass-through
/// JSON serializer.
#[derive(Clone, Default)]
pub struct PayloadCipher {
    key: Option<Zeroizing<[u8; 32]>>,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PayloadCipher {
    pub fn new(key: Option<[u8; 32]>) -> Self {
        Self {
            key: key.map(Zeroizing::new),
        }
    }

    /// A cipher that stores plain JSON.
    pub fn plaintext() -> Self {
        Self { key: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Serialize `value`, sealing it when a key is configured.
    pub fn encode(&self, value: &Value) -> Result<String, ContextError> {
        let json = serde_json::to_vec(value)
            .map_err(|e| ContextError::Internal(format!("failed to serialize payload: {e}")))?;

        let Some(key) = self.key.as_ref() else {
            return String::from_utf8(json)
                .map_err(|e| ContextError::Internal(format!("payload is not utf-8: {e}")));
        };

        let (ciphertext, nonce) = crypto::seal(key, &json)?;
        let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        packed.extend_from_slice(&nonce);
        packed.extend_from_slice(&ciphertext);
        Ok(format!("{ENVELOPE_PREFIX}{}", BASE64.encode(packed)))
    }

    /// Decode a stored blob. `record` only labels log lines.
    pub fn decode(&self, record: &str, stored: &str) -> Decoded {
        if let Some(envelope) = stored.strip_prefix(ENVELOPE_PREFIX) {
            match self.key.as_ref() {
                Some(key) => match open_envelope(key, envelope) {
                    Ok(value) => {
                        return Decoded {
                            value,
                            path: DecodePath::Decrypted,
                            fallback: false,
                        };
                    }
                    Err(e) => {
                        warn!(record, error = %e, "decryption failed, falling back to plaintext");
                    }
                },
                None => {
                    warn!(record, "encrypted payload found but no encryption key is configured");
                }
            }
        }

        match serde_json::from_str::<Value>(stored) {
            Ok(value) => {
                let fallback = self.is_enabled();
                if fallback {
                    warn!(record, "payload read as unencrypted plaintext");
                }
                Decoded {
                    value,
                    path: DecodePath::Plaintext,
                    fallback,
                }
            }
            Err(e) => {
                warn!(record, error = %e, "payload unreadable, substituting empty object");
                Decoded {
                    value: Value::Object(Map::new()),
                    path: DecodePath::Empty,
                    fallback: true,
                }
            }
        }
    }
}

fn open_envelope(key: &[u8; 32], envelope: &str) -> Result<Value, ContextError> {
    let packed = BASE64
        .decode(envelope.trim())
        .map_err(|e| ContextError::Crypto(format!("envelope is not valid base64: {e}")))?;
    if packed.len() < NONCE_LEN + TAG_LEN {
        return Err(ContextError::Crypto("envelope too short".to_string()));
    }

    let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce);

    let plaintext = Zeroizing::new(crypto::open(key, &nonce_bytes, ciphertext)?);
    serde_json::from_slice(&plaintext)
        .map_err(|e| ContextError::Crypto(format!("decrypted payload is not JSON: {e}")))
}
