//! Credential redaction applied by producers before serialization.
//!
//! Envelopes routinely capture request headers and client payloads into
//! `metadata`; anything credential-bearing must be replaced with a fixed
//! marker before the event leaves the process. Redaction walks structured
//! metadata recursively. Raw string metadata is opaque and passes through
//! untouched; producers that capture headers do so structurally.

use serde_json::Value as JsonValue;

use crate::defaults::REDACTION_MARKER;
use crate::envelope::{LogEnvelope, Metadata};

/// Key names whose values are redacted, in normalized form (lower-case,
/// hyphens folded to underscores).
const SENSITIVE_KEYS: &[&str] = &[
    "authorization",
    "proxy_authorization",
    "cookie",
    "set_cookie",
    "x_api_key",
    "api_key",
    "apikey",
    "access_token",
    "refresh_token",
    "token",
    "secret",
    "client_secret",
    "password",
    "private_key",
];

/// Whether a metadata key names a credential-bearing field.
/// Matching is case-insensitive and treats hyphens and underscores alike.
pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_lowercase().replace('-', "_");
    SENSITIVE_KEYS.contains(&normalized.as_str())
}

/// Replace credential-bearing values in a JSON tree with the redaction
/// marker, recursing through objects and arrays. The whole value under a
/// sensitive key is replaced, whatever its shape.
pub fn redact_value(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *entry = JsonValue::String(REDACTION_MARKER.to_string());
                } else {
                    redact_value(entry);
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                redact_value(item);
            }
        }
        _ => {}
    }
}

/// Redact an envelope's structured metadata in place.
pub fn redact_envelope(envelope: &mut LogEnvelope) {
    if let Some(Metadata::Structured(value)) = envelope.metadata.as_mut() {
        redact_value(value);
    }
}
