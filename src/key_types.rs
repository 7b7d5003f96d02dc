//! Caller-facing key material and message types.

use crate::crypto::{b64url_encode, POINT_LEN, SCALAR_LEN};
use crate::errors::*;

/// Auth secret length mandated by the push encryption scheme.
pub const AUTH_SECRET_LEN: usize = 16;

/// The sender's long-term VAPID identity key, in its JWK shape.
///
/// All coordinates are base64url-encoded 32-byte values. The public pair
/// (`x`, `y`) becomes the `Authorization` header's `k=` parameter; the
/// private scalar `d` signs the VAPID assertion.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VapidKey {
    pub kty: String,
    pub crv: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl VapidKey {
    /// Parses the serialized JWK form.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .chain_err(|| ErrorKind::InvalidIdentityKey("unparseable JWK".into()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).chain_err(|| "failed to serialize JWK")
    }
}

/// A push subscription as the browser serializes it:
/// `{"endpoint": ..., "keys": {"p256dh": ..., "auth": ...}}`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Subscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SubscriptionKeys {
    /// Subscriber public key: base64url, 65-byte uncompressed P-256 point.
    pub p256dh: String,
    /// Subscriber auth secret: base64url, 16 bytes.
    pub auth: String,
}

impl Subscription {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .chain_err(|| ErrorKind::InvalidSubscriberKey("unparseable subscription".into()))
    }
}

/// Delivery urgency values defined by the push protocol.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    VeryLow,
    Low,
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::VeryLow => "very-low",
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
        }
    }
}

/// One notification to deliver.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WebPushMessage {
    /// Arbitrary JSON payload; its serialized form becomes the plaintext.
    pub payload: serde_json::Value,
    /// Administrator contact URI (e.g. `mailto:ops@example.com`); becomes
    /// the assertion's `sub` claim.
    pub contact: String,
    /// Seconds the push service may hold the message, capped at 86400.
    /// Absent or non-positive resolves to 86400.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

/// Decoded identity key material, produced by validation.
#[derive(Clone)]
pub struct VapidKeyMaterial {
    pub(crate) public_point: [u8; POINT_LEN],
    pub(crate) private_scalar: [u8; SCALAR_LEN],
}

impl VapidKeyMaterial {
    /// The uncompressed public point as unpadded base64url, as carried in
    /// the `Authorization` header's `k=` parameter.
    pub fn public_point_b64(&self) -> String {
        b64url_encode(&self.public_point)
    }
}

/// Decoded subscriber key material, produced by validation.
#[derive(Clone)]
pub struct SubscriberKeys {
    pub(crate) public_point: [u8; POINT_LEN],
    pub(crate) auth_secret: [u8; AUTH_SECRET_LEN],
}
