//! Final assembly: the header set and the request triple handed to the
//! caller's HTTP client.

use std::collections::BTreeMap;

use crate::crypto::b64url_encode;
use crate::derive::SALT_LEN;
use crate::validate::NormalizedRequest;

/// The wire-ready build output. `POST endpoint` with `headers` and `body`
/// delivers the notification; nothing here is mutated after construction.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

pub(crate) fn assemble(
    normalized: &NormalizedRequest,
    salt: &[u8; SALT_LEN],
    ephemeral_point: &[u8],
    token: &str,
    body: Vec<u8>,
) -> PushRequest {
    let mut headers = BTreeMap::new();
    headers.insert(
        "Content-Type".to_string(),
        "application/octet-stream".to_string(),
    );
    headers.insert("Content-Encoding".to_string(), "aesgcm".to_string());
    headers.insert("Content-Length".to_string(), body.len().to_string());
    headers.insert(
        "Encryption".to_string(),
        format!("salt={}", b64url_encode(salt)),
    );
    headers.insert(
        "Crypto-Key".to_string(),
        format!("dh={}", b64url_encode(ephemeral_point)),
    );
    headers.insert(
        "Authorization".to_string(),
        format!(
            "vapid t={}, k={}",
            token,
            normalized.identity.public_point_b64()
        ),
    );
    headers.insert("TTL".to_string(), normalized.ttl.to_string());
    if let Some(ref topic) = normalized.topic {
        headers.insert("Topic".to_string(), topic.clone());
    }
    if let Some(urgency) = normalized.urgency {
        headers.insert("Urgency".to_string(), urgency.as_str().to_string());
    }

    PushRequest {
        endpoint: normalized.endpoint.clone(),
        headers,
        body,
    }
}
