//! Fail-fast input validation, ahead of any cryptographic work.

use url::Url;

use crate::crypto::{b64_decode_lenient, POINT_LEN, SCALAR_LEN};
use crate::errors::*;
use crate::key_types::{
    SubscriberKeys, Subscription, SubscriptionKeys, Urgency, VapidKey, VapidKeyMaterial,
    WebPushMessage, AUTH_SECRET_LEN,
};

/// Maximum VAPID assertion lifetime (24 hours).
pub const MAX_TTL_SECS: i64 = 86_400;
/// Applied when the message leaves the TTL unset or non-positive.
pub const DEFAULT_TTL_SECS: i64 = MAX_TTL_SECS;

/// Everything the later pipeline stages need, decoded and bounds-checked.
pub struct NormalizedRequest {
    pub(crate) identity: VapidKeyMaterial,
    pub(crate) subscriber: SubscriberKeys,
    pub(crate) endpoint: String,
    /// Push-service origin, the assertion's `aud` claim.
    pub(crate) audience: String,
    pub(crate) ttl: i64,
    pub(crate) topic: Option<String>,
    pub(crate) urgency: Option<Urgency>,
}

pub fn validate(
    identity: &VapidKey,
    subscription: &Subscription,
    message: &WebPushMessage,
) -> Result<NormalizedRequest> {
    let identity = check_identity(identity)?;
    let (endpoint, audience) = check_endpoint(&subscription.endpoint)?;
    let subscriber = check_subscriber_keys(&subscription.keys)?;
    let ttl = resolve_ttl(message.ttl)?;

    Ok(NormalizedRequest {
        identity,
        subscriber,
        endpoint,
        audience,
        ttl,
        topic: message.topic.clone(),
        urgency: message.urgency,
    })
}

fn check_identity(key: &VapidKey) -> Result<VapidKeyMaterial> {
    if key.kty != "EC" {
        bail!(ErrorKind::InvalidIdentityKey(format!(
            "key type is {:?}, expected \"EC\"",
            key.kty
        )));
    }
    if key.crv != "P-256" {
        bail!(ErrorKind::InvalidIdentityKey(format!(
            "curve is {:?}, expected \"P-256\"",
            key.crv
        )));
    }

    let x = coordinate(&key.x, "x")?;
    let y = coordinate(&key.y, "y")?;
    let d = coordinate(&key.d, "d")?;

    let mut public_point = [0u8; POINT_LEN];
    public_point[0] = 0x04;
    public_point[1..1 + SCALAR_LEN].copy_from_slice(&x);
    public_point[1 + SCALAR_LEN..].copy_from_slice(&y);

    Ok(VapidKeyMaterial {
        public_point,
        private_scalar: d,
    })
}

fn coordinate(value: &Option<String>, name: &str) -> Result<[u8; SCALAR_LEN]> {
    let encoded = value
        .as_ref()
        .ok_or_else(|| ErrorKind::InvalidIdentityKey(format!("missing {} coordinate", name)))?;
    let bytes = b64_decode_lenient(encoded).chain_err(|| {
        ErrorKind::InvalidIdentityKey(format!("{} coordinate is not valid base64", name))
    })?;
    if bytes.len() != SCALAR_LEN {
        bail!(ErrorKind::InvalidIdentityKey(format!(
            "{} coordinate is {} bytes, expected {}",
            name,
            bytes.len(),
            SCALAR_LEN
        )));
    }
    let mut out = [0u8; SCALAR_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn check_endpoint(endpoint: &str) -> Result<(String, String)> {
    let url = Url::parse(endpoint)
        .chain_err(|| ErrorKind::InvalidEndpoint(format!("unparseable URL {:?}", endpoint)))?;
    if url.scheme() != "https" {
        bail!(ErrorKind::InvalidEndpoint(format!(
            "scheme is {:?}, push endpoints are HTTPS-only",
            url.scheme()
        )));
    }
    Ok((endpoint.to_string(), url.origin().ascii_serialization()))
}

fn check_subscriber_keys(keys: &SubscriptionKeys) -> Result<SubscriberKeys> {
    let point = b64_decode_lenient(&keys.p256dh)
        .chain_err(|| ErrorKind::InvalidSubscriberKey("p256dh is not valid base64".into()))?;
    if point.len() != POINT_LEN {
        bail!(ErrorKind::InvalidSubscriberKey(format!(
            "p256dh is {} bytes, expected {}",
            point.len(),
            POINT_LEN
        )));
    }
    if point[0] != 0x04 {
        bail!(ErrorKind::InvalidSubscriberKey(
            "p256dh is not an uncompressed point (leading byte is not 0x04)".into()
        ));
    }

    let auth = b64_decode_lenient(&keys.auth)
        .chain_err(|| ErrorKind::InvalidSubscriberKey("auth is not valid base64".into()))?;
    if auth.len() != AUTH_SECRET_LEN {
        bail!(ErrorKind::InvalidSubscriberKey(format!(
            "auth secret is {} bytes, expected {}",
            auth.len(),
            AUTH_SECRET_LEN
        )));
    }

    let mut public_point = [0u8; POINT_LEN];
    public_point.copy_from_slice(&point);
    let mut auth_secret = [0u8; AUTH_SECRET_LEN];
    auth_secret.copy_from_slice(&auth);

    Ok(SubscriberKeys {
        public_point,
        auth_secret,
    })
}

fn resolve_ttl(requested: Option<i64>) -> Result<i64> {
    match requested {
        Some(ttl) if ttl > MAX_TTL_SECS => bail!(ErrorKind::InvalidTtl(ttl)),
        Some(ttl) if ttl > 0 => Ok(ttl),
        // Absent and non-positive requests fall back to the maximum lifetime.
        _ => Ok(DEFAULT_TTL_SECS),
    }
}
