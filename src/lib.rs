//! Builds the wire-ready components of a Web Push notification: the
//! destination endpoint, the header set (`Encryption`, `Crypto-Key`,
//! `Authorization`, ...), and the `aesgcm`-encrypted body. The caller hands
//! the resulting [`PushRequest`] to any HTTP client; this crate performs no
//! network I/O, stores nothing, and keeps no state between calls.
//!
//! One build runs Validator -> Key Derivation -> Framer/Cipher -> VAPID
//! Signer -> Assembler, consuming primitives through [`CryptoProvider`]
//! ([`RingCrypto`] being the stock implementation). Every call draws a fresh
//! salt, ephemeral key, and padding length, so retries must rebuild from
//! scratch rather than resend.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod crypto;
pub mod errors;
pub mod key_types;

mod derive;
mod payload;
mod request;
mod validate;
mod vapid;

pub use crate::crypto::{CryptoProvider, EphemeralKey, RingCrypto};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::key_types::{
    Subscription, SubscriptionKeys, Urgency, VapidKey, WebPushMessage,
};
pub use crate::payload::{DEFAULT_PAD_CLAMP, MAX_PAYLOAD_BYTES};
pub use crate::request::PushRequest;
pub use crate::validate::{DEFAULT_TTL_SECS, MAX_TTL_SECS};
pub use crate::vapid::Claims;

use crate::derive::SALT_LEN;
use crate::errors::ResultExt;

/// Builds one notification with the stock `ring`-backed provider.
pub fn build_push_request(
    identity: &VapidKey,
    subscription: &Subscription,
    message: &WebPushMessage,
) -> Result<PushRequest> {
    build_push_request_with(&RingCrypto, identity, subscription, message)
}

/// Builds one notification against an injected cryptographic provider.
pub fn build_push_request_with(
    crypto: &dyn CryptoProvider,
    identity: &VapidKey,
    subscription: &Subscription,
    message: &WebPushMessage,
) -> Result<PushRequest> {
    let normalized = validate::validate(identity, subscription, message)?;
    let payload_bytes = payload::serialize_payload(&message.payload)?;

    let mut salt = [0u8; SALT_LEN];
    crypto
        .fill_random(&mut salt)
        .chain_err(|| ErrorKind::DerivationFailure)?;
    let keys = derive::derive_content_keys(crypto, &normalized.subscriber, &salt)?;

    let framed = payload::frame_payload(crypto, &payload_bytes, DEFAULT_PAD_CLAMP)?;
    let body = payload::seal(crypto, &keys, &framed)?;

    let token = vapid::sign_assertion(
        crypto,
        &normalized.identity,
        &normalized.audience,
        &message.contact,
        normalized.ttl,
    )?;

    Ok(request::assemble(
        &normalized,
        &salt,
        &keys.ephemeral_point,
        &token,
        body,
    ))
}
