//! VAPID assertion: an ES256 JWT binding the sender's identity key to the
//! push-service origin.

use chrono::Utc;

use crate::crypto::{b64url_encode, CryptoProvider};
use crate::errors::*;
use crate::key_types::VapidKeyMaterial;

#[derive(Serialize)]
struct Header {
    typ: &'static str,
    alg: &'static str,
}

/// Assertion claims. The pipeline only serializes this; it is public so
/// callers can decode and inspect a token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    /// Push-service origin the token is valid for.
    pub aud: String,
    /// Unix expiry, at most 24 hours out.
    pub exp: i64,
    /// Administrator contact URI.
    pub sub: String,
}

pub(crate) fn sign_assertion(
    crypto: &dyn CryptoProvider,
    identity: &VapidKeyMaterial,
    audience: &str,
    contact: &str,
    ttl: i64,
) -> Result<String> {
    let claims = Claims {
        aud: audience.to_string(),
        exp: Utc::now().timestamp() + ttl,
        sub: contact.to_string(),
    };
    sign_claims(crypto, identity, &claims)
}

fn sign_claims(
    crypto: &dyn CryptoProvider,
    identity: &VapidKeyMaterial,
    claims: &Claims,
) -> Result<String> {
    let header = Header {
        typ: "JWT",
        alg: "ES256",
    };
    let header_b64 =
        b64url_encode(&serde_json::to_vec(&header).chain_err(|| ErrorKind::SigningFailure)?);
    let claims_b64 =
        b64url_encode(&serde_json::to_vec(claims).chain_err(|| ErrorKind::SigningFailure)?);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let signature = crypto
        .ecdsa_p256_sign(
            &identity.private_scalar,
            &identity.public_point,
            signing_input.as_bytes(),
        )
        .chain_err(|| ErrorKind::SigningFailure)?;

    Ok(format!("{}.{}", signing_input, b64url_encode(&signature)))
}
