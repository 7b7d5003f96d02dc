//! Payload framing and content encryption.
//!
//! The framed plaintext is `len16(padding) || padding || payload`, capped at
//! 4078 bytes, sealed with AES-128-GCM under the derived keys.

use crate::crypto::CryptoProvider;
use crate::derive::DerivedKeys;
use crate::errors::*;

/// Hard cap on the framed plaintext (prefix + padding + payload).
const FRAMED_CAP: usize = 4078;
const PAD_PREFIX_BYTES: usize = 2;

/// Largest serialized payload the scheme accepts, even with zero padding.
pub const MAX_PAYLOAD_BYTES: usize = FRAMED_CAP - PAD_PREFIX_BYTES;

/// Default clamp on the random padding length.
pub const DEFAULT_PAD_CLAMP: usize = 100;

pub(crate) fn serialize_payload(payload: &serde_json::Value) -> Result<Vec<u8>> {
    serde_json::to_vec(payload).chain_err(|| "failed to serialize the payload")
}

/// Frames `payload` behind a random amount of padding, drawn uniformly from
/// `[0, min(pad_clamp, budget)]`. The padding hides the plaintext length
/// from anyone watching ciphertext sizes.
pub(crate) fn frame_payload(
    crypto: &dyn CryptoProvider,
    payload: &[u8],
    pad_clamp: usize,
) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        bail!(ErrorKind::PayloadTooLarge(payload.len()));
    }
    let budget = MAX_PAYLOAD_BYTES - payload.len();
    let pad_len = random_pad_len(crypto, budget.min(pad_clamp))?;

    let mut framed = Vec::with_capacity(PAD_PREFIX_BYTES + pad_len + payload.len());
    framed.extend_from_slice(&(pad_len as u16).to_be_bytes());
    let mut padding = vec![0u8; pad_len];
    crypto
        .fill_random(&mut padding)
        .chain_err(|| ErrorKind::EncryptionFailure)?;
    framed.extend_from_slice(&padding);
    framed.extend_from_slice(payload);
    Ok(framed)
}

pub(crate) fn seal(
    crypto: &dyn CryptoProvider,
    keys: &DerivedKeys,
    framed: &[u8],
) -> Result<Vec<u8>> {
    crypto
        .aes128gcm_encrypt(&keys.cek, &keys.nonce, framed)
        .chain_err(|| ErrorKind::EncryptionFailure)
}

/// Uniform draw from `[0, max]`. Rejection sampling; a bare modulo would
/// skew the low end of the distribution.
fn random_pad_len(crypto: &dyn CryptoProvider, max: usize) -> Result<usize> {
    if max == 0 {
        return Ok(0);
    }
    let bound = max as u32 + 1;
    let limit = (u32::from(u16::MAX) + 1) / bound * bound;
    loop {
        let mut draw = [0u8; 2];
        crypto
            .fill_random(&mut draw)
            .chain_err(|| ErrorKind::EncryptionFailure)?;
        let value = u32::from(u16::from_be_bytes(draw));
        if value < limit {
            return Ok((value % bound) as usize);
        }
    }
}
