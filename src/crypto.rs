//! The cryptographic provider seam and its `ring`-backed implementation.
//!
//! The build pipeline consumes primitives (ECDH, HKDF, AES-GCM, ECDSA,
//! secure random) exclusively through [`CryptoProvider`]; it never touches
//! curve or cipher arithmetic itself.

use std::ops::Deref;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::rand::SecureRandom;
use ring::{aead, agreement, hkdf, signature};

use crate::errors::*;

/// Uncompressed P-256 point length (`0x04 || x || y`).
pub const POINT_LEN: usize = 65;
/// Raw P-256 scalar / coordinate length.
pub const SCALAR_LEN: usize = 32;

lazy_static! {
    static ref RANDOM: ring::rand::SystemRandom = {
        let r = ring::rand::SystemRandom::new();
        // Warm up the random number generator
        r.fill(&mut [0u8; 4096]).expect("failed to initialize random");
        r
    };
}

pub fn b64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decodes caller-supplied base64. Push clients emit unpadded base64url, but
/// padded and standard-alphabet encodings show up in the wild.
pub fn b64_decode_lenient(input: &str) -> ::std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .or_else(|_| STANDARD.decode(input))
}

/// One-shot per-message ECDH key. `agree` consumes the key, so it can never
/// serve a second agreement.
pub trait EphemeralKey {
    /// Uncompressed public point, `0x04 || x || y`.
    fn public_point(&self) -> &[u8];

    /// Raw ECDH shared secret against the peer's uncompressed public point.
    fn agree(self: Box<Self>, peer_point: &[u8]) -> Result<Vec<u8>>;
}

/// Primitive operations the build pipeline consumes.
pub trait CryptoProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;

    fn generate_ephemeral_key(&self) -> Result<Box<dyn EphemeralKey>>;

    /// HKDF-SHA256, extract-then-expand. The `info` parts are concatenated.
    fn hkdf_sha256(&self, salt: &[u8], ikm: &[u8], info: &[&[u8]], out: &mut [u8]) -> Result<()>;

    /// AES-128-GCM seal; the 16-byte tag is appended to the returned bytes.
    fn aes128gcm_encrypt(&self, key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// ECDSA P-256 / SHA-256 over `message`, in the fixed-width 64-byte
    /// `r || s` form.
    fn ecdsa_p256_sign(
        &self,
        private_scalar: &[u8],
        public_point: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>>;
}

/// The stock provider, backed by `ring` and the process-wide `SystemRandom`.
pub struct RingCrypto;

struct RingEphemeralKey {
    private: agreement::EphemeralPrivateKey,
    public: agreement::PublicKey,
}

impl EphemeralKey for RingEphemeralKey {
    fn public_point(&self) -> &[u8] {
        self.public.as_ref()
    }

    fn agree(self: Box<Self>, peer_point: &[u8]) -> Result<Vec<u8>> {
        let peer = agreement::UnparsedPublicKey::new(&agreement::ECDH_P256, peer_point);
        agreement::agree_ephemeral(self.private, &peer, |secret| secret.to_vec())
            .chain_err(|| "ECDH agreement rejected the subscriber key")
    }
}

struct OkmLen(usize);

impl hkdf::KeyType for OkmLen {
    fn len(&self) -> usize {
        self.0
    }
}

impl CryptoProvider for RingCrypto {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        RANDOM
            .deref()
            .fill(dest)
            .chain_err(|| "failed to draw random bytes")
    }

    fn generate_ephemeral_key(&self) -> Result<Box<dyn EphemeralKey>> {
        let private =
            agreement::EphemeralPrivateKey::generate(&agreement::ECDH_P256, RANDOM.deref())
                .chain_err(|| "failed to generate an ephemeral key")?;
        let public = private
            .compute_public_key()
            .chain_err(|| "failed to compute the ephemeral public key")?;
        Ok(Box::new(RingEphemeralKey { private, public }))
    }

    fn hkdf_sha256(&self, salt: &[u8], ikm: &[u8], info: &[&[u8]], out: &mut [u8]) -> Result<()> {
        let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, salt).extract(ikm);
        let okm = prk
            .expand(info, OkmLen(out.len()))
            .chain_err(|| "HKDF expand rejected the requested length")?;
        okm.fill(out).chain_err(|| "HKDF output length mismatch")
    }

    fn aes128gcm_encrypt(&self, key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let unbound = aead::UnboundKey::new(&aead::AES_128_GCM, key)
            .chain_err(|| "content-encryption key rejected")?;
        let sealing = aead::LessSafeKey::new(unbound);
        let nonce =
            aead::Nonce::try_assume_unique_for_key(nonce).chain_err(|| "derived nonce rejected")?;
        let mut in_out = plaintext.to_vec();
        sealing
            .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
            .chain_err(|| "AES-GCM seal failed")?;
        Ok(in_out)
    }

    fn ecdsa_p256_sign(
        &self,
        private_scalar: &[u8],
        public_point: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>> {
        let key_pair = signature::EcdsaKeyPair::from_private_key_and_public_key(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            private_scalar,
            public_point,
            RANDOM.deref(),
        )
        .chain_err(|| "identity key rejected")?;
        let sig = key_pair
            .sign(RANDOM.deref(), message)
            .chain_err(|| "ECDSA signing failed")?;
        Ok(sig.as_ref().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b64url_is_unpadded() {
        assert_eq!(b64url_encode(&[0xff, 0xef]), "_-8");
    }

    #[test]
    fn lenient_decode_accepts_all_three_alphabets() {
        let expected = vec![0xff, 0xef];
        assert_eq!(b64_decode_lenient("_-8").unwrap(), expected);
        assert_eq!(b64_decode_lenient("_-8=").unwrap(), expected);
        assert_eq!(b64_decode_lenient("/+8=").unwrap(), expected);
    }

    #[test]
    fn fill_random_fills() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        RingCrypto.fill_random(&mut a).unwrap();
        RingCrypto.fill_random(&mut b).unwrap();
        // 2^-256 false-failure odds
        assert_ne!(a, b);
    }

    #[test]
    fn ephemeral_keys_are_uncompressed_points() {
        let key = RingCrypto.generate_ephemeral_key().unwrap();
        assert_eq!(key.public_point().len(), POINT_LEN);
        assert_eq!(key.public_point()[0], 0x04);
    }

    #[test]
    fn hkdf_matches_rfc5869_case_1() {
        // RFC 5869 A.1 test vector
        let ikm = [0x0b; 22];
        let salt: Vec<u8> = (0x00..=0x0c).collect();
        let info: Vec<u8> = (0xf0..=0xf9).collect();
        let mut okm = [0u8; 42];
        RingCrypto
            .hkdf_sha256(&salt, &ikm, &[&info], &mut okm)
            .unwrap();
        let expected = [
            0x3c, 0xb2, 0x5f, 0x25, 0xfa, 0xac, 0xd5, 0x7a, 0x90, 0x43, 0x4f, 0x64, 0xd0, 0x36,
            0x2f, 0x2a, 0x2d, 0x2d, 0x0a, 0x90, 0xcf, 0x1a, 0x5a, 0x4c, 0x5d, 0xb0, 0x2d, 0x56,
            0xec, 0xc4, 0xc5, 0xbf, 0x34, 0x00, 0x72, 0x08, 0xd5, 0xb8, 0x87, 0x18, 0x58, 0x65,
        ];
        assert_eq!(okm, expected);
    }

    #[test]
    fn gcm_output_carries_the_tag() {
        let sealed = RingCrypto
            .aes128gcm_encrypt(&[0u8; 16], &[0u8; 12], b"abc")
            .unwrap();
        assert_eq!(sealed.len(), 3 + 16);
    }
}
