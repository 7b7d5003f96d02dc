//! Per-message key derivation: ECDH shared secret, HKDF pseudo-random key,
//! then the content-encryption key and nonce, in the `aesgcm` scheme's
//! exact order.

use std::convert::TryInto;

use crate::crypto::{CryptoProvider, POINT_LEN};
use crate::errors::*;
use crate::key_types::SubscriberKeys;

/// Per-message salt length.
pub const SALT_LEN: usize = 16;

const AUTH_INFO: &[u8] = b"Content-Encoding: auth\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aesgcm\0";
const CONTEXT_CURVE: &[u8] = b"P-256\0";

/// Keys for exactly one message. Stays inside the pipeline; only the
/// ephemeral public point ever reaches the wire.
#[derive(Debug)]
pub(crate) struct DerivedKeys {
    pub(crate) cek: [u8; 16],
    pub(crate) nonce: [u8; 12],
    pub(crate) ephemeral_point: [u8; POINT_LEN],
}

pub(crate) fn derive_content_keys(
    crypto: &dyn CryptoProvider,
    subscriber: &SubscriberKeys,
    salt: &[u8; SALT_LEN],
) -> Result<DerivedKeys> {
    let ephemeral = crypto
        .generate_ephemeral_key()
        .chain_err(|| ErrorKind::DerivationFailure)?;
    let ephemeral_point: [u8; POINT_LEN] = ephemeral
        .public_point()
        .try_into()
        .chain_err(|| ErrorKind::DerivationFailure)?;

    let shared_secret = ephemeral
        .agree(&subscriber.public_point)
        .chain_err(|| ErrorKind::DerivationFailure)?;

    let mut prk = [0u8; 32];
    crypto
        .hkdf_sha256(&subscriber.auth_secret, &shared_secret, &[AUTH_INFO], &mut prk)
        .chain_err(|| ErrorKind::DerivationFailure)?;

    let context = key_context(&subscriber.public_point, &ephemeral_point);

    let mut nonce = [0u8; 12];
    crypto
        .hkdf_sha256(salt, &prk, &[NONCE_INFO, &context], &mut nonce)
        .chain_err(|| ErrorKind::DerivationFailure)?;

    let mut cek = [0u8; 16];
    crypto
        .hkdf_sha256(salt, &prk, &[CEK_INFO, &context], &mut cek)
        .chain_err(|| ErrorKind::DerivationFailure)?;

    Ok(DerivedKeys {
        cek,
        nonce,
        ephemeral_point,
    })
}

/// Key-agreement context: the curve label, then each public point behind a
/// 2-byte big-endian length.
fn key_context(subscriber_point: &[u8; POINT_LEN], ephemeral_point: &[u8; POINT_LEN]) -> Vec<u8> {
    let mut context = Vec::with_capacity(CONTEXT_CURVE.len() + 2 * (2 + POINT_LEN));
    context.extend_from_slice(CONTEXT_CURVE);
    context.extend_from_slice(&(POINT_LEN as u16).to_be_bytes());
    context.extend_from_slice(subscriber_point);
    context.extend_from_slice(&(POINT_LEN as u16).to_be_bytes());
    context.extend_from_slice(ephemeral_point);
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{EphemeralKey, RingCrypto};
    use crate::key_types::AUTH_SECRET_LEN;

    // Subscriber key: d = SHA-256("pushwire subscriber test key") mod n.
    const SUB_POINT: [u8; POINT_LEN] = [
        0x04, 0x52, 0x25, 0x21, 0xa8, 0x04, 0x3f, 0x1c, 0x06, 0x22, 0x33, 0x6d, 0x36, 0xee, 0x36,
        0xf2, 0xd3, 0xf6, 0x7a, 0xa5, 0xdc, 0xc6, 0x20, 0x20, 0x78, 0x08, 0x9e, 0x4b, 0xde, 0xe2,
        0xa7, 0x2a, 0x43, 0x79, 0x4a, 0x51, 0x8f, 0x15, 0xbb, 0x21, 0x80, 0x74, 0x84, 0x53, 0x55,
        0x45, 0xb8, 0x03, 0x5e, 0xd7, 0x31, 0xb0, 0x0d, 0xb0, 0xc1, 0x61, 0x22, 0xe3, 0xe1, 0x8f,
        0xef, 0x23, 0xf6, 0x16, 0xa4,
    ];

    // Ephemeral key: d = SHA-256("pushwire ephemeral test key") mod n.
    const EPH_POINT: [u8; POINT_LEN] = [
        0x04, 0x7c, 0xda, 0xb9, 0x7d, 0x16, 0x6c, 0x9d, 0xf4, 0x90, 0x62, 0x7e, 0x24, 0x36, 0xca,
        0x68, 0x36, 0x54, 0xcb, 0xd0, 0x87, 0xdb, 0xa2, 0xdf, 0xa7, 0x94, 0x41, 0x9d, 0x46, 0xf6,
        0xe3, 0xdf, 0xa5, 0x3c, 0xa9, 0xa7, 0x5e, 0x2e, 0xa6, 0x7b, 0x45, 0x53, 0x93, 0xeb, 0x30,
        0xbf, 0x8e, 0xb6, 0xc6, 0xf4, 0x96, 0x8d, 0x6c, 0x36, 0xaf, 0x74, 0xf2, 0xe4, 0x56, 0x5c,
        0xb3, 0xc2, 0x3d, 0x73, 0xe4,
    ];

    // x-coordinate of d_eph * Q_sub, computed offline.
    const SHARED_SECRET: [u8; 32] = [
        0x9a, 0x72, 0x35, 0xfd, 0x60, 0x7c, 0xf8, 0x7a, 0x30, 0x49, 0x19, 0xf5, 0x12, 0x54, 0xdf,
        0xd7, 0x54, 0x87, 0xe6, 0xe9, 0xe4, 0x94, 0x10, 0x08, 0xba, 0xce, 0x5a, 0x69, 0x61, 0x56,
        0x8a, 0xd7,
    ];

    const EXPECTED_NONCE: [u8; 12] = [
        0x11, 0xe0, 0x23, 0x5d, 0xb0, 0x1b, 0x20, 0x39, 0xd4, 0x5f, 0xbe, 0xa1,
    ];

    const EXPECTED_CEK: [u8; 16] = [
        0x60, 0xd8, 0x38, 0xa2, 0x9c, 0x95, 0x99, 0x2e, 0x48, 0xb9, 0x6e, 0x4e, 0xe4, 0x08, 0x1f,
        0x60,
    ];

    fn subscriber() -> SubscriberKeys {
        let mut auth_secret = [0u8; AUTH_SECRET_LEN];
        for (i, b) in auth_secret.iter_mut().enumerate() {
            *b = 0x10 + i as u8;
        }
        SubscriberKeys {
            public_point: SUB_POINT,
            auth_secret,
        }
    }

    fn salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        for (i, b) in salt.iter_mut().enumerate() {
            *b = i as u8;
        }
        salt
    }

    /// Fixed ephemeral key with an offline-computed agreement, so the HKDF
    /// chain below it is fully deterministic.
    struct ScriptedEphemeral;

    impl EphemeralKey for ScriptedEphemeral {
        fn public_point(&self) -> &[u8] {
            &EPH_POINT
        }

        fn agree(self: Box<Self>, peer_point: &[u8]) -> Result<Vec<u8>> {
            assert_eq!(peer_point, &SUB_POINT[..]);
            Ok(SHARED_SECRET.to_vec())
        }
    }

    struct ScriptedProvider;

    impl CryptoProvider for ScriptedProvider {
        fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
            RingCrypto.fill_random(dest)
        }

        fn generate_ephemeral_key(&self) -> Result<Box<dyn EphemeralKey>> {
            Ok(Box::new(ScriptedEphemeral))
        }

        fn hkdf_sha256(
            &self,
            salt: &[u8],
            ikm: &[u8],
            info: &[&[u8]],
            out: &mut [u8],
        ) -> Result<()> {
            RingCrypto.hkdf_sha256(salt, ikm, info, out)
        }

        fn aes128gcm_encrypt(&self, key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
            RingCrypto.aes128gcm_encrypt(key, nonce, plaintext)
        }

        fn ecdsa_p256_sign(
            &self,
            private_scalar: &[u8],
            public_point: &[u8],
            message: &[u8],
        ) -> Result<Vec<u8>> {
            RingCrypto.ecdsa_p256_sign(private_scalar, public_point, message)
        }
    }

    #[test]
    fn derivation_matches_offline_vectors() {
        let keys = derive_content_keys(&ScriptedProvider, &subscriber(), &salt()).unwrap();
        assert_eq!(keys.ephemeral_point, EPH_POINT);
        assert_eq!(keys.nonce, EXPECTED_NONCE);
        assert_eq!(keys.cek, EXPECTED_CEK);
    }

    #[test]
    fn context_is_curve_label_then_length_prefixed_points() {
        let context = key_context(&SUB_POINT, &EPH_POINT);
        assert_eq!(context.len(), 6 + 2 + 65 + 2 + 65);
        assert_eq!(&context[..6], b"P-256\0");
        assert_eq!(&context[6..8], &[0x00, 0x41]);
        assert_eq!(&context[8..73], &SUB_POINT[..]);
        assert_eq!(&context[73..75], &[0x00, 0x41]);
        assert_eq!(&context[75..], &EPH_POINT[..]);
    }

    #[test]
    fn ring_agreement_accepts_the_subscriber_point() {
        let keys = derive_content_keys(&RingCrypto, &subscriber(), &salt()).unwrap();
        assert_eq!(keys.ephemeral_point[0], 0x04);
    }

    #[test]
    fn fresh_ephemeral_keys_give_fresh_content_keys() {
        let a = derive_content_keys(&RingCrypto, &subscriber(), &salt()).unwrap();
        let b = derive_content_keys(&RingCrypto, &subscriber(), &salt()).unwrap();
        assert_ne!(a.ephemeral_point[..], b.ephemeral_point[..]);
        assert_ne!(a.cek, b.cek);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn invalid_subscriber_point_surfaces_as_derivation_failure() {
        let mut bad = subscriber();
        // Not a point on the curve
        bad.public_point = [0xaa; POINT_LEN];
        bad.public_point[0] = 0x04;
        let err = derive_content_keys(&RingCrypto, &bad, &salt()).unwrap_err();
        match err.kind() {
            ErrorKind::DerivationFailure => {}
            other => panic!("wrong error kind: {:?}", other),
        }
    }
}
