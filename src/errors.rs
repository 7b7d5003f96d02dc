error_chain! {
    errors {
        InvalidIdentityKey(reason: String) {
            description("invalid VAPID identity key")
            display("invalid VAPID identity key: {}", reason)
        }
        InvalidEndpoint(reason: String) {
            description("invalid subscription endpoint")
            display("invalid subscription endpoint: {}", reason)
        }
        InvalidSubscriberKey(reason: String) {
            description("invalid subscriber key material")
            display("invalid subscriber key material: {}", reason)
        }
        InvalidTtl(ttl: i64) {
            description("TTL exceeds the VAPID assertion lifetime")
            display("requested TTL {}s exceeds the 86400s assertion ceiling", ttl)
        }
        PayloadTooLarge(size: usize) {
            description("serialized payload exceeds the size ceiling")
            display("serialized payload is {} bytes, the ceiling is 4076", size)
        }
        DerivationFailure {
            description("key derivation failed")
        }
        EncryptionFailure {
            description("payload encryption failed")
        }
        SigningFailure {
            description("VAPID assertion signing failed")
        }
    }
}
