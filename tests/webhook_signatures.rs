use hmac::{Hmac, Mac};
use learnpay::crypto::{lookup_hash, SecretCipher};
use learnpay::domain::error::PaymentError;
use learnpay::providers::verify_signature;
use sha2::Sha256;

fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[test]
fn valid_signature_passes() {
    let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
    let header = sign("whsec_test", "1724400000", payload);
    assert!(verify_signature("whsec_test", payload, &header).is_ok());
}

#[test]
fn tampered_payload_is_rejected() {
    let payload = br#"{"id":"evt_1","amount":100}"#;
    let header = sign("whsec_test", "1724400000", payload);
    let tampered = br#"{"id":"evt_1","amount":999}"#;
    assert!(matches!(
        verify_signature("whsec_test", tampered, &header),
        Err(PaymentError::SignatureInvalid)
    ));
}

#[test]
fn wrong_secret_is_rejected() {
    let payload = b"{}";
    let header = sign("whsec_other", "1724400000", payload);
    assert!(matches!(
        verify_signature("whsec_test", payload, &header),
        Err(PaymentError::SignatureInvalid)
    ));
}

#[test]
fn malformed_headers_are_rejected() {
    for header in ["", "t=123", "v1=deadbeef", "t=123,v1=zz-not-hex"] {
        assert!(matches!(
            verify_signature("whsec_test", b"{}", header),
            Err(PaymentError::SignatureInvalid)
        ));
    }
}

#[test]
fn refund_details_round_trip() {
    let cipher = SecretCipher::from_bytes([7u8; 32]);
    let plaintext = br#"{"provider_refund_id":"re_abc"}"#;

    let sealed = cipher.encrypt(plaintext).unwrap();
    assert_ne!(&sealed[12..], plaintext.as_slice());
    assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);

    // Nonces are fresh per encryption.
    let sealed_again = cipher.encrypt(plaintext).unwrap();
    assert_ne!(sealed, sealed_again);
}

#[test]
fn wrong_key_cannot_decrypt() {
    let cipher = SecretCipher::from_bytes([7u8; 32]);
    let other = SecretCipher::from_bytes([8u8; 32]);
    let sealed = cipher.encrypt(b"secret").unwrap();
    assert!(other.decrypt(&sealed).is_err());
}

#[test]
fn lookup_hash_is_deterministic_and_opaque() {
    let a = lookup_hash("re_abc");
    let b = lookup_hash("re_abc");
    let c = lookup_hash("re_abd");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
    assert!(!a.contains("re_abc"));
}
