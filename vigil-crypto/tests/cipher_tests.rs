use vigil_crypto::{
    CryptoError, NONCE_SIZE, TAG_SIZE, checksum, decrypt, encrypt, generate_random_key,
    verify_checksum,
};

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = generate_random_key();
    let plaintext = b"Hello, World!";
    let parts = encrypt(&key, plaintext).unwrap();
    let decrypted = decrypt(&key, &parts).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn encrypt_decrypt_empty() {
    let key = generate_random_key();
    let parts = encrypt(&key, b"").unwrap();
    assert!(parts.ciphertext.is_empty());
    let decrypted = decrypt(&key, &parts).unwrap();
    assert_eq!(decrypted, b"");
}

#[test]
fn encrypt_decrypt_large_data() {
    let key = generate_random_key();
    let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();
    let parts = encrypt(&key, &plaintext).unwrap();
    let decrypted = decrypt(&key, &parts).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn parts_have_expected_sizes() {
    let key = generate_random_key();
    let parts = encrypt(&key, b"sized").unwrap();
    assert_eq!(parts.nonce.len(), NONCE_SIZE);
    assert_eq!(parts.tag.len(), TAG_SIZE);
    assert_eq!(parts.ciphertext.len(), 5);
}

#[test]
fn wrong_key_fails_decryption() {
    let key1 = generate_random_key();
    let key2 = generate_random_key();
    let parts = encrypt(&key1, b"Secret").unwrap();
    assert!(decrypt(&key2, &parts).is_err());
}

#[test]
fn tampered_ciphertext_fails_decryption() {
    let key = generate_random_key();
    let mut parts = encrypt(&key, b"Secret").unwrap();
    parts.ciphertext[0] ^= 0xFF;
    assert!(decrypt(&key, &parts).is_err());
}

#[test]
fn tampered_nonce_fails_decryption() {
    let key = generate_random_key();
    let mut parts = encrypt(&key, b"Secret").unwrap();
    parts.nonce[0] ^= 0xFF;
    assert!(decrypt(&key, &parts).is_err());
}

#[test]
fn tampered_tag_fails_decryption() {
    let key = generate_random_key();
    let mut parts = encrypt(&key, b"Secret").unwrap();
    parts.tag[TAG_SIZE - 1] ^= 0x01;
    assert!(decrypt(&key, &parts).is_err());
}

#[test]
fn same_plaintext_produces_different_ciphertext() {
    let key = generate_random_key();
    let p1 = encrypt(&key, b"Same").unwrap();
    let p2 = encrypt(&key, b"Same").unwrap();
    assert_ne!(p1.nonce, p2.nonce);
    assert_ne!(p1.ciphertext, p2.ciphertext);
}

// ── Checksum ─────────────────────────────────────────────────────

#[test]
fn checksum_is_hex_sha256() {
    let digest = checksum(b"abc");
    assert_eq!(digest.len(), 64);
    assert_eq!(
        digest,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn verify_checksum_accepts_matching() {
    let ciphertext = b"opaque bytes";
    assert!(verify_checksum(ciphertext, &checksum(ciphertext)).is_ok());
}

#[test]
fn verify_checksum_rejects_flipped_bit() {
    let mut ciphertext = b"opaque bytes".to_vec();
    let expected = checksum(&ciphertext);
    ciphertext[3] ^= 0x01;
    match verify_checksum(&ciphertext, &expected) {
        Err(CryptoError::ChecksumMismatch) => {}
        other => panic!("expected ChecksumMismatch, got {:?}", other),
    }
}
