// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ shared-secret body obfuscation (MD5 pad, RFC 8907 section 4.5).
//!
//! The body is XORed with a pad built from chained MD5 digests:
//! `MD5_1 = MD5{session_id, key, version, seq_no}`,
//! `MD5_n = MD5{session_id, key, version, seq_no, MD5_n-1}`,
//! concatenated and truncated to the body length. This is obfuscation, not
//! encryption.

use crate::error::ProtoError;
use crate::packet::Packet;
#[cfg(feature = "legacy-md5")]
use openssl::hash::{Hasher, MessageDigest};

pub const MD5_LEN: usize = 16;

/// Builds exactly `length` bytes of pseudo-pad.
#[cfg(feature = "legacy-md5")]
pub fn pseudo_pad(
    secret: &[u8],
    session_id: u32,
    version: u8,
    seq_no: u8,
    length: usize,
) -> Result<Vec<u8>, ProtoError> {
    let crypt_err = |e: openssl::error::ErrorStack| ProtoError::Crypt(e.to_string());
    let session_id = session_id.to_be_bytes();
    let mut pad: Vec<u8> = Vec::with_capacity(length + MD5_LEN);
    let mut hasher = Hasher::new(MessageDigest::md5()).map_err(crypt_err)?;
    let mut prev: Option<[u8; MD5_LEN]> = None;

    while pad.len() < length {
        hasher.update(&session_id).map_err(crypt_err)?;
        hasher.update(secret).map_err(crypt_err)?;
        hasher.update(&[version, seq_no]).map_err(crypt_err)?;
        if let Some(prev_pad) = prev.as_ref() {
            hasher.update(prev_pad).map_err(crypt_err)?;
        }
        let digest = hasher.finish().map_err(crypt_err)?;
        let digest: [u8; MD5_LEN] = digest
            .as_ref()
            .try_into()
            .map_err(|_| ProtoError::Crypt("unexpected MD5 length".into()))?;
        pad.extend_from_slice(&digest);
        prev = Some(digest);
    }

    pad.truncate(length);
    Ok(pad)
}

#[cfg(not(feature = "legacy-md5"))]
pub fn pseudo_pad(
    _secret: &[u8],
    _session_id: u32,
    _version: u8,
    _seq_no: u8,
    _length: usize,
) -> Result<Vec<u8>, ProtoError> {
    Err(ProtoError::Crypt(
        "legacy TACACS+ obfuscation is disabled (legacy-md5 feature off)".into(),
    ))
}

/// XORs the body against its pad in place. Applying it twice restores the body.
///
/// A no-op for packets flagged unencrypted.
pub fn crypt(secret: &[u8], packet: &mut Packet) -> Result<(), ProtoError> {
    let header = &packet.header;
    if header.is_unencrypted() {
        return Ok(());
    }
    if header.length as usize != packet.body.len() {
        return Err(ProtoError::LengthMismatch {
            declared: header.length,
            actual: packet.body.len(),
        });
    }

    let pad = pseudo_pad(
        secret,
        header.session_id,
        header.version,
        header.seq_no,
        header.length as usize,
    )?;
    for (b, p) in packet.body.iter_mut().zip(pad.iter()) {
        *b ^= *p;
    }
    Ok(())
}

#[cfg(all(test, feature = "legacy-md5"))]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::{FLAG_UNENCRYPTED, TYPE_AUTHEN};

    const SECRET: &[u8] = b"tac_plus_key";

    fn packet(seq_no: u8, body: &[u8]) -> Packet {
        let mut header = Header::new(TYPE_AUTHEN, seq_no, 0x01020304);
        header.length = body.len() as u32;
        Packet::new(header, body.to_vec())
    }

    #[test]
    fn pad_matches_reference_vector() {
        let pad = pseudo_pad(SECRET, 0x01020304, 0xc0, 1, 20).unwrap();
        assert_eq!(
            pad,
            [
                0x70, 0x51, 0x76, 0x32, 0xfe, 0xeb, 0x1e, 0xfc, 0xab, 0xda, 0xd4, 0xc4, 0x06,
                0xbf, 0x97, 0x95, 0x5e, 0x93, 0xe8, 0x26,
            ]
        );
    }

    #[test]
    fn pad_is_exact_length() {
        for len in [0usize, 1, 15, 16, 17, 32, 33, 1000] {
            assert_eq!(pseudo_pad(SECRET, 9, 0xc0, 3, len).unwrap().len(), len);
        }
    }

    #[test]
    fn pad_prefix_is_stable_across_lengths() {
        let short = pseudo_pad(SECRET, 9, 0xc1, 1, 16).unwrap();
        let long = pseudo_pad(SECRET, 9, 0xc1, 1, 40).unwrap();
        assert_eq!(&long[..16], &short[..]);
    }

    #[test]
    fn pad_changes_with_every_input() {
        let base = pseudo_pad(SECRET, 9, 0xc0, 1, 32).unwrap();
        assert_eq!(base, pseudo_pad(SECRET, 9, 0xc0, 1, 32).unwrap());
        assert_ne!(base, pseudo_pad(b"wrong_key", 9, 0xc0, 1, 32).unwrap());
        assert_ne!(base, pseudo_pad(SECRET, 10, 0xc0, 1, 32).unwrap());
        assert_ne!(base, pseudo_pad(SECRET, 9, 0xc1, 1, 32).unwrap());
        assert_ne!(base, pseudo_pad(SECRET, 9, 0xc0, 3, 32).unwrap());
    }

    #[test]
    fn crypt_is_self_inverse() {
        let plain = packet(1, b"the quick brown fox jumps over");
        let mut p = plain.clone();
        crypt(SECRET, &mut p).unwrap();
        assert_ne!(p.body, plain.body);
        crypt(SECRET, &mut p).unwrap();
        assert_eq!(p, plain);
    }

    #[test]
    fn crypt_skips_unencrypted() {
        let mut p = packet(1, b"cleartext body");
        p.header.flags |= FLAG_UNENCRYPTED;
        let before = p.body.clone();
        crypt(SECRET, &mut p).unwrap();
        crypt(b"anything-else", &mut p).unwrap();
        assert_eq!(p.body, before);
    }

    #[test]
    fn crypt_rejects_length_mismatch() {
        let mut p = packet(1, b"abc");
        p.header.length = 5;
        assert!(crypt(SECRET, &mut p).is_err());
    }
}
