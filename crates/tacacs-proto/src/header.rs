// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ packet header parsing and serialization.

use crate::error::ProtoError;
use crate::{FLAG_UNENCRYPTED, VERSION};

/// Fixed header size on the wire.
pub const HEADER_LEN: usize = 12;

/// Byte offset of the big-endian body length field.
const LENGTH_OFFSET: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub packet_type: u8,
    pub seq_no: u8,
    pub flags: u8,
    pub session_id: u32,
    pub length: u32,
}

impl Header {
    pub fn new(packet_type: u8, seq_no: u8, session_id: u32) -> Header {
        Header {
            version: VERSION,
            packet_type,
            seq_no,
            flags: 0,
            session_id,
            length: 0,
        }
    }

    pub fn response(&self, length: u32) -> Header {
        Header {
            version: self.version,
            packet_type: self.packet_type,
            seq_no: self.seq_no.wrapping_add(1),
            flags: self.flags, // mirrors request flags; caller can override if needed
            session_id: self.session_id,
            length,
        }
    }

    pub fn is_unencrypted(&self) -> bool {
        self.flags & FLAG_UNENCRYPTED != 0
    }

    pub fn decode(buf: &[u8]) -> Result<Header, ProtoError> {
        let buf: &[u8; HEADER_LEN] = buf
            .get(..HEADER_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtoError::ShortHeader(buf.len()))?;
        let version = buf[0];
        if version >> 4 != VERSION >> 4 {
            return Err(ProtoError::UnsupportedVersion(version >> 4));
        }
        Ok(Header {
            version,
            packet_type: buf[1],
            seq_no: buf[2],
            flags: buf[3],
            session_id: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            length: body_length(buf),
        })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.version;
        buf[1] = self.packet_type;
        buf[2] = self.seq_no;
        buf[3] = self.flags;
        buf[4..8].copy_from_slice(&self.session_id.to_be_bytes());
        buf[8..12].copy_from_slice(&self.length.to_be_bytes());
        buf
    }
}

/// Reads the body length straight from raw header bytes, before any decoding.
pub fn body_length(raw: &[u8; HEADER_LEN]) -> u32 {
    u32::from_be_bytes([
        raw[LENGTH_OFFSET],
        raw[LENGTH_OFFSET + 1],
        raw[LENGTH_OFFSET + 2],
        raw[LENGTH_OFFSET + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header(
        version: u8,
        packet_type: u8,
        seq_no: u8,
        flags: u8,
        session_id: u32,
        length: u32,
    ) -> Header {
        Header {
            version,
            packet_type,
            seq_no,
            flags,
            session_id,
            length,
        }
    }

    // ==================== Header::response Tests ====================

    #[test]
    fn header_response_increments_seq_no() {
        let request = make_header(0xC0, 0x01, 1, 0, 12345, 100);
        let response = request.response(50);

        assert_eq!(response.seq_no, 2);
        assert_eq!(response.length, 50);
        assert_eq!(response.session_id, request.session_id);
        assert_eq!(response.version, request.version);
        assert_eq!(response.packet_type, request.packet_type);
        assert_eq!(response.flags, request.flags);
    }

    #[test]
    fn header_response_wraps_at_255() {
        let request = make_header(0xC0, 0x01, 255, 0, 12345, 100);
        assert_eq!(request.response(50).seq_no, 0);
    }

    // ==================== decode / encode Tests ====================

    #[test]
    fn header_decode_exact_bytes() {
        let bytes: [u8; 12] = [
            0xC1, // version (major 12, minor 1)
            0x01, // packet_type (authen)
            0x05, // seq_no
            0x04, // flags (single-connect)
            0x12, 0x34, 0x56, 0x78, // session_id (big-endian)
            0x00, 0x00, 0x01, 0x00, // length = 256 (big-endian)
        ];

        let header = Header::decode(&bytes).unwrap();

        assert_eq!(header.version, 0xC1);
        assert_eq!(header.packet_type, 0x01);
        assert_eq!(header.seq_no, 0x05);
        assert_eq!(header.flags, 0x04);
        assert_eq!(header.session_id, 0x12345678);
        assert_eq!(header.length, 256);
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn header_decode_truncated_fails() {
        let bytes: [u8; 8] = [0xC0, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert!(matches!(
            Header::decode(&bytes),
            Err(ProtoError::ShortHeader(8))
        ));
    }

    #[test]
    fn header_decode_wrong_major_version() {
        let bytes = make_header(0xB0, 0x01, 1, 0, 1, 0).encode();
        assert!(matches!(
            Header::decode(&bytes),
            Err(ProtoError::UnsupportedVersion(0x0B))
        ));
    }

    #[test]
    fn body_length_reads_offset_eight() {
        let raw = make_header(0xC0, 0x03, 1, 0, 0xFFFF_FFFF, 0x0102_0304).encode();
        assert_eq!(body_length(&raw), 0x0102_0304);
    }

    #[test]
    fn unencrypted_flag_detected() {
        let mut header = Header::new(crate::TYPE_AUTHEN, 1, 7);
        assert!(!header.is_unencrypted());
        header.flags |= FLAG_UNENCRYPTED;
        assert!(header.is_unencrypted());
    }
}
