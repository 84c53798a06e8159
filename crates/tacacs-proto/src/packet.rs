// SPDX-License-Identifier: AGPL-3.0-only
//! Whole-frame codec: a header plus its raw (possibly obfuscated) body.

use crate::error::ProtoError;
use crate::header::{HEADER_LEN, Header};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn new(header: Header, body: Vec<u8>) -> Packet {
        Packet { header, body }
    }

    /// Decodes a complete frame; the declared length must match the bytes present.
    pub fn unmarshal(frame: &[u8]) -> Result<Packet, ProtoError> {
        let header = Header::decode(frame)?;
        let body = &frame[HEADER_LEN..];
        if header.length as usize != body.len() {
            return Err(ProtoError::LengthMismatch {
                declared: header.length,
                actual: body.len(),
            });
        }
        Ok(Packet {
            header,
            body: body.to_vec(),
        })
    }

    pub fn marshal(&self) -> Result<Vec<u8>, ProtoError> {
        if self.header.length as usize != self.body.len() {
            return Err(ProtoError::LengthMismatch {
                declared: self.header.length,
                actual: self.body.len(),
            });
        }
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.body);
        Ok(out)
    }
}
