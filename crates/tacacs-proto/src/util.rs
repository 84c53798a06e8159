// SPDX-License-Identifier: AGPL-3.0-only
//! Shared parsing utilities for TACACS+ packet bodies.

use crate::error::ProtoError;

/// Bounds-checked body reader; every failure is a `Malformed` for `schema`.
pub(crate) struct BodyReader<'a> {
    schema: &'static str,
    body: &'a [u8],
    cursor: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(schema: &'static str, body: &'a [u8]) -> Self {
        Self {
            schema,
            body,
            cursor: 0,
        }
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> ProtoError {
        ProtoError::malformed(self.schema, reason)
    }

    /// The fixed part plus every declared field must account for the whole body.
    pub(crate) fn expect_total(&self, fixed: usize, fields: &[usize]) -> Result<(), ProtoError> {
        let expected = fields.iter().sum::<usize>() + fixed;
        if expected != self.body.len() {
            return Err(self.malformed(format!(
                "declared lengths total {expected}, body is {}",
                self.body.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self, label: &str) -> Result<u8, ProtoError> {
        let b = *self
            .body
            .get(self.cursor)
            .ok_or_else(|| self.malformed(format!("{label} truncated")))?;
        self.cursor += 1;
        Ok(b)
    }

    pub(crate) fn u16(&mut self, label: &str) -> Result<u16, ProtoError> {
        let raw = self.bytes(2, label)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    pub(crate) fn bytes(&mut self, len: usize, label: &str) -> Result<&'a [u8], ProtoError> {
        let next = self
            .cursor
            .checked_add(len)
            .ok_or_else(|| self.malformed(format!("overflow parsing {label}")))?;
        let body = self.body;
        let slice = body
            .get(self.cursor..next)
            .ok_or_else(|| self.malformed(format!("{label} truncated")))?;
        self.cursor = next;
        Ok(slice)
    }

    /// Text fields are opaque octets on the wire; invalid UTF-8 is replaced, never rejected.
    pub(crate) fn string(&mut self, len: usize, label: &str) -> Result<String, ProtoError> {
        let raw = self.bytes(len, label)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

pub(crate) fn ensure_u8_len(field: &'static str, len: usize) -> Result<u8, ProtoError> {
    u8::try_from(len).map_err(|_| ProtoError::FieldTooLong { field, len })
}

pub(crate) fn ensure_u16_len(field: &'static str, len: usize) -> Result<u16, ProtoError> {
    u16::try_from(len).map_err(|_| ProtoError::FieldTooLong { field, len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_walks_fields_in_order() {
        let body = [0x01, 0x00, 0x02, b'h', b'i'];
        let mut r = BodyReader::new("test", &body);
        assert_eq!(r.u8("a").unwrap(), 1);
        assert_eq!(r.u16("b").unwrap(), 2);
        assert_eq!(r.string(2, "c").unwrap(), "hi");
        assert!(r.u8("d").unwrap_err().is_malformed());
    }

    #[test]
    fn expect_total_rejects_slack_and_overrun() {
        let body = [0u8; 10];
        let r = BodyReader::new("test", &body);
        assert!(r.expect_total(6, &[2, 2]).is_ok());
        assert!(r.expect_total(6, &[2, 1]).unwrap_err().is_malformed());
        assert!(r.expect_total(6, &[2, 3]).unwrap_err().is_malformed());
    }

    #[test]
    fn invalid_utf8_text_is_accepted() {
        let body = [b'j', 0xe9, b'r'];
        let mut r = BodyReader::new("test", &body);
        assert_eq!(r.string(3, "user").unwrap(), "j\u{fffd}r");
    }

    #[test]
    fn length_guards() {
        assert_eq!(ensure_u8_len("arg", 255).unwrap(), 255);
        assert!(matches!(
            ensure_u8_len("arg", 256),
            Err(ProtoError::FieldTooLong { field: "arg", len: 256 })
        ));
        assert!(ensure_u16_len("server_msg", 70_000).is_err());
    }
}
