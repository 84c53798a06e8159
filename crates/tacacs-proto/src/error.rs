// SPDX-License-Identifier: AGPL-3.0-only
//! Error types for the codec, schema decoders, and the connection wrapper.

use std::io;
use thiserror::Error;

/// Codec, schema, proxy, and crypt errors.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Body bytes do not fit the named message schema.
    ///
    /// This is the only kind the secret mismatch detector counts.
    #[error("{schema} body malformed: {reason}")]
    Malformed {
        schema: &'static str,
        reason: String,
    },

    #[error("TACACS+ header truncated: {0} bytes")]
    ShortHeader(usize),

    #[error("unsupported TACACS+ major version {0:#x}")]
    UnsupportedVersion(u8),

    #[error("header length {declared} does not match body length {actual}")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("{field} too long: {len} bytes")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("unknown header type [{0}]")]
    UnknownType(u8),

    #[error("proxy header invalid: {0}")]
    Proxy(String),

    #[error("body crypt failed: {0}")]
    Crypt(String),
}

impl ProtoError {
    pub(crate) fn malformed(schema: &'static str, reason: impl Into<String>) -> Self {
        ProtoError::Malformed {
            schema,
            reason: reason.into(),
        }
    }

    /// True when the error means "these bytes are not this schema".
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtoError::Malformed { .. })
    }
}

/// Failures of a single `Crypter` read or write, one variant per stage.
#[derive(Debug, Error)]
pub enum CrypterError {
    #[error("unable to read header proxy line")]
    ProxyRead(#[source] io::Error),

    #[error("unable to extract proxy header")]
    Proxy(#[source] ProtoError),

    #[error("reading TACACS+ header")]
    ReadHeader(#[source] io::Error),

    #[error("declared body length {length} exceeds maximum {max}, aborting")]
    BodyTooLarge { length: u32, max: u32 },

    #[error("reading TACACS+ body")]
    ReadBody(#[source] io::Error),

    #[error("unmarshalling TACACS+ packet")]
    Unmarshal(#[source] ProtoError),

    #[error("crypt")]
    Crypt(#[source] ProtoError),

    #[error("bad secret detection")]
    Detect(#[source] ProtoError),

    #[error("bad secret detected for session {session_id:#010x}")]
    BadSecret { session_id: u32 },

    #[error("bad secret, crypt write fail for session {session_id:#010x}")]
    BadSecretReply {
        session_id: u32,
        #[source]
        source: Box<CrypterError>,
    },

    #[error("handler error, packet body cannot be empty")]
    MissingBody,

    #[error("marshalling TACACS+ packet")]
    Marshal(#[source] ProtoError),

    #[error("writing TACACS+ packet")]
    Write(#[source] io::Error),
}

impl CrypterError {
    /// True for either shape of the bad-secret outcome.
    pub fn is_bad_secret(&self) -> bool {
        matches!(
            self,
            CrypterError::BadSecret { .. } | CrypterError::BadSecretReply { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_is_distinguished_from_structural() {
        assert!(ProtoError::malformed("authen start", "too short").is_malformed());
        assert!(!ProtoError::ShortHeader(3).is_malformed());
        assert!(
            !ProtoError::LengthMismatch {
                declared: 4,
                actual: 2
            }
            .is_malformed()
        );
        assert!(!ProtoError::Crypt("md5".into()).is_malformed());
    }

    #[test]
    fn bad_secret_reply_error_keeps_session_and_cause() {
        let err = CrypterError::BadSecretReply {
            session_id: 0xdeadbeef,
            source: Box::new(CrypterError::Write(io::Error::from(
                io::ErrorKind::BrokenPipe,
            ))),
        };
        assert!(err.is_bad_secret());
        let msg = err.to_string();
        assert!(msg.contains("0xdeadbeef"));
        assert!(!msg.contains("writing TACACS+ packet"));
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "writing TACACS+ packet");
        assert!(std::error::Error::source(cause).is_some());
    }

    #[test]
    fn stage_messages_leave_the_cause_to_the_chain() {
        let err = CrypterError::ReadHeader(io::ErrorKind::UnexpectedEof.into());
        assert_eq!(err.to_string(), "reading TACACS+ header");
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            io::Error::from(io::ErrorKind::UnexpectedEof).to_string()
        );
    }
}
