// SPDX-License-Identifier: AGPL-3.0-only
//! Heuristic shared-secret mismatch detection.
//!
//! TACACS+ carries no integrity check, so a body deobfuscated with the wrong
//! secret is only recognisable as noise. Every schema that may legally follow
//! a header of the given type is tried; when all of them reject the body as
//! malformed the secret is assumed to be wrong.

use crate::error::ProtoError;
use crate::metrics::{CrypterEvent, CrypterMetrics};
use crate::packet::Packet;
use crate::reply::bad_secret_reply;
use crate::{
    AcctReply, AcctRequest, AuthenContinue, AuthenReply, AuthenStart, AuthorReply, AuthorRequest,
    TYPE_ACCT, TYPE_AUTHEN, TYPE_AUTHOR,
};
use tracing::warn;

/// A named decoder tried against a candidate body.
#[derive(Clone, Copy)]
pub struct SchemaCandidate {
    pub name: &'static str,
    pub probe: fn(&[u8]) -> Result<(), ProtoError>,
}

const AUTHEN_CANDIDATES: &[SchemaCandidate] = &[
    SchemaCandidate {
        name: "authen start",
        probe: |b| AuthenStart::decode(b).map(drop),
    },
    SchemaCandidate {
        name: "authen continue",
        probe: |b| AuthenContinue::decode(b).map(drop),
    },
    SchemaCandidate {
        name: "authen reply",
        probe: |b| AuthenReply::decode(b).map(drop),
    },
];

const AUTHOR_CANDIDATES: &[SchemaCandidate] = &[
    SchemaCandidate {
        name: "author request",
        probe: |b| AuthorRequest::decode(b).map(drop),
    },
    SchemaCandidate {
        name: "author reply",
        probe: |b| AuthorReply::decode(b).map(drop),
    },
];

const ACCT_CANDIDATES: &[SchemaCandidate] = &[
    SchemaCandidate {
        name: "acct request",
        probe: |b| AcctRequest::decode(b).map(drop),
    },
    SchemaCandidate {
        name: "acct reply",
        probe: |b| AcctReply::decode(b).map(drop),
    },
];

/// Ordered decoders for a header type. Unknown types have none and are never checked.
pub fn candidates(packet_type: u8) -> &'static [SchemaCandidate] {
    match packet_type {
        TYPE_AUTHEN => AUTHEN_CANDIDATES,
        TYPE_AUTHOR => AUTHOR_CANDIDATES,
        TYPE_ACCT => ACCT_CANDIDATES,
        _ => &[],
    }
}

/// Checks a deobfuscated packet.
///
/// `Ok(Some(reply))` means the secret is almost certainly wrong and `reply`
/// should be sent to the peer. `Err` is a failure of detection itself.
pub fn detect_bad_secret(
    packet: &Packet,
    metrics: &dyn CrypterMetrics,
) -> Result<Option<Packet>, ProtoError> {
    if packet.header.is_unencrypted() {
        return Ok(None);
    }
    let table = candidates(packet.header.packet_type);
    if table.is_empty() {
        return Ok(None);
    }

    let malformed = table
        .iter()
        .filter(|c| matches!((c.probe)(&packet.body), Err(ref e) if e.is_malformed()))
        .count();
    if malformed < table.len() {
        return Ok(None);
    }

    metrics.record(CrypterEvent::BadSecret);
    warn!(
        session = packet.header.session_id,
        packet_type = packet.header.packet_type,
        schemas = table.len(),
        "body rejected by every schema; shared secret likely mismatched"
    );
    bad_secret_reply(packet.header.clone(), metrics).map(Some)
}
