// SPDX-License-Identifier: AGPL-3.0-only
//! Type-appropriate error replies for a peer whose shared secret is wrong.

use crate::error::ProtoError;
use crate::header::Header;
use crate::metrics::{CrypterEvent, CrypterMetrics};
use crate::packet::Packet;
use crate::{AcctReply, AuthenReply, AuthorReply, TYPE_ACCT, TYPE_AUTHEN, TYPE_AUTHOR};

pub const BAD_SECRET_MSG: &str = "bad secret";

/// Builds the reply for `header`, restarting the sequence at 1.
///
/// Restarting on a severe error is a compatibility convention; RFC 8907 is
/// silent on this case. The packet is returned in the clear and must go
/// through the normal write path.
pub fn bad_secret_reply(
    mut header: Header,
    metrics: &dyn CrypterMetrics,
) -> Result<Packet, ProtoError> {
    let body = match header.packet_type {
        TYPE_AUTHEN => AuthenReply::error(BAD_SECRET_MSG).encode(),
        TYPE_AUTHOR => AuthorReply::error(BAD_SECRET_MSG).encode(),
        TYPE_ACCT => AcctReply::error(BAD_SECRET_MSG).encode(),
        other => return Err(ProtoError::UnknownType(other)),
    }
    .inspect_err(|_| metrics.record(CrypterEvent::MarshalError))?;

    header.seq_no = 1;
    header.length = body.len() as u32;
    Ok(Packet::new(header, body))
}
