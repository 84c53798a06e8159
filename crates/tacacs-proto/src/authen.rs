// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ authentication packet structures plus parsing/encoding helpers.

use crate::error::ProtoError;
use crate::util::{BodyReader, ensure_u8_len, ensure_u16_len};
use crate::{
    AUTHEN_CONTINUE_FLAG_ABORT, AUTHEN_FLAG_NOECHO, AUTHEN_STATUS_ERROR, AUTHEN_STATUS_FOLLOW,
    AUTHEN_STATUS_PASS, AUTHEN_STATUS_RESTART, AUTHEN_TYPE_ASCII, AUTHEN_TYPE_MSCHAPV2,
};
use bytes::{BufMut, BytesMut};

const START: &str = "authen start";
const CONTINUE: &str = "authen continue";
const REPLY: &str = "authen reply";

const MAX_PRIV_LVL: u8 = 0x0f;
const MAX_AUTHEN_SERVICE: u8 = 0x09; // FWPROXY

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenStart {
    pub action: u8,
    pub priv_lvl: u8,
    pub authen_type: u8,
    pub service: u8,
    pub user: String,
    pub port: String,
    pub rem_addr: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenContinue {
    pub user_msg: Vec<u8>,
    pub data: Vec<u8>,
    pub flags: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenReply {
    pub status: u8,
    pub flags: u8,
    pub server_msg: String,
    pub data: Vec<u8>,
}

impl AuthenStart {
    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(START, body);
        let action = r.u8("action")?;
        let priv_lvl = r.u8("priv_lvl")?;
        let authen_type = r.u8("authen_type")?;
        let service = r.u8("service")?;
        if !(0x01..=0x04).contains(&action) {
            return Err(r.malformed(format!("action {action:#04x} invalid")));
        }
        if priv_lvl > MAX_PRIV_LVL {
            return Err(r.malformed(format!("priv_lvl {priv_lvl} invalid")));
        }
        if !(AUTHEN_TYPE_ASCII..=AUTHEN_TYPE_MSCHAPV2).contains(&authen_type) {
            return Err(r.malformed(format!("authen_type {authen_type:#04x} invalid")));
        }
        if service > MAX_AUTHEN_SERVICE {
            return Err(r.malformed(format!("service {service:#04x} invalid")));
        }
        let user_len = r.u8("user_len")? as usize;
        let port_len = r.u8("port_len")? as usize;
        let rem_addr_len = r.u8("rem_addr_len")? as usize;
        let data_len = r.u8("data_len")? as usize;
        r.expect_total(8, &[user_len, port_len, rem_addr_len, data_len])?;

        Ok(AuthenStart {
            action,
            priv_lvl,
            authen_type,
            service,
            user: r.string(user_len, "user")?,
            port: r.string(port_len, "port")?,
            rem_addr: r.string(rem_addr_len, "rem_addr")?,
            data: r.bytes(data_len, "data")?.to_vec(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf = BytesMut::new();
        buf.put_u8(self.action);
        buf.put_u8(self.priv_lvl);
        buf.put_u8(self.authen_type);
        buf.put_u8(self.service);
        buf.put_u8(ensure_u8_len("user", self.user.len())?);
        buf.put_u8(ensure_u8_len("port", self.port.len())?);
        buf.put_u8(ensure_u8_len("rem_addr", self.rem_addr.len())?);
        buf.put_u8(ensure_u8_len("data", self.data.len())?);
        buf.extend_from_slice(self.user.as_bytes());
        buf.extend_from_slice(self.port.as_bytes());
        buf.extend_from_slice(self.rem_addr.as_bytes());
        buf.extend_from_slice(&self.data);
        Ok(buf.to_vec())
    }
}

impl AuthenContinue {
    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(CONTINUE, body);
        let user_msg_len = r.u16("user_msg_len")? as usize;
        let data_len = r.u16("data_len")? as usize;
        let flags = r.u8("flags")?;
        if flags & !AUTHEN_CONTINUE_FLAG_ABORT != 0 {
            return Err(r.malformed(format!("flags {flags:#04x} invalid")));
        }
        r.expect_total(5, &[user_msg_len, data_len])?;

        Ok(AuthenContinue {
            user_msg: r.bytes(user_msg_len, "user_msg")?.to_vec(),
            data: r.bytes(data_len, "data")?.to_vec(),
            flags,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf = BytesMut::new();
        buf.put_u16(ensure_u16_len("user_msg", self.user_msg.len())?);
        buf.put_u16(ensure_u16_len("data", self.data.len())?);
        buf.put_u8(self.flags);
        buf.extend_from_slice(&self.user_msg);
        buf.extend_from_slice(&self.data);
        Ok(buf.to_vec())
    }
}

impl AuthenReply {
    pub fn error(server_msg: impl Into<String>) -> Self {
        AuthenReply {
            status: AUTHEN_STATUS_ERROR,
            flags: 0,
            server_msg: server_msg.into(),
            data: Vec::new(),
        }
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(REPLY, body);
        let status = r.u8("status")?;
        let flags = r.u8("flags")?;
        if !matches!(
            status,
            AUTHEN_STATUS_PASS..=AUTHEN_STATUS_RESTART | AUTHEN_STATUS_ERROR | AUTHEN_STATUS_FOLLOW
        ) {
            return Err(r.malformed(format!("status {status:#04x} invalid")));
        }
        if flags & !AUTHEN_FLAG_NOECHO != 0 {
            return Err(r.malformed(format!("flags {flags:#04x} invalid")));
        }
        let server_msg_len = r.u16("server_msg_len")? as usize;
        let data_len = r.u16("data_len")? as usize;
        r.expect_total(6, &[server_msg_len, data_len])?;

        Ok(AuthenReply {
            status,
            flags,
            server_msg: r.string(server_msg_len, "server_msg")?,
            data: r.bytes(data_len, "data")?.to_vec(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf = BytesMut::new();
        buf.put_u8(self.status);
        buf.put_u8(self.flags);
        buf.put_u16(ensure_u16_len("server_msg", self.server_msg.len())?);
        buf.put_u16(ensure_u16_len("data", self.data.len())?);
        buf.extend_from_slice(self.server_msg.as_bytes());
        buf.extend_from_slice(&self.data);
        Ok(buf.to_vec())
    }
}
