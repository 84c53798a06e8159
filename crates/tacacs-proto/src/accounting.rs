// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ accounting packet structures plus parsing/encoding helpers.

use crate::author::{check_authen_context, put_args, read_arg_lens, read_args};
use crate::error::ProtoError;
use crate::util::{BodyReader, ensure_u8_len, ensure_u16_len};
use crate::{
    ACCT_FLAG_START, ACCT_FLAG_STOP, ACCT_FLAG_WATCHDOG, ACCT_STATUS_ERROR, ACCT_STATUS_FOLLOW,
    ACCT_STATUS_SUCCESS,
};
use bytes::{BufMut, BytesMut};

const REQUEST: &str = "acct request";
const REPLY: &str = "acct reply";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcctRequest {
    pub flags: u8,
    pub authen_method: u8,
    pub priv_lvl: u8,
    pub authen_type: u8,
    pub authen_service: u8,
    pub user: String,
    pub port: String,
    pub rem_addr: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcctReply {
    pub status: u8,
    pub server_msg: String,
    pub data: String,
}

impl AcctRequest {
    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(REQUEST, body);
        let flags = r.u8("flags")?;
        let valid_mask: u8 = ACCT_FLAG_START | ACCT_FLAG_STOP | ACCT_FLAG_WATCHDOG;
        if (flags & valid_mask).count_ones() != 1 || flags & !valid_mask != 0 {
            return Err(r.malformed(format!("flags {flags:#04x} invalid")));
        }
        let authen_method = r.u8("authen_method")?;
        let priv_lvl = r.u8("priv_lvl")?;
        let authen_type = r.u8("authen_type")?;
        let authen_service = r.u8("authen_service")?;
        check_authen_context(&r, authen_method, priv_lvl, authen_type, authen_service)?;
        let user_len = r.u8("user_len")? as usize;
        let port_len = r.u8("port_len")? as usize;
        let rem_addr_len = r.u8("rem_addr_len")? as usize;
        let arg_cnt = r.u8("arg_cnt")? as usize;
        let arg_lens = read_arg_lens(&mut r, arg_cnt)?;
        let mut fields = vec![user_len, port_len, rem_addr_len];
        fields.extend_from_slice(&arg_lens);
        r.expect_total(9 + arg_cnt, &fields)?;

        Ok(AcctRequest {
            flags,
            authen_method,
            priv_lvl,
            authen_type,
            authen_service,
            user: r.string(user_len, "user")?,
            port: r.string(port_len, "port")?,
            rem_addr: r.string(rem_addr_len, "rem_addr")?,
            args: read_args(&mut r, &arg_lens)?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf: BytesMut = BytesMut::new();
        buf.put_u8(self.flags);
        buf.put_u8(self.authen_method);
        buf.put_u8(self.priv_lvl);
        buf.put_u8(self.authen_type);
        buf.put_u8(self.authen_service);
        buf.put_u8(ensure_u8_len("user", self.user.len())?);
        buf.put_u8(ensure_u8_len("port", self.port.len())?);
        buf.put_u8(ensure_u8_len("rem_addr", self.rem_addr.len())?);
        buf.put_u8(ensure_u8_len("args", self.args.len())?);
        put_args(&mut buf, &self.args)?;
        buf.extend_from_slice(self.user.as_bytes());
        buf.extend_from_slice(self.port.as_bytes());
        buf.extend_from_slice(self.rem_addr.as_bytes());
        for arg in &self.args {
            buf.extend_from_slice(arg.as_bytes());
        }
        Ok(buf.to_vec())
    }
}

impl AcctReply {
    pub fn with_status(status: u8, server_msg: impl Into<String>) -> Self {
        AcctReply {
            status,
            server_msg: server_msg.into(),
            data: String::new(),
        }
    }

    pub fn error(server_msg: impl Into<String>) -> Self {
        Self::with_status(ACCT_STATUS_ERROR, server_msg)
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(REPLY, body);
        let server_msg_len = r.u16("server_msg_len")? as usize;
        let data_len = r.u16("data_len")? as usize;
        let status = r.u8("status")?;
        if !matches!(
            status,
            ACCT_STATUS_SUCCESS | ACCT_STATUS_ERROR | ACCT_STATUS_FOLLOW
        ) {
            return Err(r.malformed(format!("status {status:#04x} invalid")));
        }
        r.expect_total(5, &[server_msg_len, data_len])?;

        Ok(AcctReply {
            status,
            server_msg: r.string(server_msg_len, "server_msg")?,
            data: r.string(data_len, "data")?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf: BytesMut = BytesMut::new();
        buf.put_u16(ensure_u16_len("server_msg", self.server_msg.len())?);
        buf.put_u16(ensure_u16_len("data", self.data.len())?);
        buf.put_u8(self.status);
        buf.extend_from_slice(self.server_msg.as_bytes());
        buf.extend_from_slice(self.data.as_bytes());
        Ok(buf.to_vec())
    }
}
