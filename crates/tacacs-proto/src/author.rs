// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ authorization packet structures plus parsing/encoding helpers.

use crate::error::ProtoError;
use crate::util::{BodyReader, ensure_u8_len, ensure_u16_len};
use crate::{
    AUTHOR_STATUS_ERROR, AUTHOR_STATUS_FAIL, AUTHOR_STATUS_FOLLOW, AUTHOR_STATUS_PASS_ADD,
    AUTHOR_STATUS_PASS_REPL,
};
use bytes::{BufMut, BytesMut};

const REQUEST: &str = "author request";
const REPLY: &str = "author reply";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRequest {
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
pub struct AuthorReply {
    pub status: u8,
    pub server_msg: String,
    pub data: String,
    pub args: Vec<String>,
}

/// RFC 8907 authen_method values shared by authorization and accounting.
pub(crate) fn valid_authen_method(method: u8) -> bool {
    matches!(method, 0x00..=0x06 | 0x08 | 0x10 | 0x11 | 0x20)
}

/// Validates the authentication context block shared with accounting.
pub(crate) fn check_authen_context(
    r: &BodyReader<'_>,
    authen_method: u8,
    priv_lvl: u8,
    authen_type: u8,
    authen_service: u8,
) -> Result<(), ProtoError> {
    if !valid_authen_method(authen_method) {
        return Err(r.malformed(format!("authen_method {authen_method:#04x} invalid")));
    }
    if priv_lvl > 0x0f {
        return Err(r.malformed(format!("priv_lvl {priv_lvl} invalid")));
    }
    if authen_type > 0x06 {
        return Err(r.malformed(format!("authen_type {authen_type:#04x} invalid")));
    }
    if authen_service > 0x09 {
        return Err(r.malformed(format!("authen_service {authen_service:#04x} invalid")));
    }
    Ok(())
}

/// Reads `count` one-byte argument lengths; zero-length arguments are rejected.
pub(crate) fn read_arg_lens(r: &mut BodyReader<'_>, count: usize) -> Result<Vec<usize>, ProtoError> {
    let lens = r.bytes(count, "arg lengths")?;
    if let Some(idx) = lens.iter().position(|l| *l == 0) {
        return Err(r.malformed(format!("arg[{idx}] length invalid")));
    }
    Ok(lens.iter().map(|l| *l as usize).collect())
}

pub(crate) fn read_args(r: &mut BodyReader<'_>, lens: &[usize]) -> Result<Vec<String>, ProtoError> {
    lens.iter()
        .enumerate()
        .map(|(idx, len)| r.string(*len, &format!("arg[{idx}]")))
        .collect()
}

pub(crate) fn put_args(buf: &mut BytesMut, args: &[String]) -> Result<(), ProtoError> {
    for arg in args {
        buf.put_u8(ensure_u8_len("arg", arg.len())?);
    }
    Ok(())
}

impl AuthorRequest {
    pub fn builder() -> AuthorRequest {
        AuthorRequest {
            authen_method: 0x06, // TACACSPLUS
            priv_lvl: 1,
            authen_type: 0x01,
            authen_service: 0x01,
            user: String::new(),
            port: String::new(),
            rem_addr: String::new(),
            args: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(REQUEST, body);
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
        r.expect_total(8 + arg_cnt, &fields)?;

        Ok(AuthorRequest {
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
        let mut buf = BytesMut::new();
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

impl AuthorReply {
    pub fn with_status(status: u8, server_msg: impl Into<String>) -> Self {
        AuthorReply {
            status,
            server_msg: server_msg.into(),
            data: String::new(),
            args: Vec::new(),
        }
    }

    pub fn error(server_msg: impl Into<String>) -> Self {
        Self::with_status(AUTHOR_STATUS_ERROR, server_msg)
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProtoError> {
        let mut r = BodyReader::new(REPLY, body);
        let status = r.u8("status")?;
        if !matches!(
            status,
            AUTHOR_STATUS_PASS_ADD
                | AUTHOR_STATUS_PASS_REPL
                | AUTHOR_STATUS_FAIL
                | AUTHOR_STATUS_ERROR
                | AUTHOR_STATUS_FOLLOW
        ) {
            return Err(r.malformed(format!("status {status:#04x} invalid")));
        }
        let arg_cnt = r.u8("arg_cnt")? as usize;
        let server_msg_len = r.u16("server_msg_len")? as usize;
        let data_len = r.u16("data_len")? as usize;
        let arg_lens = read_arg_lens(&mut r, arg_cnt)?;
        let mut fields = vec![server_msg_len, data_len];
        fields.extend_from_slice(&arg_lens);
        r.expect_total(6 + arg_cnt, &fields)?;

        Ok(AuthorReply {
            status,
            server_msg: r.string(server_msg_len, "server_msg")?,
            data: r.string(data_len, "data")?,
            args: read_args(&mut r, &arg_lens)?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf = BytesMut::new();
        buf.put_u8(self.status);
        buf.put_u8(ensure_u8_len("args", self.args.len())?);
        buf.put_u16(ensure_u16_len("server_msg", self.server_msg.len())?);
        buf.put_u16(ensure_u16_len("data", self.data.len())?);
        put_args(&mut buf, &self.args)?;
        buf.extend_from_slice(self.server_msg.as_bytes());
        buf.extend_from_slice(self.data.as_bytes());
        for arg in &self.args {
            buf.extend_from_slice(arg.as_bytes());
        }
        Ok(buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_request() -> AuthorRequest {
        AuthorRequest::builder()
            .with_user("alice")
            .with_port("tty1")
            .add_arg("service=shell")
            .add_arg("cmd=show")
            .add_arg("cmd-arg=version")
    }

    #[test]
    fn request_layout_puts_arg_lengths_before_strings() {
        let body = shell_request().encode().unwrap();
        assert_eq!(body[7], 3);
        assert_eq!(&body[8..11], &[13, 8, 15]);
        assert_eq!(&body[11..16], b"alice");
        assert_eq!(AuthorRequest::decode(&body).unwrap(), shell_request());
    }

    #[test]
    fn request_rejects_zero_length_arg() {
        let mut body = shell_request().encode().unwrap();
        body[8] = 0;
        let err = AuthorRequest::decode(&body).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("arg[0]"));
    }

    #[test]
    fn request_rejects_unknown_authen_method() {
        let mut body = shell_request().encode().unwrap();
        body[0] = 0x07;
        assert!(AuthorRequest::decode(&body).unwrap_err().is_malformed());
    }

    #[test]
    fn reply_error_carries_message() {
        let body = AuthorReply::error("bad secret").encode().unwrap();
        assert_eq!(body.len(), 6 + "bad secret".len());
        let reply = AuthorReply::decode(&body).unwrap();
        assert_eq!(reply.status, AUTHOR_STATUS_ERROR);
        assert_eq!(reply.server_msg, "bad secret");
    }

    #[test]
    fn reply_with_args_decodes() {
        let reply = AuthorReply {
            status: AUTHOR_STATUS_PASS_ADD,
            server_msg: String::new(),
            data: String::new(),
            args: vec!["priv-lvl=15".into()],
        };
        let body = reply.encode().unwrap();
        assert_eq!(AuthorReply::decode(&body).unwrap(), reply);
    }

    #[test]
    fn too_many_args_rejected_on_encode() {
        let mut req = AuthorRequest::builder();
        req.args = vec!["a=b".to_string(); 256];
        assert!(matches!(
            req.encode(),
            Err(ProtoError::FieldTooLong { field: "args", .. })
        ));
    }
}
