// SPDX-License-Identifier: AGPL-3.0-only
//! TACACS+ transport helpers: framing, shared-secret body obfuscation, and
//! detection of peers configured with a different secret.
//! Focused on async IO for server-side use.
//! The `legacy-md5` feature (on by default) enables the TACACS+ MD5 body obfuscation; disable it for FIPS-only builds.

mod accounting;
mod authen;
mod author;
pub mod config;
pub mod crypter;
pub mod crypto;
pub mod detect;
mod error;
pub mod header;
pub mod metrics;
pub mod packet;
pub mod proxy;
pub mod reply;
mod util;

pub use accounting::{AcctReply, AcctRequest};
pub use authen::{AuthenContinue, AuthenReply, AuthenStart};
pub use author::{AuthorReply, AuthorRequest};
pub use config::CrypterConfig;
pub use crypter::Crypter;
pub use error::{CrypterError, ProtoError};
pub use header::Header;
pub use metrics::{CrypterCounters, CrypterEvent, CrypterMetrics, NoopMetrics};
pub use packet::Packet;

pub const VERSION: u8 = 0xc << 4; // Major version 0xC, minor 0

pub const TYPE_AUTHEN: u8 = 0x01;
pub const TYPE_AUTHOR: u8 = 0x02;
pub const TYPE_ACCT: u8 = 0x03;

pub const FLAG_UNENCRYPTED: u8 = 0x01;
pub const FLAG_SINGLE_CONNECT: u8 = 0x04;
pub const MIN_SECRET_LEN: usize = 8;

/// Default ceiling on a declared body length.
pub const MAX_BODY_LENGTH: u32 = 65535;

pub const AUTHEN_STATUS_PASS: u8 = 0x01;
pub const AUTHEN_STATUS_FAIL: u8 = 0x02;
pub const AUTHEN_STATUS_GETDATA: u8 = 0x03;
pub const AUTHEN_STATUS_GETUSER: u8 = 0x04;
pub const AUTHEN_STATUS_GETPASS: u8 = 0x05;
pub const AUTHEN_STATUS_RESTART: u8 = 0x06;
pub const AUTHEN_STATUS_ERROR: u8 = 0x07;
pub const AUTHEN_STATUS_FOLLOW: u8 = 0x21;

pub const AUTHEN_FLAG_NOECHO: u8 = 0x01;
pub const AUTHEN_CONTINUE_FLAG_ABORT: u8 = 0x01;

pub const AUTHEN_TYPE_ASCII: u8 = 0x01;
pub const AUTHEN_TYPE_PAP: u8 = 0x02;
pub const AUTHEN_TYPE_CHAP: u8 = 0x03;
pub const AUTHEN_TYPE_ARAP: u8 = 0x04;
pub const AUTHEN_TYPE_MSCHAP: u8 = 0x05;
pub const AUTHEN_TYPE_MSCHAPV2: u8 = 0x06;

pub const AUTHOR_STATUS_PASS_ADD: u8 = 0x01;
pub const AUTHOR_STATUS_PASS_REPL: u8 = 0x02;
pub const AUTHOR_STATUS_FAIL: u8 = 0x10;
pub const AUTHOR_STATUS_ERROR: u8 = 0x11;
pub const AUTHOR_STATUS_FOLLOW: u8 = 0x21;

pub const ACCT_STATUS_SUCCESS: u8 = 0x01;
pub const ACCT_STATUS_ERROR: u8 = 0x02;
pub const ACCT_STATUS_FOLLOW: u8 = 0x21;
pub const ACCT_FLAG_START: u8 = 0x02;
pub const ACCT_FLAG_STOP: u8 = 0x04;
pub const ACCT_FLAG_WATCHDOG: u8 = 0x08;
