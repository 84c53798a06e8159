// SPDX-License-Identifier: AGPL-3.0-only
//! Connection wrapper that frames, deobfuscates, and screens TACACS+ packets.
//!
//! One `Crypter` owns one transport and is used sequentially. When the
//! unencrypted flag is absent but the peer's secret differs from ours, the
//! deobfuscated body is noise; the wrapper answers such a frame with a
//! "bad secret" error reply and fails the read.

use crate::config::CrypterConfig;
use crate::crypto::crypt;
use crate::detect::detect_bad_secret;
use crate::error::{CrypterError, ProtoError};
use crate::header::{HEADER_LEN, body_length};
use crate::metrics::{CrypterEvent, CrypterMetrics};
use crate::packet::Packet;
use crate::proxy::ProxyHeader;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

pub struct Crypter<S> {
    stream: BufReader<S>,
    secret: Arc<[u8]>,
    config: CrypterConfig,
    metrics: Arc<dyn CrypterMetrics>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
    proxied_peer: Option<SocketAddr>,
}

impl Crypter<TcpStream> {
    /// Wraps an accepted socket, taking the proxy fallback addresses from it.
    pub fn from_tcp(
        stream: TcpStream,
        secret: Arc<[u8]>,
        config: CrypterConfig,
        metrics: Arc<dyn CrypterMetrics>,
    ) -> Self {
        let local = stream.local_addr().ok();
        let peer = stream.peer_addr().ok();
        Crypter::new(stream, secret, config, metrics).with_addrs(local, peer)
    }
}

impl<S> Crypter<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        secret: Arc<[u8]>,
        config: CrypterConfig,
        metrics: Arc<dyn CrypterMetrics>,
    ) -> Self {
        Self {
            stream: BufReader::new(stream),
            secret,
            config,
            metrics,
            local_addr: None,
            peer_addr: None,
            proxied_peer: None,
        }
    }

    pub fn with_addrs(mut self, local: Option<SocketAddr>, peer: Option<SocketAddr>) -> Self {
        self.local_addr = local;
        self.peer_addr = peer;
        self
    }

    /// Source address from the preamble of the frame last returned by `read`.
    ///
    /// Cleared at the start of every read, so it is `None` after a failed read
    /// or a clean close.
    pub fn proxied_peer(&self) -> Option<SocketAddr> {
        self.proxied_peer
    }

    /// Reads one frame. `Ok(None)` is a clean close at a frame boundary.
    pub async fn read(&mut self) -> Result<Option<Packet>, CrypterError> {
        self.proxied_peer = None;
        let mut frame_started = false;
        if self.config.proxy {
            match self.read_proxy_line().await? {
                Some(source) => {
                    self.proxied_peer = Some(source);
                    frame_started = true;
                }
                None => return Ok(None),
            }
        }

        if !frame_started {
            match self.stream.fill_buf().await.map(|buf| buf.is_empty()) {
                Ok(true) => return Ok(None),
                Ok(false) => {}
                Err(err) => return Err(self.read_failed(CrypterError::ReadHeader(err))),
            }
        }
        let mut raw = [0u8; HEADER_LEN];
        if let Err(err) = self.stream.read_exact(&mut raw).await {
            return Err(self.read_failed(CrypterError::ReadHeader(err)));
        }

        let length = body_length(&raw);
        if length > self.config.max_body_length {
            warn!(
                length,
                max = self.config.max_body_length,
                "declared TACACS+ body too large"
            );
            return Err(CrypterError::BodyTooLarge {
                length,
                max: self.config.max_body_length,
            });
        }
        let mut frame = Vec::with_capacity(HEADER_LEN + length as usize);
        frame.extend_from_slice(&raw);
        frame.resize(HEADER_LEN + length as usize, 0);
        if let Err(err) = self.stream.read_exact(&mut frame[HEADER_LEN..]).await {
            return Err(self.read_failed(CrypterError::ReadBody(err)));
        }

        let mut packet = Packet::unmarshal(&frame).map_err(|err| {
            self.metrics.record(CrypterEvent::UnmarshalError);
            CrypterError::Unmarshal(err)
        })?;
        // deobfuscate before screening for a bad secret
        crypt(&self.secret, &mut packet).map_err(|err| {
            self.metrics.record(CrypterEvent::CryptError);
            CrypterError::Crypt(err)
        })?;

        // a detection error outranks a mismatch finding
        let session_id = packet.header.session_id;
        if let Some(reply) =
            detect_bad_secret(&packet, &*self.metrics).map_err(CrypterError::Detect)?
        {
            return Err(match self.write(reply).await {
                Ok(_) => CrypterError::BadSecret { session_id },
                Err(err) => CrypterError::BadSecretReply {
                    session_id,
                    source: Box::new(err),
                },
            });
        }

        debug!(
            session = session_id,
            packet_type = packet.header.packet_type,
            seq = packet.header.seq_no,
            length,
            "read TACACS+ packet"
        );
        self.metrics.record(CrypterEvent::Read);
        Ok(Some(packet))
    }

    /// Obfuscates and sends `packet`, returning the bytes written.
    ///
    /// The header length is always recomputed from the body.
    pub async fn write(&mut self, mut packet: Packet) -> Result<usize, CrypterError> {
        if packet.body.is_empty() {
            return Err(CrypterError::MissingBody);
        }
        packet.header.length = match u32::try_from(packet.body.len()) {
            Ok(len) => len,
            Err(_) => {
                self.metrics.record(CrypterEvent::MarshalError);
                return Err(CrypterError::Marshal(ProtoError::FieldTooLong {
                    field: "body",
                    len: packet.body.len(),
                }));
            }
        };
        crypt(&self.secret, &mut packet).map_err(|err| {
            self.metrics.record(CrypterEvent::CryptError);
            CrypterError::Crypt(err)
        })?;
        let bytes = packet.marshal().map_err(|err| {
            self.metrics.record(CrypterEvent::MarshalError);
            CrypterError::Marshal(err)
        })?;

        let stream = self.stream.get_mut();
        let written = async {
            stream.write_all(&bytes).await?;
            stream.flush().await
        }
        .await;
        if let Err(err) = written {
            self.metrics.record(CrypterEvent::WriteError);
            return Err(CrypterError::Write(err));
        }
        self.metrics.record(CrypterEvent::Write);
        Ok(bytes.len())
    }

    async fn read_proxy_line(&mut self) -> Result<Option<SocketAddr>, CrypterError> {
        let mut line = Vec::new();
        match self.stream.read_until(b'\0', &mut line).await {
            Ok(0) => return Ok(None),
            Ok(_) if line.last() == Some(&b'\0') => {}
            Ok(_) => {
                return Err(self.read_failed(CrypterError::ProxyRead(
                    io::ErrorKind::UnexpectedEof.into(),
                )));
            }
            Err(err) => return Err(self.read_failed(CrypterError::ProxyRead(err))),
        }
        let header = ProxyHeader::parse(&line, self.local_addr, self.peer_addr)
            .map_err(|err| self.read_failed(CrypterError::Proxy(err)))?;
        debug!(source = %header.source, destination = %header.destination, "stripped proxy header");
        Ok(Some(header.source))
    }

    fn read_failed(&self, err: CrypterError) -> CrypterError {
        self.metrics.record(CrypterEvent::ReadError);
        err
    }
}
