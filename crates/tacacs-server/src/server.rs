// SPDX-License-Identifier: AGPL-3.0-only
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tacwire_proto::{
    ACCT_STATUS_ERROR, AUTHEN_STATUS_FAIL, AUTHOR_STATUS_FAIL, AcctReply, AuthenReply,
    AuthorReply, Crypter, CrypterConfig, CrypterMetrics, Packet, ProtoError, TYPE_ACCT,
    TYPE_AUTHEN, TYPE_AUTHOR,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Produces the reply to one deobfuscated request.
///
/// `Ok(None)` sends nothing and keeps reading.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Packet) -> Result<Option<Packet>, ProtoError>;
}

/// Answers every request with a failure status and a fixed server message.
pub struct RejectingHandler {
    message: String,
}

impl RejectingHandler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Handler for RejectingHandler {
    fn handle(&self, request: &Packet) -> Result<Option<Packet>, ProtoError> {
        let body = match request.header.packet_type {
            TYPE_AUTHEN => AuthenReply {
                status: AUTHEN_STATUS_FAIL,
                flags: 0,
                server_msg: self.message.clone(),
                data: Vec::new(),
            }
            .encode()?,
            TYPE_AUTHOR => AuthorReply::with_status(AUTHOR_STATUS_FAIL, self.message.as_str())
                .encode()?,
            TYPE_ACCT => {
                AcctReply::with_status(ACCT_STATUS_ERROR, self.message.as_str()).encode()?
            }
            other => return Err(ProtoError::UnknownType(other)),
        };
        let header = request.header.response(body.len() as u32);
        Ok(Some(Packet::new(header, body)))
    }
}

pub async fn serve_legacy(
    addr: SocketAddr,
    secret: Arc<[u8]>,
    config: CrypterConfig,
    metrics: Arc<dyn CrypterMetrics>,
    handler: Arc<dyn Handler>,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding legacy listener {}", addr))?;
    info!("listening for legacy TACACS+ on {}", addr);
    serve_listener(listener, secret, config, metrics, handler).await
}

pub async fn serve_listener(
    listener: TcpListener,
    secret: Arc<[u8]>,
    config: CrypterConfig,
    metrics: Arc<dyn CrypterMetrics>,
    handler: Arc<dyn Handler>,
) -> Result<()> {
    loop {
        let (socket, peer_addr) = listener.accept().await?;
        let crypter = Crypter::from_tcp(socket, secret.clone(), config.clone(), metrics.clone());
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(crypter, handler.as_ref()).await {
                warn!(error = ?err, peer = %peer_addr, "connection closed with error");
            }
        });
    }
}

/// Serves requests until the peer closes cleanly or a read, handler or write fails.
pub async fn handle_connection<S>(mut crypter: Crypter<S>, handler: &dyn Handler) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(request) = crypter.read().await? {
        let peer = crypter.proxied_peer();
        debug!(
            session = request.header.session_id,
            packet_type = request.header.packet_type,
            peer = ?peer,
            "handling request"
        );
        let reply = handler
            .handle(&request)
            .with_context(|| format!("handling session {:#010x}", request.header.session_id))?;
        if let Some(reply) = reply {
            crypter.write(reply).await?;
        }
    }
    debug!("peer closed connection");
    Ok(())
}
