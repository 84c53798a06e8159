// SPDX-License-Identifier: AGPL-3.0-only
//! HA-Proxy style (v1 text) source-address preamble, terminated by a NUL byte.

use crate::error::ProtoError;
use std::net::{IpAddr, SocketAddr};

/// The original connection endpoints carried by a proxy preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHeader {
    pub source: SocketAddr,
    pub destination: SocketAddr,
}

impl ProxyHeader {
    /// Parses `PROXY TCP4|TCP6 src dst sport dport` or `PROXY UNKNOWN`.
    ///
    /// `UNKNOWN` resolves to the transport's own addresses.
    pub fn parse(
        line: &[u8],
        local: Option<SocketAddr>,
        remote: Option<SocketAddr>,
    ) -> Result<ProxyHeader, ProtoError> {
        let line = line.strip_suffix(b"\0").unwrap_or(line);
        let line = line.strip_suffix(b"\r\n").unwrap_or(line);
        let text = std::str::from_utf8(line)
            .map_err(|_| ProtoError::Proxy("preamble is not ASCII".into()))?;
        let mut fields = text.split(' ');
        if fields.next() != Some("PROXY") {
            return Err(ProtoError::Proxy(format!("missing PROXY signature in {text:?}")));
        }

        let family = fields
            .next()
            .ok_or_else(|| ProtoError::Proxy("missing protocol family".into()))?;
        let want_v4 = match family {
            "TCP4" => true,
            "TCP6" => false,
            "UNKNOWN" => {
                return match (remote, local) {
                    (Some(source), Some(destination)) => Ok(ProxyHeader {
                        source,
                        destination,
                    }),
                    _ => Err(ProtoError::Proxy(
                        "UNKNOWN family without transport addresses".into(),
                    )),
                };
            }
            other => return Err(ProtoError::Proxy(format!("unsupported family {other}"))),
        };

        let rest: Vec<&str> = fields.collect();
        let [src, dst, sport, dport] = rest.as_slice() else {
            return Err(ProtoError::Proxy(format!(
                "expected 4 address fields, found {}",
                rest.len()
            )));
        };
        let src = parse_ip(src, want_v4)?;
        let dst = parse_ip(dst, want_v4)?;
        Ok(ProxyHeader {
            source: SocketAddr::new(src, parse_port(sport)?),
            destination: SocketAddr::new(dst, parse_port(dport)?),
        })
    }
}

fn parse_ip(raw: &str, want_v4: bool) -> Result<IpAddr, ProtoError> {
    let ip: IpAddr = raw
        .parse()
        .map_err(|_| ProtoError::Proxy(format!("invalid address {raw:?}")))?;
    if ip.is_ipv4() != want_v4 {
        return Err(ProtoError::Proxy(format!("address {ip} does not match family")));
    }
    Ok(ip)
}

fn parse_port(raw: &str) -> Result<u16, ProtoError> {
    // Leading zeros are not permitted by the v1 grammar.
    if raw.len() > 1 && raw.starts_with('0') {
        return Err(ProtoError::Proxy(format!("invalid port {raw:?}")));
    }
    raw.parse()
        .map_err(|_| ProtoError::Proxy(format!("invalid port {raw:?}")))
}
