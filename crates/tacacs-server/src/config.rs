// SPDX-License-Identifier: AGPL-3.0-only
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tacwire_proto::{CrypterConfig, MIN_SECRET_LEN};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// JSON structured logging for log aggregation.
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "tacwire-server",
    version,
    about = "Legacy TACACS+ listener that rejects every request"
)]
pub struct Args {
    /// Listen address for legacy TACACS+.
    #[arg(long, default_value = "0.0.0.0:49")]
    pub listen: SocketAddr,

    /// Shared secret for TACACS+ body obfuscation.
    #[arg(long)]
    pub secret: String,

    /// JSON file holding framing settings (max_body_length, proxy).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Expect a NUL-terminated proxy preamble before each frame.
    #[arg(long)]
    pub proxy: bool,

    /// Largest body length a peer may declare.
    #[arg(long)]
    pub max_body_length: Option<u32>,

    /// Log output format: text or json.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Server message carried in every rejection.
    #[arg(long, default_value = "service not available")]
    pub reject_message: String,
}

impl Args {
    /// Framing settings from `--config`, with command line flags taking precedence.
    pub fn crypter_config(&self) -> Result<CrypterConfig> {
        let mut config = match self.config.as_deref() {
            Some(path) => load_crypter_config(path)?,
            None => CrypterConfig::default(),
        };
        if self.proxy {
            config.proxy = true;
        }
        if let Some(max) = self.max_body_length {
            config.max_body_length = max;
        }
        Ok(config)
    }

    pub fn shared_secret(&self) -> Result<Arc<[u8]>> {
        if self.secret.len() < MIN_SECRET_LEN {
            bail!(
                "legacy TACACS+ requires a shared secret of at least {} bytes",
                MIN_SECRET_LEN
            );
        }
        Ok(Arc::from(self.secret.as_bytes()))
    }
}

fn load_crypter_config(path: &Path) -> Result<CrypterConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["tacwire-server", "--secret", "tac_plus_key"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let args = args(&[]);
        assert_eq!(args.listen, "0.0.0.0:49".parse().unwrap());
        assert_eq!(args.log_format, LogFormat::Text);
        assert_eq!(args.crypter_config().unwrap(), CrypterConfig::default());
    }

    #[test]
    fn file_values_are_used() {
        let file = config_file(r#"{"max_body_length": 4096, "proxy": true}"#);
        let args = args(&["--config", file.path().to_str().unwrap()]);
        let config = args.crypter_config().unwrap();
        assert_eq!(config.max_body_length, 4096);
        assert!(config.proxy);
    }

    #[test]
    fn flags_override_file() {
        let file = config_file(r#"{"max_body_length": 4096}"#);
        let args = args(&[
            "--config",
            file.path().to_str().unwrap(),
            "--max-body-length",
            "128",
            "--proxy",
        ]);
        let config = args.crypter_config().unwrap();
        assert_eq!(config.max_body_length, 128);
        assert!(config.proxy);
    }

    #[test]
    fn malformed_file_is_reported() {
        let file = config_file("{ not json");
        let args = args(&["--config", file.path().to_str().unwrap()]);
        let err = args.crypter_config().unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn missing_file_is_reported() {
        let args = args(&["--config", "/nonexistent/tacwire.json"]);
        let err = args.crypter_config().unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn short_secret_is_refused() {
        let args = Args::try_parse_from(["tacwire-server", "--secret", "short"]).unwrap();
        assert!(args.shared_secret().is_err());
        let ok = self::args(&[]).shared_secret().unwrap();
        assert_eq!(&*ok, b"tac_plus_key");
    }

    #[test]
    fn secret_is_required() {
        assert!(Args::try_parse_from(["tacwire-server"]).is_err());
    }

    #[test]
    fn json_log_format_parses() {
        let args = args(&["--log-format", "json", "--reject-message", "go away"]);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.reject_message, "go away");
    }
}
