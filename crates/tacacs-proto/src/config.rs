// SPDX-License-Identifier: AGPL-3.0-only
//! Per-listener framing settings shared by every `Crypter`.

use serde::{Deserialize, Serialize};

/// Framing limits and preamble handling for one listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrypterConfig {
    /// Largest body a peer may declare; larger frames fail before allocation.
    #[serde(default = "default_max_body_length")]
    pub max_body_length: u32,

    /// Strip a NUL-terminated proxy preamble before each frame.
    #[serde(default)]
    pub proxy: bool,
}

impl Default for CrypterConfig {
    fn default() -> Self {
        Self {
            max_body_length: default_max_body_length(),
            proxy: false,
        }
    }
}

fn default_max_body_length() -> u32 {
    crate::MAX_BODY_LENGTH
}
