//! Syntactic validation of remote paths and server addresses.
//!
//! Nothing here touches the network or a filesystem. The FTP server stays
//! the authority on whether a path exists or may be accessed.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SanitizeError;

// Constant patterns; `patterns_compile` below keeps them valid.
static PATH_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9/_.\- ]*$").unwrap());

static REPEATED_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").unwrap());

static HOST_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

const MAX_HOST_LEN: usize = 253;

/// Validates user-supplied paths, hostnames and ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSanitizer;

impl PathSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw path and reject traversal or unexpected characters.
    ///
    /// Null bytes are stripped, `\` becomes `/` and runs of `/` collapse to
    /// one. Any `..` substring is refused, including inside a file name such
    /// as `notes..txt`. An empty path normalizes to `/`.
    pub fn sanitize(&self, raw: &str) -> Result<String, SanitizeError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| *c != '\0')
            .map(|c| if c == '\\' { '/' } else { c })
            .collect();
        let collapsed = REPEATED_SLASHES.replace_all(&cleaned, "/").into_owned();

        if collapsed.contains("..") {
            return Err(SanitizeError::Traversal(collapsed));
        }
        if !PATH_CHARS.is_match(&collapsed) {
            return Err(SanitizeError::InvalidCharacters(collapsed));
        }
        if collapsed.is_empty() {
            return Ok("/".to_string());
        }
        Ok(collapsed)
    }

    /// Accept IP literals and dot-separated DNS labels.
    pub fn is_valid_host(&self, host: &str) -> bool {
        if host.is_empty() || host.len() > MAX_HOST_LEN {
            return false;
        }
        if host.parse::<IpAddr>().is_ok() {
            return true;
        }
        host.trim_end_matches('.')
            .split('.')
            .all(|label| HOST_LABEL.is_match(label))
    }

    /// Ports must be in `1..=65535`; `u16` already bounds the top end.
    pub fn is_valid_port(&self, port: u16) -> bool {
        port != 0
    }
}

/// Join a parent directory and a child name with exactly one `/`.
pub fn join_remote(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    format!("{parent}/{name}")
}
