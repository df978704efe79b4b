// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RFC 2397 data URLs: the transport encoding for every uploaded or
// rendered asset.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, StampwerkError};

const DEFAULT_MIME: &str = "text/plain";

/// A parsed data URL: media type plus decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Format `bytes` as a base64 data URL with an explicit media type.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
    }

    /// Parse a `data:` URL. Both base64 and percent-encoded payloads are
    /// accepted; media type parameters other than `base64` are dropped.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| StampwerkError::InvalidDataUrl("missing `data:` scheme".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| StampwerkError::InvalidDataUrl("missing `,` separator".into()))?;

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|err| StampwerkError::InvalidDataUrl(format!("bad base64 payload: {err}")))?
        } else {
            percent_decode(payload)?
        };

        let mime_type = if mime.is_empty() { DEFAULT_MIME } else { mime };
        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            bytes,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Self::encode(&self.mime_type, &self.bytes))
    }
}

fn percent_decode(payload: &str) -> Result<Vec<u8>> {
    let raw = payload.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = raw
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| StampwerkError::InvalidDataUrl(format!("bad escape at byte {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_explicit_media_type() {
        let url = DataUrl::encode("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.mime_type(), "image/png");
        assert_eq!(parsed.bytes(), &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn percent_encoded_payload() {
        let parsed = DataUrl::parse("data:,Hello%2C%20World").unwrap();
        assert_eq!(parsed.mime_type(), "text/plain");
        assert_eq!(parsed.bytes(), b"Hello, World");
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            DataUrl::parse("https://example.com/a.png"),
            Err(StampwerkError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64"),
            Err(StampwerkError::InvalidDataUrl(_))
        ));
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn base64_payload_tolerates_line_breaks() {
        let parsed = DataUrl::parse("data:text/plain;base64,aGVs\nbG8=").unwrap();
        assert_eq!(parsed.bytes(), b"hello");
    }
}
