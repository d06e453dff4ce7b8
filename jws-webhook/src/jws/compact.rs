//! Compact JWS serialization with a detached payload.
//!
//! Webhook senders put `header..signature` in a header and leave the payload
//! out. The payload segment is rebuilt from the request body, so whatever the
//! sender placed between the dots is never used.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::error::VerifyError;

/// A compact JWS split into its three segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactJws {
    header: String,
    payload: String,
    signature: String,
}

impl CompactJws {
    /// Split `value` on `.`; anything other than exactly three segments is malformed.
    pub fn parse(value: &str) -> Result<Self, VerifyError> {
        let parts: Vec<&str> = value.split('.').collect();
        match parts.as_slice() {
            [header, payload, signature] => Ok(Self {
                header: header.to_string(),
                payload: payload.to_string(),
                signature: signature.to_string(),
            }),
            _ => Err(VerifyError::MalformedSignature {
                segments: parts.len(),
            }),
        }
    }

    /// Replace the payload segment with the encoding of `body`.
    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.payload = encode_payload(body);
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The bytes the signature covers: `header.payload`.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

impl fmt::Display for CompactJws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.header, self.payload, self.signature)
    }
}

/// Base64url-encode `body` without `=` padding.
pub fn encode_payload(body: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detached() {
        let jws = CompactJws::parse("aGVhZGVy..c2ln").unwrap();
        assert_eq!(jws.header(), "aGVhZGVy");
        assert_eq!(jws.payload(), "");
        assert_eq!(jws.signature(), "c2ln");
    }

    #[test]
    fn test_parse_wrong_segment_count() {
        for (value, expected) in [("", 1), ("abc", 1), ("a.b", 2), ("a.b.c.d", 4), ("a..b..c", 5)] {
            match CompactJws::parse(value) {
                Err(VerifyError::MalformedSignature { segments }) => {
                    assert_eq!(segments, expected, "value {value:?}")
                }
                other => panic!("expected malformed for {value:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_with_body_replaces_sent_payload() {
        let jws = CompactJws::parse("h.c2VudA.s").unwrap().with_body(b"{\"id\":1}");
        assert_eq!(jws.payload(), "eyJpZCI6MX0");
        assert_eq!(jws.to_string(), "h.eyJpZCI6MX0.s");
        assert_eq!(jws.signing_input(), "h.eyJpZCI6MX0");
    }

    #[test]
    fn test_encode_payload_strips_padding() {
        assert_eq!(encode_payload(b""), "");
        assert_eq!(encode_payload(b"a"), "YQ");
        assert_eq!(encode_payload(b"ab"), "YWI");
        assert_eq!(encode_payload(b"abc"), "YWJj");
        // URL-safe alphabet
        assert_eq!(encode_payload(&[0xfb, 0xff]), "-_8");
    }
}
