//! Response classification.
//!
//! Checks run in a fixed order and the first failure wins: status line
//! token, status code range, header terminator, then (health only) the
//! JSON body.

use regex::Regex;
use serde_json::{Map, Value};

use super::transport::MAX_RESPONSE_BYTES;
use crate::core::error::ProtocolError;

/// Bytes searched for the blank line that ends the header block.
pub const HEADER_SCAN_LIMIT: usize = 4096;

const PROTOCOL_TOKEN: &str = "HTTP/";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A response that passed classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub status: u16,
    /// Parsed health document; `None` for trigger requests.
    pub health: Option<Map<String, Value>>,
}

pub struct ResponseClassifier {
    status_regex: Regex,
}

impl ResponseClassifier {
    pub fn new() -> Self {
        // Pattern: HTTP/1.1 200 OK
        let status_regex = Regex::new(r"^HTTP/\d+(?:\.\d+)? (\d{3})(?:\s|$)")
            .expect("Invalid status line regex");
        Self { status_regex }
    }

    /// Classify a raw response. `expect_body` is set for health requests.
    pub fn classify(&self, raw: &[u8], expect_body: bool) -> Result<Delivery, ProtocolError> {
        let line = status_line(raw);
        if !line.starts_with(PROTOCOL_TOKEN) {
            return Err(ProtocolError::InvalidStatusLine { line });
        }

        let status = self
            .status_regex
            .captures(&line)
            .and_then(|caps| caps.get(1))
            .and_then(|code| code.as_str().parse::<u16>().ok())
            .ok_or_else(|| ProtocolError::InvalidStatusLine { line: line.clone() })?;

        if !(200..300).contains(&status) {
            return Err(ProtocolError::UnexpectedStatus(status));
        }

        let scan = &raw[..raw.len().min(HEADER_SCAN_LIMIT)];
        let header_end = find(scan, HEADER_TERMINATOR).ok_or(ProtocolError::MalformedHeaders {
            limit: HEADER_SCAN_LIMIT,
        })?;

        if !expect_body {
            return Ok(Delivery {
                status,
                health: None,
            });
        }

        let headers = String::from_utf8_lossy(&raw[..header_end]);
        let body = &raw[header_end + HEADER_TERMINATOR.len()..];
        let body = if is_chunked(&headers) {
            decode_chunked(body).ok_or_else(|| ProtocolError::BadBody {
                details: "malformed chunked encoding".to_string(),
            })?
        } else {
            body.to_vec()
        };

        let document: Map<String, Value> =
            serde_json::from_slice(&body).map_err(|e| ProtocolError::BadBody {
                details: e.to_string(),
            })?;

        Ok(Delivery {
            status,
            health: Some(document),
        })
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of the response, without its line ending.
fn status_line(raw: &[u8]) -> String {
    let scan = &raw[..raw.len().min(HEADER_SCAN_LIMIT)];
    let end = scan.iter().position(|&b| b == b'\n').unwrap_or(scan.len());
    String::from_utf8_lossy(&scan[..end])
        .trim_end_matches('\r')
        .to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn is_chunked(headers: &str) -> bool {
    headers.lines().skip(1).any(|line| {
        line.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("transfer-encoding")
                && value.trim().eq_ignore_ascii_case("chunked")
        })
    })
}

/// Decode a `Transfer-Encoding: chunked` body. Trailers are ignored.
fn decode_chunked(mut body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let line_end = find(body, b"\r\n")?;
        let size_line = std::str::from_utf8(&body[..line_end]).ok()?;
        let size_hex = size_line.split(';').next()?.trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        // No chunk can be larger than what the transport reads back.
        if size > MAX_RESPONSE_BYTES {
            return None;
        }
        let chunk_end = size.checked_add(2)?;
        if body.len() < chunk_end {
            return None;
        }
        out.extend_from_slice(&body[..size]);
        body = &body[chunk_end..];
    }
}
