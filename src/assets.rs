//! Binary Asset Resolution
//!
//! Catalog items can carry several image variants (per-platform revisions,
//! style variants). This module classifies raw blobs by magic bytes, extracts
//! numeric version tokens from asset filenames, and picks the "latest"
//! variant so handlers can attach exactly one image per item.
//!
//! ## Responsibilities
//! - **MIME sniffing**: best-effort classification from leading bytes, not a
//!   format parser.
//! - **Version selection**: numeric, component-wise comparison of dotted
//!   version tokens (`icon_10` beats `icon_9`, unlike string ordering).
//! - **Transport**: base64 data-URI encoding so images embed directly in a
//!   JSON response.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

/// Fallback type when no signature matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Classifies an image blob by its leading bytes.
///
/// Recognizes SVG (text marker), WebP (RIFF container), PNG and JPEG.
/// Anything else falls back to [`OCTET_STREAM`].
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    // SVG is text; the marker can sit after an XML prolog, so scan a short
    // prefix rather than only byte 0.
    let head = &bytes[..bytes.len().min(256)];
    if head.starts_with(b"<svg") || contains(head, b"<svg") {
        return "image/svg+xml";
    }
    if bytes.starts_with(b"RIFF") {
        return "image/webp";
    }
    if bytes.starts_with(&[0x89]) && bytes.len() >= 4 && &bytes[1..4] == b"PNG" {
        return "image/png";
    }
    if bytes.starts_with(&[0xFF, 0xD8]) || contains(head, b"JFIF") || contains(head, b"Exif") {
        return "image/jpeg";
    }
    OCTET_STREAM
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Encodes a blob as a `data:` URI with its sniffed MIME type.
pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), BASE64.encode(bytes))
}

/// The common filename convention: a dash- or underscore-delimited dotted
/// number right before the file extension (`apple_15.4.png`, `icon-10.webp`).
pub fn trailing_version_pattern() -> Regex {
    Regex::new(r"[-_](\d+(?:\.\d+)*)\.[A-Za-z0-9]+$").expect("valid version pattern")
}

/// Extracts the version token from a filename as a sequence of integers.
///
/// `pattern` must expose the dotted number as capture group 1. Returns `None`
/// when the filename does not match; such assets sort below every versioned
/// one.
pub fn extract_version(filename: &str, pattern: &Regex) -> Option<Vec<u64>> {
    let captures = pattern.captures(filename)?;
    let token = captures.get(1)?.as_str();
    Some(
        token
            .split('.')
            .map(|component| component.parse::<u64>().unwrap_or(0))
            .collect(),
    )
}

/// Compares two version sequences component-wise, padding the shorter one
/// with zeros (`1.2` == `1.2.0`, `10` > `9`).
pub fn compare_versions(a: &[u64], b: &[u64]) -> std::cmp::Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// Returns the index of the candidate with the numerically greatest version
/// token. Ties (including "no token at all") go to the first-seen candidate.
pub fn latest_index<'a, I>(filenames: I, pattern: &Regex) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, Vec<u64>)> = None;

    for (index, name) in filenames.into_iter().enumerate() {
        let version = extract_version(name, pattern).unwrap_or_default();
        match &best {
            Some((_, current))
                if compare_versions(&version, current) != std::cmp::Ordering::Greater => {}
            _ => best = Some((index, version)),
        }
    }

    best.map(|(index, _)| index)
}
