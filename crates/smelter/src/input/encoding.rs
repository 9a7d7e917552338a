//! Text encoding resolution for legacy-encoded exports.
//!
//! Chanmama/Douyin exports arrive as UTF-8 (with or without BOM), GBK,
//! GB2312 or GB18030. Legacy CJK encodings can decode arbitrary byte
//! sequences without raising, silently producing mojibake, so a decode
//! succeeding is not enough: the resolver also requires the decoded text
//! to contain at least one token expected in this file family before it
//! trusts a candidate.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030, GBK, UTF_8};

use crate::error::{Result, SmelterError};

/// Bytes sampled from the head of a document for detection.
const SAMPLE_LEN: usize = 10 * 1024;

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Tokens expected somewhere near the top of this file family.
const PLAUSIBILITY_TOKENS: &[&str] = &["商品", "销量", "榜", "库", "抖音"];

/// Outcome of encoding resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEncoding {
    /// Canonical name of the winning encoding ("utf-8-sig" when a BOM
    /// was present).
    pub name: String,
    /// Whether the plausibility check passed. False means the winner
    /// merely decoded without error.
    pub plausible: bool,
    encoding: &'static Encoding,
    bom: bool,
}

impl ResolvedEncoding {
    /// Decode a full document with the resolved encoding.
    ///
    /// Malformed sequences outside the validated sample are replaced
    /// rather than rejected, so this never fails once resolution
    /// succeeded.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> std::borrow::Cow<'a, str> {
        let body = if self.bom { &bytes[UTF8_BOM.len()..] } else { bytes };
        let (text, _, _) = self.encoding.decode(body);
        text
    }
}

/// Resolves the text encoding of a raw document.
///
/// Tries a fixed priority ladder (UTF-8 with BOM handling, UTF-8, GBK,
/// GB18030) with a statistical detector's best guess appended last.
/// GB2312 is not listed separately: it is an alias of GBK in the WHATWG
/// encoding table, and GBK decodes a superset of it.
pub struct EncodingResolver {
    candidates: Vec<&'static Encoding>,
}

impl EncodingResolver {
    /// Create a resolver with the default candidate ladder.
    pub fn new() -> Self {
        Self {
            candidates: vec![UTF_8, GBK, GB18030],
        }
    }

    /// Resolve the encoding of `bytes` without mutating them.
    ///
    /// First candidate that both decodes the sample and contains a
    /// plausibility token wins; failing that, the first that merely
    /// decodes wins; failing that, resolution is an error.
    pub fn resolve(&self, bytes: &[u8]) -> Result<ResolvedEncoding> {
        let bom = bytes.starts_with(UTF8_BOM);
        let body = if bom { &bytes[UTF8_BOM.len()..] } else { bytes };
        let truncated = body.len() > SAMPLE_LEN;
        let sample = &body[..body.len().min(SAMPLE_LEN)];

        let mut candidates = self.candidates.clone();
        let guess = Self::statistical_guess(sample, !truncated);
        if !candidates.contains(&guess) {
            candidates.push(guess);
        }

        let mut decode_only: Option<&'static Encoding> = None;
        for encoding in candidates {
            let Some(text) = decode_sample(encoding, sample, truncated) else {
                continue;
            };
            if PLAUSIBILITY_TOKENS.iter().any(|t| text.contains(t)) {
                return Ok(Self::resolved(encoding, bom, true));
            }
            if decode_only.is_none() {
                decode_only = Some(encoding);
            }
        }

        if let Some(encoding) = decode_only {
            tracing::warn!(
                "no plausibility keyword found; falling back to first decodable encoding '{}'",
                encoding.name()
            );
            return Ok(Self::resolved(encoding, bom, false));
        }

        Err(SmelterError::EncodingResolution(
            "no candidate encoding decodes the document".to_string(),
        ))
    }

    fn statistical_guess(sample: &[u8], is_complete: bool) -> &'static Encoding {
        let mut detector = EncodingDetector::new();
        detector.feed(sample, is_complete);
        detector.guess(None, true)
    }

    fn resolved(encoding: &'static Encoding, bom: bool, plausible: bool) -> ResolvedEncoding {
        let name = if bom && encoding == UTF_8 {
            "utf-8-sig".to_string()
        } else {
            encoding.name().to_ascii_lowercase()
        };
        ResolvedEncoding {
            name,
            plausible,
            encoding,
            bom: bom && encoding == UTF_8,
        }
    }
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Strictly decode the sample, returning None on any malformed sequence.
///
/// When the sample was cut out of a longer document, the cut may split a
/// multibyte character; back off up to 3 trailing bytes before giving up
/// on an otherwise-valid candidate.
fn decode_sample(encoding: &'static Encoding, sample: &[u8], truncated: bool) -> Option<String> {
    let max_backoff = if truncated { 3.min(sample.len()) } else { 0 };
    for cut in 0..=max_backoff {
        let slice = &sample[..sample.len() - cut];
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(slice) {
            return Some(text.into_owned());
        }
    }
    None
}
