//! Reading text files of unknown encoding.
//!
//! Files dropped into the vault inbox come from anywhere: exported notes,
//! spreadsheets saved by old office suites, transcripts with a BOM. Reads try
//! strict UTF-8 first, honour byte-order marks, and fall back to `chardetng`
//! detection with replacement characters.

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::path::Path;

const SAMPLE_SIZE: usize = 8192;

/// Decoded text plus the label of the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Read `path` as text, keeping at most `max_chars` characters when given.
pub fn read_text(path: &Path, max_chars: Option<usize>) -> Result<DecodedText> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut decoded = decode(&bytes);
    if let Some(limit) = max_chars {
        if let Some((idx, _)) = decoded.text.char_indices().nth(limit) {
            decoded.text.truncate(idx);
        }
    }
    Ok(decoded)
}

/// Decode raw bytes: BOM, then strict UTF-8, then the detector's best guess.
pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText { text: text.into_owned(), encoding: encoding.name() };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText { text: text.to_string(), encoding: UTF_8.name() };
    }

    let encoding = detect(bytes);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "decoded with replacement characters");
    }
    DecodedText { text: text.into_owned(), encoding: encoding.name() }
}

fn detect(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    let guess = detector.guess(None, true);
    // The detector never reports UTF-16; without a BOM those bytes look binary.
    if guess == UTF_16LE || guess == UTF_16BE {
        UTF_8
    } else {
        guess
    }
}

/// Heuristic binary check on the leading bytes: any NUL, or fewer than 70%
/// printable ASCII bytes.
pub fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r'))
        .count();
    (printable as f64 / sample.len() as f64) < 0.70
}
