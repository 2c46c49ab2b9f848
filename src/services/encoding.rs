use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub had_errors: bool,
}

pub fn read_text(path: &Path) -> Result<DecodedText> {
    let bytes = fs::read(path)
        .map_err(|e| CoreError::storage(format!("failed to read {}: {e}", path.display())))?;
    Ok(decode(&bytes))
}

/// BOM first, then strict UTF-8, then whatever chardetng guesses. Dictionary
/// exports from spreadsheets are regularly windows-1252.
pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: UTF_8.name(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    decode_with(encoding, bytes)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> DecodedText {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8() {
        let d = decode("{\"hello\": \"mbʉ́ nà\"}".as_bytes());
        assert_eq!(d.encoding, "UTF-8");
        assert!(d.text.contains("mbʉ́ nà"));
        assert!(!d.had_errors);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"{\"merci\": \"useko\"}");
        let d = decode(&bytes);
        assert_eq!(d.encoding, "UTF-8");
        assert!(d.text.starts_with('{'));
    }

    #[test]
    fn utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "{\"oui\": \"ee\"}".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let d = decode(&bytes);
        assert_eq!(d.encoding, "UTF-16LE");
        assert_eq!(d.text, "{\"oui\": \"ee\"}");
    }

    #[test]
    fn single_byte_export_is_detected() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(
            "{\"le café du garçon\": \"a\", \"la fenêtre de l'élève\": \"b\", \"été\": \"c\"}",
        );
        let d = decode(&bytes);
        assert!(d.text.contains("café"), "{d:?}");
        assert!(d.text.contains("garçon"), "{d:?}");
    }
}
