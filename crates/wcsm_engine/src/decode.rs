use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
///
/// Malformed sequences are an error.
pub fn decode_text(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedText, DecodeError> {
    let enc = pick_encoding(bytes, content_type);
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
            message: "malformed byte sequence".into(),
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding_label: enc.name().to_string(),
    })
}

/// Same encoding choice as [`decode_text`], malformed sequences become U+FFFD.
pub fn decode_text_lossy(bytes: &[u8], content_type: Option<&str>) -> String {
    let enc = pick_encoding(bytes, content_type);
    enc.decode(bytes).0.into_owned()
}

fn pick_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(enc) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return enc;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]))
    })
}
