#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Where a record's QR image lives. Rendering QR codes is not done here; a
/// `data:` reference already carries the encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrReference {
    DataUrl { mime: String, bytes: Vec<u8> },
    Remote(String),
}

impl QrReference {
    /// `None` for blank references. A `data:` URL that fails to decode is kept as
    /// a plain reference.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(decode_data_url(raw).unwrap_or_else(|| QrReference::Remote(raw.to_string())))
    }

    pub fn png_bytes(&self) -> Option<&[u8]> {
        match self {
            QrReference::DataUrl { mime, bytes } if mime == "image/png" => Some(bytes),
            _ => None,
        }
    }
}

fn decode_data_url(raw: &str) -> Option<QrReference> {
    let rest = raw.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = BASE64.decode(payload.trim().as_bytes()).ok()?;
    let mime = if mime.is_empty() {
        "text/plain".to_string()
    } else {
        mime.to_ascii_lowercase()
    };
    Some(QrReference::DataUrl { mime, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_qr_01_png_data_url_decodes() {
        let qr = QrReference::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(
            qr.png_bytes(),
            Some(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a][..])
        );
    }

    #[test]
    fn at_qr_02_plain_urls_and_bad_payloads_stay_remote() {
        assert_eq!(
            QrReference::parse("https://cdn.example.com/qr/PAL-1.png"),
            Some(QrReference::Remote(
                "https://cdn.example.com/qr/PAL-1.png".to_string()
            ))
        );
        let bad = QrReference::parse("data:image/png;base64,@@@").unwrap();
        assert!(matches!(bad, QrReference::Remote(_)));
        assert!(bad.png_bytes().is_none());
    }

    #[test]
    fn at_qr_03_blank_reference_is_none() {
        assert_eq!(QrReference::parse("  "), None);
    }
}
