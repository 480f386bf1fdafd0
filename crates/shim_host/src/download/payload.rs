//! Save request model and payload normalization.

/// UTF-8 encoding of U+FEFF.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// MIME type of opaque binary payloads.
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One "save this blob as a file" call from the hosted application.
pub struct SaveRequest {
    /// Payload bytes.
    pub bytes: Vec<u8>,
    /// Declared MIME type, including parameters such as `charset`.
    pub mime_type: String,
    /// Suggested filename; empty means "use the default".
    pub filename: String,
    /// Skips text normalization when set.
    pub is_binary: bool,
}

impl SaveRequest {
    /// Builds a binary `application/octet-stream` request, the shape the hosted application uses
    /// for cartridges and exports.
    pub fn binary(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: OCTET_STREAM.to_string(),
            filename: filename.into(),
            is_binary: true,
        }
    }

    /// Builds a text request with an explicit MIME type.
    pub fn text(
        text: impl Into<String>,
        mime_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: text.into().into_bytes(),
            mime_type: mime_type.into(),
            filename: filename.into(),
            is_binary: false,
        }
    }

    /// Returns the filename to offer, falling back to `default` when blank.
    pub fn resolved_filename(&self, default: &str) -> String {
        if self.filename.trim().is_empty() {
            default.to_string()
        } else {
            self.filename.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bytes and MIME type actually handed to the platform.
pub struct SavePayload {
    /// Possibly BOM-prefixed bytes.
    pub bytes: Vec<u8>,
    /// Declared MIME type.
    pub mime_type: String,
}

impl SavePayload {
    /// Takes the request payload as-is.
    pub fn raw(request: SaveRequest) -> Self {
        Self {
            bytes: request.bytes,
            mime_type: request.mime_type,
        }
    }

    /// Takes the request payload, prefixing a UTF-8 BOM to non-binary UTF-8 text.
    pub fn normalized(request: SaveRequest) -> Self {
        if request.is_binary || !declares_utf8_text(&request.mime_type) {
            return Self::raw(request);
        }
        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + request.bytes.len());
        bytes.extend_from_slice(&UTF8_BOM);
        bytes.extend_from_slice(&request.bytes);
        Self {
            bytes,
            mime_type: request.mime_type,
        }
    }

    /// Returns whether the payload is an opaque binary blob.
    pub fn is_octet_stream(&self) -> bool {
        self.mime_type == OCTET_STREAM
    }
}

/// Returns whether `mime_type` is a textual type that declares `charset=utf-8`.
///
/// Textual means `text/*`, `application/xml`, or any `*/*+xml`. The essence must be followed by
/// a `;` and the charset parameter may appear anywhere after it. Matching is case-insensitive.
pub fn declares_utf8_text(mime_type: &str) -> bool {
    let lowered = mime_type.to_ascii_lowercase();
    let Some((essence, params)) = lowered.split_once(';') else {
        return false;
    };
    let essence = essence.trim();
    if essence.chars().any(char::is_whitespace) {
        return false;
    }
    let textual = essence.starts_with("text/")
        || essence == "application/xml"
        || (essence.contains('/') && essence.ends_with("+xml"));
    textual && declares_utf8_charset(params)
}

fn declares_utf8_charset(params: &str) -> bool {
    params.match_indices("charset").any(|(at, name)| {
        let rest = params[at + name.len()..].trim_start();
        rest.strip_prefix('=')
            .is_some_and(|value| value.trim_start().starts_with("utf-8"))
    })
}

/// Rewrites the media type of a `data:` URI to `attachment/file` so the browser downloads it
/// instead of rendering it.
pub fn data_uri_as_attachment(uri: &str) -> String {
    match uri.strip_prefix("data:").and_then(|rest| rest.split_once(';')) {
        Some((_, tail)) => format!("data:attachment/file;{tail}"),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_text_types_are_detected() {
        assert!(declares_utf8_text("text/plain;charset=utf-8"));
        assert!(declares_utf8_text("TEXT/CSV; Charset = UTF-8"));
        assert!(declares_utf8_text("application/xml; charset=utf-8"));
        assert!(declares_utf8_text("image/svg+xml;foo=bar; charset=utf-8"));
        assert!(declares_utf8_text("  text/x-lua ;charset=utf-8"));
    }

    #[test]
    fn non_text_or_non_utf8_types_are_left_alone() {
        assert!(!declares_utf8_text("text/plain"));
        assert!(!declares_utf8_text("text/plain;charset=iso-8859-1"));
        assert!(!declares_utf8_text("application/json;charset=utf-8"));
        assert!(!declares_utf8_text("application/octet-stream"));
        assert!(!declares_utf8_text("text plain;charset=utf-8"));
        assert!(!declares_utf8_text(""));
    }

    #[test]
    fn normalization_prefixes_bom_only_for_text() {
        let text = SavePayload::normalized(SaveRequest::text(
            "print('hi')",
            "text/plain;charset=utf-8",
            "cart.lua",
        ));
        assert_eq!(&text.bytes[..3], &UTF8_BOM);
        assert_eq!(&text.bytes[3..], b"print('hi')");

        let mut flagged = SaveRequest::text("abc", "text/plain;charset=utf-8", "a.txt");
        flagged.is_binary = true;
        assert_eq!(SavePayload::normalized(flagged).bytes, b"abc");

        let binary = SavePayload::normalized(SaveRequest::binary(vec![1, 2, 3], "cart.tic"));
        assert_eq!(binary.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn blank_filename_falls_back_to_default() {
        assert_eq!(
            SaveRequest::binary(Vec::new(), "  ").resolved_filename("download"),
            "download"
        );
        assert_eq!(
            SaveRequest::binary(Vec::new(), "game.tic").resolved_filename("download"),
            "game.tic"
        );
    }

    #[test]
    fn data_uri_media_type_is_rewritten() {
        assert_eq!(
            data_uri_as_attachment("data:application/octet-stream;base64,AQID"),
            "data:attachment/file;base64,AQID"
        );
        assert_eq!(data_uri_as_attachment("blob:abc"), "blob:abc");
    }
}
