use base64::{engine::general_purpose, Engine};
use std::path::Path;

use crate::error::ImageError;

/// A meal photo picked by the user, before encoding.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// A parsed `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl<'a> {
    pub mime_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    pub fn parse(url: &'a str) -> Result<Self, ImageError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::Malformed("expected a data: URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::Malformed("missing payload separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::Malformed("payload is not base64".to_string()))?;

        Ok(Self { mime_type, payload })
    }

    /// Size of the decoded payload, computed without decoding it.
    pub fn decoded_len(&self) -> u64 {
        let len = self.payload.len() as u64;
        if len % 4 == 0 {
            let padding = self.payload.bytes().rev().take_while(|b| *b == b'=').count() as u64;
            (len / 4) * 3 - padding.min(2)
        } else {
            // unpadded tail: 2 chars carry 1 byte, 3 chars carry 2
            (len / 4) * 3 + (len % 4).saturating_sub(1)
        }
    }
}

/// Validates meal photos and turns them into data URLs.
///
/// The same limit applies to files encoded in-process and to data URLs
/// received over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct ImageEncoder {
    max_bytes: Option<u64>,
}

impl ImageEncoder {
    pub fn new(max_bytes: Option<u64>) -> Self {
        Self { max_bytes }
    }

    fn check(&self, mime_type: &str, size: u64) -> Result<(), ImageError> {
        if !mime_type.starts_with("image/") {
            return Err(ImageError::InvalidType);
        }
        match self.max_bytes {
            Some(limit) if size > limit => Err(ImageError::TooLarge { size, limit }),
            _ => Ok(()),
        }
    }

    pub fn encode(&self, file: &ImageFile) -> Result<String, ImageError> {
        self.check(&file.mime_type, file.bytes.len() as u64)?;
        let base64_image = general_purpose::STANDARD.encode(&file.bytes);
        Ok(format!("data:{};base64,{}", file.mime_type, base64_image))
    }

    /// Read a photo from disk, deriving the MIME type from its extension.
    pub async fn encode_path(&self, path: impl AsRef<Path>) -> Result<String, ImageError> {
        let path = path.as_ref();
        let mime_type = mime_from_extension(path).ok_or(ImageError::InvalidType)?;

        // Reject oversized files before reading them.
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ImageError::Malformed(e.to_string()))?;
        self.check(mime_type, metadata.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImageError::Malformed(e.to_string()))?;
        log::debug!("📊 Image file size: {} bytes", bytes.len());

        self.encode(&ImageFile::new(mime_type, bytes))
    }

    /// Validate a data URL submitted by a client.
    pub fn inspect<'a>(&self, data_url: &'a str) -> Result<DataUrl<'a>, ImageError> {
        let parsed = DataUrl::parse(data_url)?;
        self.check(parsed.mime_type, parsed.decoded_len())?;
        Ok(parsed)
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
