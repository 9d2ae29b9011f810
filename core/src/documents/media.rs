use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Jpeg => "jpeg",
            MediaType::Png => "png",
        }
    }

    pub fn sniff(bytes: &[u8]) -> Option<MediaType> {
        if bytes.starts_with(b"%PDF-") {
            Some(MediaType::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(MediaType::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(MediaType::Jpeg)
        } else {
            None
        }
    }

    pub fn from_filename(filename: &str) -> Option<MediaType> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(MediaType::Pdf),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }
}

/// Content decides the media type; a filename, when given, must agree with it.
pub fn detect_media_type(bytes: &[u8], filename: Option<&str>) -> CoreResult<MediaType> {
    let sniffed = MediaType::sniff(bytes).ok_or_else(|| {
        CoreError::InvalidInput("unsupported media: expected PDF, JPEG or PNG content".to_string())
    })?;
    if let Some(name) = filename {
        match MediaType::from_filename(name) {
            Some(declared) if declared == sniffed => {}
            Some(declared) => {
                return Err(CoreError::InvalidInput(format!(
                    "file extension suggests {:?} but content is {:?}",
                    declared, sniffed
                )))
            }
            None => {
                return Err(CoreError::InvalidInput(format!(
                    "file type not allowed: {} (allowed: .pdf, .png, .jpg, .jpeg)",
                    name
                )))
            }
        }
    }
    Ok(sniffed)
}
