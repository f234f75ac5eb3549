//! Attachment content

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::{
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

use super::{payload_from_value, payload_to_value, ContentVariant};

/// Kind of media carried by an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Audio,
    File,
    Image,
    Link,
    Video,
}

impl MediaType {
    pub const ALL: [&'static str; 5] = ["Audio", "File", "Image", "Link", "Video"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "Audio",
            MediaType::File => "File",
            MediaType::Image => "Image",
            MediaType::Link => "Link",
            MediaType::Video => "Video",
        }
    }

    /// Derive the media type from a MIME type, an empty MIME type is a link
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "" => MediaType::Link,
            mime if mime.starts_with("audio") => MediaType::Audio,
            mime if mime.starts_with("image") => MediaType::Image,
            mime if mime.starts_with("video") => MediaType::Video,
            _ => MediaType::File,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Audio" => Ok(MediaType::Audio),
            "File" => Ok(MediaType::File),
            "Image" => Ok(MediaType::Image),
            "Link" => Ok(MediaType::Link),
            "Video" => Ok(MediaType::Video),
            other => Err(CodecError::invalid_type(other, &MediaType::ALL)),
        }
    }
}

/// Metadata of a downloadable resource an attachment is built from
#[derive(Debug, Clone, Default)]
pub struct MediaDescriptor {
    pub mime: String,
    pub name: String,
    pub url: Option<Url>,
    pub length: u64,
}

/// A media attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentContent {
    pub id: Option<String>,
    pub media_type: MediaType,
    pub url: Option<Url>,
    pub mime: Option<String>,
    pub filename: Option<String>,
    pub length: Option<u64>,
    pub text: Option<String>,
    pub sha256: Option<String>,
}

impl AttachmentContent {
    pub fn new(media_type: MediaType, url: Option<Url>) -> Self {
        Self {
            id: None,
            media_type,
            url,
            mime: None,
            filename: None,
            length: None,
            text: None,
            sha256: None,
        }
    }

    /// Copy of this attachment describing `content`
    ///
    /// The media type follows the MIME type. Non-link attachments without a
    /// name get a generated filename such as `audio-<id>.mp3`.
    pub fn with_content(&self, content: &MediaDescriptor) -> Self {
        let media_type = MediaType::from_mime(&content.mime);
        let mut filename = non_empty(&content.name);

        if media_type != MediaType::Link && filename.is_none() {
            let extension = if content.mime == "audio/mpeg" {
                ".mp3".to_string()
            } else if let Some(extension) = extension_for_mime(&content.mime) {
                extension.to_string()
            } else {
                content.url.as_ref().map(url_extension).unwrap_or_default()
            };
            filename = Some(format!(
                "{}-{}{}",
                media_type.as_str().to_lowercase(),
                Uuid::now_v7().simple(),
                extension
            ));
        }

        Self {
            media_type,
            url: content.url.clone(),
            mime: non_empty(&content.mime),
            filename,
            length: (content.length > 0).then_some(content.length),
            ..self.clone()
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn url_extension(url: &Url) -> String {
    let last = url.path().rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(index) if index > 0 => last[index..].to_string(),
        _ => String::new(),
    }
}

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("application/json", ".json"),
    ("application/msword", ".doc"),
    ("application/pdf", ".pdf"),
    ("application/vnd.ms-excel", ".xls"),
    ("application/vnd.ms-powerpoint", ".ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/xml", ".xml"),
    ("application/zip", ".zip"),
    ("audio/aac", ".aac"),
    ("audio/mp4", ".m4a"),
    ("audio/ogg", ".ogg"),
    ("audio/wav", ".wav"),
    ("audio/webm", ".weba"),
    ("image/bmp", ".bmp"),
    ("image/gif", ".gif"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/svg+xml", ".svg"),
    ("image/tiff", ".tiff"),
    ("image/webp", ".webp"),
    ("text/csv", ".csv"),
    ("text/html", ".html"),
    ("text/plain", ".txt"),
    ("video/mp4", ".mp4"),
    ("video/mpeg", ".mpeg"),
    ("video/ogg", ".ogv"),
    ("video/quicktime", ".mov"),
    ("video/webm", ".webm"),
];

/// First known file extension for a MIME type, parameters are ignored
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    MIME_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(essence))
        .map(|(_, extension)| *extension)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    media_type: String,
    #[serde(default, with = "crate::protocol::scalar::url_opt")]
    url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(
        default,
        rename = "contentSizeBytes",
        skip_serializing_if = "Option::is_none"
    )]
    length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

impl From<&AttachmentContent> for AttachmentWire {
    fn from(attachment: &AttachmentContent) -> Self {
        Self {
            id: attachment.id.clone(),
            media_type: attachment.media_type.to_string(),
            url: attachment.url.clone(),
            mime: attachment.mime.clone(),
            filename: attachment.filename.clone(),
            length: attachment.length,
            text: attachment.text.clone(),
            sha256: attachment.sha256.clone(),
        }
    }
}

impl TryFrom<AttachmentWire> for AttachmentContent {
    type Error = CodecError;

    fn try_from(wire: AttachmentWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            media_type: wire.media_type.parse()?,
            url: wire.url,
            mime: wire.mime,
            filename: wire.filename,
            length: wire.length,
            text: wire.text,
            sha256: wire.sha256,
        })
    }
}

impl AttachmentContent {
    /// Encode only the attachment payload, shared with notification headers
    pub(crate) fn payload(&self) -> CodecResult<Value> {
        payload_to_value(&AttachmentWire::from(self))
    }

    pub(crate) fn from_payload(payload: Value) -> CodecResult<Self> {
        payload_from_value::<AttachmentWire>(payload)?.try_into()
    }
}

impl ContentVariant for AttachmentContent {
    const CONTENT_TYPE: &'static str = "Attachment";
    const KEY: &'static str = "attachment";

    fn encode_payload(&self) -> CodecResult<Value> {
        self.payload()
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        Self::from_payload(payload)
    }
}
