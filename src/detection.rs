//! Detección del tipo real de archivo a partir de su firma.
//!
//! La extensión del nombre nunca se consulta: un PDF renombrado a `.jpg`
//! sigue siendo un PDF.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const HEADER_LEN: u64 = 8192;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const ARCHIVE_MIMES: [&str; 9] = [
    "application/zip",
    "application/x-tar",
    "application/gzip",
    "application/x-bzip2",
    "application/x-xz",
    "application/zstd",
    "application/x-7z-compressed",
    "application/vnd.rar",
    "application/epub+zip",
];

const LEGACY_OFFICE_MIMES: [&str; 3] = [
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
];

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Image,
    Pdf,
    Audio,
    Video,
    OfficeDocument,
    Archive,
    Unknown,
}

impl FileKind {
    /// Clasifica un tipo MIME ya detectado.
    pub fn from_mime(mime: &str) -> Self {
        if mime == "application/pdf" {
            FileKind::Pdf
        } else if mime.starts_with("image/") {
            FileKind::Image
        } else if mime.starts_with("audio/") {
            FileKind::Audio
        } else if mime.starts_with("video/") {
            FileKind::Video
        } else if is_ooxml(mime) || is_odf(mime) || LEGACY_OFFICE_MIMES.contains(&mime) {
            FileKind::OfficeDocument
        } else if ARCHIVE_MIMES.contains(&mime) {
            FileKind::Archive
        } else {
            FileKind::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::OfficeDocument => "office-document",
            FileKind::Archive => "archive",
            FileKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Detection {
    pub kind: FileKind,
    pub mime: Option<String>,
}

impl Detection {
    pub fn new(kind: FileKind, mime: Option<String>) -> Self {
        Self { kind, mime }
    }

    pub fn unknown() -> Self {
        Self::new(FileKind::Unknown, None)
    }

    fn from_mime(mime: Option<String>) -> Self {
        match mime {
            Some(mime) => match FileKind::from_mime(&mime) {
                FileKind::Unknown => Self::unknown(),
                kind => Self::new(kind, Some(mime)),
            },
            None => Self::unknown(),
        }
    }
}

pub fn is_ooxml(mime: &str) -> bool {
    mime.starts_with("application/vnd.openxmlformats-officedocument.")
}

pub fn is_odf(mime: &str) -> bool {
    mime.starts_with("application/vnd.oasis.opendocument.")
}

/// Lee los primeros bytes del archivo y clasifica su contenido.
pub fn detect(path: &Path) -> Result<Detection, ExtractError> {
    let mut file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.by_ref()
        .take(HEADER_LEN)
        .read_to_end(&mut header)
        .map_err(|error| ExtractError::io(path, error))?;

    let inferred = infer::get(&header).map(|kind| kind.mime_type().to_string());
    let mime = match inferred.as_deref() {
        Some("application/zip") => refine_zip(file).or(inferred),
        None if header.starts_with(b"PK\x03\x04") => {
            refine_zip(file).or_else(|| Some("application/zip".to_string()))
        }
        _ => inferred,
    };

    let detection = Detection::from_mime(mime);
    debug!(
        path = %path.display(),
        kind = %detection.kind,
        mime = detection.mime.as_deref().unwrap_or("-"),
        "tipo detectado"
    );
    Ok(detection)
}

/// Distingue documentos OOXML y ODF de un ZIP genérico mirando sus partes.
fn refine_zip(mut file: File) -> Option<String> {
    file.seek(SeekFrom::Start(0)).ok()?;
    let mut archive = ZipArchive::new(file).ok()?;

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut declared = String::new();
        if entry.read_to_string(&mut declared).is_ok() {
            let declared = declared.trim();
            if is_odf(declared) || declared == "application/epub+zip" {
                return Some(declared.to_string());
            }
        }
    }

    let mut has_content_types = false;
    let mut ooxml = None;
    for name in archive.file_names() {
        if name == "[Content_Types].xml" {
            has_content_types = true;
        } else if ooxml.is_none() {
            ooxml = if name.starts_with("word/") {
                Some(DOCX_MIME)
            } else if name.starts_with("xl/") {
                Some(XLSX_MIME)
            } else if name.starts_with("ppt/") {
                Some(PPTX_MIME)
            } else {
                None
            };
        }
    }

    ooxml
        .filter(|_| has_content_types)
        .map(str::to_string)
}
