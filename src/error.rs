//! Errores tipados de cada etapa del análisis.

use crate::formatting::format_duration;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fallo de un extractor sobre un archivo concreto. Nunca detiene la corrida:
/// termina como nota en el registro del archivo.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no se pudo leer `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("EXIF ilegible: {0}")]
    Exif(#[from] exif::Error),
    #[error("imagen ilegible: {0}")]
    Image(#[from] image::ImageError),
    #[error("PNG ilegible: {0}")]
    Png(#[from] png::DecodingError),
    #[error("PDF ilegible: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("audio ilegible: {0}")]
    Audio(#[from] lofty::error::LoftyError),
    #[error("contenedor ZIP ilegible: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML inválido en `{part}`: {message}")]
    Xml { part: String, message: String },
}

impl ExtractError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Fallos al invocar herramientas externas (ExifTool, ffprobe).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{0}` no está instalado o no está en el PATH")]
    NotFound(String),
    #[error("`{tool}` superó el tiempo límite de {} y fue detenido", format_duration(*.timeout))]
    Timeout { tool: String, timeout: Duration },
    #[error("`{tool}` terminó con error: {stderr}")]
    Failed { tool: String, stderr: String },
    #[error("salida inválida de `{tool}`: {source}")]
    InvalidOutput {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no se pudo ejecutar `{tool}`: {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no se pudo leer la configuración `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuración inválida en `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("reglas inválidas: {0}")]
    Rules(#[from] toml::de::Error),
    #[error("patrón inválido `{pattern}` en la regla `{category}`: {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("`{0}` no es un directorio")]
    NotADirectory(PathBuf),
    #[error("no se pudo recorrer `{path}`: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no se pudo escribir `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no se pudo serializar JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no se pudo escribir el CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("no se pudo escribir el XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
