use super::MetadataProbe;
use super::runner::run_with_timeout;
use crate::detection::FileKind;
use crate::error::ToolError;
use crate::metadata::report::{ExtractorResult, FieldMap, MetadataValue};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SOURCE: &str = "exiftool";

/// Claves que describen al propio ExifTool o a la ruta, no al archivo.
const DROPPED_KEYS: [&str; 2] = ["SourceFile", "ExifTool:ExifToolVersion"];

/// Grupo con los atributos del sistema de archivos; ya están en `filesystem`.
const SYSTEM_GROUP: &str = "System:";

pub struct ExifTool {
    program: PathBuf,
    timeout: Duration,
}

impl ExifTool {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Ejecuta `exiftool -ver` y devuelve la versión informada.
    pub fn check(program: &Path, timeout: Duration) -> Result<String, ToolError> {
        let output = run_with_timeout(program, &["-ver"], timeout)?;
        if !output.success {
            return Err(ToolError::Failed {
                tool: program.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl MetadataProbe for ExifTool {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn handles(&self, _kind: FileKind) -> bool {
        true
    }

    fn probe(&self, path: &Path) -> Result<ExtractorResult, ToolError> {
        let args = [
            OsStr::new("-j"),
            OsStr::new("-a"),
            OsStr::new("-u"),
            OsStr::new("-G1"),
            path.as_os_str(),
        ];
        let output = run_with_timeout(&self.program, &args, self.timeout)?;
        if !output.success && output.stdout.is_empty() {
            return Err(ToolError::Failed {
                tool: SOURCE.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let fields = parse_exiftool_json(&output.stdout).map_err(|source| ToolError::InvalidOutput {
            tool: SOURCE.to_string(),
            source,
        })?;
        let mut result = ExtractorResult::new(SOURCE);
        result.fields = fields;
        Ok(result)
    }
}

/// Interpreta la salida `-j -G1`: un arreglo con un objeto por archivo cuyas
/// claves son `Grupo:Etiqueta`.
pub fn parse_exiftool_json(stdout: &[u8]) -> Result<FieldMap, serde_json::Error> {
    let documents: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(stdout)?;
    let mut fields = FieldMap::new();
    for (key, value) in documents.into_iter().next().unwrap_or_default() {
        if DROPPED_KEYS.contains(&key.as_str()) || key.starts_with(SYSTEM_GROUP) {
            continue;
        }
        if let Some(value) = MetadataValue::from_json(value) {
            fields.insert(key, value);
        }
    }
    Ok(fields)
}
