//! Modelos compartidos para reportar metadata de manera consistente.

use crate::detection::{Detection, FileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryLevel {
    Info,
    Warning,
    Error,
}

impl EntryLevel {
    pub fn label(self) -> &'static str {
        match self {
            EntryLevel::Info => "info",
            EntryLevel::Warning => "aviso",
            EntryLevel::Error => "error",
        }
    }
}

/// Valor de un campo. Las estructuras anidadas que devuelven las herramientas
/// externas se aplanan a texto antes de llegar aquí.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Convierte un valor JSON; `null` y los textos vacíos no producen campo.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(flag) => Some(Self::Bool(flag)),
            serde_json::Value::Number(number) => Some(match number.as_i64() {
                Some(integer) => Self::Integer(integer),
                None => match number.as_f64() {
                    Some(float) => Self::Float(float),
                    None => Self::Text(number.to_string()),
                },
            }),
            serde_json::Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| Self::Text(text.to_string()))
            }
            serde_json::Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            object @ serde_json::Value::Object(_) => Some(Self::Text(object.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MetadataValue::Text(text) => text.trim().is_empty(),
            MetadataValue::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(flag) => write!(f, "{}", if *flag { "sí" } else { "no" }),
            MetadataValue::Integer(integer) => write!(f, "{integer}"),
            MetadataValue::Float(float) => write!(f, "{float}"),
            MetadataValue::Text(text) => f.write_str(text),
            MetadataValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Self::Integer)
            .unwrap_or_else(|_| Self::Text(value.to_string()))
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Self::Text).collect())
    }
}

pub type FieldMap = BTreeMap<String, MetadataValue>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionNote {
    pub source: String,
    pub level: EntryLevel,
    pub message: String,
}

impl ExtractionNote {
    pub fn new(source: impl Into<String>, level: EntryLevel, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            level,
            message: message.into(),
        }
    }

    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(source, EntryLevel::Error, message)
    }
}

/// Salida de una corrida de extractor: su nombre, los campos y las notas.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractorResult {
    pub source: String,
    pub fields: FieldMap,
    pub notes: Vec<ExtractionNote>,
}

impl ExtractorResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: FieldMap::new(),
            notes: Vec::new(),
        }
    }

    /// Inserta el campo salvo que el valor esté vacío. Dentro de un mismo
    /// extractor la última escritura gana.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.insert(key.into(), value);
        }
    }

    pub fn note(&mut self, level: EntryLevel, message: impl Into<String>) {
        let note = ExtractionNote::new(self.source.clone(), level, message);
        self.notes.push(note);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlaggedField {
    pub category: String,
    pub namespace: String,
    pub key: String,
    pub value: MetadataValue,
}

/// Registro consolidado de un archivo: exactamente uno por archivo procesado.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub kind: FileKind,
    pub mime: Option<String>,
    pub sources: Vec<String>,
    pub metadata: BTreeMap<String, FieldMap>,
    pub interesting: Vec<FlaggedField>,
    pub notes: Vec<ExtractionNote>,
}

impl FileRecord {
    pub fn new(path: &Path, detection: Detection) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: detection.kind,
            mime: detection.mime,
            sources: Vec::new(),
            metadata: BTreeMap::new(),
            interesting: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn field(&self, namespace: &str, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(namespace)?.get(key)
    }

    pub fn has_errors(&self) -> bool {
        self.notes
            .iter()
            .any(|note| note.level == EntryLevel::Error)
    }

    pub fn field_count(&self) -> usize {
        self.metadata.values().map(BTreeMap::len).sum()
    }
}
