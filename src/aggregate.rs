//! Unión de las salidas de cada extractor en un único registro por archivo.

use crate::detection::{Detection, FileKind};
use crate::metadata::report::{ExtractionNote, ExtractorResult, FileRecord};
use crate::rules::RuleSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug)]
pub struct ExtractorOutcome {
    pub source: String,
    pub result: Result<ExtractorResult, String>,
}

impl ExtractorOutcome {
    pub fn success(result: ExtractorResult) -> Self {
        Self {
            source: result.source.clone(),
            result: Ok(result),
        }
    }

    pub fn failed(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            result: Err(message.into()),
        }
    }
}

/// Incorpora una salida al registro. Cada fuente escribe en su propio espacio
/// de nombres; dentro de él, la última escritura gana.
pub fn merge(record: &mut FileRecord, outcome: ExtractorOutcome) {
    match outcome.result {
        Ok(result) => {
            if !record.sources.contains(&result.source) {
                record.sources.push(result.source.clone());
            }
            if !result.fields.is_empty() {
                record
                    .metadata
                    .entry(result.source)
                    .or_default()
                    .extend(result.fields);
            }
            record.notes.extend(result.notes);
        }
        Err(message) => record
            .notes
            .push(ExtractionNote::error(outcome.source, message)),
    }
}

pub fn build_record(
    path: &Path,
    detection: Detection,
    outcomes: Vec<ExtractorOutcome>,
    rules: &RuleSet,
) -> FileRecord {
    let mut record = FileRecord::new(path, detection);
    for outcome in outcomes {
        merge(&mut record, outcome);
    }
    record.interesting = rules.flag(&record.metadata);
    record
}

/// Totales de una corrida sobre un directorio.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub total_files: usize,
    pub by_kind: BTreeMap<FileKind, usize>,
    pub with_interest: usize,
    pub with_errors: usize,
    pub total_fields: usize,
}

impl ScanSummary {
    pub fn from_records(records: &[FileRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total_files += 1;
            *summary.by_kind.entry(record.kind).or_default() += 1;
            if !record.interesting.is_empty() {
                summary.with_interest += 1;
            }
            if record.has_errors() {
                summary.with_errors += 1;
            }
            summary.total_fields += record.field_count();
        }
        summary
    }
}
