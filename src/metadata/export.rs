//! Exportación de registros a archivo.

use crate::error::ExportError;
use crate::metadata::report::FileRecord;
use clap::ValueEnum;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Jsonl,
    Txt,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Jsonl => "JSON Lines",
            ExportFormat::Txt => "TXT",
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
        }
    }

    /// Formato según la extensión del destino; JSON si no se reconoce.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "jsonl" | "ndjson" => ExportFormat::Jsonl,
            "txt" | "md" => ExportFormat::Txt,
            "csv" => ExportFormat::Csv,
            "xlsx" => ExportFormat::Xlsx,
            _ => ExportFormat::Json,
        }
    }
}

pub fn export_records(
    records: &[FileRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => export_json(records, path)?,
        ExportFormat::Jsonl => export_jsonl(records, path)?,
        ExportFormat::Txt => export_txt(records, path)?,
        ExportFormat::Csv => export_csv(records, path)?,
        ExportFormat::Xlsx => export_xlsx(records, path)?,
    }
    info!(path = %path.display(), format = format.label(), records = records.len(), "reporte exportado");
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn export_json(records: &[FileRecord], path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(io_error(path))
}

fn export_jsonl(records: &[FileRecord], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))
}

fn export_txt(records: &[FileRecord], path: &Path) -> Result<(), ExportError> {
    fs::write(path, text_report(records)).map_err(io_error(path))
}

fn text_report(records: &[FileRecord]) -> String {
    let mut output = String::new();
    output.push_str("Reporte de metadata\n");
    output.push_str("===================\n\n");

    for record in records {
        let title = record.path.display().to_string();
        let _ = writeln!(output, "{title}");
        let _ = writeln!(output, "{}", "-".repeat(title.chars().count()));
        let _ = writeln!(
            output,
            "Tipo: {}{}",
            record.kind,
            record
                .mime
                .as_deref()
                .map(|mime| format!(" ({mime})"))
                .unwrap_or_default()
        );

        if record.interesting.is_empty() {
            output.push_str("Puntos de interés: (ninguno)\n");
        } else {
            output.push_str("Puntos de interés:\n");
            for field in &record.interesting {
                let _ = writeln!(
                    output,
                    "  ! [{}] {}:{} = {}",
                    field.category, field.namespace, field.key, field.value
                );
            }
        }

        for (namespace, fields) in &record.metadata {
            let _ = writeln!(output, "[{namespace}]");
            for (key, value) in fields {
                let _ = writeln!(output, "  - {key}: {value}");
            }
        }

        for note in &record.notes {
            let _ = writeln!(
                output,
                "Nota ({}) {}: {}",
                note.level.label(),
                note.source,
                note.message
            );
        }
        output.push('\n');
    }
    output
}

struct ExportRow {
    path: String,
    kind: String,
    namespace: String,
    key: String,
    value: String,
    flagged: String,
}

const HEADERS: [&str; 6] = ["path", "kind", "namespace", "key", "value", "flagged"];

impl ExportRow {
    fn cells(&self) -> [&str; 6] {
        [
            &self.path,
            &self.kind,
            &self.namespace,
            &self.key,
            &self.value,
            &self.flagged,
        ]
    }
}

/// Una fila por campo; las notas van como filas con la clave `note.<nivel>`.
fn collect_rows(records: &[FileRecord]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for record in records {
        let path = record.path.display().to_string();
        let kind = record.kind.to_string();
        for (namespace, fields) in &record.metadata {
            for (key, value) in fields {
                let flagged = record
                    .interesting
                    .iter()
                    .find(|field| &field.namespace == namespace && &field.key == key)
                    .map(|field| field.category.clone())
                    .unwrap_or_default();
                rows.push(ExportRow {
                    path: path.clone(),
                    kind: kind.clone(),
                    namespace: namespace.clone(),
                    key: key.clone(),
                    value: value.to_string(),
                    flagged,
                });
            }
        }
        for note in &record.notes {
            rows.push(ExportRow {
                path: path.clone(),
                kind: kind.clone(),
                namespace: note.source.clone(),
                key: format!("note.{}", note.level.label()),
                value: note.message.clone(),
                flagged: String::new(),
            });
        }
    }
    rows
}

fn export_csv(records: &[FileRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for row in collect_rows(records) {
        writer.write_record(row.cells())?;
    }
    writer.flush().map_err(io_error(path))
}

fn export_xlsx(records: &[FileRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Metadata")?;

    for (column, width) in [(0, 40.0), (1, 16.0), (2, 14.0), (3, 32.0), (4, 70.0), (5, 14.0)] {
        worksheet.set_column_width(column, width)?;
    }

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E78))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    let cell_format = Format::new()
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left);

    let flagged_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x9C5700))
        .set_background_color(Color::RGB(0xFFEB9C))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);

    for (column, header) in HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, column as u16, *header, &header_format)?;
    }

    for (index, row) in collect_rows(records).iter().enumerate() {
        let row_index = (index + 1) as u32;
        for (column, value) in row.cells().iter().enumerate() {
            let format = if column == 5 && !value.is_empty() {
                &flagged_format
            } else {
                &cell_format
            };
            worksheet.write_with_format(row_index, column as u16, *value, format)?;
        }
    }

    worksheet.autofilter(0, 0, 0, (HEADERS.len() - 1) as u16)?;
    workbook.save(path)?;
    Ok(())
}
