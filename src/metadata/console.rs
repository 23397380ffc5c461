//! Presentación de registros en consola.

use crate::aggregate::ScanSummary;
use crate::formatting::truncate_chars;
use crate::metadata::report::{EntryLevel, FileRecord};
use crate::ui::{base_table, header_cell, label_cell, render_section_title};
use clap::ValueEnum;
use comfy_table::{Cell, Color, Row};
use console::style;
use std::fmt::Write as _;

/// Largo máximo de un valor dentro de una tabla.
const TABLE_VALUE_CHARS: usize = 160;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ConsoleFormat {
    #[default]
    Table,
    Compact,
    Json,
}

pub fn render_record(
    record: &FileRecord,
    format: ConsoleFormat,
    color: bool,
) -> Result<(), serde_json::Error> {
    match format {
        ConsoleFormat::Table => render_record_tables(record, color),
        ConsoleFormat::Compact => print!("{}", compact_text(record)),
        ConsoleFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
    }
    Ok(())
}

/// En modo JSON un directorio se imprime como un único arreglo.
pub fn render_records(
    records: &[FileRecord],
    format: ConsoleFormat,
    color: bool,
) -> Result<(), serde_json::Error> {
    if format == ConsoleFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    for record in records {
        render_record(record, format, color)?;
    }
    Ok(())
}

fn render_record_tables(record: &FileRecord, color: bool) {
    let kind = match &record.mime {
        Some(mime) => format!("{} · {}", record.kind.label(), mime),
        None => record.kind.label().to_string(),
    };
    println!(
        "\n{} {} {}",
        style("■").cyan(),
        style(record.path.display()).bold(),
        style(format!("({kind})")).dim()
    );

    render_section_title("Puntos de interés");
    if record.interesting.is_empty() {
        println!("  {}", style("Sin campos de interés").green());
    } else {
        let mut table = base_table(color);
        table.set_header(vec![
            header_cell("Categoría"),
            header_cell("Origen"),
            header_cell("Campo"),
            header_cell("Valor"),
        ]);
        for field in &record.interesting {
            table.add_row(Row::from(vec![
                Cell::new(&field.category).fg(Color::Yellow),
                Cell::new(&field.namespace),
                label_cell(&field.key),
                Cell::new(truncate_chars(&field.value.to_string(), TABLE_VALUE_CHARS))
                    .fg(Color::Yellow),
            ]));
        }
        println!("{table}");
    }

    for (namespace, fields) in &record.metadata {
        render_section_title(namespace);
        let mut table = base_table(color);
        table.set_header(vec![header_cell("Campo"), header_cell("Valor")]);
        for (key, value) in fields {
            let flagged = record
                .interesting
                .iter()
                .any(|field| &field.namespace == namespace && &field.key == key);
            let value = Cell::new(truncate_chars(&value.to_string(), TABLE_VALUE_CHARS));
            table.add_row(Row::from(vec![
                label_cell(key),
                if flagged { value.fg(Color::Yellow) } else { value },
            ]));
        }
        println!("{table}");
    }

    if !record.notes.is_empty() {
        render_section_title("Notas");
        for note in &record.notes {
            let line = format!("[{}] {}: {}", note.level.label(), note.source, note.message);
            let line = match note.level {
                EntryLevel::Info => style(line).dim(),
                EntryLevel::Warning => style(line).yellow(),
                EntryLevel::Error => style(line).red(),
            };
            println!("  {line}");
        }
    }
}

/// Una línea por archivo seguida de los campos marcados.
pub fn compact_text(record: &FileRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} [{}] {} campos, {} de interés",
        record.path.display(),
        record.kind,
        record.field_count(),
        record.interesting.len()
    );
    for field in &record.interesting {
        let _ = writeln!(
            output,
            "  {:<14} {}:{} = {}",
            field.category,
            field.namespace,
            field.key,
            truncate_chars(&field.value.to_string(), TABLE_VALUE_CHARS)
        );
    }
    for note in record.notes.iter().filter(|note| note.level == EntryLevel::Error) {
        let _ = writeln!(output, "  error          {}: {}", note.source, note.message);
    }
    output
}

pub fn summary_line(record: &FileRecord) -> String {
    let mark = if record.has_errors() {
        "✗"
    } else if record.interesting.is_empty() {
        "·"
    } else {
        "⚑"
    };
    format!(
        "{mark} {}  ({}, {} campos, {} de interés)",
        record.path.display(),
        record.kind,
        record.field_count(),
        record.interesting.len()
    )
}

pub fn render_summary_line(record: &FileRecord) {
    let line = summary_line(record);
    let line = if record.has_errors() {
        style(line).red()
    } else if record.interesting.is_empty() {
        style(line).dim()
    } else {
        style(line).yellow()
    };
    println!("{line}");
}

pub fn render_scan_summary(summary: &ScanSummary, color: bool) {
    render_section_title("Resumen");
    let mut table = base_table(color);
    table.set_header(vec![header_cell("Concepto"), header_cell("Total")]);
    table.add_row(Row::from(vec![
        label_cell("Archivos"),
        Cell::new(summary.total_files),
    ]));
    for (kind, count) in &summary.by_kind {
        table.add_row(Row::from(vec![
            label_cell(&format!("  {}", kind.label())),
            Cell::new(count),
        ]));
    }
    table.add_row(Row::from(vec![
        label_cell("Con puntos de interés"),
        Cell::new(summary.with_interest).fg(Color::Yellow),
    ]));
    table.add_row(Row::from(vec![
        label_cell("Con errores"),
        Cell::new(summary.with_errors).fg(if summary.with_errors > 0 {
            Color::Red
        } else {
            Color::Green
        }),
    ]));
    table.add_row(Row::from(vec![
        label_cell("Campos extraídos"),
        Cell::new(summary.total_fields),
    ]));
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{ExtractorOutcome, build_record};
    use crate::detection::{Detection, FileKind};
    use crate::metadata::report::ExtractorResult;
    use crate::rules::RuleSet;
    use std::path::Path;

    fn sample(failed: bool) -> FileRecord {
        let mut exif = ExtractorResult::new("exif");
        exif.insert("GPSLatitude", "40.5");
        exif.insert("ExposureTime", "1/60");
        let mut outcomes = vec![ExtractorOutcome::success(exif)];
        if failed {
            outcomes.push(ExtractorOutcome::failed("exiftool", "tiempo agotado"));
        }
        build_record(
            Path::new("fotos/IMG_1.jpg"),
            Detection::new(FileKind::Image, Some("image/jpeg".into())),
            outcomes,
            &RuleSet::builtin(),
        )
    }

    #[test]
    fn compact_lists_flagged_fields_and_errors() {
        let text = compact_text(&sample(true));
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "fotos/IMG_1.jpg [image] 2 campos, 1 de interés");
        assert!(lines[1].contains("exif:GPSLatitude = 40.5"));
        assert!(lines[2].contains("exiftool: tiempo agotado"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn summary_line_marks_interest_and_errors() {
        assert!(summary_line(&sample(false)).starts_with('⚑'));
        assert!(summary_line(&sample(true)).starts_with('✗'));
        let clean = FileRecord::new(Path::new("a.txt"), Detection::unknown());
        assert!(summary_line(&clean).starts_with('·'));
    }
}
