use crate::aggregate::ScanSummary;
use crate::config::{OutputSettings, Settings};
use crate::metadata::console::{self as output_console, ConsoleFormat};
use crate::metadata::export::export_records;
use crate::metadata::report::FileRecord;
use crate::pipeline::Engine;
use crate::scan::collect_files;
use crate::tools::Toolbox;
use crate::ui;
use anyhow::{Context, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

pub fn run(settings: Settings) -> anyhow::Result<()> {
    let Settings {
        input,
        scan,
        extract,
        tools,
        rules,
        output,
    } = settings;

    if !input.exists() {
        bail!("La ruta `{}` no existe", input.display());
    }
    if !output.color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let toolbox = Toolbox::detect(&tools);
    info!(tools = ?toolbox.names(), rules = rules.len(), "configuración lista");
    let engine = Engine::new(extract, toolbox, rules);

    let is_directory = input.is_dir();
    let records = if is_directory {
        let files = collect_files(&input, &scan)
            .with_context(|| format!("No se pudo recorrer `{}`", input.display()))?;
        info!(root = %input.display(), files = files.len(), "directorio recorrido");
        let progress = progress_bar(files.len() as u64, output.quiet);
        let records = engine.process_all(&files, &progress);
        progress.finish_and_clear();
        records
    } else {
        vec![engine.process_file(&input)]
    };

    if !output.quiet {
        render(&records, &input, is_directory, &output)?;
    }

    if let Some((path, format)) = &output.export {
        export_records(&records, *format, path)
            .with_context(|| format!("No se pudo exportar el reporte a `{}`", path.display()))?;
        if !output.quiet {
            println!(
                "\n{} {}",
                style("Reporte guardado en").green(),
                style(path.display()).bold()
            );
        }
    }

    Ok(())
}

fn render(
    records: &[FileRecord],
    input: &Path,
    is_directory: bool,
    output: &OutputSettings,
) -> anyhow::Result<()> {
    let json = output.format == ConsoleFormat::Json;
    if !json {
        ui::render_header();
    }

    if is_directory && output.summary && !json {
        for record in records {
            output_console::render_summary_line(record);
        }
    } else if is_directory {
        output_console::render_records(records, output.format, output.color)?;
    } else if let Some(record) = records.first() {
        output_console::render_record(record, output.format, output.color)?;
    }

    if is_directory && !json {
        if records.is_empty() {
            println!(
                "{}",
                style(format!("No hay archivos para analizar en `{}`", input.display()))
                    .yellow()
            );
        }
        output_console::render_scan_summary(&ScanSummary::from_records(records), output.color);
    }
    Ok(())
}

fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(bar_style.progress_chars("▸▹ "));
    }
    bar
}
