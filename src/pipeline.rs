//! Procesamiento de un archivo de punta a punta: detección, extracción y
//! consolidación.

use crate::aggregate::{self, ExtractorOutcome};
use crate::detection::{self, Detection};
use crate::dispatch::{self, ExtractOptions};
use crate::metadata::report::FileRecord;
use crate::rules::RuleSet;
use crate::tools::{Toolbox, exiftool};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct Engine {
    options: ExtractOptions,
    toolbox: Toolbox,
    rules: RuleSet,
}

impl Engine {
    /// Sin ExifTool disponible, `force_exiftool` vuelve al plan nativo.
    pub fn new(mut options: ExtractOptions, toolbox: Toolbox, rules: RuleSet) -> Self {
        if options.force_exiftool && !toolbox.names().contains(&exiftool::SOURCE) {
            warn!("ExifTool no está disponible; se usan los extractores nativos");
            options.force_exiftool = false;
        }
        Self {
            options,
            toolbox,
            rules,
        }
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Siempre devuelve un registro, aunque el archivo no pueda leerse: el
    /// fallo queda como nota de error.
    pub fn process_file(&self, path: &Path) -> FileRecord {
        let mut outcomes = Vec::new();
        let detection = match detection::detect(path) {
            Ok(detection) => detection,
            Err(error) => {
                warn!(path = %path.display(), %error, "no se pudo detectar el tipo");
                outcomes.push(ExtractorOutcome::failed("detection", error.to_string()));
                Detection::unknown()
            }
        };

        outcomes.extend(dispatch::extract(path, &detection, &self.options, &self.toolbox));
        let record = aggregate::build_record(path, detection, outcomes, &self.rules);
        info!(
            path = %path.display(),
            kind = %record.kind,
            fields = record.field_count(),
            interesting = record.interesting.len(),
            "archivo procesado"
        );
        record
    }

    /// Procesa los archivos en orden, avanzando la barra de progreso.
    pub fn process_all(&self, paths: &[PathBuf], progress: &ProgressBar) -> Vec<FileRecord> {
        paths
            .iter()
            .map(|path| {
                if let Some(name) = path.file_name() {
                    progress.set_message(name.to_string_lossy().into_owned());
                }
                let record = self.process_file(path);
                progress.inc(1);
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advanced_metadata::audio::fixtures::write_wav;
    use crate::advanced_metadata::image::fixtures::write_jpeg_with_gps;
    use crate::advanced_metadata::office::fixtures::write_sample_docx;
    use crate::advanced_metadata::pdf::fixtures::write_pdf;
    use crate::detection::FileKind;
    use crate::metadata::report::MetadataValue;
    use crate::tools::{ExifTool, FfProbe, ToolSettings};
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn engine() -> Engine {
        Engine::new(ExtractOptions::default(), Toolbox::empty(), RuleSet::builtin())
    }

    /// Script que imita la salida `-j -G1` de ExifTool para un PDF sin metadata.
    #[cfg(unix)]
    fn fake_exiftool(dir: &Path) -> Result<PathBuf, std::io::Error> {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("exiftool");
        std::fs::write(
            &script,
            r#"#!/bin/sh
cat <<'JSON'
[{
  "SourceFile": "limpio.pdf",
  "ExifTool:ExifToolVersion": 12.76,
  "System:FileName": "limpio.pdf",
  "System:Directory": "/tmp",
  "System:FileSize": "1024 bytes",
  "System:FileModifyDate": "2024:05:05 12:00:00+02:00",
  "System:FileAccessDate": "2024:05:05 12:00:00+02:00",
  "System:FileInodeChangeDate": "2024:05:05 12:00:00+02:00",
  "System:FilePermissions": "-rw-r--r--",
  "File:FileType": "PDF",
  "File:MIMEType": "application/pdf",
  "PDF:PDFVersion": 1.5,
  "PDF:Linearized": "No",
  "PDF:PageCount": 1
}]
JSON
"#,
        )?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
        Ok(script)
    }

    #[test]
    fn jpeg_with_gps_is_flagged() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("IMG_0001.jpg");
        write_jpeg_with_gps(&path)?;

        let record = engine().process_file(&path);

        assert_eq!(record.kind, FileKind::Image);
        let gps: Vec<_> = record
            .interesting
            .iter()
            .filter(|field| field.category == "gps")
            .map(|field| field.key.as_str())
            .collect();
        assert!(gps.contains(&"GPSLatitude"));
        assert!(gps.contains(&"GPSLongitude"));
        assert!(gps.contains(&"GPSPosition"));
        assert!(
            record
                .interesting
                .iter()
                .any(|field| field.category == "device" && field.key == "Make")
        );
        Ok(())
    }

    #[test]
    fn pdf_without_metadata_has_nothing_interesting() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("limpio.pdf");
        write_pdf(&path, &[], false)?;

        let record = engine().process_file(&path);

        assert_eq!(record.kind, FileKind::Pdf);
        assert!(record.interesting.is_empty());
        assert!(!record.has_errors());
        assert_eq!(record.sources, vec!["filesystem", "pdf"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn exiftool_file_dates_are_not_interesting() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("limpio.pdf");
        write_pdf(&path, &[], false)?;
        let mut toolbox = Toolbox::empty();
        toolbox.add(ExifTool::new(fake_exiftool(dir.path())?, Duration::from_secs(10)));
        let engine = Engine::new(ExtractOptions::default(), toolbox, RuleSet::builtin());

        let record = engine.process_file(&path);

        assert!(!record.has_errors());
        assert_eq!(record.sources, vec!["filesystem", "pdf", "exiftool"]);
        assert!(record.interesting.is_empty());
        let exiftool_fields = record.metadata.get("exiftool").map(|fields| fields.len());
        assert_eq!(exiftool_fields, Some(5));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn forced_exiftool_replaces_native_readers() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("limpio.pdf");
        write_pdf(&path, &[], false)?;
        let mut toolbox = Toolbox::empty();
        toolbox.add(ExifTool::new(fake_exiftool(dir.path())?, Duration::from_secs(10)));
        let options = ExtractOptions {
            force_exiftool: true,
            ..ExtractOptions::default()
        };
        let engine = Engine::new(options, toolbox, RuleSet::builtin());

        let record = engine.process_file(&path);

        assert!(engine.options().force_exiftool);
        assert_eq!(record.kind, FileKind::Pdf);
        assert_eq!(record.sources, vec!["filesystem", "exiftool"]);
        Ok(())
    }

    #[test]
    fn forced_exiftool_without_the_tool_uses_native_readers() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("limpio.pdf");
        write_pdf(&path, &[], false)?;
        let options = ExtractOptions {
            force_exiftool: true,
            ..ExtractOptions::default()
        };
        let engine = Engine::new(options, Toolbox::empty(), RuleSet::builtin());

        let record = engine.process_file(&path);

        assert!(!engine.options().force_exiftool);
        assert_eq!(record.sources, vec!["filesystem", "pdf"]);
        Ok(())
    }

    #[test]
    fn plain_gif_and_bmp_are_clean_records() -> TestResult {
        let dir = tempfile::tempdir()?;
        for name in ["logo.gif", "icono.bmp"] {
            let path = dir.path().join(name);
            image::RgbImage::new(4, 4).save(&path)?;

            let record = engine().process_file(&path);

            assert_eq!(record.kind, FileKind::Image);
            assert!(!record.has_errors(), "{name}: {:?}", record.notes);
            assert!(record.sources.contains(&"raster".to_string()));
            assert!(!record.sources.contains(&"exif".to_string()));
            assert!(record.interesting.is_empty());
        }
        Ok(())
    }

    #[test]
    fn pdf_author_and_producer_are_flagged() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("contrato.pdf");
        write_pdf(&path, &[("Author", "Jane Doe"), ("Producer", "Acrobat")], false)?;

        let record = engine().process_file(&path);

        let author = record
            .interesting
            .iter()
            .find(|field| field.key == "Author")
            .map(|field| (field.category.as_str(), field.value.clone()));
        assert_eq!(author, Some(("author", MetadataValue::Text("Jane Doe".into()))));
        Ok(())
    }

    #[test]
    fn docx_properties_are_flagged() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("plan.docx");
        write_sample_docx(&path)?;

        let record = engine().process_file(&path);

        assert_eq!(record.kind, FileKind::OfficeDocument);
        let keys: Vec<_> = record.interesting.iter().map(|f| f.key.as_str()).collect();
        assert!(keys.contains(&"Core.creator"));
        assert!(keys.contains(&"Core.lastModifiedBy"));
        assert!(keys.contains(&"Core.created"));
        assert!(keys.contains(&"App.Company"));
        Ok(())
    }

    #[test]
    fn plain_text_degrades_to_filesystem_only() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("notas.txt");
        std::fs::write(&path, "nada que ver")?;

        let record = engine().process_file(&path);

        assert_eq!(record.kind, FileKind::Unknown);
        assert_eq!(record.mime, None);
        assert_eq!(record.sources, vec!["filesystem"]);
        assert!(record.interesting.is_empty());
        assert!(record.notes.is_empty());
        Ok(())
    }

    #[test]
    fn vanished_file_still_yields_a_record() {
        let record = engine().process_file(Path::new("/nonexistent/metascope/borrado.jpg"));

        assert_eq!(record.kind, FileKind::Unknown);
        assert!(record.has_errors());
        assert!(record.notes.iter().any(|note| note.source == "detection"));
    }

    #[test]
    fn requested_but_missing_tools_do_not_fail() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("voz.wav");
        write_wav(&path, Some("Ana"))?;
        let settings = ToolSettings {
            use_exiftool: true,
            use_ffprobe: true,
            exiftool_path: PathBuf::from("/nonexistent/metascope/exiftool"),
            ffprobe_path: PathBuf::from("/nonexistent/metascope/ffprobe"),
            timeout: Duration::from_secs(2),
        };
        let engine = Engine::new(
            ExtractOptions::default(),
            Toolbox::detect(&settings),
            RuleSet::builtin(),
        );

        let record = engine.process_file(&path);

        assert!(engine.toolbox().is_empty());
        assert_eq!(record.kind, FileKind::Audio);
        assert_eq!(record.sources, vec!["filesystem", "audio"]);
        assert!(!record.has_errors());
        Ok(())
    }

    #[test]
    fn tool_that_vanishes_mid_run_becomes_a_note() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("voz.wav");
        write_wav(&path, None)?;
        let mut toolbox = Toolbox::empty();
        toolbox.add(FfProbe::new(
            PathBuf::from("/nonexistent/metascope/ffprobe"),
            Duration::from_secs(1),
        ));
        toolbox.add(ExifTool::new(
            PathBuf::from("/nonexistent/metascope/exiftool"),
            Duration::from_secs(1),
        ));
        let engine = Engine::new(ExtractOptions::default(), toolbox, RuleSet::builtin());

        let record = engine.process_file(&path);

        let failed: Vec<_> = record.notes.iter().map(|note| note.source.as_str()).collect();
        assert_eq!(failed, vec!["ffprobe", "exiftool"]);
        assert!(record.sources.contains(&"audio".to_string()));
        Ok(())
    }
}
