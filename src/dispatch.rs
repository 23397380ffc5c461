//! Plan de extracción por tipo de archivo.

use crate::advanced_metadata::{archive, audio, image, office, pdf, xmp};
use crate::aggregate::ExtractorOutcome;
use crate::detection::{Detection, FileKind};
use crate::error::ExtractError;
use crate::metadata::report::ExtractorResult;
use crate::metadata::{filesystem, hashing};
use crate::tools::Toolbox;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExtractOptions {
    pub include_hash: bool,
    pub extract_text: bool,
    /// ExifTool reemplaza a los extractores nativos de cada formato.
    pub force_exiftool: bool,
}

/// Extractores nativos, basados en bibliotecas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    Filesystem,
    Hashes,
    Exif,
    Xmp,
    Raster,
    PngText,
    Pdf,
    Audio,
    Office,
    Archive,
}

impl Strategy {
    pub fn source(self) -> &'static str {
        match self {
            Strategy::Filesystem => filesystem::SOURCE,
            Strategy::Hashes => hashing::SOURCE,
            Strategy::Exif => image::EXIF_SOURCE,
            Strategy::Xmp => xmp::SOURCE,
            Strategy::Raster => image::RASTER_SOURCE,
            Strategy::PngText => image::PNG_TEXT_SOURCE,
            Strategy::Pdf => pdf::SOURCE,
            Strategy::Audio => audio::SOURCE,
            Strategy::Office => office::SOURCE,
            Strategy::Archive => archive::SOURCE,
        }
    }

    fn run(
        self,
        path: &Path,
        detection: &Detection,
        options: &ExtractOptions,
    ) -> Result<ExtractorResult, ExtractError> {
        match self {
            Strategy::Filesystem => filesystem::extract_filesystem_metadata(path),
            Strategy::Hashes => hashing::extract_hashes(path),
            Strategy::Exif => image::extract_exif_metadata(path),
            Strategy::Xmp => xmp::extract_xmp_metadata(path),
            Strategy::Raster => image::extract_raster_metadata(path),
            Strategy::PngText => image::extract_png_text(path),
            Strategy::Pdf => pdf::extract_pdf_metadata(path, options.extract_text),
            Strategy::Audio => audio::extract_audio_metadata(path),
            Strategy::Office => {
                office::extract_office_metadata(path, detection.mime.as_deref(), options.extract_text)
            }
            Strategy::Archive => archive::extract_archive_metadata(path),
        }
    }
}

/// Contenedores con EXIF que kamadak-exif sabe abrir.
const EXIF_MIMES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/tiff",
    "image/x-canon-cr2",
    "image/webp",
    "image/heif",
    "image/avif",
];

/// Formatos que el crate `image` decodifica con sus features por defecto.
const RASTER_MIMES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/tiff",
    "image/bmp",
    "image/vnd.microsoft.icon",
];

/// Formatos de audio que lofty sabe leer.
const LOFTY_AUDIO_MIMES: [&str; 9] = [
    "audio/mpeg",
    "audio/m4a",
    "audio/ogg",
    "audio/opus",
    "audio/x-flac",
    "audio/x-wav",
    "audio/aac",
    "audio/x-aiff",
    "audio/x-ape",
];

/// Contenedores de video que lofty sabe leer.
const LOFTY_VIDEO_MIMES: [&str; 3] = ["video/mp4", "video/quicktime", "video/x-m4v"];

/// Estrategias nativas para un archivo, en orden de ejecución.
pub fn plan(detection: &Detection, options: &ExtractOptions) -> Vec<Strategy> {
    let mut strategies = vec![Strategy::Filesystem];
    if options.include_hash {
        strategies.push(Strategy::Hashes);
    }
    if options.force_exiftool {
        return strategies;
    }

    let mime = detection.mime.as_deref().unwrap_or_default();
    match detection.kind {
        FileKind::Image => {
            if EXIF_MIMES.contains(&mime) {
                strategies.push(Strategy::Exif);
            }
            strategies.push(Strategy::Xmp);
            if RASTER_MIMES.contains(&mime) {
                strategies.push(Strategy::Raster);
            }
            if mime == "image/png" {
                strategies.push(Strategy::PngText);
            }
        }
        FileKind::Pdf => strategies.push(Strategy::Pdf),
        FileKind::Audio if LOFTY_AUDIO_MIMES.contains(&mime) => strategies.push(Strategy::Audio),
        FileKind::Video if LOFTY_VIDEO_MIMES.contains(&mime) => strategies.push(Strategy::Audio),
        FileKind::OfficeDocument => strategies.push(Strategy::Office),
        FileKind::Archive if mime == "application/zip" => strategies.push(Strategy::Archive),
        FileKind::Audio | FileKind::Video | FileKind::Archive | FileKind::Unknown => {}
    }
    strategies
}

/// Ejecuta el plan nativo y luego las herramientas externas aplicables. Un
/// fallo se registra como resultado fallido y no detiene las demás etapas.
pub fn extract(
    path: &Path,
    detection: &Detection,
    options: &ExtractOptions,
    toolbox: &Toolbox,
) -> Vec<ExtractorOutcome> {
    let mut outcomes = Vec::new();

    for strategy in plan(detection, options) {
        let source = strategy.source();
        debug!(path = %path.display(), source, "ejecutando extractor");
        match strategy.run(path, detection, options) {
            Ok(result) => outcomes.push(ExtractorOutcome::success(result)),
            Err(error) => {
                warn!(path = %path.display(), source, %error, "falló el extractor");
                outcomes.push(ExtractorOutcome::failed(source, error.to_string()));
            }
        }
    }

    for probe in toolbox.probes_for(detection.kind) {
        let source = probe.name();
        debug!(path = %path.display(), source, "ejecutando herramienta externa");
        match probe.probe(path) {
            Ok(result) => outcomes.push(ExtractorOutcome::success(result)),
            Err(error) => {
                warn!(path = %path.display(), source, %error, "falló la herramienta externa");
                outcomes.push(ExtractorOutcome::failed(source, error.to_string()));
            }
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DOCX_MIME;

    fn detection(kind: FileKind, mime: &str) -> Detection {
        Detection::new(kind, Some(mime.to_string()))
    }

    #[test]
    fn every_plan_starts_with_filesystem() {
        let options = ExtractOptions::default();
        for kind in [
            FileKind::Image,
            FileKind::Pdf,
            FileKind::Audio,
            FileKind::Video,
            FileKind::OfficeDocument,
            FileKind::Archive,
        ] {
            assert_eq!(plan(&detection(kind, "x/y"), &options)[0], Strategy::Filesystem);
        }
        assert_eq!(plan(&Detection::unknown(), &options), vec![Strategy::Filesystem]);
    }

    #[test]
    fn hashes_only_when_requested() {
        let options = ExtractOptions {
            include_hash: true,
            ..ExtractOptions::default()
        };
        let strategies = plan(&detection(FileKind::Pdf, "application/pdf"), &options);
        assert_eq!(strategies, vec![Strategy::Filesystem, Strategy::Hashes, Strategy::Pdf]);
    }

    #[test]
    fn png_gets_text_chunks_jpeg_does_not() {
        let options = ExtractOptions::default();
        assert!(plan(&detection(FileKind::Image, "image/png"), &options).contains(&Strategy::PngText));
        assert!(!plan(&detection(FileKind::Image, "image/jpeg"), &options).contains(&Strategy::PngText));
    }

    #[test]
    fn video_uses_lofty_only_for_mp4_family() {
        let options = ExtractOptions::default();
        assert!(plan(&detection(FileKind::Video, "video/mp4"), &options).contains(&Strategy::Audio));
        assert_eq!(
            plan(&detection(FileKind::Video, "video/x-matroska"), &options),
            vec![Strategy::Filesystem]
        );
    }

    #[test]
    fn readers_are_gated_by_mime() {
        let options = ExtractOptions::default();
        assert_eq!(
            plan(&detection(FileKind::Image, "image/gif"), &options),
            vec![Strategy::Filesystem, Strategy::Xmp, Strategy::Raster]
        );
        assert_eq!(
            plan(&detection(FileKind::Image, "image/vnd.adobe.photoshop"), &options),
            vec![Strategy::Filesystem, Strategy::Xmp]
        );
        assert_eq!(
            plan(&detection(FileKind::Image, "image/jpeg"), &options),
            vec![Strategy::Filesystem, Strategy::Exif, Strategy::Xmp, Strategy::Raster]
        );
        assert_eq!(
            plan(&detection(FileKind::Audio, "audio/midi"), &options),
            vec![Strategy::Filesystem]
        );
        assert!(plan(&detection(FileKind::Audio, "audio/x-flac"), &options).contains(&Strategy::Audio));
    }

    #[test]
    fn forced_exiftool_keeps_only_file_attributes() {
        let options = ExtractOptions {
            include_hash: true,
            force_exiftool: true,
            ..ExtractOptions::default()
        };
        for (kind, mime) in [
            (FileKind::Image, "image/jpeg"),
            (FileKind::Pdf, "application/pdf"),
            (FileKind::Audio, "audio/mpeg"),
            (FileKind::OfficeDocument, DOCX_MIME),
        ] {
            assert_eq!(
                plan(&detection(kind, mime), &options),
                vec![Strategy::Filesystem, Strategy::Hashes]
            );
        }
    }

    #[test]
    fn failing_extractor_does_not_stop_the_rest() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("falso.pdf");
        std::fs::write(&path, b"%PDF-1.4 sin estructura")?;

        let outcomes = extract(
            &path,
            &detection(FileKind::Pdf, "application/pdf"),
            &ExtractOptions::default(),
            &Toolbox::empty(),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[1].source, "pdf");
        assert!(outcomes[1].result.is_err());
        Ok(())
    }
}
