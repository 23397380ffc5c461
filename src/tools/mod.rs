//! Herramientas externas opcionales (ExifTool, ffprobe).
//!
//! Cada herramienta implementa [`MetadataProbe`]. El [`Toolbox`] se arma una
//! vez al inicio y solo contiene las herramientas pedidas que además están
//! instaladas: la ausencia de una herramienta es un dato de configuración, no
//! un error de ejecución.

pub mod exiftool;
pub mod ffprobe;
pub mod runner;

use crate::detection::FileKind;
use crate::error::ToolError;
use crate::metadata::report::ExtractorResult;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub use exiftool::ExifTool;
pub use ffprobe::FfProbe;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub trait MetadataProbe {
    fn name(&self) -> &'static str;
    fn handles(&self, kind: FileKind) -> bool;
    fn probe(&self, path: &Path) -> Result<ExtractorResult, ToolError>;
}

#[derive(Clone, Debug)]
pub struct ToolSettings {
    pub use_exiftool: bool,
    pub use_ffprobe: bool,
    pub exiftool_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            use_exiftool: false,
            use_ffprobe: false,
            exiftool_path: PathBuf::from("exiftool"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Default)]
pub struct Toolbox {
    probes: Vec<Box<dyn MetadataProbe>>,
}

impl Toolbox {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Comprueba cada herramienta pedida y conserva solo las disponibles.
    pub fn detect(settings: &ToolSettings) -> Self {
        let mut toolbox = Self::empty();

        if settings.use_exiftool {
            match ExifTool::check(&settings.exiftool_path, settings.timeout) {
                Ok(version) => {
                    info!(%version, "ExifTool disponible");
                    toolbox.add(ExifTool::new(settings.exiftool_path.clone(), settings.timeout));
                }
                Err(error) => warn!(%error, "ExifTool no disponible; se usará solo la extracción nativa"),
            }
        }

        if settings.use_ffprobe {
            match FfProbe::check(&settings.ffprobe_path, settings.timeout) {
                Ok(version) => {
                    info!(%version, "ffprobe disponible");
                    toolbox.add(FfProbe::new(settings.ffprobe_path.clone(), settings.timeout));
                }
                Err(error) => warn!(%error, "ffprobe no disponible; se usará solo la extracción nativa"),
            }
        }

        toolbox
    }

    pub fn add(&mut self, probe: impl MetadataProbe + 'static) {
        self.probes.push(Box::new(probe));
    }

    pub fn probes_for(&self, kind: FileKind) -> impl Iterator<Item = &dyn MetadataProbe> {
        self.probes
            .iter()
            .map(|probe| probe.as_ref())
            .filter(move |probe| probe.handles(kind))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|probe| probe.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}
