//! Configuración efectiva de una corrida.
//!
//! Las opciones de línea de comandos se combinan con un archivo TOML opcional.
//! Un flag activo siempre gana; el archivo solo completa lo que no se indicó:
//!
//! ```toml
//! tool_timeout_secs = 10
//! exiftool = true
//! force_exiftool = false
//! exiftool_path = "/opt/exiftool/exiftool"
//! extensions = ["jpg", "pdf"]
//!
//! exclude_namespaces = ["filesystem", "hashes", "raster"]
//!
//! [[rules]]
//! category = "gps"
//! pattern = "gps|latitude|longitude"
//! ```

use crate::cli::Args;
use crate::dispatch::ExtractOptions;
use crate::error::ConfigError;
use crate::metadata::console::ConsoleFormat;
use crate::metadata::export::ExportFormat;
use crate::rules::{RuleSet, RuleSpec};
use crate::scan::{ScanOptions, normalize_extensions};
use crate::tools::ToolSettings;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub tool_timeout_secs: Option<u64>,
    pub exiftool_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    #[serde(default)]
    pub exiftool: bool,
    #[serde(default)]
    pub force_exiftool: bool,
    #[serde(default)]
    pub ffprobe: bool,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub extensions: Vec<String>,
    pub exclude_namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputSettings {
    pub format: ConsoleFormat,
    pub summary: bool,
    pub quiet: bool,
    pub color: bool,
    pub export: Option<(PathBuf, ExportFormat)>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub input: PathBuf,
    pub scan: ScanOptions,
    pub extract: ExtractOptions,
    pub tools: ToolSettings,
    pub rules: RuleSet,
    pub output: OutputSettings,
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => {
                debug!(path = %path.display(), "cargando configuración");
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Reglas: `--rules` primero, luego las del archivo de configuración y por
    /// último las integradas.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let rules = match &args.rules {
            Some(path) => RuleSet::load(path)?,
            None if !file.rules.is_empty() => {
                RuleSet::from_specs(file.rules, file.exclude_namespaces)?
            }
            None => match file.exclude_namespaces {
                Some(excluded) => RuleSet::builtin().excluding(excluded),
                None => RuleSet::builtin(),
            },
        };

        let extensions = if args.extensions.is_empty() {
            normalize_extensions(&file.extensions)
        } else {
            normalize_extensions(&args.extensions)
        };

        let force_exiftool = args.force_exiftool || file.force_exiftool;
        let mut tools = ToolSettings {
            use_exiftool: args.exiftool || file.exiftool || force_exiftool,
            use_ffprobe: args.ffprobe || file.ffprobe,
            ..ToolSettings::default()
        };
        if let Some(path) = file.exiftool_path {
            tools.exiftool_path = path;
        }
        if let Some(path) = file.ffprobe_path {
            tools.ffprobe_path = path;
        }
        if let Some(seconds) = args.tool_timeout.or(file.tool_timeout_secs) {
            tools.timeout = Duration::from_secs(seconds.max(1));
        }

        let export = args.output.map(|path| {
            let format = args
                .export_format
                .unwrap_or_else(|| ExportFormat::from_path(&path));
            (path, format)
        });

        Ok(Self {
            input: args.input,
            scan: ScanOptions {
                recursive: args.recursive,
                include_hidden: args.include_hidden || file.include_hidden,
                extensions,
            },
            extract: ExtractOptions {
                include_hash: args.hash,
                extract_text: args.extract_text,
                force_exiftool,
            },
            tools,
            rules,
            output: OutputSettings {
                format: args.format,
                summary: args.summary,
                quiet: args.quiet,
                color: !args.no_color,
                export,
            },
        })
    }
}
