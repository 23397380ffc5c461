use crate::metadata::console::ConsoleFormat;
use crate::metadata::export::ExportFormat;
use clap::Parser;
use std::path::PathBuf;

/// Extrae la metadata de archivos y directorios y marca los campos de
/// interés forense (GPS, autores, dispositivos, fechas).
#[derive(Clone, Debug, Parser)]
#[command(name = "metascope", version, about)]
pub struct Args {
    /// Archivo o directorio a analizar.
    pub input: PathBuf,

    /// Recorre los subdirectorios.
    #[arg(short, long)]
    pub recursive: bool,

    /// Guarda el reporte en un archivo; el formato sale de la extensión.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fuerza el formato de exportación.
    #[arg(long, value_enum, value_name = "FORMAT", requires = "output")]
    pub export_format: Option<ExportFormat>,

    /// Formato de salida en consola.
    #[arg(short, long, value_enum, default_value_t = ConsoleFormat::Table)]
    pub format: ConsoleFormat,

    /// En directorios, una línea por archivo y un resumen final.
    #[arg(short, long)]
    pub summary: bool,

    /// No imprime nada en consola.
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long)]
    pub no_color: bool,

    /// Solo archivos con estas extensiones (p. ej. `jpg,pdf`).
    #[arg(short, long, value_delimiter = ',', value_name = "LIST")]
    pub extensions: Vec<String>,

    /// Incluye archivos y directorios ocultos.
    #[arg(long)]
    pub include_hidden: bool,

    /// Agrega una vista previa del texto de PDF y DOCX.
    #[arg(long)]
    pub extract_text: bool,

    /// Calcula MD5 y SHA-256.
    #[arg(long)]
    pub hash: bool,

    /// Usa ExifTool si está instalado.
    #[arg(long)]
    pub exiftool: bool,

    /// ExifTool como extractor principal para todos los tipos; implica
    /// `--exiftool`.
    #[arg(long)]
    pub force_exiftool: bool,

    /// Usa ffprobe si está instalado.
    #[arg(long)]
    pub ffprobe: bool,

    /// Tiempo límite por herramienta externa, en segundos.
    #[arg(long, value_name = "SECS")]
    pub tool_timeout: Option<u64>,

    /// Reglas de interés en TOML; reemplazan a las integradas.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Archivo de configuración TOML.
    #[arg(long, value_name = "FILE", env = "METASCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Registros informativos en stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Registros de depuración en stderr.
    #[arg(long)]
    pub debug: bool,
}
