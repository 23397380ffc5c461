//! Recorrido de directorios para reunir los archivos a analizar.

use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    /// Extensiones aceptadas, sin punto y en minúsculas. Vacío acepta todo.
    pub extensions: Vec<String>,
}

impl ScanOptions {
    fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.extensions
            .iter()
            .any(|extension| name.ends_with(&format!(".{extension}")))
    }
}

/// Normaliza una lista como `JPG, .pdf` a `["jpg", "pdf"]`.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|extension| extension.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|extension| !extension.is_empty())
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Devuelve los archivos regulares bajo `root`, ordenados por ruta. No sigue
/// enlaces simbólicos; un directorio oculto descarta todo su subárbol.
pub fn collect_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || options.include_hidden || !is_hidden(entry));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if error.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: root.to_path_buf(),
                    source: error,
                });
            }
            Err(error) => {
                warn!(%error, "entrada omitida durante el recorrido");
                continue;
            }
        };
        if entry.file_type().is_file() && options.matches_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "archivos encontrados");
    Ok(files)
}
