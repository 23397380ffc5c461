//! Atributos del sistema de archivos: tamaño, fechas, permisos y dueño.

use crate::error::ExtractError;
use crate::formatting::{format_size, format_system_time};
use crate::metadata::report::ExtractorResult;
use std::fs;
use std::path::Path;

pub const SOURCE: &str = "filesystem";

pub fn extract_filesystem_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let link_metadata = fs::symlink_metadata(path).map_err(|error| ExtractError::io(path, error))?;
    let mut result = ExtractorResult::new(SOURCE);

    if let Some(name) = path.file_name() {
        result.insert("FileName", name.to_string_lossy().into_owned());
    }
    if let Ok(real_path) = fs::canonicalize(path) {
        result.insert("Path", real_path.display().to_string());
    }
    if let Some(extension) = path.extension() {
        result.insert("Extension", extension.to_string_lossy().into_owned());
    }

    if link_metadata.file_type().is_symlink() {
        let target = fs::read_link(path)
            .map(|target| target.display().to_string())
            .unwrap_or_else(|_| "No disponible".to_string());
        result.insert("SymlinkTarget", target);
    }

    let metadata = fs::metadata(path).map_err(|error| ExtractError::io(path, error))?;
    result.insert("Size", metadata.len());
    result.insert("SizeHuman", format_size(metadata.len()));

    if let Ok(time) = metadata.modified() {
        result.insert("Modified", format_system_time(time));
    }
    if let Ok(time) = metadata.accessed() {
        result.insert("Accessed", format_system_time(time));
    }
    if let Ok(time) = metadata.created() {
        result.insert("Created", format_system_time(time));
    }

    result.insert("ReadOnly", metadata.permissions().readonly());

    #[cfg(unix)]
    {
        use super::permissions::{format_unix_permissions, group_name, owner_name};
        use std::os::unix::fs::PermissionsExt;

        let mode = metadata.permissions().mode();
        result.insert("Permissions", format!("{:04o}", mode & 0o7777));
        result.insert("PermissionsSymbolic", format_unix_permissions(mode));
        if let Some(owner) = owner_name(&metadata) {
            result.insert("Owner", owner);
        }
        if let Some(group) = group_name(&metadata) {
            result.insert("Group", group);
        }
    }

    Ok(result)
}
