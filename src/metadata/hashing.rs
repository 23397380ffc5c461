//! Cálculo de hashes para identificar el archivo analizado.

use crate::error::ExtractError;
use crate::metadata::report::{EntryLevel, ExtractorResult};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

pub const SOURCE: &str = "hashes";

const HASH_SIZE_LIMIT: u64 = 256 * 1024 * 1024; // 256 MiB

/// Calcula MD5 y SHA-256 en una sola pasada. Los archivos que superan el
/// límite se omiten con una nota informativa.
pub fn extract_hashes(path: &Path) -> Result<ExtractorResult, ExtractError> {
    extract_hashes_with_limit(path, HASH_SIZE_LIMIT)
}

fn extract_hashes_with_limit(path: &Path, limit: u64) -> Result<ExtractorResult, ExtractError> {
    let mut result = ExtractorResult::new(SOURCE);
    let metadata = fs::metadata(path).map_err(|error| ExtractError::io(path, error))?;

    if metadata.len() > limit {
        result.note(
            EntryLevel::Info,
            format!("Hashes omitidos (> {} MiB)", limit / (1024 * 1024)),
        );
        return Ok(result);
    }

    let mut file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|error| ExtractError::io(path, error))?;
        if bytes_read == 0 {
            break;
        }
        md5.update(&buffer[..bytes_read]);
        sha256.update(&buffer[..bytes_read]);
    }

    result.insert("MD5", format!("{:x}", md5.finalize()));
    result.insert("SHA256", format!("{:x}", sha256.finalize()));
    Ok(result)
}
