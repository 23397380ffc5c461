//! Extracción de metadata de archivos ZIP.

use crate::error::ExtractError;
use crate::metadata::report::ExtractorResult;
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

pub const SOURCE: &str = "archive";

const LISTED_ENTRIES: usize = 20;

pub fn extract_archive_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut archive = ZipArchive::new(file)?;
    let mut result = ExtractorResult::new(SOURCE);

    result.insert("Entries", archive.len());
    if let Ok(comment) = std::str::from_utf8(archive.comment()) {
        result.insert("Comment", comment.trim().to_string());
    }

    let mut uncompressed = 0_u64;
    let mut compressed = 0_u64;
    let mut encrypted = 0_usize;
    let mut directories = 0_usize;
    let mut newest: Option<zip::DateTime> = None;
    let mut listed = Vec::new();

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        uncompressed += entry.size();
        compressed += entry.compressed_size();
        if entry.encrypted() {
            encrypted += 1;
        }
        if entry.is_dir() {
            directories += 1;
        }
        let modified = entry.last_modified();
        if let Some(time) = modified
            && newest.is_none_or(|current| date_key(&time) > date_key(&current))
        {
            newest = Some(time);
        }
        if listed.len() < LISTED_ENTRIES {
            let date = modified.map(|time| format_zip_date(&time)).unwrap_or_else(|| "N/D".to_string());
            listed.push(format!("{} ({} bytes, {date})", entry.name(), entry.size()));
        }
    }

    result.insert("UncompressedSize", uncompressed);
    result.insert("CompressedSize", compressed);
    result.insert("EncryptedEntries", encrypted);
    result.insert("Directories", directories);
    if let Some(time) = newest {
        result.insert("NewestEntryDate", format_zip_date(&time));
    }
    for (index, entry) in listed.into_iter().enumerate() {
        result.insert(format!("Entry.{:03}", index + 1), entry);
    }
    if archive.len() > LISTED_ENTRIES {
        result.insert("EntriesNotListed", archive.len() - LISTED_ENTRIES);
    }

    Ok(result)
}

fn date_key(time: &zip::DateTime) -> (u16, u8, u8, u8, u8, u8) {
    (
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
    )
}

fn format_zip_date(time: &zip::DateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}
