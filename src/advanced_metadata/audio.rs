//! Propiedades del contenedor y etiquetas de audio mediante lofty.

use crate::error::ExtractError;
use crate::formatting::format_duration;
use crate::metadata::report::ExtractorResult;
use lofty::{AudioFile, ItemKey, ItemValue, TaggedFileExt};
use std::path::Path;

pub const SOURCE: &str = "audio";

pub fn extract_audio_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let tagged_file = lofty::read_from_path(path)?;
    let mut result = ExtractorResult::new(SOURCE);

    result.insert("FileType", format!("{:?}", tagged_file.file_type()));

    let properties = tagged_file.properties();
    let duration = properties.duration();
    result.insert("Duration", format_duration(duration));
    result.insert(
        "DurationSeconds",
        (duration.as_secs_f64() * 100.0).round() / 100.0,
    );
    if let Some(bitrate) = properties.overall_bitrate() {
        result.insert("OverallBitrate", format!("{bitrate} kbps"));
    }
    if let Some(bitrate) = properties.audio_bitrate() {
        result.insert("AudioBitrate", format!("{bitrate} kbps"));
    }
    if let Some(sample_rate) = properties.sample_rate() {
        result.insert("SampleRate", sample_rate);
    }
    if let Some(channels) = properties.channels() {
        result.insert("Channels", u32::from(channels));
    }
    if let Some(bit_depth) = properties.bit_depth() {
        result.insert("BitDepth", u32::from(bit_depth));
    }

    let tag_types = tagged_file
        .tags()
        .iter()
        .map(|tag| format!("{:?}", tag.tag_type()))
        .collect::<Vec<_>>();
    result.insert("TagTypes", tag_types);

    for tag in tagged_file.tags() {
        let prefix = format!("{:?}", tag.tag_type());
        for item in tag.items() {
            let key = match item.key() {
                ItemKey::Unknown(native) => native.clone(),
                known => format!("{known:?}"),
            };
            let value = match item.value() {
                ItemValue::Text(text) | ItemValue::Locator(text) => {
                    text.trim_end_matches('\0').trim().to_string()
                }
                ItemValue::Binary(bytes) => format!("<datos binarios: {} bytes>", bytes.len()),
            };
            result.insert(format!("{prefix}.{key}"), value);
        }
        if !tag.pictures().is_empty() {
            result.insert(format!("{prefix}.Pictures"), tag.pictures().len());
        }
    }

    Ok(result)
}
