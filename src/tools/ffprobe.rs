use super::MetadataProbe;
use super::runner::run_with_timeout;
use crate::detection::FileKind;
use crate::error::ToolError;
use crate::metadata::report::{ExtractorResult, FieldMap, MetadataValue};
use regex::Regex;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

pub const SOURCE: &str = "ffprobe";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ffprobe version (\S+)").expect("el patrón de versión es válido")
});

const STREAM_FIELDS: [&str; 14] = [
    "codec_type",
    "codec_name",
    "codec_long_name",
    "profile",
    "sample_rate",
    "channels",
    "channel_layout",
    "bit_rate",
    "duration",
    "width",
    "height",
    "pix_fmt",
    "r_frame_rate",
    "nb_frames",
];

pub struct FfProbe {
    program: PathBuf,
    timeout: Duration,
}

impl FfProbe {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Ejecuta `ffprobe -version` y extrae el número de versión.
    pub fn check(program: &Path, timeout: Duration) -> Result<String, ToolError> {
        let output = run_with_timeout(program, &["-version"], timeout)?;
        if !output.success {
            return Err(ToolError::Failed {
                tool: program.display().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let banner = String::from_utf8_lossy(&output.stdout);
        let version = VERSION_PATTERN
            .captures(&banner)
            .and_then(|caps| caps.get(1))
            .map(|version| version.as_str().to_string())
            .unwrap_or_else(|| "desconocida".to_string());
        Ok(version)
    }
}

impl MetadataProbe for FfProbe {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn handles(&self, kind: FileKind) -> bool {
        matches!(kind, FileKind::Audio | FileKind::Video)
    }

    fn probe(&self, path: &Path) -> Result<ExtractorResult, ToolError> {
        let args = [
            OsStr::new("-v"),
            OsStr::new("quiet"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_format"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = run_with_timeout(&self.program, &args, self.timeout)?;
        if !output.success {
            return Err(ToolError::Failed {
                tool: SOURCE.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let fields = parse_ffprobe_json(&output.stdout).map_err(|source| ToolError::InvalidOutput {
            tool: SOURCE.to_string(),
            source,
        })?;
        let mut result = ExtractorResult::new(SOURCE);
        result.fields = fields;
        Ok(result)
    }
}

/// Aplana `format` y `streams` a claves `format.*`, `tag.*` y `stream<N>.*`.
pub fn parse_ffprobe_json(stdout: &[u8]) -> Result<FieldMap, serde_json::Error> {
    let json: Value = serde_json::from_slice(stdout)?;
    let mut fields = FieldMap::new();

    if let Some(format) = json.get("format").and_then(Value::as_object) {
        for (key, value) in format {
            match key.as_str() {
                "filename" => {}
                "tags" => flatten_tags(value, "tag", &mut fields),
                _ => insert_scalar(&mut fields, format!("format.{key}"), value),
            }
        }
    }

    if let Some(streams) = json.get("streams").and_then(Value::as_array) {
        for (position, stream) in streams.iter().enumerate() {
            let index = stream
                .get("index")
                .and_then(Value::as_u64)
                .unwrap_or(position as u64);
            let prefix = format!("stream{index}");
            for field in STREAM_FIELDS {
                if let Some(value) = stream.get(field) {
                    insert_scalar(&mut fields, format!("{prefix}.{field}"), value);
                }
            }
            if let Some(tags) = stream.get("tags") {
                flatten_tags(tags, &format!("{prefix}.tag"), &mut fields);
            }
        }
    }

    Ok(fields)
}

fn flatten_tags(tags: &Value, prefix: &str, fields: &mut FieldMap) {
    if let Some(tags) = tags.as_object() {
        for (key, value) in tags {
            insert_scalar(fields, format!("{prefix}.{key}"), value);
        }
    }
}

fn insert_scalar(fields: &mut FieldMap, key: String, value: &Value) {
    if value.is_object() {
        return;
    }
    if let Some(value) = MetadataValue::from_json(value.clone()) {
        fields.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "disposition": {"default": 1},
                "tags": {"creation_time": "2024-05-05T12:00:00.000000Z", "handler_name": "Core Media Video"}
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "44100",
                "channels": 2
            }
        ],
        "format": {
            "filename": "/tmp/clip.mov",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "12.345000",
            "tags": {
                "com.apple.quicktime.make": "Apple",
                "com.apple.quicktime.location.ISO6709": "+40.4168-003.7038+650.000/"
            }
        }
    }"#;

    #[test]
    fn flattens_format_streams_and_tags() -> Result<(), serde_json::Error> {
        let fields = parse_ffprobe_json(SAMPLE)?;

        assert!(!fields.contains_key("format.filename"));
        assert_eq!(
            fields.get("format.duration"),
            Some(&MetadataValue::Text("12.345000".into()))
        );
        assert_eq!(
            fields.get("tag.com.apple.quicktime.make"),
            Some(&MetadataValue::Text("Apple".into()))
        );
        assert_eq!(fields.get("stream0.width"), Some(&MetadataValue::Integer(1920)));
        assert_eq!(
            fields.get("stream0.tag.creation_time"),
            Some(&MetadataValue::Text("2024-05-05T12:00:00.000000Z".into()))
        );
        assert_eq!(fields.get("stream1.channels"), Some(&MetadataValue::Integer(2)));
        assert!(!fields.keys().any(|key| key.contains("disposition")));
        Ok(())
    }

    #[test]
    fn version_is_read_from_banner() {
        let banner = "ffprobe version 6.1.1-3ubuntu5 Copyright (c) 2007-2023 the FFmpeg developers";
        let version = VERSION_PATTERN
            .captures(banner)
            .and_then(|caps| caps.get(1))
            .map(|version| version.as_str());
        assert_eq!(version, Some("6.1.1-3ubuntu5"));
    }

    #[test]
    fn only_audio_and_video_are_handled() {
        let probe = FfProbe::new(PathBuf::from("ffprobe"), Duration::from_secs(1));
        assert!(probe.handles(FileKind::Video));
        assert!(probe.handles(FileKind::Audio));
        assert!(!probe.handles(FileKind::Pdf));
    }
}
