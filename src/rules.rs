//! Reglas de interés forense.
//!
//! Una regla asocia una categoría con una expresión regular que se evalúa
//! contra el nombre de cada campo. Las reglas integradas pueden reemplazarse
//! con un archivo TOML:
//!
//! ```toml
//! exclude_namespaces = ["filesystem", "hashes"]
//!
//! [[rules]]
//! category = "gps"
//! pattern = "gps|latitude|longitude"
//!
//! [[rules]]
//! category = "software"
//! pattern = "producer|generator"
//! namespaces = ["pdf"]
//! ```

use crate::error::ConfigError;
use crate::metadata::report::{FieldMap, FlaggedField};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const DEFAULT_RULES: [(&str, &str); 5] = [
    (
        "gps",
        r"(^|[.:_-])gps|latitude|longitude|altitude|geolocation|(^|[.:])location",
    ),
    (
        "author",
        "author|creator|producer|owner|artist|lastmodifiedby|last_modified_by|company|manager|copyright",
    ),
    (
        "device",
        "make|model|software|device|camera|phone|serial|lens|recorder|hostcomputer|generator|encoder",
    ),
    (
        "timestamp",
        "date|created|modified|creation|timestamp|printed",
    ),
    (
        "active-content",
        "javascript|openaction|launchaction|embeddedfile|richmedia",
    ),
];

const DEFAULT_EXCLUDED_NAMESPACES: [&str; 2] = ["filesystem", "hashes"];

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RuleSpec {
    pub category: String,
    pub pattern: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

/// Forma del archivo de reglas (o de la sección de reglas del archivo de
/// configuración).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    #[serde(default)]
    pub exclude_namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Clone, Debug)]
struct InterestRule {
    category: String,
    pattern: Regex,
    namespaces: Vec<String>,
}

impl InterestRule {
    fn compile(spec: RuleSpec) -> Result<Self, ConfigError> {
        let pattern = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                category: spec.category.clone(),
                pattern: spec.pattern.clone(),
                source,
            })?;
        Ok(Self {
            category: spec.category,
            pattern,
            namespaces: spec.namespaces,
        })
    }

    fn matches(&self, namespace: &str, key: &str) -> bool {
        (self.namespaces.is_empty() || self.namespaces.iter().any(|ns| ns == namespace))
            && self.pattern.is_match(key)
    }
}

#[derive(Clone, Debug)]
pub struct RuleSet {
    rules: Vec<InterestRule>,
    exclude_namespaces: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    pub fn builtin() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(category, pattern)| InterestRule {
                category: (*category).to_string(),
                pattern: RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("los patrones integrados son válidos"),
                namespaces: Vec::new(),
            })
            .collect();
        Self {
            rules,
            exclude_namespaces: default_excluded(),
        }
    }

    /// Compila reglas propias; reemplazan por completo a las integradas.
    pub fn from_specs(
        specs: Vec<RuleSpec>,
        exclude_namespaces: Option<Vec<String>>,
    ) -> Result<Self, ConfigError> {
        let rules = specs
            .into_iter()
            .map(InterestRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            exclude_namespaces: exclude_namespaces.unwrap_or_else(default_excluded),
        })
    }

    /// Mismas reglas con otra lista de espacios de nombres excluidos.
    pub fn excluding(mut self, namespaces: Vec<String>) -> Self {
        self.exclude_namespaces = namespaces;
        self
    }

    pub fn from_rule_file(file: RuleFile) -> Result<Self, ConfigError> {
        Self::from_specs(file.rules, file.exclude_namespaces)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(text)?;
        Self::from_rule_file(file)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RuleFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_rule_file(file)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Categoría de la primera regla que coincide con el campo.
    pub fn classify(&self, namespace: &str, key: &str) -> Option<&str> {
        if self.exclude_namespaces.iter().any(|ns| ns == namespace) {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(namespace, key))
            .map(|rule| rule.category.as_str())
    }

    pub fn flag(&self, metadata: &BTreeMap<String, FieldMap>) -> Vec<FlaggedField> {
        metadata
            .iter()
            .flat_map(|(namespace, fields)| {
                fields.iter().filter_map(move |(key, value)| {
                    self.classify(namespace, key).map(|category| FlaggedField {
                        category: category.to_string(),
                        namespace: namespace.clone(),
                        key: key.clone(),
                        value: value.clone(),
                    })
                })
            })
            .collect()
    }
}

fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED_NAMESPACES
        .iter()
        .map(|ns| (*ns).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::report::MetadataValue;

    fn metadata(entries: &[(&str, &str, &str)]) -> BTreeMap<String, FieldMap> {
        let mut map: BTreeMap<String, FieldMap> = BTreeMap::new();
        for (namespace, key, value) in entries {
            map.entry((*namespace).to_string())
                .or_default()
                .insert((*key).to_string(), MetadataValue::from(*value));
        }
        map
    }

    #[test]
    fn builtin_rules_cover_core_categories() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.classify("exif", "GPSLatitude"), Some("gps"));
        assert_eq!(rules.classify("exif", "DateTimeOriginal"), Some("timestamp"));
        assert_eq!(rules.classify("exif", "Model"), Some("device"));
        assert_eq!(rules.classify("pdf", "Author"), Some("author"));
        assert_eq!(rules.classify("exiftool", "Composite:GPSPosition"), Some("gps"));
        assert_eq!(rules.classify("exif", "ExposureTime"), None);
        assert_eq!(rules.classify("office", "Core.lastModifiedBy"), Some("author"));
        assert_eq!(rules.classify("office", "Core.modified"), Some("timestamp"));
    }

    #[test]
    fn gps_rule_ignores_layout_tags() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.classify("exif", "YCbCrPositioning"), None);
        assert_eq!(rules.classify("exif", "SubjectLocation"), None);
        assert_eq!(rules.classify("exif", "Thumbnail.YCbCrPositioning"), None);
        assert_eq!(rules.classify("exiftool", "GPS:GPSDateStamp"), Some("gps"));
        assert_eq!(rules.classify("exiftool", "XMP-exif:GPSAltitude"), Some("gps"));
        assert_eq!(
            rules.classify("ffprobe", "tag.com.apple.quicktime.location.ISO6709"),
            Some("gps")
        );
        assert_eq!(rules.classify("xmp", "GPSPosition"), Some("gps"));
    }

    #[test]
    fn excluded_namespaces_are_never_flagged() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.classify("filesystem", "Modified"), None);
        assert_eq!(rules.classify("hashes", "SHA256"), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = RuleSet::builtin();
        let flagged = rules.flag(&metadata(&[("exif", "GPSDateStamp", "2024:01:01")]));
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].category, "gps");
    }

    #[test]
    fn custom_rules_replace_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let rules = RuleSet::from_toml_str(
            r#"
            exclude_namespaces = []

            [[rules]]
            category = "tool"
            pattern = "^producer$"
            namespaces = ["pdf"]
            "#,
        )?;

        assert_eq!(rules.len(), 1);
        assert_eq!(rules.classify("pdf", "Producer"), Some("tool"));
        assert_eq!(rules.classify("pdf", "Author"), None);
        assert_eq!(rules.classify("office", "Producer"), None);
        assert_eq!(rules.classify("exif", "GPSLatitude"), None);
        Ok(())
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = RuleSet::from_toml_str(
            r#"
            [[rules]]
            category = "roto"
            pattern = "(sin cerrar"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }
}
