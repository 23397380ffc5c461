//! Extraccion de metadata para documentos ODF (ODT/ODS/ODP).

use crate::advanced_metadata::office::{SOURCE, child_elements, element_text_content, read_part};
use crate::error::ExtractError;
use crate::metadata::report::ExtractorResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xmltree::{Element, XMLNode};
use zip::ZipArchive;

const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const META_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

const CONTENT_LIMIT: u64 = 8 * 1024 * 1024;

pub fn extract_odf_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut archive = ZipArchive::new(file)?;
    let mut result = ExtractorResult::new(SOURCE);

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut mimetype = String::new();
        if entry.read_to_string(&mut mimetype).is_ok() {
            result.insert("MimeType", mimetype.trim().to_string());
        }
    }

    if let Some(manifest) = read_part(&mut archive, "META-INF/manifest.xml")? {
        result.insert("Encrypted", contains_element(&manifest, "encryption-data"));
    }

    if let Some(root) = read_part(&mut archive, "meta.xml")?
        && let Some(meta) = child_elements(&root)
            .find(|child| child.name == "meta" && child.namespace.as_deref() == Some(OFFICE_NS))
    {
        extract_meta_properties(meta, &mut result);
    }

    let content_small = archive
        .by_name("content.xml")
        .map(|entry| entry.size() <= CONTENT_LIMIT)
        .unwrap_or(false);
    if content_small
        && let Some(content) = read_part(&mut archive, "content.xml")?
        && contains_tracked_changes(&content)
    {
        result.insert("TrackedChanges", true);
    }

    Ok(result)
}

fn extract_meta_properties(meta: &Element, result: &mut ExtractorResult) {
    let mut keywords = Vec::new();
    for child in child_elements(meta) {
        match child.name.as_str() {
            "keyword" => keywords.push(element_text_content(child)),
            "document-statistic" => {
                for (key, value) in &child.attributes {
                    let key = key.rsplit(':').next().unwrap_or(key);
                    result.insert(format!("Meta.statistic.{key}"), value.clone());
                }
            }
            "user-defined" => {
                let name = child
                    .attributes
                    .iter()
                    .find(|(key, _)| key.rsplit(':').next() == Some("name"))
                    .map(|(_, value)| value.trim().to_string());
                if let Some(name) = name.filter(|name| !name.is_empty()) {
                    result.insert(format!("Meta.user.{name}"), element_text_content(child));
                }
            }
            "template" | "hyperlink-behaviour" | "auto-reload" => {
                if let Some((_, href)) = child
                    .attributes
                    .iter()
                    .find(|(key, _)| key.rsplit(':').next() == Some("href"))
                {
                    result.insert(format!("Meta.{}", child.name), href.clone());
                }
            }
            name if child.namespace.as_deref() == Some(META_NS)
                || child.namespace.as_deref() == Some("http://purl.org/dc/elements/1.1/") =>
            {
                result.insert(format!("Meta.{name}"), element_text_content(child));
            }
            _ => {}
        }
    }
    keywords.retain(|keyword| !keyword.is_empty());
    result.insert("Meta.keyword", keywords);
}

fn contains_element(root: &Element, name: &str) -> bool {
    root.name == name
        || root.children.iter().any(|node| match node {
            XMLNode::Element(child) => contains_element(child, name),
            _ => false,
        })
}

fn contains_tracked_changes(root: &Element) -> bool {
    (root.name == "tracked-changes" && root.namespace.as_deref() == Some(TEXT_NS))
        || child_elements(root).any(contains_tracked_changes)
}
