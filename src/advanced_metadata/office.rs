//! Lectura de metadata en documentos Office empaquetados en ZIP.

use crate::advanced_metadata::odf;
use crate::detection::{DOCX_MIME, is_odf, is_ooxml};
use crate::error::ExtractError;
use crate::formatting::{collapse_whitespace, truncate_chars};
use crate::metadata::report::{EntryLevel, ExtractorResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xmltree::{Element, XMLNode};
use zip::ZipArchive;

pub const SOURCE: &str = "office";

pub const TEXT_PREVIEW_CHARS: usize = 200;

const PART_LIMIT: u64 = 8 * 1024 * 1024;

const CORE_NAMESPACES: [&str; 3] = [
    "http://purl.org/dc/elements/1.1/",
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
    "http://purl.org/dc/terms/",
];
const APP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn extract_office_metadata(
    path: &Path,
    mime: Option<&str>,
    extract_text: bool,
) -> Result<ExtractorResult, ExtractError> {
    match mime {
        Some(mime) if is_odf(mime) => odf::extract_odf_metadata(path),
        Some(mime) if is_ooxml(mime) => extract_ooxml_metadata(path, mime == DOCX_MIME && extract_text),
        _ => {
            let mut result = ExtractorResult::new(SOURCE);
            result.insert("Format", "OLE2 (Office 97-2003)");
            result.note(
                EntryLevel::Info,
                "Formato Office heredado: las propiedades OLE requieren --exiftool",
            );
            Ok(result)
        }
    }
}

fn extract_ooxml_metadata(path: &Path, text_preview: bool) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut archive = ZipArchive::new(file)?;
    let mut result = ExtractorResult::new(SOURCE);

    if let Some(root) = read_part(&mut archive, "docProps/core.xml")? {
        for child in child_elements(&root) {
            if child
                .namespace
                .as_deref()
                .is_some_and(|ns| CORE_NAMESPACES.contains(&ns))
            {
                result.insert(format!("Core.{}", child.name), element_text_content(child));
            }
        }
    }

    if let Some(root) = read_part(&mut archive, "docProps/app.xml")? {
        for child in child_elements(&root) {
            if child.namespace.as_deref() == Some(APP_NS) {
                result.insert(format!("App.{}", child.name), element_text_content(child));
            }
        }
    }

    if let Some(root) = read_part(&mut archive, "docProps/custom.xml")? {
        for (name, value) in extract_custom_properties(&root) {
            result.insert(format!("Custom.{name}"), value);
        }
    }

    if archive.by_name("word/vbaProject.bin").is_ok()
        || archive.by_name("xl/vbaProject.bin").is_ok()
        || archive.by_name("ppt/vbaProject.bin").is_ok()
    {
        result.insert("Macros", true);
    }

    if text_preview && let Some(document) = read_part(&mut archive, "word/document.xml")? {
        let mut runs = Vec::new();
        collect_word_text(&document, &mut runs);
        let text = collapse_whitespace(&runs.join(" "));
        result.insert("TextPreview", truncate_chars(&text, TEXT_PREVIEW_CHARS));
    }

    Ok(result)
}

/// Lee y parsea una parte XML del paquete; las partes ausentes no son error.
pub(crate) fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> Result<Option<Element>, ExtractError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    if part.size() > PART_LIMIT {
        return Ok(None);
    }
    let mut contents = String::new();
    part.read_to_string(&mut contents)
        .map_err(|error| ExtractError::Xml {
            part: name.to_string(),
            message: error.to_string(),
        })?;
    Element::parse(contents.as_bytes())
        .map(Some)
        .map_err(|error| ExtractError::Xml {
            part: name.to_string(),
            message: error.to_string(),
        })
}

pub(crate) fn child_elements(root: &Element) -> impl Iterator<Item = &Element> {
    root.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

pub(crate) fn element_text_content(element: &Element) -> String {
    let mut content = String::new();
    for node in &element.children {
        if let XMLNode::Text(text) = node {
            content.push_str(text);
        }
    }
    content.trim().to_string()
}

fn extract_custom_properties(root: &Element) -> Vec<(String, String)> {
    child_elements(root)
        .filter(|child| child.name == "property")
        .filter_map(|child| {
            let name = child.attributes.get("name")?.trim();
            if name.is_empty() {
                return None;
            }
            let value = child_elements(child)
                .next()
                .map(element_text_content)
                .unwrap_or_default();
            Some((name.to_string(), value))
        })
        .collect()
}

fn collect_word_text(element: &Element, runs: &mut Vec<String>) {
    for node in &element.children {
        if let XMLNode::Element(child) = node {
            if child.name == "t" && child.namespace.as_deref() == Some(WORD_NS) {
                runs.push(element_text_content(child));
            } else {
                collect_word_text(child, runs);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use zip::CompressionMethod;
    use zip::write::{FileOptions, ZipWriter};

    pub fn write_sample_docx(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::<'_, ()>::default().compression_method(CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"></Types>"#)?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:creator>Alice</dc:creator>
  <cp:lastModifiedBy>Bob</cp:lastModifiedBy>
  <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
  <dc:title>Plan trimestral</dc:title>
  <dc:subject></dc:subject>
</cp:coreProperties>"#,
        )?;

        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Application>Microsoft Office Word</Application>
  <Company>Acme Corp</Company>
  <Pages>3</Pages>
</Properties>"#,
        )?;

        zip.start_file("docProps/custom.xml", options)?;
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Cliente"><vt:lpwstr>Banco Sur</vt:lpwstr></property>
</Properties>"#,
        )?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body><w:p><w:r><w:t>Hola</w:t></w:r><w:r><w:t>mundo</w:t></w:r></w:p></w:body>
</w:document>"#,
        )?;

        zip.finish()?;
        Ok(())
    }
}
