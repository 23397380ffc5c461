//! Extracción de metadata en PDFs: diccionario Info, estructura, XMP y
//! señales de contenido activo.

use crate::advanced_metadata::xmp::parse_xmp_packet;
use crate::error::ExtractError;
use crate::formatting::{collapse_whitespace, truncate_chars};
use crate::metadata::report::{EntryLevel, ExtractorResult, MetadataValue};
use lopdf::{Dictionary, Document, Object};
use std::path::Path;
use tracing::debug;

pub const SOURCE: &str = "pdf";

pub const TEXT_PREVIEW_CHARS: usize = 200;

/// Nombres de acciones y objetos que delatan contenido ejecutable o embebido.
const ACTIVE_CONTENT_KEYS: [(&[u8], &str); 6] = [
    (b"JavaScript", "JavaScript"),
    (b"JS", "JavaScript"),
    (b"OpenAction", "OpenAction"),
    (b"Launch", "LaunchAction"),
    (b"EmbeddedFile", "EmbeddedFile"),
    (b"RichMedia", "RichMedia"),
];

pub fn extract_pdf_metadata(path: &Path, extract_text: bool) -> Result<ExtractorResult, ExtractError> {
    let doc = Document::load(path)?;
    let mut result = ExtractorResult::new(SOURCE);

    result.insert("Version", doc.version.clone());
    let pages = doc.get_pages();
    result.insert("Pages", pages.len());

    let encrypted = doc.trailer.get(b"Encrypt").is_ok();
    result.insert("Encrypted", encrypted);

    if let Ok(info) = doc.trailer.get(b"Info")
        && let Some(info) = deref_dictionary(&doc, info)
    {
        for (key, value) in info.iter() {
            if let Some(value) = object_to_value(&doc, value) {
                result.insert(String::from_utf8_lossy(key).into_owned(), value);
            }
        }
    }

    if let Some(packet) = read_xmp_packet(&doc) {
        match parse_xmp_packet(&packet) {
            Some(fields) => {
                for (key, value) in fields {
                    result.insert(format!("XMP.{key}"), value);
                }
            }
            None => result.note(EntryLevel::Warning, "El paquete XMP no es XML válido"),
        }
    }

    for (label, count) in count_active_content(&doc) {
        result.insert(label, count);
    }

    if extract_text && !encrypted {
        if let Some(first_page) = pages.keys().next().copied() {
            match doc.extract_text(&[first_page]) {
                Ok(text) => {
                    let preview = collapse_whitespace(&text);
                    result.insert("TextPreview", truncate_chars(&preview, TEXT_PREVIEW_CHARS));
                }
                Err(error) => {
                    debug!(path = %path.display(), %error, "sin texto extraíble");
                    result.note(EntryLevel::Info, "La primera página no tiene texto extraíble");
                }
            }
        }
    }

    Ok(result)
}

fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn object_to_value(doc: &Document, obj: &Object) -> Option<MetadataValue> {
    match obj {
        Object::String(bytes, _) => Some(MetadataValue::Text(decode_pdf_string(bytes))),
        Object::Name(name) => Some(MetadataValue::Text(
            String::from_utf8_lossy(name).trim().to_string(),
        )),
        Object::Integer(value) => Some(MetadataValue::Integer(*value)),
        Object::Real(value) => Some(MetadataValue::Float(f64::from(*value))),
        Object::Boolean(value) => Some(MetadataValue::Bool(*value)),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .ok()
            .and_then(|inner| match inner {
                Object::Reference(_) => None,
                other => object_to_value(doc, other),
            }),
        _ => None,
    }
}

/// Las cadenas de texto PDF son UTF-16BE cuando empiezan con BOM; si no, se
/// leen como Latin-1/PDFDocEncoding.
fn decode_pdf_string(bytes: &[u8]) -> String {
    let text = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();
        String::from_utf16_lossy(&units)
    } else if let Ok(utf8) = std::str::from_utf8(bytes) {
        utf8.to_string()
    } else {
        bytes.iter().map(|&byte| char::from(byte)).collect()
    };
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string()
}

fn read_xmp_packet(doc: &Document) -> Option<String> {
    let root = doc.trailer.get(b"Root").ok()?;
    let catalog = deref_dictionary(doc, root)?;
    let metadata_ref = catalog.get(b"Metadata").ok()?.as_reference().ok()?;
    let stream = doc.get_object(metadata_ref).ok()?.as_stream().ok()?;
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Some(String::from_utf8_lossy(&content).into_owned())
}

/// Cuenta diccionarios que contienen claves de contenido activo. Solo se
/// devuelven las señales presentes.
fn count_active_content(doc: &Document) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for object in doc.objects.values() {
        let dict = match object {
            Object::Dictionary(dict) => dict,
            Object::Stream(stream) => &stream.dict,
            _ => continue,
        };
        for (key, label) in ACTIVE_CONTENT_KEYS {
            let present = dict.has(key)
                || dict
                    .get(b"S")
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == key)
                || dict
                    .get(b"Type")
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == key);
            if present {
                match counts.iter_mut().find(|(existing, _)| *existing == label) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((label, 1)),
                }
                break;
            }
        }
    }
    counts
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Document, Object, Stream, dictionary};
    use std::path::Path;

    /// PDF de una página con texto. `info` añade un diccionario Info con los
    /// pares indicados y `with_js` una OpenAction JavaScript.
    pub fn write_pdf(
        path: &Path,
        info: &[(&str, &str)],
        with_js: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("Informe confidencial")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if with_js {
            let action_id = doc.add_object(dictionary! {
                "S" => "JavaScript",
                "JS" => Object::string_literal("app.alert('hola');"),
            });
            catalog.set("OpenAction", action_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if !info.is_empty() {
            let mut info_dict = Dictionary::new();
            for (key, value) in info {
                info_dict.set(key.as_bytes().to_vec(), Object::string_literal(*value));
            }
            let info_id = doc.add_object(info_dict);
            doc.trailer.set("Info", info_id);
        }

        doc.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_pdf;
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn reads_info_dictionary_and_structure() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("informe.pdf");
        write_pdf(
            &path,
            &[
                ("Author", "Jane Doe"),
                ("Producer", "LibreOffice 7.5"),
                ("CreationDate", "D:20240101120000Z"),
            ],
            false,
        )?;

        let result = extract_pdf_metadata(&path, false)?;

        assert_eq!(result.fields.get("Author"), Some(&MetadataValue::Text("Jane Doe".into())));
        assert_eq!(
            result.fields.get("Producer"),
            Some(&MetadataValue::Text("LibreOffice 7.5".into()))
        );
        assert_eq!(result.fields.get("Pages"), Some(&MetadataValue::Integer(1)));
        assert_eq!(result.fields.get("Version"), Some(&MetadataValue::Text("1.5".into())));
        assert_eq!(result.fields.get("Encrypted"), Some(&MetadataValue::Bool(false)));
        assert!(!result.fields.contains_key("JavaScript"));
        Ok(())
    }

    #[test]
    fn pdf_without_info_is_valid() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("limpio.pdf");
        write_pdf(&path, &[], false)?;

        let result = extract_pdf_metadata(&path, false)?;

        assert!(!result.fields.contains_key("Author"));
        assert!(result.notes.is_empty());
        Ok(())
    }

    #[test]
    fn flags_javascript_actions() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("activo.pdf");
        write_pdf(&path, &[], true)?;

        let result = extract_pdf_metadata(&path, false)?;

        assert_eq!(result.fields.get("JavaScript"), Some(&MetadataValue::Integer(1)));
        Ok(())
    }

    #[test]
    fn text_preview_is_bounded() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("texto.pdf");
        write_pdf(&path, &[], false)?;

        let result = extract_pdf_metadata(&path, true)?;

        let preview = result
            .fields
            .get("TextPreview")
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(preview.contains("Informe confidencial"));
        assert!(preview.chars().count() <= TEXT_PREVIEW_CHARS + 1);
        Ok(())
    }

    #[test]
    fn utf16_strings_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, b'J', 0x00, 0xF3, 0x00, b'n'];
        assert_eq!(decode_pdf_string(&bytes), "Jón");
    }

    #[test]
    fn garbage_is_an_error() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("roto.pdf");
        std::fs::write(&path, b"%PDF-1.4\nbasura sin xref")?;

        assert!(extract_pdf_metadata(&path, false).is_err());
        Ok(())
    }
}
