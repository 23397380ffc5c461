//! Lectura de paquetes XMP embebidos en PDFs e imágenes.

use crate::error::ExtractError;
use crate::metadata::report::{ExtractorResult, FieldMap, MetadataValue};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xmltree::{Element, XMLNode};

pub const SOURCE: &str = "xmp";

const MAX_XMP_VALUE_LEN: usize = 2048;
const XMP_SCAN_LIMIT: u64 = 16 * 1024 * 1024;

/// Busca un paquete XMP en los primeros bytes del archivo. La ausencia de
/// paquete no es un error: produce un resultado vacío.
pub fn extract_xmp_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut bytes = Vec::new();
    file.take(XMP_SCAN_LIMIT)
        .read_to_end(&mut bytes)
        .map_err(|error| ExtractError::io(path, error))?;

    let mut result = ExtractorResult::new(SOURCE);
    let Some(packet) = find_packet(&bytes) else {
        return Ok(result);
    };
    match parse_xmp_packet(&packet) {
        Some(fields) => result.fields.extend(fields),
        None => result.note(
            crate::metadata::report::EntryLevel::Warning,
            "Se encontró un paquete XMP pero no es XML válido",
        ),
    }
    Ok(result)
}

fn find_packet(bytes: &[u8]) -> Option<String> {
    let start = find_bytes(bytes, b"<x:xmpmeta")?;
    let end_tag = b"</x:xmpmeta>";
    let end = find_bytes(&bytes[start..], end_tag)? + start + end_tag.len();
    Some(String::from_utf8_lossy(&bytes[start..end]).into_owned())
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Aplana las propiedades de cada `rdf:Description` a pares clave/valor. Las
/// claves usan el nombre local de la propiedad (`CreateDate`, `creator`).
pub fn parse_xmp_packet(packet: &str) -> Option<FieldMap> {
    let xml = extract_xmp_xml(packet)?;
    let root = Element::parse(xml.as_bytes()).ok()?;

    let mut fields = FieldMap::new();
    if let Some(toolkit) = root
        .attributes
        .iter()
        .find(|(key, _)| local_name(key) == "xmptk")
        .map(|(_, value)| value.trim().to_string())
    {
        push_value(&mut fields, "XMPToolkit".to_string(), toolkit);
    }
    collect_descriptions(&root, &mut fields);

    if let Some(position) = build_gps_position(&fields) {
        fields.insert("GPSPosition".to_string(), MetadataValue::Text(position));
    }
    Some(fields)
}

fn extract_xmp_xml(packet: &str) -> Option<String> {
    if let Some(xml) = slice_between(packet, "<x:xmpmeta", "</x:xmpmeta>") {
        return Some(xml.to_string());
    }
    if let Some(xml) = slice_between(packet, "<rdf:RDF", "</rdf:RDF>") {
        return Some(xml.to_string());
    }
    None
}

fn slice_between<'a>(value: &'a str, start_tag: &str, end_tag: &str) -> Option<&'a str> {
    let start = value.find(start_tag)?;
    let end = value[start..].find(end_tag)?;
    Some(&value[start..start + end + end_tag.len()])
}

fn collect_descriptions(element: &Element, fields: &mut FieldMap) {
    if element.name == "Description" {
        for (key, value) in &element.attributes {
            if local_name(key) != "about" {
                push_value(fields, local_name(key).to_string(), value.trim().to_string());
            }
        }
        for node in &element.children {
            if let XMLNode::Element(child) = node {
                push_value(fields, child.name.clone(), element_text(child));
            }
        }
    }

    for node in &element.children {
        if let XMLNode::Element(child) = node {
            collect_descriptions(child, fields);
        }
    }
}

fn push_value(fields: &mut FieldMap, key: String, value: String) {
    if value.is_empty() || value.len() > MAX_XMP_VALUE_LEN {
        return;
    }
    fields.entry(key).or_insert(MetadataValue::Text(value));
}

fn local_name(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

fn element_text(element: &Element) -> String {
    let mut parts = Vec::new();
    collect_text_nodes(element, &mut parts);
    parts
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn collect_text_nodes(element: &Element, values: &mut Vec<String>) {
    for node in &element.children {
        match node {
            XMLNode::Text(text) => values.push(text.trim().to_string()),
            XMLNode::Element(child) => collect_text_nodes(child, values),
            _ => {}
        }
    }
}

fn build_gps_position(fields: &FieldMap) -> Option<String> {
    let latitude = parse_xmp_coordinate(&fields.get("GPSLatitude")?.to_string())?;
    let longitude = parse_xmp_coordinate(&fields.get("GPSLongitude")?.to_string())?;
    Some(format!("{latitude:.6}, {longitude:.6}"))
}

/// Convierte `DDD,MM,SSk`, `DDD,MM.mmk` o un decimal simple a grados con signo.
fn parse_xmp_coordinate(value: &str) -> Option<f64> {
    let value = value.trim();
    let (body, reference) = match value.chars().last() {
        Some(last) if last.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], Some(last.to_ascii_uppercase()))
        }
        _ => (value, None),
    };

    let parts = body
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    let degrees = match parts.as_slice() {
        [degrees, minutes, seconds] => degrees + minutes / 60.0 + seconds / 3600.0,
        [degrees, minutes] => degrees + minutes / 60.0,
        [decimal] => *decimal,
        _ => return None,
    };

    Some(match reference {
        Some('S') | Some('W') => -degrees.abs(),
        _ => degrees,
    })
}
