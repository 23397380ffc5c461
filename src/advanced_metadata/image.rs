//! Metadata de imágenes: etiquetas EXIF, propiedades raster y texto PNG.

use crate::error::ExtractError;
use crate::metadata::report::{EntryLevel, ExtractorResult};
use exif::{Exif, In, Tag, Value};
use image::{ImageDecoder, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const EXIF_SOURCE: &str = "exif";
pub const RASTER_SOURCE: &str = "raster";
pub const PNG_TEXT_SOURCE: &str = "png-text";

const MAX_BINARY_PREVIEW: usize = 64;

/// Vuelca todas las etiquetas EXIF. Las del IFD principal usan el nombre de la
/// etiqueta; las de la miniatura llevan el prefijo `Thumbnail.`.
pub fn extract_exif_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut reader = BufReader::new(file);
    let mut result = ExtractorResult::new(EXIF_SOURCE);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(result),
        Err(error) => return Err(error.into()),
    };

    for field in exif.fields() {
        let key = match field.ifd_num {
            In::PRIMARY => field.tag.to_string(),
            In::THUMBNAIL => format!("Thumbnail.{}", field.tag),
            other => format!("IFD{}.{}", other.index(), field.tag),
        };
        result.insert(key, field_text(&exif, field));
    }

    if let Some(position) = gps_position(&exif) {
        result.insert("GPSPosition", position);
    }

    Ok(result)
}

fn field_text(exif: &Exif, field: &exif::Field) -> String {
    match &field.value {
        Value::Ascii(lines) => lines
            .iter()
            .map(|line| String::from_utf8_lossy(line).trim_end_matches('\0').trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Undefined(bytes, _) if bytes.len() > MAX_BINARY_PREVIEW => {
            format!("<datos binarios: {} bytes>", bytes.len())
        }
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

fn gps_position(exif: &Exif) -> Option<String> {
    let latitude = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    Some(format!("{latitude:.6}, {longitude:.6}"))
}

fn gps_coordinate(exif: &Exif, tag: Tag, reference: Tag, negative: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };
    let [degrees, minutes, seconds, ..] = parts.as_slice() else {
        return None;
    };
    let decimal = degrees.to_f64() + minutes.to_f64() / 60.0 + seconds.to_f64() / 3600.0;

    let is_negative = exif
        .get_field(reference, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Ascii(lines) => lines.first().and_then(|line| line.first()).copied(),
            _ => None,
        })
        .is_some_and(|first| first.to_ascii_uppercase() == negative);

    Some(if is_negative { -decimal } else { decimal })
}

/// Formato, dimensiones y tipo de color leyendo solo la cabecera.
pub fn extract_raster_metadata(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let reader = ImageReader::open(path)
        .map_err(|error| ExtractError::io(path, error))?
        .with_guessed_format()
        .map_err(|error| ExtractError::io(path, error))?;
    let mut result = ExtractorResult::new(RASTER_SOURCE);

    if let Some(format) = reader.format() {
        result.insert("Format", format!("{format:?}"));
    }

    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    result.insert("Width", width);
    result.insert("Height", height);
    result.insert("Dimensions", format!("{width}x{height}"));
    result.insert("ColorType", format!("{color:?}"));
    result.insert("BitsPerPixel", u32::from(color.bits_per_pixel()));
    Ok(result)
}

/// Fragmentos de texto PNG (tEXt, zTXt, iTXt) anteriores a los datos de imagen.
pub fn extract_png_text(path: &Path) -> Result<ExtractorResult, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::io(path, error))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_ignore_text_chunk(false);
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut result = ExtractorResult::new(PNG_TEXT_SOURCE);
    for chunk in &info.uncompressed_latin1_text {
        result.insert(chunk.keyword.clone(), chunk.text.clone());
    }
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => result.insert(chunk.keyword.clone(), text),
            Err(error) => result.note(
                EntryLevel::Warning,
                format!("No se pudo descomprimir `{}`: {error}", chunk.keyword),
            ),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => result.insert(chunk.keyword.clone(), text),
            Err(error) => result.note(
                EntryLevel::Warning,
                format!("No se pudo leer `{}`: {error}", chunk.keyword),
            ),
        }
    }
    Ok(result)
}
