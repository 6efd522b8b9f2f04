//! Reads zone sources from disk: KML, KMZ, `GeoJSON` and KMZ raster
//! overlays.

use std::{
    fs::File,
    io::{Read, Seek},
    path::{Path, PathBuf},
};

use lcz_map_zone::{RasterImage, RasterOptions, RasterSource, ZoneSource, export, kml};
use lcz_map_zone_models::Rgb;
use zip::ZipArchive;

use crate::error::CliError;

/// Where zones are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePath {
    /// Plain KML document with placemarks.
    Kml(PathBuf),
    /// Zipped KML document with placemarks.
    Kmz(PathBuf),
    /// `GeoJSON` feature collection.
    GeoJson(PathBuf),
    /// KMZ holding a `GroundOverlay` and its classified image.
    Raster(PathBuf),
}

impl SourcePath {
    /// Path of the file to read.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Kml(path) | Self::Kmz(path) | Self::GeoJson(path) | Self::Raster(path) => path,
        }
    }
}

/// Reads a whole text file.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file cannot be read.
pub fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))
}

/// Loads and parses a zone source.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn load(source: &SourcePath, options: RasterOptions) -> Result<ZoneSource, CliError> {
    log::info!("Loading zones from {}", source.path().display());

    Ok(match source {
        SourcePath::Kml(path) => ZoneSource::Vector(kml::parse_kml(&read_text(path)?)?),
        SourcePath::Kmz(path) => {
            let mut archive = open_kmz(path)?;
            let document = kmz_document(&mut archive)?;
            ZoneSource::Vector(kml::parse_kml(&document)?)
        }
        SourcePath::GeoJson(path) => ZoneSource::Vector(export::parse_geojson(&read_text(path)?)?),
        SourcePath::Raster(path) => ZoneSource::Raster(load_raster(path, options)?),
    })
}

fn open_kmz(path: &Path) -> Result<ZipArchive<File>, CliError> {
    let file = File::open(path).map_err(|e| CliError::io(path, e))?;
    Ok(ZipArchive::new(file)?)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<Vec<u8>, CliError> {
    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_owned();
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| CliError::io(name, e))?;
    Ok(bytes)
}

fn entry_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    archive.file_names().map(str::to_owned).collect()
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Finds the KML document inside a KMZ, preferring `doc.kml`.
fn kmz_document<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, CliError> {
    let names = entry_names(archive);
    let index = names
        .iter()
        .position(|name| name.eq_ignore_ascii_case("doc.kml"))
        .or_else(|| names.iter().position(|name| has_extension(name, "kml")))
        .ok_or_else(|| CliError::kmz("archive contains no .kml document"))?;

    log::debug!("Reading KML document {}", names[index]);
    let bytes = read_entry(archive, index)?;
    String::from_utf8(bytes).map_err(|e| CliError::kmz(format!("KML is not UTF-8: {e}")))
}

/// Picks the overlay image entry: the `Icon/href` target if present,
/// otherwise the first PNG in the archive.
fn image_entry(names: &[String], icon_href: Option<&str>) -> Option<usize> {
    let by_href = icon_href.and_then(|href| {
        let href = href.trim_start_matches("./");
        names.iter().position(|name| name == href).or_else(|| {
            let file_name = Path::new(href).file_name()?;
            names
                .iter()
                .position(|name| Path::new(name).file_name() == Some(file_name))
        })
    });

    by_href.or_else(|| names.iter().position(|name| has_extension(name, "png")))
}

fn load_raster(path: &Path, options: RasterOptions) -> Result<RasterSource, CliError> {
    let mut archive = open_kmz(path)?;
    let document = kmz_document(&mut archive)?;
    let overlay = kml::parse_ground_overlay(&document)?;

    let names = entry_names(&archive);
    let index = image_entry(&names, overlay.icon_href.as_deref())
        .ok_or_else(|| CliError::kmz("archive contains no overlay image"))?;
    log::info!("Decoding overlay image {}", names[index]);

    let image = decode_png(&read_entry(&mut archive, index)?)?;
    log::info!(
        "Overlay is {}x{} pixels over {:?}",
        image.width(),
        image.height(),
        overlay.bounds
    );

    Ok(RasterSource::new(image, overlay.bounds, options))
}

/// Decodes a PNG into RGB pixels.
///
/// Palette and low bit-depth images are expanded to 8 bits per channel.
/// Fully transparent pixels become white, which lies far from every class
/// color, so they end up unresolved.
///
/// # Errors
///
/// Returns [`CliError::Png`] if the bytes are not a valid PNG.
pub fn decode_png(bytes: &[u8]) -> Result<RasterImage, CliError> {
    const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let channels = frame.color_type.samples();

    let mut pixels = Vec::with_capacity(width * height);
    for row in buffer[..frame.buffer_size()]
        .chunks(frame.line_size)
        .take(height)
    {
        for px in row.chunks_exact(channels).take(width) {
            pixels.push(match *px {
                [gray] => Rgb::new(gray, gray, gray),
                [_, 0] | [_, _, _, 0] => WHITE,
                [gray, _] => Rgb::new(gray, gray, gray),
                [r, g, b] | [r, g, b, _] => Rgb::new(r, g, b),
                _ => WHITE,
            });
        }
    }

    Ok(RasterImage::new(width, height, pixels)?)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    fn kmz(entries: &[(&str, &[u8])]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        ZipArchive::new(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn decodes_rgba_with_transparency_as_white() {
        let data = [0x00, 0xAA, 0x00, 0xFF, 0x10, 0x20, 0x30, 0x00];
        let image = decode_png(&encode_png(2, 1, png::ColorType::Rgba, &data)).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.pixel(0, 0), Some(Rgb::new(0x00, 0xAA, 0x00)));
        assert_eq!(image.pixel(1, 0), Some(Rgb::new(0xFF, 0xFF, 0xFF)));
    }

    #[test]
    fn decodes_rgb_and_grayscale() {
        let rgb = decode_png(&encode_png(1, 2, png::ColorType::Rgb, &[1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(rgb.pixel(0, 1), Some(Rgb::new(4, 5, 6)));

        let gray = decode_png(&encode_png(1, 1, png::ColorType::Grayscale, &[7])).unwrap();
        assert_eq!(gray.pixel(0, 0), Some(Rgb::new(7, 7, 7)));
    }

    #[test]
    fn rejects_non_png_bytes() {
        assert!(matches!(decode_png(b"not a png"), Err(CliError::Png(_))));
    }

    #[test]
    fn finds_kml_document_in_archive() {
        let mut archive = kmz(&[
            ("files/overlay.png", &b"png"[..]),
            ("other.kml", &b"<kml>other</kml>"[..]),
            ("doc.kml", &b"<kml>doc</kml>"[..]),
        ]);
        assert_eq!(kmz_document(&mut archive).unwrap(), "<kml>doc</kml>");

        let mut archive = kmz(&[("overlay.png", &b"png"[..])]);
        assert!(matches!(
            kmz_document(&mut archive),
            Err(CliError::Kmz { .. })
        ));
    }

    #[test]
    fn image_entry_prefers_icon_href() {
        let names: Vec<String> = ["doc.kml", "a.png", "files/lcz.png"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert_eq!(image_entry(&names, Some("files/lcz.png")), Some(2));
        assert_eq!(image_entry(&names, Some("./files/lcz.png")), Some(2));
        assert_eq!(image_entry(&names, Some("elsewhere/lcz.png")), Some(2));
        assert_eq!(image_entry(&names, Some("missing.png")), Some(1));
        assert_eq!(image_entry(&names, None), Some(1));
        assert_eq!(image_entry(&names[..1], None), None);
    }
}
