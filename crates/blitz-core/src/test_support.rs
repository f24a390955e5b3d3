//! In-memory fixtures shared by unit tests.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba, RgbaImage};

use crate::exif::{self, tags, IfdMap, IfdValue};
use crate::types::SourceFile;

pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let buf = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(buf)
}

/// Solid logo with a transparent right half.
pub fn half_transparent_logo(width: u32, height: u32) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let rgb = gradient_rgb(width, height).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut out), quality)
        .encode_image(&rgb)
        .unwrap();
    out
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), format).unwrap();
    out
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        &DynamicImage::ImageRgba8(gradient_rgb(width, height).to_rgba8()),
        ImageFormat::Png,
    )
}

pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        &DynamicImage::ImageRgba8(gradient_rgb(width, height).to_rgba8()),
        ImageFormat::WebP,
    )
}

pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Camera-like EXIF touching every directory except the thumbnail.
pub fn sample_ifd() -> IfdMap {
    let mut map = IfdMap::default();
    map.zeroth.insert(tags::MAKE, IfdValue::Ascii("Canon".into()));
    map.zeroth
        .insert(tags::MODEL, IfdValue::Ascii("EOS R5".into()));
    map.zeroth
        .insert(tags::ORIENTATION, IfdValue::Short(vec![1]));
    map.zeroth
        .insert(tags::DATE_TIME, IfdValue::Ascii("2024:05:02 08:00:00".into()));
    map.zeroth
        .insert(282, IfdValue::Rational(vec![(72, 1)]));

    map.exif.insert(
        tags::DATE_TIME_ORIGINAL,
        IfdValue::Ascii("2024:05:01 10:20:30".into()),
    );
    map.exif
        .insert(tags::EXPOSURE_TIME, IfdValue::Rational(vec![(1, 250)]));
    map.exif.insert(tags::ISO_SPEED, IfdValue::Short(vec![400]));
    map.exif
        .insert(37377, IfdValue::SRational(vec![(-7965, 1000)]));
    map.exif
        .insert(36864, IfdValue::Undefined(b"0231".to_vec()));
    map.exif
        .insert(37500, IfdValue::Undefined(vec![1, 2, 3, 4, 5, 6, 7]));

    map.gps.insert(0, IfdValue::Byte(vec![2, 3, 0, 0]));
    map.gps
        .insert(tags::GPS_LATITUDE_REF, IfdValue::Ascii("N".into()));
    map.gps.insert(
        tags::GPS_LATITUDE,
        IfdValue::Rational(vec![(48, 1), (51, 1), (2955, 100)]),
    );
    map.gps
        .insert(tags::GPS_LONGITUDE_REF, IfdValue::Ascii("E".into()));
    map.gps.insert(
        tags::GPS_LONGITUDE,
        IfdValue::Rational(vec![(2, 1), (17, 1), (4020, 100)]),
    );

    map.interop
        .insert(tags::INTEROP_INDEX, IfdValue::Ascii("R98".into()));
    map
}

pub fn jpeg_with_exif(width: u32, height: u32, quality: u8, map: &IfdMap) -> Vec<u8> {
    exif::insert(
        &exif::dump(map).unwrap(),
        &jpeg_bytes(width, height, quality),
    )
    .unwrap()
}

pub fn source(name: &str, mime: &str, bytes: Vec<u8>) -> SourceFile {
    SourceFile {
        name: name.to_string(),
        mime_type: mime.to_string(),
        bytes,
    }
}
