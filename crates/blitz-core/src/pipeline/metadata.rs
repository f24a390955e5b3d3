//! EXIF summary for job reports.

use crate::exif::{self, tags, Ifd, IfdMap, IfdValue};
use crate::types::ExifData;

/// Builds [`ExifData`] summaries from parsed EXIF.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Summarize the EXIF block of a JPEG.
    ///
    /// Returns `None` if there is no EXIF or none of the summarized tags are set.
    pub fn extract(bytes: &[u8]) -> Option<ExifData> {
        let map = exif::load(bytes)?;
        let data = Self::summary(&map);
        (!data.is_empty()).then_some(data)
    }

    /// Pull the report fields out of an IFD map. Missing tags stay `None`.
    pub fn summary(map: &IfdMap) -> ExifData {
        ExifData {
            captured_at: Self::get_string(map, Ifd::Exif, tags::DATE_TIME_ORIGINAL)
                .or_else(|| Self::get_string(map, Ifd::Zeroth, tags::DATE_TIME)),
            camera_make: Self::get_string(map, Ifd::Zeroth, tags::MAKE),
            camera_model: Self::get_string(map, Ifd::Zeroth, tags::MODEL),
            gps_latitude: Self::get_gps_coord(map, tags::GPS_LATITUDE, tags::GPS_LATITUDE_REF),
            gps_longitude: Self::get_gps_coord(map, tags::GPS_LONGITUDE, tags::GPS_LONGITUDE_REF),
            iso: map.get(Ifd::Exif, tags::ISO_SPEED).and_then(IfdValue::as_u32),
            aperture: Self::get_rational(map, tags::F_NUMBER).map(|f| format!("f/{}", trim(f))),
            shutter_speed: Self::get_shutter_speed(map),
            focal_length: Self::get_rational(map, tags::FOCAL_LENGTH).map(|f| f as f32),
            orientation: map.get(Ifd::Zeroth, tags::ORIENTATION).and_then(IfdValue::as_u32),
        }
    }

    fn get_string(map: &IfdMap, ifd: Ifd, tag: u16) -> Option<String> {
        map.get(ifd, tag)
            .and_then(IfdValue::as_ascii)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// First rational of an Exif-IFD tag as a float.
    fn get_rational(map: &IfdMap, tag: u16) -> Option<f64> {
        let (num, den) = *map.get(Ifd::Exif, tag)?.as_rationals()?.first()?;
        (den != 0).then(|| num as f64 / den as f64)
    }

    /// GPS coordinate from degrees/minutes/seconds, signed by its reference.
    fn get_gps_coord(map: &IfdMap, coord_tag: u16, ref_tag: u16) -> Option<f64> {
        let dms = map.get(Ifd::Gps, coord_tag)?.as_rationals()?;
        if dms.len() < 3 || dms.iter().any(|&(_, den)| den == 0) {
            return None;
        }
        let part = |i: usize| dms[i].0 as f64 / dms[i].1 as f64;
        let degrees = part(0) + part(1) / 60.0 + part(2) / 3600.0;

        let reference = Self::get_string(map, Ifd::Gps, ref_tag).unwrap_or_default();
        let sign = if reference.starts_with('S') || reference.starts_with('W') {
            -1.0
        } else {
            1.0
        };
        Some(sign * degrees)
    }

    /// Exposure time as "1/250" for sub-second values, otherwise seconds.
    fn get_shutter_speed(map: &IfdMap) -> Option<String> {
        let (num, den) = *map
            .get(Ifd::Exif, tags::EXPOSURE_TIME)?
            .as_rationals()?
            .first()?;
        if num == 0 || den == 0 {
            return None;
        }
        if num < den {
            Some(format!("1/{}", (den as f64 / num as f64).round()))
        } else {
            Some(trim(num as f64 / den as f64))
        }
    }
}

/// Format a float without a trailing ".0".
fn trim(v: f64) -> String {
    let s = format!("{:.1}", v);
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}
