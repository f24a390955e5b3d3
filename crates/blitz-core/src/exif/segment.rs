//! JPEG marker-segment splitting and EXIF APP1 splicing.

use super::ExifError;

/// Identifier that opens an EXIF APP1 payload.
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: [u8; 2] = [0xFF, 0xE0];
const APP1: [u8; 2] = [0xFF, 0xE1];

/// Largest payload a 16-bit segment length can describe (length counts itself).
pub(crate) const MAX_SEGMENT_PAYLOAD: usize = 0xFFFF - 2;

/// Split a JPEG into its marker segments.
///
/// The first slice is SOI. Every following slice starts with its marker; the
/// SOS slice runs to the end of the stream, since entropy-coded data carries
/// no length framing.
pub fn split_segments(jpeg: &[u8]) -> Result<Vec<&[u8]>, ExifError> {
    if !jpeg.starts_with(&SOI) {
        return Err(ExifError::NotJpeg);
    }

    let mut segments = vec![&jpeg[..2]];
    let mut pos = 2;

    while pos < jpeg.len() {
        if jpeg[pos] != 0xFF {
            return Err(ExifError::MalformedSegment(pos));
        }
        // Any run of 0xFF fill bytes precedes the real marker.
        let mut m = pos + 1;
        while m < jpeg.len() && jpeg[m] == 0xFF {
            m += 1;
        }
        if m >= jpeg.len() {
            break;
        }
        let start = m - 1;

        match jpeg[m] {
            0xDA => {
                segments.push(&jpeg[start..]);
                break;
            }
            0xD9 => {
                segments.push(&jpeg[start..start + 2]);
                break;
            }
            0x01 | 0xD0..=0xD7 => {
                segments.push(&jpeg[start..start + 2]);
                pos = start + 2;
            }
            0x00 => return Err(ExifError::MalformedSegment(start)),
            _ => {
                let len_bytes = jpeg
                    .get(start + 2..start + 4)
                    .ok_or(ExifError::MalformedSegment(start))?;
                let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
                let end = start + 2 + len;
                if len < 2 || end > jpeg.len() {
                    return Err(ExifError::MalformedSegment(start));
                }
                segments.push(&jpeg[start..end]);
                pos = end;
            }
        }
    }

    Ok(segments)
}

/// True for an APP1 segment whose payload begins with `Exif\0\0`.
pub fn is_exif_app1(segment: &[u8]) -> bool {
    segment.len() >= 10 && segment.starts_with(&APP1) && &segment[4..10] == EXIF_HEADER
}

/// Replace any EXIF APP1 in `jpeg` with `exif` (an `Exif\0\0`-prefixed blob).
///
/// The new segment goes right after SOI, or after APP0/JFIF when present.
pub fn insert(exif: &[u8], jpeg: &[u8]) -> Result<Vec<u8>, ExifError> {
    if !exif.starts_with(EXIF_HEADER) {
        return Err(ExifError::MissingExifHeader);
    }
    if exif.len() > MAX_SEGMENT_PAYLOAD {
        return Err(ExifError::SegmentTooLarge(exif.len()));
    }

    let mut app1 = Vec::with_capacity(exif.len() + 4);
    app1.extend_from_slice(&APP1);
    app1.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
    app1.extend_from_slice(exif);

    let mut segments: Vec<&[u8]> = split_segments(jpeg)?
        .into_iter()
        .filter(|s| !is_exif_app1(s))
        .collect();
    let at = if segments.get(1).is_some_and(|s| s.starts_with(&APP0)) {
        2
    } else {
        1
    };
    segments.insert(at, &app1);

    Ok(segments.concat())
}

/// Drop every EXIF APP1 segment from `jpeg`.
pub fn remove(jpeg: &[u8]) -> Result<Vec<u8>, ExifError> {
    let segments: Vec<&[u8]> = split_segments(jpeg)?
        .into_iter()
        .filter(|s| !is_exif_app1(s))
        .collect();
    Ok(segments.concat())
}

/// The TIFF stream inside the first EXIF APP1 segment, if any.
pub(crate) fn find_tiff(jpeg: &[u8]) -> Option<&[u8]> {
    split_segments(jpeg)
        .ok()?
        .into_iter()
        .find(|s| is_exif_app1(s))
        .map(|s| &s[10..])
}
