//! Serialize an [`IfdMap`] into an `Exif\0\0`-prefixed TIFF blob.
//!
//! Layout (offsets relative to the TIFF header):
//!
//! ```text
//! header(8) | 0th IFD | Exif IFD | GPS IFD | Interop IFD | 1st IFD | thumbnail
//! ```
//!
//! Each IFD is `count(2) + entries(12 each) + next(4) + out-of-line values`.
//! Sizes depend only on the map, so every offset is known before any
//! directory is encoded. Output is always big-endian.

use super::segment::EXIF_HEADER;
use super::tags::{self, STRUCTURAL};
use super::value::{Directory, IfdMap, IfdValue};
use super::ExifError;

const TIFF_HEADER: [u8; 8] = [b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];

/// One entry to write: a stored value or a layout-derived LONG.
enum Slot<'a> {
    Value(&'a IfdValue),
    Long(u32),
}

impl Slot<'_> {
    fn type_code(&self) -> u16 {
        match self {
            Slot::Value(v) => v.type_code(),
            Slot::Long(_) => 4,
        }
    }

    fn count(&self) -> usize {
        match self {
            Slot::Value(v) => v.count(),
            Slot::Long(_) => 1,
        }
    }

    fn payload(&self) -> Vec<u8> {
        match self {
            Slot::Value(v) => v.to_be_bytes(),
            Slot::Long(x) => x.to_be_bytes().to_vec(),
        }
    }
}

/// A directory ready for sizing and encoding, sorted by tag.
struct Plan<'a> {
    entries: Vec<(u16, Slot<'a>)>,
}

impl<'a> Plan<'a> {
    /// Stored entries (minus any stray structural tags) plus `extra` tags.
    /// Offsets in `extra` are placeholders until [`Plan::set`] fills them.
    fn new(dir: &'a Directory, extra: &[u16]) -> Self {
        let mut entries: Vec<(u16, Slot<'a>)> = dir
            .iter()
            .filter(|(tag, _)| !STRUCTURAL.contains(tag))
            .map(|(&tag, value)| (tag, Slot::Value(value)))
            .chain(extra.iter().map(|&tag| (tag, Slot::Long(0))))
            .collect();
        entries.sort_by_key(|(tag, _)| *tag);
        Self { entries }
    }

    fn set(&mut self, tag: u16, value: u32) {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(t, _)| *t == tag) {
            *slot = Slot::Long(value);
        }
    }

    fn size(&self) -> usize {
        let data: usize = self
            .entries
            .iter()
            .map(|(_, slot)| out_of_line_len(slot.payload().len()))
            .sum();
        2 + 12 * self.entries.len() + 4 + data
    }

    /// Encode at absolute TIFF offset `base`.
    fn encode(&self, base: usize, next: u32) -> Result<Vec<u8>, ExifError> {
        let mut head = Vec::with_capacity(2 + 12 * self.entries.len() + 4);
        let mut data = Vec::new();
        let data_start = base + 2 + 12 * self.entries.len() + 4;

        head.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for (tag, slot) in &self.entries {
            let payload = slot.payload();
            let count = u32::try_from(slot.count()).map_err(|_| ExifError::ValueTooLarge(*tag))?;
            head.extend_from_slice(&tag.to_be_bytes());
            head.extend_from_slice(&slot.type_code().to_be_bytes());
            head.extend_from_slice(&count.to_be_bytes());

            if payload.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..payload.len()].copy_from_slice(&payload);
                head.extend_from_slice(&inline);
            } else {
                let offset = u32::try_from(data_start + data.len())
                    .map_err(|_| ExifError::ValueTooLarge(*tag))?;
                head.extend_from_slice(&offset.to_be_bytes());
                data.extend_from_slice(&payload);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        head.extend_from_slice(&next.to_be_bytes());
        head.extend_from_slice(&data);
        Ok(head)
    }
}

/// Bytes a payload occupies after the entry table (word aligned).
fn out_of_line_len(len: usize) -> usize {
    if len <= 4 {
        0
    } else {
        len + len % 2
    }
}

fn sized(present: bool, plan: &Plan<'_>) -> usize {
    if present {
        plan.size()
    } else {
        0
    }
}

fn to_offset(v: usize) -> Result<u32, ExifError> {
    u32::try_from(v).map_err(|_| ExifError::ValueTooLarge(0))
}

/// Serialize `map`. Fails when the thumbnail exceeds
/// [`MAX_THUMBNAIL_BYTES`](tags::MAX_THUMBNAIL_BYTES).
pub fn dump(map: &IfdMap) -> Result<Vec<u8>, ExifError> {
    write(map, tags::MAX_THUMBNAIL_BYTES)
}

pub(super) fn write(map: &IfdMap, max_thumbnail: usize) -> Result<Vec<u8>, ExifError> {
    if let Some(thumb) = &map.thumbnail {
        if thumb.len() > max_thumbnail {
            return Err(ExifError::ThumbnailTooLarge(thumb.len()));
        }
    }

    let has_interop = !map.interop.is_empty();
    let has_exif = !map.exif.is_empty() || has_interop;
    let has_gps = !map.gps.is_empty();
    let has_first = !map.first.is_empty() || map.thumbnail.is_some();

    let mut zeroth_extra = Vec::new();
    if has_exif {
        zeroth_extra.push(tags::EXIF_IFD_POINTER);
    }
    if has_gps {
        zeroth_extra.push(tags::GPS_IFD_POINTER);
    }
    let exif_extra: &[u16] = if has_interop {
        &[tags::INTEROP_IFD_POINTER]
    } else {
        &[]
    };
    let first_extra: &[u16] = if map.thumbnail.is_some() {
        &[
            tags::JPEG_INTERCHANGE_FORMAT,
            tags::JPEG_INTERCHANGE_FORMAT_LENGTH,
        ]
    } else {
        &[]
    };

    let mut zeroth = Plan::new(&map.zeroth, &zeroth_extra);
    let mut exif = Plan::new(&map.exif, exif_extra);
    let gps = Plan::new(&map.gps, &[]);
    let interop = Plan::new(&map.interop, &[]);
    let mut first = Plan::new(&map.first, first_extra);

    let zeroth_at = TIFF_HEADER.len();
    let exif_at = zeroth_at + zeroth.size();
    let gps_at = exif_at + sized(has_exif, &exif);
    let interop_at = gps_at + sized(has_gps, &gps);
    let first_at = interop_at + sized(has_interop, &interop);
    let thumb_at = first_at + sized(has_first, &first);

    zeroth.set(tags::EXIF_IFD_POINTER, to_offset(exif_at)?);
    zeroth.set(tags::GPS_IFD_POINTER, to_offset(gps_at)?);
    exif.set(tags::INTEROP_IFD_POINTER, to_offset(interop_at)?);
    if let Some(thumb) = &map.thumbnail {
        first.set(tags::JPEG_INTERCHANGE_FORMAT, to_offset(thumb_at)?);
        first.set(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, to_offset(thumb.len())?);
    }

    let next = if has_first { to_offset(first_at)? } else { 0 };

    let mut out = Vec::with_capacity(EXIF_HEADER.len() + thumb_at);
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(&TIFF_HEADER);
    out.extend(zeroth.encode(zeroth_at, next)?);
    if has_exif {
        out.extend(exif.encode(exif_at, 0)?);
    }
    if has_gps {
        out.extend(gps.encode(gps_at, 0)?);
    }
    if has_interop {
        out.extend(interop.encode(interop_at, 0)?);
    }
    if has_first {
        out.extend(first.encode(first_at, 0)?);
    }
    if let Some(thumb) = &map.thumbnail {
        out.extend_from_slice(thumb);
    }
    Ok(out)
}
