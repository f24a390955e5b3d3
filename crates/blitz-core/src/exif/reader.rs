//! TIFF/IFD parsing.
//!
//! Every read is bounds-checked and returns `Option`, so truncated or
//! hostile input ends the parse instead of panicking.

use super::segment::{self, EXIF_HEADER};
use super::tags;
use super::value::{Directory, IfdMap, IfdValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, buf: &[u8], at: usize) -> Option<u16> {
        let b: [u8; 2] = buf.get(at..at.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        })
    }

    fn u32(self, buf: &[u8], at: usize) -> Option<u32> {
        let b: [u8; 4] = buf.get(at..at.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }
}

/// Parse EXIF from a JPEG, an `Exif\0\0` blob, or a bare TIFF stream.
///
/// Returns `None` when no EXIF is present or the block cannot be parsed.
pub fn load(bytes: &[u8]) -> Option<IfdMap> {
    let tiff = if bytes.starts_with(&[0xFF, 0xD8]) {
        segment::find_tiff(bytes)?
    } else if bytes.starts_with(EXIF_HEADER) {
        &bytes[EXIF_HEADER.len()..]
    } else {
        bytes
    };
    parse_tiff(tiff)
}

fn parse_tiff(tiff: &[u8]) -> Option<IfdMap> {
    let order = match tiff.get(0..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if order.u16(tiff, 2)? != 42 {
        return None;
    }
    let reader = IfdReader { tiff, order };

    let zeroth_offset = order.u32(tiff, 4)? as usize;
    let (mut zeroth, next) = reader.read_ifd(zeroth_offset)?;
    let mut map = IfdMap::default();

    if let Some(offset) = take_pointer(&mut zeroth, tags::EXIF_IFD_POINTER) {
        if let Some((mut exif, _)) = reader.read_sub_ifd(offset, "exif") {
            if let Some(interop_offset) = take_pointer(&mut exif, tags::INTEROP_IFD_POINTER) {
                if let Some((interop, _)) = reader.read_sub_ifd(interop_offset, "interop") {
                    map.interop = interop;
                }
            }
            map.exif = exif;
        }
    }

    if let Some(offset) = take_pointer(&mut zeroth, tags::GPS_IFD_POINTER) {
        if let Some((gps, _)) = reader.read_sub_ifd(offset, "gps") {
            map.gps = gps;
        }
    }

    if next != 0 {
        if let Some((mut first, _)) = reader.read_sub_ifd(next as usize, "first") {
            let offset = take_pointer(&mut first, tags::JPEG_INTERCHANGE_FORMAT);
            let length = take_pointer(&mut first, tags::JPEG_INTERCHANGE_FORMAT_LENGTH);
            if let (Some(offset), Some(length)) = (offset, length) {
                map.thumbnail = offset
                    .checked_add(length)
                    .and_then(|end| tiff.get(offset..end))
                    .map(<[u8]>::to_vec);
            }
            map.first = first;
        }
    }

    // The 0th IFD may have carried only structural pointers.
    map.zeroth = zeroth;
    Some(map)
}

/// Remove a pointer-typed entry and return its value as an offset.
fn take_pointer(dir: &mut Directory, tag: u16) -> Option<usize> {
    dir.remove(&tag)?.as_u32().map(|v| v as usize)
}

struct IfdReader<'a> {
    tiff: &'a [u8],
    order: ByteOrder,
}

impl IfdReader<'_> {
    /// Read a directory that is optional to the caller: failures are logged.
    fn read_sub_ifd(&self, offset: usize, name: &str) -> Option<(Directory, u32)> {
        let dir = self.read_ifd(offset);
        if dir.is_none() {
            tracing::debug!("Skipping unreadable {} IFD at offset {}", name, offset);
        }
        dir
    }

    /// Read the directory at `offset`. Returns the entries and the next-IFD pointer.
    fn read_ifd(&self, offset: usize) -> Option<(Directory, u32)> {
        let count = self.order.u16(self.tiff, offset)? as usize;
        let mut dir = Directory::new();

        for i in 0..count {
            let entry = offset + 2 + i * 12;
            let tag = self.order.u16(self.tiff, entry)?;
            let type_code = self.order.u16(self.tiff, entry + 2)?;
            let components = self.order.u32(self.tiff, entry + 4)? as usize;

            let Some(unit) = unit_size(type_code) else {
                tracing::trace!("Ignoring tag {} with unsupported type {}", tag, type_code);
                continue;
            };
            let total = unit.checked_mul(components)?;
            let data = if total <= 4 {
                self.tiff.get(entry + 8..entry + 8 + total)?
            } else {
                let at = self.order.u32(self.tiff, entry + 8)? as usize;
                self.tiff.get(at..at.checked_add(total)?)?
            };

            if let Some(value) = self.decode(type_code, data) {
                dir.insert(tag, value);
            }
        }

        let next = self
            .order
            .u32(self.tiff, offset + 2 + count * 12)
            .unwrap_or(0);
        Some((dir, next))
    }

    fn decode(&self, type_code: u16, data: &[u8]) -> Option<IfdValue> {
        let o = self.order;
        let value = match type_code {
            1 => IfdValue::Byte(data.to_vec()),
            2 => {
                let end = data
                    .iter()
                    .rposition(|&b| b != 0)
                    .map(|p| p + 1)
                    .unwrap_or(0);
                IfdValue::Ascii(data[..end].to_vec())
            }
            3 => IfdValue::Short(
                (0..data.len() / 2)
                    .map(|i| o.u16(data, i * 2))
                    .collect::<Option<_>>()?,
            ),
            4 => IfdValue::Long(
                (0..data.len() / 4)
                    .map(|i| o.u32(data, i * 4))
                    .collect::<Option<_>>()?,
            ),
            5 => IfdValue::Rational(
                (0..data.len() / 8)
                    .map(|i| Some((o.u32(data, i * 8)?, o.u32(data, i * 8 + 4)?)))
                    .collect::<Option<_>>()?,
            ),
            7 => IfdValue::Undefined(data.to_vec()),
            9 => IfdValue::SLong(
                (0..data.len() / 4)
                    .map(|i| o.u32(data, i * 4).map(|v| v as i32))
                    .collect::<Option<_>>()?,
            ),
            10 => IfdValue::SRational(
                (0..data.len() / 8)
                    .map(|i| {
                        Some((
                            o.u32(data, i * 8)? as i32,
                            o.u32(data, i * 8 + 4)? as i32,
                        ))
                    })
                    .collect::<Option<_>>()?,
            ),
            _ => return None,
        };
        Some(value)
    }
}

fn unit_size(type_code: u16) -> Option<usize> {
    match type_code {
        1 | 2 | 7 => Some(1),
        3 => Some(2),
        4 | 9 => Some(4),
        5 | 10 => Some(8),
        _ => None,
    }
}
