//! Structured form of an EXIF block: five tag directories plus a thumbnail.

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::tags::Ifd;

/// A typed IFD entry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfdValue {
    Byte(Vec<u8>),
    /// Raw bytes without the trailing NUL; the writer appends it. Not
    /// necessarily UTF-8: Latin-1 strings are common in the wild.
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    Undefined(Vec<u8>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
}

/// Tag id to value, kept in ascending tag order as TIFF requires.
pub type Directory = BTreeMap<u16, IfdValue>;

impl IfdValue {
    /// TIFF field type code.
    pub fn type_code(&self) -> u16 {
        match self {
            IfdValue::Byte(_) => 1,
            IfdValue::Ascii(_) => 2,
            IfdValue::Short(_) => 3,
            IfdValue::Long(_) => 4,
            IfdValue::Rational(_) => 5,
            IfdValue::Undefined(_) => 7,
            IfdValue::SLong(_) => 9,
            IfdValue::SRational(_) => 10,
        }
    }

    /// Number of components, as written to the entry's count field.
    pub fn count(&self) -> usize {
        match self {
            IfdValue::Byte(v) | IfdValue::Undefined(v) => v.len(),
            IfdValue::Ascii(s) => s.len() + 1,
            IfdValue::Short(v) => v.len(),
            IfdValue::Long(v) => v.len(),
            IfdValue::Rational(v) => v.len(),
            IfdValue::SLong(v) => v.len(),
            IfdValue::SRational(v) => v.len(),
        }
    }

    /// Big-endian payload bytes.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        match self {
            IfdValue::Byte(v) | IfdValue::Undefined(v) => v.clone(),
            IfdValue::Ascii(s) => {
                let mut out = Vec::with_capacity(s.len() + 1);
                out.extend_from_slice(s);
                out.push(0);
                out
            }
            IfdValue::Short(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            IfdValue::Long(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            IfdValue::SLong(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            IfdValue::Rational(v) => v
                .iter()
                .flat_map(|(n, d)| n.to_be_bytes().into_iter().chain(d.to_be_bytes()))
                .collect(),
            IfdValue::SRational(v) => v
                .iter()
                .flat_map(|(n, d)| n.to_be_bytes().into_iter().chain(d.to_be_bytes()))
                .collect(),
        }
    }

    /// ASCII value as text, with invalid UTF-8 replaced. For display only;
    /// the stored bytes are never rewritten.
    pub fn as_ascii(&self) -> Option<Cow<'_, str>> {
        match self {
            IfdValue::Ascii(s) => Some(String::from_utf8_lossy(s)),
            _ => None,
        }
    }

    /// First component of an integer-typed value.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            IfdValue::Byte(v) => v.first().map(|&x| x as u32),
            IfdValue::Short(v) => v.first().map(|&x| x as u32),
            IfdValue::Long(v) => v.first().copied(),
            _ => None,
        }
    }

    pub fn as_rationals(&self) -> Option<&[(u32, u32)]> {
        match self {
            IfdValue::Rational(v) => Some(v),
            _ => None,
        }
    }
}

/// All directories of one EXIF block.
///
/// Structural pointer tags (sub-IFD offsets, thumbnail offset/length) are
/// never stored here; they are derived from the layout when dumping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfdMap {
    pub zeroth: Directory,
    pub exif: Directory,
    pub gps: Directory,
    pub interop: Directory,
    pub first: Directory,
    pub thumbnail: Option<Vec<u8>>,
}

impl IfdMap {
    pub fn is_empty(&self) -> bool {
        self.zeroth.is_empty()
            && self.exif.is_empty()
            && self.gps.is_empty()
            && self.interop.is_empty()
            && self.first.is_empty()
            && self.thumbnail.is_none()
    }

    pub fn directory(&self, ifd: Ifd) -> &Directory {
        match ifd {
            Ifd::Zeroth => &self.zeroth,
            Ifd::Exif => &self.exif,
            Ifd::Gps => &self.gps,
            Ifd::Interop => &self.interop,
            Ifd::First => &self.first,
        }
    }

    pub fn directory_mut(&mut self, ifd: Ifd) -> &mut Directory {
        match ifd {
            Ifd::Zeroth => &mut self.zeroth,
            Ifd::Exif => &mut self.exif,
            Ifd::Gps => &mut self.gps,
            Ifd::Interop => &mut self.interop,
            Ifd::First => &mut self.first,
        }
    }

    pub fn get(&self, ifd: Ifd, tag: u16) -> Option<&IfdValue> {
        self.directory(ifd).get(&tag)
    }

    /// Copy without the first IFD and its thumbnail.
    pub fn without_thumbnail(&self) -> Self {
        Self {
            first: Directory::new(),
            thumbnail: None,
            ..self.clone()
        }
    }
}
