//! Tag ids used by the codec and the metadata summary.

/// The five directories of an EXIF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ifd {
    Zeroth,
    Exif,
    Gps,
    Interop,
    First,
}

// Structural tags: offsets the writer derives from the layout.
pub const EXIF_IFD_POINTER: u16 = 34665;
pub const GPS_IFD_POINTER: u16 = 34853;
pub const INTEROP_IFD_POINTER: u16 = 40965;
pub const JPEG_INTERCHANGE_FORMAT: u16 = 513;
pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 514;

pub const STRUCTURAL: [u16; 5] = [
    EXIF_IFD_POINTER,
    GPS_IFD_POINTER,
    INTEROP_IFD_POINTER,
    JPEG_INTERCHANGE_FORMAT,
    JPEG_INTERCHANGE_FORMAT_LENGTH,
];

// 0th IFD
pub const MAKE: u16 = 271;
pub const MODEL: u16 = 272;
pub const ORIENTATION: u16 = 274;
pub const DATE_TIME: u16 = 306;
pub const ARTIST: u16 = 315;
pub const COPYRIGHT: u16 = 33432;

// Exif IFD
pub const EXPOSURE_TIME: u16 = 33434;
pub const F_NUMBER: u16 = 33437;
pub const ISO_SPEED: u16 = 34855;
pub const DATE_TIME_ORIGINAL: u16 = 36867;
pub const FOCAL_LENGTH: u16 = 37386;

// GPS IFD
pub const GPS_LATITUDE_REF: u16 = 1;
pub const GPS_LATITUDE: u16 = 2;
pub const GPS_LONGITUDE_REF: u16 = 3;
pub const GPS_LONGITUDE: u16 = 4;

// Interop IFD
pub const INTEROP_INDEX: u16 = 1;

/// Largest thumbnail `dump` will embed.
pub const MAX_THUMBNAIL_BYTES: usize = 64_000;
