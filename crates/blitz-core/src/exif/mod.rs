//! EXIF codec: read IFDs out of a JPEG, write them back, splice APP1.
//!
//! Used to carry camera metadata across a JPEG re-encode. The codec never
//! panics on malformed input; [`load`] returns `None` and the other
//! operations return [`ExifError`], which the pipeline downgrades to a
//! warning.

mod reader;
pub mod segment;
pub mod tags;
mod value;
mod writer;

pub use reader::load;
pub use segment::{insert, remove, split_segments};
pub use tags::Ifd;
pub use value::{Directory, IfdMap, IfdValue};
pub use writer::dump;

use thiserror::Error;

/// Failures of the EXIF codec. Never propagated out of a job.
#[derive(Error, Debug)]
pub enum ExifError {
    #[error("not a JPEG stream")]
    NotJpeg,

    #[error("malformed JPEG segment at offset {0}")]
    MalformedSegment(usize),

    #[error("EXIF blob does not start with the Exif header")]
    MissingExifHeader,

    #[error("thumbnail is {0} bytes (limit {max})", max = tags::MAX_THUMBNAIL_BYTES)]
    ThumbnailTooLarge(usize),

    #[error("EXIF payload of {0} bytes does not fit in one APP1 segment")]
    SegmentTooLarge(usize),

    #[error("value for tag {0} does not fit 32-bit offsets")]
    ValueTooLarge(u16),
}

/// Copy the EXIF block of `source` into `encoded`.
///
/// Returns `Ok(None)` when the source has no EXIF. A thumbnail that is over
/// the limit, or that would overflow the APP1 segment, is dropped and the
/// remaining directories are still carried.
pub fn carry_forward(source: &[u8], encoded: &[u8]) -> Result<Option<Vec<u8>>, ExifError> {
    let Some(map) = load(source) else {
        return Ok(None);
    };
    let blob = match dump(&map) {
        Ok(blob) if blob.len() <= segment::MAX_SEGMENT_PAYLOAD => blob,
        Ok(_) | Err(ExifError::ThumbnailTooLarge(_)) if map.thumbnail.is_some() => {
            tracing::debug!("Dropping EXIF thumbnail to fit the APP1 segment");
            dump(&map.without_thumbnail())?
        }
        other => other?,
    };
    insert(&blob, encoded).map(Some)
}
