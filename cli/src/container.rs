//! SWF container framing: finds the ABC payloads inside a movie file.

use std::borrow::Cow;
use std::io::{self, Read, Write};

use abc::{DecodeError, Reader};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::debug;

/// `DoABC`: flags, a NUL-terminated name, then the program.
pub const TAG_DO_ABC: u16 = 82;
/// Older form carrying the bare program.
pub const TAG_DO_ABC_RAW: u16 = 72;
pub const TAG_END: u16 = 0;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("file is too short to be a SWF")]
    TooShort,

    #[error("unrecognised SWF signature {0:?}")]
    UnknownSignature(String),

    #[error("{0} SWF files are compressed and not supported; decompress to FWS first")]
    Compressed(&'static str),

    #[error("failed to inflate CWS body: {0}")]
    Inflate(#[source] io::Error),

    #[error("malformed SWF: {0}")]
    Malformed(#[from] DecodeError),

    #[error("SWF contains no ABC payload")]
    NoAbc,
}

/// Returns every ABC payload of an `FWS` or `CWS` movie, in file order.
pub fn extract_abc(swf: &[u8]) -> Result<Vec<Vec<u8>>, ContainerError> {
    let swf = uncompressed(swf)?;

    // Header after signature, version and file length: a bit-packed frame
    // rectangle, then frame rate and frame count.
    let mut r = Reader::at(&swf, 8);
    let nbits = usize::from(r.read_u8()? >> 3);
    let rect_bytes = (5 + 4 * nbits).div_ceil(8);
    r.read_bytes(rect_bytes - 1)?;
    r.read_bytes(4)?;

    let mut payloads = Vec::new();
    while !r.is_empty() {
        let header = r.read_u16()?;
        let code = header >> 6;
        let mut len = usize::from(header & 0x3F);
        if len == 0x3F {
            let mut long = [0u8; 4];
            long.copy_from_slice(r.read_bytes(4)?);
            len = u32::from_le_bytes(long) as usize;
        }
        let body = r.read_bytes(len)?;

        match code {
            TAG_END => break,
            TAG_DO_ABC => payloads.push(do_abc_payload(body).to_vec()),
            TAG_DO_ABC_RAW => payloads.push(body.to_vec()),
            _ => debug!(code, len, "skipping tag"),
        }
    }

    if payloads.is_empty() {
        return Err(ContainerError::NoAbc);
    }
    Ok(payloads)
}

/// The movie as an `FWS` byte image. `CWS` bodies are zlib streams that
/// follow the 8-byte header.
fn uncompressed(swf: &[u8]) -> Result<Cow<'_, [u8]>, ContainerError> {
    if swf.len() < 8 {
        return Err(ContainerError::TooShort);
    }
    match &swf[..3] {
        b"FWS" => Ok(Cow::Borrowed(swf)),
        b"CWS" => {
            let declared = u32::from_le_bytes([swf[4], swf[5], swf[6], swf[7]]) as usize;
            let mut movie = Vec::with_capacity(declared.clamp(8, 1 << 24));
            movie.extend_from_slice(b"FWS");
            movie.extend_from_slice(&swf[3..8]);
            ZlibDecoder::new(&swf[8..])
                .read_to_end(&mut movie)
                .map_err(ContainerError::Inflate)?;
            if movie.len() != declared {
                debug!(declared, actual = movie.len(), "CWS length mismatch");
            }
            Ok(Cow::Owned(movie))
        }
        b"ZWS" => Err(ContainerError::Compressed("ZWS")),
        other => Err(ContainerError::UnknownSignature(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

fn do_abc_payload(body: &[u8]) -> &[u8] {
    let rest = body.get(4..).unwrap_or_default();
    match rest.iter().position(|&b| b == 0) {
        Some(nul) => &rest[nul + 1..],
        None => &[],
    }
}

/// Recompresses an `FWS` movie as `CWS`.
pub fn compress_movie(fws: &[u8]) -> io::Result<Vec<u8>> {
    let header = fws
        .get(..8)
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "movie header"))?;
    let mut out = b"CWS".to_vec();
    out.extend_from_slice(&header[3..]);
    let mut encoder = ZlibEncoder::new(out, Compression::default());
    encoder.write_all(&fws[8..])?;
    encoder.finish()
}

/// Wraps `abc` in a minimal `FWS` movie with one `DoABC` tag.
pub fn wrap_abc(abc: &[u8], name: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(abc.len() + name.len() + 5);
    body.extend_from_slice(&1u32.to_le_bytes());
    body.extend_from_slice(name.as_bytes());
    body.push(0);
    body.extend_from_slice(abc);

    // Zero-sized rectangle, 24 fps, one frame.
    let mut movie = b"FWS\x0a\0\0\0\0".to_vec();
    movie.extend_from_slice(&[0x00, 0x00, 0x18, 0x01, 0x00]);
    movie.extend_from_slice(&((TAG_DO_ABC << 6) | 0x3F).to_le_bytes());
    movie.extend_from_slice(&(body.len() as u32).to_le_bytes());
    movie.extend_from_slice(&body);
    movie.extend_from_slice(&(TAG_END << 6).to_le_bytes());

    let total = movie.len() as u32;
    movie[4..8].copy_from_slice(&total.to_le_bytes());
    movie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_do_abc_payload() {
        let movie = wrap_abc(&[1, 2, 3], "frame1");
        assert_eq!(extract_abc(&movie).unwrap(), vec![vec![1u8, 2, 3]]);
    }

    #[test]
    fn inflates_cws_movies() {
        let movie = wrap_abc(&[4, 5, 6], "frame1");
        let compressed = compress_movie(&movie).unwrap();
        assert_eq!(&compressed[..3], b"CWS");
        assert_eq!(&compressed[4..8], &movie[4..8]);
        assert_eq!(extract_abc(&compressed).unwrap(), vec![vec![4u8, 5, 6]]);
    }

    #[test]
    fn corrupt_cws_body_fails_to_inflate() {
        assert!(matches!(
            extract_abc(b"CWS\x0a\x10\0\0\0garbage"),
            Err(ContainerError::Inflate(_))
        ));
    }

    #[test]
    fn short_and_raw_tags() {
        let mut movie = b"FWS\x0a\0\0\0\0".to_vec();
        movie.extend_from_slice(&[0x00, 0x00, 0x18, 0x01, 0x00]);
        // unknown tag 9 with 2 bytes, then raw ABC tag with 3 bytes
        movie.extend_from_slice(&((9u16 << 6) | 2).to_le_bytes());
        movie.extend_from_slice(&[0xAA, 0xBB]);
        movie.extend_from_slice(&((TAG_DO_ABC_RAW << 6) | 3).to_le_bytes());
        movie.extend_from_slice(&[7, 8, 9]);
        assert_eq!(extract_abc(&movie).unwrap(), vec![vec![7u8, 8, 9]]);
    }

    #[test]
    fn rejects_zws_and_foreign_files() {
        assert!(matches!(
            extract_abc(b"ZWS\x0a\0\0\0\0\0"),
            Err(ContainerError::Compressed("ZWS"))
        ));
        assert!(matches!(
            extract_abc(b"GIF89a\0\0\0"),
            Err(ContainerError::UnknownSignature(_))
        ));
        assert!(matches!(extract_abc(b"FWS"), Err(ContainerError::TooShort)));
    }

    #[test]
    fn movie_without_abc() {
        let mut movie = b"FWS\x0a\0\0\0\0".to_vec();
        movie.extend_from_slice(&[0x00, 0x00, 0x18, 0x01, 0x00, 0x00, 0x00]);
        assert!(matches!(extract_abc(&movie), Err(ContainerError::NoAbc)));
    }

    #[test]
    fn truncated_tag_is_malformed() {
        let mut movie = b"FWS\x0a\0\0\0\0".to_vec();
        movie.extend_from_slice(&[0x00, 0x00, 0x18, 0x01, 0x00]);
        movie.extend_from_slice(&((TAG_DO_ABC_RAW << 6) | 10).to_le_bytes());
        movie.push(1);
        assert!(matches!(
            extract_abc(&movie),
            Err(ContainerError::Malformed(_))
        ));
    }
}
