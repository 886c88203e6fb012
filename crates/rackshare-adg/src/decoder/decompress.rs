//! gzip envelope handling.
//!
//! A rack file is a gzip stream wrapping UTF-8 XML. The stream is read
//! sequentially and the decompressed size is capped so a hostile upload
//! cannot expand without bound.

use crate::error::{Error, Result};
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const UTF8_BOM: char = '\u{feff}';

#[inline]
pub fn is_gzip_magic(header: &[u8]) -> bool {
    header.len() >= 2 && header[0] == GZIP_MAGIC[0] && header[1] == GZIP_MAGIC[1]
}

/// Decompress a rack file on disk into its XML text.
///
/// Opening the file can fail with [`Error::Io`]; everything after that
/// (wrong magic, broken stream, oversize or non-UTF-8 payload) is
/// [`Error::CorruptFile`].
pub fn decompress_file(path: &Path, max_bytes: u64) -> Result<String> {
    let file = File::open(path)?;
    decompress_reader(file, path, max_bytes)
}

/// Decompress an in-memory rack file. `label` names it in error messages.
pub fn decompress_bytes(bytes: &[u8], label: &Path, max_bytes: u64) -> Result<String> {
    decompress_reader(bytes, label, max_bytes)
}

/// Fill `buf` as far as the stream allows; returns the byte count read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn decompress_reader<R: Read>(mut reader: R, label: &Path, max_bytes: u64) -> Result<String> {
    let mut magic = [0u8; 2];
    let filled = read_up_to(&mut reader, &mut magic)?;
    if filled == 0 {
        return Err(Error::corrupt(label, "file is empty"));
    }
    if !is_gzip_magic(&magic[..filled]) {
        return Err(Error::corrupt(
            label,
            "not a gzip-compressed file (bad magic bytes)",
        ));
    }

    let stream = BufReader::new(Cursor::new(magic).chain(reader));
    let mut decoder = MultiGzDecoder::new(stream).take(max_bytes.saturating_add(1));
    let mut raw = Vec::new();
    if let Err(e) = decoder.read_to_end(&mut raw) {
        return Err(Error::corrupt(
            label,
            format!("invalid or truncated gzip stream: {}", e),
        ));
    }

    if raw.len() as u64 > max_bytes {
        return Err(Error::corrupt(
            label,
            format!("decompressed content exceeds the limit of {} bytes", max_bytes),
        ));
    }

    log::debug!(
        "Decompressed {} to {} bytes of XML",
        label.display(),
        raw.len()
    );

    let mut xml = String::from_utf8(raw)
        .map_err(|e| Error::corrupt(label, format!("payload is not valid UTF-8: {}", e)))?;
    if xml.starts_with(UTF8_BOM) {
        xml.drain(..UTF8_BOM.len_utf8());
    }

    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn label() -> &'static Path {
        Path::new("test.adg")
    }

    #[test]
    fn test_round_trip() {
        let xml = decompress_bytes(&gzip(b"<Ableton/>"), label(), 1024).unwrap();
        assert_eq!(xml, "<Ableton/>");
    }

    #[test]
    fn test_strips_bom() {
        let xml = decompress_bytes(&gzip("\u{feff}<Ableton/>".as_bytes()), label(), 1024).unwrap();
        assert_eq!(xml, "<Ableton/>");
    }

    #[test]
    fn test_rejects_plain_xml() {
        let err = decompress_bytes(b"<Ableton/>", label(), 1024).unwrap_err();
        assert!(err.is_corrupt_file());
    }

    #[test]
    fn test_rejects_empty() {
        let err = decompress_bytes(b"", label(), 1024).unwrap_err();
        assert!(err.is_corrupt_file());
    }

    #[test]
    fn test_rejects_truncated_stream() {
        let data = gzip(&vec![b'x'; 4096]);
        let truncated = &data[..data.len() / 2];
        let err = decompress_bytes(truncated, label(), 1 << 20).unwrap_err();
        assert!(err.is_corrupt_file());
    }

    #[test]
    fn test_enforces_size_limit() {
        let data = gzip(&vec![b' '; 2048]);
        let err = decompress_bytes(&data, label(), 1024).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));

        assert!(decompress_bytes(&data, label(), 2048).is_ok());
    }

    /// Hands out one byte per read call.
    struct Trickle<R>(R);

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn test_magic_split_across_reads() {
        let data = gzip(b"<Ableton/>");
        let xml = decompress_reader(Trickle(&data[..]), label(), 1024).unwrap();
        assert_eq!(xml, "<Ableton/>");
    }

    #[test]
    fn test_single_byte_file_is_corrupt() {
        let err = decompress_bytes(&[0x1f], label(), 1024).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_rejects_non_utf8() {
        let err = decompress_bytes(&gzip(&[0xff, 0xfe, 0x00, 0x80]), label(), 1024).unwrap_err();
        assert!(err.is_corrupt_file());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = decompress_file(Path::new("/definitely/not/here.adg"), 1024).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
