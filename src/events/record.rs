//! TFRecord framing
//!
//! ```text
//! u64  length          (little endian)
//! u32  masked_crc32c(length bytes)
//! [u8] data            (length bytes)
//! u32  masked_crc32c(data)
//! ```

use std::io::{self, Read, Write};

use super::crc::masked_crc32c;

const HEADER_LEN: usize = 12;
const FOOTER_LEN: usize = 4;

/// Why a record could not be read.
#[derive(Debug)]
pub enum RecordError {
    /// The file ends inside a record (usually a writer still running or killed)
    Truncated,
    /// A checksum did not match
    Checksum(&'static str),
    /// Underlying IO failure
    Io(io::Error),
}

impl From<io::Error> for RecordError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Streams record payloads out of a reader.
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader positioned at a record boundary.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next record payload.
    ///
    /// Returns `Ok(None)` at a clean end of input.
    ///
    /// # Errors
    ///
    /// [`RecordError::Truncated`] if input ends mid-record,
    /// [`RecordError::Checksum`] on a CRC mismatch.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, RecordError> {
        let mut header = [0u8; HEADER_LEN];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Ok(None),
            HEADER_LEN => {}
            _ => return Err(RecordError::Truncated),
        }

        let (len_bytes, len_crc) = header.split_at(8);
        if masked_crc32c(len_bytes) != u32::from_le_bytes(array4(len_crc)) {
            return Err(RecordError::Checksum("length"));
        }
        let len = u64::from_le_bytes(array8(len_bytes));

        // Grows with the bytes actually present, never with the declared length
        let mut data = Vec::new();
        let read = (&mut self.inner).take(len).read_to_end(&mut data)?;
        if read as u64 != len {
            return Err(RecordError::Truncated);
        }
        let mut footer = [0u8; FOOTER_LEN];
        if read_full(&mut self.inner, &mut footer)? != FOOTER_LEN {
            return Err(RecordError::Truncated);
        }
        if masked_crc32c(&data) != u32::from_le_bytes(footer) {
            return Err(RecordError::Checksum("data"));
        }

        Ok(Some(data))
    }
}

/// Frames payloads as records.
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap a writer.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one record.
    ///
    /// # Errors
    ///
    /// Propagates IO errors.
    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc32c(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())
    }

    /// Flush the underlying writer.
    ///
    /// # Errors
    ///
    /// Propagates IO errors.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Read until `buf` is full or input ends; returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn array4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(bytes);
    out
}

fn array8(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}
