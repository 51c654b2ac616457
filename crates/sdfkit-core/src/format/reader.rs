use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian};

use super::error::DecodeError;
use super::header::FieldValue;
use super::layout::{FieldKind, FieldSpec};

/// Forward-only little-endian cursor over an SDF byte stream.
///
/// The reader counts every byte it hands out so errors can report the
/// absolute offset where decoding stopped. It never seeks.
///
/// # Examples
/// ```
/// use sdfkit_core::SdfReader;
///
/// let bytes = [0x2a, 0x00, 0x00, 0x00];
/// let mut reader = SdfReader::new(&bytes[..]);
/// assert_eq!(reader.read_u32("answer").unwrap(), 42);
/// assert_eq!(reader.offset(), 4);
/// ```
pub struct SdfReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> SdfReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill as much of `buf` as the stream allows; a short count means end
    /// of stream.
    ///
    /// # Errors
    /// Returns `DecodeError::Io` on any I/O failure other than an
    /// interrupted read.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(DecodeError::Io {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
        Ok(filled)
    }

    /// Fill `buf` completely or fail with `UnexpectedEndOfStream`.
    pub fn read_exact_into(&mut self, buf: &mut [u8], context: &str) -> Result<(), DecodeError> {
        let start = self.offset;
        let actual = self.read_up_to(buf)?;
        if actual != buf.len() {
            return Err(DecodeError::UnexpectedEndOfStream {
                offset: start,
                context: context.to_string(),
                needed: buf.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Read exactly `len` bytes into a new buffer.
    ///
    /// The buffer grows with the data actually read, so a bogus length in a
    /// corrupt stream cannot force a large allocation up front. Bytes read
    /// before an I/O failure still count towards the offset.
    pub fn read_vec(&mut self, len: usize, context: &str) -> Result<Vec<u8>, DecodeError> {
        let start = self.offset;
        let mut buf = Vec::new();
        let result = (&mut self.inner).take(len as u64).read_to_end(&mut buf);
        self.offset += buf.len() as u64;
        if let Err(source) = result {
            return Err(DecodeError::Io {
                offset: self.offset,
                source,
            });
        }
        let actual = buf.len();
        if actual != len {
            return Err(DecodeError::UnexpectedEndOfStream {
                offset: start,
                context: context.to_string(),
                needed: len,
                actual,
            });
        }
        Ok(buf)
    }

    pub fn read_u16(&mut self, context: &str) -> Result<u16, DecodeError> {
        let mut buf = [0u8; 2];
        self.read_exact_into(&mut buf, context)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    pub fn read_u32(&mut self, context: &str) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        self.read_exact_into(&mut buf, context)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// Read one header field described by `spec`.
    ///
    /// # Errors
    /// `MalformedField` when the declared width does not match the field
    /// kind, `UnexpectedEndOfStream` when the stream ends early.
    pub fn read_field(&mut self, spec: &FieldSpec) -> Result<FieldValue, DecodeError> {
        if spec.width != spec.kind.width() {
            return Err(DecodeError::MalformedField {
                offset: self.offset,
                field: spec.name.to_string(),
                reason: format!(
                    "{:?} needs {} bytes, table declares {}",
                    spec.kind,
                    spec.kind.width(),
                    spec.width
                ),
            });
        }

        let mut buf = [0u8; 8];
        let bytes = &mut buf[..spec.width];
        self.read_exact_into(bytes, spec.name)?;
        Ok(match spec.kind {
            FieldKind::U32 => FieldValue::U32(LittleEndian::read_u32(bytes)),
            FieldKind::F32 => FieldValue::F32(LittleEndian::read_f32(bytes)),
            FieldKind::F64 => FieldValue::F64(LittleEndian::read_f64(bytes)),
        })
    }
}
