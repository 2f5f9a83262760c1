//! Primitive wire types of the RealMedia header and index structures.
//!
//! Integers are big-endian. Tags are read as raw bytes, which is the same as
//! comparing them as little-endian packed values. Strings are prefixed by
//! either a byte or a big-endian word length.

use super::FourCc;
use crate::source::ByteSource;
use crate::Result;

/// Width of a string's length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrLen {
    Byte,
    Word,
}

/// Chunk-level reads on top of a [`ByteSource`].
///
/// Every method returns [`Error::Eof`](crate::Error::Eof) when the source
/// runs dry; the value must not be used in that case.
pub trait ChunkRead: ByteSource {
    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read(&mut b)?;
        Ok(b[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    fn read_fourcc(&mut self) -> Result<FourCc> {
        let mut b = [0u8; 4];
        self.read(&mut b)?;
        Ok(FourCc(b))
    }

    /// Read exactly `n` raw bytes.
    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read(&mut buf)?;
        Ok(buf)
    }

    fn read_str_len(&mut self, len: StrLen) -> Result<usize> {
        Ok(match len {
            StrLen::Byte => self.read_u8()? as usize,
            StrLen::Word => self.read_u16()? as usize,
        })
    }

    /// Read a length-prefixed string into `buf`.
    ///
    /// At most `buf.len()` bytes are stored; the rest of a longer string is
    /// skipped unread. Returns the number of bytes stored.
    fn read_str_into(&mut self, len: StrLen, buf: &mut [u8]) -> Result<usize> {
        let declared = self.read_str_len(len)?;
        let stored = declared.min(buf.len());
        self.read(&mut buf[..stored])?;
        if declared > stored {
            self.skip((declared - stored) as u64)?;
        }
        Ok(stored)
    }

    /// Read a length-prefixed string, keeping at most `cap` bytes.
    fn read_string(&mut self, len: StrLen, cap: usize) -> Result<String> {
        let declared = self.read_str_len(len)?;
        let stored = declared.min(cap);
        let bytes = self.read_vec(stored)?;
        if declared > stored {
            self.skip((declared - stored) as u64)?;
        }
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// Skip a length-prefixed string. Returns its declared length.
    fn skip_str(&mut self, len: StrLen) -> Result<usize> {
        let declared = self.read_str_len(len)?;
        self.skip(declared as u64)?;
        Ok(declared)
    }
}

impl<S: ByteSource + ?Sized> ChunkRead for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IoSource;
    use crate::Error;
    use std::io::Cursor;

    fn source(bytes: &[u8]) -> IoSource<Cursor<Vec<u8>>> {
        IoSource::new(Cursor::new(bytes.to_vec())).unwrap()
    }

    #[test]
    fn test_big_endian_integers() {
        let mut src = source(&[0x12, 0x34, 0xde, 0xad, 0xbe, 0xef, 0x7f]);
        assert_eq!(src.read_u16().unwrap(), 0x1234);
        assert_eq!(src.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(src.read_u8().unwrap(), 0x7f);
        assert!(matches!(src.read_u8(), Err(Error::Eof)));
    }

    #[test]
    fn test_truncated_word_is_eof() {
        let mut src = source(&[0x01]);
        assert!(src.read_u16().unwrap_err().is_eof());
    }

    #[test]
    fn test_string_longer_than_buffer_is_truncated_and_skipped() {
        let mut src = source(&[6, b'a', b'b', b'c', b'd', b'e', b'f', 0x99]);
        let mut buf = [0u8; 4];
        let n = src.read_str_into(StrLen::Byte, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"abcd");
        // The remainder was skipped, not left for the next read.
        assert_eq!(src.read_u8().unwrap(), 0x99);
    }

    #[test]
    fn test_word_string() {
        let mut src = source(&[0, 5, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(src.read_string(StrLen::Word, 64).unwrap(), "hello");
        assert_eq!(src.tell(), 7);
    }

    #[test]
    fn test_skip_str() {
        let mut src = source(&[3, 1, 2, 3, 0xaa]);
        assert_eq!(src.skip_str(StrLen::Byte).unwrap(), 3);
        assert_eq!(src.read_u8().unwrap(), 0xaa);
    }

    #[test]
    fn test_empty_string() {
        let mut src = source(&[0, 0]);
        assert_eq!(src.read_string(StrLen::Word, 16).unwrap(), "");
    }
}
