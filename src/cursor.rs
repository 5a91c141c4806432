//! Bounds-checked read-only view over a byte buffer.
//!
//! A [`BinaryCursor`] is a window `(offset, length)` into a shared buffer.
//! All multi-byte reads are little-endian. Views are cheap to copy and are
//! sliced repeatedly while decoding; the buffer itself is never mutated.

use nom::number::complete::{le_u16, le_u32, le_u64, le_u8};
use nom::IResult;

use crate::error::{DecodeError, Result};

#[derive(Debug, Clone, Copy)]
pub struct BinaryCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    length: usize,
}

impl<'a> BinaryCursor<'a> {
    /// View over the whole buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            length: buffer.len(),
        }
    }

    /// Absolute offset of the view's first byte in the underlying buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The bytes covered by the view.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    /// Diagnostic copy of the bytes covered by the view.
    pub fn raw_bytes(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// A narrower view starting `offset` bytes into this one.
    pub fn subview(&self, offset: usize, length: usize) -> Result<Self> {
        self.ensure(offset, length)?;
        Ok(Self {
            buffer: self.buffer,
            offset: self.offset + offset,
            length,
        })
    }

    /// Everything from `offset` to the end of the view.
    pub fn tail(&self, offset: usize) -> Result<Self> {
        let length = self
            .length
            .checked_sub(offset)
            .ok_or_else(|| self.out_of_bounds(offset, 0))?;
        self.subview(offset, length)
    }

    /// Shrink the view from the front.
    pub fn advance(&mut self, amount: usize) -> Result<()> {
        self.ensure(0, amount)?;
        self.offset += amount;
        self.length -= amount;
        Ok(())
    }

    /// Split off the first `amount` bytes as their own view and advance past them.
    pub fn take(&mut self, amount: usize) -> Result<Self> {
        let head = self.subview(0, amount)?;
        self.advance(amount)?;
        Ok(head)
    }

    pub fn read_u8(&self, at: usize) -> Result<u8> {
        let parsed: IResult<&[u8], u8> = le_u8(self.window(at, 1)?);
        parsed.map(|(_, v)| v).map_err(|_| self.out_of_bounds(at, 1))
    }

    pub fn read_u16(&self, at: usize) -> Result<u16> {
        let parsed: IResult<&[u8], u16> = le_u16(self.window(at, 2)?);
        parsed.map(|(_, v)| v).map_err(|_| self.out_of_bounds(at, 2))
    }

    pub fn read_u32(&self, at: usize) -> Result<u32> {
        let parsed: IResult<&[u8], u32> = le_u32(self.window(at, 4)?);
        parsed.map(|(_, v)| v).map_err(|_| self.out_of_bounds(at, 4))
    }

    pub fn read_u64(&self, at: usize) -> Result<u64> {
        let parsed: IResult<&[u8], u64> = le_u64(self.window(at, 8)?);
        parsed.map(|(_, v)| v).map_err(|_| self.out_of_bounds(at, 8))
    }

    /// Little-endian integer of `width` bytes (1 to 8) at `at`.
    ///
    /// Odd widths (3, 5, 6, 7) are assembled byte by byte, which is how the
    /// 24-bit package length is read. Any other width is an error.
    pub fn read_field(&self, width: usize, at: usize) -> Result<u64> {
        match width {
            1 => self.read_u8(at).map(u64::from),
            2 => self.read_u16(at).map(u64::from),
            4 => self.read_u32(at).map(u64::from),
            8 => self.read_u64(at),
            3 | 5..=7 => {
                let bytes = self.window(at, width)?;
                Ok(bytes
                    .iter()
                    .rev()
                    .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
            }
            _ => Err(DecodeError::UnsupportedWidth {
                width,
                offset: self.offset + at,
            }),
        }
    }

    /// `(value >> shift) & mask`, for flags packed below byte granularity.
    pub fn read_bits(value: u8, mask: u8, shift: u32) -> u8 {
        (value >> shift) & mask
    }

    /// Read a NUL-terminated 8-bit string at the front of the view and advance past it.
    pub fn read_null_terminated_ascii(&mut self) -> Result<String> {
        let bytes = self.as_slice();
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::UnterminatedString {
                offset: self.offset,
                encoding: "ASCII",
            })?;
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
        self.advance(end + 1)?;
        Ok(text)
    }

    /// Read a NUL-terminated UTF-16LE string at the front of the view and advance past it.
    pub fn read_null_terminated_utf16(&mut self) -> Result<String> {
        let bytes = self.as_slice();
        let mut units = Vec::new();
        let mut terminated = false;
        for pair in bytes.chunks_exact(2) {
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            if unit == 0 {
                terminated = true;
                break;
            }
            units.push(unit);
        }
        if !terminated {
            return Err(DecodeError::UnterminatedString {
                offset: self.offset,
                encoding: "UTF-16",
            });
        }
        let text = char::decode_utf16(units.iter().copied())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        self.advance((units.len() + 1) * 2)?;
        Ok(text)
    }

    fn window(&self, at: usize, size: usize) -> Result<&'a [u8]> {
        self.ensure(at, size)?;
        let start = self.offset + at;
        Ok(&self.buffer[start..start + size])
    }

    fn ensure(&self, at: usize, size: usize) -> Result<()> {
        match at.checked_add(size) {
            Some(end) if end <= self.length => Ok(()),
            _ => Err(self.out_of_bounds(at, size)),
        }
    }

    fn out_of_bounds(&self, at: usize, requested: usize) -> DecodeError {
        DecodeError::OutOfBounds {
            offset: self.offset.saturating_add(at),
            requested,
            available: self.length.saturating_sub(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xFF];
        let cursor = BinaryCursor::new(&data);
        assert_eq!(cursor.read_u16(0).unwrap(), 0x5678);
        assert_eq!(cursor.read_u32(0).unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_field(3, 0).unwrap(), 0x34_5678);
        assert_eq!(cursor.read_field(1, 4).unwrap(), 0xFF);
    }

    #[test]
    fn field_widths_outside_one_to_eight_fail() {
        let data = [0xAAu8; 16];
        let cursor = BinaryCursor::new(&data);
        assert!(matches!(
            cursor.read_field(9, 0),
            Err(DecodeError::UnsupportedWidth { width: 9, offset: 0 })
        ));
        assert!(matches!(
            cursor.read_field(0, 2),
            Err(DecodeError::UnsupportedWidth { width: 0, offset: 2 })
        ));
        assert_eq!(cursor.read_field(7, 0).unwrap(), 0x00AA_AAAA_AAAA_AAAA);
    }

    #[test]
    fn reads_past_the_view_fail() {
        let data = [0u8; 8];
        let view = BinaryCursor::new(&data).subview(2, 3).unwrap();
        assert!(matches!(
            view.read_u32(0),
            Err(DecodeError::OutOfBounds { offset: 2, requested: 4, available: 3 })
        ));
        assert!(view.read_u16(1).is_ok());
        assert!(view.read_u16(2).is_err());
        assert!(view.subview(1, 3).is_err());
        assert!(view.read_u8(usize::MAX).is_err());
    }

    #[test]
    fn advance_shrinks_from_the_front() {
        let data = [1u8, 2, 3, 4];
        let mut cursor = BinaryCursor::new(&data);
        cursor.advance(1).unwrap();
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.as_slice(), &[2, 3, 4]);
        let head = cursor.take(2).unwrap();
        assert_eq!(head.as_slice(), &[2, 3]);
        assert_eq!(cursor.as_slice(), &[4]);
        assert!(cursor.advance(2).is_err());
        assert_eq!(cursor.len(), 1);
    }

    #[test]
    fn bit_accessor_masks_after_shifting() {
        assert_eq!(BinaryCursor::read_bits(0x8C, 0x7F, 0), 0x0C);
        assert_eq!(BinaryCursor::read_bits(0x8C, 0x01, 7), 1);
        assert_eq!(BinaryCursor::read_bits(0x0C, 0x01, 7), 0);
    }

    #[test]
    fn ascii_string_stops_at_terminator() {
        let data = b"en-US\0rest";
        let mut cursor = BinaryCursor::new(data);
        assert_eq!(cursor.read_null_terminated_ascii().unwrap(), "en-US");
        assert_eq!(cursor.as_slice(), b"rest");
        assert!(matches!(
            cursor.read_null_terminated_ascii(),
            Err(DecodeError::UnterminatedString { offset: 6, .. })
        ));
    }

    #[test]
    fn utf16_string_requires_terminator_inside_view() {
        let data = [b'H', 0, b'i', 0, 0, 0, 0xAA];
        let mut cursor = BinaryCursor::new(&data);
        assert_eq!(cursor.read_null_terminated_utf16().unwrap(), "Hi");
        assert_eq!(cursor.as_slice(), &[0xAA]);

        let truncated = [b'H', 0, b'i', 0];
        let mut cursor = BinaryCursor::new(&truncated);
        assert!(cursor.read_null_terminated_utf16().is_err());
        assert_eq!(cursor.len(), 4);
    }
}
