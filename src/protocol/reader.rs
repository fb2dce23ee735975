//! Decode cursor for the beta 1.8.1 wire format
//!
//! Reads big-endian values and String16 text from a framed packet buffer.

use thiserror::Error;

use super::string16::String16;
use super::types::WireField;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("Unexpected end of packet: expected {expected} bytes, only {available} available")]
    UnexpectedEnd { expected: usize, available: usize },
}

pub type ReadResult<T> = Result<T, ReadError>;

/// Read cursor shared by every field of one packet decode.
///
/// The position only moves forward and never past the end of the buffer: a
/// read that does not fit fails without consuming anything. Field decoders
/// use [`DecodeCursor::take`], which counts such failures instead of
/// stopping, so every declared field is attempted.
pub struct DecodeCursor<'a> {
    data: &'a [u8],
    pos: usize,
    failures: u32,
}

impl<'a> DecodeCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failures: 0,
        }
    }

    /// Create a cursor positioned just past the opcode byte of a frame.
    pub fn after_opcode(frame: &'a [u8]) -> Self {
        Self {
            data: frame,
            pos: frame.len().min(1),
            failures: 0,
        }
    }

    /// Get the current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if we've reached the end of the buffer.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of field reads that did not fit in the buffer.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Count a failed field read.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Decode one field, counting a failure and yielding the field's default
    /// value when the buffer is too short.
    pub fn take<T: WireField>(&mut self) -> T {
        match T::read(self) {
            Ok(value) => value,
            Err(_) => {
                self.record_failure();
                T::default()
            }
        }
    }

    fn ensure(&self, count: usize) -> ReadResult<()> {
        if count > self.remaining() {
            return Err(ReadError::UnexpectedEnd {
                expected: count,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        self.ensure(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(bytes)
    }

    /// Read a single unsigned byte (ubyte).
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    /// Read a single signed byte (byte).
    pub fn read_i8(&mut self) -> ReadResult<i8> {
        self.read_array::<1>().map(i8::from_be_bytes)
    }

    /// Read a boolean byte. Any nonzero value is true.
    pub fn read_bool(&mut self) -> ReadResult<bool> {
        self.read_u8().map(|v| v != 0)
    }

    pub fn read_u16(&mut self) -> ReadResult<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_i16(&mut self) -> ReadResult<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> ReadResult<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> ReadResult<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> ReadResult<f32> {
        self.read_array().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> ReadResult<f64> {
        self.read_array().map(f64::from_be_bytes)
    }

    /// Read a String16: 2-byte character count then 2 bytes per character.
    ///
    /// Nothing is consumed unless the count and the whole payload fit.
    pub fn read_string16(&mut self) -> ReadResult<String16> {
        let count = self.peek_u16()? as usize;
        self.ensure(2 + 2 * count)?;
        let start = self.pos + 2;
        let units = self.data[start..start + 2 * count]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        self.pos = start + 2 * count;
        Ok(String16::from_units(units))
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_u8(&self) -> ReadResult<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    /// Peek at the next u16 without consuming it.
    pub fn peek_u16(&self) -> ReadResult<u16> {
        self.ensure(2)?;
        Ok(u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]))
    }

    /// Get a slice of the remaining data.
    pub fn remaining_data(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u8() {
        let data = [0x42, 0xFF, 0x00];
        let mut cursor = DecodeCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 0x42);
        assert_eq!(cursor.read_u8().unwrap(), 0xFF);
        assert_eq!(cursor.read_u8().unwrap(), 0x00);
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn test_read_i32_big_endian() {
        let data = [0x00, 0x00, 0x00, 0x2A, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut cursor = DecodeCursor::new(&data);

        assert_eq!(cursor.read_i32().unwrap(), 42);
        assert_eq!(cursor.read_i32().unwrap(), -1);
    }

    #[test]
    fn test_read_floats() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f32.to_be_bytes());
        data.extend_from_slice(&(-2.25f64).to_be_bytes());
        let mut cursor = DecodeCursor::new(&data);

        assert_eq!(cursor.read_f32().unwrap(), 1.5);
        assert_eq!(cursor.read_f64().unwrap(), -2.25);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_string16() {
        let data = [0x00, 0x02, 0x00, 0x68, 0x00, 0x69];
        let mut cursor = DecodeCursor::new(&data);

        assert_eq!(cursor.read_string16().unwrap(), "hi");
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_truncated_string16_consumes_nothing() {
        let data = [0x00, 0x03, 0x00, 0x68, 0x00];
        let mut cursor = DecodeCursor::new(&data);

        assert_eq!(
            cursor.read_string16(),
            Err(ReadError::UnexpectedEnd {
                expected: 8,
                available: 5
            })
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_failed_read_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = DecodeCursor::new(&data);

        assert!(cursor.read_i32().is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_i16().unwrap(), 0x0102);
    }

    #[test]
    fn test_take_counts_failures() {
        let data = [0x00, 0x07, 0x01];
        let mut cursor = DecodeCursor::new(&data);

        let a: i16 = cursor.take();
        let b: i32 = cursor.take();
        let c: u8 = cursor.take();
        let d: i64 = cursor.take();

        assert_eq!((a, b, c, d), (7, 0, 1, 0));
        assert_eq!(cursor.failures(), 2);
        assert_eq!(cursor.position(), cursor.len());
    }

    #[test]
    fn test_after_opcode() {
        let frame = [0x00, 0x00, 0x00, 0x00, 0x2A];
        let mut cursor = DecodeCursor::after_opcode(&frame);

        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_i32().unwrap(), 42);

        let empty: [u8; 0] = [];
        assert_eq!(DecodeCursor::after_opcode(&empty).position(), 0);
    }

    #[test]
    fn test_peek() {
        let data = [0x10, 0x00, 0xFF];
        let cursor = DecodeCursor::new(&data);

        assert_eq!(cursor.peek_u8().unwrap(), 0x10);
        assert_eq!(cursor.peek_u16().unwrap(), 0x1000);
        assert_eq!(cursor.position(), 0);
    }
}
