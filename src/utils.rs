//! Utility functions and structures: packed integer vectors, byte code
//! wrappers, and file helpers.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use gbwt::support::{ByteCode, ByteCodeIter};

use simple_sds::bits;
use simple_sds::raw_vector::{AccessRaw, PushRaw, RawVector};

//-----------------------------------------------------------------------------

// Utilities for working with files.

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.3} {}", value, UNITS[unit])
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    filename.as_ref().exists()
}

/// Returns a buffered reader for the file, transparently decompressing
/// gzip-compressed input.
///
/// Compression is detected from the two-byte gzip magic number, which is
/// sniffed from the buffer without consuming it.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, String> {
    let path = filename.as_ref();
    let file = File::open(path).map_err(
        |x| format!("Cannot open {}: {}", path.display(), x)
    )?;
    let mut reader = BufReader::new(file);
    let gzipped = match reader.fill_buf() {
        Ok(buffer) => buffer.starts_with(&[0x1F, 0x8B]),
        Err(x) => return Err(format!("Cannot read {}: {}", path.display(), x)),
    };
    if gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

//-----------------------------------------------------------------------------

// Variable-length integers use the byte code from the `gbwt` crate: 7 bits
// of data per byte from the least significant end, with the high bit of each
// byte marking continuation.

/// Writes an unsigned integer to the output using [`ByteCode`].
pub fn write_varint<W: Write>(value: usize, output: &mut W) -> io::Result<()> {
    let mut encoder = ByteCode::new();
    encoder.write(value);
    output.write_all(&Vec::from(encoder))
}

/// Reads an unsigned integer written with [`write_varint`].
///
/// Returns an error if the stream ends early or the encoding does not fit in
/// a 64-bit integer.
pub fn read_varint<R: Read>(input: &mut R) -> Result<usize, String> {
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        let mut byte = [0u8];
        input.read_exact(&mut byte).map_err(|x| x.to_string())?;
        bytes.push(byte[0]);
        if byte[0] & 0x80 == 0 {
            break;
        }
        if bytes.len() >= 10 {
            return Err(String::from("Variable-length integer is too large"));
        }
    }
    let mut decoder = ByteCodeIter::new(&bytes);
    decoder.next().ok_or(String::from("Invalid variable-length integer"))
}

/// Writes a signed integer as a byte code. Small absolute values are
/// represented as small numbers.
pub fn write_signed<W: Write>(value: i64, output: &mut W) -> io::Result<()> {
    let encoded = if value < 0 {
        (-2 * value - 1) as usize
    } else {
        2 * value as usize
    };
    write_varint(encoded, output)
}

/// Reads a signed integer written with [`write_signed`].
pub fn read_signed<R: Read>(input: &mut R) -> Result<i64, String> {
    let value = read_varint(input)?;
    if value % 2 == 0 {
        Ok((value / 2) as i64)
    } else {
        Ok(-((value as i64 + 1) / 2))
    }
}

//-----------------------------------------------------------------------------

/// An immutable vector of unsigned integers packed to a fixed bit width.
///
/// The width is chosen when the vector is built from its final values.
/// The serialization format is a single byte for the width, a varint for the
/// number of items, and the payload packed into little-endian bytes.
/// Distance vectors use a +1 bias, so that a stored 0 means unreachable and a
/// stored value `v` means distance `v - 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedVector {
    len: usize,
    width: usize,
    data: RawVector,
}

impl PackedVector {
    /// Builds a packed vector from the given values, using the smallest
    /// sufficient width.
    pub fn from_values(values: &[u64]) -> Self {
        let max_value = values.iter().cloned().max().unwrap_or(0);
        let width = bits::bit_len(max_value).max(1);
        let mut data = RawVector::with_capacity(values.len() * width);
        for value in values {
            unsafe { data.push_int(*value, width); }
        }
        PackedVector { len: values.len(), width, data }
    }

    /// Returns the number of items in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the width of the items in bits.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the item at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        assert!(index < self.len, "PackedVector: index {} is out of bounds (length {})", index, self.len);
        unsafe { self.data.int(index * self.width, self.width) }
    }

    /// Returns the size of the serialized payload in bytes.
    pub fn payload_bytes(&self) -> usize {
        (self.len * self.width + 7) / 8
    }

    /// Writes the vector to the output in the serialization format.
    pub fn serialize<W: Write>(&self, output: &mut W) -> io::Result<()> {
        output.write_all(&[self.width as u8])?;
        write_varint(self.len, output)?;
        let mut buffer: Vec<u8> = vec![0; self.payload_bytes()];
        for index in 0..self.len {
            let value = self.get(index);
            let start = index * self.width;
            for bit in 0..self.width {
                if value & (1 << bit) != 0 {
                    let pos = start + bit;
                    buffer[pos / 8] |= 1 << (pos % 8);
                }
            }
        }
        output.write_all(&buffer)?;
        Ok(())
    }

    /// Loads a vector written with [`PackedVector::serialize`].
    ///
    /// Returns a format error if the width is invalid or the payload is truncated.
    pub fn load<R: Read>(input: &mut R) -> Result<Self, String> {
        let mut width_byte = [0u8];
        input.read_exact(&mut width_byte).map_err(|x| x.to_string())?;
        let width = width_byte[0] as usize;
        if width == 0 || width > 64 {
            return Err(format!("Invalid packed vector width: {}", width));
        }
        let len = read_varint(input)?;
        let payload = (len * width + 7) / 8;
        let mut buffer: Vec<u8> = vec![0; payload];
        input.read_exact(&mut buffer).map_err(
            |_| format!("Truncated packed vector: expected {} payload bytes", payload)
        )?;
        let mut data = RawVector::with_capacity(len * width);
        for index in 0..len {
            let start = index * width;
            let mut value: u64 = 0;
            for bit in 0..width {
                let pos = start + bit;
                if buffer[pos / 8] & (1 << (pos % 8)) != 0 {
                    value |= 1 << bit;
                }
            }
            unsafe { data.push_int(value, width); }
        }
        Ok(PackedVector { len, width, data })
    }
}

impl Default for PackedVector {
    fn default() -> Self {
        PackedVector::from_values(&[])
    }
}

//-----------------------------------------------------------------------------

// Biased distance coding within packed vectors.

/// Encodes a distance for storage: -1 becomes 0 and distance `d` becomes `d + 1`.
#[inline]
pub fn encode_distance(value: i64) -> u64 {
    debug_assert!(value >= -1, "Distances below -1 cannot be encoded");
    (value + 1) as u64
}

/// Decodes a distance stored with [`encode_distance`].
#[inline]
pub fn decode_distance(value: u64) -> i64 {
    value as i64 - 1
}

//-----------------------------------------------------------------------------

/// A writer that discards its input and counts the number of bytes written.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountingWriter {
    written: usize,
}

impl CountingWriter {
    /// Creates a new counting writer.
    pub fn new() -> Self {
        CountingWriter::default()
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trip() {
        let values = [0, 1, 127, 128, 300, 16383, 16384, usize::MAX / 2, usize::MAX];
        for value in values {
            let mut buffer: Vec<u8> = Vec::new();
            write_varint(value, &mut buffer).unwrap();
            let decoded = read_varint(&mut buffer.as_slice());
            assert_eq!(decoded, Ok(value), "Wrong varint round trip for {}", value);
        }
    }

    #[test]
    fn signed_round_trip() {
        let values = [0, 1, -1, 63, -64, 1000, -1000, 1 << 40, -(1 << 40)];
        for value in values {
            let mut buffer: Vec<u8> = Vec::new();
            write_signed(value, &mut buffer).unwrap();
            let decoded = read_signed(&mut buffer.as_slice());
            assert_eq!(decoded, Ok(value), "Wrong signed round trip for {}", value);
        }
    }

    #[test]
    fn truncated_varint() {
        let buffer: Vec<u8> = vec![0x80, 0x80];
        assert!(read_varint(&mut buffer.as_slice()).is_err(), "Accepted a truncated varint");
    }

    #[test]
    fn varint_matches_byte_code() {
        let values = [0, 1, 127, 128, 300, 16384, usize::MAX];

        // A buffer encoded directly with ByteCode decodes with read_varint.
        let mut encoder = ByteCode::new();
        for value in values {
            encoder.write(value);
        }
        let buffer = Vec::from(encoder);
        let mut reader = buffer.as_slice();
        for value in values {
            assert_eq!(read_varint(&mut reader), Ok(value), "Wrong value {} from a ByteCode buffer", value);
        }

        // And write_varint produces the same bytes.
        let mut written: Vec<u8> = Vec::new();
        for value in values {
            write_varint(value, &mut written).unwrap();
        }
        assert_eq!(written, buffer, "write_varint disagrees with ByteCode");
    }

    #[test]
    fn packed_vector_round_trip() {
        let values: Vec<u64> = vec![0, 5, 17, 1, 255, 256, 12345, 3];
        let vector = PackedVector::from_values(&values);
        assert_eq!(vector.len(), values.len(), "Wrong length");
        for (index, value) in values.iter().enumerate() {
            assert_eq!(vector.get(index), *value, "Wrong value at index {}", index);
        }

        let mut buffer: Vec<u8> = Vec::new();
        vector.serialize(&mut buffer).unwrap();
        let loaded = PackedVector::load(&mut buffer.as_slice());
        assert_eq!(loaded, Ok(vector), "Wrong packed vector after serialization");
    }

    #[test]
    fn packed_vector_empty() {
        let vector = PackedVector::from_values(&[]);
        assert!(vector.is_empty(), "Empty vector is not empty");
        let mut buffer: Vec<u8> = Vec::new();
        vector.serialize(&mut buffer).unwrap();
        let loaded = PackedVector::load(&mut buffer.as_slice()).unwrap();
        assert!(loaded.is_empty(), "Loaded empty vector is not empty");
    }

    #[test]
    fn packed_vector_rejects_bad_width() {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.push(65);
        write_varint(3, &mut buffer).unwrap();
        buffer.extend(std::iter::repeat(0u8).take(32));
        assert!(PackedVector::load(&mut buffer.as_slice()).is_err(), "Accepted width 65");
    }

    #[test]
    fn packed_vector_rejects_truncation() {
        let values: Vec<u64> = vec![1000; 100];
        let vector = PackedVector::from_values(&values);
        let mut buffer: Vec<u8> = Vec::new();
        vector.serialize(&mut buffer).unwrap();
        buffer.truncate(buffer.len() - 10);
        assert!(PackedVector::load(&mut buffer.as_slice()).is_err(), "Accepted a truncated payload");
    }

    #[test]
    fn distance_bias() {
        for value in [-1, 0, 1, 100] {
            assert_eq!(decode_distance(encode_distance(value)), value, "Wrong bias round trip for {}", value);
        }
        assert_eq!(encode_distance(-1), 0, "Unreachable is not stored as 0");
    }

    #[test]
    fn counting_writer() {
        let mut writer = CountingWriter::new();
        writer.write_all(b"0123456789").unwrap();
        write_varint(300, &mut writer).unwrap();
        assert_eq!(writer.written(), 12, "Wrong number of bytes counted");
    }
}

//-----------------------------------------------------------------------------
