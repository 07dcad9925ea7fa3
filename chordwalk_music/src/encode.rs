// Primitive field encoders for the Standard MIDI File byte layout.
//
// Fixed-width integers are big-endian. Delta-times use the MIDI
// variable-length quantity (VLQ): 7-bit groups, most significant first, with
// bit 7 set on every group except the last. `var_len_byte_count` must agree
// exactly with `write_var_len`, because track lengths are summed from it
// before any event byte is written (see `midi.rs`).
//
// `read_var_len` is the inverse; nothing in the writer path needs it, it
// exists so the encoding can be checked by decoding.

use crate::error::MidiError;
use std::io::{self, Read, Write};

/// Largest value a four-byte VLQ can carry. SMF readers reject longer
/// delta-times, so `midi.rs` validates against this at append time.
pub const VAR_LEN_MAX: u32 = 0x0FFF_FFFF;

/// Longest VLQ produced for a `u32` (5 groups of 7 bits cover 32 bits).
const VAR_LEN_MAX_BYTES: usize = 5;

pub fn write_u16_be<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub fn write_u32_be<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Write `value` as a variable-length quantity and return the byte count.
///
/// Negative values and values above `u32::MAX` are refused before anything
/// is written.
pub fn write_var_len<W: Write>(writer: &mut W, value: i64) -> Result<usize, MidiError> {
    if value < 0 {
        return Err(MidiError::NegativeDuration(value));
    }
    let value = u32::try_from(value).map_err(|_| MidiError::DeltaTimeOverflow(value))?;

    let mut buf = [0u8; VAR_LEN_MAX_BYTES];
    let mut start = VAR_LEN_MAX_BYTES - 1;
    buf[start] = (value & 0x7F) as u8;
    let mut rest = value >> 7;
    while rest > 0 {
        start -= 1;
        buf[start] = ((rest & 0x7F) as u8) | 0x80;
        rest >>= 7;
    }
    writer.write_all(&buf[start..])?;
    Ok(VAR_LEN_MAX_BYTES - start)
}

/// Number of bytes `write_var_len` emits for `value`.
pub fn var_len_byte_count(value: u32) -> usize {
    let significant_bits = (u32::BITS - value.leading_zeros()).max(1) as usize;
    significant_bits.div_ceil(7)
}

/// Decode one variable-length quantity.
pub fn read_var_len<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut value: u64 = 0;
    for _ in 0..VAR_LEN_MAX_BYTES {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        value = (value << 7) | u64::from(byte[0] & 0x7F);
        if byte[0] & 0x80 == 0 {
            return u32::try_from(value).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "variable-length quantity exceeds u32")
            });
        }
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("variable-length quantity longer than {VAR_LEN_MAX_BYTES} bytes"),
    ))
}
