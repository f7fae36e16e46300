//! MIDI variable-length quantities.

use crate::error::{Error, Result};

/// Longest encoding a Standard MIDI File may use (values up to 0x0FFF_FFFF).
pub const MAX_LEN: usize = 4;

/// Decodes the variable-length quantity starting at `pos`.
///
/// Returns the value and the position of the first byte after it.
pub fn read(buf: &[u8], pos: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut cursor = pos;
    loop {
        let Some(&byte) = buf.get(cursor) else {
            return Err(Error::TruncatedVarint { offset: pos });
        };
        if cursor - pos == MAX_LEN {
            return Err(Error::MalformedVarint { offset: pos });
        }
        cursor += 1;
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, cursor));
        }
    }
}

#[cfg(test)]
pub(crate) fn encode(mut value: u32) -> Vec<u8> {
    let mut out = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        out.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out.reverse();
    out
}
