use std::io::{Cursor, Read};

use crate::error::{Error, Result};

fn fill(cursor: &mut Cursor<&[u8]>, buf: &mut [u8]) -> Result<()> {
    let offset = cursor.position() as usize;
    cursor.read_exact(buf).map_err(|_| {
        Error::format(
            offset,
            format!("unexpected end of data, wanted {} bytes", buf.len()),
        )
    })
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    let mut buf = [0u8; 1];
    fill(cursor, &mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    let mut buf = [0u8; 2];
    fill(cursor, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32_be(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut buf = [0u8; 4];
    fill(cursor, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn read_tag(cursor: &mut Cursor<&[u8]>) -> Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    fill(cursor, &mut buf)?;
    Ok(buf)
}

/// Borrow `length` bytes from the underlying buffer and advance past them.
pub fn read_slice<'a>(cursor: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8]> {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::format(
                start,
                format!(
                    "not enough bytes remaining for {} (buffer length: {})",
                    length,
                    data.len()
                ),
            )
        })?;
    cursor.set_position(end as u64);
    Ok(&data[start..end])
}

pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize)
}

/// Read `N` consecutive little-endian u16 values from a record slice.
pub fn u16_array_le<const N: usize>(record: &[u8]) -> [u16; N] {
    let mut values = [0u16; N];
    for (value, bytes) in values.iter_mut().zip(record.chunks_exact(2)) {
        *value = u16::from_le_bytes([bytes[0], bytes[1]]);
    }
    values
}

pub fn write_u32_be(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
