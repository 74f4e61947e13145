use std::io::Cursor;

use crc32fast::Hasher;

use crate::{
    binary_utils::{read_slice, read_tag, read_u32_be, remaining, write_u32_be},
    error::{Error, Result},
};

use super::SIGNATURE;

pub const IHDR: [u8; 4] = *b"IHDR";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
    /// Offset of the length field in the container.
    pub offset: usize,
    /// Whole chunk: length, type, payload and CRC.
    pub raw: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.kind, self.data) == self.crc
    }
}

/// Walks the chunks after the signature, stopping after IEND. Stored CRCs are not verified.
pub struct ChunkReader<'a> {
    cursor: Cursor<&'a [u8]>,
    done: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < SIGNATURE.len() || data[..SIGNATURE.len()] != SIGNATURE {
            return Err(Error::format(0, "missing PNG signature"));
        }
        let mut cursor = Cursor::new(data);
        cursor.set_position(SIGNATURE.len() as u64);
        Ok(ChunkReader {
            cursor,
            done: false,
        })
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let offset = self.cursor.position() as usize;
        let length = read_u32_be(&mut self.cursor)? as usize;
        let kind = read_tag(&mut self.cursor)?;
        let payload = read_slice(&mut self.cursor, length)?;
        let crc = read_u32_be(&mut self.cursor)?;
        let end = self.cursor.position() as usize;

        Ok(Chunk {
            kind,
            data: payload,
            crc,
            offset,
            raw: &data[offset..end],
        })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || remaining(&self.cursor) == 0 {
            return None;
        }
        match self.read_chunk() {
            Ok(chunk) => {
                self.done = chunk.kind == IEND;
                Some(Ok(chunk))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn chunk_crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    hasher.finalize()
}

pub fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    write_u32_be(out, data.len() as u32);
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    write_u32_be(out, chunk_crc(kind, data));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_matches_reference_value() {
        // CRC of an empty IEND chunk is fixed by the format.
        assert_eq!(chunk_crc(&IEND, &[]), 0xAE42_6082);
    }

    #[test]
    fn written_chunks_are_read_back() {
        let mut data = SIGNATURE.to_vec();
        write_chunk(&mut data, b"tEXt", b"hello");
        write_chunk(&mut data, &IEND, &[]);
        data.extend_from_slice(b"trailing garbage");

        let chunks: Vec<Chunk> = ChunkReader::new(&data)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].kind, b"tEXt");
        assert_eq!(chunks[0].data, b"hello");
        assert_eq!(chunks[0].offset, 8);
        assert_eq!(chunks[0].raw.len(), 12 + 5);
        assert!(chunks.iter().all(|c| c.crc_matches()));
        assert_eq!(chunks[1].kind, IEND);
    }

    #[test]
    fn overlong_chunk_reports_offset() {
        let mut data = SIGNATURE.to_vec();
        write_u32_be(&mut data, 100);
        data.extend_from_slice(b"IDAT");
        data.extend_from_slice(&[0; 10]);

        let mut reader = ChunkReader::new(&data).unwrap();
        match reader.next() {
            Some(Err(Error::Format { offset, .. })) => assert_eq!(offset, 16),
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }
}
