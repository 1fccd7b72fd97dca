//! The companion memo file (`.dbt` / `.fpt`): variable-length blobs
//! referenced by block index from a Memo field.

use crate::encoding::Encoding;
use crate::error::ErrorKind;
use crate::value::MemoValue;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

/// The three memo file dialects, determined at table-header parse time from
/// the version byte.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum MemoFileType {
    /// dBASE III: fixed 512-byte blocks, blobs terminated by `0x1A 0x1A`.
    DbaseMemo,
    /// dBASE IV: length-prefixed blobs, little-endian throughout.
    DbaseMemo4,
    /// Visual FoxPro: length-prefixed blobs, big-endian throughout.
    FoxBaseMemo,
}

impl MemoFileType {
    /// The byte order this dialect uses uniformly for both its header
    /// pointer and its per-block signature/length prefix (the specification
    /// fixes the ambiguity the source left between the two).
    fn is_little_endian(self) -> bool {
        matches!(self, MemoFileType::DbaseMemo4)
    }
}

#[derive(Debug, Copy, Clone)]
struct MemoHeader {
    next_free_block: u32,
    block_length: u32,
}

impl MemoHeader {
    fn read_from<R: Read>(src: &mut R, memo_type: MemoFileType) -> std::io::Result<Self> {
        let next_free_block = if memo_type.is_little_endian() {
            src.read_u32::<LittleEndian>()?
        } else {
            src.read_u32::<BigEndian>()?
        };
        let block_length = match memo_type {
            MemoFileType::DbaseMemo | MemoFileType::DbaseMemo4 => {
                match src.read_u16::<LittleEndian>()? {
                    0 => 512,
                    v => u32::from(v),
                }
            }
            MemoFileType::FoxBaseMemo => {
                let _reserved = src.read_u16::<BigEndian>()?;
                u32::from(src.read_u16::<BigEndian>()?).max(1)
            }
        };
        Ok(Self {
            next_free_block,
            block_length,
        })
    }

    fn write_to<W: Write>(&self, dst: &mut W, memo_type: MemoFileType) -> std::io::Result<()> {
        if memo_type.is_little_endian() {
            dst.write_u32::<LittleEndian>(self.next_free_block)?;
        } else {
            dst.write_u32::<BigEndian>(self.next_free_block)?;
        }
        Ok(())
    }
}

const DBASE_MEMO_SENTINEL: [u8; 2] = [0x1A, 0x1A];
/// Text-signature marker for length-prefixed dialects (dBASE IV / FoxPro).
const TEXT_SIGNATURE: u32 = 1;

/// Owns the memo file handle and the block-allocation state
/// (`next_free_block`, `block_length`) for the session.
pub(crate) struct MemoStore<T> {
    memo_type: MemoFileType,
    header: MemoHeader,
    source: T,
}

impl<T: Read + Seek> MemoStore<T> {
    pub(crate) fn open(memo_type: MemoFileType, mut source: T) -> std::io::Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let header = MemoHeader::read_from(&mut source, memo_type)?;
        Ok(Self {
            memo_type,
            header,
            source,
        })
    }

    fn block_offset(&self, index: u32) -> u64 {
        u64::from(index) * u64::from(self.header.block_length)
    }

    /// Reads the blob referenced by `index`, decoding text payloads with
    /// `encoding`.
    pub(crate) fn read_blob<E: Encoding>(
        &mut self,
        index: u32,
        encoding: &E,
    ) -> Result<MemoValue, ErrorKind> {
        self.source
            .seek(SeekFrom::Start(self.block_offset(index)))
            .map_err(ErrorKind::FileReadError)?;

        match self.memo_type {
            MemoFileType::DbaseMemo => {
                let mut data = Vec::new();
                let mut block = vec![0u8; self.header.block_length as usize];
                loop {
                    // The final block of the file is not guaranteed to be
                    // padded out to a full `block_length`, so accept
                    // whatever `read` can fill rather than requiring an
                    // exact-size read that would discard a short last block.
                    let mut filled = 0usize;
                    while filled < block.len() {
                        let n = self
                            .source
                            .read(&mut block[filled..])
                            .map_err(ErrorKind::FileReadError)?;
                        if n == 0 {
                            break;
                        }
                        filled += n;
                    }
                    if filled == 0 {
                        break;
                    }
                    // Search the whole accumulated buffer, not just this
                    // chunk: the sentinel can straddle a block boundary
                    // (its first byte as the chunk's last byte), and a
                    // per-chunk scan would miss that split and leak the
                    // trailing `0x1A` into the decoded text.
                    data.extend_from_slice(&block[..filled]);
                    if let Some(pos) = find_subslice(&data, &DBASE_MEMO_SENTINEL) {
                        data.truncate(pos);
                        break;
                    }
                    if filled < block.len() {
                        break;
                    }
                }
                Ok(MemoValue::Text(encoding.decode(&data)?.into_owned()))
            }
            MemoFileType::DbaseMemo4 | MemoFileType::FoxBaseMemo => {
                let little_endian = self.memo_type.is_little_endian();
                let signature = if little_endian {
                    self.source.read_u32::<LittleEndian>()
                } else {
                    self.source.read_u32::<BigEndian>()
                }
                .map_err(ErrorKind::FileReadError)?;
                let length = if little_endian {
                    self.source.read_u32::<LittleEndian>()
                } else {
                    self.source.read_u32::<BigEndian>()
                }
                .map_err(ErrorKind::FileReadError)?;
                let mut data = vec![0u8; length as usize];
                self.source
                    .read_exact(&mut data)
                    .map_err(ErrorKind::FileReadError)?;

                if signature == TEXT_SIGNATURE {
                    Ok(MemoValue::Text(encoding.decode(&data)?.into_owned()))
                } else {
                    Ok(MemoValue::Bytes(data))
                }
            }
        }
    }

    pub(crate) fn block_length(&self) -> u32 {
        self.header.block_length
    }

    pub(crate) fn next_free_block(&self) -> u32 {
        self.header.next_free_block
    }
}

/// Writes a fresh memo file header (`next_free_block = 1`, a 512-byte block
/// length) to `dest` so it's ready for [`MemoStore::open`]. Used when a
/// table is being created from scratch alongside a brand-new memo file.
pub(crate) fn initialize_new_memo_file<T: Write + Seek>(
    memo_type: MemoFileType,
    dest: &mut T,
) -> std::io::Result<()> {
    const DEFAULT_BLOCK_LENGTH: u32 = 512;
    let header = MemoHeader {
        next_free_block: 1,
        block_length: DEFAULT_BLOCK_LENGTH,
    };
    dest.seek(SeekFrom::Start(0))?;
    header.write_to(dest, memo_type)?;
    match memo_type {
        MemoFileType::DbaseMemo | MemoFileType::DbaseMemo4 => {
            dest.write_u16::<LittleEndian>(DEFAULT_BLOCK_LENGTH as u16)?;
        }
        MemoFileType::FoxBaseMemo => {
            dest.write_u16::<BigEndian>(0)?;
            dest.write_u16::<BigEndian>(DEFAULT_BLOCK_LENGTH as u16)?;
        }
    }
    // Pad the header block out to `block_length` so the first real blob
    // starts at block 1.
    dest.seek(SeekFrom::Start(DEFAULT_BLOCK_LENGTH as u64 - 1))?;
    dest.write_all(&[0u8])?;
    dest.seek(SeekFrom::Start(0))?;
    Ok(())
}

impl<T: Read + Write + Seek> MemoStore<T> {
    /// Appends a new blob, advances and persists `next_free_block`, and
    /// returns the pre-increment index to store in the owning field.
    pub(crate) fn write_blob(&mut self, payload: &[u8]) -> Result<u32, ErrorKind> {
        let index = self.header.next_free_block;
        let start = self.block_offset(index);
        self.source
            .seek(SeekFrom::Start(start))
            .map_err(ErrorKind::FileWriteError)?;

        let little_endian = self.memo_type.is_little_endian();
        let payload_len = match self.memo_type {
            MemoFileType::DbaseMemo => {
                self.source
                    .write_all(payload)
                    .map_err(ErrorKind::FileWriteError)?;
                self.source
                    .write_all(&DBASE_MEMO_SENTINEL)
                    .map_err(ErrorKind::FileWriteError)?;
                payload.len() + DBASE_MEMO_SENTINEL.len()
            }
            MemoFileType::DbaseMemo4 | MemoFileType::FoxBaseMemo => {
                let write_prefix = |source: &mut T| -> std::io::Result<()> {
                    if little_endian {
                        source.write_u32::<LittleEndian>(TEXT_SIGNATURE)?;
                        source.write_u32::<LittleEndian>(payload.len() as u32)?;
                    } else {
                        source.write_u32::<BigEndian>(TEXT_SIGNATURE)?;
                        source.write_u32::<BigEndian>(payload.len() as u32)?;
                    }
                    Ok(())
                };
                write_prefix(&mut self.source).map_err(ErrorKind::FileWriteError)?;
                self.source
                    .write_all(payload)
                    .map_err(ErrorKind::FileWriteError)?;
                8 + payload.len()
            }
        };

        let blocks_needed = (payload_len as u64).div_ceil(u64::from(self.header.block_length));
        self.header.next_free_block = self
            .header
            .next_free_block
            .checked_add(blocks_needed as u32)
            .ok_or(ErrorKind::InvalidValue)?;

        self.source
            .seek(SeekFrom::Start(0))
            .map_err(ErrorKind::FileWriteError)?;
        self.header
            .write_to(&mut self.source, self.memo_type)
            .map_err(ErrorKind::FileWriteError)?;

        Ok(index)
    }
}

impl<T> std::fmt::Debug for MemoStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoStore")
            .field("memo_type", &self.memo_type)
            .field("header", &self.header)
            .finish()
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::UnicodeLossy;
    use std::io::Cursor;

    fn fresh_store(memo_type: MemoFileType, block_length: u16) -> MemoStore<Cursor<Vec<u8>>> {
        let mut header = Vec::new();
        match memo_type {
            MemoFileType::DbaseMemo4 => {
                header.write_u32::<LittleEndian>(1).unwrap();
                header.write_u16::<LittleEndian>(block_length).unwrap();
            }
            MemoFileType::DbaseMemo => {
                header.write_u32::<BigEndian>(1).unwrap();
                header.write_u16::<LittleEndian>(block_length).unwrap();
            }
            MemoFileType::FoxBaseMemo => {
                header.write_u32::<BigEndian>(1).unwrap();
                header.write_u16::<BigEndian>(0).unwrap();
                header.write_u16::<BigEndian>(block_length).unwrap();
            }
        }
        header.resize(block_length as usize, 0);
        MemoStore::open(memo_type, Cursor::new(header)).unwrap()
    }

    #[test]
    fn dbase_iii_write_then_read() {
        let mut store = fresh_store(MemoFileType::DbaseMemo, 64);
        let index = store.write_blob(b"hello memo").unwrap();
        assert_eq!(index, 1);
        let value = store.read_blob(index, &UnicodeLossy).unwrap();
        assert_eq!(value, MemoValue::Text("hello memo".to_string()));
    }

    #[test]
    fn foxpro_block_count_matches_scenario_6() {
        let mut store = fresh_store(MemoFileType::FoxBaseMemo, 64);
        assert_eq!(store.block_length(), 64);
        let payload = vec![b'x'; 8];
        let before = store.next_free_block();
        store.write_blob(&payload).unwrap();
        let blocks_used = store.next_free_block() - before;
        assert_eq!(blocks_used as u64, (8u64 + payload.len() as u64).div_ceil(64));
    }

    #[test]
    fn dbase_iii_read_handles_unpadded_final_block() {
        // A blob spanning two blocks whose trailing block is shorter than
        // `block_length` (the file simply ends after the sentinel, with no
        // padding out to the next block boundary).
        let mut store = fresh_store(MemoFileType::DbaseMemo, 8);
        let payload = b"a long enough memo to span blocks";
        let index = store.write_blob(payload).unwrap();
        let value = store.read_blob(index, &UnicodeLossy).unwrap();
        assert_eq!(value, MemoValue::Text(String::from_utf8(payload.to_vec()).unwrap()));
    }

    #[test]
    fn dbase_iii_sentinel_split_across_block_boundary_is_still_found() {
        // 9-byte payload + the 2-byte sentinel is 11 bytes, one byte past a
        // single 10-byte block: the sentinel's first `0x1A` lands as the
        // last byte of block 1 and the second as the first byte of block 2.
        let mut store = fresh_store(MemoFileType::DbaseMemo, 10);
        let payload = b"123456789";
        let index = store.write_blob(payload).unwrap();
        let value = store.read_blob(index, &UnicodeLossy).unwrap();
        assert_eq!(value, MemoValue::Text("123456789".to_string()));
    }

    #[test]
    fn dbase_iv_write_then_read_roundtrip() {
        let mut store = fresh_store(MemoFileType::DbaseMemo4, 32);
        let index = store.write_blob("some text".as_bytes()).unwrap();
        let value = store.read_blob(index, &UnicodeLossy).unwrap();
        assert_eq!(value, MemoValue::Text("some text".to_string()));
    }
}
