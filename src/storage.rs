//! Bitrow - Dataset container
//!
//! Flat binary container for persisted datasets: a single-line JSON header
//! carrying the metadata attributes, followed by `n_observations * n_words`
//! little-endian 64-bit words. Row access goes through the [`RowStore`]
//! trait, so the generation and mutation engines never see the file format;
//! the offline tools load whole files zero-copy through a memory map.
//!
//! Derived dimensions are never persisted - `n_words` and the class bit
//! count are recomputed from the header through [`Descriptor::compute`].

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

use crate::codec::Word;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::rowset::RowSet;

/// Format tag written into every header.
pub const FORMAT_TAG: &str = "bitrow/1";

/// Maximum header size accepted when opening a file.
const MAX_HEADER_BYTES: usize = 4096;

const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// Metadata attributes persisted once per dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub format: String,
    pub n_classes: u32,
    pub n_attributes: u32,
    pub n_observations: u32,
}

impl Metadata {
    /// Header values for a dataset with these dimensions.
    pub fn new(descriptor: &Descriptor) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            n_classes: descriptor.n_classes,
            n_attributes: descriptor.n_attributes,
            n_observations: descriptor.n_observations,
        }
    }

    /// Re-derive the full descriptor from the persisted attributes.
    pub fn descriptor(&self) -> Result<Descriptor> {
        Descriptor::compute(self.n_observations, self.n_attributes, self.n_classes)
    }
}

/// Row-level access to a persisted or in-memory dataset.
///
/// Transfers are always exactly `n_words` words. Implementations fail loudly
/// with [`Error::Storage`]; nothing is retried.
pub trait RowStore {
    /// Read the row at `index` into `row`.
    fn read_row(&mut self, index: u32, row: &mut [Word]) -> Result<()>;

    /// Write `row` at `index`.
    fn write_row(&mut self, index: u32, row: &[Word]) -> Result<()>;
}

/// File-backed row store over the flat container format.
///
/// Created at full size up front so random-access writes during noise
/// injection stay inside the allocation.
pub struct FileStore {
    file: File,
    data_offset: u64,
    n_words: usize,
    n_rows: u32,
    scratch: Vec<u8>,
}

impl FileStore {
    /// Create a new container for `descriptor`, header written, payload
    /// zeroed to full size. Fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P, descriptor: &Descriptor) -> Result<Self> {
        let path = path.as_ref();
        let mut header =
            serde_json::to_string(&Metadata::new(descriptor)).expect("metadata serializes");
        header.push('\n');

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::storage(format!("creating {}", path.display()), e))?;

        file.write_all(header.as_bytes())
            .map_err(|e| Error::storage("writing header", e))?;

        let data_offset = header.len() as u64;
        let n_words = descriptor.n_words as usize;
        let payload = descriptor.total_words() * WORD_BYTES as u64;
        file.set_len(data_offset + payload)
            .map_err(|e| Error::storage("sizing payload", e))?;

        debug!(
            path = %path.display(),
            rows = descriptor.n_observations,
            bytes = data_offset + payload,
            "container created"
        );

        Ok(Self {
            file,
            data_offset,
            n_words,
            n_rows: descriptor.n_observations,
            scratch: vec![0; n_words * WORD_BYTES],
        })
    }

    /// Open an existing container for row-level access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, Metadata)> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::storage(format!("opening {}", path.display()), e))?;

        let mut head = Vec::with_capacity(256);
        let header_end = read_header(&mut file, &mut head)?;
        let metadata = parse_header(&head[..header_end])?;
        let descriptor = metadata.descriptor()?;

        let data_offset = header_end as u64 + 1;
        check_payload_size(
            file.metadata()
                .map_err(|e| Error::storage("reading file metadata", e))?
                .len(),
            data_offset,
            &descriptor,
        )?;

        let n_words = descriptor.n_words as usize;
        Ok((
            Self {
                file,
                data_offset,
                n_words,
                n_rows: descriptor.n_observations,
                scratch: vec![0; n_words * WORD_BYTES],
            },
            metadata,
        ))
    }

    fn offset_of(&self, index: u32) -> u64 {
        self.data_offset + u64::from(index) * (self.n_words * WORD_BYTES) as u64
    }
}

impl RowStore for FileStore {
    fn read_row(&mut self, index: u32, row: &mut [Word]) -> Result<()> {
        assert!(index < self.n_rows, "row {} out of bounds", index);
        debug_assert_eq!(row.len(), self.n_words);

        self.file
            .seek(SeekFrom::Start(self.offset_of(index)))
            .and_then(|_| self.file.read_exact(&mut self.scratch))
            .map_err(|e| Error::storage(format!("reading row {}", index), e))?;

        for (word, bytes) in row.iter_mut().zip(self.scratch.chunks_exact(WORD_BYTES)) {
            *word = Word::from_le_bytes(bytes.try_into().expect("chunk is word-sized"));
        }
        Ok(())
    }

    fn write_row(&mut self, index: u32, row: &[Word]) -> Result<()> {
        assert!(index < self.n_rows, "row {} out of bounds", index);
        debug_assert_eq!(row.len(), self.n_words);

        for (bytes, word) in self.scratch.chunks_exact_mut(WORD_BYTES).zip(row) {
            bytes.copy_from_slice(&word.to_le_bytes());
        }

        self.file
            .seek(SeekFrom::Start(self.offset_of(index)))
            .and_then(|_| self.file.write_all(&self.scratch))
            .map_err(|e| Error::storage(format!("writing row {}", index), e))
    }
}

/// Load a whole container into an owned [`RowSet`] through a memory map.
pub fn load_rowset<P: AsRef<Path>>(path: P) -> Result<(RowSet, Metadata)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::storage(format!("opening {}", path.display()), e))?;
    let mmap = unsafe { Mmap::map(&file) }
        .map_err(|e| Error::storage(format!("mapping {}", path.display()), e))?;

    let header_end = mmap
        .iter()
        .take(MAX_HEADER_BYTES)
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::MalformedHeader("no header line found".into()))?;
    let metadata = parse_header(&mmap[..header_end])?;
    let descriptor = metadata.descriptor()?;

    let data_offset = header_end as u64 + 1;
    check_payload_size(mmap.len() as u64, data_offset, &descriptor)?;

    let payload = &mmap[data_offset as usize..];
    let words: Vec<Word> = payload
        .chunks_exact(WORD_BYTES)
        .take(descriptor.total_words() as usize)
        .map(|bytes| Word::from_le_bytes(bytes.try_into().expect("chunk is word-sized")))
        .collect();

    debug!(path = %path.display(), rows = descriptor.n_observations, "dataset loaded");
    Ok((RowSet::from_words(words, descriptor.n_words), metadata))
}

fn read_header(file: &mut File, head: &mut Vec<u8>) -> Result<usize> {
    let mut chunk = [0u8; 256];
    loop {
        let n = file
            .read(&mut chunk)
            .map_err(|e| Error::storage("reading header", e))?;
        if n == 0 {
            return Err(Error::MalformedHeader("no header line found".into()));
        }
        head.extend_from_slice(&chunk[..n]);
        if let Some(at) = head.iter().position(|&b| b == b'\n') {
            return Ok(at);
        }
        if head.len() > MAX_HEADER_BYTES {
            return Err(Error::MalformedHeader("header line too long".into()));
        }
    }
}

fn parse_header(bytes: &[u8]) -> Result<Metadata> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::MalformedHeader("header is not UTF-8".into()))?;
    let metadata: Metadata =
        serde_json::from_str(text).map_err(|e| Error::MalformedHeader(e.to_string()))?;
    if metadata.format != FORMAT_TAG {
        return Err(Error::MalformedHeader(format!(
            "unsupported format tag {:?}",
            metadata.format
        )));
    }
    Ok(metadata)
}

fn check_payload_size(file_len: u64, data_offset: u64, descriptor: &Descriptor) -> Result<()> {
    let expected = data_offset + descriptor.total_words() * WORD_BYTES as u64;
    if file_len != expected {
        return Err(Error::MalformedHeader(format!(
            "payload size mismatch: file is {} bytes, header implies {}",
            file_len, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::mutator::{inject_duplicates, inject_inconsistencies};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn descriptor() -> Descriptor {
        Descriptor::compute(5, 70, 3).unwrap()
    }

    #[test]
    fn test_create_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let d = descriptor();

        let mut store = FileStore::create(&path, &d).unwrap();
        let row = vec![0xDEAD_BEEF_CAFE_F00D as Word, 0x0123_4567_89AB_CDEF];
        store.write_row(3, &row).unwrap();

        let mut back = vec![0 as Word; 2];
        store.read_row(3, &mut back).unwrap();
        assert_eq!(back, row);

        // Untouched rows read as zero
        store.read_row(0, &mut back).unwrap();
        assert_eq!(back, vec![0, 0]);
    }

    #[test]
    fn test_reopen_preserves_rows_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let d = descriptor();

        {
            let mut store = FileStore::create(&path, &d).unwrap();
            store.write_row(1, &[11, 12]).unwrap();
            store.write_row(4, &[41, 42]).unwrap();
        }

        let (mut store, metadata) = FileStore::open(&path).unwrap();
        assert_eq!(metadata, Metadata::new(&d));
        assert_eq!(metadata.descriptor().unwrap(), d);

        let mut back = vec![0 as Word; 2];
        store.read_row(4, &mut back).unwrap();
        assert_eq!(back, vec![41, 42]);
    }

    #[test]
    fn test_load_rowset_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let d = descriptor();

        let mut store = FileStore::create(&path, &d).unwrap();
        for i in 0..d.n_observations {
            let w = Word::from(i) + 1;
            store.write_row(i, &[w, w << 32]).unwrap();
        }
        drop(store);

        let (rows, metadata) = load_rowset(&path).unwrap();
        assert_eq!(metadata.n_observations, 5);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.row(2), &[3, 3 << 32]);
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        FileStore::create(&path, &descriptor()).unwrap();
        assert!(matches!(
            FileStore::create(&path, &descriptor()),
            Err(Error::Storage { .. })
        ));
    }

    #[test]
    fn test_open_rejects_garbage_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "not a header").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_open_rejects_truncated_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let d = descriptor();
        FileStore::create(&path, &d).unwrap();

        let file = OpenOptions::new().write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        file.set_len(len - 8).unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(Error::MalformedHeader(_))
        ));
        assert!(matches!(load_rowset(&path), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_generate_inject_dedup_pipeline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let d = Descriptor::compute(100, 40, 4).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let mut store = FileStore::create(&path, &d).unwrap();
        generate(&d, 30, &mut rng, &mut store).unwrap();
        inject_inconsistencies(&mut store, &d, 3, &mut rng).unwrap();
        inject_duplicates(&mut store, &d, 3, &mut rng).unwrap();
        drop(store);

        let (mut rows, metadata) = load_rowset(&path).unwrap();
        assert_eq!(metadata.descriptor().unwrap(), d);
        assert_eq!(rows.len(), 100);

        rows.sort();
        let removed = rows.remove_duplicates();
        assert_eq!(removed + rows.len(), 100);
        for i in 1..rows.len() as u32 {
            assert!(rows.row(i - 1) < rows.row(i));
        }

        let index = rows.class_index(&d).unwrap();
        assert_eq!(index.iter().map(Vec::len).sum::<usize>(), rows.len());
    }

    #[test]
    fn test_open_rejects_wrong_format_tag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bitrow");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"format":"other/9","n_classes":2,"n_attributes":4,"n_observations":1}}"#
        )
        .unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(Error::MalformedHeader(_))
        ));
    }
}
