use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::errors::ArchiveError;
use crate::providers::{ArchiveReader, EntryCursor};
use crate::retrieval::model::ArchiveEntry;

/// Decode an entry name, falling back to lossy UTF-8 for legacy encodings
fn decode_entry_name(entry: &zip::read::ZipFile) -> String {
    let raw = entry.name_raw();
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Archive reader for ZIP files on local disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveReader;

impl ArchiveReader for ZipArchiveReader {
    fn open(&self, path: &Path) -> Result<Box<dyn EntryCursor>, ArchiveError> {
        let file = File::open(path)
            .map_err(|e| ArchiveError::Open(format!("{}: {}", path.display(), e)))?;
        let archive = ZipArchive::new(file)?;
        Ok(Box::new(ZipEntryCursor {
            archive,
            next_index: 0,
            current: None,
        }))
    }
}

/// Cursor walking a `ZipArchive` one entry at a time
pub struct ZipEntryCursor {
    archive: ZipArchive<File>,
    next_index: usize,
    current: Option<usize>,
}

impl EntryCursor for ZipEntryCursor {
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry>, ArchiveError> {
        if self.next_index >= self.archive.len() {
            self.current = None;
            return Ok(None);
        }

        let index = self.next_index;
        self.next_index += 1;

        let entry = self.archive.by_index_raw(index)?;
        let path = decode_entry_name(&entry);
        let is_directory = entry.is_dir();
        drop(entry);

        self.current = Some(index);
        Ok(Some(ArchiveEntry::new(path, is_directory)))
    }

    fn read_entry(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let index = self
            .current
            .ok_or_else(|| ArchiveError::Corrupt("no current entry to read".to_string()))?;

        let mut entry = self.archive.by_index(index)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
