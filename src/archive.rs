//! Multi-entry archive container.
//!
//! An archive bundles any number of compressed entries under one global
//! algorithm identifier. It only does bookkeeping: entries hold blobs that
//! were compressed by the caller (or by [`Archive::compress_entry`]), and
//! decompression goes through the codec resolved from the identifier.
//!
//! # Format
//!
//! All integers are little-endian, fields are written back to back with no
//! padding or checksums:
//!
//! ```text
//! [algorithm id: u8][entry count: u32]
//! per entry: [name len: u32][name: UTF-8][original size: u64][blob len: u32][blob]
//! ```
//!
//! Entry order is insertion order and survives a round trip unchanged.

use crate::codec::{Algorithm, Codec};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace, warn};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Suffix the original tool appended to extracted file names.
pub const EXTRACTED_SUFFIX: &str = ".uncompressed.txt";

/// One compressed file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    name: String,
    original_size: u64,
    data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, original_size: u64, data: Vec<u8>) -> Self {
        ArchiveEntry {
            name: name.into(),
            original_size,
            data,
        }
    }

    /// Original file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the original file in bytes.
    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    /// Compressed blob.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Original size divided by compressed size, `None` for an empty blob.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.original_size as f64 / self.data.len() as f64)
        }
    }

    /// File name used when the entry is written back to disk.
    pub fn extracted_file_name(&self) -> String {
        format!("{}{}", self.name, EXTRACTED_SUFFIX)
    }
}

/// Outcome of decompressing a single entry.
#[derive(Debug)]
pub struct ExtractedEntry<'a> {
    pub entry: &'a ArchiveEntry,
    pub text: Result<String>,
}

/// A container of compressed entries sharing one algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    algorithm: Algorithm,
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Create an empty archive for the given algorithm.
    pub fn new(algorithm: Algorithm) -> Self {
        Archive {
            algorithm,
            entries: Vec::new(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an already compressed entry.
    pub fn add_entry(&mut self, name: impl Into<String>, original_size: u64, data: Vec<u8>) {
        self.entries.push(ArchiveEntry::new(name, original_size, data));
    }

    /// Compress `text` with the archive's algorithm and append it. The
    /// original size recorded is the UTF-8 length of the text.
    pub fn compress_entry(&mut self, name: impl Into<String>, text: &str) -> Result<&ArchiveEntry> {
        let data = self.algorithm.compress(text)?;
        self.entries
            .push(ArchiveEntry::new(name, text.len() as u64, data));
        let entry = &self.entries[self.entries.len() - 1];
        trace!(
            "archive: added {:?}, {} -> {} bytes",
            entry.name,
            entry.original_size,
            entry.data.len()
        );
        Ok(entry)
    }

    /// Decompress every entry independently. A failing entry carries its
    /// error and does not stop the others.
    pub fn extract(&self) -> Vec<ExtractedEntry<'_>> {
        self.entries
            .iter()
            .map(|entry| {
                let text = self.algorithm.decompress(&entry.data);
                if let Err(e) = &text {
                    warn!("archive: entry {:?} failed to decompress: {}", entry.name, e);
                }
                ExtractedEntry { entry, text }
            })
            .collect()
    }

    /// Decompress every entry, stopping at the first failure.
    pub fn extract_all(&self) -> Result<Vec<String>> {
        self.entries
            .iter()
            .map(|entry| self.algorithm.decompress(&entry.data))
            .collect()
    }

    /// Serialize the archive to a writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u8(self.algorithm.id())?;
        writer.write_u32::<LittleEndian>(length_field("entry count", self.entries.len())?)?;
        for entry in &self.entries {
            let name = entry.name.as_bytes();
            writer.write_u32::<LittleEndian>(length_field("entry name length", name.len())?)?;
            writer.write_all(name)?;
            writer.write_u64::<LittleEndian>(entry.original_size)?;
            writer.write_u32::<LittleEndian>(length_field("entry data length", entry.data.len())?)?;
            writer.write_all(&entry.data)?;
        }
        debug!(
            "archive: wrote {} entries with algorithm {}",
            self.entries.len(),
            self.algorithm
        );
        Ok(())
    }

    /// Serialize the archive into a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(
            5 + self
                .entries
                .iter()
                .map(|e| 16 + e.name.len() + e.data.len())
                .sum::<usize>(),
        );
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Parse an archive from a reader, trusting the declared lengths. A
    /// reader that runs dry mid-archive yields `CorruptData`.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let id = reader
            .read_u8()
            .map_err(|e| Error::from_read(e, "algorithm id"))?;
        let algorithm = Algorithm::from_id(id)?;
        let count = read_len(&mut reader, "entry count")?;

        // Cap the preallocation; a corrupt count must not allocate up front.
        let mut entries = Vec::with_capacity(count.min(1024));
        for index in 0..count {
            let name_len = read_len(&mut reader, "entry name length")?;
            let name = String::from_utf8(read_blob(&mut reader, name_len, "entry name")?)
                .map_err(|_| Error::corrupt(format!("entry {} name is not valid UTF-8", index)))?;
            let original_size = reader
                .read_u64::<LittleEndian>()
                .map_err(|e| Error::from_read(e, "original size"))?;
            let data_len = read_len(&mut reader, "entry data length")?;
            let data = read_blob(&mut reader, data_len, "entry data")?;
            trace!("archive: read entry {:?} ({} bytes)", name, data.len());
            entries.push(ArchiveEntry {
                name,
                original_size,
                data,
            });
        }
        debug!(
            "archive: read {} entries with algorithm {}",
            entries.len(),
            algorithm
        );
        Ok(Archive { algorithm, entries })
    }

    /// Parse an archive that must span the whole slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        let archive = Self::read_from(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(Error::corrupt(format!(
                "{} trailing bytes after the last entry",
                cursor.len()
            )));
        }
        Ok(archive)
    }

    /// Write the archive to a file, replacing it if it exists.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a whole archive file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}

fn length_field(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::CapacityExceeded {
        what,
        value,
        limit: u32::MAX as usize,
    })
}

fn read_len<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    reader
        .read_u32::<LittleEndian>()
        .map(|len| len as usize)
        .map_err(|e| Error::from_read(e, what))
}

fn read_blob<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(64 * 1024));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(Error::corrupt(format!(
            "{} declares {} bytes, only {} available",
            what,
            len,
            buf.len()
        )));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        let mut archive = Archive::new(Algorithm::Lz77);
        archive.add_entry("a.txt", 12, vec![1, 2, 3]);
        archive.add_entry("b.txt", 0, vec![]);
        archive.add_entry("c.txt", u64::MAX, vec![0xff; 300]);
        archive
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let archive = sample();
        let bytes = archive.to_bytes().unwrap();
        let parsed = Archive::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.algorithm(), Algorithm::Lz77);
        let names: Vec<&str> = parsed.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
        assert_eq!(parsed, archive);
    }

    #[test]
    fn test_byte_layout() {
        let mut archive = Archive::new(Algorithm::Huffman);
        archive.add_entry("é", 7, vec![9, 8]);
        let bytes = archive.to_bytes().unwrap();

        let mut expected = vec![1u8];
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice("é".as_bytes());
        expected.extend_from_slice(&7u64.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&[9, 8]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_empty_archive() {
        let bytes = Archive::new(Algorithm::Lz78).to_bytes().unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0, 0]);
        assert!(Archive::from_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_algorithm() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = 9;
        assert!(matches!(
            Archive::from_bytes(&bytes),
            Err(Error::UnknownAlgorithm(9))
        ));
    }

    #[test]
    fn test_truncated_archive() {
        let bytes = sample().to_bytes().unwrap();
        for cut in [0, 1, 3, 9, 14, bytes.len() - 1] {
            assert!(
                matches!(Archive::from_bytes(&bytes[..cut]), Err(Error::CorruptData(_))),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_oversized_declared_length() {
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(b"name");
        assert!(matches!(
            Archive::from_bytes(&bytes),
            Err(Error::CorruptData(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            Archive::from_bytes(&bytes),
            Err(Error::CorruptData(_))
        ));
    }

    #[test]
    fn test_extract_reports_per_entry() {
        let mut archive = Archive::new(Algorithm::Lz78);
        archive.compress_entry("good.txt", "TOBEORNOTTOBE").unwrap();
        archive.add_entry("bad.txt", 3, vec![0, b'a', 9]);
        archive.compress_entry("also-good.txt", "abcabc").unwrap();

        let results = archive.extract();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text.as_deref().unwrap(), "TOBEORNOTTOBE");
        assert!(matches!(results[1].text, Err(Error::CorruptData(_))));
        assert_eq!(results[2].text.as_deref().unwrap(), "abcabc");

        assert!(archive.extract_all().is_err());
    }

    #[test]
    fn test_entry_helpers() {
        let entry = ArchiveEntry::new("notes.txt", 100, vec![0; 25]);
        assert_eq!(entry.compression_ratio(), Some(4.0));
        assert_eq!(entry.extracted_file_name(), "notes.txt.uncompressed.txt");
        assert_eq!(ArchiveEntry::new("e", 0, vec![]).compression_ratio(), None);
    }
}
