//! Text compression with three interchangeable codecs and a small archive
//! container.
//!
//! - [`HuffmanCodec`]: frequency-driven prefix coding
//! - [`Lz77Codec`]: sliding-window back-references
//! - [`Lz78Codec`]: incremental dictionary substitution
//! - [`Archive`]: bundles several compressed entries under one algorithm id
//!
//! # Examples
//!
//! ```rust
//! use mizip::{Algorithm, Archive, Codec};
//!
//! let mut archive = Archive::new(Algorithm::Lz77);
//! archive.compress_entry("a.txt", "abcabcabcabc").unwrap();
//!
//! let bytes = archive.to_bytes().unwrap();
//! let parsed = Archive::from_bytes(&bytes).unwrap();
//! let text = parsed.algorithm().decompress(parsed.entries()[0].data()).unwrap();
//! assert_eq!(text, "abcabcabcabc");
//! ```

pub mod archive;
pub mod codec;
pub mod error;

pub use archive::{Archive, ArchiveEntry, ExtractedEntry};
pub use codec::huffman::HuffmanCodec;
pub use codec::lz77::Lz77Codec;
pub use codec::lz78::Lz78Codec;
pub use codec::{Algorithm, Codec};
pub use error::{Error, Result};
