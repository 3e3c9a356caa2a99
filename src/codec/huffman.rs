//! Huffman coding over 16-bit character units.
//!
//! Compression is a straight pipeline: count frequencies, build the tree,
//! derive the code table, encode the text into a bit sequence and pack it.
//! The packet carries the frequency table so the decoder can rebuild the
//! identical tree:
//!
//! ```text
//! [N: u32][(symbol: u16, freq: u32) x N][bit count: u32][packed bits, MSB first]
//! ```
//!
//! All integers are little-endian. The final byte of the payload is zero
//! padded on the right; the bit count tells the decoder where to stop.

use crate::codec::{from_units, to_units, Codec};
use crate::error::{Error, Result};
use bitvec::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

/// (symbol, count) for every distinct unit. The order is significant: it
/// is the order leaves are queued in when the tree is built.
pub type FrequencyTable = Vec<(u16, u32)>;

/// Unit to bit code mapping.
pub type CodeTable = HashMap<u16, BitSequence>;

/// Bits packed eight per byte, most significant bit first.
pub type BitSequence = BitVec<u8, Msb0>;

/// Represents a node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf node contains a symbol and its frequency.
    Leaf { symbol: u16, freq: u64 },
    /// An internal node with left and right children and combined frequency.
    Internal {
        freq: u64,
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    /// Returns the frequency of the node.
    pub fn freq(&self) -> u64 {
        match self {
            HuffmanNode::Leaf { freq, .. } => *freq,
            HuffmanNode::Internal { freq, .. } => *freq,
        }
    }
}

/// Heap entry ordered by (frequency, insertion sequence), smallest first.
///
/// Taking the minimum on that key is the same as stable-sorting the node
/// list by frequency and popping the first two, with merged parents
/// appended to the end of the list.
#[derive(Debug)]
struct QueuedNode {
    seq: usize,
    node: Box<HuffmanNode>,
}

impl QueuedNode {
    fn key(&self) -> (u64, usize) {
        (self.node.freq(), self.seq)
    }
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedNode {}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse: BinaryHeap is a max-heap.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build a frequency table for `units`, in ascending symbol order.
pub fn build_frequency_table(units: &[u16]) -> Result<FrequencyTable> {
    let mut freq = BTreeMap::new();
    for &unit in units {
        let count = freq.entry(unit).or_insert(0u32);
        *count = count.checked_add(1).ok_or(Error::CapacityExceeded {
            what: "symbol frequency",
            value: u32::MAX as usize + 1,
            limit: u32::MAX as usize,
        })?;
    }
    Ok(freq.into_iter().collect())
}

/// Build the Huffman tree given a frequency table.
/// Returns `None` if the frequency table is empty.
///
/// Leaves are queued in table order, so the same table (same entries in
/// the same order) always yields the same tree shape.
pub fn build_huffman_tree(freq_table: &FrequencyTable) -> Option<Box<HuffmanNode>> {
    let mut heap = BinaryHeap::with_capacity(freq_table.len());
    let mut seq = 0;
    for &(symbol, freq) in freq_table {
        heap.push(QueuedNode {
            seq,
            node: Box::new(HuffmanNode::Leaf {
                symbol,
                freq: u64::from(freq),
            }),
        });
        seq += 1;
    }

    loop {
        let left = heap.pop()?.node;
        let right = match heap.pop() {
            Some(queued) => queued.node,
            None => return Some(left),
        };
        heap.push(QueuedNode {
            seq,
            node: Box::new(HuffmanNode::Internal {
                freq: left.freq() + right.freq(),
                left,
                right,
            }),
        });
        seq += 1;
    }
}

/// Build the code table by walking the tree: left appends 0, right appends 1.
///
/// If the tree consists of a single leaf (one unique symbol), the code "0" is assigned.
pub fn build_code_table(node: &HuffmanNode) -> CodeTable {
    let mut table = CodeTable::new();
    build_code_table_helper(node, &mut BitSequence::new(), &mut table);
    table
}

fn build_code_table_helper(node: &HuffmanNode, prefix: &mut BitSequence, table: &mut CodeTable) {
    match node {
        HuffmanNode::Leaf { symbol, .. } => {
            let code = if prefix.is_empty() {
                bitvec![u8, Msb0; 0]
            } else {
                prefix.clone()
            };
            table.insert(*symbol, code);
        }
        HuffmanNode::Internal { left, right, .. } => {
            prefix.push(false);
            build_code_table_helper(left, prefix, table);
            prefix.pop();
            prefix.push(true);
            build_code_table_helper(right, prefix, table);
            prefix.pop();
        }
    }
}

/// Encode the units using the provided code table.
/// Each unit is replaced with its Huffman code.
pub fn encode(units: &[u16], code_table: &CodeTable) -> Result<BitSequence> {
    let mut bits = BitSequence::new();
    for unit in units {
        let code = code_table
            .get(unit)
            .ok_or_else(|| Error::corrupt(format!("no code for symbol {:#06x}", unit)))?;
        bits.extend_from_bitslice(code.as_bitslice());
    }
    Ok(bits)
}

/// Decode a bit sequence by walking the tree from the root: 0 goes left,
/// 1 goes right, and every leaf reached emits its symbol.
pub fn decode(bits: &BitSlice<u8, Msb0>, tree: &HuffmanNode) -> Result<Vec<u16>> {
    // A single-leaf tree encodes every occurrence as one 0 bit.
    if let HuffmanNode::Leaf { symbol, .. } = tree {
        if bits.any() {
            return Err(Error::corrupt("1 bit under a single-symbol tree"));
        }
        return Ok(vec![*symbol; bits.len()]);
    }

    let mut result = Vec::new();
    let mut current = tree;
    for bit in bits.iter().by_vals() {
        if let HuffmanNode::Internal { left, right, .. } = current {
            current = if bit { right } else { left };
        }
        if let HuffmanNode::Leaf { symbol, .. } = current {
            result.push(*symbol);
            current = tree;
        }
    }
    if !std::ptr::eq(current, tree) {
        return Err(Error::corrupt("bit stream ends in the middle of a code"));
    }
    Ok(result)
}

/// A self-contained compressed unit: frequency table plus packed bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanPacket {
    pub frequencies: FrequencyTable,
    pub bits: BitSequence,
}

impl HuffmanPacket {
    /// Serialize into the packet wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let symbol_count = u32_field("distinct symbol count", self.frequencies.len())?;
        let bit_count = u32_field("bit count", self.bits.len())?;

        let mut out = Vec::with_capacity(8 + self.frequencies.len() * 6 + self.bits.len() / 8 + 1);
        out.write_u32::<LittleEndian>(symbol_count)?;
        for &(symbol, freq) in &self.frequencies {
            out.write_u16::<LittleEndian>(symbol)?;
            out.write_u32::<LittleEndian>(freq)?;
        }
        out.write_u32::<LittleEndian>(bit_count)?;

        let mut bits = self.bits.clone();
        bits.set_uninitialized(false);
        out.extend_from_slice(bits.as_raw_slice());
        Ok(out)
    }

    /// Parse the packet wire format.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        let symbol_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::from_read(e, "symbol count"))?;
        if symbol_count == 0 {
            return Err(Error::corrupt("packet declares no symbols"));
        }
        if symbol_count as usize > cursor.len() / 6 {
            return Err(Error::corrupt(format!(
                "packet declares {} symbols but holds {} bytes",
                symbol_count,
                cursor.len()
            )));
        }

        // Kept in read order; the tree must be rebuilt from the same sequence.
        let mut frequencies = FrequencyTable::with_capacity(symbol_count as usize);
        let mut seen = HashSet::with_capacity(symbol_count as usize);
        for _ in 0..symbol_count {
            let symbol = cursor
                .read_u16::<LittleEndian>()
                .map_err(|e| Error::from_read(e, "symbol"))?;
            let freq = cursor
                .read_u32::<LittleEndian>()
                .map_err(|e| Error::from_read(e, "frequency"))?;
            if freq == 0 {
                return Err(Error::corrupt(format!(
                    "symbol {:#06x} has zero frequency",
                    symbol
                )));
            }
            if !seen.insert(symbol) {
                return Err(Error::corrupt(format!(
                    "symbol {:#06x} listed twice",
                    symbol
                )));
            }
            frequencies.push((symbol, freq));
        }

        let bit_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::from_read(e, "bit count"))? as usize;
        if cursor.len() != bit_count.div_ceil(8) {
            return Err(Error::corrupt(format!(
                "{} bits need {} payload bytes, found {}",
                bit_count,
                bit_count.div_ceil(8),
                cursor.len()
            )));
        }

        let mut bits = BitSequence::from_slice(cursor);
        bits.truncate(bit_count);
        Ok(HuffmanPacket { frequencies, bits })
    }
}

fn u32_field(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::CapacityExceeded {
        what,
        value,
        limit: u32::MAX as usize,
    })
}

/// Convenience function: builds the table and tree from the units and
/// encodes them into a packet.
pub fn huffman_encode(units: &[u16]) -> Result<Option<HuffmanPacket>> {
    let frequencies = build_frequency_table(units)?;
    let tree = match build_huffman_tree(&frequencies) {
        Some(tree) => tree,
        None => return Ok(None),
    };
    let code_table = build_code_table(&tree);
    let bits = encode(units, &code_table)?;
    debug!(
        "huffman: {} units, {} distinct symbols, {} bits",
        units.len(),
        frequencies.len(),
        bits.len()
    );
    Ok(Some(HuffmanPacket { frequencies, bits }))
}

/// Convenience function: rebuilds the tree from the packet's table and
/// decodes its bits.
pub fn huffman_decode(packet: &HuffmanPacket) -> Result<Vec<u16>> {
    let tree = build_huffman_tree(&packet.frequencies)
        .ok_or_else(|| Error::corrupt("packet has an empty frequency table"))?;
    let units = decode(&packet.bits, &tree)?;

    let expected = tree.freq();
    if units.len() as u64 != expected {
        return Err(Error::corrupt(format!(
            "decoded {} symbols, frequency table sums to {}",
            units.len(),
            expected
        )));
    }
    trace!("huffman: decoded {} units from {} bits", units.len(), packet.bits.len());
    Ok(units)
}

/// Huffman codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

impl Codec for HuffmanCodec {
    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        match huffman_encode(&to_units(text))? {
            Some(packet) => packet.to_bytes(),
            None => Ok(Vec::new()),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Ok(String::new());
        }
        let packet = HuffmanPacket::from_bytes(data)?;
        from_units(&huffman_decode(&packet)?)
    }

    fn name(&self) -> &'static str {
        "Huffman"
    }
}
