use crate::codec::{byte_unit, from_units, to_units, Codec};
use crate::error::{Error, Result};
use log::debug;
use std::collections::HashMap;

/// Dictionary entries addressable by a one-byte index, the empty seed included.
pub const MAX_ENTRIES: usize = u8::MAX as usize + 1;

/// Character value marking a pair that appends nothing to its phrase.
const NO_CHAR: u8 = 0;

/// An LZ78 token.
///
/// Each token is a pair (index, next), where:
/// - `index` is the dictionary index of the longest previously seen phrase that is a prefix of the current input.
/// - `next` is the unit that did not match (or `None` for a phrase flushed at end of input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub index: usize,
    pub next: Option<u16>,
}

/// Compress input units using the LZ78 algorithm.
///
/// # Algorithm
///
/// 1. Start with a dictionary containing only the empty phrase at index 0.
/// 2. Extend the current phrase while (phrase + next unit) is in the dictionary.
/// 3. Otherwise output `(index(phrase), unit)`, insert phrase + unit at the
///    next index and restart from the empty phrase.
/// 4. A phrase still pending when the input runs out is output as
///    `(index(phrase), None)`.
///
/// # Example
///
/// ```
/// use mizip::codec::lz78::{compress, Token};
///
/// let data: Vec<u16> = "aaa".encode_utf16().collect();
/// assert_eq!(
///     compress(&data),
///     vec![Token { index: 0, next: Some(97) }, Token { index: 1, next: Some(97) }]
/// );
/// ```
pub fn compress(input: &[u16]) -> Vec<Token> {
    let mut dict: HashMap<Vec<u16>, usize> = HashMap::new();
    dict.insert(Vec::new(), 0);
    let mut tokens = Vec::new();
    let mut current: Vec<u16> = Vec::new();

    for &unit in input {
        current.push(unit);
        if dict.contains_key(&current) {
            continue;
        }
        let phrase = &current[..current.len() - 1];
        let index = dict.get(phrase).copied().unwrap_or(0);
        tokens.push(Token {
            index,
            next: Some(unit),
        });
        let next_index = dict.len();
        dict.insert(std::mem::take(&mut current), next_index);
    }

    if !current.is_empty() {
        let index = dict.get(&current).copied().unwrap_or(0);
        tokens.push(Token { index, next: None });
    }
    tokens
}

/// Decompress a sequence of LZ78 tokens back into the original units.
///
/// The dictionary is rebuilt as tokens are consumed: every decoded phrase
/// is appended to the output and registered under the next index.
pub fn decompress(tokens: &[Token]) -> Result<Vec<u16>> {
    let mut dict: Vec<Vec<u16>> = vec![Vec::new()];
    let mut output = Vec::new();

    for token in tokens {
        let mut phrase = dict
            .get(token.index)
            .cloned()
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "dictionary index {} with {} entries defined",
                    token.index,
                    dict.len()
                ))
            })?;
        if let Some(unit) = token.next {
            phrase.push(unit);
        }
        output.extend_from_slice(&phrase);
        dict.push(phrase);
    }
    Ok(output)
}

/// Serialize tokens as `[index][char]` byte pairs.
///
/// Byte 0 is the "no character" marker, so a NUL unit cannot be written.
pub fn write_tokens(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        if token.index >= MAX_ENTRIES {
            return Err(Error::CapacityExceeded {
                what: "dictionary index",
                value: token.index,
                limit: MAX_ENTRIES - 1,
            });
        }
        let next = match token.next {
            Some(0) => {
                return Err(Error::CapacityExceeded {
                    what: "NUL character (reserved terminator)",
                    value: 0,
                    limit: 0,
                })
            }
            Some(unit) => byte_unit(unit)?,
            None => NO_CHAR,
        };
        out.push(token.index as u8);
        out.push(next);
    }
    Ok(out)
}

/// Parse `[index][char]` byte pairs back into tokens.
pub fn read_tokens(data: &[u8]) -> Result<Vec<Token>> {
    if data.len() % 2 != 0 {
        return Err(Error::corrupt(format!(
            "stream length {} is not a whole number of pairs",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| Token {
            index: pair[0] as usize,
            next: (pair[1] != NO_CHAR).then(|| u16::from(pair[1])),
        })
        .collect())
}

/// LZ78 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz78Codec;

impl Codec for Lz78Codec {
    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        let units = to_units(text);
        let tokens = compress(&units);
        debug!("lz78: {} units -> {} tokens", units.len(), tokens.len());
        write_tokens(&tokens)
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        from_units(&decompress(&read_tokens(data)?)?)
    }

    fn name(&self) -> &'static str {
        "LZ78"
    }
}
