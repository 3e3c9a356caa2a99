use crate::codec::{byte_unit, from_units, to_units, Codec};
use crate::error::{Error, Result};
use log::debug;

/// Size of the search window in character units.
pub const WINDOW_SIZE: usize = 1024;
/// Largest back-reference distance a match token can carry.
pub const MAX_DISTANCE: usize = u8::MAX as usize;
/// Largest length a match token can carry.
pub const MAX_LENGTH: usize = u8::MAX as usize;
/// Shortest match worth a three-byte token instead of literals.
pub const MIN_MATCH: usize = 3;

const LITERAL_FLAG: u8 = 0;
const MATCH_FLAG: u8 = 1;

/// An LZ77 token.
///
/// On the wire a literal is `[0x00][unit]` and a match is
/// `[0x01][distance][length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single character unit copied verbatim.
    Literal(u16),
    /// Copy `length` units starting `distance` units back from the end of the output.
    Match { distance: usize, length: usize },
}

/// Compress the input units into LZ77 tokens.
///
/// At each position every distance from 1 up to the reachable window is
/// tried, and the first distance giving the longest match wins. The window
/// is [`WINDOW_SIZE`] units, but only distances up to [`MAX_DISTANCE`] can
/// be written, so the search never looks further back than that. Matches
/// may run past the current position (distance < length).
///
/// # Example
///
/// ```
/// use mizip::codec::lz77::{compress, Token};
///
/// let data: Vec<u16> = "aaaaaaaaaa".encode_utf16().collect();
/// let tokens = compress(&data);
/// assert_eq!(tokens, vec![Token::Literal(97), Token::Match { distance: 1, length: 9 }]);
/// ```
pub fn compress(input: &[u16]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let reach = pos.min(WINDOW_SIZE).min(MAX_DISTANCE);
        let max_length = (input.len() - pos).min(MAX_LENGTH);
        let mut best_length = 0;
        let mut best_distance = 0;

        for distance in 1..=reach {
            let start = pos - distance;
            let mut length = 0;
            while length < max_length && input[start + length] == input[pos + length] {
                length += 1;
            }
            if length > best_length {
                best_length = length;
                best_distance = distance;
                if length == max_length {
                    break;
                }
            }
        }

        if best_length >= MIN_MATCH {
            tokens.push(Token::Match {
                distance: best_distance,
                length: best_length,
            });
            pos += best_length;
        } else {
            tokens.push(Token::Literal(input[pos]));
            pos += 1;
        }
    }
    tokens
}

/// Decompress a sequence of LZ77 tokens into the original units.
///
/// Matches are copied one unit at a time so that overlapping references
/// repeat the units they have just produced.
pub fn decompress(tokens: &[Token]) -> Result<Vec<u16>> {
    let mut output = Vec::new();
    for token in tokens {
        match *token {
            Token::Literal(unit) => output.push(unit),
            Token::Match { distance, length } => {
                if distance == 0 || distance > output.len() {
                    return Err(Error::corrupt(format!(
                        "match distance {} with {} units of output",
                        distance,
                        output.len()
                    )));
                }
                if length == 0 {
                    return Err(Error::corrupt("match of length 0"));
                }
                let start = output.len() - distance;
                output.reserve(length);
                for i in 0..length {
                    output.push(output[start + i]);
                }
            }
        }
    }
    Ok(output)
}

/// Serialize tokens into the byte stream.
pub fn write_tokens(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        match *token {
            Token::Literal(unit) => {
                out.push(LITERAL_FLAG);
                out.push(byte_unit(unit)?);
            }
            Token::Match { distance, length } => {
                out.push(MATCH_FLAG);
                out.push(bounded("match distance", distance)?);
                out.push(bounded("match length", length)?);
            }
        }
    }
    Ok(out)
}

fn bounded(what: &'static str, value: usize) -> Result<u8> {
    match u8::try_from(value) {
        Ok(byte) if byte > 0 => Ok(byte),
        _ => Err(Error::CapacityExceeded {
            what,
            value,
            limit: u8::MAX as usize,
        }),
    }
}

/// Parse the byte stream back into tokens.
pub fn read_tokens(data: &[u8]) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut bytes = data.iter().copied();
    while let Some(flag) = bytes.next() {
        let token = match flag {
            LITERAL_FLAG => {
                let unit = bytes
                    .next()
                    .ok_or_else(|| Error::corrupt("literal token cut short"))?;
                Token::Literal(u16::from(unit))
            }
            MATCH_FLAG => match (bytes.next(), bytes.next()) {
                (Some(distance), Some(length)) => Token::Match {
                    distance: distance as usize,
                    length: length as usize,
                },
                _ => return Err(Error::corrupt("match token cut short")),
            },
            other => {
                return Err(Error::corrupt(format!("unknown token flag {:#04x}", other)));
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// LZ77 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz77Codec;

impl Codec for Lz77Codec {
    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        let units = to_units(text);
        let tokens = compress(&units);
        debug!("lz77: {} units -> {} tokens", units.len(), tokens.len());
        write_tokens(&tokens)
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        from_units(&decompress(&read_tokens(data)?)?)
    }

    fn name(&self) -> &'static str {
        "LZ77"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(compress(&[]).is_empty());
        assert!(Lz77Codec.compress("").unwrap().is_empty());
        assert_eq!(Lz77Codec.decompress(&[]).unwrap(), "");
    }

    #[test]
    fn test_no_repetition() {
        // When there is no repetition, every token should be a literal.
        let tokens = compress(&units("abcdefg"));
        assert_eq!(tokens.len(), 7);
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
    }

    #[test]
    fn test_single_character_repetition() {
        let packed = Lz77Codec.compress("aaaaaaaaaa").unwrap();
        assert_eq!(packed, vec![0, b'a', 1, 1, 9]);
        assert_eq!(Lz77Codec.decompress(&packed).unwrap(), "aaaaaaaaaa");
    }

    #[test]
    fn test_short_matches_stay_literal() {
        // "ab" repeats but is below the minimum match length.
        let tokens = compress(&units("abxab"));
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
    }

    #[test]
    fn test_first_distance_wins_ties() {
        // "abc" occurs at distance 3 and 6; the nearer one is found first.
        let tokens = compress(&units("abcabcabc"));
        assert_eq!(
            tokens,
            vec![
                Token::Literal(97),
                Token::Literal(98),
                Token::Literal(99),
                Token::Match {
                    distance: 3,
                    length: 6
                },
            ]
        );
    }

    #[test]
    fn test_compress_decompress() {
        let input = "abracadabra abracadabra";
        let packed = Lz77Codec.compress(input).unwrap();
        assert!(packed.len() < input.len() * 2);
        assert_eq!(Lz77Codec.decompress(&packed).unwrap(), input);
    }

    #[test]
    fn test_long_run_splits_at_max_length() {
        let input = "z".repeat(600);
        let tokens = compress(&units(&input));
        assert!(tokens.iter().all(|t| match t {
            Token::Match { length, .. } => *length <= MAX_LENGTH,
            Token::Literal(_) => true,
        }));
        let packed = Lz77Codec.compress(&input).unwrap();
        assert_eq!(Lz77Codec.decompress(&packed).unwrap(), input);
    }

    #[test]
    fn test_distance_beyond_window_is_not_matched() {
        // Two copies of a 10-unit marker, 1030 units apart, separated by
        // text that never repeats a 3-unit sequence.
        let marker = "QWERTYUIOP";
        let filler: String = (0..1020u32)
            .map(|i| char::from_u32(0x4e00 + i).unwrap())
            .collect();
        let input = format!("{}{}{}", marker, filler, marker);
        let data = units(&input);
        assert_eq!(data.len(), 1040);

        let tokens = compress(&data);
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
        assert_eq!(decompress(&tokens).unwrap(), data);
    }

    #[test]
    fn test_distance_capped_at_one_byte() {
        // 300 units apart: inside the 1024 window but beyond a one-byte distance.
        let filler: String = (0..290u32)
            .map(|i| char::from_u32(0x4e00 + i).unwrap())
            .collect();
        let data = units(&format!("0123456789{}0123456789", filler));
        let tokens = compress(&data);
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
    }

    #[test]
    fn test_wide_units_exceed_capacity() {
        let input: String = (0..300u32).filter_map(|i| char::from_u32(i + 1)).collect();
        assert!(matches!(
            Lz77Codec.compress(&input),
            Err(Error::CapacityExceeded { what: "character unit", .. })
        ));
    }

    #[test]
    fn test_write_guards_match_fields() {
        let tokens = [Token::Match {
            distance: 300,
            length: 4,
        }];
        assert!(matches!(
            write_tokens(&tokens),
            Err(Error::CapacityExceeded { what: "match distance", .. })
        ));
    }

    #[test]
    fn test_nul_literal() {
        let input = "\0a\0\0\0\0";
        let packed = Lz77Codec.compress(input).unwrap();
        assert_eq!(&packed[..2], &[0, 0]);
        assert_eq!(Lz77Codec.decompress(&packed).unwrap(), input);
    }

    #[test]
    fn test_corrupt_streams() {
        // Truncated literal, truncated match, unknown flag, distance beyond output.
        for data in [&[0u8][..], &[0, b'a', 1, 1], &[7, 1], &[0, b'a', 1, 2, 3]] {
            assert!(matches!(
                Lz77Codec.decompress(data),
                Err(Error::CorruptData(_))
            ));
        }
    }
}
