//! Reversible character-shift cipher for message bodies
//!
//! This only obscures text on the wire. It offers no confidentiality.
//! Every Unicode scalar value is moved `key` positions along the scalar
//! value range (surrogates skipped, wrapping at the top), so any string
//! survives an encode/decode round trip.

/// Default shift
pub const DEFAULT_KEY: u32 = 3;

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_LEN: u32 = 0x800;
/// Number of Unicode scalar values
const SCALAR_COUNT: u32 = 0x11_0000 - SURROGATE_LEN;

/// Per-character shift cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCipher {
    key: u32,
}

impl ShiftCipher {
    pub fn new(key: u32) -> Self {
        Self {
            key: key % SCALAR_COUNT,
        }
    }

    pub fn encode(&self, text: &str) -> String {
        text.chars().map(|c| shift(c, self.key)).collect()
    }

    pub fn decode(&self, text: &str) -> String {
        text.chars()
            .map(|c| shift(c, SCALAR_COUNT - self.key))
            .collect()
    }
}

impl Default for ShiftCipher {
    fn default() -> Self {
        Self::new(DEFAULT_KEY)
    }
}

fn shift(c: char, by: u32) -> char {
    let index = to_index(c);
    let shifted = (index + by) % SCALAR_COUNT;
    from_index(shifted)
}

fn to_index(c: char) -> u32 {
    let code = c as u32;
    if code < SURROGATE_START {
        code
    } else {
        code - SURROGATE_LEN
    }
}

fn from_index(index: u32) -> char {
    let code = if index < SURROGATE_START {
        index
    } else {
        index + SURROGATE_LEN
    };
    // index < SCALAR_COUNT always lands on a scalar value
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}
