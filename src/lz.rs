//! LZ-based string compression over a 64-symbol URI-safe alphabet.
//!
//! Bit-compatible with the `compressToEncodedURIComponent` format used by
//! legacy `#s=` share fragments. Strings are handled as UTF-16 code units,
//! which is what the format's dictionary is defined over.

use std::collections::{HashMap, HashSet};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+-";
const BITS_PER_CHAR: u32 = 6;

fn symbol_value(c: u16) -> Option<u32> {
    ALPHABET
        .iter()
        .position(|&a| u16::from(a) == c)
        .map(|p| p as u32)
}

struct BitWriter {
    out: String,
    val: u32,
    position: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            val: 0,
            position: 0,
        }
    }

    fn push_bit(&mut self, bit: u32) {
        self.val = (self.val << 1) | bit;
        if self.position == BITS_PER_CHAR - 1 {
            self.position = 0;
            self.out.push(ALPHABET[self.val as usize] as char);
            self.val = 0;
        } else {
            self.position += 1;
        }
    }

    /// Least significant bit first.
    fn push_value(&mut self, mut value: u32, bits: u32) {
        for _ in 0..bits {
            self.push_bit(value & 1);
            value >>= 1;
        }
    }

    fn finish(mut self) -> String {
        loop {
            self.val <<= 1;
            if self.position == BITS_PER_CHAR - 1 {
                self.out.push(ALPHABET[self.val as usize] as char);
                break;
            }
            self.position += 1;
        }
        self.out
    }
}

struct Compressor {
    dictionary: HashMap<Vec<u16>, u32>,
    pending: HashSet<Vec<u16>>,
    enlarge_in: u32,
    dict_size: u32,
    num_bits: u32,
    writer: BitWriter,
}

impl Compressor {
    fn tick(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }

    fn emit(&mut self, w: &[u16]) {
        if self.pending.remove(w) {
            let unit = u32::from(w[0]);
            if unit < 256 {
                self.writer.push_value(0, self.num_bits);
                self.writer.push_value(unit, 8);
            } else {
                self.writer.push_value(1, self.num_bits);
                self.writer.push_value(unit, 16);
            }
            self.tick();
        } else {
            let code = self.dictionary.get(w).copied().unwrap_or(0);
            self.writer.push_value(code, self.num_bits);
        }
        self.tick();
    }
}

/// Compress `input` to a URI-component-safe string.
pub fn compress_to_encoded_uri_component(input: &str) -> String {
    let mut c = Compressor {
        dictionary: HashMap::new(),
        pending: HashSet::new(),
        enlarge_in: 2,
        dict_size: 3,
        num_bits: 2,
        writer: BitWriter::new(),
    };

    let mut w: Vec<u16> = Vec::new();
    for unit in input.encode_utf16() {
        let single = vec![unit];
        if !c.dictionary.contains_key(&single) {
            c.dictionary.insert(single.clone(), c.dict_size);
            c.dict_size += 1;
            c.pending.insert(single.clone());
        }

        let mut wc = w.clone();
        wc.push(unit);
        if c.dictionary.contains_key(&wc) {
            w = wc;
        } else {
            c.emit(&w);
            c.dictionary.insert(wc, c.dict_size);
            c.dict_size += 1;
            w = single;
        }
    }

    if !w.is_empty() {
        c.emit(&w);
    }

    // End of stream.
    c.writer.push_value(2, c.num_bits);
    c.writer.finish()
}

struct BitReader<'a> {
    input: &'a [u16],
    val: u32,
    position: u32,
    index: usize,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u16]) -> Option<Self> {
        let val = symbol_value(*input.first()?)?;
        Some(Self {
            input,
            val,
            position: 1 << (BITS_PER_CHAR - 1),
            index: 1,
        })
    }

    /// Least significant bit first. `None` on a symbol outside the alphabet.
    fn read(&mut self, bits: u32) -> Option<u32> {
        let mut result = 0;
        for shift in 0..bits {
            let bit = u32::from(self.val & self.position != 0);
            self.position >>= 1;
            if self.position == 0 {
                self.position = 1 << (BITS_PER_CHAR - 1);
                self.val = match self.input.get(self.index) {
                    Some(&c) => symbol_value(c)?,
                    None => 0,
                };
                self.index += 1;
            }
            result |= bit << shift;
        }
        Some(result)
    }

    fn exhausted(&self) -> bool {
        self.index > self.input.len()
    }
}

/// Decompress a string produced by [`compress_to_encoded_uri_component`].
///
/// Returns `None` for empty, truncated or corrupted input.
pub fn decompress_from_encoded_uri_component(input: &str) -> Option<String> {
    // Form decoding may have turned `+` into a space.
    let units: Vec<u16> = input.replace(' ', "+").encode_utf16().collect();
    let mut reader = BitReader::new(&units)?;

    let mut dictionary: Vec<Vec<u16>> = (0..3u16).map(|i| vec![i]).collect();
    let mut enlarge_in: u32 = 4;
    let mut num_bits: u32 = 3;

    let first = match reader.read(2)? {
        0 => reader.read(8)?,
        1 => reader.read(16)?,
        2 => return Some(String::new()),
        _ => return None,
    };
    let mut w = vec![first as u16];
    dictionary.push(w.clone());
    let mut result = w.clone();

    loop {
        if reader.exhausted() {
            return None;
        }

        let mut code = reader.read(num_bits)? as usize;
        match code {
            0 | 1 => {
                let unit = reader.read(if code == 0 { 8 } else { 16 })?;
                dictionary.push(vec![unit as u16]);
                code = dictionary.len() - 1;
                enlarge_in -= 1;
            }
            2 => return String::from_utf16(&result).ok(),
            _ => {}
        }

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }

        let entry = if let Some(entry) = dictionary.get(code) {
            entry.clone()
        } else if code == dictionary.len() {
            let mut entry = w.clone();
            entry.push(w[0]);
            entry
        } else {
            return None;
        };
        result.extend_from_slice(&entry);

        let mut next = w;
        next.push(entry[0]);
        dictionary.push(next);
        enlarge_in -= 1;
        w = entry;

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }
    }
}
