use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

pub const AMINO_SYMBOLS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
pub const AMINO_ANY: u8 = b'X';

const INVALID: u8 = u8::MAX;

/// 有限字母表 + 一个通配符（any）。
/// 符号编码为 [0, len)，通配符编码为 len。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alphabet {
    symbols: Vec<u8>,
    any: u8,
    lookup: Vec<u8>,
}

impl PartialEq for Alphabet {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols && self.any == other.any
    }
}

impl Eq for Alphabet {}

impl Alphabet {
    pub fn new(symbols: &[u8], any: u8) -> Result<Self> {
        if symbols.is_empty() {
            bail!("alphabet has no symbols");
        }
        if symbols.len() >= INVALID as usize {
            bail!("alphabet has too many symbols ({})", symbols.len());
        }
        let mut lookup = vec![INVALID; 256];
        let mut upper = Vec::with_capacity(symbols.len());
        for (i, &s) in symbols.iter().enumerate() {
            if !s.is_ascii_graphic() {
                bail!("alphabet symbol {:#04x} is not printable ASCII", s);
            }
            let u = s.to_ascii_uppercase();
            if lookup[u as usize] != INVALID {
                bail!("alphabet symbol '{}' is repeated", u as char);
            }
            lookup[u as usize] = i as u8;
            lookup[u.to_ascii_lowercase() as usize] = i as u8;
            upper.push(u);
        }
        let any = any.to_ascii_uppercase();
        if !any.is_ascii_graphic() {
            bail!("any symbol {:#04x} is not printable ASCII", any);
        }
        if lookup[any as usize] != INVALID {
            bail!("any symbol '{}' is also a regular symbol", any as char);
        }
        let any_code = upper.len() as u8;
        lookup[any as usize] = any_code;
        lookup[any.to_ascii_lowercase() as usize] = any_code;
        Ok(Self { symbols: upper, any, lookup })
    }

    /// 20 种标准氨基酸，通配符 X
    pub fn amino() -> Self {
        Self::from_trusted(AMINO_SYMBOLS, AMINO_ANY)
    }

    /// 核苷酸 ACGT，通配符 N
    pub fn nucleotide() -> Self {
        Self::from_trusted(super::dna::NUCLEOTIDES, super::dna::ANY_BASE)
    }

    fn from_trusted(symbols: &[u8], any: u8) -> Self {
        let mut lookup = vec![INVALID; 256];
        for (i, &s) in symbols.iter().enumerate() {
            lookup[s as usize] = i as u8;
            lookup[s.to_ascii_lowercase() as usize] = i as u8;
        }
        lookup[any as usize] = symbols.len() as u8;
        lookup[any.to_ascii_lowercase() as usize] = symbols.len() as u8;
        Self { symbols: symbols.to_vec(), any, lookup }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn any_symbol(&self) -> u8 {
        self.any
    }

    /// 通配符的编码
    #[inline]
    pub fn any_code(&self) -> u8 {
        self.symbols.len() as u8
    }

    #[inline]
    pub fn encode(&self, symbol: u8) -> Option<u8> {
        match self.lookup[symbol as usize] {
            INVALID => None,
            c => Some(c),
        }
    }

    #[inline]
    pub fn decode(&self, code: u8) -> u8 {
        self.symbols.get(code as usize).copied().unwrap_or(self.any)
    }
}

/// 半开区间 [start, end)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "interval start {} > end {}", start, end);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// 不可变序列。切片共享底层存储，O(1)。
#[derive(Clone, Debug)]
pub struct Sequence {
    symbols: Arc<[u8]>,
    codes: Arc<[u8]>,
    start: usize,
    end: usize,
}

impl Sequence {
    /// 按字母表编码；遇到字母表之外的符号报错
    pub fn new(alphabet: &Alphabet, text: &[u8]) -> Result<Self> {
        let mut symbols = Vec::with_capacity(text.len());
        let mut codes = Vec::with_capacity(text.len());
        for (i, &b) in text.iter().enumerate() {
            let code = alphabet.encode(b).ok_or_else(|| {
                anyhow!("symbol '{}' at position {} is not in the alphabet", b as char, i)
            })?;
            symbols.push(b.to_ascii_uppercase());
            codes.push(code);
        }
        let end = symbols.len();
        Ok(Self { symbols: symbols.into(), codes: codes.into(), start: 0, end })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols[self.start..self.end]
    }

    pub fn codes(&self) -> &[u8] {
        &self.codes[self.start..self.end]
    }

    /// 按区间切片，区间相对于本序列
    pub fn slice(&self, iv: Interval) -> Sequence {
        assert!(iv.end <= self.len(), "slice {} out of bounds for length {}", iv, self.len());
        Sequence {
            symbols: Arc::clone(&self.symbols),
            codes: Arc::clone(&self.codes),
            start: self.start + iv.start,
            end: self.start + iv.end,
        }
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.symbols() == other.symbols()
    }
}

impl Eq for Sequence {}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.symbols()))
    }
}
