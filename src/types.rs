//! Core types: Symbol

use std::fmt;

/// Maximum ticker length in bytes.
pub const SYMBOL_LEN: usize = 8;

/// Ticker symbol stored inline (no heap allocation).
///
/// Holds up to 8 ASCII bytes, zero-padded. Being `Copy`, it can key maps and
/// live in `'static` tables.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    bytes: [u8; SYMBOL_LEN],
    len: u8,
}

impl Symbol {
    /// Create a symbol from a literal.
    ///
    /// # Panics
    ///
    /// Panics if `s` is longer than 8 bytes. Use [`Symbol::try_new`] for
    /// untrusted input.
    pub const fn new(s: &str) -> Self {
        match Self::try_new(s) {
            Some(sym) => sym,
            None => panic!("symbol exceeds 8 bytes"),
        }
    }

    /// Create a symbol, returning `None` if `s` is empty or longer than 8 bytes.
    pub const fn try_new(s: &str) -> Option<Self> {
        let src = s.as_bytes();
        if src.is_empty() || src.len() > SYMBOL_LEN {
            return None;
        }
        let mut bytes = [0u8; SYMBOL_LEN];
        let mut i = 0;
        while i < src.len() {
            bytes[i] = src[i];
            i += 1;
        }
        Some(Symbol {
            bytes,
            len: src.len() as u8,
        })
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever built from a &str prefix, so the bytes are valid UTF-8.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Symbol::try_new(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("symbol '{s}' must be 1-8 bytes"))
        })
    }
}
