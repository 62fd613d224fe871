use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 32-bit instruction word. Renders as 32 `0`/`1` characters, bit 31 first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedWord(u32);

impl EncodedWord {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl From<u32> for EncodedWord {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EncodedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032b}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWordError {
    #[error("expected 32 binary digits, found {0} characters")]
    Length(usize),
    #[error("invalid binary digit {0:?}")]
    Digit(char),
}

impl FromStr for EncodedWord {
    type Err = ParseWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(c) = s.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(ParseWordError::Digit(c));
        }
        if s.len() != 32 {
            return Err(ParseWordError::Length(s.len()));
        }
        u32::from_str_radix(s, 2)
            .map(Self)
            .map_err(|_| ParseWordError::Length(s.len()))
    }
}
