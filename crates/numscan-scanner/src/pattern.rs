//! Phone-number pattern expansion.
//!
//! A pattern is a run of literal digits interspersed with wildcard tokens:
//!
//! - `x` matches any of the ten digits, `0` through `9`.
//! - `[...]` matches any digit listed between the brackets, in the order
//!   written. Repeats are kept. A range such as `5-9` contributes every digit
//!   between its ends, inclusive, in the direction written.
//!
//! Candidates are enumerated as an odometer over the tokens: the last token
//! varies fastest and the first token slowest. `555[12]x` therefore yields
//! `55510`, `55511`, ... `55519`, `55520`, ... `55529`.

use numscan_core::PhoneNumber;
use std::fmt;
use std::iter::FusedIterator;
use thiserror::Error;

/// Character standing for any single digit.
pub const WILDCARD: char = 'x';

const ALL_DIGITS: &[u8; 10] = b"0123456789";

/// Malformed pattern. Raised before any candidate is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Nothing left to expand after normalization
    #[error("pattern is empty")]
    Empty,

    /// `[` with no matching `]`
    #[error("unbalanced brackets: '[' at position {position} is never closed")]
    UnclosedBracket {
        /// Byte offset of the opening bracket
        position: usize,
    },

    /// `]` with no preceding `[`
    #[error("unbalanced brackets: unexpected ']' at position {position}")]
    UnexpectedClosingBracket {
        /// Byte offset of the closing bracket
        position: usize,
    },

    /// `[]`
    #[error("empty digit set at position {position}")]
    EmptySet {
        /// Byte offset of the opening bracket
        position: usize,
    },

    /// `-` inside a set without a digit on both sides
    #[error("malformed digit range at position {position}")]
    MalformedRange {
        /// Byte offset of the dash
        position: usize,
    },

    /// Anything other than digits, `x` and brackets
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter {
        /// The offending character
        ch: char,
        /// Byte offset of the character
        position: usize,
    },

    /// The number of candidates does not fit in 64 bits
    #[error("pattern expands to more than {} candidates", u64::MAX)]
    TooManyCandidates,
}

/// Digits one wildcard token may take, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChoiceSet(Vec<u8>);

impl ChoiceSet {
    fn any_digit() -> Self {
        Self(ALL_DIGITS.to_vec())
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// A parsed pattern.
///
/// Holds `choices.len() + 1` literal parts; candidate `i` is
/// `parts[0] c0 parts[1] c1 ... parts[n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    parts: Vec<String>,
    choices: Vec<ChoiceSet>,
    cardinality: u64,
}

impl Pattern {
    /// Parse a normalized pattern (digits, `x` and bracket sets only).
    ///
    /// See [`normalize`] for turning user input into this form.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut parts = Vec::new();
        let mut choices = Vec::new();
        let mut current = String::new();
        let mut chars = source.char_indices();

        while let Some((position, ch)) = chars.next() {
            match ch {
                '0'..='9' => current.push(ch),
                WILDCARD => {
                    parts.push(std::mem::take(&mut current));
                    choices.push(ChoiceSet::any_digit());
                }
                '[' => {
                    let set = parse_set(&mut chars, position)?;
                    parts.push(std::mem::take(&mut current));
                    choices.push(set);
                }
                ']' => return Err(PatternError::UnexpectedClosingBracket { position }),
                ch => return Err(PatternError::InvalidCharacter { ch, position }),
            }
        }
        parts.push(current);

        let cardinality = choices
            .iter()
            .try_fold(1u64, |acc, set| acc.checked_mul(set.len() as u64))
            .ok_or(PatternError::TooManyCandidates)?;

        Ok(Self {
            source: source.to_string(),
            parts,
            choices,
            cardinality,
        })
    }

    /// The text this pattern was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern contains any wildcard token.
    #[must_use]
    pub fn has_wildcards(&self) -> bool {
        !self.choices.is_empty()
    }

    /// Exact number of candidates: the product of every choice-set size.
    #[must_use]
    pub fn cardinality(&self) -> u64 {
        self.cardinality
    }

    /// Lazily enumerate every candidate in deterministic order.
    #[must_use]
    pub fn candidates(&self) -> Expansion {
        self.clone().into_iter()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl IntoIterator for Pattern {
    type Item = PhoneNumber;
    type IntoIter = Expansion;

    fn into_iter(self) -> Expansion {
        let width = self.parts.iter().map(String::len).sum::<usize>() + self.choices.len();
        Expansion {
            odometer: vec![0; self.choices.len()],
            remaining: self.cardinality,
            width,
            parts: self.parts,
            choices: self.choices,
        }
    }
}

/// Consume the body of a `[...]` token. `chars` is positioned just past `[`.
fn parse_set(
    chars: &mut std::str::CharIndices<'_>,
    open: usize,
) -> Result<ChoiceSet, PatternError> {
    let mut body = Vec::new();
    loop {
        match chars.next() {
            Some((_, ']')) => break,
            Some((_, '[')) | None => return Err(PatternError::UnclosedBracket { position: open }),
            Some(item) => body.push(item),
        }
    }
    if body.is_empty() {
        return Err(PatternError::EmptySet { position: open });
    }

    let mut digits = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let (position, ch) = body[i];
        if ch == '-' {
            return Err(PatternError::MalformedRange { position });
        }
        let start = digit_value(ch, position)?;

        if let Some(&(dash, '-')) = body.get(i + 1) {
            let end = match body.get(i + 2) {
                Some(&(end_pos, end_ch)) if end_ch.is_ascii_digit() => digit_value(end_ch, end_pos)?,
                _ => return Err(PatternError::MalformedRange { position: dash }),
            };
            if start <= end {
                digits.extend(start..=end);
            } else {
                digits.extend((end..=start).rev());
            }
            i += 3;
        } else {
            digits.push(start);
            i += 1;
        }
    }

    Ok(ChoiceSet(digits))
}

fn digit_value(ch: char, position: usize) -> Result<u8, PatternError> {
    if ch.is_ascii_digit() {
        Ok(ch as u8)
    } else {
        Err(PatternError::InvalidCharacter { ch, position })
    }
}

/// Lazy candidate sequence for a [`Pattern`].
///
/// A mixed-radix counter over the choice-set sizes; nothing is materialized
/// beyond the candidate being returned.
#[derive(Debug, Clone)]
pub struct Expansion {
    parts: Vec<String>,
    choices: Vec<ChoiceSet>,
    odometer: Vec<usize>,
    remaining: u64,
    width: usize,
}

impl Expansion {
    /// Candidates not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn advance(&mut self) {
        for (slot, set) in self.odometer.iter_mut().zip(&self.choices).rev() {
            *slot += 1;
            if *slot < set.len() {
                return;
            }
            *slot = 0;
        }
    }
}

impl Iterator for Expansion {
    type Item = PhoneNumber;

    fn next(&mut self) -> Option<PhoneNumber> {
        if self.remaining == 0 {
            return None;
        }

        let mut digits = String::with_capacity(self.width);
        for (i, part) in self.parts.iter().enumerate() {
            digits.push_str(part);
            if let Some(set) = self.choices.get(i) {
                digits.push(char::from(set.0[self.odometer[i]]));
            }
        }

        self.remaining -= 1;
        self.advance();
        Some(PhoneNumber::from_digits_unchecked(digits))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Expansion {}

/// Strip whitespace and `+` from user input.
///
/// Multiple command-line arguments are joined before normalization, so
/// `+1 555 12x` becomes `155512x`.
#[must_use]
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '+')
        .collect()
}

/// Parse and fully materialize a pattern.
///
/// Prefer [`Pattern::candidates`] for large patterns.
pub fn expand(pattern: &str) -> Result<Vec<PhoneNumber>, PatternError> {
    Ok(Pattern::parse(pattern)?.into_iter().collect())
}
