//! Cache-line geometry and bit addressing.
//!
//! The filter's bit array is a sequence of cache lines. Every line holds
//! [`WORDS_PER_LINE`] atomic 64-bit words, so one line is exactly
//! [`CACHE_LINE_BYTES`] bytes and [`BITS_PER_LINE`] bits:
//!
//! ```text
//! line 0                                   line 1
//! ┌──────┬──────┬─────┬──────┐             ┌──────┬─────
//! │ w0   │ w1   │ ... │ w7   │             │ w0   │ ...
//! │0..63 │64..127     │448..511            │512..575
//! └──────┴──────┴─────┴──────┘             └──────┴─────
//! ```
//!
//! A bit position is never split across a line boundary: word index and bit
//! offset are always derived from the same position.

#![allow(clippy::cast_possible_truncation)]

/// Bytes per cache line.
pub const CACHE_LINE_BYTES: usize = 64;

/// Bits per machine word.
pub const WORD_BITS: usize = u64::BITS as usize;

/// Machine words per cache line.
pub const WORDS_PER_LINE: usize = CACHE_LINE_BYTES / std::mem::size_of::<u64>();

/// Bits per cache line.
pub const BITS_PER_LINE: usize = WORDS_PER_LINE * WORD_BITS;

/// Location of a single bit inside the cache-line array.
///
/// # Examples
///
/// ```
/// use linebloom::core::cacheline::BitAddress;
///
/// let addr = BitAddress::from_position(1_000);
/// assert_eq!(addr.line, 1);       // 1000 / 512
/// assert_eq!(addr.word, 7);       // (1000 % 512) / 64
/// assert_eq!(addr.bit, 40);       // 1000 % 64
/// assert_eq!(addr.mask(), 1u64 << 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitAddress {
    /// Cache line index.
    pub line: usize,
    /// Word index within the line, in `[0, WORDS_PER_LINE)`.
    pub word: usize,
    /// Bit offset within the word, in `[0, 64)`.
    pub bit: u32,
}

impl BitAddress {
    /// Decompose a global bit position.
    #[inline]
    #[must_use]
    pub const fn from_position(position: u64) -> Self {
        let line = (position / BITS_PER_LINE as u64) as usize;
        let in_line = (position % BITS_PER_LINE as u64) as usize;
        Self {
            line,
            word: in_line / WORD_BITS,
            bit: (in_line % WORD_BITS) as u32,
        }
    }

    /// Flat word index across the whole array.
    #[inline]
    #[must_use]
    pub const fn word_index(&self) -> usize {
        self.line * WORDS_PER_LINE + self.word
    }

    /// Single-bit mask selecting this bit within its word.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> u64 {
        1u64 << self.bit
    }
}

/// Number of cache lines needed to hold `bits` bits.
///
/// Returns `None` when the line count does not fit in `usize`.
#[must_use]
pub fn lines_for_bits(bits: u64) -> Option<usize> {
    let lines = bits.checked_add(BITS_PER_LINE as u64 - 1)? / BITS_PER_LINE as u64;
    usize::try_from(lines).ok()
}
