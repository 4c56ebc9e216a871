//! Cache-line aligned array of atomic words.
//!
//! `BitArray` is the storage behind every filter. Its visible region always
//! starts on a 64-byte boundary and spans a whole number of cache lines, so a
//! key's probes never touch a line that straddles two hardware lines.
//!
//! # Alignment
//!
//! The words are allocated as a plain `Box<[AtomicU64]>`, which only promises
//! 8-byte alignment. After allocation the start address is checked; if it is
//! not on a line boundary the array is reallocated with `WORDS_PER_LINE - 1`
//! spare words and the first aligned word becomes the start of the visible
//! region. The chosen shift is reported by [`BitArray::alignment_offset`].
//!
//! # Thread Safety
//!
//! - `set`/`get`: lock-free through `&self`
//! - `clear`, `or_from`, `and_from`: `&mut self`, bulk byte writes through a
//!   [`SimdOps`] backend
//! - `pop_count`: `&self`, relaxed snapshot of the words
//!
//! Bulk writes view the words as raw bytes. Requiring `&mut self` for them is
//! what makes that sound: no other reference can observe the array while the
//! vector code runs.

#![allow(clippy::cast_possible_truncation)]

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::cacheline::{BitAddress, CACHE_LINE_BYTES, WORDS_PER_LINE};
use crate::error::{LineBloomError, Result};
use crate::simd::SimdOps;
use crate::util::atomic::{set_bit, RetryPolicy};

/// Words copied per snapshot chunk (4 KiB).
const SNAPSHOT_WORDS: usize = 512;

const WORD_BYTES: usize = mem::size_of::<u64>();

/// Fixed-size, cache-line aligned bit storage.
pub struct BitArray {
    storage: Box<[AtomicU64]>,
    /// First visible word inside `storage`.
    offset: usize,
    lines: usize,
}

impl BitArray {
    /// Allocate `lines` zeroed cache lines.
    ///
    /// # Errors
    ///
    /// [`LineBloomError::InvalidParameters`] if `lines` is zero, the word
    /// count overflows, or the allocator cannot provide the memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use linebloom::core::bitarray::BitArray;
    ///
    /// let bits = BitArray::new(4).unwrap();
    /// assert_eq!(bits.bit_count(), 2048);
    /// assert!(bits.is_aligned());
    /// ```
    pub fn new(lines: usize) -> Result<Self> {
        if lines == 0 {
            return Err(LineBloomError::invalid_parameters(
                "bit array needs at least one cache line",
            ));
        }
        if lines.checked_mul(CACHE_LINE_BYTES).is_none() {
            return Err(LineBloomError::invalid_parameters(format!(
                "{lines} cache lines overflow the address space"
            )));
        }
        Self::allocate(lines)
    }

    fn allocate(lines: usize) -> Result<Self> {
        let words = lines * WORDS_PER_LINE;

        let storage = zeroed_words(words)?;
        if let Some(offset) = aligned_offset(&storage, words) {
            return Ok(Self {
                storage,
                offset,
                lines,
            });
        }
        drop(storage);

        let storage = zeroed_words(words + WORDS_PER_LINE - 1)?;
        // An 8-byte aligned block always has a 64-byte boundary within its
        // first eight words.
        let offset = aligned_offset(&storage, words).unwrap_or(0);
        tracing::trace!(
            lines,
            offset_words = offset,
            "allocator returned unaligned block; using padded region"
        );
        Ok(Self {
            storage,
            offset,
            lines,
        })
    }

    /// Visible words.
    #[inline]
    #[must_use]
    pub fn words(&self) -> &[AtomicU64] {
        &self.storage[self.offset..self.offset + self.word_count()]
    }

    /// The eight words of cache line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.line_count()`.
    #[must_use]
    pub fn line(&self, index: usize) -> &[AtomicU64] {
        let start = index * WORDS_PER_LINE;
        &self.words()[start..start + WORDS_PER_LINE]
    }

    /// Number of cache lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Number of visible words.
    #[inline]
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.lines * WORDS_PER_LINE
    }

    /// Bit capacity.
    #[inline]
    #[must_use]
    pub fn bit_count(&self) -> u64 {
        self.word_count() as u64 * u64::from(u64::BITS)
    }

    /// Bytes between the allocation start and the aligned region.
    #[inline]
    #[must_use]
    pub fn alignment_offset(&self) -> usize {
        self.offset * WORD_BYTES
    }

    /// True if the visible region starts on a cache-line boundary.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        (self.words().as_ptr() as usize) % CACHE_LINE_BYTES == 0
    }

    /// Heap bytes held, including alignment padding.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.storage.len() * WORD_BYTES
    }

    /// Set the bit at `position`, returning `true` if it was previously clear.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.bit_count()`.
    #[inline]
    pub fn set(&self, position: u64, policy: &RetryPolicy) -> bool {
        let addr = BitAddress::from_position(position);
        set_bit(&self.words()[addr.word_index()], addr.mask(), policy)
    }

    /// Test the bit at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.bit_count()`.
    #[inline]
    #[must_use]
    pub fn get(&self, position: u64) -> bool {
        let addr = BitAddress::from_position(position);
        self.words()[addr.word_index()].load(Ordering::Acquire) & addr.mask() != 0
    }

    /// Zero every bit.
    pub fn clear(&mut self, ops: &dyn SimdOps) {
        ops.vector_clear(self.as_bytes_mut());
    }

    /// `self |= other`, byte-wise. Both arrays must have the same line count.
    pub fn or_from(&mut self, other: &Self, ops: &dyn SimdOps) {
        debug_assert_eq!(self.lines, other.lines);
        let dst = self.as_bytes_mut();
        other.for_each_snapshot(|start, chunk| {
            ops.vector_or(&mut dst[start..start + chunk.len()], chunk);
        });
    }

    /// `self &= other`, byte-wise. Both arrays must have the same line count.
    pub fn and_from(&mut self, other: &Self, ops: &dyn SimdOps) {
        debug_assert_eq!(self.lines, other.lines);
        let dst = self.as_bytes_mut();
        other.for_each_snapshot(|start, chunk| {
            ops.vector_and(&mut dst[start..start + chunk.len()], chunk);
        });
    }

    /// Number of set bits.
    ///
    /// Under concurrent `set` calls the result reflects some interleaving of
    /// those writes, not a single instant.
    #[must_use]
    pub fn pop_count(&self, ops: &dyn SimdOps) -> u64 {
        let mut total = 0;
        self.for_each_snapshot(|_, chunk| total += ops.popcount(chunk));
        total
    }

    /// Exclusive byte view of the visible region.
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.word_count() * WORD_BYTES;
        let start = self.offset;
        let words = &mut self.storage[start..];
        // SAFETY: `AtomicU64` has the same size and bit validity as `u64`, and
        // `&mut self` guarantees no atomic access can overlap this borrow.
        // `len` bytes starting at `words` lie within the visible region.
        unsafe { std::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), len) }
    }

    /// Feed relaxed copies of the words to `f` in chunks, with each chunk's
    /// starting byte offset.
    fn for_each_snapshot(&self, mut f: impl FnMut(usize, &[u8])) {
        let mut buf = [0u8; SNAPSHOT_WORDS * WORD_BYTES];
        for (index, words) in self.words().chunks(SNAPSHOT_WORDS).enumerate() {
            for (slot, word) in buf.chunks_exact_mut(WORD_BYTES).zip(words) {
                slot.copy_from_slice(&word.load(Ordering::Relaxed).to_ne_bytes());
            }
            let len = words.len() * WORD_BYTES;
            f(index * SNAPSHOT_WORDS * WORD_BYTES, &buf[..len]);
        }
    }
}

fn zeroed_words(count: usize) -> Result<Box<[AtomicU64]>> {
    let mut words = Vec::new();
    words.try_reserve_exact(count).map_err(|err| {
        LineBloomError::invalid_parameters(format!("cannot allocate {count} words: {err}"))
    })?;
    words.resize_with(count, || AtomicU64::new(0));
    Ok(words.into_boxed_slice())
}

/// Word offset of the first 64-byte boundary in `storage`, if `needed` words
/// fit after it.
fn aligned_offset(storage: &[AtomicU64], needed: usize) -> Option<usize> {
    let addr = storage.as_ptr() as usize;
    let misalignment = addr % CACHE_LINE_BYTES;
    let offset = if misalignment == 0 {
        0
    } else {
        (CACHE_LINE_BYTES - misalignment) / WORD_BYTES
    };
    (offset + needed <= storage.len()).then_some(offset)
}

impl Clone for BitArray {
    /// # Panics
    ///
    /// Panics if the allocator cannot provide a second array of this size.
    fn clone(&self) -> Self {
        let copy = match Self::allocate(self.lines) {
            Ok(copy) => copy,
            Err(err) => panic!("cloning bit array: {err}"),
        };
        for (dst, src) in copy.words().iter().zip(self.words()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        copy
    }
}

impl fmt::Debug for BitArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitArray")
            .field("lines", &self.lines)
            .field("bits", &self.bit_count())
            .field("alignment_offset", &self.alignment_offset())
            .finish_non_exhaustive()
    }
}
