//  BITS.rs
//    by Lut99
//
//  Created:
//    14 Mar 2025, 10:02:44
//  Last edited:
//    02 Apr 2025, 16:21:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements fixed-capacity bit collections: a [`BitVec`] over a finalized
//!   fluent universe, and a square [`BitMatrix`] for precedence constraints.
//!
//!   Both types are sized exactly once, at construction. Nothing in the crate
//!   resizes them afterwards; the universe they index into is frozen before
//!   any encoding happens, so an out-of-range index is always a bug in the
//!   caller, not a recoverable condition.
//

use std::fmt::{Debug, Formatter, Result as FResult};


/***** CONSTANTS *****/
/// The number of bits per backing word.
const WORD_BITS: usize = u64::BITS as usize;





/***** LIBRARY *****/
/// A fixed-length vector of bits backed by `u64` words.
///
/// Used for encoding preconditions, effects and states over the relevant-fluent universe. The
/// length is fixed at construction; all binary operations require both operands to share it.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct BitVec {
    /// The backing words. Bits beyond `len` are always zero.
    words: Vec<u64>,
    /// The number of addressable bits.
    len:   usize,
}

// Constructors
impl BitVec {
    /// Creates a new BitVec with all bits unset.
    ///
    /// # Arguments
    /// - `len`: The number of bits in the vector. May be zero.
    ///
    /// # Returns
    /// A new BitVec of exactly `len` bits, all zero.
    #[inline]
    pub fn new(len: usize) -> Self { Self { words: vec![0; len.div_ceil(WORD_BITS)], len } }

    /// Creates a new BitVec with the given indices set.
    ///
    /// # Arguments
    /// - `len`: The number of bits in the vector.
    /// - `indices`: The bit positions to set. Must all be `< len`.
    ///
    /// # Returns
    /// A new BitVec of exactly `len` bits with precisely `indices` set.
    ///
    /// # Panics
    /// This function panics if any index is out-of-range.
    #[inline]
    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bits: Self = Self::new(len);
        for i in indices {
            bits.set(i);
        }
        bits
    }
}

// Bit access
impl BitVec {
    /// Returns whether the given bit is set.
    ///
    /// # Arguments
    /// - `index`: The bit position to query.
    ///
    /// # Returns
    /// True if the bit is set, or false otherwise.
    ///
    /// # Panics
    /// This function panics if `index >= self.len()`.
    #[inline]
    #[track_caller]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "Bit index {index} out of range for BitVec of length {}", self.len);
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Sets the given bit.
    ///
    /// # Arguments
    /// - `index`: The bit position to set.
    ///
    /// # Panics
    /// This function panics if `index >= self.len()`.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "Bit index {index} out of range for BitVec of length {}", self.len);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Clears the given bit.
    ///
    /// # Arguments
    /// - `index`: The bit position to clear.
    ///
    /// # Panics
    /// This function panics if `index >= self.len()`.
    #[inline]
    #[track_caller]
    pub fn clear(&mut self, index: usize) {
        assert!(index < self.len, "Bit index {index} out of range for BitVec of length {}", self.len);
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// Returns the number of addressable bits (NOT the number of set bits; see
    /// [`BitVec::count_ones()`] for that).
    ///
    /// # Returns
    /// The fixed length of this vector.
    #[inline]
    pub const fn len(&self) -> usize { self.len }

    /// Checks whether no bit is set at all.
    ///
    /// # Returns
    /// True if every bit is zero, or false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool { self.words.iter().all(|w| *w == 0) }

    /// Counts the number of set bits.
    ///
    /// # Returns
    /// The number of ones in the vector.
    #[inline]
    pub fn count_ones(&self) -> usize { self.words.iter().map(|w| w.count_ones() as usize).sum() }

    /// Returns an iterator over the indices of all set bits, in increasing order.
    ///
    /// # Returns
    /// An [`Iterator`] yielding the position of every one-bit.
    #[inline]
    pub fn iter_ones(&self) -> impl '_ + Iterator<Item = usize> {
        self.words.iter().enumerate().flat_map(|(w, word)| (0..WORD_BITS).filter(move |b| (word >> b) & 1 == 1).map(move |b| w * WORD_BITS + b))
    }
}

// Set operations
impl BitVec {
    /// Sets every bit that is set in the other vector (in-place union).
    ///
    /// # Arguments
    /// - `other`: The vector to union with. Must have the same length.
    ///
    /// # Panics
    /// This function panics if the lengths differ.
    #[inline]
    #[track_caller]
    pub fn union_with(&mut self, other: &BitVec) {
        assert_eq!(self.len, other.len, "Cannot union BitVecs of lengths {} and {}", self.len, other.len);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w |= o;
        }
    }

    /// Clears every bit that is not set in the other vector (in-place intersection).
    ///
    /// # Arguments
    /// - `other`: The vector to intersect with. Must have the same length.
    ///
    /// # Panics
    /// This function panics if the lengths differ.
    #[inline]
    #[track_caller]
    pub fn intersect_with(&mut self, other: &BitVec) {
        assert_eq!(self.len, other.len, "Cannot intersect BitVecs of lengths {} and {}", self.len, other.len);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w &= o;
        }
    }

    /// Clears every bit that is set in the other vector (in-place difference).
    ///
    /// # Arguments
    /// - `other`: The vector to subtract. Must have the same length.
    ///
    /// # Panics
    /// This function panics if the lengths differ.
    #[inline]
    #[track_caller]
    pub fn difference_with(&mut self, other: &BitVec) {
        assert_eq!(self.len, other.len, "Cannot subtract BitVecs of lengths {} and {}", self.len, other.len);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w &= !o;
        }
    }

    /// Checks whether this vector shares at least one set bit with the other.
    ///
    /// # Arguments
    /// - `other`: The vector to check against. Must have the same length.
    ///
    /// # Returns
    /// True if the intersection is non-empty, or false otherwise.
    ///
    /// # Panics
    /// This function panics if the lengths differ.
    #[inline]
    #[track_caller]
    pub fn intersects(&self, other: &BitVec) -> bool {
        assert_eq!(self.len, other.len, "Cannot compare BitVecs of lengths {} and {}", self.len, other.len);
        self.words.iter().zip(other.words.iter()).any(|(w, o)| w & o != 0)
    }

    /// Checks whether every set bit of this vector is also set in the other.
    ///
    /// # Arguments
    /// - `other`: The candidate superset. Must have the same length.
    ///
    /// # Returns
    /// True if `self ⊆ other`, or false otherwise.
    ///
    /// # Panics
    /// This function panics if the lengths differ.
    #[inline]
    #[track_caller]
    pub fn is_subset_of(&self, other: &BitVec) -> bool {
        assert_eq!(self.len, other.len, "Cannot compare BitVecs of lengths {} and {}", self.len, other.len);
        self.words.iter().zip(other.words.iter()).all(|(w, o)| w & !o == 0)
    }
}

// Formatting
impl Debug for BitVec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "BitVec[")?;
        for i in 0..self.len {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        write!(f, "]")
    }
}



/// A square, fixed-dimension bit matrix.
///
/// Used as the precedence relation of a task network: bit `(i, j)` set means the task at position
/// `i` must precede the task at position `j`. Like [`BitVec`], the dimension is fixed at
/// construction.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BitMatrix {
    /// The rows of the matrix, each `size` bits wide.
    rows: Vec<BitVec>,
    /// The dimension of the (square) matrix.
    size: usize,
}

// Constructors
impl BitMatrix {
    /// Creates a new BitMatrix with all bits unset.
    ///
    /// # Arguments
    /// - `size`: The dimension of the matrix. May be zero.
    ///
    /// # Returns
    /// A new `size`x`size` BitMatrix, all zero.
    #[inline]
    pub fn new(size: usize) -> Self { Self { rows: (0..size).map(|_| BitVec::new(size)).collect(), size } }
}

// Bit access
impl BitMatrix {
    /// Returns whether the given bit is set.
    ///
    /// # Arguments
    /// - `row`: The row of the bit to query.
    /// - `col`: The column of the bit to query.
    ///
    /// # Returns
    /// True if the bit is set, or false otherwise.
    ///
    /// # Panics
    /// This function panics if either coordinate is out-of-range.
    #[inline]
    #[track_caller]
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(row < self.size, "Row index {row} out of range for BitMatrix of size {}", self.size);
        self.rows[row].get(col)
    }

    /// Sets the given bit.
    ///
    /// # Arguments
    /// - `row`: The row of the bit to set.
    /// - `col`: The column of the bit to set.
    ///
    /// # Panics
    /// This function panics if either coordinate is out-of-range.
    #[inline]
    #[track_caller]
    pub fn set(&mut self, row: usize, col: usize) {
        assert!(row < self.size, "Row index {row} out of range for BitMatrix of size {}", self.size);
        self.rows[row].set(col);
    }

    /// Clears the given bit.
    ///
    /// # Arguments
    /// - `row`: The row of the bit to clear.
    /// - `col`: The column of the bit to clear.
    ///
    /// # Panics
    /// This function panics if either coordinate is out-of-range.
    #[inline]
    #[track_caller]
    pub fn clear(&mut self, row: usize, col: usize) {
        assert!(row < self.size, "Row index {row} out of range for BitMatrix of size {}", self.size);
        self.rows[row].clear(col);
    }

    /// Returns a whole row of the matrix.
    ///
    /// # Arguments
    /// - `row`: The row to return.
    ///
    /// # Returns
    /// A reference to the [`BitVec`] making up that row.
    ///
    /// # Panics
    /// This function panics if `row >= self.size()`.
    #[inline]
    #[track_caller]
    pub fn row(&self, row: usize) -> &BitVec {
        assert!(row < self.size, "Row index {row} out of range for BitMatrix of size {}", self.size);
        &self.rows[row]
    }

    /// Returns the dimension of the matrix.
    ///
    /// # Returns
    /// The number of rows (equivalently, columns).
    #[inline]
    pub const fn size(&self) -> usize { self.size }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_bitvec_set_get_clear() {
        let mut bits = BitVec::new(130);
        assert_eq!(bits.len(), 130);
        assert!(bits.is_empty());

        bits.set(0);
        bits.set(64);
        bits.set(129);
        assert!(bits.get(0));
        assert!(bits.get(64));
        assert!(bits.get(129));
        assert!(!bits.get(1));
        assert_eq!(bits.count_ones(), 3);

        bits.clear(64);
        assert!(!bits.get(64));
        assert_eq!(bits.count_ones(), 2);
    }

    #[test]
    fn test_bitvec_iter_ones() {
        let bits = BitVec::from_indices(200, [3, 70, 199]);
        assert_eq!(bits.iter_ones().collect::<Vec<usize>>(), vec![3, 70, 199]);
    }

    #[test]
    fn test_bitvec_set_ops() {
        let a = BitVec::from_indices(10, [1, 3, 5]);
        let b = BitVec::from_indices(10, [3, 5, 7]);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u, BitVec::from_indices(10, [1, 3, 5, 7]));

        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i, BitVec::from_indices(10, [3, 5]));

        let mut d = a.clone();
        d.difference_with(&b);
        assert_eq!(d, BitVec::from_indices(10, [1]));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&BitVec::from_indices(10, [0, 2])));
        assert!(BitVec::from_indices(10, [3]).is_subset_of(&a));
        assert!(!b.is_subset_of(&a));
    }

    #[test]
    #[should_panic]
    fn test_bitvec_out_of_range() {
        let bits = BitVec::new(8);
        bits.get(8);
    }

    #[test]
    fn test_bitmatrix() {
        let mut mat = BitMatrix::new(4);
        assert_eq!(mat.size(), 4);
        mat.set(0, 3);
        mat.set(2, 1);
        assert!(mat.get(0, 3));
        assert!(mat.get(2, 1));
        assert!(!mat.get(3, 0));
        assert_eq!(mat.row(2), &BitVec::from_indices(4, [1]));

        mat.clear(0, 3);
        assert!(!mat.get(0, 3));
    }
}
