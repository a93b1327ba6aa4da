//! Bit-granular offset tracking for buffer-backed cursors

/// Wrapper around [`usize`] that represents an index, in bits, into a byte
/// buffer.
///
/// Unlike a byte index this value may point into the middle of a byte; the
/// byte it falls in is `ix / 8` and the bit within that byte, counting from
/// the most significant, is `ix % 8`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub(crate) struct BitIndex(usize);

impl BitIndex {
    /// Constructs a new `BitIndex` initialized to `0`
    #[inline(always)]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(0usize)
    }

    /// Advances the held value by `n` unless this would cause it to exceed
    /// `lim`.
    ///
    /// Returns the original value (before incrementation), along with a boolean
    /// value that is equal to `true` if and only if the increment occurred.
    #[inline]
    pub(crate) fn increment_checked(&mut self, n: usize, lim: usize) -> (usize, bool) {
        let ret = self.0;
        let is_valid = self.0 + n <= lim;
        if is_valid {
            self.0 += n;
        }
        (ret, is_valid)
    }

    /// Moves the index to an absolute position, provided it does not exceed `lim`.
    #[inline]
    pub(crate) fn set_checked(&mut self, pos: usize, lim: usize) -> bool {
        if pos <= lim {
            self.0 = pos;
            true
        } else {
            false
        }
    }

    #[must_use]
    #[inline(always)]
    pub(crate) const fn to_usize(self) -> usize {
        self.0
    }

    /// Number of bits between this index and the next byte boundary
    #[must_use]
    #[inline]
    pub(crate) const fn bits_to_boundary(self) -> usize {
        (8 - self.0 % 8) % 8
    }

    #[must_use]
    #[inline]
    pub(crate) const fn is_aligned(self) -> bool {
        self.0 % 8 == 0
    }
}

impl From<BitIndex> for usize {
    #[inline]
    fn from(ix: BitIndex) -> Self {
        ix.0
    }
}
