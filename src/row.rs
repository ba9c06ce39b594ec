use std::fmt::Debug;

/// A native unsigned word holding one bit-packed row of the grid.
///
/// Bit `x` of the word encodes the cell in column `x`, so a grid built on a
/// word type is exactly `BITS` cells wide (and, being square, `BITS` tall).
pub trait Row: Copy + Default + Eq + Debug + Send + Sync + 'static {
    /// Number of cells in one row.
    const BITS: u32;

    /// Returns `true` if bit `x` is set. `x` must be below `BITS`.
    fn bit(self, x: u32) -> bool;

    /// Returns the word with bit `x` set. `x` must be below `BITS`.
    fn with_bit(self, x: u32) -> Self;

    /// Returns the word with bit `x` cleared. `x` must be below `BITS`.
    fn without_bit(self, x: u32) -> Self;

    fn count_ones(self) -> u32;
}

macro_rules! impl_row {
    ($($t:ty),*) => {
        $(
            impl Row for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn bit(self, x: u32) -> bool {
                    self & (1 << x) != 0
                }

                #[inline]
                fn with_bit(self, x: u32) -> Self {
                    self | (1 << x)
                }

                #[inline]
                fn without_bit(self, x: u32) -> Self {
                    self & !(1 << x)
                }

                #[inline]
                fn count_ones(self) -> u32 {
                    <$t>::count_ones(self)
                }
            }
        )*
    };
}

impl_row!(u8, u16, u32, u64);
