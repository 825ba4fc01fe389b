//! Digit-level primitives.
//!
//! A "digit" is one machine word of a `Giant`'s base-2^W positional
//! representation. All multi-precision arithmetic in this crate is
//! expressed through the handful of carry/borrow/double-width helpers
//! defined here, so that the digit width is a parameterization and not
//! a semantic choice. The default digit is 32 bits wide, with products
//! accumulated in 64-bit words; feature `digit16` selects 16-bit digits
//! (useful for exercising carry boundaries more often in tests).

#[cfg(not(feature = "digit16"))]
pub type Digit = u32;

#[cfg(not(feature = "digit16"))]
pub(crate) type Wide = u64;

#[cfg(feature = "digit16")]
pub type Digit = u16;

#[cfg(feature = "digit16")]
pub(crate) type Wide = u32;

/// Number of bits in one digit.
pub const DIGIT_BITS: usize = Digit::BITS as usize;

/// Number of bytes in one digit.
pub const DIGIT_BYTES: usize = DIGIT_BITS / 8;

/// Number of digits needed to hold `n` bytes.
pub const fn digits_for_bytes(n: usize) -> usize {
    (n + DIGIT_BYTES - 1) / DIGIT_BYTES
}

/// Number of digits needed to hold `n` bits.
pub const fn digits_for_bits(n: usize) -> usize {
    (n + DIGIT_BITS - 1) / DIGIT_BITS
}

// Add with carry; carry is 0 or 1.
// (x, y, c_in) -> x + y + c_in mod 2^W, c_out
#[inline(always)]
pub(crate) const fn addcarry(x: Digit, y: Digit, c: u8) -> (Digit, u8) {
    let z = (x as Wide).wrapping_add(y as Wide).wrapping_add(c as Wide);
    (z as Digit, (z >> DIGIT_BITS) as u8)
}

// Subtract with borrow; borrow is 0 or 1.
// (x, y, c_in) -> x - y - c_in mod 2^W, c_out
#[inline(always)]
pub(crate) const fn subborrow(x: Digit, y: Digit, c: u8) -> (Digit, u8) {
    let z = (x as Wide).wrapping_sub(y as Wide).wrapping_sub(c as Wide);
    (z as Digit, ((z >> DIGIT_BITS) as u8) & 1)
}

// Compute x*y over 2W bits, returned as two digits (lo, hi).
#[inline(always)]
pub(crate) const fn umull(x: Digit, y: Digit) -> (Digit, Digit) {
    let z = (x as Wide) * (y as Wide);
    (z as Digit, (z >> DIGIT_BITS) as Digit)
}

// Compute x*y+z1+z2 over 2W bits, returned as two digits (lo, hi).
// Cannot overflow: (2^W-1)^2 + 2*(2^W-1) = 2^(2W) - 1.
#[inline(always)]
pub(crate) const fn umull_add2(x: Digit, y: Digit, z1: Digit, z2: Digit) -> (Digit, Digit) {
    let t = ((x as Wide) * (y as Wide))
        .wrapping_add(z1 as Wide).wrapping_add(z2 as Wide);
    (t as Digit, (t >> DIGIT_BITS) as Digit)
}

// Multiply the digit vector `src` by the single digit `m`, accumulating
// into `dst` (which may already hold partial sums); the final carry digit
// is returned. `dst` must be at least as long as `src`. This is the
// innermost loop of schoolbook multiplication and squaring.
pub(crate) fn vecmul_add(m: Digit, src: &[Digit], dst: &mut [Digit]) -> Digit {
    let mut carry: Digit = 0;
    for i in 0..src.len() {
        let (lo, hi) = umull_add2(m, src[i], dst[i], carry);
        dst[i] = lo;
        carry = hi;
    }
    carry
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn carry_borrow() {
        let top = Digit::MAX;
        assert_eq!(addcarry(top, 1, 0), (0, 1));
        assert_eq!(addcarry(top, top, 1), (top, 1));
        assert_eq!(addcarry(1, 2, 0), (3, 0));
        assert_eq!(addcarry(0, 0, 1), (1, 0));
        assert_eq!(subborrow(0, 1, 0), (top, 1));
        assert_eq!(subborrow(0, top, 1), (0, 1));
        assert_eq!(subborrow(5, 3, 1), (1, 0));
        assert_eq!(subborrow(top, top, 0), (0, 0));
    }

    #[test]
    fn wide_multiply() {
        let top = Digit::MAX;
        let (lo, hi) = umull(top, top);
        assert_eq!(lo, 1);
        assert_eq!(hi, top - 1);
        let (lo, hi) = umull_add2(top, top, top, top);
        assert_eq!(lo, top);
        assert_eq!(hi, top);
        let (lo, hi) = umull(0, top);
        assert_eq!((lo, hi), (0, 0));
    }

    #[test]
    fn vector_multiply() {
        // Checked against the same multiply-accumulate computed one
        // digit at a time in Wide precision.
        let top = Digit::MAX;
        let src = [top, 3, 0, top];
        let mut dst = [7, top, 0, 1];
        let m: Digit = top - 4;

        // Reference: operate digit by digit in Wide precision.
        let mut refdst = [7 as Digit, top, 0, 1];
        let mut carry: Wide = 0;
        for i in 0..4 {
            let t = (m as Wide) * (src[i] as Wide)
                + (refdst[i] as Wide) + carry;
            refdst[i] = t as Digit;
            carry = t >> DIGIT_BITS;
        }

        let cc = vecmul_add(m, &src, &mut dst);
        assert_eq!(dst, refdst);
        assert_eq!(cc as Wide, carry);
    }
}
