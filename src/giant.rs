//! Arbitrary-precision signed integers ("giants") and the arithmetic
//! engine built on them.
//!
//! A `Giant` owns a digit array of fixed capacity, chosen at allocation
//! time for the largest value the call site can produce, together with a
//! signed active-length field: the absolute value of `sign` is the number
//! of significant digits, and its sign is the sign of the number
//! (`sign == 0` means the value is zero regardless of stored digits).
//! Digits beyond the active length are don't-care and are never read.
//!
//! Nearly all operations work in place, in `set_*()` style: `b.set_add(&a)`
//! computes `b := b + a` within `b`'s existing storage. Callers must size
//! capacities for worst-case results (the product of an m-digit and an
//! n-digit value needs up to m+n digits); exceeding a capacity is a
//! caller-sizing defect and panics, it is never silently truncated, since
//! a wrapped value would corrupt any cryptographic computation built on
//! top. Allocation failure at construction time, by contrast, is a
//! recoverable condition and is reported through an `Option`.
//!
//! Operations that would need the same giant as two distinct mutable
//! arguments are unrepresentable here (`&mut self` plus `&other` cannot
//! alias); the one sanctioned self-multiply is `set_square()`, which also
//! happens to be the faster way to multiply a value by itself.
//!
//! Nothing in this module is constant-time. Running time depends on both
//! operand lengths and operand values; do not use this crate where
//! side-channel resistance matters.

use core::cmp::Ordering;
use core::fmt;

use zeroize::Zeroize;

use crate::digit::{Digit, DIGIT_BITS, DIGIT_BYTES, digits_for_bits,
    digits_for_bytes, addcarry, subborrow, umull, vecmul_add};
use crate::pool::borrow_giant;

/// An arbitrary-precision signed integer.
pub struct Giant {
    // abs(sign) = number of significant digits; sign of sign = sign of
    // the value. Invariant: abs(sign) <= digits.len(), and when sign != 0
    // the most significant active digit is non-zero (canonical form).
    sign: i32,
    // Little-endian digit array; length is the capacity and never changes
    // after construction.
    digits: Vec<Digit>,
}

/// Digits needed to hold any u64 value.
const U64_DIGITS: usize = 64 / DIGIT_BITS;

impl Giant {

    /// Allocates a zero-valued giant with room for `capacity` digits.
    /// Returns `None` if the backing storage cannot be allocated; callers
    /// must propagate that failure, never substitute a smaller giant.
    pub fn new(capacity: usize) -> Option<Giant> {
        let capacity = capacity.max(1);
        let mut digits = Vec::new();
        if digits.try_reserve_exact(capacity).is_err() {
            return None;
        }
        digits.resize(capacity, 0);
        Some(Giant { sign: 0, digits })
    }

    // Infallible allocation, for internal scratch values and the pool.
    // A true out-of-memory condition aborts here, as it does for any
    // other Vec in the process.
    pub(crate) fn scratch(capacity: usize) -> Giant {
        Giant { sign: 0, digits: vec![0; capacity.max(1)] }
    }

    /// Creates a giant holding the (non-negative) value `v`, with just
    /// enough capacity for it.
    pub fn from_u64(v: u64) -> Giant {
        let mut g = Giant::scratch(U64_DIGITS);
        g.set_u64(v);
        g
    }

    /// Creates a giant from the big-endian byte encoding of a magnitude.
    /// The result is always non-negative; the caller applies any sign
    /// separately. Returns `None` on allocation failure.
    pub fn decode_be(buf: &[u8]) -> Option<Giant> {
        let mut g = Giant::new(digits_for_bytes(buf.len().max(1)))?;
        let mut d: Digit = 0;
        let mut shift = 0;
        let mut idx = 0;
        for b in buf.iter().rev() {
            d |= (*b as Digit) << shift;
            shift += 8;
            if shift == DIGIT_BITS {
                g.digits[idx] = d;
                idx += 1;
                d = 0;
                shift = 0;
            }
        }
        if shift != 0 {
            g.digits[idx] = d;
            idx += 1;
        }
        g.sign = idx as i32;
        g.trim();
        Some(g)
    }

    /// Encodes the magnitude of this value into its minimal big-endian
    /// byte representation. Zero encodes as the empty sequence. Padding
    /// and sign-byte conventions are the caller's business.
    pub fn encode_be(&self) -> Vec<u8> {
        if self.sign == 0 {
            return Vec::new();
        }
        let n = self.ndigits();
        let top = self.digits[n - 1];
        let top_bytes = (DIGIT_BYTES * 8 - (top.leading_zeros() as usize) + 7) / 8;
        let mut out = Vec::with_capacity((n - 1) * DIGIT_BYTES + top_bytes);
        for i in (0..top_bytes).rev() {
            out.push((top >> (8 * i)) as u8);
        }
        for i in (0..(n - 1)).rev() {
            let d = self.digits[i];
            for j in (0..DIGIT_BYTES).rev() {
                out.push((d >> (8 * j)) as u8);
            }
        }
        out
    }

    /// Sets this giant to the value `v` in place.
    pub fn set_u64(&mut self, v: u64) {
        if v != 0 {
            assert!(self.capacity() >= U64_DIGITS
                || (64 - v.leading_zeros() as usize)
                    <= self.capacity() * DIGIT_BITS,
                "giant capacity exceeded");
        }
        let mut v = v;
        let mut n = 0;
        while v != 0 {
            self.digits[n] = v as Digit;
            v >>= DIGIT_BITS;
            n += 1;
        }
        self.sign = n as i32;
    }

    /// Number of digit slots physically allocated.
    pub fn capacity(&self) -> usize {
        self.digits.len()
    }

    /// Number of significant digits (0 for a zero value).
    pub fn ndigits(&self) -> usize {
        self.sign.unsigned_abs() as usize
    }

    /// Sign of the value: -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        self.sign.signum()
    }

    pub fn is_zero(&self) -> bool {
        self.sign == 0
    }

    pub fn is_one(&self) -> bool {
        self.sign == 1 && self.digits[0] == 1
    }

    // Value parity; zero counts as even.
    pub(crate) fn is_even(&self) -> bool {
        self.sign == 0 || (self.digits[0] & 1) == 0
    }

    /// Flips the sign of a non-zero value.
    pub fn negate(&mut self) {
        self.sign = -self.sign;
    }

    pub(crate) fn digit(&self, i: usize) -> Digit {
        self.digits[i]
    }

    // Active (significant) digits, least significant first.
    fn active(&self) -> &[Digit] {
        &self.digits[..self.ndigits()]
    }

    /// Copies sign and active digits of `a` into this giant's storage.
    /// Panics if this giant's capacity is too small.
    pub fn copy_from(&mut self, a: &Giant) {
        let n = a.ndigits();
        assert!(self.capacity() >= n, "giant capacity exceeded");
        self.digits[..n].copy_from_slice(&a.digits[..n]);
        self.sign = a.sign;
    }

    /// Zeroizes every digit slot (not just the active ones) and sets the
    /// value to zero. Used for secure erasure of private keys and shared
    /// pads; the wipe is guaranteed not to be elided by the optimizer.
    pub fn clear(&mut self) {
        self.zeroize();
    }

    // Re-establish canonical form: drop most-significant zero digits.
    fn trim(&mut self) {
        let mut n = self.ndigits();
        while n > 0 && self.digits[n - 1] == 0 {
            n -= 1;
        }
        self.sign = if self.sign < 0 { -(n as i32) } else { n as i32 };
    }

    // Set the active length, preserving the current sign direction
    // (a length of 0 always means the value zero).
    fn set_len(&mut self, n: usize) {
        self.sign = if self.sign < 0 { -(n as i32) } else { n as i32 };
        self.trim();
    }

    // Used by the pool when recycling a giant: a fresh borrower must
    // never observe a stale magnitude. Digit contents are left alone.
    pub(crate) fn reset_sign(&mut self) {
        self.sign = 0;
    }

    /// 1-based index of the highest set bit; 0 for a zero value.
    pub fn bit_length(&self) -> usize {
        if self.sign == 0 {
            return 0;
        }
        let n = self.ndigits();
        let top = self.digits[n - 1];
        // Canonical form is load-bearing here.
        assert!(top != 0, "giant not in canonical form");
        n * DIGIT_BITS - (top.leading_zeros() as usize)
    }

    /// Value of the bit at position `pos` (0 = least significant) in the
    /// magnitude.
    pub fn bit(&self, pos: usize) -> bool {
        let d = pos / DIGIT_BITS;
        if d >= self.ndigits() {
            return false;
        }
        (self.digits[d] >> (pos % DIGIT_BITS)) & 1 != 0
    }

    /// Total-order comparison consistent with integer value.
    ///
    /// Both operands must be in canonical form (no stored leading zero
    /// digits); the `sign` fields are compared first, which settles both
    /// actual sign and magnitude-by-digit-count in one step, then digits
    /// are compared from most significant down.
    pub fn compare(&self, b: &Giant) -> Ordering {
        if self.sign != b.sign {
            return self.sign.cmp(&b.sign);
        }
        let mag = cmp_mag(self.active(), b.active());
        if self.sign < 0 { mag.reverse() } else { mag }
    }

    // ----------------------------------------------------------------
    // Addition and subtraction.

    /// `self := self + a`, for arbitrary signs of both operands.
    pub fn set_add(&mut self, a: &Giant) {
        self.add_impl(a, false);
    }

    /// `self := self - a`, for arbitrary signs of both operands.
    pub fn set_sub(&mut self, a: &Giant) {
        self.add_impl(a, true);
    }

    // Signed add of a (sign-flipped when `flip`), dispatching on the
    // sign combination: same sign is a magnitude add, opposite signs
    // subtract the smaller magnitude from the larger, with the result
    // taking the sign of the larger-magnitude operand.
    fn add_impl(&mut self, a: &Giant, flip: bool) {
        let asig = if flip { -a.signum() } else { a.signum() };
        if asig == 0 {
            return;
        }
        if self.sign == 0 {
            self.copy_from(a);
            self.sign = asig * (a.ndigits() as i32);
            return;
        }
        if (self.sign < 0) == (asig < 0) {
            let n = self.mag_add(a);
            self.sign = if asig < 0 { -(n as i32) } else { n as i32 };
        } else {
            match cmp_mag(self.active(), a.active()) {
                Ordering::Greater => {
                    let n = self.mag_sub(a);
                    self.set_len(n);
                }
                Ordering::Less => {
                    let n = self.mag_rsub(a);
                    self.sign = if asig < 0 { -(n as i32) } else { n as i32 };
                    self.trim();
                }
                Ordering::Equal => {
                    self.sign = 0;
                }
            }
        }
    }

    // |self| := |self| + |a|; returns the new digit count. Grows by one
    // digit on final carry-out (capacity-checked).
    fn mag_add(&mut self, a: &Giant) -> usize {
        let ls = self.ndigits();
        let la = a.ndigits();
        let n = ls.max(la);
        assert!(self.capacity() >= n, "giant capacity exceeded");
        let mut cc = 0;
        for i in 0..n {
            let x = if i < ls { self.digits[i] } else { 0 };
            let y = if i < la { a.digits[i] } else { 0 };
            let (d, c) = addcarry(x, y, cc);
            self.digits[i] = d;
            cc = c;
        }
        if cc != 0 {
            assert!(self.capacity() > n, "giant capacity exceeded");
            self.digits[n] = 1;
            n + 1
        } else {
            n
        }
    }

    // |self| := |self| - |a|; requires |self| >= |a|. Returns the
    // (untrimmed) digit count.
    fn mag_sub(&mut self, a: &Giant) -> usize {
        let ls = self.ndigits();
        let la = a.ndigits();
        let mut cc = 0;
        for i in 0..ls {
            let y = if i < la { a.digits[i] } else { 0 };
            let (d, c) = subborrow(self.digits[i], y, cc);
            self.digits[i] = d;
            cc = c;
        }
        debug_assert!(cc == 0);
        ls
    }

    // |self| := |a| - |self|; requires |a| >= |self|. Returns the
    // (untrimmed) digit count.
    fn mag_rsub(&mut self, a: &Giant) -> usize {
        let ls = self.ndigits();
        let la = a.ndigits();
        assert!(self.capacity() >= la, "giant capacity exceeded");
        let mut cc = 0;
        for i in 0..la {
            let x = if i < ls { self.digits[i] } else { 0 };
            let (d, c) = subborrow(a.digits[i], x, cc);
            self.digits[i] = d;
            cc = c;
        }
        debug_assert!(cc == 0);
        la
    }

    // ----------------------------------------------------------------
    // Shifts and bit extraction.

    /// `self := self * 2^bits` in place. Panics if the result would not
    /// fit the capacity. The digit-aligned case is a pure digit move;
    /// the general case combines a digit move with an intra-digit bit
    /// shift carrying between adjacent digits.
    pub fn set_shl(&mut self, bits: usize) {
        if self.sign == 0 || bits == 0 {
            return;
        }
        let n = self.ndigits();
        let dsh = bits / DIGIT_BITS;
        let bsh = bits % DIGIT_BITS;
        let needed = n + dsh + if bsh != 0 { 1 } else { 0 };
        assert!(self.capacity() >= needed, "giant capacity exceeded");
        if bsh == 0 {
            self.digits.copy_within(0..n, dsh);
        } else {
            self.digits[n + dsh] = self.digits[n - 1] >> (DIGIT_BITS - bsh);
            for i in (1..n).rev() {
                self.digits[i + dsh] = (self.digits[i] << bsh)
                    | (self.digits[i - 1] >> (DIGIT_BITS - bsh));
            }
            self.digits[dsh] = self.digits[0] << bsh;
        }
        for i in 0..dsh {
            self.digits[i] = 0;
        }
        self.set_len(needed);
    }

    /// `self := self / 2^bits`, discarding the bits shifted out. This is
    /// a pure bit shift of the magnitude: it equals floor division only
    /// for non-negative values. Callers needing signed floor semantics
    /// handle the sign themselves.
    pub fn set_shr(&mut self, bits: usize) {
        if self.sign == 0 || bits == 0 {
            return;
        }
        let n = self.ndigits();
        let dsh = bits / DIGIT_BITS;
        let bsh = bits % DIGIT_BITS;
        if dsh >= n {
            self.sign = 0;
            return;
        }
        let m = n - dsh;
        if bsh == 0 {
            self.digits.copy_within(dsh..n, 0);
        } else {
            for i in 0..(m - 1) {
                self.digits[i] = (self.digits[i + dsh] >> bsh)
                    | (self.digits[i + dsh + 1] << (DIGIT_BITS - bsh));
            }
            self.digits[m - 1] = self.digits[n - 1] >> bsh;
        }
        self.set_len(m);
    }

    /// `self := self mod 2^bits`, keeping the lowermost `bits` bits of
    /// the magnitude; the sign is preserved.
    pub fn set_extract_bits(&mut self, bits: usize) {
        if self.sign == 0 {
            return;
        }
        if bits == 0 {
            self.sign = 0;
            return;
        }
        if bits >= self.bit_length() {
            return;
        }
        // bits < bit_length, so nd <= ndigits and the top kept digit
        // may still carry bits above the cut.
        let nd = (bits + DIGIT_BITS - 1) / DIGIT_BITS;
        let rem = bits % DIGIT_BITS;
        if rem != 0 {
            self.digits[nd - 1] &= ((1 as Digit) << rem) - 1;
        }
        self.set_len(nd);
    }

    // ----------------------------------------------------------------
    // Multiplication.

    /// `self := self * a`. Schoolbook multiplication through the digit
    /// vector primitive, into pooled scratch of `m + n` digits. Zero
    /// operands short-circuit. Multiplying a value by itself must go
    /// through `set_square()` instead; the borrow rules make it
    /// impossible to reach this path with aliased operands.
    pub fn set_mul(&mut self, a: &Giant) {
        if self.sign == 0 {
            return;
        }
        if a.sign == 0 {
            self.sign = 0;
            return;
        }
        let la = a.ndigits();
        let lb = self.ndigits();
        let mut prod = borrow_giant(la + lb);
        for d in prod.digits[..(la + lb)].iter_mut() {
            *d = 0;
        }
        for i in 0..la {
            let cc = vecmul_add(a.digits[i], &self.digits[..lb],
                &mut prod.digits[i..(i + lb)]);
            prod.digits[i + lb] = cc;
        }
        prod.sign = (la + lb) as i32;
        prod.trim();
        let neg = (self.sign < 0) != (a.sign < 0);
        self.copy_from(&prod);
        if neg {
            self.sign = -self.sign;
        }
    }

    /// `self := self * self`, via the grammar-school squaring shortcut:
    /// each cross term a[i]*a[j], i < j, is computed once and the whole
    /// partial sum doubled, roughly halving the digit multiplies of a
    /// general multiply. This is the only sanctioned self-aliased
    /// operation in the engine. The result is non-negative.
    pub fn set_square(&mut self) {
        if self.sign == 0 {
            return;
        }
        let n = self.ndigits();
        let mut prod = borrow_giant(2 * n);
        for d in prod.digits[..(2 * n)].iter_mut() {
            *d = 0;
        }
        // Cross terms, each once.
        for i in 0..n {
            if i + 1 == n {
                break;
            }
            let (lo, hi) = self.digits.split_at(i + 1);
            let cc = vecmul_add(lo[i], &hi[..(n - i - 1)],
                &mut prod.digits[(2 * i + 1)..(i + n)]);
            prod.digits[i + n] = cc;
        }
        // Double the cross-term sum. It is at most (v^2 - sum of
        // diagonals) / 2, so the shift cannot carry out of 2n digits.
        let mut cc: Digit = 0;
        for i in 0..(2 * n) {
            let d = prod.digits[i];
            prod.digits[i] = (d << 1) | cc;
            cc = d >> (DIGIT_BITS - 1);
        }
        debug_assert!(cc == 0);
        // Fold in the diagonal terms a[i]^2 at position 2i.
        let mut cc = 0;
        for i in 0..n {
            let (lo, hi) = umull(self.digits[i], self.digits[i]);
            let (d, c) = addcarry(prod.digits[2 * i], lo, cc);
            prod.digits[2 * i] = d;
            let (d, c) = addcarry(prod.digits[2 * i + 1], hi, c);
            prod.digits[2 * i + 1] = d;
            cc = c;
        }
        debug_assert!(cc == 0);
        prod.sign = (2 * n) as i32;
        prod.trim();
        self.copy_from(&prod);
    }

    // ----------------------------------------------------------------
    // Division and modulus.
    //
    // Convention (documented and tested): for a strictly positive
    // denominator d, the remainder is always in [0, d) and the quotient
    // is floor(n/d), so d*(n div d) + (n mod d) == n holds for negative
    // dividends too.

    /// Computes the steady-state reciprocal `floor(2^(2b) / d)` of a
    /// strictly positive `d`, where `b` is the bit length of `d - 1`.
    /// The reciprocal, once computed, turns every division or modulus by
    /// `d` into a short sequence of multiplies, shifts and compares.
    ///
    /// Newton-Raphson-style fixed-point iteration: square the current
    /// estimate, scale by `d` with shifts, and fold back into the
    /// estimate; the iteration increases monotonically until it
    /// overshoots, after which at most a few unit corrections land on
    /// the exact value.
    pub fn make_recip(d: &Giant) -> Giant {
        assert!(d.signum() > 0,
            "make_recip: denominator must be strictly positive");
        let nd = d.ndigits();
        let one = Giant::from_u64(1);

        // b = bit length of d - 1.
        let mut t = borrow_giant(nd + 1);
        t.copy_from(d);
        t.set_sub(&one);
        let b = t.bit_length();

        // Initial estimate r = 2^b (a lower bound for the reciprocal).
        let mut r = Giant::scratch(nd + 2);
        r.set_u64(1);
        r.set_shl(b);

        let mut prev = borrow_giant(nd + 2);
        prev.copy_from(&r);
        let mut tmp = borrow_giant(2 * nd + 6);
        loop {
            // r := 2r - floor(floor(r^2 / 2^b) * d / 2^b)
            tmp.copy_from(&r);
            tmp.set_square();
            tmp.set_shr(b);
            tmp.set_mul(d);
            tmp.set_shr(b);
            r.set_shl(1);
            r.set_sub(&tmp);
            if r.compare(&prev) != Ordering::Greater {
                break;
            }
            prev.copy_from(&r);
        }

        // Correction: nudge r until 0 <= 2^(2b) - r*d < d.
        tmp.set_u64(1);
        tmp.set_shl(2 * b);
        let mut rd = borrow_giant(2 * nd + 4);
        rd.copy_from(&r);
        rd.set_mul(d);
        tmp.set_sub(&rd);
        while tmp.signum() < 0 {
            r.set_sub(&one);
            tmp.set_add(d);
        }
        while tmp.compare(d) != Ordering::Less {
            r.set_add(&one);
            tmp.set_sub(d);
        }
        r
    }

    /// `self := self mod d`, using the precomputed reciprocal `r` of the
    /// strictly positive `d`. The result is always in `[0, d)`.
    pub fn set_mod_via_recip(&mut self, d: &Giant, r: &Giant) {
        let neg = self.mod_core(d, r);
        if neg && self.sign != 0 {
            // Floor convention: fold the magnitude residue back into
            // [0, d).
            self.negate();
            self.set_add(d);
        }
    }

    /// `self := self div d` (floor), using the precomputed reciprocal
    /// `r` of the strictly positive `d`.
    pub fn set_div_via_recip(&mut self, d: &Giant, r: &Giant) {
        assert!(d.signum() > 0,
            "division: denominator must be strictly positive");
        let neg = self.sign < 0;
        if self.sign == 0 {
            return;
        }
        if d.is_one() {
            return;
        }
        self.sign = self.sign.abs();
        let s = 2 * (r.bit_length() - 1);
        let one = Giant::from_u64(1);
        let mut q = borrow_giant(self.ndigits() + 1);
        q.set_u64(0);
        let mut tmp = borrow_giant(self.ndigits() + r.ndigits() + 2);
        loop {
            tmp.copy_from(self);
            tmp.set_mul(r);
            tmp.set_shr(s);
            q.set_add(&tmp);
            tmp.set_mul(d);
            self.set_sub(&tmp);
            if self.compare(d) != Ordering::Less {
                self.set_sub(d);
                q.set_add(&one);
            }
            if self.compare(d) == Ordering::Less {
                break;
            }
        }
        let rem_zero = self.is_zero();
        self.copy_from(&q);
        if neg {
            self.negate();
            if !rem_zero {
                // floor(-x/d) = -floor(x/d) - 1 when d does not divide x.
                self.set_sub(&one);
            }
        }
    }

    // Shared magnitude-reduction loop: |self| := |self| mod d; returns
    // whether the input was negative. This is the Barrett-like fast
    // path: the quotient is estimated from the reciprocal with shifts
    // and multiplies only, and a bounded number of corrective rounds
    // absorbs the approximation error.
    fn mod_core(&mut self, d: &Giant, r: &Giant) -> bool {
        assert!(d.signum() > 0,
            "modulus: denominator must be strictly positive");
        let neg = self.sign < 0;
        self.sign = self.sign.abs();
        if self.sign == 0 {
            return neg;
        }
        if d.is_one() {
            self.sign = 0;
            return neg;
        }
        let s = r.bit_length() - 1;
        let mut tmp = borrow_giant(self.ndigits() + r.ndigits() + 2);
        loop {
            // q-hat = ((n >> (s-2)) * r) >> (s+2), never exceeding the
            // true quotient; two guard bits on each side of the split
            // keep the estimate tight.
            tmp.copy_from(self);
            if s >= 2 {
                tmp.set_shr(s - 2);
            } else {
                tmp.set_shl(2 - s);
            }
            tmp.set_mul(r);
            tmp.set_shr(s + 2);
            tmp.set_mul(d);
            self.set_sub(&tmp);
            if self.compare(d) != Ordering::Less {
                self.set_sub(d);
            }
            if self.compare(d) == Ordering::Less {
                break;
            }
        }
        neg
    }

    /// `self := self mod d` for strictly positive `d`, computing a fresh
    /// reciprocal. When several reductions by the same `d` are expected,
    /// compute the reciprocal once with `make_recip` and use
    /// `set_mod_via_recip` instead.
    pub fn set_mod(&mut self, d: &Giant) {
        let r = Giant::make_recip(d);
        self.set_mod_via_recip(d, &r);
    }

    /// `self := self div d` (floor) for strictly positive `d`, computing
    /// a fresh reciprocal.
    pub fn set_div(&mut self, d: &Giant) {
        let r = Giant::make_recip(d);
        self.set_div_via_recip(d, &r);
    }

    /// `self := self mod (2^n - 1)`, by repeated folding of the high and
    /// low halves of the bit pattern at the n-bit boundary: 2^n is
    /// congruent to 1, so `hi*2^n + lo` reduces to `hi + lo`. For a
    /// negative input the residue is fixed up as `(2^n - 1) - |residue|`,
    /// which over an n-bit field is exactly the one's complement, rather
    /// than going through a generic negate-and-reduce.
    ///
    /// The residue occupies up to n bits regardless of the input's
    /// length, so `self` must have capacity for n bits even when the
    /// input itself is shorter (a short negative input still produces
    /// an n-bit result).
    pub fn set_mersenne_mod(&mut self, n: usize) {
        assert!(n > 0);
        assert!(self.capacity() >= digits_for_bits(n),
            "set_mersenne_mod: capacity below the modulus width");
        let neg = self.sign < 0;
        self.sign = self.sign.abs();
        let nd = digits_for_bits(n);
        let mut lo = borrow_giant(self.ndigits().max(nd) + 1);
        while self.bit_length() > n {
            lo.copy_from(self);
            lo.set_extract_bits(n);
            self.set_shr(n);
            self.set_add(&lo);
        }
        // p = 2^n - 1
        let mut p = borrow_giant(nd + 1);
        p.set_u64(1);
        p.set_shl(n);
        let one = Giant::from_u64(1);
        p.set_sub(&one);
        if self.compare(&p) == Ordering::Equal {
            self.sign = 0;
        }
        if neg && self.sign != 0 {
            // One's complement over the n-bit field.
            self.set_sub(&p);
            self.negate();
        }
    }

    /// Magnitude fold for a special-form modulus `2^(nd*DIGIT_BITS) - k`
    /// with a single-digit `k`: repeatedly replaces `hi*2^q + lo` with
    /// `lo + hi*k`, entirely within the digit array (2^q is congruent
    /// to k). The caller owns the sign and the final reduction below
    /// the modulus; the result here is only guaranteed below `2^q`.
    ///
    /// Each pass needs the high part to fit in `nd` digits; returns
    /// `false` without touching the value when the input is too long,
    /// so the caller can take the generic path instead.
    pub(crate) fn fold_special_digits(&mut self, nd: usize, k: Digit) -> bool {
        debug_assert!(self.sign >= 0);
        if self.ndigits() > 2 * nd {
            return false;
        }
        while self.ndigits() > nd {
            let n = self.ndigits();
            let hl = n - nd;
            let (lo, hi) = self.digits.split_at_mut(nd);
            let mut carry = vecmul_add(k, &hi[..hl], &mut lo[..hl]);
            for d in hi[..hl].iter_mut() {
                *d = 0;
            }
            let mut idx = hl;
            while carry != 0 && idx < nd {
                let (d, c) = addcarry(lo[idx], carry, 0);
                lo[idx] = d;
                carry = c as Digit;
                idx += 1;
            }
            if carry != 0 {
                // Carry past the boundary; digit nd exists because the
                // input had at least nd + 1 digits.
                hi[0] = carry;
                self.set_len(nd + 1);
            } else {
                self.set_len(nd);
            }
        }
        true
    }

    // ----------------------------------------------------------------
    // Modular inverse.

    /// Computes `x := x^(-1) mod p` by the extended binary-GCD method
    /// (HAC 14.61): even factors are stripped by halving, odd residues
    /// by subtraction, with four auxiliary accumulators tracking the
    /// Bezout coefficients. No explicit divisions are performed, so the
    /// cost scales with the bit length of the inputs; callers holding a
    /// fast modulus for `p` should reduce `x` first.
    ///
    /// Returns `false` when no inverse exists, in which case `x` is left
    /// holding `gcd(x, p)`; that is a legitimate outcome the caller must
    /// act on, e.g. by retrying key generation with a fresh scalar.
    pub fn binary_inverse(p: &Giant, x: &mut Giant) -> bool {
        assert!(p.signum() > 0 && !p.is_one(),
            "binary_inverse: modulus must be at least 2");
        assert!(x.signum() > 0,
            "binary_inverse: value must be strictly positive");
        if x.is_one() {
            return true;
        }
        let cap = p.ndigits() + x.ndigits() + 2;
        let mut u = borrow_giant(cap);
        u.copy_from(x);
        let mut v = borrow_giant(cap);
        v.copy_from(p);

        // Strip factors of 2 common to both; any remaining shared
        // factor of 2 already rules out an inverse.
        let mut g_shift = 0usize;
        while u.is_even() && v.is_even() {
            u.set_shr(1);
            v.set_shr(1);
            g_shift += 1;
        }
        let mut xr = borrow_giant(cap);
        xr.copy_from(&u);
        let mut yr = borrow_giant(cap);
        yr.copy_from(&v);

        // Invariants: ca*xr + cb*yr = u and cc*xr + cd*yr = v.
        let mut ca = borrow_giant(cap);
        ca.set_u64(1);
        let mut cb = borrow_giant(cap);
        cb.set_u64(0);
        let mut cc = borrow_giant(cap);
        cc.set_u64(0);
        let mut cd = borrow_giant(cap);
        cd.set_u64(1);

        loop {
            while u.is_even() && !u.is_zero() {
                u.set_shr(1);
                if !(ca.is_even() && cb.is_even()) {
                    ca.set_add(&yr);
                    cb.set_sub(&xr);
                }
                ca.set_shr(1);
                cb.set_shr(1);
            }
            while v.is_even() {
                v.set_shr(1);
                if !(cc.is_even() && cd.is_even()) {
                    cc.set_add(&yr);
                    cd.set_sub(&xr);
                }
                cc.set_shr(1);
                cd.set_shr(1);
            }
            if u.compare(&v) != Ordering::Less {
                u.set_sub(&v);
                ca.set_sub(&cc);
                cb.set_sub(&cd);
            } else {
                v.set_sub(&u);
                cc.set_sub(&ca);
                cd.set_sub(&cb);
            }
            if u.is_zero() {
                break;
            }
        }

        // gcd(x, p) = v << g_shift; an inverse exists iff it is 1.
        if g_shift != 0 || !v.is_one() {
            v.set_shl(g_shift);
            x.copy_from(&v);
            return false;
        }
        // cc * x = v = 1 (mod p); bring cc into [0, p).
        while cc.signum() < 0 {
            cc.set_add(p);
        }
        while cc.compare(p) != Ordering::Less {
            cc.set_sub(p);
        }
        x.copy_from(&cc);
        true
    }
}

// Magnitude comparison of two canonical little-endian digit slices.
fn cmp_mag(a: &[Digit], b: &[Digit]) -> Ordering {
    if a.len() != b.len() {
        return a.len().cmp(&b.len());
    }
    for i in (0..a.len()).rev() {
        if a[i] != b[i] {
            return a[i].cmp(&b[i]);
        }
    }
    Ordering::Equal
}

// Clone duplicates the full capacity (all digit slots, not just the
// active ones) so that subsequent in-place operations on the copy behave
// bit-for-bit like operations on the original.
impl Clone for Giant {
    fn clone(&self) -> Giant {
        Giant { sign: self.sign, digits: self.digits.clone() }
    }
}

impl PartialEq for Giant {
    fn eq(&self, other: &Giant) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Giant { }

impl PartialOrd for Giant {
    fn partial_cmp(&self, other: &Giant) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Giant {
    fn cmp(&self, other: &Giant) -> Ordering {
        self.compare(other)
    }
}

impl Zeroize for Giant {
    fn zeroize(&mut self) {
        // Zeroize the slice in place rather than the Vec: the Vec impl
        // would truncate, and the capacity must survive a wipe.
        self.digits.as_mut_slice().zeroize();
        self.sign = 0;
    }
}

impl fmt::Debug for Giant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.sign < 0 {
            write!(f, "-")?;
        }
        if self.sign == 0 {
            return write!(f, "0x0");
        }
        write!(f, "0x")?;
        for (i, d) in self.active().iter().enumerate().rev() {
            if i == self.ndigits() - 1 {
                write!(f, "{:X}", d)?;
            } else {
                write!(f, "{:0width$X}", d, width = DIGIT_BYTES * 2)?;
            }
        }
        Ok(())
    }
}

// ========================================================================
