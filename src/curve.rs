//! Elliptic curve parameter sets.
//!
//! A `CurveParams` describes one instance of the curve
//! `y^2 = x^3 + c*x^2 + a*x + b` over the field of a prime `p`, together
//! with the precomputed data the elliptic engine needs: the prime's
//! shape (Mersenne `2^q - 1`, special form `2^q - k`, or a general
//! prime with a Barrett-style reciprocal), the scratch capacity bound
//! for intermediates, the base-point x-coordinates for both twists, and
//! the (optional) curve orders with their cached reciprocals.
//!
//! The curve algebra variant (Montgomery, Atkin, or general) is
//! classified once from the coefficients at construction time; the
//! per-call formula dispatch in the elliptic engine branches on that
//! stored tag rather than re-inspecting coefficients.
//!
//! Derived reciprocals are computed lazily on first use and cached in
//! compute-once cells, so sharing one `CurveParams` between threads
//! (behind an `Arc`) is safe.

use std::sync::OnceLock;

use crate::digit::{digits_for_bytes, Digit, DIGIT_BITS};
use crate::giant::Giant;

/// Shape of the field prime, selecting the fast-reduction path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimeType {
    /// `p = 2^q - 1`; reduction is fold-and-add at the q-bit boundary.
    Mersenne,
    /// `p = 2^q - k` for a small `k`; reduction multiplies the high part
    /// by `k` and folds.
    FeeSpecial,
    /// Arbitrary prime; reduction goes through the precomputed
    /// reciprocal.
    General,
}

/// Coefficient shape of the curve equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveType {
    /// `a = 1`, `b = 0` (x-only Montgomery arithmetic).
    Montgomery,
    /// `c = 0` (short Weierstrass form).
    Weierstrass,
    /// Arbitrary a, b, c.
    General,
}

/// Formula set used by the elliptic engine. Montgomery and Atkin
/// (`a = 0`, `c = 0`) curves get algebraically simplified fast paths;
/// the general variant handles arbitrary coefficients and must agree
/// bit-for-bit with the fast paths wherever both apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveAlgebra {
    Montgomery,
    Atkin,
    General,
}

/// Selector for one of the two twists sharing the curve coefficients.
/// Doubles as the sign-ambiguity choice in `elliptic_add`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Twist {
    Plus,
    Minus,
}

/// One elliptic curve instance. Construct with `new_mersenne`,
/// `new_fee` or `new_general`, then optionally attach curve orders via
/// `set_orders` and the plus-twist y-coordinate via `set_y1_plus`.
pub struct CurveParams {
    pub prime_type: PrimeType,
    /// Prime exponent for Mersenne / FEE-special primes (0 for general).
    pub q: usize,
    /// The offset `k` of a FEE-special prime `2^q - k`.
    pub k: Giant,
    // k as a single digit when it fits; enables the digit-vector
    // folding fast path in feemod.
    pub(crate) k_digit: Option<Digit>,
    pub curve_type: CurveType,
    pub(crate) algebra: CurveAlgebra,
    /// Curve coefficients of y^2 = x^3 + c*x^2 + a*x + b.
    pub a: Giant,
    pub b: Giant,
    pub c: Giant,
    base_prime: Giant,
    /// Tight byte count for the prime.
    pub min_bytes: usize,
    /// Scratch capacity (in digits) sufficient for every intermediate
    /// product the elliptic engine forms under this prime.
    pub max_digits: usize,
    /// Base-point x-coordinates for the two twists.
    pub x1_plus: Giant,
    pub x1_minus: Giant,
    /// y-coordinate of the plus base point; only meaningful for
    /// Weierstrass curves used with projective (x, y) arithmetic.
    pub y1_plus: Option<Giant>,
    /// Order of the plus/minus base points, when known.
    pub x1_order_plus: Option<Giant>,
    pub x1_order_minus: Option<Giant>,
    /// The smaller of the two orders; private scalars justified to it
    /// are usable on either twist.
    pub lesser_x1_order: Option<Giant>,
    base_prime_recip: OnceLock<Giant>,
    x1_order_plus_recip: OnceLock<Giant>,
    lesser_x1_order_recip: OnceLock<Giant>,
}

impl CurveParams {

    /// Curve over the Mersenne prime `2^q - 1`.
    pub fn new_mersenne(q: usize, a: Giant, b: Giant, c: Giant,
        x1_plus: Giant, x1_minus: Giant) -> CurveParams
    {
        let mut p = Giant::scratch(digits_for_bytes((q + 7) / 8) + 1);
        p.set_u64(1);
        p.set_shl(q);
        p.set_sub(&Giant::from_u64(1));
        Self::finish(PrimeType::Mersenne, q, Giant::from_u64(1), p,
            a, b, c, x1_plus, x1_minus)
    }

    /// Curve over the FEE-special-form prime `2^q - k`. The base prime
    /// is computed from `q` and `k`; `k` must satisfy `0 < k < 2^q`.
    pub fn new_fee(q: usize, k: Giant, a: Giant, b: Giant, c: Giant,
        x1_plus: Giant, x1_minus: Giant) -> CurveParams
    {
        assert!(k.signum() > 0 && k.bit_length() < q,
            "new_fee: k out of range");
        let mut p = Giant::scratch(digits_for_bytes((q + 7) / 8) + 1);
        p.set_u64(1);
        p.set_shl(q);
        p.set_sub(&k);
        Self::finish(PrimeType::FeeSpecial, q, k, p,
            a, b, c, x1_plus, x1_minus)
    }

    /// Curve over an arbitrary (odd) prime, supplied directly.
    pub fn new_general(base_prime: Giant, a: Giant, b: Giant, c: Giant,
        x1_plus: Giant, x1_minus: Giant) -> CurveParams
    {
        assert!(base_prime.signum() > 0 && !base_prime.is_one(),
            "new_general: prime must be at least 2");
        Self::finish(PrimeType::General, 0, Giant::from_u64(0), base_prime,
            a, b, c, x1_plus, x1_minus)
    }

    fn finish(prime_type: PrimeType, q: usize, k: Giant, base_prime: Giant,
        a: Giant, b: Giant, c: Giant, x1_plus: Giant, x1_minus: Giant)
        -> CurveParams
    {
        let k_digit = if prime_type == PrimeType::FeeSpecial
            && k.bit_length() <= DIGIT_BITS
        {
            Some(k.digit(0))
        } else {
            None
        };
        let algebra = if a.is_one() && b.is_zero() {
            CurveAlgebra::Montgomery
        } else if a.is_zero() && c.is_zero() {
            CurveAlgebra::Atkin
        } else {
            CurveAlgebra::General
        };
        let curve_type = if a.is_one() && b.is_zero() {
            CurveType::Montgomery
        } else if c.is_zero() {
            CurveType::Weierstrass
        } else {
            CurveType::General
        };
        let (min_bytes, max_digits) = giant_sizes(&base_prime);
        CurveParams {
            prime_type, q, k, k_digit, curve_type, algebra,
            a, b, c, base_prime, min_bytes, max_digits,
            x1_plus, x1_minus,
            y1_plus: None,
            x1_order_plus: None,
            x1_order_minus: None,
            lesser_x1_order: None,
            base_prime_recip: OnceLock::new(),
            x1_order_plus_recip: OnceLock::new(),
            lesser_x1_order_recip: OnceLock::new(),
        }
    }

    /// Attaches the precomputed orders of the two base points; the
    /// lesser order is derived here.
    pub fn set_orders(&mut self, plus: Giant, minus: Giant) {
        let lesser = if plus <= minus { plus.clone() } else { minus.clone() };
        self.x1_order_plus = Some(plus);
        self.x1_order_minus = Some(minus);
        self.lesser_x1_order = Some(lesser);
    }

    /// Attaches the y-coordinate of the plus base point (Weierstrass
    /// projective use only).
    pub fn set_y1_plus(&mut self, y: Giant) {
        self.y1_plus = Some(y);
    }

    /// The field prime.
    pub fn base_prime(&self) -> &Giant {
        &self.base_prime
    }

    // Reciprocal of the base prime; computed on first use (only the
    // General reduction path needs it).
    pub(crate) fn base_prime_recip(&self) -> &Giant {
        self.base_prime_recip.get_or_init(|| {
            Giant::make_recip(&self.base_prime)
        })
    }

    pub(crate) fn x1_order_plus_recip(&self) -> &Giant {
        let order = self.x1_order_plus.as_ref()
            .expect("x1_order_plus not set for this curve");
        self.x1_order_plus_recip.get_or_init(|| {
            // If the two named orders are numerically equal and the
            // other cache is already warm, reuse it instead of running
            // the reciprocal iteration twice.
            if let (Some(lesser), Some(r)) =
                (self.lesser_x1_order.as_ref(),
                 self.lesser_x1_order_recip.get())
            {
                if lesser == order {
                    return r.clone();
                }
            }
            Giant::make_recip(order)
        })
    }

    pub(crate) fn lesser_x1_order_recip(&self) -> &Giant {
        let order = self.lesser_x1_order.as_ref()
            .expect("curve orders not set for this curve");
        self.lesser_x1_order_recip.get_or_init(|| {
            if let (Some(plus), Some(r)) =
                (self.x1_order_plus.as_ref(),
                 self.x1_order_plus_recip.get())
            {
                if plus == order {
                    return r.clone();
                }
            }
            Giant::make_recip(order)
        })
    }
}

// min_bytes is the tight byte count for the prime; max_digits sizes the
// scratch giants for the worst intermediate the elliptic engine forms.
// The extra 20-byte floor exists for multiplying a curve-sized value
// against a signature digest, which may push one operand past the prime
// size.
fn giant_sizes(base_prime: &Giant) -> (usize, usize) {
    let min_bytes = (base_prime.bit_length() + 7) / 8;
    let scratch_bytes = (4 * min_bytes).max(min_bytes + 20);
    (min_bytes, digits_for_bytes(scratch_bytes))
}

// ========================================================================
