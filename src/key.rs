//! Key pairs and Diffie-Hellman pad derivation.
//!
//! A `Key` binds a curve parameter set, a twist selector and a public
//! x-coordinate; an optional private scalar makes it a full key pair.
//! The twist decides which of the two base points the public value is a
//! multiple of, and therefore which group a peer must use to agree on a
//! pad. Private scalars drawn from a random source are justified to the
//! lesser of the two base-point orders, so one scalar is valid on
//! either twist.
//!
//! Private scalars and derived pads are sensitive; the scalar is wiped
//! on drop, and `make_shared_secret` hands the caller an owned giant
//! the caller is expected to `clear()` after use.

use std::sync::Arc;

use zeroize::Zeroize;

use crate::curve::{CurveParams, Twist};
use crate::elliptic::{elliptic_simple, lesser_order_justify};
use crate::giant::Giant;

pub use rand_core::{CryptoRng, RngCore};

// Extra random bytes drawn beyond the prime size, so the bias from the
// mod-order reduction is negligible.
const SEED_SLOP_BYTES: usize = 8;

/// A public key, optionally holding the private scalar it was derived
/// from.
pub struct Key {
    params: Arc<CurveParams>,
    twist: Twist,
    /// x-coordinate of the public point, reduced mod the base prime.
    public_x: Giant,
    private: Option<Giant>,
}

impl Key {

    /// Wraps a peer's public x-coordinate received over the wire.
    /// Returns `None` on allocation failure.
    pub fn new_public(params: Arc<CurveParams>, twist: Twist,
        x: &Giant) -> Option<Key>
    {
        let mut public_x = Giant::new(params.max_digits)?;
        public_x.copy_from(x);
        Some(Key { params, twist, public_x, private: None })
    }

    /// Builds the key pair for the private scalar `k` on the given
    /// twist: the public value is `x(k * P)` for that twist's base
    /// point. Returns `None` on allocation failure or if `k` is a
    /// multiple of the base point's order (a caller-supplied scalar can
    /// be; a justified one cannot).
    pub fn set_private(params: Arc<CurveParams>, twist: Twist,
        k: &Giant) -> Option<Key>
    {
        let base = match twist {
            Twist::Plus => &params.x1_plus,
            Twist::Minus => &params.x1_minus,
        };
        let mut public_x = Giant::new(params.max_digits)?;
        public_x.copy_from(base);
        if !elliptic_simple(&params, &mut public_x, k) {
            return None;
        }
        let mut private = Giant::new(params.max_digits)?;
        private.copy_from(k);
        Some(Key { params, twist, public_x, private: Some(private) })
    }

    /// Generates a fresh key pair on the given twist, drawing the
    /// private scalar from `rng` and justifying it to the lesser
    /// base-point order. Requires the curve's orders to be set.
    /// Returns `None` on allocation failure.
    pub fn generate<R: CryptoRng + RngCore>(params: Arc<CurveParams>,
        twist: Twist, rng: &mut R) -> Option<Key>
    {
        let mut seed = vec![0u8; params.min_bytes + SEED_SLOP_BYTES];
        rng.fill_bytes(&mut seed);
        let mut wide = Giant::decode_be(&seed)?;
        let mut k = Giant::new(params.max_digits)?;
        k.copy_from(&wide);
        // Every holder of seed material is wiped: the byte buffer, the
        // decoded giant, and (below) the pre-justification scalar.
        wide.clear();
        seed.zeroize();
        lesser_order_justify(&params, &mut k);
        let key = Key::set_private(params, twist, &k);
        k.clear();
        key
    }

    pub fn params(&self) -> &Arc<CurveParams> {
        &self.params
    }

    pub fn twist(&self) -> Twist {
        self.twist
    }

    /// x-coordinate of the public point.
    pub fn public_x(&self) -> &Giant {
        &self.public_x
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Do two keys name the same public point on the same twist?
    /// Private halves are not compared; a public-only copy of a key
    /// pair is equal to it.
    pub fn key_equal(&self, other: &Key) -> bool {
        self.twist == other.twist
            && self.params.base_prime() == other.params.base_prime()
            && self.public_x == other.public_x
    }

    /// Diffie-Hellman pad: `x(priv_self * pub_peer)`. Both sides of an
    /// exchange compute the same value. Returns `None` if this key has
    /// no private half, if the keys disagree on twist or curve, or in
    /// the degenerate case where the product is the point at infinity.
    ///
    /// The pad is key material; callers should `clear()` it once a
    /// session key has been extracted.
    pub fn make_shared_secret(&self, peer: &Key) -> Option<Giant> {
        let private = self.private.as_ref()?;
        if self.twist != peer.twist
            || self.params.base_prime() != peer.params.base_prime()
        {
            return None;
        }
        let mut pad = Giant::new(self.params.max_digits)?;
        pad.copy_from(&peer.public_x);
        if !elliptic_simple(&self.params, &mut pad, private) {
            return None;
        }
        Some(pad)
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        if let Some(p) = self.private.as_mut() {
            p.clear();
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        self.key_equal(other)
    }
}

impl Eq for Key { }

// ========================================================================
