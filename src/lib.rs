//! Feekit is a Rust library implementing the Fast Elliptic Encryption
//! (FEE) arithmetic engine.
//!
//! The foundation is the "giant" integer: an arbitrary-precision signed
//! integer whose digit storage is allocated once, at a capacity the
//! call site chooses, and whose operations then run in place with no
//! further allocation (`b.set_add(&a)` computes `b := b + a` inside
//! `b`'s storage). A thread-local arena recycles scratch giants by
//! size class, so the inner loops of the elliptic engine allocate
//! nothing in steady state. The `giant` module provides the full
//! engine: addition, subtraction, shifts, schoolbook multiplication
//! and squaring, division and modulus through precomputed Newton
//! reciprocals, special-form modular reduction, and extended-binary-GCD
//! modular inversion.
//!
//! On top of it, the `elliptic` module implements x-coordinate-only
//! point arithmetic on curves `y^2 = x^3 + c*x^2 + a*x + b` over primes
//! of three shapes (Mersenne `2^q - 1`, FEE-special `2^q - k`, and
//! general), with a Montgomery-style ladder for scalar multiplication,
//! sign-ambiguous point addition, twist identification, and the
//! quadratic consistency check used to verify signatures. Curve
//! parameter sets live in `curve`; `key` binds them into key pairs and
//! Diffie-Hellman pad derivation, with private material wiped on drop
//! via `zeroize`.
//!
//! # Conventions
//!
//! Nothing in this crate is constant-time: running time depends on
//! operand lengths and values, including secret ones. Do not use it
//! where side-channel resistance matters; its purpose is portable,
//! allocation-disciplined variable-time arithmetic.
//!
//! Functions that modify the object they are called on have names in
//! `set_*()` (`g.set_mul(&a)` replaces `g` with `g * a`). Capacity is a
//! caller obligation: operations panic rather than silently truncate
//! when a result does not fit, while allocation failure at construction
//! time is reported through an `Option`. For a strictly positive
//! denominator, division and modulus follow the floor convention, so
//! the remainder is always in `[0, d)` and `d*q + r == n` holds for
//! negative dividends too.
//!
//! Digits are 32-bit by default; the `digit16` feature selects 16-bit
//! digits, which pushes carries across digit boundaries far more often
//! and is useful for shaking out boundary bugs.

pub mod curve;
pub mod digit;
pub mod elliptic;
pub mod giant;
pub mod key;
pub mod pool;

pub use rand_core::{CryptoRng, RngCore, Error as RngError};
