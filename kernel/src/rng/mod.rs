//! Deterministic random number generation.
//!
//! All randomness in a reproducible simulation must go through a seeded
//! generator; the kernel guarantees a fixed event order, the generator
//! guarantees a fixed sample sequence.

mod xorshift;

pub use xorshift::RngManager;
