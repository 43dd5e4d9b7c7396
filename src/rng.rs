//! Random sources.
//!
//! The engine, the agents and the harness only ever ask for one thing: a
//! uniform float in `[0, 1)`. That capability is the [`RandomSource`] trait,
//! so any generator can be swapped in without touching them.
//!
//! ```
//! use ai_2048_lab::rng::{Mulberry32, RandomSource};
//!
//! let mut a = Mulberry32::new(1337);
//! let mut b = Mulberry32::new(1337);
//! for _ in 0..8 {
//!     let x = a.next_f64();
//!     assert_eq!(x, b.next_f64());
//!     assert!((0.0..1.0).contains(&x));
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A stream of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    #[inline]
    fn next_f64(&mut self) -> f64 { (**self).next_f64() }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    #[inline]
    fn next_f64(&mut self) -> f64 { (**self).next_f64() }
}

const MULBERRY_DEFAULT_SEED: u32 = 0x1234_5678;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32: a tiny 32-bit generator with a one-word state.
///
/// This is the reference generator for evaluation runs; equal seeds give
/// identical sequences on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    a: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self { Self { a: seed } }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.a = self.a.wrapping_add(0x6D2B_79F5);
        let mut t = self.a;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl Default for Mulberry32 {
    fn default() -> Self { Self::new(MULBERRY_DEFAULT_SEED) }
}

impl RandomSource for Mulberry32 {
    #[inline]
    fn next_f64(&mut self) -> f64 { self.next_u32() as f64 / TWO_POW_32 }
}

/// Adapts any `rand` generator to [`RandomSource`].
///
/// ```
/// use ai_2048_lab::rng::{RandAdapter, RandomSource};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut r = RandAdapter::new(StdRng::seed_from_u64(7));
/// assert!(r.next_f64() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct RandAdapter<R>(R);

impl<R: RngCore> RandAdapter<R> {
    pub fn new(rng: R) -> Self { Self(rng) }

    pub fn into_inner(self) -> R { self.0 }
}

impl<R: RngCore> RandomSource for RandAdapter<R> {
    #[inline]
    fn next_f64(&mut self) -> f64 { self.0.gen::<f64>() }
}

/// Replays a fixed sequence of draws, repeating the last value once the
/// sequence runs out. Handy for scripting exact spawns.
#[derive(Debug, Clone)]
pub struct SequenceRng {
    seq: Vec<f64>,
    idx: usize,
}

impl SequenceRng {
    pub fn new(seq: Vec<f64>) -> Result<Self, ConfigError> {
        if seq.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        if let Some(&bad) = seq.iter().find(|v| !(0.0..1.0).contains(*v)) {
            return Err(ConfigError::SequenceValue(bad));
        }
        Ok(Self { seq, idx: 0 })
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize { self.idx }
}

impl RandomSource for SequenceRng {
    fn next_f64(&mut self) -> f64 {
        let v = self.seq[self.idx.min(self.seq.len() - 1)];
        self.idx += 1;
        v
    }
}

/// Generator selection by name, used to build per-game sources from a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RngKind {
    #[default]
    Mulberry32,
    /// `rand::rngs::StdRng` seeded through `seed_from_u64`.
    Std,
}

impl RngKind {
    pub fn seeded(self, seed: u32) -> Box<dyn RandomSource + Send> {
        match self {
            RngKind::Mulberry32 => Box::new(Mulberry32::new(seed)),
            RngKind::Std => Box::new(RandAdapter::new(StdRng::seed_from_u64(seed as u64))),
        }
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngKind::Mulberry32 => f.write_str("mulberry32"),
            RngKind::Std => f.write_str("std"),
        }
    }
}

impl FromStr for RngKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mulberry32" | "mulberry" => Ok(RngKind::Mulberry32),
            "std" | "stdrng" => Ok(RngKind::Std),
            other => Err(format!("unknown rng '{other}' (expected mulberry32 | std)")),
        }
    }
}
