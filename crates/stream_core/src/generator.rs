//! Per-family generator contract and output precision.
//!
//! A [`Generator`] is a zero-sized marker describing one generator family:
//! its state layout, its scalar transition, and how it jumps. Streams and
//! creators are generic over it, so every family shares one lifecycle
//! implementation.

use std::fmt::{Debug, Display};
use std::ops::{Add, Mul};

use rand_core::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub trait Generator: Copy + Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Full internal state at one instant.
    type State: Copy + Debug + Display + PartialEq + Send + Sync + Serialize + DeserializeOwned;

    /// A precomputed offset in the generator's sequence, applied in one step.
    type Jump: Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned;

    const NAME: &'static str;

    /// Seed of the canonical default creator.
    const DEFAULT_SEED: Self::State;

    /// Distance between consecutive streams minted by the default creator.
    const DEFAULT_SPACING: Self::Jump;

    /// Advance `state` by one step and return the raw output word.
    ///
    /// `state` must have passed [`Generator::validate_seed`] or been reached
    /// from such a state.
    fn next_state(state: &mut Self::State) -> u32;

    /// Map a raw output word into the open interval `(0, 1)`.
    fn unit(value: u32) -> f64;

    fn validate_seed(seed: &Self::State) -> Result<()>;

    /// Offset of `2^e + c` steps (`-2^|e| + c` for negative `e`, `c` steps
    /// when `e == 0`).
    fn jump(e: i32, c: i32) -> Self::Jump;

    /// Offset used by a creator between consecutive minted streams.
    fn spacing(e: i32, c: i32) -> Result<Self::Jump> {
        if e < 0 {
            return Err(Error::InvalidValue(
                "change_spacing(): e must be >= 0".to_string(),
            ));
        }
        Ok(Self::jump(e, c))
    }

    fn apply_jump(jump: &Self::Jump, state: &mut Self::State);

    /// Move a sub-stream marker to the start of the next sub-stream.
    fn next_substream(marker: &mut Self::State);

    /// Draw a seed candidate from an arbitrary bit source. The candidate is
    /// not guaranteed to pass [`Generator::validate_seed`].
    fn seed_candidate<R: RngCore>(rng: &mut R) -> Self::State;
}

/// Floating-point precision a draw is produced in.
pub trait UnitFloat:
    Copy
    + Debug
    + Default
    + PartialOrd
    + Add<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Convert a double-precision draw, keeping it strictly inside `(0, 1)`.
    fn from_unit(u: f64) -> Self;

    fn to_f64(self) -> f64;

    /// Nearest value of this precision, unclamped.
    fn from_f64(v: f64) -> Self;

    /// `floor(span * self)` clamped to `[0, span)`.
    fn scale_floor(self, span: i64) -> i64;

    /// Box–Muller transform of two uniforms into two standard normals.
    fn box_muller(u1: Self, u2: Self) -> (Self, Self);
}

impl UnitFloat for f64 {
    #[inline]
    fn from_unit(u: f64) -> Self {
        u
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn scale_floor(self, span: i64) -> i64 {
        ((span as f64 * self) as i64).min(span - 1)
    }

    fn box_muller(u1: Self, u2: Self) -> (Self, Self) {
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        (radius * theta.cos(), radius * theta.sin())
    }
}

impl UnitFloat for f32 {
    #[inline]
    fn from_unit(u: f64) -> Self {
        // Rounding to single precision can land on 1.0.
        const BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;
        let v = u as f32;
        if v >= 1.0 {
            BELOW_ONE
        } else {
            v
        }
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn scale_floor(self, span: i64) -> i64 {
        ((span as f32 * self) as i64).min(span - 1)
    }

    fn box_muller(u1: Self, u2: Self) -> (Self, Self) {
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f32::consts::PI * u2;
        (radius * theta.cos(), radius * theta.sin())
    }
}
