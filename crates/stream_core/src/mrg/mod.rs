//! Combined multiple-recursive generators.
//!
//! Each generator combines two order-3 linear recurrences modulo distinct
//! primes `M1` and `M2`. One step of a component is the product of its
//! transition matrix with the state vector, so any offset in the sequence is
//! a matrix power applied with [`mat_vec`]. The per-draw transition is
//! specialised per generator; jumps go through the shared engine in
//! [`crate::modular`].

mod mrg31k3p;
mod mrg32k3a;

use std::fmt;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::modular::{mat_mat, mat_pow, mat_pow_log2, mat_vec, Matrix3, Vector3};

pub use mrg31k3p::Mrg31k3p;
pub use mrg32k3a::Mrg32k3a;

/// State of a combined recurrence: one vector per component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MrgState {
    pub g1: Vector3,
    pub g2: Vector3,
}

impl MrgState {
    pub const fn new(g1: Vector3, g2: Vector3) -> Self {
        Self { g1, g2 }
    }

    /// State with every component equal to `value`.
    pub const fn splat(value: u32) -> Self {
        Self {
            g1: [value; 3],
            g2: [value; 3],
        }
    }
}

impl fmt::Display for MrgState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.g1;
        let [d, e, g] = self.g2;
        write!(f, "{{ {a}, {b}, {c}, {d}, {e}, {g} }}")
    }
}

/// A pair of transform matrices, one per component modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrgJump {
    pub a1: Matrix3,
    pub a2: Matrix3,
}

impl MrgJump {
    /// Jump of `2^e` steps along the forward recurrence.
    pub const fn forward_log2<R: CombinedMrg>(e: u32) -> Self {
        Self {
            a1: mat_pow_log2(&R::A1, e, R::M1),
            a2: mat_pow_log2(&R::A2, e, R::M2),
        }
    }
}

/// Constants and scalar transition of one combined recurrence.
pub trait CombinedMrg: Copy + fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    const ID: &'static str;
    const M1: u32;
    const M2: u32;
    /// One-step transition matrices.
    const A1: Matrix3;
    const A2: Matrix3;
    /// Inverses of `A1`/`A2`, stepping back by one.
    const INV_A1: Matrix3;
    const INV_A2: Matrix3;
    /// Output scale mapping a raw draw into `(0, 1)`.
    const NORM: f64;
    /// Distance between consecutive sub-streams of a stream.
    const SUBSTREAM_JUMP: MrgJump;
    /// Distance between consecutive streams of the default creator.
    const CREATOR_SPACING: MrgJump;
    const CREATOR_SEED: MrgState = MrgState::splat(12345);

    /// Advance both components one step and return the combined output.
    fn step(state: &mut MrgState) -> u32;
}

fn transform<R: CombinedMrg>(e: i32, c: i32) -> MrgJump {
    let magnitude = u64::from(c.unsigned_abs());
    let (b1, b2) = if c >= 0 {
        (R::A1, R::A2)
    } else {
        (R::INV_A1, R::INV_A2)
    };
    let mut a1 = mat_pow(&b1, magnitude, R::M1);
    let mut a2 = mat_pow(&b2, magnitude, R::M2);

    // e == 0 adds no power-of-two term at all.
    if e != 0 {
        let (p1, p2) = if e > 0 {
            (R::A1, R::A2)
        } else {
            (R::INV_A1, R::INV_A2)
        };
        let log2 = e.unsigned_abs();
        a1 = mat_mat(&mat_pow_log2(&p1, log2, R::M1), &a1, R::M1);
        a2 = mat_mat(&mat_pow_log2(&p2, log2, R::M2), &a2, R::M2);
    }

    MrgJump { a1, a2 }
}

impl<R: CombinedMrg> Generator for R {
    type State = MrgState;
    type Jump = MrgJump;

    const NAME: &'static str = R::ID;
    const DEFAULT_SEED: MrgState = R::CREATOR_SEED;
    const DEFAULT_SPACING: MrgJump = R::CREATOR_SPACING;

    #[inline]
    fn next_state(state: &mut MrgState) -> u32 {
        R::step(state)
    }

    #[inline]
    fn unit(value: u32) -> f64 {
        f64::from(value) * R::NORM
    }

    fn validate_seed(seed: &MrgState) -> Result<()> {
        // Range checks on both vectors run before the all-zero checks.
        if let Some(i) = seed.g1.iter().position(|&v| v >= R::M1) {
            return Err(Error::InvalidSeed(format!("seed.g1[{i}] >= {}_M1", R::ID)));
        }
        if let Some(i) = seed.g2.iter().position(|&v| v >= R::M2) {
            return Err(Error::InvalidSeed(format!("seed.g2[{i}] >= {}_M2", R::ID)));
        }
        if seed.g1 == [0; 3] {
            return Err(Error::InvalidSeed("seed.g1 = (0,0,0)".to_string()));
        }
        if seed.g2 == [0; 3] {
            return Err(Error::InvalidSeed("seed.g2 = (0,0,0)".to_string()));
        }
        Ok(())
    }

    fn jump(e: i32, c: i32) -> MrgJump {
        transform::<R>(e, c)
    }

    fn apply_jump(jump: &MrgJump, state: &mut MrgState) {
        state.g1 = mat_vec(&jump.a1, &state.g1, R::M1);
        state.g2 = mat_vec(&jump.a2, &state.g2, R::M2);
    }

    fn next_substream(marker: &mut MrgState) {
        Self::apply_jump(&R::SUBSTREAM_JUMP, marker);
    }

    fn seed_candidate<G: RngCore>(rng: &mut G) -> MrgState {
        let mut draw = |m: u32| [rng.next_u32() % m, rng.next_u32() % m, rng.next_u32() % m];
        let g1 = draw(R::M1);
        let g2 = draw(R::M2);
        MrgState { g1, g2 }
    }
}
