//! L'Ecuyer's combined Tausworthe generator LFSR113.
//!
//! Four components, each a linear recurrence over GF(2) acting on one 32-bit
//! word. A component step is a 32×32 bit matrix, so any offset is a matrix
//! power. Component `j` cycles with period `2^k_j - 1` over the bits kept by
//! its mask, which lets every signed offset reduce to a forward one.

use std::fmt;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generator::Generator;

// 1 / 2^32
const NORM: f64 = 1.0 / 4_294_967_296.0;

/// Shift parameters of one component.
struct Component {
    q: u32,
    s: u32,
    r: u32,
    mask: u32,
}

impl Component {
    #[inline]
    const fn step(&self, z: u32) -> u32 {
        let b = ((z << self.q) ^ z) >> self.s;
        ((z & self.mask) << self.r) ^ b
    }

    /// Bits of the word that feed the recurrence.
    const fn degree(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Smallest word with a live bit set.
    const fn min_seed(&self) -> u32 {
        !self.mask + 1
    }
}

const COMPONENTS: [Component; 4] = [
    Component { q: 6, s: 13, r: 18, mask: 0xFFFF_FFFE },
    Component { q: 2, s: 27, r: 2, mask: 0xFFFF_FFF8 },
    Component { q: 13, s: 21, r: 7, mask: 0xFFFF_FFF0 },
    Component { q: 3, s: 12, r: 13, mask: 0xFFFF_FF80 },
];

/// Linear map on 32-bit words; column `i` is the image of bit `i`.
type BitMatrix = [u32; 32];

#[inline]
fn bit_apply(m: &BitMatrix, z: u32) -> u32 {
    let mut out = 0;
    let mut bits = z;
    while bits != 0 {
        out ^= m[bits.trailing_zeros() as usize];
        bits &= bits - 1;
    }
    out
}

fn bit_square(m: &BitMatrix) -> BitMatrix {
    let mut out = [0; 32];
    for (col, src) in out.iter_mut().zip(m) {
        *col = bit_apply(m, *src);
    }
    out
}

fn step_matrix(component: &Component) -> BitMatrix {
    let mut m = [0; 32];
    for (i, col) in m.iter_mut().enumerate() {
        *col = component.step(1 << i);
    }
    m
}

/// `z` moved `steps` steps along `component`.
fn advance(component: &Component, z: u32, steps: u32) -> u32 {
    let mut power = step_matrix(component);
    let mut z = z;
    let mut n = steps;
    while n != 0 {
        if n & 1 == 1 {
            z = bit_apply(&power, z);
        }
        n >>= 1;
        if n != 0 {
            power = bit_square(&power);
        }
    }
    z
}

/// The four component words.
///
/// Two states are equal when their live bits agree; the bits below each
/// component's mask never feed the recurrence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Lfsr113State {
    pub z: [u32; 4],
}

impl Lfsr113State {
    pub const fn new(z: [u32; 4]) -> Self {
        Self { z }
    }
}

impl PartialEq for Lfsr113State {
    fn eq(&self, other: &Self) -> bool {
        COMPONENTS
            .iter()
            .zip(self.z.iter().zip(&other.z))
            .all(|(c, (a, b))| a & c.mask == b & c.mask)
    }
}

impl Eq for Lfsr113State {}

impl fmt::Display for Lfsr113State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.z;
        write!(f, "{{ {a}, {b}, {c}, {d} }}")
    }
}

/// Forward step count of each component, reduced modulo its period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lfsr113Jump {
    pub steps: [u32; 4],
}

impl Lfsr113Jump {
    /// Offset of `2^e + c` steps (`-2^|e| + c` for negative `e`, `c` steps
    /// when `e == 0`).
    pub const fn new(e: i32, c: i32) -> Self {
        let mut steps = [0u32; 4];
        let mut j = 0;
        while j < 4 {
            let degree = COMPONENTS[j].degree();
            let period = (1i128 << degree) - 1;
            let mut n = c as i128;
            if e != 0 {
                // 2^degree = 1 modulo the period.
                let pow = 1i128 << (e.unsigned_abs() % degree);
                n += if e > 0 { pow } else { -pow };
            }
            steps[j] = n.rem_euclid(period) as u32;
            j += 1;
        }
        Self { steps }
    }
}

/// The combined Tausworthe generator LFSR113.
///
/// Streams are `2^100` steps apart by default and sub-streams `2^55`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Lfsr113;

impl Lfsr113 {
    pub const SUBSTREAM_JUMP: Lfsr113Jump = Lfsr113Jump::new(55, 0);
}

impl Generator for Lfsr113 {
    type State = Lfsr113State;
    type Jump = Lfsr113Jump;

    const NAME: &'static str = "lfsr113";

    const DEFAULT_SEED: Lfsr113State = Lfsr113State::new([987_654_321; 4]);

    const DEFAULT_SPACING: Lfsr113Jump = Lfsr113Jump::new(100, 0);

    #[inline]
    fn next_state(state: &mut Lfsr113State) -> u32 {
        let mut out = 0;
        for (z, component) in state.z.iter_mut().zip(&COMPONENTS) {
            *z = component.step(*z);
            out ^= *z;
        }
        out
    }

    #[inline]
    fn unit(value: u32) -> f64 {
        (f64::from(value) + 0.5) * NORM
    }

    fn validate_seed(seed: &Lfsr113State) -> Result<()> {
        for (i, (z, component)) in seed.z.iter().zip(&COMPONENTS).enumerate() {
            if *z < component.min_seed() {
                return Err(Error::InvalidSeed(format!(
                    "seed.z[{i}] < {}",
                    component.min_seed()
                )));
            }
        }
        Ok(())
    }

    fn jump(e: i32, c: i32) -> Lfsr113Jump {
        Lfsr113Jump::new(e, c)
    }

    fn apply_jump(jump: &Lfsr113Jump, state: &mut Lfsr113State) {
        for ((z, component), steps) in state.z.iter_mut().zip(&COMPONENTS).zip(jump.steps) {
            *z = advance(component, *z, steps);
        }
    }

    fn next_substream(marker: &mut Lfsr113State) {
        Self::apply_jump(&Self::SUBSTREAM_JUMP, marker);
    }

    fn seed_candidate<R: RngCore>(rng: &mut R) -> Lfsr113State {
        Lfsr113State::new([rng.next_u32(), rng.next_u32(), rng.next_u32(), rng.next_u32()])
    }
}
