//! Counter-based Philox-4×32-10 streams.
//!
//! The state is a 128-bit counter and a deck holding the four output words of
//! one block-cipher evaluation. Draws consume the deck; an exhausted deck bumps
//! the counter by one. Jumping is plain counter arithmetic.

use std::fmt;

use rand_core::{impls, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::stream::Stream;

const MUL_0: u32 = 0xD251_1F53;
const MUL_1: u32 = 0xCD9E_8D57;
const WEYL_0: u32 = 0x9E37_79B9;
const WEYL_1: u32 = 0xBB67_AE85;
const ROUNDS: usize = 10;

/// Key used by every stream.
const KEY: [u32; 2] = [0, 0];

/// Words per deck.
const DECK_LEN: u32 = 4;

// 1 / 2^32
const NORM: f64 = 1.0 / 4_294_967_296.0;

#[inline]
fn round(ctr: [u32; 4], key: [u32; 2]) -> [u32; 4] {
    let p0 = u64::from(MUL_0) * u64::from(ctr[0]);
    let p1 = u64::from(MUL_1) * u64::from(ctr[2]);
    [
        (p1 >> 32) as u32 ^ ctr[1] ^ key[0],
        p1 as u32,
        (p0 >> 32) as u32 ^ ctr[3] ^ key[1],
        p0 as u32,
    ]
}

/// The Philox-4×32 block function with 10 rounds.
pub fn philox4x32(ctr: [u32; 4], key: [u32; 2]) -> [u32; 4] {
    let mut ctr = ctr;
    let mut key = key;
    for i in 0..ROUNDS {
        if i > 0 {
            key[0] = key[0].wrapping_add(WEYL_0);
            key[1] = key[1].wrapping_add(WEYL_1);
        }
        ctr = round(ctr, key);
    }
    ctr
}

/// One 64-bit half of the counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Half {
    pub msb: u32,
    pub lsb: u32,
}

/// 128-bit counter stored as 32-bit limbs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counter {
    pub hi: Half,
    pub lo: Half,
}

#[inline]
fn add_limb(a: u32, b: u32, carry: bool) -> (u32, bool) {
    let (sum, c1) = a.overflowing_add(b);
    let (sum, c2) = sum.overflowing_add(u32::from(carry));
    (sum, c1 || c2)
}

#[inline]
fn sub_limb(a: u32, b: u32, borrow: bool) -> (u32, bool) {
    let (diff, b1) = a.overflowing_sub(b);
    let (diff, b2) = diff.overflowing_sub(u32::from(borrow));
    (diff, b1 || b2)
}

impl Counter {
    pub const ZERO: Counter = Counter::from_u128(0);
    pub const ONE: Counter = Counter::from_u128(1);
    /// Distance between consecutive sub-streams, in counter blocks.
    pub const SUBSTREAM_STRIDE: Counter = Counter::from_u128(1 << 64);

    pub const fn from_u128(value: u128) -> Self {
        Self {
            hi: Half {
                msb: (value >> 96) as u32,
                lsb: (value >> 64) as u32,
            },
            lo: Half {
                msb: (value >> 32) as u32,
                lsb: value as u32,
            },
        }
    }

    pub const fn to_u128(self) -> u128 {
        (self.hi.msb as u128) << 96
            | (self.hi.lsb as u128) << 64
            | (self.lo.msb as u128) << 32
            | self.lo.lsb as u128
    }

    /// Limbs in block-cipher input order, least significant first.
    pub const fn words(self) -> [u32; 4] {
        [self.lo.lsb, self.lo.msb, self.hi.lsb, self.hi.msb]
    }

    const fn from_words(w: [u32; 4]) -> Self {
        Self {
            hi: Half { msb: w[3], lsb: w[2] },
            lo: Half { msb: w[1], lsb: w[0] },
        }
    }

    /// Sum modulo 2^128, carrying across all four limbs.
    pub fn wrapping_add(self, other: Counter) -> Counter {
        let (a, b) = (self.words(), other.words());
        let mut out = [0u32; 4];
        let mut carry = false;
        for i in 0..4 {
            (out[i], carry) = add_limb(a[i], b[i], carry);
        }
        Counter::from_words(out)
    }

    /// Difference modulo 2^128, borrowing across all four limbs.
    pub fn wrapping_sub(self, other: Counter) -> Counter {
        let (a, b) = (self.words(), other.words());
        let mut out = [0u32; 4];
        let mut borrow = false;
        for i in 0..4 {
            (out[i], borrow) = sub_limb(a[i], b[i], borrow);
        }
        Counter::from_words(out)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x} {:08x} {:08x} {:08x}",
            self.hi.msb, self.hi.lsb, self.lo.msb, self.lo.lsb
        )
    }
}

/// Counter, cached output block and position inside it.
///
/// Two states are equal when they sit at the same position of the sequence;
/// the deck is a cache derived from the counter and does not take part.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "PhiloxRecord")]
pub struct PhiloxState {
    pub ctr: Counter,
    pub deck: [u32; 4],
    pub deck_index: u32,
}

/// Serialized form of a Philox state, validated on the way in.
#[derive(Deserialize)]
struct PhiloxRecord {
    ctr: Counter,
    deck: [u32; 4],
    deck_index: u32,
}

impl TryFrom<PhiloxRecord> for PhiloxState {
    type Error = Error;

    fn try_from(record: PhiloxRecord) -> Result<Self> {
        let state = PhiloxState {
            ctr: record.ctr,
            deck: record.deck,
            deck_index: record.deck_index,
        };
        Philox432::validate_seed(&state)?;
        Ok(state)
    }
}

impl PartialEq for PhiloxState {
    fn eq(&self, other: &Self) -> bool {
        self.ctr == other.ctr && self.deck_index == other.deck_index
    }
}

impl Eq for PhiloxState {}

impl PhiloxState {
    /// State at draw `deck_index` of block `ctr`, with its deck filled.
    pub fn at(ctr: Counter, deck_index: u32) -> Self {
        let mut state = Self {
            ctr,
            deck: [0; 4],
            deck_index,
        };
        state.generate_deck();
        state
    }

    /// Fill the deck from the current counter, words in reverse order.
    pub fn generate_deck(&mut self) {
        let r = philox4x32(self.ctr.words(), KEY);
        self.deck = [r[3], r[2], r[1], r[0]];
    }
}

impl fmt::Display for PhiloxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ctr = {}, deck_index = {} }}", self.ctr, self.deck_index)
    }
}

/// Signed offset in draws, reduced modulo `4 * 2^128`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterJump {
    /// Whole deck blocks.
    pub blocks: Counter,
    /// Remaining draws, in `[0, 4)`.
    pub draws: u32,
}

impl CounterJump {
    pub const fn blocks(blocks: u128) -> Self {
        Self {
            blocks: Counter::from_u128(blocks),
            draws: 0,
        }
    }

    fn from_draws(draws: u128) -> Self {
        Self {
            blocks: Counter::from_u128(draws / u128::from(DECK_LEN)),
            draws: (draws % u128::from(DECK_LEN)) as u32,
        }
    }

    /// Jump of `2^log2` draws.
    fn pow2(log2: u32) -> Self {
        match log2 {
            0 | 1 => Self::from_draws(1 << log2),
            2..=129 => Self::blocks(1 << (log2 - 2)),
            _ => Self::default(),
        }
    }

    fn negated(self) -> Self {
        if self.draws == 0 {
            Self {
                blocks: Counter::ZERO.wrapping_sub(self.blocks),
                draws: 0,
            }
        } else {
            Self {
                blocks: Counter::ZERO.wrapping_sub(self.blocks).wrapping_sub(Counter::ONE),
                draws: DECK_LEN - self.draws,
            }
        }
    }

    fn combine(self, other: Self) -> Self {
        let draws = self.draws + other.draws;
        let mut blocks = self.blocks.wrapping_add(other.blocks);
        if draws >= DECK_LEN {
            blocks = blocks.wrapping_add(Counter::ONE);
        }
        Self {
            blocks,
            draws: draws % DECK_LEN,
        }
    }
}

/// The Philox-4×32-10 counter generator with a zero key.
///
/// Streams are `2^100` counter blocks apart by default and sub-streams
/// `2^64`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Philox432;

impl Generator for Philox432 {
    type State = PhiloxState;
    type Jump = CounterJump;

    const NAME: &'static str = "philox432";

    const DEFAULT_SEED: PhiloxState = PhiloxState {
        ctr: Counter::ZERO,
        deck: [0; 4],
        deck_index: 0,
    };

    const DEFAULT_SPACING: CounterJump = CounterJump::blocks(1 << 100);

    #[inline]
    fn next_state(state: &mut PhiloxState) -> u32 {
        if state.deck_index == 0 {
            state.generate_deck();
        }

        let result = state.deck[state.deck_index as usize];
        state.deck_index += 1;

        if state.deck_index == DECK_LEN {
            state.ctr = state.ctr.wrapping_add(Counter::ONE);
            state.deck_index = 0;
            state.generate_deck();
        }

        result
    }

    #[inline]
    fn unit(value: u32) -> f64 {
        (f64::from(value) + 0.5) * NORM
    }

    fn validate_seed(seed: &PhiloxState) -> Result<()> {
        if seed.deck_index >= DECK_LEN {
            return Err(Error::InvalidSeed(format!(
                "seed.deck_index = {} >= {DECK_LEN}",
                seed.deck_index
            )));
        }
        if seed.deck_index != 0 && seed.deck != PhiloxState::at(seed.ctr, 0).deck {
            return Err(Error::InvalidSeed(
                "seed.deck does not match seed.ctr".to_string(),
            ));
        }
        Ok(())
    }

    fn jump(e: i32, c: i32) -> CounterJump {
        let mut jump = CounterJump::from_draws(u128::from(c.unsigned_abs()));
        if c < 0 {
            jump = jump.negated();
        }
        if e != 0 {
            let pow = CounterJump::pow2(e.unsigned_abs());
            jump = jump.combine(if e > 0 { pow } else { pow.negated() });
        }
        jump
    }

    fn spacing(e: i32, c: i32) -> Result<CounterJump> {
        if e < 0 {
            return Err(Error::InvalidValue(
                "change_spacing(): e must be >= 0".to_string(),
            ));
        }
        let jump = Self::jump(e, c);
        if jump.draws != 0 {
            return Err(Error::InvalidValue(format!(
                "change_spacing(): 2^e + c must be a multiple of {DECK_LEN} draws"
            )));
        }
        Ok(jump)
    }

    fn apply_jump(jump: &CounterJump, state: &mut PhiloxState) {
        let index = state.deck_index + jump.draws;
        let mut ctr = state.ctr.wrapping_add(jump.blocks);
        if index >= DECK_LEN {
            ctr = ctr.wrapping_add(Counter::ONE);
        }
        *state = PhiloxState::at(ctr, index % DECK_LEN);
    }

    fn next_substream(marker: &mut PhiloxState) {
        marker.ctr = marker.ctr.wrapping_add(Counter::SUBSTREAM_STRIDE);
        marker.generate_deck();
    }

    fn seed_candidate<R: RngCore>(rng: &mut R) -> PhiloxState {
        let words = [rng.next_u32(), rng.next_u32(), rng.next_u32(), rng.next_u32()];
        PhiloxState {
            ctr: Counter::from_words(words),
            deck: [0; 4],
            deck_index: 0,
        }
    }
}

/// The raw Philox output is a uniformly distributed 32-bit word, so a
/// Philox stream can drive anything in the `rand` ecosystem.
impl RngCore for Stream<Philox432> {
    fn next_u32(&mut self) -> u32 {
        Stream::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
