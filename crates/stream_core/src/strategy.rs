//! `proptest` strategies producing valid generator states.

use proptest::prelude::*;

use crate::lfsr113::Lfsr113State;
use crate::mrg::{CombinedMrg, MrgState};
use crate::philox::{Counter, PhiloxState};

/// Any state accepted by `R`'s seed validation.
pub fn mrg_state<R: CombinedMrg>() -> impl Strategy<Value = MrgState> {
    let g1 = prop::array::uniform3(0..R::M1).prop_filter("g1 all zero", |v| *v != [0; 3]);
    let g2 = prop::array::uniform3(0..R::M2).prop_filter("g2 all zero", |v| *v != [0; 3]);
    (g1, g2).prop_map(|(g1, g2)| MrgState::new(g1, g2))
}

/// Any state with a live bit in every component.
pub fn lfsr113_state() -> impl Strategy<Value = Lfsr113State> {
    (2u32.., 8u32.., 16u32.., 128u32..).prop_map(|(a, b, c, d)| Lfsr113State::new([a, b, c, d]))
}

/// Any draw-ready Philox state.
pub fn philox_state() -> impl Strategy<Value = PhiloxState> {
    (any::<u128>(), 0u32..4)
        .prop_map(|(ctr, index)| PhiloxState::at(Counter::from_u128(ctr), index))
}
