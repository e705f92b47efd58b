use crate::modular::{inv_mod, neg_mul_mod, Matrix3};

use super::{CombinedMrg, MrgJump, MrgState};

/// L'Ecuyer's MRG32k3a.
///
/// Streams are `2^127` steps apart by default and sub-streams `2^76`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mrg32k3a;

const M1: u32 = 4_294_967_087; // 2^32 - 209
const M2: u32 = 4_294_944_443; // 2^32 - 22853

const A12: i64 = 1_403_580;
const A13N: i64 = 810_728;
const A21: i64 = 527_612;
const A23N: i64 = 1_370_589;

impl CombinedMrg for Mrg32k3a {
    const ID: &'static str = "mrg32k3a";
    const M1: u32 = M1;
    const M2: u32 = M2;

    const A1: Matrix3 = [[0, 1, 0], [0, 0, 1], [M1 - A13N as u32, A12 as u32, 0]];
    const A2: Matrix3 = [[0, 1, 0], [0, 0, 1], [M2 - A23N as u32, 0, A21 as u32]];

    const INV_A1: Matrix3 = {
        let inv = inv_mod(M1 - A13N as u32, M1);
        [[neg_mul_mod(A12 as u32, inv, M1), 0, inv], [1, 0, 0], [0, 1, 0]]
    };
    const INV_A2: Matrix3 = {
        let inv = inv_mod(M2 - A23N as u32, M2);
        [[0, neg_mul_mod(A21 as u32, inv, M2), inv], [1, 0, 0], [0, 1, 0]]
    };

    // 1 / (M1 + 1)
    const NORM: f64 = 2.328_306_549_295_727_688e-10;

    const SUBSTREAM_JUMP: MrgJump = MrgJump::forward_log2::<Self>(76);
    const CREATOR_SPACING: MrgJump = MrgJump::forward_log2::<Self>(127);

    #[inline]
    fn step(state: &mut MrgState) -> u32 {
        let g1 = &mut state.g1;
        let p1 = (A12 * i64::from(g1[1]) - A13N * i64::from(g1[0])).rem_euclid(i64::from(M1));
        g1[0] = g1[1];
        g1[1] = g1[2];
        g1[2] = p1 as u32;

        let g2 = &mut state.g2;
        let p2 = (A21 * i64::from(g2[2]) - A23N * i64::from(g2[0])).rem_euclid(i64::from(M2));
        g2[0] = g2[1];
        g2[1] = g2[2];
        g2[2] = p2 as u32;

        if p1 > p2 {
            (p1 - p2) as u32
        } else {
            (p1 - p2 + i64::from(M1)) as u32
        }
    }
}
