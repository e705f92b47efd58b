use crate::modular::Matrix3;

use super::{CombinedMrg, MrgJump, MrgState};

/// L'Ecuyer and Touzin's MRG31k3p.
///
/// Streams are `2^134` steps apart by default and sub-streams `2^72`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mrg31k3p;

const M1: u32 = 2_147_483_647; // 2^31 - 1
const M2: u32 = 2_147_462_579; // 2^31 - 21069

impl CombinedMrg for Mrg31k3p {
    const ID: &'static str = "mrg31k3p";
    const M1: u32 = M1;
    const M2: u32 = M2;

    const A1: Matrix3 = [[0, 4_194_304, 129], [1, 0, 0], [0, 1, 0]];
    const A2: Matrix3 = [[32_768, 0, 32_769], [1, 0, 0], [0, 1, 0]];

    const INV_A1: Matrix3 = [[0, 1, 0], [0, 0, 1], [1_531_538_725, 0, 915_561_289]];
    const INV_A2: Matrix3 = [[0, 1, 0], [0, 0, 1], [252_696_625, 252_696_624, 0]];

    // 1 / 2^31
    const NORM: f64 = 4.656_612_873_077_392_578_125e-10;

    const SUBSTREAM_JUMP: MrgJump = MrgJump::forward_log2::<Self>(72);
    const CREATOR_SPACING: MrgJump = MrgJump::forward_log2::<Self>(134);

    #[inline]
    fn step(state: &mut MrgState) -> u32 {
        let g1 = &mut state.g1;
        let y1 = ((u64::from(g1[1]) << 22) + 129 * u64::from(g1[2])) % u64::from(M1);
        g1[2] = g1[1];
        g1[1] = g1[0];
        g1[0] = y1 as u32;

        let g2 = &mut state.g2;
        let y2 = ((u64::from(g2[0]) << 15) + 32_769 * u64::from(g2[2])) % u64::from(M2);
        g2[2] = g2[1];
        g2[1] = g2[0];
        g2[0] = y2 as u32;

        let (x1, x2) = (state.g1[0], state.g2[0]);
        if x1 <= x2 {
            x1 + (M1 - x2)
        } else {
            x1 - x2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;

    #[test]
    fn default_spacing_matches_published_jump_matrices() {
        let published = MrgJump {
            a1: [
                [1_702_500_920, 1_849_582_496, 1_656_874_625],
                [828_554_832, 1_702_500_920, 1_512_419_905],
                [1_143_731_069, 828_554_832, 102_237_247],
            ],
            a2: [
                [796_789_021, 1_464_208_080, 607_337_906],
                [1_241_679_051, 1_431_130_166, 1_464_208_080],
                [1_401_213_391, 1_178_684_362, 1_431_130_166],
            ],
        };
        assert_eq!(Mrg31k3p::DEFAULT_SPACING, published);
    }

    #[test]
    fn outputs_cover_the_open_unit_interval() {
        let mut state = Mrg31k3p::DEFAULT_SEED;
        for _ in 0..10_000 {
            let raw = Mrg31k3p::step(&mut state);
            assert!((1..=M1).contains(&raw));
            let u = Mrg31k3p::unit(raw);
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn equal_components_output_the_modulus() {
        // g1 and g2 both step to 0 from an all-zero history, so x1 == x2.
        let mut state = MrgState::new([5, 0, 0], [0, 0, 0]);
        assert_eq!(Mrg31k3p::step(&mut state), M1);
    }
}
