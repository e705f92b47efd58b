//! Stream creators.
//!
//! A [`StreamCreator`] mints streams from a base seed, each one `spacing`
//! steps after the previous. The canonical creator of every family is the
//! constant [`StreamCreator::DEFAULT`]; callers clone it into an instance they
//! own before changing anything.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{alloc_buffer, Error, Result};
use crate::generator::Generator;
use crate::stream::Stream;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StreamCreator<G: Generator> {
    initial_state: G::State,
    next_state: G::State,
    spacing: G::Jump,
}

impl<G: Generator> StreamCreator<G> {
    /// The family's canonical creator. It has no owner and is never mutated.
    pub const DEFAULT: Self = Self {
        initial_state: G::DEFAULT_SEED,
        next_state: G::DEFAULT_SEED,
        spacing: G::DEFAULT_SPACING,
    };

    /// A creator with default spacing starting from `seed`.
    pub fn with_seed(seed: G::State) -> Result<Self> {
        G::validate_seed(&seed)?;
        Ok(Self {
            initial_state: seed,
            next_state: seed,
            spacing: G::DEFAULT_SPACING,
        })
    }

    /// Clone `source`, or the default creator when `None`.
    pub fn copy_from(source: Option<&Self>) -> Self {
        source.cloned().unwrap_or(Self::DEFAULT)
    }

    pub fn initial_state(&self) -> &G::State {
        &self.initial_state
    }

    pub fn next_state(&self) -> &G::State {
        &self.next_state
    }

    pub fn spacing(&self) -> &G::Jump {
        &self.spacing
    }

    /// Start minting again from the base seed.
    pub fn rewind(&mut self) {
        self.next_state = self.initial_state;
        debug!(generator = G::NAME, "rewound stream creator");
    }

    /// Install a new base seed and rewind to it.
    pub fn set_base_state(&mut self, seed: G::State) -> Result<()> {
        G::validate_seed(&seed)?;
        self.initial_state = seed;
        self.next_state = seed;
        debug!(generator = G::NAME, %seed, "set base creator state");
        Ok(())
    }

    /// Space subsequently minted streams `2^e + c` steps apart.
    pub fn change_spacing(&mut self, e: i32, c: i32) -> Result<()> {
        self.spacing = G::spacing(e, c)?;
        debug!(generator = G::NAME, e, c, "changed stream spacing");
        Ok(())
    }

    /// Mint one stream at `next_state` and move `next_state` on.
    pub fn create_stream(&mut self) -> Stream<G> {
        let stream = Stream::starting_at(self.next_state);
        G::apply_jump(&self.spacing, &mut self.next_state);
        stream
    }

    pub fn create_streams(&mut self, count: usize) -> Result<Vec<Stream<G>>> {
        let mut streams = alloc_buffer(count, "create_streams")?;
        for _ in 0..count {
            streams.push(self.create_stream());
        }
        trace!(generator = G::NAME, count, "created streams");
        Ok(streams)
    }

    /// Mint one stream into each slot of an existing buffer.
    pub fn create_over_streams(&mut self, streams: &mut [Stream<G>]) {
        for slot in streams.iter_mut() {
            *slot = self.create_stream();
        }
        trace!(generator = G::NAME, count = streams.len(), "created streams in place");
    }
}

impl<G: Generator> Default for StreamCreator<G> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Set the base state of `creator`; `None` names the default creator and is
/// rejected.
pub fn set_base_creator_state<G: Generator>(
    creator: Option<&mut StreamCreator<G>>,
    seed: G::State,
) -> Result<()> {
    match creator {
        Some(creator) => creator.set_base_state(seed),
        None => Err(Error::InvalidStreamCreator(
            "set_base_creator_state(): modifying the default stream creator is forbidden"
                .to_string(),
        )),
    }
}

/// Change the spacing of `creator`; `None` names the default creator and is
/// rejected.
pub fn change_streams_spacing<G: Generator>(
    creator: Option<&mut StreamCreator<G>>,
    e: i32,
    c: i32,
) -> Result<()> {
    match creator {
        Some(creator) => creator.change_spacing(e, c),
        None => Err(Error::InvalidStreamCreator(
            "change_streams_spacing(): modifying the default stream creator is forbidden"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;
    use crate::mrg::{MrgState, Mrg31k3p, Mrg32k3a};
    use crate::philox::{Counter, Philox432, PhiloxState};

    #[test]
    fn consecutive_streams_are_one_spacing_apart() {
        let mut creator = StreamCreator::<Mrg31k3p>::default();
        let streams = creator.create_streams(3).unwrap();
        let mut expected = Mrg31k3p::DEFAULT_SEED;
        for stream in &streams {
            assert_eq!(stream.initial(), &expected);
            assert_eq!(stream.current(), &expected);
            assert_eq!(stream.substream(), &expected);
            Mrg31k3p::apply_jump(&Mrg31k3p::DEFAULT_SPACING, &mut expected);
        }
        assert_eq!(creator.next_state(), &expected);
    }

    #[test]
    fn rewound_creator_mints_the_same_streams() {
        let mut creator = StreamCreator::<Mrg32k3a>::DEFAULT;
        let first = creator.create_streams(10).unwrap();
        creator.rewind();
        let second = creator.create_streams(10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn create_over_streams_matches_allocating_variant() {
        let mut a = StreamCreator::<Philox432>::DEFAULT;
        let mut b = a.clone();
        let allocated = a.create_streams(5).unwrap();
        let mut buffer = vec![Stream::from_state(Philox432::DEFAULT_SEED).unwrap(); 5];
        b.create_over_streams(&mut buffer);
        assert_eq!(allocated, buffer);
        assert_eq!(a, b);
    }

    #[test]
    fn philox_default_streams_are_two_to_the_100_blocks_apart() {
        let mut creator = StreamCreator::<Philox432>::DEFAULT;
        let streams = creator.create_streams(3).unwrap();
        for (k, stream) in streams.iter().enumerate() {
            let ctr = stream.initial().ctr.to_u128();
            assert_eq!(ctr, (k as u128) << 100);
        }
    }

    #[test]
    fn set_base_state_validates_before_mutating() {
        let mut creator = StreamCreator::<Mrg31k3p>::DEFAULT;
        let bad = MrgState::new([0; 3], [1; 3]);
        let err = creator.set_base_state(bad).unwrap_err();
        assert_eq!(err.status(), Status::InvalidSeed);
        assert_eq!(creator, StreamCreator::<Mrg31k3p>::DEFAULT);

        let good = MrgState::new([1, 2, 3], [4, 5, 6]);
        creator.create_stream();
        creator.set_base_state(good).unwrap();
        assert_eq!(creator.initial_state(), &good);
        assert_eq!(creator.next_state(), &good);
    }

    #[test]
    fn negative_spacing_exponent_is_rejected() {
        let mut creator = StreamCreator::<Mrg32k3a>::DEFAULT;
        let err = creator.change_spacing(-1, 0).unwrap_err();
        assert_eq!(err.status(), Status::InvalidValue);
        assert_eq!(creator.spacing(), &Mrg32k3a::DEFAULT_SPACING);
    }

    #[test]
    fn changed_spacing_applies_to_later_streams() {
        let mut creator = StreamCreator::<Mrg31k3p>::DEFAULT;
        creator.change_spacing(3, 2).unwrap();
        let streams = creator.create_streams(2).unwrap();
        let mut replay = streams[0].clone();
        for _ in 0..10 {
            replay.next_u32();
        }
        assert_eq!(replay.current(), streams[1].initial());
    }

    #[test]
    fn philox_spacing_must_be_whole_blocks() {
        let mut creator = StreamCreator::<Philox432>::DEFAULT;
        assert!(creator.change_spacing(2, 1).is_err());
        creator.change_spacing(2, 4).unwrap();
        let streams = creator.create_streams(2).unwrap();
        assert_eq!(streams[1].initial(), &PhiloxState::at(Counter::from_u128(2), 0));
    }

    #[test]
    fn default_creator_cannot_be_modified() {
        let err = set_base_creator_state::<Mrg31k3p>(None, MrgState::splat(7)).unwrap_err();
        assert_eq!(err.status(), Status::InvalidStreamCreator);
        assert!(err.message().starts_with("set_base_creator_state()"));

        let err = change_streams_spacing::<Philox432>(None, 4, 0).unwrap_err();
        assert_eq!(err.status(), Status::InvalidStreamCreator);

        let mut creator = StreamCreator::<Mrg31k3p>::copy_from(None);
        assert_eq!(creator, StreamCreator::<Mrg31k3p>::DEFAULT);
        set_base_creator_state(Some(&mut creator), MrgState::splat(7)).unwrap();
        assert_ne!(creator, StreamCreator::<Mrg31k3p>::DEFAULT);
    }

    #[test]
    fn copy_from_clones_the_source() {
        let mut source = StreamCreator::<Mrg32k3a>::with_seed(MrgState::splat(99)).unwrap();
        source.create_stream();
        let copy = StreamCreator::copy_from(Some(&source));
        assert_eq!(copy, source);
    }

    #[test]
    fn creator_position_survives_json() {
        let mut creator = StreamCreator::<Mrg31k3p>::DEFAULT;
        creator.create_streams(4).unwrap();
        let json = serde_json::to_string(&creator).unwrap();
        let mut back: StreamCreator<Mrg31k3p> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creator);
        assert_eq!(back.create_stream(), creator.create_stream());
    }
}
