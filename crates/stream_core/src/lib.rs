//! Reproducible, non-overlapping random streams for parallel workloads.
//!
//! Four generator families share one lifecycle: the combined
//! multiple-recursive generators [`Mrg31k3p`] and [`Mrg32k3a`], which jump
//! ahead by modular matrix powers, the combined Tausworthe [`Lfsr113`], which
//! jumps by bit-matrix powers, and the counter-based [`Philox432`], which
//! jumps by counter arithmetic. A [`StreamCreator`] mints [`Stream`]s spaced
//! far enough apart that they never overlap; each stream can be split into
//! sub-streams and rewound.
//!
//! ```
//! use stream_core::{lanes, Mrg31k3p, StreamCreator};
//!
//! let mut creator = StreamCreator::<Mrg31k3p>::DEFAULT;
//! let mut streams = creator.create_streams(4)?;
//! let draws: Vec<f64> = lanes::random_u01_array(&mut streams, 40)?;
//! assert!(draws.iter().all(|&u| u > 0.0 && u < 1.0));
//! # Ok::<(), stream_core::Error>(())
//! ```

pub mod creator;
pub mod error;
pub mod generator;
pub mod lanes;
pub mod lfsr113;
pub mod modular;
pub mod mrg;
pub mod philox;
pub mod seed;
pub mod stream;

#[cfg(any(test, feature = "proptest-support"))]
pub mod strategy;

pub use creator::{change_streams_spacing, set_base_creator_state, StreamCreator};
pub use error::{Error, Result, Status};
pub use generator::{Generator, UnitFloat};
pub use lfsr113::{Lfsr113, Lfsr113State};
pub use mrg::{Mrg31k3p, Mrg32k3a, MrgState};
pub use philox::{Philox432, PhiloxState};
pub use stream::{
    advance_streams, copy_over_streams, copy_streams, forward_to_next_substreams, random_n,
    rewind_streams, rewind_substreams, Stream,
};
