//! Independent random streams.
//!
//! A [`Stream`] carries three states of its generator: where it started,
//! where it is now, and where its current sub-stream started. Only draws
//! move `current`; only sub-stream navigation moves `substream`; nothing
//! moves `initial`.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{alloc_buffer, Error, Result};
use crate::generator::{Generator, UnitFloat};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", try_from = "StreamRecord<G>")]
pub struct Stream<G: Generator> {
    initial: G::State,
    current: G::State,
    substream: G::State,
}

/// Serialized form of a stream, checked before it becomes a [`Stream`].
#[derive(Deserialize)]
#[serde(bound = "")]
struct StreamRecord<G: Generator> {
    initial: G::State,
    current: G::State,
    substream: G::State,
}

impl<G: Generator> TryFrom<StreamRecord<G>> for Stream<G> {
    type Error = Error;

    fn try_from(record: StreamRecord<G>) -> Result<Self> {
        for state in [&record.initial, &record.current, &record.substream] {
            G::validate_seed(state)?;
        }
        Ok(Self {
            initial: record.initial,
            current: record.current,
            substream: record.substream,
        })
    }
}

impl<G: Generator> Stream<G> {
    /// A stream whose three states all equal `state`, which must pass the
    /// family's seed validation.
    pub fn from_state(state: G::State) -> Result<Self> {
        G::validate_seed(&state)?;
        Ok(Self::starting_at(state))
    }

    pub(crate) fn starting_at(state: G::State) -> Self {
        Self {
            initial: state,
            current: state,
            substream: state,
        }
    }

    pub fn initial(&self) -> &G::State {
        &self.initial
    }

    pub fn current(&self) -> &G::State {
        &self.current
    }

    pub fn substream(&self) -> &G::State {
        &self.substream
    }

    /// Advance one step and return the raw output word.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        G::next_state(&mut self.current)
    }

    /// Next uniform draw in the open interval `(0, 1)`.
    #[inline]
    pub fn random_u01<T: UnitFloat>(&mut self) -> T {
        T::from_unit(G::unit(self.next_u32()))
    }

    /// Next uniform integer in `[i, j]`. Nothing is drawn when `i > j`.
    #[inline]
    pub fn random_integer<T: UnitFloat>(&mut self, i: i32, j: i32) -> Result<i32> {
        let span = integer_span("random_integer", i, j)?;
        Ok(self.draw_integer::<T>(i, span))
    }

    #[inline]
    fn draw_integer<T: UnitFloat>(&mut self, i: i32, span: i64) -> i32 {
        let u: T = self.random_u01();
        (i64::from(i) + u.scale_floor(span)) as i32
    }

    pub fn random_u01_array<T: UnitFloat>(&mut self, count: usize) -> Vec<T> {
        (0..count).map(|_| self.random_u01()).collect()
    }

    pub fn fill_u01<T: UnitFloat>(&mut self, buffer: &mut [T]) {
        for slot in buffer {
            *slot = self.random_u01();
        }
    }

    pub fn random_integer_array<T: UnitFloat>(
        &mut self,
        i: i32,
        j: i32,
        count: usize,
    ) -> Result<Vec<i32>> {
        let span = integer_span("random_integer_array", i, j)?;
        Ok((0..count).map(|_| self.draw_integer::<T>(i, span)).collect())
    }

    /// Return to the start of the stream, resetting the sub-stream marker too.
    pub fn rewind(&mut self) {
        self.current = self.initial;
        self.substream = self.initial;
    }

    /// Return to the start of the current sub-stream.
    pub fn rewind_substream(&mut self) {
        self.current = self.substream;
    }

    /// Move the sub-stream marker one sub-stream ahead and continue from there.
    pub fn forward_to_next_substream(&mut self) {
        G::next_substream(&mut self.substream);
        self.current = self.substream;
    }

    /// Split off `count` consecutive sub-streams.
    ///
    /// Each returned stream is a snapshot of `self` taken before its marker
    /// moved on, so `self` ends up positioned after the last one.
    pub fn make_substreams(&mut self, count: usize) -> Result<Vec<Self>> {
        let mut out = alloc_buffer(count, "make_substreams")?;
        for _ in 0..count {
            out.push(self.clone());
            self.forward_to_next_substream();
        }
        trace!(generator = G::NAME, count, "made substreams");
        Ok(out)
    }

    /// Same as [`Stream::make_substreams`], writing into an existing buffer.
    pub fn make_over_substreams(&mut self, substreams: &mut [Self]) {
        for slot in substreams {
            slot.clone_from(self);
            self.forward_to_next_substream();
        }
    }

    /// Write the initial and current states as text.
    pub fn write_info<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n   initial = {}", self.initial)?;
        writeln!(out, "\n   current = {}", self.current)
    }
}

/// Width of the inclusive range `[i, j]`.
fn integer_span(op: &str, i: i32, j: i32) -> Result<i64> {
    if i > j {
        return Err(Error::InvalidValue(format!("{op}(): i ({i}) > j ({j})")));
    }
    Ok(i64::from(j) - i64::from(i) + 1)
}

impl<G: Generator> fmt::Display for Stream<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stream: initial = {}, current = {}",
            G::NAME,
            self.initial,
            self.current
        )
    }
}

/// Advance every stream's current state by the same `(e, c)` offset.
///
/// The offset is `2^e + c` steps for `e > 0`, `c` steps for `e == 0`, and
/// `-2^|e| + c` steps for `e < 0`. The transform is computed once for the
/// whole batch.
pub fn advance_streams<G: Generator>(streams: &mut [Stream<G>], e: i32, c: i32) {
    let jump = G::jump(e, c);
    for stream in streams.iter_mut() {
        G::apply_jump(&jump, &mut stream.current);
    }
    trace!(generator = G::NAME, e, c, count = streams.len(), "advanced streams");
}

pub fn rewind_streams<G: Generator>(streams: &mut [Stream<G>]) {
    streams.iter_mut().for_each(Stream::rewind);
}

pub fn rewind_substreams<G: Generator>(streams: &mut [Stream<G>]) {
    streams.iter_mut().for_each(Stream::rewind_substream);
}

pub fn forward_to_next_substreams<G: Generator>(streams: &mut [Stream<G>]) {
    streams
        .iter_mut()
        .for_each(Stream::forward_to_next_substream);
}

/// Copy a stream buffer into a newly allocated one.
pub fn copy_streams<G: Generator>(streams: &[Stream<G>]) -> Result<Vec<Stream<G>>> {
    let mut out = alloc_buffer(streams.len(), "copy_streams")?;
    out.extend_from_slice(streams);
    Ok(out)
}

/// Copy `src` over `dest` element by element.
pub fn copy_over_streams<G: Generator>(dest: &mut [Stream<G>], src: &[Stream<G>]) -> Result<()> {
    if dest.len() != src.len() {
        return Err(Error::InvalidValue(format!(
            "copy_over_streams(): dest holds {} streams but src holds {}",
            dest.len(),
            src.len()
        )));
    }
    dest.clone_from_slice(src);
    Ok(())
}

/// Two normal draws with mean `mu` and deviation `sigma`, by Box–Muller on
/// one uniform from each stream.
pub fn random_n<G: Generator, T: UnitFloat>(
    first: &mut Stream<G>,
    second: &mut Stream<G>,
    mu: T,
    sigma: T,
) -> (T, T) {
    let u1: T = first.random_u01();
    let u2: T = second.random_u01();
    let (z0, z1) = T::box_muller(u1, u2);
    (z0 * sigma + mu, z1 * sigma + mu)
}
