//! Data-parallel dispatch of draws across streams.
//!
//! A lane owns one or more consecutive streams and draws from them strictly
//! in order. Lanes run on the rayon pool; the serial variants run the very
//! same per-lane routine in a plain loop, so both paths produce bit-identical
//! buffers.
//!
//! Output layout is draw-major: draw `i` of stream `s` lands at
//! `i * stream_count + s`.
//!
//! Normal draws pair each stream of a lane with its successor inside the same
//! lane (the last wraps to the first), taking one uniform from each. A lane
//! never touches another lane's streams.

use rayon::prelude::*;
use tracing::trace;

use crate::error::{alloc_buffer, Error, Result};
use crate::generator::{Generator, UnitFloat};
use crate::stream::Stream;

/// How a lane moves through sub-streams while drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneLayout {
    /// Consecutive streams owned by one lane.
    pub streams_per_lane: usize,
    /// Draws per sub-stream. Positive forwards to the next sub-stream every
    /// `n` draws, negative rewinds the current one every `|n|` draws, zero
    /// never touches sub-streams.
    pub substream_length: i64,
}

impl Default for LaneLayout {
    fn default() -> Self {
        Self {
            streams_per_lane: 1,
            substream_length: 0,
        }
    }
}

fn validate(
    op: &str,
    stream_count: usize,
    layout: LaneLayout,
    number_count: usize,
) -> Result<usize> {
    if number_count == 0 {
        return Err(Error::InvalidValue(format!("{op}(): number_count must be positive")));
    }
    if stream_count == 0 {
        return Err(Error::InvalidValue(format!("{op}(): streams cannot be empty")));
    }
    if layout.streams_per_lane == 0 || stream_count % layout.streams_per_lane != 0 {
        return Err(Error::InvalidValue(format!(
            "{op}(): {stream_count} streams cannot be split into lanes of {}",
            layout.streams_per_lane
        )));
    }
    if number_count % stream_count != 0 {
        return Err(Error::InvalidValue(format!(
            "{op}(): number_count ({number_count}) must be a multiple of \
             the stream count ({stream_count})"
        )));
    }
    Ok(number_count / stream_count)
}

/// One draw per stream of a lane, in stream order.
trait LaneDraw<G: Generator, T: UnitFloat>: Sync {
    fn draw_row(&self, lane: &mut [Stream<G>], out: &mut Vec<T>);
}

struct Uniform;

impl<G: Generator, T: UnitFloat> LaneDraw<G, T> for Uniform {
    #[inline]
    fn draw_row(&self, lane: &mut [Stream<G>], out: &mut Vec<T>) {
        for stream in lane.iter_mut() {
            out.push(stream.random_u01());
        }
    }
}

struct Normal<T> {
    mu: T,
    sigma: T,
}

impl<G: Generator, T: UnitFloat> LaneDraw<G, T> for Normal<T> {
    fn draw_row(&self, lane: &mut [Stream<G>], out: &mut Vec<T>) {
        let n = lane.len();
        for sid in 0..n {
            let u1: T = lane[sid].random_u01();
            let u2: T = lane[(sid + 1) % n].random_u01();
            let (z, _) = T::box_muller(u1, u2);
            out.push(z * self.sigma + self.mu);
        }
    }
}

/// Draws of one lane, ordered `(draw, stream)`.
fn lane_draws<G: Generator, T: UnitFloat, D: LaneDraw<G, T>>(
    lane: &mut [Stream<G>],
    draws_per_stream: usize,
    substream_length: i64,
    draw: &D,
) -> Vec<T> {
    let mut out = Vec::with_capacity(draws_per_stream * lane.len());
    let period = substream_length.unsigned_abs() as usize;
    for i in 0..draws_per_stream {
        if i > 0 && period > 0 && i % period == 0 {
            for stream in lane.iter_mut() {
                if substream_length > 0 {
                    stream.forward_to_next_substream();
                } else {
                    stream.rewind_substream();
                }
            }
        }
        draw.draw_row(lane, &mut out);
    }
    out
}

fn scatter<T: UnitFloat>(
    lanes: Vec<Vec<T>>,
    streams_per_lane: usize,
    draws_per_stream: usize,
    out: &mut [T],
) {
    let lane_count = lanes.len();
    for (gid, lane) in lanes.into_iter().enumerate() {
        for i in 0..draws_per_stream {
            let base = streams_per_lane * (i * lane_count + gid);
            let src = &lane[i * streams_per_lane..(i + 1) * streams_per_lane];
            out[base..base + streams_per_lane].copy_from_slice(src);
        }
    }
}

fn dispatch<G: Generator, T: UnitFloat, D: LaneDraw<G, T>>(
    op: &str,
    streams: &mut [Stream<G>],
    layout: LaneLayout,
    number_count: usize,
    parallel: bool,
    draw: &D,
) -> Result<Vec<T>> {
    let draws_per_stream = validate(op, streams.len(), layout, number_count)?;
    let mut out = alloc_buffer(number_count, op)?;
    out.resize(number_count, T::default());

    let spl = layout.streams_per_lane;
    let len = layout.substream_length;
    let lanes: Vec<Vec<T>> = if parallel {
        streams
            .par_chunks_mut(spl)
            .map(|lane| lane_draws(lane, draws_per_stream, len, draw))
            .collect()
    } else {
        streams
            .chunks_mut(spl)
            .map(|lane| lane_draws(lane, draws_per_stream, len, draw))
            .collect()
    };
    scatter(lanes, spl, draws_per_stream, &mut out);

    trace!(
        generator = G::NAME,
        streams = streams.len(),
        number_count,
        parallel,
        op,
        "dispatched draws"
    );
    Ok(out)
}

/// Draw `number_count` uniforms spread evenly over `streams`, one lane per
/// stream, on the rayon pool.
pub fn random_u01_array<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    number_count: usize,
) -> Result<Vec<T>> {
    dispatch("random_u01_array", streams, LaneLayout::default(), number_count, true, &Uniform)
}

/// Serial counterpart of [`random_u01_array`].
pub fn serial_u01_array<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    number_count: usize,
) -> Result<Vec<T>> {
    dispatch("serial_u01_array", streams, LaneLayout::default(), number_count, false, &Uniform)
}

/// Like [`random_u01_array`], with lanes owning several streams and moving
/// through sub-streams as `layout` describes.
pub fn random_u01_array_substreams<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    layout: LaneLayout,
    number_count: usize,
) -> Result<Vec<T>> {
    dispatch("random_u01_array_substreams", streams, layout, number_count, true, &Uniform)
}

/// Serial counterpart of [`random_u01_array_substreams`].
pub fn fill_multistream<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    layout: LaneLayout,
    number_count: usize,
) -> Result<Vec<T>> {
    dispatch("fill_multistream", streams, layout, number_count, false, &Uniform)
}

/// Draw `number_count` normals with mean `mu` and deviation `sigma`, one lane
/// per stream, on the rayon pool.
pub fn random_n_array<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    mu: T,
    sigma: T,
    number_count: usize,
) -> Result<Vec<T>> {
    let normal = Normal { mu, sigma };
    dispatch("random_n_array", streams, LaneLayout::default(), number_count, true, &normal)
}

/// Serial counterpart of [`random_n_array`].
pub fn serial_n_array<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    mu: T,
    sigma: T,
    number_count: usize,
) -> Result<Vec<T>> {
    let normal = Normal { mu, sigma };
    dispatch("serial_n_array", streams, LaneLayout::default(), number_count, false, &normal)
}

/// Like [`random_n_array`], with lanes owning several streams and moving
/// through sub-streams as `layout` describes.
pub fn random_n_array_substreams<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    layout: LaneLayout,
    mu: T,
    sigma: T,
    number_count: usize,
) -> Result<Vec<T>> {
    let normal = Normal { mu, sigma };
    dispatch("random_n_array_substreams", streams, layout, number_count, true, &normal)
}

/// Serial counterpart of [`random_n_array_substreams`].
pub fn fill_multistream_normal<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    layout: LaneLayout,
    mu: T,
    sigma: T,
    number_count: usize,
) -> Result<Vec<T>> {
    let normal = Normal { mu, sigma };
    dispatch("fill_multistream_normal", streams, layout, number_count, false, &normal)
}
