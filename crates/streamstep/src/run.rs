use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use stream_core::lanes::{self, LaneLayout};
use stream_core::{seed, Generator, Stream, StreamCreator, UnitFloat};
use tracing::debug;

use crate::config::{Normal, Precision, RunConfig, Spacing};

/// One NDJSON line: draw `draw` of every stream, in stream order.
#[derive(Debug, Serialize)]
struct Frame<'a> {
    draw: usize,
    values: &'a [f64],
}

fn build_creator<G: Generator>(config: &RunConfig) -> Result<StreamCreator<G>> {
    let mut creator = if let Some(state) = &config.base_state {
        let state: G::State = serde_json::from_value(state.clone())
            .with_context(|| format!("base_state is not a {} state", G::NAME))?;
        StreamCreator::with_seed(state)?
    } else if let Some(label) = &config.seed_label {
        seed::creator_from_label::<G>(label)?
    } else {
        StreamCreator::copy_from(None)
    };
    if let Some(Spacing { e, c }) = config.spacing {
        creator.change_spacing(e, c)?;
    }
    Ok(creator)
}

fn draw<G: Generator, T: UnitFloat>(
    streams: &mut [Stream<G>],
    config: &RunConfig,
) -> Result<Vec<f64>> {
    let layout = LaneLayout {
        streams_per_lane: config.streams_per_lane,
        substream_length: config.substream_length,
    };
    let count = config.streams * config.draws;
    if count == 0 {
        return Ok(Vec::new());
    }
    let values: Vec<T> = match (config.normal, config.parallel) {
        (None, true) => lanes::random_u01_array_substreams(streams, layout, count)?,
        (None, false) => lanes::fill_multistream(streams, layout, count)?,
        (Some(Normal { mu, sigma }), parallel) => {
            let (mu, sigma) = (T::from_f64(mu), T::from_f64(sigma));
            if parallel {
                lanes::random_n_array_substreams(streams, layout, mu, sigma, count)?
            } else {
                lanes::fill_multistream_normal(streams, layout, mu, sigma, count)?
            }
        }
    };
    Ok(values.into_iter().map(UnitFloat::to_f64).collect())
}

/// Mint the configured streams, draw from them and write one frame per draw
/// index. Returns the number of frames written.
pub fn run<G: Generator, W: Write>(
    config: &RunConfig,
    out: &mut W,
    info: Option<&mut dyn Write>,
) -> Result<usize> {
    config.validate()?;
    let mut creator = build_creator::<G>(config)?;
    let mut streams = creator.create_streams(config.streams)?;

    if let Some(sink) = info {
        for (index, stream) in streams.iter().enumerate() {
            write!(sink, "{} stream {index}:", G::NAME)?;
            stream.write_info(&mut *sink)?;
        }
    }

    let values = match config.precision {
        Precision::Single => draw::<G, f32>(&mut streams, config)?,
        Precision::Double => draw::<G, f64>(&mut streams, config)?,
    };

    let mut frames = 0;
    for (draw, row) in values.chunks(config.streams).enumerate() {
        let line = serde_json::to_string(&Frame { draw, values: row })?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        frames += 1;
    }
    debug!(generator = G::NAME, frames, "wrote frames");
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_core::{Lfsr113, Lfsr113State, Mrg31k3p, Mrg32k3a, MrgState, Philox432};

    fn lines(output: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("frame parses"))
            .collect()
    }

    #[test]
    fn writes_one_frame_per_draw() {
        let config = RunConfig {
            streams: 4,
            draws: 3,
            ..RunConfig::default()
        };
        let mut out = Vec::new();
        let frames = run::<Mrg31k3p, _>(&config, &mut out, None).expect("run succeeds");
        assert_eq!(frames, 3);
        let parsed = lines(&out);
        assert_eq!(parsed.len(), 3);
        for (i, frame) in parsed.iter().enumerate() {
            assert_eq!(frame["draw"], i);
            assert_eq!(frame["values"].as_array().map(Vec::len), Some(4));
        }
    }

    #[test]
    fn first_frame_matches_default_streams() {
        let config = RunConfig {
            generator: crate::config::GeneratorKind::Philox432,
            streams: 2,
            draws: 1,
            ..RunConfig::default()
        };
        let mut out = Vec::new();
        run::<Philox432, _>(&config, &mut out, None).expect("run succeeds");
        let mut streams = StreamCreator::<Philox432>::default()
            .create_streams(2)
            .expect("allocate streams");
        let expected: Vec<f64> = streams.iter_mut().map(|s| s.random_u01::<f64>()).collect();
        let frame = &lines(&out)[0];
        let got: Vec<f64> = frame["values"]
            .as_array()
            .expect("values array")
            .iter()
            .map(|v| v.as_f64().expect("number"))
            .collect();
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(&expected) {
            assert!((g - e).abs() < 1e-15, "{g} != {e}");
        }
    }

    #[test]
    fn parallel_and_serial_runs_write_identical_output() {
        let serial = RunConfig {
            streams: 6,
            draws: 40,
            streams_per_lane: 3,
            substream_length: 7,
            precision: Precision::Single,
            ..RunConfig::default()
        };
        let parallel = RunConfig {
            parallel: true,
            ..serial.clone()
        };
        let mut a = Vec::new();
        let mut b = Vec::new();
        run::<Mrg32k3a, _>(&serial, &mut a, None).expect("serial run");
        run::<Mrg32k3a, _>(&parallel, &mut b, None).expect("parallel run");
        assert_eq!(a, b);
    }

    #[test]
    fn normal_runs_shift_and_scale_draws() {
        let config = RunConfig {
            streams: 4,
            draws: 500,
            streams_per_lane: 2,
            normal: Some(Normal {
                mu: 10.0,
                sigma: 0.5,
            }),
            ..RunConfig::default()
        };
        let mut out = Vec::new();
        run::<Philox432, _>(&config, &mut out, None).expect("run succeeds");
        let values: Vec<f64> = lines(&out)
            .iter()
            .flat_map(|frame| frame["values"].as_array().expect("values array").clone())
            .map(|v| v.as_f64().expect("number"))
            .collect();
        assert_eq!(values.len(), 2000);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!((mean - 10.0).abs() < 0.1, "mean={mean}");

        let parallel = RunConfig {
            parallel: true,
            ..config.clone()
        };
        let mut again = Vec::new();
        run::<Philox432, _>(&parallel, &mut again, None).expect("parallel run");
        assert_eq!(out, again);
    }

    #[test]
    fn explicit_base_state_seeds_the_creator() {
        let config = RunConfig {
            base_state: Some(serde_json::json!({"g1": [1, 2, 3], "g2": [4, 5, 6]})),
            streams: 1,
            draws: 1,
            ..RunConfig::default()
        };
        let creator = build_creator::<Mrg31k3p>(&config).expect("creator");
        assert_eq!(creator.initial_state(), &MrgState::new([1, 2, 3], [4, 5, 6]));

        let invalid = RunConfig {
            base_state: Some(serde_json::json!({"g1": [0, 0, 0], "g2": [4, 5, 6]})),
            ..config
        };
        assert!(build_creator::<Mrg31k3p>(&invalid).is_err());
    }

    #[test]
    fn lfsr113_base_state_is_checked() {
        let config = RunConfig {
            generator: crate::config::GeneratorKind::Lfsr113,
            base_state: Some(serde_json::json!({"z": [2, 8, 16, 128]})),
            ..RunConfig::default()
        };
        let creator = build_creator::<Lfsr113>(&config).expect("creator");
        assert_eq!(creator.initial_state(), &Lfsr113State::new([2, 8, 16, 128]));

        let invalid = RunConfig {
            base_state: Some(serde_json::json!({"z": [2, 8, 15, 128]})),
            ..config
        };
        let err = build_creator::<Lfsr113>(&invalid).unwrap_err();
        assert!(format!("{err:#}").contains("seed.z[2] < 16"));
    }

    #[test]
    fn info_lists_every_stream() {
        let config = RunConfig {
            streams: 3,
            draws: 0,
            ..RunConfig::default()
        };
        let mut out = Vec::new();
        let mut info = Vec::new();
        let frames = run::<Mrg31k3p, _>(&config, &mut out, Some(&mut info as &mut dyn Write))
            .expect("run succeeds");
        assert_eq!(frames, 0);
        let text = String::from_utf8(info).expect("utf8 info");
        assert_eq!(text.matches("initial = ").count(), 3);
        assert!(text.starts_with("mrg31k3p stream 0:"));
    }

    #[test]
    fn labelled_runs_are_deterministic() {
        let config = RunConfig {
            seed_label: Some("determinism".to_string()),
            spacing: Some(Spacing { e: 20, c: 0 }),
            streams: 5,
            draws: 50,
            ..RunConfig::default()
        };
        let run_once = || {
            let mut out = Vec::new();
            run::<Mrg31k3p, _>(&config, &mut out, None).expect("run succeeds");
            out
        };
        assert_eq!(run_once(), run_once());
    }
}
