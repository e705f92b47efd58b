mod config;
mod run;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stream_core::{Lfsr113, Mrg31k3p, Mrg32k3a, Philox432};
use tracing::info;

use config::{GeneratorKind, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "streamstep",
    about = "Batch runner drawing reproducible random streams into NDJSON frames"
)]
struct Args {
    /// Path to a run config JSON document.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the generator family.
    #[arg(long, value_enum)]
    generator: Option<GeneratorKind>,

    /// Override the number of streams.
    #[arg(long, value_name = "COUNT")]
    streams: Option<usize>,

    /// Override the number of draws per stream.
    #[arg(long, value_name = "COUNT")]
    draws: Option<usize>,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Draw through the parallel lane dispatch.
    #[arg(long)]
    parallel: bool,

    /// Print the initial and current state of every stream to stdout.
    #[arg(long)]
    info: bool,
}

impl Args {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_from_path(path)
                .with_context(|| format!("failed to read run config {:?}", path))?,
            None => RunConfig::default(),
        };
        if let Some(generator) = self.generator {
            config.generator = generator;
        }
        if let Some(streams) = self.streams {
            config.streams = streams;
        }
        if let Some(draws) = self.draws {
            config.draws = draws;
        }
        config.parallel |= self.parallel;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = args.resolve()?;

    let file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut writer = BufWriter::new(file);

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let sink: Option<&mut dyn Write> = if args.info {
        Some(&mut stdout as &mut dyn Write)
    } else {
        None
    };

    info!(
        generator = %config.generator,
        streams = config.streams,
        draws = config.draws,
        parallel = config.parallel,
        "starting run"
    );
    let frames = match config.generator {
        GeneratorKind::Mrg31k3p => run::run::<Mrg31k3p, _>(&config, &mut writer, sink)?,
        GeneratorKind::Mrg32k3a => run::run::<Mrg32k3a, _>(&config, &mut writer, sink)?,
        GeneratorKind::Philox432 => run::run::<Philox432, _>(&config, &mut writer, sink)?,
        GeneratorKind::Lfsr113 => run::run::<Lfsr113, _>(&config, &mut writer, sink)?,
    };
    writer.flush()?;
    info!(frames, out = ?args.out, "finished run");

    Ok(())
}
