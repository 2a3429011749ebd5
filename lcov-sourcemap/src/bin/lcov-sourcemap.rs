// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lcov_sourcemap::Config;

/// Remap LCOV coverage of bundled or transpiled files onto their original sources.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// LCOV tracefile collected against the generated files.
    lcov: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base directory for source paths and existence checks.
    #[arg(short = 'd', long)]
    source_dir: Option<PathBuf>,

    /// JSON config file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suffix appended to a generated file path to find its source map.
    #[arg(long)]
    map_suffix: Option<String>,

    /// Explicit source map for a generated file, as `KEY=PATH`.
    #[arg(long = "map", value_name = "KEY=PATH", value_parser = parse_map_pair)]
    maps: Vec<(String, PathBuf)>,

    /// Keep coverage of generated files that have no source map.
    #[arg(long)]
    pass_through: bool,

    /// Suffix for the paths of passed-through files.
    #[arg(long)]
    unmapped_extension: Option<String>,

    /// Extra bundler URL scheme to strip from sources, e.g. `esbuild`.
    #[arg(long = "scheme", value_name = "NAME")]
    schemes: Vec<String>,

    /// Keep records for files that are not on disk.
    #[arg(long)]
    no_check_exists: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_map_pair(value: &str) -> Result<(String, PathBuf)> {
    match value.split_once('=') {
        Some((key, path)) if !key.is_empty() && !path.is_empty() => {
            Ok((key.to_owned(), PathBuf::from(path)))
        }
        _ => bail!("expected KEY=PATH, got `{value}`"),
    }
}

impl Args {
    async fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).await?,
            None => Config::default(),
        };

        if let Some(source_dir) = &self.source_dir {
            config.source_dir = source_dir.clone();
        }

        if let Some(map_suffix) = &self.map_suffix {
            config.map_suffix = map_suffix.clone();
        }

        config.maps.extend(self.maps.iter().cloned());

        if self.pass_through {
            config.pass_through = true;
        }

        if let Some(ext) = &self.unmapped_extension {
            config.unmapped_extension = ext.clone();
        }

        config.schemes.extend(self.schemes.iter().cloned());

        if self.no_check_exists {
            config.check_exists = false;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = args.config().await?;

    let lcov = tokio::fs::read_to_string(&args.lcov)
        .await
        .with_context(|| format!("unable to read lcov: {}", args.lcov.display()))?;

    match &args.output {
        Some(output) => lcov_sourcemap::write_lcov(&lcov, &config, output).await?,
        None => {
            let text = lcov_sourcemap::get_lcov(&lcov, &config).await?;

            let mut out = stdout().lock();
            out.write_all(text.as_bytes())?;

            if !text.is_empty() {
                out.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
