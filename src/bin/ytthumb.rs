#![forbid(unsafe_code)]

//! Command-line front end: resolve the input, fetch the best available
//! thumbnail and write it to disk or standard output.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::{
    env, fmt,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use ytthumb::{
    FetchError, FetchOptions, Frame, ImageFormat, SaveOptions, Size, Thumbnail, TransportError,
    VideoId,
    config::{DEFAULT_TIMEOUT_SECS, FileConfig, load_config},
};

const STDOUT_SENTINEL: &str = "-";
const LOG_ENV_VAR: &str = "YTTHUMB_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(
    name = "ytthumb",
    version,
    about = "Download the thumbnail of a YouTube video.",
    override_usage = "ytthumb [OPTIONS] <INPUT>"
)]
struct Cli {
    #[arg(value_name = "INPUT", help = "YouTube video URL or ID")]
    input: String,
    #[arg(
        short = 's',
        long = "size",
        value_name = "SIZE",
        help = "Thumbnail size from 0 (largest) to 4 (smallest), or a name such as hqdefault or sd2"
    )]
    size: Option<Size>,
    #[arg(
        long = "frame",
        value_name = "1-3",
        value_parser = clap::value_parser!(u8).range(1..=3),
        help = "Use an auto-generated frame instead of the default thumbnail"
    )]
    frame: Option<u8>,
    #[arg(
        short = 'w',
        long = "webp",
        help = "Use higher quality WebP instead of JPEG format"
    )]
    webp: bool,
    #[arg(
        short = 'F',
        long = "no-fallback",
        help = "Don't fall back to lower sizes if the requested size is not found"
    )]
    no_fallback: bool,
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help = "Timeout for each request in seconds (default 3.0)"
    )]
    timeout: Option<f64>,
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        help = "Output directory, or - to write the image to standard output"
    )]
    dir: Option<PathBuf>,
    #[arg(
        short = 'f',
        long = "filename",
        value_name = "NAME",
        help = "Custom filename; defaults to the video ID"
    )]
    filename: Option<String>,
    #[arg(short = 'm', long = "no-mkdir", help = "Don't create missing directories")]
    no_mkdir: bool,
    #[arg(short = 'o', long = "overwrite", help = "Overwrite if the file exists")]
    overwrite: bool,
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to a TOML file with default options"
    )]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Stdout,
    Dir(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    fetch: FetchOptions,
    save: SaveOptions,
    output: Output,
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let file_config = load_config(cli.config.as_deref())?;
    let settings = build_settings(&cli, &file_config)?;
    let id = resolve_input(&cli.input)?;

    let status = Status::new(settings.output == Output::Stdout);
    status.line(format_args!("Requesting thumbnail for video ID: {id}"))?;

    let mut thumbnail = Thumbnail::new(id);
    let result = thumbnail
        .fetch(&settings.fetch)
        .map_err(|err| anyhow!(describe_fetch_error(&err)))?;
    status.line(format_args!("Found thumbnail with size: {}", result.size()))?;

    match &settings.output {
        Output::Stdout => thumbnail.write_to(io::stdout().lock())?,
        Output::Dir(dir) => {
            let dest = thumbnail.save(dir, &settings.save)?;
            status.line(format_args!(
                "Successfully saved thumbnail to: {}",
                dest.display()
            ))?;
        }
    }
    Ok(())
}

/// Inputs shaped like an identifier are validated as one; anything else is
/// treated as a URL.
fn resolve_input(input: &str) -> Result<VideoId> {
    let resolved = if VideoId::is_valid(input) {
        VideoId::parse(input)
    } else {
        VideoId::from_url(input)
    };
    resolved.map_err(|_| anyhow!("'{input}' is not a valid YouTube video URL or ID"))
}

fn build_settings(cli: &Cli, file: &FileConfig) -> Result<Settings> {
    let mut size = cli.size.or(file.size).unwrap_or_default();
    let frame = match cli.frame {
        Some(index) => Frame::from_index(index),
        None if cli.size.is_none() => file.frame,
        None => None,
    };
    if let Some(frame) = frame {
        size = size.with_frame(frame);
    }

    let timeout_secs = cli.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
    let timeout = parse_timeout(timeout_secs)?;

    let dir = match cli.dir.clone().or_else(|| file.dir.clone()) {
        Some(dir) => dir,
        None => env::current_dir().context("Failed to determine current directory")?,
    };
    let output = if dir == Path::new(STDOUT_SENTINEL) {
        Output::Stdout
    } else {
        Output::Dir(dir)
    };

    Ok(Settings {
        fetch: FetchOptions {
            size,
            format: ImageFormat::from_webp_flag(cli.webp || file.webp.unwrap_or(false)),
            fallback: !cli.no_fallback && file.fallback.unwrap_or(true),
            timeout,
        },
        save: SaveOptions {
            filename: cli.filename.clone(),
            overwrite: cli.overwrite || file.overwrite.unwrap_or(false),
            mkdir: !cli.no_mkdir && file.mkdir.unwrap_or(true),
        },
        output,
    })
}

fn parse_timeout(secs: f64) -> Result<Duration> {
    if !(secs.is_finite() && secs > 0.0) {
        bail!("timeout must be a positive number of seconds, got {secs}");
    }
    Duration::try_from_secs_f64(secs).with_context(|| format!("timeout {secs} is out of range"))
}

fn describe_fetch_error(err: &FetchError) -> String {
    match err {
        FetchError::NotFound { .. } => err.to_string(),
        FetchError::Transport(TransportError::Timeout { .. }) => "Connection timed out".to_owned(),
        FetchError::Transport(TransportError::Tls { .. }) => "SSL error".to_owned(),
        FetchError::Transport(TransportError::Connection { .. }) => {
            "Failed to establish connection".to_owned()
        }
        FetchError::Transport(other @ TransportError::Other { source, .. }) => {
            format!("{other}: {source}")
        }
    }
}

/// Progress lines go to stdout, unless stdout carries the image.
struct Status {
    to_stderr: bool,
}

impl Status {
    fn new(to_stderr: bool) -> Self {
        Self { to_stderr }
    }

    fn line(&self, message: fmt::Arguments<'_>) -> Result<()> {
        if self.to_stderr {
            writeln!(io::stderr().lock(), "{message}")?;
        } else {
            writeln!(io::stdout().lock(), "{message}")?;
        }
        Ok(())
    }
}
