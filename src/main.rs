use avif_thumbnailer::encoder::FfmpegEncoder;
use avif_thumbnailer::imaging::{FitMode, select_backend};
use avif_thumbnailer::output::{self, BatchResult, CheckReport};
use avif_thumbnailer::{ThumbnailRequest, Thumbnailer, config, markup};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avif-thumbnailer")]
#[command(about = "Cached AVIF + fallback thumbnails embedded in <picture> markup")]
#[command(long_about = "\
Cached AVIF + fallback thumbnails embedded in <picture> markup

Each source image is cropped or scaled into the requested box twice: once in
its own format by an image driver, once as AVIF by ffmpeg. Both land in a
sharded cache directory and are reused until the source changes.

Fitting modes:
  inset (default)  scale to fit inside the box, no cropping
  outbound         crop to fill the box exactly

Run 'avif-thumbnailer gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce thumbnails and print their markup
    Thumb(ThumbArgs),
    /// Report the image driver and encoder available on this host
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ThumbArgs {
    /// Source images
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Box width in pixels
    #[arg(long)]
    width: u32,

    /// Box height in pixels
    #[arg(long)]
    height: u32,

    /// Crop to fill the box instead of fitting inside it
    #[arg(long)]
    outbound: bool,

    /// Extra <img> attribute, repeatable
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attribute)]
    attributes: Vec<(String, String)>,

    /// Print JSON results instead of markup
    #[arg(long)]
    json: bool,
}

fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Thumb(args) => {
            let config = load_config(cli.config.as_deref())?;
            init_thread_pool(&config.processing);
            let thumbnailer = Thumbnailer::new(config);
            let request = ThumbnailRequest {
                width: args.width,
                height: args.height,
                mode: if args.outbound {
                    FitMode::Outbound
                } else {
                    FitMode::Inset
                },
                attributes: args.attributes,
            };

            let results: Vec<BatchResult> = args
                .paths
                .par_iter()
                .map(|path| (path.clone(), thumbnailer.thumbnail(path, &request)))
                .collect();

            if args.json {
                println!("{}", output::format_json(&results)?);
            } else {
                for (source, result) in &results {
                    match result {
                        Ok(thumb) => println!("{}", markup::picture(thumb)),
                        Err(e) => eprintln!("{}", output::format_thumb_error(source, e)),
                    }
                }
            }

            let (stats, errors) = output::tally(&results);
            eprintln!();
            eprintln!("{}", output::format_summary(&stats, errors));
            if errors > 0 {
                return Err(format!("{} of {} thumbnails failed", errors, results.len()).into());
            }
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref())?;
            let extensions = config.normalized_extensions();
            let encoder = FfmpegEncoder::new(
                config.encoder.command.clone(),
                config.encoder.codec.clone(),
                config.encoder.timeout(),
            );
            let report = CheckReport {
                driver: select_backend(&config.drivers, &extensions)
                    .map(|backend| backend.name())
                    .map_err(|e| e.to_string()),
                extensions,
                encoder_command: config.encoder.command.display().to_string(),
                encoder_codec: config.encoder.codec.clone(),
                encoder_available: encoder.is_available(),
                cache_path: config.cache_path,
                cache_url: config.cache_url,
            };
            for line in output::format_check_output(&report) {
                println!("{}", line);
            }
            if !report.is_ok() {
                return Err("host is missing an image driver or the encoder".into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<config::ThumbnailerConfig, config::ConfigError> {
    match path {
        Some(path) => config::ThumbnailerConfig::load(path),
        None => Ok(config::ThumbnailerConfig::default()),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
