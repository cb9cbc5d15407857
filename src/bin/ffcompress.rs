use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use ffcompress::{
    Bitrate, DEFAULT_PERCENT_AUDIO_BITRATE, DEFAULT_TARGET_PERCENT, EncoderConfig, Error,
    FailurePolicy, Ffmpeg, Ffprobe, Result, default_rungs,
};
use tracing::{Level, error, info, warn};

/// Produce bitrate-reduced copies of a video with ffmpeg.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ffmpeg executable.
    #[arg(long, global = true, env = "FFMPEG_BINARY")]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe executable.
    #[arg(long, global = true, env = "FFPROBE_BINARY")]
    ffprobe: Option<PathBuf>,

    /// Directory searched for ffmpeg/ffprobe before PATH.
    #[arg(long, global = true)]
    bin_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode the input at 5650k/96k, 4520k/80k and 3390k/64k.
    Ladder {
        input: PathBuf,
        /// Directory the three outputs are written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Keep encoding the remaining rungs after a failure.
        #[arg(long)]
        keep_going: bool,
    },
    /// Encode a single output with explicit bitrates.
    Single {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        video_bitrate: Bitrate,
        #[arg(long)]
        audio_bitrate: Bitrate,
        #[arg(long, default_value = ffcompress::DEFAULT_VIDEO_CODEC)]
        video_codec: String,
        #[arg(long, default_value = ffcompress::DEFAULT_AUDIO_CODEC)]
        audio_codec: String,
        #[arg(long, default_value = ffcompress::DEFAULT_PRESET)]
        preset: String,
    },
    /// Keep a percentage of the source's video bitrate.
    Percent {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TARGET_PERCENT)]
        percent: f64,
        #[arg(long, default_value_t = DEFAULT_PERCENT_AUDIO_BITRATE)]
        audio_bitrate: Bitrate,
    },
    /// Print the ffmpeg version in use.
    Version,
}

impl Cli {
    fn encoder_config(&self) -> EncoderConfig {
        let mut config = EncoderConfig::new();
        if let Some(dir) = &self.bin_dir {
            config = config.bin_dir(dir);
        }
        if let Some(path) = &self.ffmpeg {
            config = config.ffmpeg_path(path);
        }
        if let Some(path) = &self.ffprobe {
            config = config.ffprobe_path(path);
        }
        config
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.encoder_config();
    let ffmpeg = Ffmpeg::with_config(&config).await?;
    info!("Using {} ({})", ffmpeg.executable_path().display(), ffmpeg.version());

    match cli.command {
        Commands::Ladder {
            input,
            out_dir,
            keep_going,
        } => {
            let policy = if keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            };
            let report = ffmpeg
                .ladder(&input, &out_dir, &default_rungs())
                .policy(policy)
                .run()
                .await?;

            for outcome in report.failed() {
                if let Err(e) = &outcome.result {
                    error!("{}: {}", outcome.output.display(), e);
                }
            }
            if report.has_failures() {
                return Err(Error::BatchFailed {
                    failed: report.failed().count(),
                    total: report.outcomes.len(),
                });
            }
        }
        Commands::Single {
            input,
            output,
            video_bitrate,
            audio_bitrate,
            video_codec,
            audio_codec,
            preset,
        } => {
            ffmpeg
                .job(input, output)
                .video_bitrate(video_bitrate)
                .audio_bitrate(audio_bitrate)
                .video_codec(video_codec)
                .audio_codec(audio_codec)
                .preset(preset)
                .run()
                .await?;
        }
        Commands::Percent {
            input,
            output,
            percent,
            audio_bitrate,
        } => {
            let ffprobe = Ffprobe::with_config(&config)
                .inspect_err(|e| warn!("{}", e))
                .ok();
            ffmpeg
                .compress_percent(ffprobe.as_ref(), input, output, percent, audio_bitrate)
                .await?;
        }
        Commands::Version => println!("{}", ffmpeg.version()),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
