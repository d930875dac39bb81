use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use imagegen::{
    BatchWriter, BudgetLoop, FileNamer, NoiseOpts, OutputFormat, StdoutProgress, WriterOpts,
};

#[derive(Parser, Debug)]
#[command(name = "imagegen", version)]
struct Cli {
    /// Log verbosity on stderr: -v for info, -vv for debug.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a directory with geometric variants of one seed image until a size budget is met.
    Fill(FillArgs),
    /// Write uniform-noise images at fixed sizes.
    Noise(NoiseArgs),
}

#[derive(Parser, Debug)]
struct FillArgs {
    /// Seed image.
    #[arg(long)]
    input: PathBuf,

    /// Output directory (created if absent).
    #[arg(long, default_value = "web/images")]
    out: PathBuf,

    /// Stop once the output directory holds at least this many GiB.
    #[arg(long = "target-gb", allow_negative_numbers = true)]
    target_gb: f64,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Jpg)]
    format: FormatChoice,

    /// JPEG quality; ignored for lossless formats.
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// File name prefix; a random per-run token is appended.
    #[arg(long, default_value = "var")]
    prefix: String,

    /// Concurrent encode/write tasks.
    #[arg(long, default_value_t = imagegen::DEFAULT_WORKERS)]
    workers: usize,

    /// Abort if a single batch takes longer than this many seconds.
    #[arg(long)]
    batch_timeout_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct NoiseArgs {
    /// Output directory (created if absent).
    #[arg(long, default_value = "web/images")]
    out: PathBuf,

    /// Images per size.
    #[arg(long, default_value_t = 8)]
    count: u32,

    #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Comma-separated sizes such as `1024x1024,2000x1200`; overrides width/height.
    #[arg(long, default_value = "")]
    sizes: String,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Jpg)]
    format: FormatChoice,

    /// JPEG quality; ignored for lossless formats.
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    #[arg(long, default_value = "img")]
    prefix: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Jpg,
    Png,
    Webp,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Fill(args) => cmd_fill(args),
        Command::Noise(args) => cmd_noise(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn output_format(choice: FormatChoice, quality: u8) -> anyhow::Result<OutputFormat> {
    Ok(match choice {
        FormatChoice::Jpg => OutputFormat::jpg(quality)?,
        FormatChoice::Png => OutputFormat::Png,
        FormatChoice::Webp => OutputFormat::Webp,
    })
}

fn cmd_fill(args: FillArgs) -> anyhow::Result<()> {
    let format = output_format(args.format, args.quality)?;
    let target_bytes = imagegen::target_bytes_from_gb(args.target_gb)?;

    let prefix = imagegen::run_prefix(&args.prefix, &mut rand::rng());
    let opts = WriterOpts {
        workers: args.workers,
        batch_timeout: args.batch_timeout_secs.map(Duration::from_secs),
    };
    let writer = BatchWriter::new(FileNamer::new(&args.out, prefix, format), format, &opts)?;

    let source = imagegen::load_seed(&args.input)?;
    imagegen::prepare_output_dir(&args.out)
        .with_context(|| format!("prepare output dir '{}'", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        prefix = writer.namer().prefix(),
        target_bytes,
        workers = writer.workers(),
        "starting fill"
    );

    let summary = BudgetLoop::new(&source, &writer, target_bytes)
        .run(&mut StdoutProgress)
        .with_context(|| format!("fill '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} files in {} batches to {} ({} bytes)",
        summary.files_written,
        summary.batches,
        args.out.display(),
        summary.final_bytes
    );
    Ok(())
}

fn cmd_noise(args: NoiseArgs) -> anyhow::Result<()> {
    let format = output_format(args.format, args.quality)?;
    let mut sizes = imagegen::parse_sizes(&args.sizes)?;
    if sizes.is_empty() {
        sizes.push((args.width, args.height));
    }

    let opts = NoiseOpts {
        out_dir: args.out,
        count: args.count,
        sizes,
        format,
        prefix: args.prefix,
    };
    let paths = imagegen::generate_noise(&opts, &mut rand::rng())
        .with_context(|| format!("generate noise into '{}'", opts.out_dir.display()))?;

    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
