use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use fitsrename::{
    parse_assignments, run_batch, FrameTemplates, FrameType, RenameOptions, ResolutionContext,
    SpacePolicy, SuffixPolicy,
};

const FORMAT_HELP: &str = "In the form of {FITSKEYWORD1}_{FITSKEYWORD2:%0.2f}";

#[derive(Parser, Debug)]
#[command(name = "fitsrename", version, about = "Rename FITS and XISF files from their headers")]
struct Cli {
    /// Glob to match files (`**` recurses into directories)
    #[arg(long, default_value = "*.fits")]
    input: String,

    /// Enable debug logging, including header dumps
    #[arg(long)]
    debug: bool,

    /// Replace spaces in header values with underscores
    #[arg(long)]
    no_space: bool,

    #[arg(long, default_value = "", help = format!("Format to rename lights to. {FORMAT_HELP}"))]
    light: String,

    #[arg(long, default_value = "", help = format!("Format to rename darks to. {FORMAT_HELP}"))]
    dark: String,

    #[arg(long, default_value = "", help = format!("Format to rename flats to. {FORMAT_HELP}"))]
    flat: String,

    #[arg(long, default_value = "", help = format!("Format to rename biases to. {FORMAT_HELP}"))]
    bias: String,

    /// Appended to each new name, formatted with the first free file number
    #[arg(long, default_value = "%03d")]
    suffix: String,

    /// Print what would be renamed without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Values for missing headers. Ex: FILTER=RGB;OBSERVER=Me
    #[arg(long, default_value = "")]
    defaults: String,

    /// Values that replace headers. Ex: FILTER=RGB;OBSERVER=Me
    #[arg(long, default_value = "")]
    overrides: String,

    /// Allow a suffix without a %d counter. Files with identical names are overwritten
    #[arg(long)]
    ignore_warnings: bool,
}

impl Cli {
    fn rename_options(&self) -> Result<RenameOptions> {
        let context = ResolutionContext::new()
            .with_defaults(parse_assignments(&self.defaults).context("invalid --defaults")?)
            .with_overrides(parse_assignments(&self.overrides).context("invalid --overrides")?);

        let mut templates = FrameTemplates::new();
        for (frame, format) in [
            (FrameType::Light, &self.light),
            (FrameType::Dark, &self.dark),
            (FrameType::Flat, &self.flat),
            (FrameType::Bias, &self.bias),
        ] {
            info!("{frame:<5} pattern: {format}");
            templates.set(frame, format);
        }

        Ok(RenameOptions {
            templates,
            context,
            spaces: if self.no_space {
                SpacePolicy::Underscore
            } else {
                SpacePolicy::Keep
            },
            suffix: SuffixPolicy::parse(&self.suffix, self.ignore_warnings)?,
            dry_run: self.dry_run,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if cli.input.is_empty() {
        anyhow::bail!("--input must not be empty");
    }

    let options = cli.rename_options()?;
    let summary = run_batch(&cli.input, &options)?;
    if summary.failed > 0 {
        anyhow::bail!("{} of {} files failed", summary.failed, summary.total());
    }
    Ok(())
}
