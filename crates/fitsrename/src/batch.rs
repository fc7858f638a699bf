//! Batch renaming: decode each file's header, classify the frame, render
//! its template, and move the file to the rendered name.
//!
//! Rendered names are paths relative to the working directory, not to the
//! source file. Per-file failures are logged and counted; only an invalid
//! glob pattern aborts a batch.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn, Level};

use crate::error::{DecodeError, Error, Result};
use crate::fits::decode_flat_header;
use crate::frame::{classify, FrameType, Unclassified};
use crate::printf::{sprintf, Arg};
use crate::render::SpacePolicy;
use crate::resolve::ResolutionContext;
use crate::template::Template;
use crate::value::{HeaderMap, HeaderValue};
use crate::xisf::decode_xml_header;

// ── Header formats ──

/// On-disk header container, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    Fits,
    Xisf,
}

impl HeaderFormat {
    /// `.xisf` or `.fits`/`.fit`/`.fts`, compared ASCII case-insensitively.
    pub fn from_path(path: &Path) -> Option<HeaderFormat> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("xisf") {
            Some(HeaderFormat::Xisf)
        } else if ["fits", "fit", "fts"].iter().any(|e| ext.eq_ignore_ascii_case(e)) {
            Some(HeaderFormat::Fits)
        } else {
            None
        }
    }

    pub fn decode<R: Read>(self, reader: R) -> std::result::Result<HeaderMap, DecodeError> {
        match self {
            HeaderFormat::Fits => decode_flat_header(reader),
            HeaderFormat::Xisf => decode_xml_header(reader),
        }
    }
}

/// Open `path` and decode its header in the given format.
pub fn read_header(path: &Path, format: HeaderFormat) -> Result<HeaderMap> {
    let file = File::open(path)?;
    Ok(format.decode(BufReader::new(file))?)
}

/// One `KEYWORD    value` line, the layout used by header dumps.
pub fn format_entry(keyword: &str, value: &HeaderValue) -> String {
    format!("{keyword:<10} {value}")
}

// ── Templates and suffixes ──

/// The filename template configured for each frame type.
#[derive(Debug, Clone, Default)]
pub struct FrameTemplates {
    templates: HashMap<FrameType, Template>,
}

impl FrameTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `frame`. An empty format leaves the frame unconfigured.
    pub fn set(&mut self, frame: FrameType, format: &str) {
        if format.is_empty() {
            self.templates.remove(&frame);
        } else {
            self.templates.insert(frame, Template::parse(format));
        }
    }

    pub fn with(mut self, frame: FrameType, format: &str) -> Self {
        self.set(frame, format);
        self
    }

    pub fn get(&self, frame: FrameType) -> Option<&Template> {
        self.templates.get(&frame)
    }
}

/// How the suffix is appended to a rendered name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixPolicy {
    /// Formatted with the first counter (0, 1, 2 ...) giving a free path.
    Numbered(String),
    /// Appended verbatim; names may collide.
    Literal(String),
}

impl Default for SuffixPolicy {
    fn default() -> Self {
        SuffixPolicy::Numbered(String::from("%03d"))
    }
}

impl SuffixPolicy {
    /// A suffix with a `%<digits>d` counter is numbered. Anything else is
    /// refused unless `ignore_warnings` is set, because identical rendered
    /// names would overwrite each other.
    pub fn parse(suffix: &str, ignore_warnings: bool) -> Result<SuffixPolicy> {
        if has_counter(suffix) {
            sprintf(suffix, Arg::Int(0))
                .map_err(|e| Error::Config(format!("invalid suffix {suffix:?}: {e}")))?;
            return Ok(SuffixPolicy::Numbered(String::from(suffix)));
        }
        if !ignore_warnings {
            return Err(Error::Config(String::from(
                "the suffix must contain a %d counter to keep file names unique \
                 (use --ignore-warnings to override)",
            )));
        }
        warn!(
            suffix,
            "suffix has no %d counter; files may be overwritten if rendered names are not unique"
        );
        Ok(SuffixPolicy::Literal(String::from(suffix)))
    }

    /// The final target path for a rendered name.
    pub fn apply(&self, name: &str) -> Result<PathBuf> {
        match self {
            SuffixPolicy::Literal(suffix) => Ok(PathBuf::from(format!("{name}{suffix}"))),
            SuffixPolicy::Numbered(suffix) => {
                for counter in 0.. {
                    let numbered = sprintf(suffix, Arg::Int(counter))
                        .map_err(|e| Error::Config(format!("invalid suffix {suffix:?}: {e}")))?;
                    let candidate = PathBuf::from(format!("{name}{numbered}"));
                    match fs::symlink_metadata(&candidate) {
                        Ok(_) => continue,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(candidate),
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(Error::Config(format!("no free file name for {name:?}")))
            }
        }
    }
}

/// `%` followed by optional digits and `d`.
fn has_counter(suffix: &str) -> bool {
    suffix.match_indices('%').any(|(i, _)| {
        suffix[i + 1..]
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .starts_with('d')
    })
}

// ── Renaming ──

/// Everything a batch needs besides the input pattern.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub templates: FrameTemplates,
    pub context: ResolutionContext,
    pub spaces: SpacePolicy,
    pub suffix: SuffixPolicy,
    /// Log the planned renames without touching the filesystem.
    pub dry_run: bool,
}

impl Default for RenameOptions {
    /// No templates, the standard aliases, and a `%03d` counter suffix.
    fn default() -> Self {
        RenameOptions {
            templates: FrameTemplates::default(),
            context: ResolutionContext::new(),
            spaces: SpacePolicy::default(),
            suffix: SuffixPolicy::default(),
            dry_run: false,
        }
    }
}

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Dotfile,
    UnsupportedExtension,
    Unclassified(Unclassified),
    NoTemplate(FrameType),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Dotfile => write!(f, "dotfile"),
            SkipReason::UnsupportedExtension => write!(f, "not a FITS or XISF file"),
            SkipReason::Unclassified(reason) => write!(f, "{reason}"),
            SkipReason::NoTemplate(frame) => write!(f, "no format specified for {frame} frames"),
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Renamed { from: PathBuf, to: PathBuf },
    DryRun { from: PathBuf, to: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Decode, classify, render and rename one file.
pub fn process_file(path: &Path, options: &RenameOptions) -> Result<Outcome> {
    debug!(file = %path.display(), "processing file");
    let skipped = |reason: SkipReason| -> Result<Outcome> {
        info!(file = %path.display(), "skipping file: {reason}");
        Ok(Outcome::Skipped {
            path: path.to_path_buf(),
            reason,
        })
    };

    let is_dotfile = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    if is_dotfile {
        return skipped(SkipReason::Dotfile);
    }
    let Some(format) = HeaderFormat::from_path(path) else {
        return skipped(SkipReason::UnsupportedExtension);
    };

    let header = read_header(path, format).map_err(|e| e.in_file(path))?;
    if tracing::enabled!(Level::DEBUG) {
        for (keyword, value) in header.iter() {
            debug!("{}", format_entry(keyword, value));
        }
    }

    let frame = match classify(&header) {
        Ok(frame) => frame,
        Err(reason) => return skipped(SkipReason::Unclassified(reason)),
    };
    let Some(template) = options.templates.get(frame) else {
        return skipped(SkipReason::NoTemplate(frame));
    };

    let name = template
        .render(&header, &options.context, options.spaces)
        .map_err(|e| Error::from(e).in_file(path))?;
    let target = options.suffix.apply(&name).map_err(|e| e.in_file(path))?;

    info!("renaming {} to {}", path.display(), target.display());
    if options.dry_run {
        return Ok(Outcome::DryRun {
            from: path.to_path_buf(),
            to: target,
        });
    }

    move_file(path, &target).map_err(|e| Error::from(e).in_file(path))?;
    Ok(Outcome::Renamed {
        from: path.to_path_buf(),
        to: target,
    })
}

/// Rename `from` to `to`, creating missing parent directories with the
/// permissions of the source file's directory.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        let source_dir = match from.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        create_dir_like(parent, source_dir)?;
    }
    fs::rename(from, to)
}

#[cfg(unix)]
fn create_dir_like(dir: &Path, template: &Path) -> io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    let mode = fs::metadata(template)?.permissions().mode() & 0o777;
    fs::DirBuilder::new().recursive(true).mode(mode).create(dir)
}

#[cfg(not(unix))]
fn create_dir_like(dir: &Path, template: &Path) -> io::Result<()> {
    fs::metadata(template)?;
    fs::create_dir_all(dir)
}

// ── Batches ──

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub renamed: usize,
    /// Renames planned in dry-run mode.
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Renamed { .. } => self.renamed += 1,
            Outcome::DryRun { .. } => self.planned += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.renamed + self.planned + self.skipped + self.failed
    }
}

/// Rename every file matching `pattern` (`**` recurses).
///
/// Matches are collected before anything is renamed, so files moved during
/// the batch are never visited twice.
pub fn run_batch(pattern: &str, options: &RenameOptions) -> Result<BatchSummary> {
    info!("searching for files matching {pattern}");
    let matches: Vec<_> = glob::glob(pattern)
        .map_err(|e| Error::Config(format!("invalid glob pattern {pattern:?}: {e}")))?
        .collect();
    info!("found {} matching files", matches.len());

    let mut summary = BatchSummary::default();
    for entry in matches {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                error!(file = %e.path().display(), "unable to read path: {}", e.error());
                summary.failed += 1;
                continue;
            }
        };
        if path.is_dir() {
            debug!(file = %path.display(), "skipping directory");
            continue;
        }
        match process_file(&path, options) {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                error!("{e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        renamed = summary.renamed,
        planned = summary.planned,
        skipped = summary.skipped,
        failed = summary.failed,
        "done"
    );
    Ok(summary)
}
