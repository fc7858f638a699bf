//! Rename astronomical image files from their header metadata.
//!
//! Headers are read from FITS primary HDUs and from the XML header of XISF
//! files, then substituted into templates such as
//! `{OBJECT}/{FILTER}_{EXPTIME:%0.2f}s_` to build new file names.
//!
//! ```no_run
//! use fitsrename::{decode_flat_header, ResolutionContext, SpacePolicy, Template};
//!
//! let file = std::fs::File::open("capture.fits")?;
//! let header = decode_flat_header(std::io::BufReader::new(file))?;
//! let template = Template::parse("{OBJECT}_{FILTER}_{EXPTIME:%d}s");
//! let name = template.render(&header, &ResolutionContext::new(), SpacePolicy::Underscore)?;
//! println!("{name}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod block;
pub mod card;
pub mod error;
pub mod fits;
pub mod frame;
pub mod layout;
pub mod printf;
pub mod render;
pub mod resolve;
pub mod template;
pub mod value;
pub mod xisf;

pub use batch::{
    process_file, read_header, run_batch, BatchSummary, FrameTemplates, HeaderFormat, Outcome,
    RenameOptions, SkipReason, SuffixPolicy,
};
pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use error::{DecodeError, Error, RenderError, Result};
pub use fits::decode_flat_header;
pub use frame::{classify, FrameType, Unclassified};
pub use render::{render, render_value, SpacePolicy};
pub use resolve::{parse_assignments, resolve, ResolutionContext};
pub use template::{tokenize, Template, Token};
pub use value::{HeaderMap, HeaderValue};
pub use xisf::decode_xml_header;
