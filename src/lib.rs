//! `specutils` reads, converts, and batch-manipulates gamma-spectrometry
//! spectrum files.
//!
//! It currently supports reading and writing:
//!   1. Plain text and CSV via [`io::txt`] and [`io::csv`]
//!   2. PCF, CHN, Canberra CNF, and ORTEC/Nomad SPC via [`io::pcf`], [`io::chn`], [`io::cnf`], [`io::spc`]
//!   3. N42.2006 and N42.2012 XML via [`io::n42`]
//!   4. IAEA SPE via [`io::spe`] and TKA via [`io::tka`]
//!   5. Exploranium GR130/GR135 via [`io::exploranium`]
//!
//! and writing only:
//!   1. Self-contained HTML charts via [`io::html`], if the `html` feature is enabled
//!   2. `raddata://` URIs via [`io::uri`], if the `uri` feature is enabled (default)
//!
//! The record model ([`spectrum::SpecFile`], [`spectrum::Record`]) is shared
//! by every codec; [`transform`] holds the record-set-altering operations the
//! CLI composes into a pipeline ([`pipeline::run_pipeline`]), and
//! [`output`]/[`combine`] implement the output planner and combine engine
//! that decide how a pipeline's result reaches disk.
//!
//! # Example
//! ```no_run
//! use specutils::io::sniff_and_parse;
//!
//! let bytes = std::fs::read("sample.n42").unwrap();
//! let spec = sniff_and_parse(&bytes).unwrap();
//! println!("{} records, {} detectors", spec.records().len(), spec.detector_names().len());
//! ```

pub mod cli;
pub mod combine;
pub mod error;
pub mod io;
pub mod output;
pub mod pipeline;
pub mod spectrum;
pub mod transform;

pub use error::{ParseError, TransformError, UsageError, WriteError};
pub use spectrum::{Record, SpecFile};
