//! The codec registry surface: one [`SpecFormat`] variant per writer/parser
//! pair, and the `read`/`write` trait contract every codec module implements
//! (spec.md §4.6).

use std::collections::HashSet;
use std::io::{Read, Write};

use crate::error::{ParseError, WriteError};
use crate::spectrum::{Record, SpecFile};

/// Every format this crate can read and/or write. `NumTypes` is a sentinel
/// the CLI layer uses to mean "CALp-only output, not a real spectrum format".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecFormat {
    Txt,
    Csv,
    Pcf,
    N42_2006,
    N42_2012,
    Chn,
    SpcBinaryInt,
    SpcBinaryFloat,
    SpcAscii,
    ExploraniumGr130v0,
    ExploraniumGr135v2,
    SpeIaea,
    Cnf,
    Tka,
    HtmlD3,
    Uri,
    NumTypes,
}

impl SpecFormat {
    /// Total function from variant to canonical extension (spec.md §4.6).
    pub fn canonical_extension(self) -> &'static str {
        match self {
            SpecFormat::Txt => "txt",
            SpecFormat::Csv => "csv",
            SpecFormat::Pcf => "pcf",
            SpecFormat::N42_2006 => "n42",
            SpecFormat::N42_2012 => "n42",
            SpecFormat::Chn => "chn",
            SpecFormat::SpcBinaryInt => "spc",
            SpecFormat::SpcBinaryFloat => "spc",
            SpecFormat::SpcAscii => "spc",
            SpecFormat::ExploraniumGr130v0 => "gr1",
            SpecFormat::ExploraniumGr135v2 => "gr1",
            SpecFormat::SpeIaea => "spe",
            SpecFormat::Cnf => "cnf",
            SpecFormat::Tka => "tka",
            SpecFormat::HtmlD3 => "html",
            SpecFormat::Uri => "uri",
            SpecFormat::NumTypes => "CALp",
        }
    }

    /// Whether a writer for this format accepts only a single resolved
    /// record (spec.md §4.6 "Writer contract").
    pub fn single_record_only(self) -> bool {
        matches!(
            self,
            SpecFormat::Chn
                | SpecFormat::SpcBinaryInt
                | SpecFormat::SpcBinaryFloat
                | SpecFormat::SpcAscii
                | SpecFormat::SpeIaea
                | SpecFormat::Cnf
                | SpecFormat::Tka
        )
    }

    /// Maps a user-supplied format token (case-insensitive, as given on the
    /// CLI `--format` option) to a variant, per spec.md §6's recognized list.
    pub fn from_token(token: &str) -> Option<SpecFormat> {
        Some(match token.to_ascii_lowercase().as_str() {
            "txt" => SpecFormat::Txt,
            "csv" => SpecFormat::Csv,
            "pcf" => SpecFormat::Pcf,
            "xml" | "n42" | "2012n42" => SpecFormat::N42_2012,
            "2006n42" => SpecFormat::N42_2006,
            "chn" => SpecFormat::Chn,
            "spc" | "intspc" => SpecFormat::SpcBinaryInt,
            "fltspc" => SpecFormat::SpcBinaryFloat,
            "asciispc" => SpecFormat::SpcAscii,
            "gr130" => SpecFormat::ExploraniumGr130v0,
            "gr135" => SpecFormat::ExploraniumGr135v2,
            "dat" | "spe" => SpecFormat::SpeIaea,
            "cnf" => SpecFormat::Cnf,
            "tka" => SpecFormat::Tka,
            "html" | "json" | "js" | "css" => SpecFormat::HtmlD3,
            "uri" => SpecFormat::Uri,
            "calp" => SpecFormat::NumTypes,
            _ => return None,
        })
    }
}

pub trait SpecFileWriter {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError>;
}

pub trait SpecFileReader {
    fn read(&self, input: &mut dyn Read) -> Result<SpecFile, ParseError>;
}

/// Resolves a `(samples, detectors)` selection to exactly one record, for
/// the single-record writers (spec.md §4.6 "Writer contract"). `format` is
/// only used to label the resulting error.
pub fn resolve_single_record<'a>(
    spec: &'a SpecFile,
    samples: &HashSet<i32>,
    detectors: &HashSet<String>,
    format: &'static str,
) -> Result<&'a Record, WriteError> {
    let mut matches = spec
        .records()
        .iter()
        .filter(|r| samples.contains(&r.sample_number) && detectors.contains(&r.detector_name));
    let first = matches.next();
    let count = first.is_some() as usize + matches.count();
    match (first, count) {
        (Some(r), 1) => Ok(r),
        (_, count) => Err(WriteError::InvalidSelection { format, count }),
    }
}
