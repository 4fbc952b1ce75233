//! The per-format codec registry (spec.md §4.6) and its shared reader/writer
//! traits.

pub mod calp;
pub mod chn;
pub mod cnf;
pub mod csv;
pub mod exploranium;
#[cfg(feature = "html")]
pub mod html;
pub mod n42;
pub mod pcf;
pub mod spc;
pub mod spe;
pub mod tka;
pub mod traits;
pub mod txt;
#[cfg(feature = "uri")]
pub mod uri;

pub use traits::{SpecFileReader, SpecFileWriter, SpecFormat};

use exploranium::{ExploraniumCodec, ExploraniumModel};
use n42::{N42Codec, N42Version};
use spc::{SpcCodec, SpcVariant};

use crate::spectrum::SpecFile;

/// Returns the writer for a format, ready to have `write` called on it.
/// `NumTypes` (CALp-only output) has no writer here — the CLI layer handles
/// it directly through `crate::io::calp`.
pub fn writer_for(format: SpecFormat) -> Option<Box<dyn SpecFileWriter>> {
    Some(match format {
        SpecFormat::Txt => Box::new(txt::TxtCodec),
        SpecFormat::Csv => Box::new(csv::CsvCodec),
        SpecFormat::Pcf => Box::new(pcf::PcfCodec),
        SpecFormat::N42_2006 => Box::new(N42Codec(N42Version::V2006)),
        SpecFormat::N42_2012 => Box::new(N42Codec(N42Version::V2012)),
        SpecFormat::Chn => Box::new(chn::ChnCodec),
        SpecFormat::SpcBinaryInt => Box::new(SpcCodec(SpcVariant::BinaryInt)),
        SpecFormat::SpcBinaryFloat => Box::new(SpcCodec(SpcVariant::BinaryFloat)),
        SpecFormat::SpcAscii => Box::new(SpcCodec(SpcVariant::Ascii)),
        SpecFormat::ExploraniumGr130v0 => Box::new(ExploraniumCodec(ExploraniumModel::Gr130v0)),
        SpecFormat::ExploraniumGr135v2 => Box::new(ExploraniumCodec(ExploraniumModel::Gr135v2)),
        SpecFormat::SpeIaea => Box::new(spe::SpeCodec),
        SpecFormat::Cnf => Box::new(cnf::CnfCodec),
        SpecFormat::Tka => Box::new(tka::TkaCodec),
        #[cfg(feature = "html")]
        SpecFormat::HtmlD3 => Box::new(html::HtmlCodec { json_only: false }),
        #[cfg(feature = "uri")]
        SpecFormat::Uri => Box::new(uri::UriCodec(uri::UriOptions::default())),
        SpecFormat::NumTypes => return None,
        #[cfg(not(feature = "html"))]
        SpecFormat::HtmlD3 => return None,
        #[cfg(not(feature = "uri"))]
        SpecFormat::Uri => return None,
    })
}

/// Readers, for the formats that support being parsed (every variant except
/// the output-only `HtmlD3` and the CALp sentinel `NumTypes`).
pub fn reader_for(format: SpecFormat) -> Option<Box<dyn SpecFileReader>> {
    Some(match format {
        SpecFormat::Txt => Box::new(txt::TxtCodec),
        SpecFormat::Csv => Box::new(csv::CsvCodec),
        SpecFormat::Pcf => Box::new(pcf::PcfCodec),
        SpecFormat::N42_2006 => Box::new(N42Codec(N42Version::V2006)),
        SpecFormat::N42_2012 => Box::new(N42Codec(N42Version::V2012)),
        SpecFormat::Chn => Box::new(chn::ChnCodec),
        SpecFormat::SpcBinaryInt => Box::new(SpcCodec(SpcVariant::BinaryInt)),
        SpecFormat::SpcBinaryFloat => Box::new(SpcCodec(SpcVariant::BinaryFloat)),
        SpecFormat::SpcAscii => Box::new(SpcCodec(SpcVariant::Ascii)),
        SpecFormat::ExploraniumGr130v0 => Box::new(ExploraniumCodec(ExploraniumModel::Gr130v0)),
        SpecFormat::ExploraniumGr135v2 => Box::new(ExploraniumCodec(ExploraniumModel::Gr135v2)),
        SpecFormat::SpeIaea => Box::new(spe::SpeCodec),
        SpecFormat::Cnf => Box::new(cnf::CnfCodec),
        SpecFormat::Tka => Box::new(tka::TkaCodec),
        SpecFormat::HtmlD3 | SpecFormat::Uri | SpecFormat::NumTypes => return None,
    })
}

/// Tries every parser in a fixed, cheapest-first order and returns the first
/// one that succeeds (spec.md §4.6 "parser dispatch / sniffing").
pub fn sniff_and_parse(bytes: &[u8]) -> Result<SpecFile, crate::error::ParseError> {
    use crate::error::ParseError;

    const SNIFF_ORDER: &[SpecFormat] = &[
        SpecFormat::N42_2012,
        SpecFormat::N42_2006,
        SpecFormat::Txt,
        SpecFormat::SpeIaea,
        SpecFormat::Csv,
        SpecFormat::SpcAscii,
        SpecFormat::Chn,
        SpecFormat::Cnf,
        SpecFormat::Pcf,
        SpecFormat::SpcBinaryInt,
        SpecFormat::ExploraniumGr130v0,
        SpecFormat::ExploraniumGr135v2,
        SpecFormat::Tka,
    ];

    for format in SNIFF_ORDER {
        let Some(reader) = reader_for(*format) else { continue };
        let mut cursor = std::io::Cursor::new(bytes);
        if let Ok(spec) = reader.read(&mut cursor) {
            return Ok(spec);
        }
    }
    Err(ParseError::UnrecognizedFormat)
}
