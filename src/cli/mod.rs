//! The CLI orchestrator (spec.md §4.7): argument definitions, cross-option
//! validation, and the numeric exit-code taxonomy (spec.md §6, and the full
//! per-rule set in `cambio`'s `CommandLineUtil.cpp` that `SPEC_FULL.md`
//! carries forward as additive detail).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use indexmap::IndexMap;

use crate::combine::CombineSort;
use crate::error::UsageError;
use crate::io::calp::CalpDocument;
use crate::io::SpecFormat;
use crate::output::{MultiRecordPolicy, OutputTarget};
use crate::pipeline::PipelineOptions;
use crate::transform::{PerSampleOrPerDetector, SourceTypeFilters};

/// Raw CLI surface, one field per `cambio` `CommandLineUtil.cpp` option
/// (long names kept identical so an existing `--ini` file stays valid).
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "specutils", about = "Convert and batch-manipulate gamma-spectrometry files")]
pub struct Args {
    /// Input spectrum files. May also be given positionally.
    #[arg(short = 'i', long = "input")]
    pub input: Vec<PathBuf>,

    #[arg(trailing_var_arg = true)]
    pub positional: Vec<PathBuf>,

    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,

    #[arg(long, default_value_t = false)]
    pub force: bool,

    #[arg(long)]
    pub ini: Option<PathBuf>,

    #[arg(long)]
    pub inputdir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// For input files with multiple spectra going to a single-record
    /// format: sum them into one record instead of emitting one output file
    /// per record (the default).
    #[arg(long = "combine-multi", default_value_t = false)]
    pub combine_multi: bool,

    #[arg(long = "all-calibrations", default_value_t = false)]
    pub all_calibrations: bool,

    #[arg(long = "CALp-file")]
    pub calp_file: Option<PathBuf>,

    #[arg(long = "set-model")]
    pub set_model: Option<String>,

    #[arg(long = "no-background-spec", default_value_t = false)]
    pub no_background_spec: bool,
    #[arg(long = "no-foreground-spec", default_value_t = false)]
    pub no_foreground_spec: bool,
    #[arg(long = "no-intrinsic-spec", default_value_t = false)]
    pub no_intrinsic_spec: bool,
    #[arg(long = "no-calibration-spec", default_value_t = false)]
    pub no_calibration_spec: bool,
    #[arg(long = "no-unknown-spec", default_value_t = false)]
    pub no_unknown_spec: bool,

    #[arg(long = "background-only", default_value_t = false)]
    pub background_only: bool,
    #[arg(long = "foreground-only", default_value_t = false)]
    pub foreground_only: bool,
    #[arg(long = "calibration-only", default_value_t = false)]
    pub calibration_only: bool,
    #[arg(long = "intrinsic-only", default_value_t = false)]
    pub intrinsic_only: bool,

    #[arg(long = "derived-only", default_value_t = false)]
    pub derived_only: bool,
    #[arg(long = "no-derived", default_value_t = false)]
    pub no_derived: bool,

    #[arg(long = "sum-all-spectra", default_value_t = false)]
    pub sum_all_spectra: bool,

    #[arg(long = "rebin-factor", default_value_t = 1)]
    pub rebin_factor: u32,

    #[arg(long = "linearize-lower-energy")]
    pub linearize_lower_energy: Option<f64>,
    #[arg(long = "linearize-upper-energy")]
    pub linearize_upper_energy: Option<f64>,

    #[arg(long = "rename-det")]
    pub rename_det: Vec<String>,

    #[arg(long = "normalize-det-names", default_value_t = false)]
    pub normalize_det_names: bool,

    #[arg(long = "det-to-exclude")]
    pub det_to_exclude: Vec<String>,
    #[arg(long = "det-to-include")]
    pub det_to_include: Vec<String>,

    #[arg(long = "sum-det-per-sample", default_value_t = false)]
    pub sum_det_per_sample: bool,
    #[arg(long = "sum-samples-per-det", default_value_t = false)]
    pub sum_samples_per_det: bool,

    #[arg(long = "combine-input-files", default_value_t = false)]
    pub combine_input_files: bool,
    #[arg(long = "combine-input-files-sort", default_value = "")]
    pub combine_input_files_sort: String,

    #[arg(long = "uri-option")]
    pub uri_option: Vec<String>,
    #[arg(long = "num-uri", default_value_t = 1)]
    pub num_uri: u8,
}

/// Everything the rest of the crate needs, derived from a validated [`Args`]
/// (spec.md §4.7's validation pass, run once before any file work starts).
pub struct ValidatedRun {
    pub inputs: Vec<PathBuf>,
    pub output: OutputTarget,
    pub format: SpecFormat,
    pub force: bool,
    pub recursive: bool,
    pub inputdir: Option<PathBuf>,
    pub combine: Option<CombineSort>,
    pub multi_record_policy: MultiRecordPolicy,
    pub pipeline: PipelineOptions,
    pub calp_document: Option<CalpDocument>,
}

const KNOWN_MODELS: &[&str] = &[
    "DetectiveEX",
    "DetectiveDX",
    "uDetective",
    "DetectiveEX100",
    "DetectiveDX100",
    "GR130",
    "GR135",
    "identiFINDER",
    "identiFINDERNG",
    "identiFINDERLaBr3",
];

/// Validates `args` against the rules of spec.md §4.7, returning the fixed
/// numeric exit code of the first violated rule on failure.
pub fn validate(mut args: Args) -> Result<ValidatedRun, UsageError> {
    if let Some(ini_path) = &args.ini {
        apply_ini_overrides(&mut args, ini_path)?;
    }

    let mut inputs: Vec<PathBuf> = args.input.iter().cloned().chain(args.positional.iter().cloned()).collect();

    if let Some(dir) = &args.inputdir {
        if !inputs.is_empty() {
            return Err(UsageError::new(
                13,
                "You can not specify an input directory and separate input files.",
            ));
        }
        if args.output.is_none() {
            return Err(UsageError::new(
                14,
                "If you specify an input directory you must specify an output path.",
            ));
        }
        if !dir.is_dir() {
            return Err(UsageError::new(15, format!("Input directory '{}' is not a valid directory", dir.display())));
        }
        let output_is_dir = args.output.as_ref().is_some_and(|p| p.is_dir());
        if !output_is_dir && !args.combine_input_files {
            return Err(UsageError::new(
                16,
                format!("Output directory '{}' is not a valid directory", args.output.as_ref().unwrap().display()),
            ));
        }
        if args.combine_input_files && output_is_dir {
            return Err(UsageError::new(
                21,
                "When combining spectrum files you must specify an output file name, not a directory.",
            ));
        }
        inputs = list_dir(dir, args.recursive);
    }

    if inputs.is_empty() {
        return Err(UsageError::new(2, "No input files specified."));
    }

    let mut output = args.output.clone();
    let mut format_str = args.format.clone().unwrap_or_default().to_ascii_lowercase();

    if output.is_none() {
        if args.combine_input_files {
            return Err(UsageError::new(22, "When combining input files, you must specify the output filename."));
        }
        if inputs.len() > 1 {
            output = inputs.pop();
        } else if SpecFormat::from_token(&format_str).is_none() {
            return Err(UsageError::new(3, "No output file/directory specified"));
        } else {
            let stem = inputs[0].file_stem().map(PathBuf::from).unwrap_or_else(|| inputs[0].clone());
            output = Some(stem);
        }
    }
    let output = output.unwrap();

    if inputs.len() > 1 && !output.is_dir() && !args.combine_input_files {
        return Err(UsageError::new(
            3,
            "You must specify an output directory when there are multiple input files.",
        ));
    }

    if !args.force && output.is_file() {
        return Err(UsageError::new(
            5,
            format!("Output '{}' already exists; use --force to overwrite.", output.display()),
        ));
    }

    if format_str.is_empty() && output.to_string_lossy().len() > 3 && (inputs.len() == 1 || args.combine_input_files)
    {
        if let Some(ext) = output.extension() {
            format_str = ext.to_string_lossy().to_ascii_lowercase();
        }
    }

    if format_str.is_empty() && inputs.len() > 1 && !args.combine_input_files {
        return Err(UsageError::new(
            4,
            "When multiple input files are specified, you must also specify the output format with --format.",
        ));
    }

    let Some(mut format) = SpecFormat::from_token(&format_str) else {
        return Err(UsageError::new(
            4,
            if format_str.is_empty() {
                "Output format desired could not be guessed; use --format.".to_string()
            } else {
                format!("Output format '{}' is invalid.", format_str)
            },
        ));
    };

    if args.derived_only && args.no_derived {
        return Err(UsageError::new(40, "You can not specify both 'derived-only' and 'no-derived'."));
    }

    if let Some(model) = &args.set_model {
        if !model.is_empty() && !KNOWN_MODELS.iter().any(|m| m.eq_ignore_ascii_case(model)) {
            return Err(UsageError::new(9, format!("Detector model '{}' is invalid.", model)));
        }
        format = nudge_format_for_model(format, &format_str, model);
    }

    for input in &inputs {
        if !input.is_file() {
            return Err(UsageError::new(6, format!("Input file '{}' doesn't exist, or can't be accessed.", input.display())));
        }
    }

    if format == SpecFormat::NumTypes {
        if args.calp_file.is_some() {
            return Err(UsageError::new(
                37,
                "You can not specify to output a CALp file and also specify an input CALp file.",
            ));
        }
        if inputs.len() != 1 {
            return Err(UsageError::new(38, "When creating a CALp file, you can only specify a single input file."));
        }
        if args.combine_input_files {
            return Err(UsageError::new(39, "The 'combine-input-files' option can not be used when creating a CALp file."));
        }
    }

    if let Some(calp_path) = &args.calp_file {
        if !calp_path.is_file() {
            return Err(UsageError::new(31, "Specified CALp file is not a file."));
        }
    }

    let linearize = args.linearize_lower_energy.is_some() || args.linearize_upper_energy.is_some();
    if linearize {
        if args.linearize_lower_energy.is_none() || args.linearize_upper_energy.is_none() {
            return Err(UsageError::new(
                33,
                "If you specify 'linearize-lower-energy' or 'linearize-upper-energy', you must specify both.",
            ));
        }
        let lower = args.linearize_lower_energy.unwrap();
        let upper = args.linearize_upper_energy.unwrap();
        if upper <= lower {
            return Err(UsageError::new(34, "The lower linearization energy must be less than the upper."));
        }
        if upper <= 0.0 {
            return Err(UsageError::new(35, "The upper linearization energy must be greater than 0 keV."));
        }
    }

    let mut renames: IndexMap<String, String> = IndexMap::new();
    for entry in &args.rename_det {
        let Some((from, to)) = entry.split_once('=') else {
            return Err(UsageError::new(
                9,
                format!("'rename-det' argument must be of the form \"OldName=NewName\" (for arg '{}').", entry),
            ));
        };
        renames.insert(from.trim().to_string(), to.trim().to_string());
    }

    if format != SpecFormat::Uri {
        if !args.uri_option.is_empty() {
            return Err(UsageError::new(17, "You can not specify 'uri-option' unless the output format is URI."));
        }
        if args.num_uri != 1 {
            return Err(UsageError::new(18, "You can not specify 'num-uri' unless the output format is URI."));
        }
    } else {
        let mut url_safe = false;
        let mut no_basex = false;
        for opt in &args.uri_option {
            match opt.as_str() {
                o if o.eq_ignore_ascii_case("NoDeflate") => {}
                o if o.eq_ignore_ascii_case("NoBaseXEncoding") => no_basex = true,
                o if o.eq_ignore_ascii_case("CsvChannelData") => {}
                o if o.eq_ignore_ascii_case("NoZeroCompressCounts") => {}
                o if o.eq_ignore_ascii_case("UseUrlSafeBase64") => url_safe = true,
                o if o.eq_ignore_ascii_case("AsMailToUri") => {}
                other => {
                    return Err(UsageError::new(19, format!("An invalid 'uri-option' option '{}' was specified.", other)));
                }
            }
        }
        if url_safe && no_basex {
            return Err(UsageError::new(20, "'UseUrlSafeBase64' and 'NoBaseXEncoding' can not be specified together."));
        }
    }

    let combine = if args.combine_input_files {
        if args.recursive {
            return Err(UsageError::new(23, "'recursive' can not be combined with 'combine-input-files'."));
        }
        if inputs.len() < 2 {
            return Err(UsageError::new(24, "You must specify more than one input file with 'combine-input-files'."));
        }
        let sort = args.combine_input_files_sort.to_ascii_lowercase();
        match sort.trim() {
            "" => Some(CombineSort::ArgvOrder),
            "time" => Some(CombineSort::Time),
            _ => {
                return Err(UsageError::new(25, "'combine-input-files-sort' can only take the value 'time'."));
            }
        }
    } else {
        if !args.combine_input_files_sort.trim().is_empty() {
            return Err(UsageError::new(26, "'combine-input-files-sort' can only be specified with 'combine-input-files'."));
        }
        None
    };

    if args.sum_det_per_sample && args.sum_samples_per_det {
        return Err(UsageError::new(36, "You can not specify both 'sum-det-per-sample' and 'sum-samples-per-det'."));
    }

    let mut source_type_filters = SourceTypeFilters {
        no_background: args.no_background_spec,
        no_foreground: args.no_foreground_spec,
        no_intrinsic: args.no_intrinsic_spec,
        no_calibration: args.no_calibration_spec,
        no_unknown: args.no_unknown_spec,
    };
    if args.background_only {
        source_type_filters.no_foreground = true;
        source_type_filters.no_intrinsic = true;
        source_type_filters.no_calibration = true;
        source_type_filters.no_unknown = true;
    }
    if args.foreground_only {
        source_type_filters.no_background = true;
        source_type_filters.no_intrinsic = true;
        source_type_filters.no_calibration = true;
        source_type_filters.no_unknown = true;
    }
    if args.calibration_only {
        source_type_filters.no_background = true;
        source_type_filters.no_foreground = true;
        source_type_filters.no_intrinsic = true;
        source_type_filters.no_unknown = true;
    }
    if args.intrinsic_only {
        source_type_filters.no_background = true;
        source_type_filters.no_foreground = true;
        source_type_filters.no_calibration = true;
        source_type_filters.no_unknown = true;
    }

    let calp_document = match &args.calp_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| UsageError::new(31, format!("Could not read CALp file '{}': {}", path.display(), e)))?;
            let doc = crate::io::calp::parse_calp(&text)
                .map_err(|e| UsageError::new(31, format!("Malformed CALp file '{}': {}", path.display(), e)))?;
            Some(doc)
        }
        None => None,
    };

    let per_sample_or_per_detector = if args.sum_det_per_sample {
        Some(PerSampleOrPerDetector::SumDetPerSample)
    } else if args.sum_samples_per_det {
        Some(PerSampleOrPerDetector::SumSamplesPerDet)
    } else {
        None
    };

    let pipeline = PipelineOptions {
        keep_all_calibration_variants: args.all_calibrations,
        exclude_detectors: args.det_to_exclude.clone(),
        include_detectors: args.det_to_include.clone(),
        source_type_filters,
        only_derived: args.derived_only,
        no_derived: args.no_derived,
        sum_all: args.sum_all_spectra,
        detector_renames: renames,
        normalize_n42_names: args.normalize_det_names,
        dont_rename_detectors: Vec::new(),
        calp: calp_document.clone(),
        rebin_factor_exponent: (args.rebin_factor > 1).then_some(args.rebin_factor),
        linearize: linearize.then(|| (args.linearize_lower_energy.unwrap(), args.linearize_upper_energy.unwrap())),
        per_sample_or_per_detector,
    };

    let output_target = if output.is_dir() { OutputTarget::Directory(output) } else { OutputTarget::File(output) };

    Ok(ValidatedRun {
        inputs,
        output: output_target,
        format,
        force: args.force,
        recursive: args.recursive,
        inputdir: args.inputdir,
        combine,
        multi_record_policy: if args.combine_multi { MultiRecordPolicy::SumToOne } else { MultiRecordPolicy::EachSeparate },
        pipeline,
        calp_document,
    })
}

fn nudge_format_for_model(format: SpecFormat, requested_token: &str, model: &str) -> SpecFormat {
    let is = |name: &str| model.eq_ignore_ascii_case(name);
    if requested_token == "spc"
        && (is("DetectiveEX") || is("DetectiveDX") || is("uDetective") || is("DetectiveEX100") || is("DetectiveDX100"))
    {
        return SpecFormat::SpcBinaryInt;
    }
    if requested_token == "dat" && is("GR130") {
        return SpecFormat::ExploraniumGr130v0;
    }
    if requested_token == "dat" && is("GR135") {
        return SpecFormat::ExploraniumGr135v2;
    }
    if requested_token == "spc" && (is("identiFINDER") || is("identiFINDERNG") || is("identiFINDERLaBr3")) {
        return SpecFormat::SpcAscii;
    }
    format
}

fn list_dir(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    const MAX_CANDIDATE_BYTES: u64 = 250 * 1024 * 1024;
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if recursive {
                    stack.push(path);
                }
                continue;
            }
            if entry.metadata().map(|m| m.len()).unwrap_or(0) <= MAX_CANDIDATE_BYTES {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

/// Merges values from an INI file into `args`, for any field still at its
/// default (spec.md §6 "command line arguments take precedent").
fn apply_ini_overrides(args: &mut Args, ini_path: &Path) -> Result<(), UsageError> {
    let conf = ini::Ini::load_from_file(ini_path)
        .map_err(|e| UsageError::new(10, format!("Error parsing INI configuration file '{}': {}", ini_path.display(), e)))?;
    let section = conf.general_section();
    let values: HashMap<&str, &str> = section.iter().collect();

    macro_rules! ini_bool {
        ($field:ident, $key:literal) => {
            if !args.$field {
                if let Some(v) = values.get($key) {
                    args.$field = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
                }
            }
        };
    }
    macro_rules! ini_str {
        ($field:ident, $key:literal) => {
            if args.$field.is_none() {
                if let Some(v) = values.get($key) {
                    args.$field = Some((*v).to_string());
                }
            }
        };
    }

    ini_bool!(force, "force");
    ini_bool!(recursive, "recursive");
    ini_bool!(combine_multi, "combine-multi");
    ini_bool!(all_calibrations, "all-calibrations");
    ini_bool!(normalize_det_names, "normalize-det-names");
    ini_bool!(sum_all_spectra, "sum-all-spectra");
    ini_bool!(combine_input_files, "combine-input-files");
    ini_str!(format, "format");
    ini_str!(set_model, "set-model");
    if let Some(v) = values.get("rebin-factor") {
        if args.rebin_factor == 1 {
            if let Ok(n) = v.parse() {
                args.rebin_factor = n;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::default()
    }

    #[test]
    fn no_inputs_is_exit_code_2() {
        let args = base_args();
        let err = validate(args).unwrap_err();
        assert_eq!(err.code, 2);
    }

    #[test]
    fn derived_only_and_no_derived_conflict() {
        let mut args = base_args();
        args.positional = vec![PathBuf::from("Cargo.toml")];
        args.output = Some(PathBuf::from("/tmp/specutils-test-out.txt"));
        args.format = Some("txt".to_string());
        args.derived_only = true;
        args.no_derived = true;
        let err = validate(args).unwrap_err();
        assert_eq!(err.code, 40);
    }

    #[test]
    fn combine_requires_at_least_two_inputs() {
        let mut args = base_args();
        args.positional = vec![PathBuf::from("Cargo.toml")];
        args.output = Some(PathBuf::from("/tmp/specutils-test-out.txt"));
        args.format = Some("txt".to_string());
        args.combine_input_files = true;
        let err = validate(args).unwrap_err();
        assert_eq!(err.code, 24);
    }

    #[test]
    fn sum_det_per_sample_and_sum_samples_per_det_conflict() {
        let mut args = base_args();
        args.positional = vec![PathBuf::from("Cargo.toml")];
        args.output = Some(PathBuf::from("/tmp/specutils-test-out.txt"));
        args.format = Some("txt".to_string());
        args.sum_det_per_sample = true;
        args.sum_samples_per_det = true;
        let err = validate(args).unwrap_err();
        assert_eq!(err.code, 36);
    }

    #[test]
    fn uri_options_without_uri_format_are_rejected() {
        let mut args = base_args();
        args.positional = vec![PathBuf::from("Cargo.toml")];
        args.output = Some(PathBuf::from("/tmp/specutils-test-out.txt"));
        args.format = Some("txt".to_string());
        args.uri_option = vec!["AsMailToUri".to_string()];
        let err = validate(args).unwrap_err();
        assert_eq!(err.code, 17);
    }
}
