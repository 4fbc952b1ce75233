//! CLI entry point: parses arguments, validates them into a run plan, pushes
//! each input through the transform pipeline, and hands the result to either
//! the combine engine or the output planner.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, warn};

use specutils::cli::{self, Args, ValidatedRun};
use specutils::combine::combine_files;
use specutils::error::BatchErrorKind;
use specutils::io::sniff_and_parse;
use specutils::output::{plan_base_path, plan_outputs_for_file, write_planned_output, OutputTarget};
use specutils::pipeline::run_pipeline;
use specutils::spectrum::SpecFile;

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let run = match cli::validate(args) {
        Ok(run) => run,
        Err(e) => {
            error!("{}", e.message);
            return ExitCode::from(e.code as u8);
        }
    };

    match execute(&run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Loads and pipelines every input, then dispatches to the combine path or
/// the per-file output-planner path depending on `run.combine`.
///
/// Returns the worst `BatchErrorKind` encountered, translated to its numeric
/// exit code (spec.md §6: `ExistingOutput` > `MissingInput` > `DecodeFailure`
/// > `EncodeFailure`), or `Ok(())` if every input and output succeeded.
fn execute(run: &ValidatedRun) -> Result<(), u8> {
    let input_root = run.inputdir.as_deref();
    let mut worst: Option<BatchErrorKind> = None;

    let mut loaded: Vec<(PathBuf, SpecFile)> = Vec::new();
    for input in &run.inputs {
        match load_one(input, run) {
            Ok(Some(spec)) => loaded.push((input.clone(), spec)),
            Ok(None) => warn!("{}: detector selection left no records, skipping", input.display()),
            Err(kind) => {
                error!("{}: {:?}", input.display(), kind);
                note_worst(&mut worst, kind);
            }
        }
    }

    if let Some(sort) = run.combine {
        if loaded.is_empty() {
            note_worst(&mut worst, BatchErrorKind::MissingInput);
        } else {
            let specs: Vec<SpecFile> = loaded.into_iter().map(|(_, s)| s).collect();
            match combine_files(specs, sort, run.pipeline.sum_all) {
                Ok(combined) => {
                    let base_path = match &run.output {
                        OutputTarget::File(path) => path.clone(),
                        OutputTarget::Directory(dir) => dir.join(format!("combined.{}", run.format.canonical_extension())),
                    };
                    write_all_outputs(&combined, &base_path, run, &mut worst);
                }
                Err(e) => {
                    error!("{}", e.message);
                    return Err(e.code as u8);
                }
            }
        }
    } else {
        let total = run.inputs.len();
        for (input, spec) in &loaded {
            let base_path = plan_base_path(&run.output, Some(input), input_root, total, run.format.canonical_extension());
            write_all_outputs(spec, &base_path, run, &mut worst);
        }
    }

    match worst {
        None => Ok(()),
        Some(kind) => Err(kind.exit_code() as u8),
    }
}

fn write_all_outputs(spec: &SpecFile, base_path: &Path, run: &ValidatedRun, worst: &mut Option<BatchErrorKind>) {
    let planned = plan_outputs_for_file(spec, base_path, run.format, run.multi_record_policy);
    for plan in planned {
        if let Err(kind) = write_planned_output(&plan, spec, run.format, run.force) {
            note_worst(worst, kind);
        }
    }
}

/// Keeps the highest-*priority* `BatchErrorKind` seen so far. spec.md §7
/// fixes the priority as "5 > 6 > 7 > 8" — `ExistingOutput` (5) outranks
/// `MissingInput` (6), which outranks `DecodeFailure` (7), which outranks
/// `EncodeFailure` (8) — so the numerically *lower* exit code wins, not the
/// larger one.
fn note_worst(worst: &mut Option<BatchErrorKind>, candidate: BatchErrorKind) {
    let replace = match worst {
        None => true,
        Some(current) => candidate.exit_code() < current.exit_code(),
    };
    if replace {
        *worst = Some(candidate);
    }
}

/// Reads and pipelines a single input file. `Ok(None)` means the file was
/// read fine but detector selection dropped every record.
fn load_one(path: &Path, run: &ValidatedRun) -> Result<Option<SpecFile>, BatchErrorKind> {
    let bytes = std::fs::read(path).map_err(|e| {
        warn!("{}: {}", path.display(), e);
        BatchErrorKind::MissingInput
    })?;

    let mut spec = sniff_and_parse(&bytes).map_err(|e| {
        warn!("{}: {}", path.display(), e);
        BatchErrorKind::DecodeFailure
    })?;

    if !run_pipeline(&mut spec, &run.pipeline) {
        return Ok(None);
    }

    Ok(Some(spec))
}
