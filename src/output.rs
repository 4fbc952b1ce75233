//! The output planner (spec.md §4.4): decides how many files a run produces
//! and what each is named, then invokes the codec registry's writer for
//! each.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{BatchErrorKind, WriteError};
use crate::io::{writer_for, SpecFormat};
use crate::spectrum::{CleanupFlags, DerivedDataProperties, SpecFile};

/// Where the user pointed the `-o`/output argument.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    File(PathBuf),
    Directory(PathBuf),
}

/// How a single-record-only writer (CHN, SPC variants, SPE, CNF, TKA) is
/// asked to handle a `SpecFile` with more than one remaining record
/// (spec.md §4.4 "Multi-record policy"). `CurrentOnly` has no batch-mode
/// meaning (spec.md: "undefined in batch/CLI mode") and is not represented
/// here; the CLI always resolves to one of these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiRecordPolicy {
    SumToOne,
    EachSeparate,
}

/// One planned `(path, samples, detectors)` triple ready to hand to a
/// writer. For multi-record formats `samples`/`detectors` cover every
/// remaining record; for single-record formats under `EachSeparate` each
/// planned output selects exactly one `(sample, detector)` pair.
pub struct PlannedOutput {
    pub path: PathBuf,
    pub samples: HashSet<i32>,
    pub detectors: HashSet<String>,
    /// Set only for the `SumToOne` multi-record policy: a one-record
    /// `SpecFile` holding the sum of every selected record, written in place
    /// of the input `SpecFile` passed to `write_planned_output`.
    pub synthesized: Option<SpecFile>,
}

/// Computes the output path(s) for one input, given the output target and
/// whether this run is combining multiple inputs into it (spec.md §4.4
/// "Output-path rules").
///
/// `input_path` is `None` when planning the single output of a combine run.
pub fn plan_base_path(
    target: &OutputTarget,
    input_path: Option<&Path>,
    input_root: Option<&Path>,
    total_inputs: usize,
    ext: &str,
) -> PathBuf {
    match target {
        OutputTarget::File(path) => path.clone(),
        OutputTarget::Directory(dir) => {
            let stem = input_path
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "output".to_string());

            if let (Some(root), Some(input)) = (input_root, input_path) {
                // Recursive input-dir mode: mirror the relative directory
                // tree under the output directory.
                let relative_dir = input
                    .strip_prefix(root)
                    .ok()
                    .and_then(|p| p.parent())
                    .filter(|p| !p.as_os_str().is_empty());
                let mut out = dir.clone();
                if let Some(rel) = relative_dir {
                    out.push(rel);
                }
                out.push(format!("{stem}.{ext}"));
                return out;
            }

            let _ = total_inputs; // one-per-input and single-input cases name identically
            dir.join(format!("{stem}.{ext}"))
        }
    }
}

/// Expands a post-pipeline `SpecFile` into the planned outputs for one base
/// path, applying the multi-record policy when `format` only accepts a
/// single record per output (spec.md §4.4 "Multi-record policy").
pub fn plan_outputs_for_file(
    spec: &SpecFile,
    base_path: &Path,
    format: SpecFormat,
    policy: MultiRecordPolicy,
) -> Vec<PlannedOutput> {
    let all_samples: HashSet<i32> = spec.sample_numbers().iter().copied().collect();
    let all_detectors: HashSet<String> = spec.detector_names().iter().cloned().collect();

    if !format.single_record_only() || spec.records().len() <= 1 {
        return vec![PlannedOutput {
            path: base_path.to_path_buf(),
            samples: all_samples,
            detectors: all_detectors,
            synthesized: None,
        }];
    }

    match policy {
        MultiRecordPolicy::SumToOne => match build_summed_output(spec, &all_samples, &all_detectors) {
            Some(summed_spec) => {
                let samples = summed_spec.sample_numbers().iter().copied().collect();
                let detectors = summed_spec.detector_names().iter().cloned().collect();
                vec![PlannedOutput {
                    path: base_path.to_path_buf(),
                    samples,
                    detectors,
                    synthesized: Some(summed_spec),
                }]
            }
            None => Vec::new(),
        },
        MultiRecordPolicy::EachSeparate => spec
            .records()
            .iter()
            .enumerate()
            .map(|(i, r)| PlannedOutput {
                path: suffixed_path(base_path, i),
                samples: HashSet::from([r.sample_number]),
                detectors: HashSet::from([r.detector_name.clone()]),
                synthesized: None,
            })
            .collect(),
    }
}

/// Builds the one-record `SpecFile` a single-record-only writer needs when
/// `MultiRecordPolicy::SumToOne` applies to a multi-record input (spec.md
/// §8 end-to-end scenario 4: `--combine-multi=true` on a 4-record file must
/// yield one output containing the sum of all 4, not a `WriteError::
/// InvalidSelection` from handing the writer the whole selection).
///
/// Mirrors `transform::summing::apply_sum_all`, but operates on a clone so
/// the caller's already-piped-through `SpecFile` is untouched. Returns
/// `None` (after logging) when no contributor has a valid gamma
/// calibration, matching spec.md §7's `IncompatibleCalibration` handling.
fn build_summed_output(
    spec: &SpecFile,
    samples: &HashSet<i32>,
    detectors: &HashSet<String>,
) -> Option<SpecFile> {
    match spec.sum_measurements(samples, detectors) {
        Ok(mut summed) => {
            summed.sample_number = 1;
            summed.detector_name = "summed".to_string();
            summed.derived_data_properties |= DerivedDataProperties::GAMMA_SUMMED;

            let mut out = spec.clone();
            out.records_mut().clear();
            out.push_record(summed);
            out.cleanup_after_load(CleanupFlags::DontChangeOrReorderSamples);
            out.uuid.clear();
            Some(out)
        }
        Err(e) => {
            warn!("combine-multi sum-to-one requested but could not be performed: {}", e);
            None
        }
    }
}

fn suffixed_path(base: &Path, index: usize) -> PathBuf {
    let ext = base.extension().map(|e| e.to_string_lossy().to_string());
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match &ext {
        Some(ext) => format!("{stem}_{index:04}.{ext}"),
        None => format!("{stem}_{index:04}"),
    };
    base.with_file_name(name)
}

/// Writes one planned output, respecting the collision policy: if the path
/// exists and `force_overwrite` is false, the write is skipped and
/// `BatchErrorKind::ExistingOutput` is reported (spec.md §4.4 "Collision
/// policy").
pub fn write_planned_output(
    planned: &PlannedOutput,
    spec: &SpecFile,
    format: SpecFormat,
    force_overwrite: bool,
) -> Result<(), BatchErrorKind> {
    if planned.path.exists() && !force_overwrite {
        warn!(
            "output path {} already exists; use --force to overwrite",
            planned.path.display()
        );
        return Err(BatchErrorKind::ExistingOutput);
    }

    let Some(writer) = writer_for(format) else {
        warn!("format {:?} has no writer", format.canonical_extension());
        return Err(BatchErrorKind::EncodeFailure);
    };

    if let Some(parent) = planned.path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("could not create output directory {}: {}", parent.display(), e);
                return Err(BatchErrorKind::EncodeFailure);
            }
        }
    }

    let file = match File::create(&planned.path) {
        Ok(f) => f,
        Err(e) => {
            warn!("could not create output file {}: {}", planned.path.display(), e);
            return Err(BatchErrorKind::EncodeFailure);
        }
    };
    let mut out = BufWriter::new(file);

    let source = planned.synthesized.as_ref().unwrap_or(spec);
    match writer.write(&mut out, source, &planned.samples, &planned.detectors) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("could not write {}: {}", planned.path.display(), e);
            if !matches!(e, WriteError::Io(_)) {
                // Partial output is left on disk and logged, per spec.md §5
                // "on decode or encode failure, the partial output file is
                // left on disk ... but not deleted".
            }
            Err(BatchErrorKind::EncodeFailure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{CleanupFlags, EnergyCalibration, Record};
    use tempfile::tempdir;

    fn spec_with_records(n: usize) -> SpecFile {
        let mut spec = SpecFile::new();
        for i in 0..n {
            let mut r = Record::new(i as i32 + 1, "A");
            r.gamma_counts = Some(vec![1.0, 2.0]);
            r.energy_calibration = Some(EnergyCalibration::polynomial(vec![0.0, 1.0], 2).shared());
            spec.push_record(r);
        }
        spec.cleanup_after_load(CleanupFlags::StandardCleanup);
        spec
    }

    #[test]
    fn directory_target_uses_input_basename() {
        let target = OutputTarget::Directory(PathBuf::from("/out"));
        let path = plan_base_path(&target, Some(Path::new("/in/sample.n42")), None, 1, "pcf");
        assert_eq!(path, PathBuf::from("/out/sample.pcf"));
    }

    #[test]
    fn recursive_mode_mirrors_relative_directory() {
        let target = OutputTarget::Directory(PathBuf::from("/out"));
        let path = plan_base_path(
            &target,
            Some(Path::new("/in/sub/sample.n42")),
            Some(Path::new("/in")),
            1,
            "pcf",
        );
        assert_eq!(path, PathBuf::from("/out/sub/sample.pcf"));
    }

    #[test]
    fn each_separate_suffixes_with_zero_padded_index() {
        let spec = spec_with_records(2);
        let planned = plan_outputs_for_file(
            &spec,
            Path::new("/out/sample.chn"),
            SpecFormat::Chn,
            MultiRecordPolicy::EachSeparate,
        );
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].path, PathBuf::from("/out/sample_0000.chn"));
        assert_eq!(planned[1].path, PathBuf::from("/out/sample_0001.chn"));
    }

    #[test]
    fn sum_to_one_emits_a_single_summed_record() {
        let spec = spec_with_records(3);
        let planned = plan_outputs_for_file(
            &spec,
            Path::new("/out/sample.chn"),
            SpecFormat::Chn,
            MultiRecordPolicy::SumToOne,
        );
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].samples.len(), 1);
        assert_eq!(planned[0].detectors.len(), 1);
        let synthesized = planned[0].synthesized.as_ref().unwrap();
        assert_eq!(synthesized.records().len(), 1);
        assert_eq!(synthesized.records()[0].gamma_sum(), 9.0);
    }

    #[test]
    fn existing_output_without_force_is_a_collision() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"placeholder").unwrap();

        let spec = spec_with_records(1);
        let planned = PlannedOutput {
            path: path.clone(),
            samples: HashSet::from([1]),
            detectors: HashSet::from(["A".to_string()]),
            synthesized: None,
        };
        let err = write_planned_output(&planned, &spec, SpecFormat::Txt, false).unwrap_err();
        assert_eq!(err, BatchErrorKind::ExistingOutput);
    }
}
