//! Self-contained HTML output: embedded D3-like chart assets, one chart
//! block per emitted record. A single-record selection with `json_only` set
//! emits just the data array instead of a full page (spec.md §4.6, §6
//! "HTML output is a self-contained page ... a single-record 'JSON'
//! sub-mode emits just the data array.").
//!
//! Output only: there is no sensible way to recover a [`SpecFile`] from a
//! rendered chart, so this format has no [`SpecFileReader`] impl.

use std::collections::HashSet;
use std::io::Write;

use crate::error::WriteError;
use crate::spectrum::SpecFile;

use super::traits::SpecFileWriter;

const TEMPLATE_HEAD: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8">
<script>
// Minimal embedded chart renderer; no external D3 fetch at view time.
function renderChart(containerId, data) {
  var el = document.getElementById(containerId);
  var svg = document.createElementNS("http://www.w3.org/2000/svg", "svg");
  svg.setAttribute("width", "800"); svg.setAttribute("height", "300");
  var max = Math.max.apply(null, data.map(function(p){return p[1];}));
  data.forEach(function(p, i) {
    var rect = document.createElementNS("http://www.w3.org/2000/svg", "rect");
    rect.setAttribute("x", i); rect.setAttribute("width", 1);
    rect.setAttribute("y", 300 - 300 * p[1] / (max || 1));
    rect.setAttribute("height", 300 * p[1] / (max || 1));
    svg.appendChild(rect);
  });
  el.appendChild(svg);
}
</script>
</head><body>
"#;
const TEMPLATE_TAIL: &str = "</body></html>\n";

/// `[channel, count]` pairs, the payload both the full-page and json-only
/// modes serialize with `serde_json`.
fn chart_data(record: &crate::spectrum::Record) -> Vec<(usize, f64)> {
    record
        .gamma_counts
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(i, c)| (i, *c))
        .collect()
}

pub struct HtmlCodec {
    /// Single-record "JSON" sub-mode: emit only the data array.
    pub json_only: bool,
}

impl SpecFileWriter for HtmlCodec {
    fn write(
        &self,
        out: &mut dyn Write,
        spec: &SpecFile,
        samples: &HashSet<i32>,
        detectors: &HashSet<String>,
    ) -> Result<(), WriteError> {
        let selected: Vec<_> = spec
            .records()
            .iter()
            .filter(|r| samples.contains(&r.sample_number) && detectors.contains(&r.detector_name))
            .collect();

        if self.json_only {
            if selected.len() != 1 {
                return Err(WriteError::InvalidSelection {
                    format: "HtmlD3 (json-only)",
                    count: selected.len(),
                });
            }
            let array = chart_data(selected[0]);
            let json = serde_json::to_string(&array).map_err(WriteError::Json)?;
            out.write_all(json.as_bytes())?;
            return Ok(());
        }

        out.write_all(TEMPLATE_HEAD.as_bytes())?;
        for (idx, r) in selected.iter().enumerate() {
            let container = format!("chart{}", idx);
            writeln!(out, "<h3>{} (sample {})</h3>", r.detector_name, r.sample_number)?;
            writeln!(out, "<div id=\"{}\"></div>", container)?;
            let array = chart_data(r);
            let json = serde_json::to_string(&array).map_err(WriteError::Json)?;
            writeln!(out, "<script>renderChart(\"{}\", {});</script>", container, json)?;
        }
        out.write_all(TEMPLATE_TAIL.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Record;

    #[test]
    fn json_only_requires_exactly_one_record() {
        let mut spec = SpecFile::new();
        spec.push_record(Record::new(1, "A"));
        spec.push_record(Record::new(2, "A"));
        let mut buf = Vec::new();
        let samples = HashSet::from([1, 2]);
        let dets = HashSet::from(["A".to_string()]);
        let err = HtmlCodec { json_only: true }
            .write(&mut buf, &spec, &samples, &dets)
            .unwrap_err();
        assert!(matches!(err, WriteError::InvalidSelection { count: 2, .. }));
    }

    #[test]
    fn full_page_embeds_one_chart_per_record() {
        let mut spec = SpecFile::new();
        let mut r = Record::new(1, "A");
        r.gamma_counts = Some(vec![1.0, 2.0]);
        spec.push_record(r);
        let mut buf = Vec::new();
        let samples = HashSet::from([1]);
        let dets = HashSet::from(["A".to_string()]);
        HtmlCodec { json_only: false }.write(&mut buf, &spec, &samples, &dets).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("renderChart"));
        assert!(text.contains("<html>"));
    }
}
