use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::error::{BriefError, Result};
use crate::types::ReportPayload;

/// Outputs the payload as pretty JSON. Writes to a file if given, otherwise stdout.
pub fn report_json(payload: &ReportPayload, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let file = File::create(path)
            .map_err(|e| BriefError::io(format!("Failed to open {} for writing", path.display()), e))?;
        write_payload(BufWriter::new(file), payload)
            .map_err(|e| with_path(e, path))?;
        eprintln!("✓ JSON data written to {}", path.display());
    } else {
        let stdout = std::io::stdout();
        write_payload(BufWriter::new(stdout.lock()), payload)?;
    }
    Ok(())
}

/// `report.md` → `report_data.json`, next to the report.
pub fn data_path_for(report: &Path) -> std::path::PathBuf {
    let stem = report.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
    report.with_file_name(format!("{stem}_data.json"))
}

fn write_payload<W: Write>(mut writer: W, payload: &ReportPayload) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| BriefError::io("Failed to finalize JSON output", e))
}

fn with_path(err: BriefError, path: &Path) -> BriefError {
    match err {
        BriefError::Io { source, .. } => BriefError::io(format!("Failed to write {}", path.display()), source),
        other => other,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::sample_payload;
    use std::path::PathBuf;

    #[test]
    fn test_data_path_uses_report_stem() {
        assert_eq!(
            data_path_for(Path::new("out/PROJECT_ANALYSIS_REPORT.md")),
            PathBuf::from("out/PROJECT_ANALYSIS_REPORT_data.json")
        );
        assert_eq!(data_path_for(Path::new("brief")), PathBuf::from("brief_data.json"));
    }

    #[test]
    fn test_file_output_is_valid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        report_json(&sample_payload(), Some(&path)).expect("write json");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.ends_with('\n'), "Output should end with a newline");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["meta"]["project_name"], "Demo");
        let ts = value["commits"][0]["timestamp"].as_str().expect("timestamp string");
        assert!(ts.starts_with("2024-02-01T09:00:00+02:00"), "ISO-8601 with offset: {ts}");
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("data.json");
        let err = report_json(&sample_payload(), Some(&path)).expect_err("parent does not exist");
        assert!(err.to_string().contains("data.json"), "Error should name the file: {err}");
    }
}
