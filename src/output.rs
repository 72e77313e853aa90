//! CLI output formatting.
//!
//! Entries are shown by their logical path, which is what the manifest
//! author wrote. The real path follows an arrow when completion changed it,
//! so `/` and `/docs/` read as what they are:
//!
//! ## Check
//!
//! ```text
//! Manifest (index file: index.html)
//! 001 / → index.html
//!     View: template
//!     Kwargs: {"message":"Hello","template":"hello.html"}
//! 002 /hello.css
//!     View: static_file
//!     Kwargs: {"path":"static/hello.css"}
//!
//! 2 files
//! ```
//!
//! ## Generate
//!
//! ```text
//! 001 / → index.html (1204 bytes)
//!     View: template
//! 002 /hello.css (88 bytes)
//!     View: static_file
//! 003 /index.html (12 bytes)
//!     View: text
//!     Overwrites an earlier entry
//!
//! Generated 3 files (1304 bytes) in out
//! ```
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::generate::GenerateReport;
use crate::manifest::Manifest;
use std::collections::HashSet;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// `/path`, plus `→ realpath` when the two differ.
fn entry_line(index: usize, path: &str, realpath: &str) -> String {
    if path == realpath {
        format!("{} /{}", format_index(index), path)
    } else {
        format!("{} /{} \u{2192} {}", format_index(index), path, realpath)
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_manifest(manifest: &Manifest, index_file: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match index_file {
        Some(index_file) => lines.push(format!("Manifest (index file: {})", index_file)),
        None => lines.push("Manifest (no index file)".to_string()),
    }

    for (i, filespec) in manifest.iter().enumerate() {
        lines.push(entry_line(i + 1, filespec.path(), filespec.realpath()));
        lines.push(format!("    View: {}", filespec.view_name()));
        if !filespec.kwargs().is_empty() {
            let kwargs = serde_json::Value::Object(filespec.kwargs().clone());
            lines.push(format!("    Kwargs: {}", kwargs));
        }
    }

    lines.push(String::new());
    lines.push(plural(manifest.len(), "file"));
    lines
}

/// Print a manifest listing to stdout.
pub fn print_manifest(manifest: &Manifest, index_file: Option<&str>) {
    for line in format_manifest(manifest, index_file) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(report: &GenerateReport, output_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let mut seen = HashSet::new();

    for (i, file) in report.files.iter().enumerate() {
        lines.push(format!(
            "{} ({} bytes)",
            entry_line(i + 1, &file.path, &file.realpath),
            file.bytes
        ));
        lines.push(format!("    View: {}", file.view));
        if !seen.insert(file.realpath.as_str()) {
            lines.push("    Overwrites an earlier entry".to_string());
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} ({} bytes) in {}",
        plural(report.files.len(), "file"),
        report.total_bytes(),
        output_dir.display()
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport, output_dir: &Path) {
    for line in format_generate_output(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratedFile;
    use crate::test_helpers::view_value;
    use serde_json::json;

    fn generated(path: &str, realpath: &str, bytes: usize) -> GeneratedFile {
        GeneratedFile {
            path: path.to_string(),
            realpath: realpath.to_string(),
            view: "text".to_string(),
            bytes,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn entry_line_shows_arrow_only_when_completed() {
        assert_eq!(entry_line(1, "", "index.html"), "001 / \u{2192} index.html");
        assert_eq!(entry_line(2, "a.css", "a.css"), "002 /a.css");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
    }

    // =========================================================================
    // format_manifest
    // =========================================================================

    #[test]
    fn manifest_listing() {
        let manifest = Manifest::from_entries([
            ("", view_value("x"), json!({"message": "Hi"})).into(),
            ("b.txt", view_value("y")).into(),
        ])
        .unwrap()
        .complete(Some("index.html"))
        .unwrap();

        let lines = format_manifest(&manifest, Some("index.html"));
        assert_eq!(
            lines,
            vec![
                "Manifest (index file: index.html)",
                "001 / \u{2192} index.html",
                "    View: value_returner",
                r#"    Kwargs: {"message":"Hi"}"#,
                "002 /b.txt",
                "    View: value_returner",
                "",
                "2 files",
            ]
        );
    }

    #[test]
    fn empty_manifest_listing() {
        let lines = format_manifest(&Manifest::new(), None);
        assert_eq!(lines, vec!["Manifest (no index file)", "", "0 files"]);
    }

    // =========================================================================
    // format_generate_output
    // =========================================================================

    #[test]
    fn generate_output_lists_files_and_total() {
        let report = GenerateReport {
            files: vec![generated("", "index.html", 6), generated("a.txt", "a.txt", 4)],
            overwritten: vec![],
        };
        let lines = format_generate_output(&report, Path::new("out"));
        assert_eq!(
            lines,
            vec![
                "001 / \u{2192} index.html (6 bytes)",
                "    View: text",
                "002 /a.txt (4 bytes)",
                "    View: text",
                "",
                "Generated 2 files (10 bytes) in out",
            ]
        );
    }

    #[test]
    fn generate_output_marks_overwrites() {
        let report = GenerateReport {
            files: vec![
                generated("", "index.html", 5),
                generated("index.html", "index.html", 6),
            ],
            overwritten: vec!["index.html".to_string()],
        };
        let lines = format_generate_output(&report, Path::new("out"));
        assert_eq!(lines[3], "    View: text");
        assert_eq!(lines[4], "    Overwrites an earlier entry");
        assert_eq!(lines.last().unwrap(), "Generated 2 files (11 bytes) in out");
    }
}
