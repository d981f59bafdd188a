pub mod layout;
mod pdf;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::GradedResult;
use crate::scoring::ScoreTotal;

const FILE_SUFFIX: &str = "_results.pdf";
const DEFAULT_FILE_STEM: &str = "test";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("failed to render PDF: {0}")]
    Pdf(String),
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Who and what the report is about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportMeta {
    pub subject: Option<String>,
    pub user_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub total: ScoreTotal,
}

impl Report {
    /// Writes into `target`; a directory gets the default file name appended.
    pub fn write_to(&self, target: &Path) -> Result<PathBuf, ReportError> {
        let path = if target.is_dir() {
            target.join(&self.file_name)
        } else {
            target.to_path_buf()
        };
        fs::write(&path, &self.bytes)?;
        info!(target: "insightqa::report", path = %path.display(), bytes = self.bytes.len(), "report written");
        Ok(path)
    }
}

/// `<subject>_results.pdf`, with `test` standing in for a missing subject.
pub fn report_file_name(subject: Option<&str>) -> String {
    let stem = subject
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILE_STEM)
        .replace(['/', '\\'], "_");
    format!("{}{}", stem, FILE_SUFFIX)
}

pub fn generate(results: &[GradedResult], meta: &ReportMeta) -> Result<Report, ReportError> {
    let layout = layout::build(results, meta);
    let bytes = pdf::render(&layout)?;

    Ok(Report {
        file_name: report_file_name(meta.subject.as_deref()),
        pages: layout.pages.len(),
        total: layout.total,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(marks: u32) -> GradedResult {
        GradedResult {
            id: 1,
            question: "Define deadlock.".into(),
            answer: "A cycle of processes each waiting on the next.".into(),
            user_answer: "Processes waiting forever.".into(),
            similarity: 64.0,
            marks,
        }
    }

    mod file_name_tests {
        use super::*;

        #[test]
        fn uses_subject_with_suffix() {
            assert_eq!(report_file_name(Some("os")), "os_results.pdf");
        }

        #[test]
        fn falls_back_to_test() {
            assert_eq!(report_file_name(None), "test_results.pdf");
            assert_eq!(report_file_name(Some("  ")), "test_results.pdf");
        }

        #[test]
        fn path_separators_are_replaced() {
            assert_eq!(report_file_name(Some("a/b")), "a_b_results.pdf");
        }
    }

    mod generate_tests {
        use super::*;

        #[test]
        fn produces_pdf_bytes() {
            let meta = ReportMeta {
                subject: Some("os".into()),
                user_label: Some("me@example.com".into()),
            };
            let report = generate(&[graded(7), graded(3), graded(10)], &meta).unwrap();

            assert!(report.bytes.starts_with(b"%PDF"));
            assert_eq!(report.file_name, "os_results.pdf");
            assert_eq!(report.total.earned, 20);
            assert_eq!(report.total.possible, 30);
            assert_eq!(report.pages, 1);
        }

        #[test]
        fn empty_results_still_render() {
            let report = generate(&[], &ReportMeta::default()).unwrap();
            assert!(report.bytes.starts_with(b"%PDF"));
            assert_eq!(report.file_name, "test_results.pdf");
            assert_eq!(report.total.to_string(), "0 / 0");
        }

        #[test]
        fn long_report_has_several_pages() {
            let results: Vec<GradedResult> = (0..80).map(|i| graded(i % 11)).collect();
            let report = generate(&results, &ReportMeta::default()).unwrap();
            assert!(report.pages > 1);
        }

        #[test]
        fn write_to_directory_uses_file_name() {
            let dir = tempfile::tempdir().unwrap();

            let report = generate(&[graded(5)], &ReportMeta::default()).unwrap();
            let path = report.write_to(dir.path()).unwrap();

            assert_eq!(path, dir.path().join("test_results.pdf"));
            assert_eq!(fs::read(&path).unwrap(), report.bytes);
        }

        #[test]
        fn write_to_file_path_keeps_given_name() {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("attempt-12.pdf");

            let report = generate(&[graded(5)], &ReportMeta::default()).unwrap();
            let path = report.write_to(&target).unwrap();

            assert_eq!(path, target);
            assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
        }
    }
}
