//! Headless Chromium exporter.
//!
//! Each call writes the document into a fresh temporary directory, runs the
//! browser's `--print-to-pdf` mode on it and reads the result back. Nothing is
//! pooled: the child process lives only as long as one render.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::process::Command;

use super::{PageOptions, PdfError, PdfExporter};
use crate::config::BrowserConfig;

const HTML_FILE: &str = "document.html";
const PDF_FILE: &str = "document.pdf";
const VIRTUAL_TIME_BUDGET_MS: u64 = 10_000;

pub struct ChromiumExporter {
    config: BrowserConfig,
}

impl ChromiumExporter {
    pub fn new(config: BrowserConfig) -> Self {
        if !config.headless {
            log::warn!("BROWSER_HEADLESS=false: print-to-pdf may not work with a visible browser");
        }
        Self { config }
    }

    /// Command-line arguments for one render, configured launch args included.
    pub fn arguments(&self, work_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.config.headless {
            args.push("--headless".into());
        }
        for flag in [
            "--disable-gpu",
            "--no-pdf-header-footer",
            "--hide-scrollbars",
            "--run-all-compositor-stages-before-draw",
            "--no-first-run",
        ] {
            args.push(flag.into());
        }
        args.push(format!("--virtual-time-budget={}", VIRTUAL_TIME_BUDGET_MS).into());

        let mut profile = OsString::from("--user-data-dir=");
        profile.push(work_dir.join("profile"));
        args.push(profile);

        let mut output = OsString::from("--print-to-pdf=");
        output.push(work_dir.join(PDF_FILE));
        args.push(output);

        args.extend(self.config.args.iter().map(OsString::from));
        args.push(file_url(&work_dir.join(HTML_FILE)).into());
        args
    }
}

#[async_trait]
impl PdfExporter for ChromiumExporter {
    async fn render_to_pdf(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, PdfError> {
        let temp_dir = tempdir().map_err(PdfError::TempDir)?;
        let html_path = temp_dir.path().join(HTML_FILE);
        let pdf_path = temp_dir.path().join(PDF_FILE);

        tokio::fs::write(&html_path, options.apply_to_html(html))
            .await
            .map_err(PdfError::WriteHtml)?;

        let child = Command::new(&self.config.executable)
            .args(self.arguments(temp_dir.path()))
            .current_dir(temp_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PdfError::Spawn {
                executable: self.config.executable.clone(),
                source,
            })?;

        // On timeout the child future is dropped, which kills the browser.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| PdfError::Timeout(self.config.timeout))?
            .map_err(PdfError::Process)?;

        if !output.status.success() {
            return Err(PdfError::BrowserExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pdf = tokio::fs::read(&pdf_path).await.map_err(PdfError::ReadPdf)?;
        if pdf.is_empty() {
            return Err(PdfError::EmptyOutput);
        }
        log::debug!("Browser produced {} bytes of PDF", pdf.len());

        match &options.page_ranges {
            Some(ranges) => ranges.apply(&pdf),
            None => Ok(pdf),
        }
    }
}

fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{}", raw)
    } else {
        format!("file:///{}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn exporter(executable: &str, timeout: Duration) -> ChromiumExporter {
        ChromiumExporter::new(BrowserConfig {
            executable: executable.to_string(),
            args: vec!["--no-sandbox".to_string()],
            headless: true,
            timeout,
        })
    }

    #[test]
    fn test_arguments_point_at_work_dir() {
        let args = exporter("chromium", Duration::from_secs(30)).arguments(Path::new("/tmp/job"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "--headless");
        assert!(args.contains(&"--print-to-pdf=/tmp/job/document.pdf".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert_eq!(args.last().unwrap(), "file:///tmp/job/document.html");
    }

    #[test]
    fn test_file_url_for_windows_paths() {
        assert_eq!(
            file_url(Path::new("C:\\work\\document.html")),
            "file:///C:/work/document.html"
        );
    }

    #[tokio::test]
    async fn test_missing_browser_is_a_spawn_error() {
        let err = exporter("definitely-not-a-browser-binary", Duration::from_secs(5))
            .render_to_pdf("<p>x</p>", &PageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_browser_reports_exit_status() {
        let err = exporter("false", Duration::from_secs(5))
            .render_to_pdf("<p>x</p>", &PageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::BrowserExit { code: 1, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_browser_without_output_fails_to_read() {
        let err = exporter("true", Duration::from_secs(5))
            .render_to_pdf("<p>x</p>", &PageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::ReadPdf(_)));
    }
}
