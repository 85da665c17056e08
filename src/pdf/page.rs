//! Page setup for exported documents.
//!
//! Callers send a loose [`PageOptionsRequest`]; [`PageOptionsRequest::resolve`]
//! validates it into a [`PageOptions`] the exporter can apply. Size and margins
//! travel inside the document as an `@page` rule; page ranges are applied to
//! the finished PDF.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use lopdf::Document;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PdfError;
use crate::invoice::models::lenient_text;
use crate::invoice::validation::{ValidationError, ValidationErrors};

lazy_static! {
    static ref CSS_LENGTH: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(px|in|cm|mm)?$").unwrap();
    static ref HEAD_TAG: Regex = Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap();
}

const DEFAULT_MARGIN: &str = "20px";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
}

impl PageFormat {
    /// Portrait width and height in inches.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Tabloid => (11.0, 17.0),
            PageFormat::Ledger => (17.0, 11.0),
            PageFormat::A0 => (33.1, 46.8),
            PageFormat::A1 => (23.4, 33.1),
            PageFormat::A2 => (16.54, 23.4),
            PageFormat::A3 => (11.7, 16.54),
            PageFormat::A4 => (8.27, 11.7),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::A6 => (4.13, 5.83),
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            "tabloid" => Ok(PageFormat::Tabloid),
            "ledger" => Ok(PageFormat::Ledger),
            "a0" => Ok(PageFormat::A0),
            "a1" => Ok(PageFormat::A1),
            "a2" => Ok(PageFormat::A2),
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            "a6" => Ok(PageFormat::A6),
            other => Err(format!("unknown page format '{}'", other)),
        }
    }
}

/// Page margins as CSS lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Margin {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margin {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

impl Margin {
    pub fn uniform(value: &str) -> Self {
        Self {
            top: value.to_string(),
            right: value.to_string(),
            bottom: value.to_string(),
            left: value.to_string(),
        }
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// 1-based inclusive page spans; an open end runs to the first or last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRanges(Vec<(Option<u32>, Option<u32>)>);

impl PageRanges {
    pub fn contains(&self, page: u32) -> bool {
        self.0.iter().any(|(start, end)| {
            start.map_or(true, |s| page >= s) && end.map_or(true, |e| page <= e)
        })
    }

    /// Drop every page of `pdf` outside the ranges.
    pub fn apply(&self, pdf: &[u8]) -> Result<Vec<u8>, PdfError> {
        let mut document =
            Document::load_mem(pdf).map_err(|e| PdfError::PostProcess(e.to_string()))?;
        let total = document.get_pages().len() as u32;

        let discard: Vec<u32> = (1..=total).filter(|page| !self.contains(*page)).collect();
        if discard.len() as u32 == total {
            return Err(PdfError::NoPagesSelected { total });
        }
        if discard.is_empty() {
            return Ok(pdf.to_vec());
        }

        document.delete_pages(&discard);
        document.prune_objects();

        let mut out = Vec::with_capacity(pdf.len());
        document
            .save_to(&mut out)
            .map_err(|e| PdfError::PostProcess(e.to_string()))?;
        Ok(out)
    }
}

impl FromStr for PageRanges {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let page = |part: &str| -> Result<Option<u32>, String> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            match part.parse::<u32>() {
                Ok(n) if n >= 1 => Ok(Some(n)),
                _ => Err(format!("'{}' is not a page number", part)),
            }
        };

        let mut ranges = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let range = match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (page(start)?, page(end)?);
                    if start.is_none() && end.is_none() {
                        return Err(format!("'{}' is not a page range", part));
                    }
                    if let (Some(s), Some(e)) = (start, end) {
                        if s > e {
                            return Err(format!("range '{}' ends before it starts", part));
                        }
                    }
                    (start, end)
                }
                None => {
                    let single = page(part)?;
                    (single, single)
                }
            };
            ranges.push(range);
        }

        if ranges.is_empty() {
            return Err("page range is empty".to_string());
        }
        Ok(PageRanges(ranges))
    }
}

/// Validated page setup handed to a [`super::PdfExporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub format: PageFormat,
    pub margin: Margin,
    pub landscape: bool,
    pub page_ranges: Option<PageRanges>,
    pub print_background: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            margin: Margin::default(),
            landscape: false,
            page_ranges: None,
            print_background: true,
        }
    }
}

impl PageOptions {
    pub fn a4() -> Self {
        Self::default()
    }

    /// CSS `size` value, orientation applied.
    pub fn page_size(&self) -> String {
        let (width, height) = self.format.dimensions();
        let (width, height) = if self.landscape {
            (height, width)
        } else {
            (width, height)
        };
        format!("{}in {}in", width, height)
    }

    pub fn page_css(&self) -> String {
        let mut css = format!(
            "@page{{size:{};margin:{};}}",
            self.page_size(),
            self.margin
        );
        if self.print_background {
            css.push_str("html{-webkit-print-color-adjust:exact;print-color-adjust:exact;}");
        }
        css
    }

    /// Inject the page rule right after `<head>`, or in front of the document
    /// when it has none. Rules that come later in the document still win.
    pub fn apply_to_html(&self, html: &str) -> String {
        let style = format!("<style>{}</style>", self.page_css());
        match HEAD_TAG.find(html) {
            Some(head) => {
                let mut out = String::with_capacity(html.len() + style.len());
                out.push_str(&html[..head.end()]);
                out.push_str(&style);
                out.push_str(&html[head.end()..]);
                out
            }
            None => format!("{}{}", style, html),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MarginRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "20px")]
    pub top: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub right: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bottom: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub left: Option<String>,
}

/// Page options as posted by callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageOptionsRequest {
    #[schema(example = "A4")]
    pub format: Option<String>,
    pub margin: Option<MarginRequest>,
    pub landscape: Option<bool>,
    #[schema(example = "1-2, 4")]
    pub page_ranges: Option<String>,
    pub print_background: Option<bool>,
}

impl PageOptionsRequest {
    pub fn resolve(&self) -> Result<PageOptions, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut options = PageOptions::default();

        if let Some(format) = self.format.as_deref().filter(|f| !f.trim().is_empty()) {
            match format.parse() {
                Ok(format) => options.format = format,
                Err(message) => errors.add(
                    ValidationError::new("options.format", message)
                        .with_suggestion("Use Letter, Legal, Tabloid, Ledger or A0 to A6"),
                ),
            }
        }

        if let Some(margin) = &self.margin {
            // Sides left out of a supplied margin object collapse to zero.
            let mut side = |name: &str, value: &Option<String>| -> String {
                match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                    None => "0".to_string(),
                    Some(raw) => css_length(raw).unwrap_or_else(|| {
                        errors.add(
                            ValidationError::new(
                                format!("options.margin.{}", name),
                                format!("'{}' is not a valid length", raw),
                            )
                            .with_suggestion("Use a number with px, in, cm or mm"),
                        );
                        "0".to_string()
                    }),
                }
            };
            options.margin = Margin {
                top: side("top", &margin.top),
                right: side("right", &margin.right),
                bottom: side("bottom", &margin.bottom),
                left: side("left", &margin.left),
            };
        }

        if let Some(ranges) = self.page_ranges.as_deref().filter(|r| !r.trim().is_empty()) {
            match ranges.parse() {
                Ok(ranges) => options.page_ranges = Some(ranges),
                Err(message) => errors.add(
                    ValidationError::new("options.pageRanges", message)
                        .with_suggestion("Use a list such as '1-3, 5, 8-'"),
                ),
            }
        }

        options.landscape = self.landscape.unwrap_or(false);
        options.print_background = self.print_background.unwrap_or(true);

        errors.into_result().map(|_| options)
    }
}

/// Normalize a CSS length; bare numbers are pixels.
fn css_length(raw: &str) -> Option<String> {
    let caps = CSS_LENGTH.captures(raw)?;
    let unit = caps.get(2).map_or("px", |m| m.as_str());
    Some(format!("{}{}", &caps[1], unit))
}
