//! Structured scrape results and the raw page data they are built from.
//!
//! The in-page JavaScript reports *raw* element data (text, computed
//! style, geometry); the visibility and viewport rules are applied on
//! the Rust side where they can be unit tested.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Title and meta-description; both best-effort signals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Heading levels that matter for document structure signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingTag {
    H1,
    H2,
    H3,
}

impl FromStr for HeadingTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H1" => Ok(Self::H1),
            "H2" => Ok(Self::H2),
            "H3" => Ok(Self::H3),
            _ => Err(()),
        }
    }
}

/// A visible heading with non-empty trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: HeadingTag,
    pub text: String,
}

/// A viewport-visible link or button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub text: String,
    pub is_above_the_fold: bool,
}

/// Input/select/textarea count for one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub input_count: u32,
}

/// Link count of the first navigation landmark (0 when absent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSummary {
    pub link_count: u32,
}

/// Structural/UX signals extracted from one page visit.
///
/// Transient: consumed by a collaborator for storage or reporting, not
/// persisted by this crate beyond the screenshot file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub metadata: PageMetadata,
    pub headings: Vec<Heading>,
    pub ctas: Vec<CallToAction>,
    pub forms: Vec<FormSummary>,
    pub navigation: NavigationSummary,
    pub screenshot_path: PathBuf,
}

/// Window extents as reported by the page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// Bounding client rect of one element.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct RawRect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// A heading as reported by the page, before filtering.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawHeading {
    pub tag: String,
    pub text: String,
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

/// A link/button candidate as reported by the page, before filtering.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCta {
    pub text: String,
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub rect: RawRect,
}

/// CTA extraction payload: elements plus the viewport they were measured in.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCtaPayload {
    pub viewport: ViewportSize,
    pub elements: Vec<RawCta>,
}

/// Raw per-form descendant control count.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct RawForm {
    pub input_count: u32,
}

/// Raw navigation landmark link count.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct RawNavigation {
    pub link_count: u32,
}
