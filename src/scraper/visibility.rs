//! Visibility, viewport and text filters applied to raw page data.

use super::schema::{
    CallToAction, Heading, RawCtaPayload, RawHeading, RawRect, ViewportSize,
};

/// Minimum trimmed CTA text length (exclusive).
const MIN_CTA_TEXT_LEN: usize = 2;

/// Style-level visibility: `display != none`, `visibility != hidden`,
/// `opacity != 0`. An unparseable opacity counts as visible.
pub(crate) fn is_style_visible(display: &str, visibility: &str, opacity: &str) -> bool {
    if display == "none" || visibility == "hidden" {
        return false;
    }
    match opacity.trim().parse::<f64>() {
        Ok(value) => value != 0.0,
        Err(_) => true,
    }
}

/// Geometric containment in the viewport: top/left at or past the
/// origin, bottom/right within the window extents.
pub(crate) fn is_within_viewport(rect: RawRect, viewport: ViewportSize) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom <= viewport.height
        && rect.right <= viewport.width
}

/// Above-the-fold is a strict comparison: an element starting exactly at
/// the viewport height is below the fold.
pub(crate) fn is_above_the_fold(top: f64, viewport_height: f64) -> bool {
    top < viewport_height
}

/// Keep style-visible headings with non-empty trimmed text and a tag we
/// track (H1-H3).
pub(crate) fn filter_headings(raw: Vec<RawHeading>) -> Vec<Heading> {
    raw.into_iter()
        .filter(|h| is_style_visible(&h.display, &h.visibility, &h.opacity))
        .filter_map(|h| {
            let tag = h.tag.parse().ok()?;
            let text = h.text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(Heading { tag, text })
        })
        .collect()
}

/// Keep style-visible, viewport-contained CTAs whose trimmed text is
/// longer than two characters, tagging each with its fold position.
pub(crate) fn filter_ctas(payload: RawCtaPayload) -> Vec<CallToAction> {
    let viewport = payload.viewport;
    payload
        .elements
        .into_iter()
        .filter(|c| is_style_visible(&c.display, &c.visibility, &c.opacity))
        .filter(|c| is_within_viewport(c.rect, viewport))
        .filter_map(|c| {
            let text = c.text.trim().to_string();
            if text.chars().count() <= MIN_CTA_TEXT_LEN {
                return None;
            }
            Some(CallToAction {
                text,
                is_above_the_fold: is_above_the_fold(c.rect.top, viewport.height),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::schema::{HeadingTag, RawCta};

    fn viewport() -> ViewportSize {
        ViewportSize {
            width: 1280.0,
            height: 800.0,
        }
    }

    fn rect(top: f64, left: f64, bottom: f64, right: f64) -> RawRect {
        RawRect {
            top,
            left,
            bottom,
            right,
        }
    }

    fn cta(text: &str, rect: RawRect) -> RawCta {
        RawCta {
            text: text.to_string(),
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
            rect,
        }
    }

    #[test]
    fn display_none_is_invisible() {
        assert!(!is_style_visible("none", "visible", "1"));
    }

    #[test]
    fn visibility_hidden_is_invisible() {
        assert!(!is_style_visible("block", "hidden", "1"));
    }

    #[test]
    fn zero_opacity_is_invisible() {
        assert!(!is_style_visible("block", "visible", "0"));
        assert!(!is_style_visible("inline", "visible", "0.0"));
        assert!(is_style_visible("block", "visible", "0.5"));
        assert!(is_style_visible("block", "visible", "1"));
    }

    #[test]
    fn garbage_opacity_counts_as_visible() {
        assert!(is_style_visible("block", "visible", "inherit"));
    }

    #[test]
    fn element_extending_past_viewport_is_excluded() {
        let vp = viewport();
        assert!(is_within_viewport(rect(0.0, 0.0, 100.0, 200.0), vp));
        // Bottom edge past the window.
        assert!(!is_within_viewport(rect(700.0, 0.0, 900.0, 200.0), vp));
        // Negative top (scrolled out above).
        assert!(!is_within_viewport(rect(-10.0, 0.0, 50.0, 200.0), vp));
        // Right edge past the window.
        assert!(!is_within_viewport(rect(0.0, 1200.0, 50.0, 1400.0), vp));
    }

    #[test]
    fn fold_boundary_is_strict() {
        assert!(is_above_the_fold(799.9, 800.0));
        assert!(!is_above_the_fold(800.0, 800.0));
        assert!(!is_above_the_fold(800.1, 800.0));
    }

    #[test]
    fn headings_drop_invisible_and_empty_entries() {
        let raw = vec![
            RawHeading {
                tag: "H1".into(),
                text: "  Welcome  ".into(),
                display: "block".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
            },
            RawHeading {
                tag: "H2".into(),
                text: "Hidden".into(),
                display: "none".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
            },
            RawHeading {
                tag: "H3".into(),
                text: "   ".into(),
                display: "block".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
            },
            RawHeading {
                tag: "H4".into(),
                text: "Too deep".into(),
                display: "block".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
            },
        ];

        let headings = filter_headings(raw);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].tag, HeadingTag::H1);
        assert_eq!(headings[0].text, "Welcome");
    }

    #[test]
    fn ctas_drop_short_text_and_offscreen_elements() {
        let payload = RawCtaPayload {
            viewport: viewport(),
            elements: vec![
                cta("Sign up today", rect(100.0, 10.0, 140.0, 200.0)),
                cta("Go", rect(100.0, 10.0, 140.0, 200.0)),
                cta("Below the window", rect(750.0, 10.0, 900.0, 200.0)),
            ],
        };

        let ctas = filter_ctas(payload);
        assert_eq!(ctas.len(), 1);
        assert_eq!(ctas[0].text, "Sign up today");
        assert!(ctas[0].is_above_the_fold);
    }

    #[test]
    fn cta_starting_at_fold_height_is_not_above_the_fold() {
        // Tall viewport so the element still fits inside it.
        let payload = RawCtaPayload {
            viewport: ViewportSize {
                width: 1280.0,
                height: 800.0,
            },
            elements: vec![RawCta {
                text: "Read more".into(),
                display: "block".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
                rect: rect(800.0, 0.0, 800.0, 100.0),
            }],
        };

        let ctas = filter_ctas(payload);
        assert_eq!(ctas.len(), 1);
        assert!(!ctas[0].is_above_the_fold);
    }

    #[test]
    fn zero_opacity_cta_is_excluded() {
        let payload = RawCtaPayload {
            viewport: viewport(),
            elements: vec![RawCta {
                opacity: "0".into(),
                ..cta("Invisible button", rect(10.0, 10.0, 40.0, 100.0))
            }],
        };
        assert!(filter_ctas(payload).is_empty());
    }
}
