//! JavaScript evaluation scripts for structural/UX extraction.
//!
//! Each script reports raw data only; visibility, viewport and text
//! filtering happen in Rust (see `visibility.rs`).

/// Page title and meta-description. Both nullable.
pub const METADATA_SCRIPT: &str = r#"
    (() => {
        const meta = document.querySelector('meta[name="description"]');
        return {
            title: document.title || null,
            description: meta ? meta.getAttribute('content') : null
        };
    })()
"#;

/// H1/H2/H3 elements with their computed style.
pub const HEADINGS_SCRIPT: &str = r#"
    (() => {
        return Array.from(document.querySelectorAll('h1, h2, h3')).map(el => {
            const style = window.getComputedStyle(el);
            return {
                tag: el.tagName,
                text: el.textContent || '',
                display: style.display,
                visibility: style.visibility,
                opacity: style.opacity
            };
        });
    })()
"#;

/// Link/button candidates with computed style, geometry and the viewport
/// extents they were measured against.
pub const CTAS_SCRIPT: &str = r#"
    (() => {
        const elements = Array.from(document.querySelectorAll('a, button')).map(el => {
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            return {
                text: el.textContent || '',
                display: style.display,
                visibility: style.visibility,
                opacity: style.opacity,
                rect: {
                    top: rect.top,
                    left: rect.left,
                    bottom: rect.bottom,
                    right: rect.right
                }
            };
        });
        return {
            viewport: { width: window.innerWidth, height: window.innerHeight },
            elements
        };
    })()
"#;

/// Per-form count of descendant input/select/textarea controls.
pub const FORMS_SCRIPT: &str = r#"
    (() => {
        return Array.from(document.querySelectorAll('form')).map(form => ({
            input_count: form.querySelectorAll('input, select, textarea').length
        }));
    })()
"#;

/// Link count of the first `nav` landmark; 0 when none exists.
pub const NAVIGATION_SCRIPT: &str = r#"
    (() => {
        const nav = document.querySelector('nav');
        return { link_count: nav ? nav.querySelectorAll('a').length : 0 };
    })()
"#;
