//! In-page audit scripts, one per category.
//!
//! Each script returns a raw score in `[0, 1]`, or `null` when the
//! category cannot be scored for the page.

/// Performance: navigation-timing derived. Full marks at <= 1s total
/// load, zero at >= 15s, linear in between. `null` when the browser
/// reports no usable timing.
pub const PERFORMANCE_AUDIT_SCRIPT: &str = r#"
    (() => {
        const nav = performance.getEntriesByType('navigation')[0];
        let total = 0;
        if (nav && nav.loadEventEnd > 0) {
            total = nav.loadEventEnd - nav.startTime;
        } else if (performance.timing && performance.timing.loadEventEnd > 0) {
            total = performance.timing.loadEventEnd - performance.timing.navigationStart;
        }
        if (!total || total <= 0) return null;

        const seconds = total / 1000;
        if (seconds <= 1) return 1;
        if (seconds >= 15) return 0;
        return (15 - seconds) / 14;
    })()
"#;

/// Accessibility: pass-ratio over document-level checks (image alt text,
/// labelled form controls, document language, document title,
/// discernible link text).
pub const ACCESSIBILITY_AUDIT_SCRIPT: &str = r#"
    (() => {
        const checks = [];

        const images = Array.from(document.images);
        checks.push(images.length === 0 || images.every(img => img.hasAttribute('alt')));

        const controls = Array.from(
            document.querySelectorAll('input:not([type=hidden]), select, textarea')
        );
        checks.push(controls.length === 0 || controls.every(el =>
            (el.labels && el.labels.length > 0)
            || el.hasAttribute('aria-label')
            || el.hasAttribute('aria-labelledby')
            || el.hasAttribute('title')
        ));

        checks.push(!!document.documentElement.lang);
        checks.push(!!document.title);

        const links = Array.from(document.querySelectorAll('a[href]'));
        checks.push(links.length === 0 || links.every(a =>
            (a.textContent || '').trim().length > 0 || a.hasAttribute('aria-label')
        ));

        return checks.filter(Boolean).length / checks.length;
    })()
"#;

/// SEO: pass-ratio over crawlability/snippet checks (title, meta
/// description, h1 presence, viewport meta, document language).
pub const SEO_AUDIT_SCRIPT: &str = r#"
    (() => {
        const checks = [];

        checks.push(!!document.title && document.title.trim().length > 0);

        const description = document.querySelector('meta[name="description"]');
        checks.push(!!description && !!description.getAttribute('content'));

        checks.push(document.querySelectorAll('h1').length > 0);
        checks.push(!!document.querySelector('meta[name="viewport"]'));
        checks.push(!!document.documentElement.lang);

        return checks.filter(Boolean).length / checks.length;
    })()
"#;
