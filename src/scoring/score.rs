//! Normalized category scores.

use serde::{Deserialize, Serialize};

/// Categorized page-quality scores, each an integer in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditScore {
    pub performance: u8,
    pub accessibility: u8,
    pub seo: u8,
}

/// Normalize a raw category score from `[0, 1]` to `0..=100`.
///
/// Missing or non-finite categories score 0. Rounds half-up at one
/// decimal of precision so a raw 0.855 maps to 86 even though the
/// nearest f64 sits fractionally below the true value.
pub(crate) fn normalize_score(raw: Option<f64>) -> u8 {
    let Some(raw) = raw else {
        return 0;
    };
    if !raw.is_finite() {
        return 0;
    }
    let clamped = raw.clamp(0.0, 1.0);
    let tenths = (clamped * 1000.0).round() as i64;
    ((tenths + 5) / 10) as u8
}
