/// Floating point type used for every physical quantity.
pub type Real = f64;

/// Absolute/relative comparison window.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Parse a user-entered number.
///
/// Returns `None` for anything that is not a finite decimal number, so callers
/// can keep a missing value instead of silently storing zero.
pub fn parse_number(text: &str) -> Option<Real> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<Real>().ok().filter(|v| v.is_finite())
}

/// Render a number the way the boundary-condition table stores it.
pub fn format_number(v: Real) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
