//! Text depiction of a bar around its pivot.
//!
//! Left discs render as `=w`, right discs as `w=`. On both pans the most
//! recently added disc sits next to the pivot, so the stack tops face each
//! other: `=10=15=|=============|=20=`.

use std::fmt::Write as _;

use crate::bar::disc::Disc;

/// Pivot marker between the two pans.
pub const PIVOT: &str = "=|=============|=";

/// Render two pans (each oldest first) as a single line.
///
/// The left pan is written oldest first and the right pan newest first, so
/// for right discs `[20, 5]` (5 added last) the tail reads `=|...|=5=20=`.
#[must_use]
pub fn render(left: &[Disc], right: &[Disc]) -> String {
    let mut out = String::with_capacity(PIVOT.len() + 4 * (left.len() + right.len()));
    for disc in left {
        let _ = write!(out, "={disc}");
    }
    out.push_str(PIVOT);
    for disc in right.iter().rev() {
        let _ = write!(out, "{disc}=");
    }
    out
}
