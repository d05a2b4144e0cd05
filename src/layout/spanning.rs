//! Reconciling spanning headers against the tracks they cover.

/// Remainder the last child must absorb for `parent` to fit `children`.
///
/// Zero when the children already cover the parent.
pub fn span_remainder(parent: f64, children: &[f64]) -> f64 {
    let sum: f64 = children.iter().sum();
    (parent - sum).max(0.0)
}
