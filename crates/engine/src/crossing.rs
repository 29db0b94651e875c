//! Threshold crossing detection.

use pricewatch_core::CrossingDirection;

/// Whether `reading` is on the alerting side of `threshold`.
///
/// Both bounds are inclusive. A NaN reading never crosses.
#[inline]
pub fn is_crossed(direction: CrossingDirection, reading: f64, threshold: f64) -> bool {
    match direction {
        CrossingDirection::CrossingDown => reading <= threshold,
        CrossingDirection::CrossingUp => reading >= threshold,
    }
}
