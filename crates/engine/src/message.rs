//! Alert message templates.

use pricewatch_core::{CrossingDirection, PriceReading, Subject};

/// Message template, chosen by subject kind and crossing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Coin fell to or below the threshold.
    DroppedBelow,
    /// Coin rose to or above the threshold.
    RisenAbove,
    /// Gas fee at or under the configured maximum.
    GasBelowMaximum,
    /// Gas fee at or over the configured maximum.
    GasAboveMaximum,
}

impl Template {
    /// Template for a subject kind and direction.
    pub fn select(subject: &Subject, direction: CrossingDirection) -> Self {
        match (subject.is_gas_fees(), direction) {
            (false, CrossingDirection::CrossingDown) => Template::DroppedBelow,
            (false, CrossingDirection::CrossingUp) => Template::RisenAbove,
            (true, CrossingDirection::CrossingDown) => Template::GasBelowMaximum,
            (true, CrossingDirection::CrossingUp) => Template::GasAboveMaximum,
        }
    }
}

/// Format the alert text sent to the webhook.
pub fn format_alert_message(
    subject: &Subject,
    direction: CrossingDirection,
    threshold: f64,
    reading: &PriceReading,
) -> String {
    let source = reading.source;
    let current = reading.value;

    match Template::select(subject, direction) {
        Template::DroppedBelow => format!(
            "According to **{}**, **{}** has dropped below **{}** and is currently at **{}**!",
            source, subject, threshold, current
        ),
        Template::RisenAbove => format!(
            "According to **{}**, **{}** has risen above **{}** and is currently at **{}**!",
            source, subject, threshold, current
        ),
        Template::GasBelowMaximum => format!(
            "According to **{}**, **{}** are below the maximum of **{}** gwei. \
             A **fast** transaction currently costs **{}** gwei",
            source, subject, threshold, current
        ),
        Template::GasAboveMaximum => format!(
            "According to **{}**, **{}** are above the maximum of **{}** gwei. \
             A **fast** transaction currently costs **{}** gwei",
            source, subject, threshold, current
        ),
    }
}
