//! Structured test step extraction
//!
//! Zephyr and XRay both keep steps inside a custom field, under
//! `customfieldvalues/steps/step`, but order them by different keys.

use crate::document::{Element, Issue};
use crate::repair::XRAY_STEPS_KEY;

pub const ZEPHYR_STEPS_KEY: &str = "com.thed.zephyr.je:zephyr-je-customfield-teststep";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDialect {
    Zephyr,
    Xray,
}

/// Detection order: an issue matching both dialects is read as Zephyr
pub const DIALECTS: [StepDialect; 2] = [StepDialect::Zephyr, StepDialect::Xray];

impl StepDialect {
    /// Custom field key that stores steps in this dialect
    pub fn field_key(&self) -> &'static str {
        match self {
            StepDialect::Zephyr => ZEPHYR_STEPS_KEY,
            StepDialect::Xray => XRAY_STEPS_KEY,
        }
    }

    /// Child element (or attribute) holding the step position
    pub fn order_key(&self) -> &'static str {
        match self {
            StepDialect::Zephyr => "orderId",
            StepDialect::Xray => "index",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStep {
    pub description: Option<String>,
    pub test_data: Option<String>,
    pub expected_result: Option<String>,
}

/// Steps of the first dialect whose field is present, in ascending order.
///
/// The first field found ends the search, even when it holds no steps.
/// `None` when the issue has no step field at all.
pub fn extract_steps(issue: &Issue<'_>, ignored: &[String]) -> Option<(StepDialect, Vec<ExtractedStep>)> {
    DIALECTS.iter().find_map(|dialect| {
        let field = issue
            .custom_fields_by_key(dialect.field_key(), ignored)
            .into_iter()
            .next()?;
        let steps: Vec<&Element> = field.steps().collect();
        Some((*dialect, sort_steps(*dialect, steps)))
    })
}

fn sort_steps(dialect: StepDialect, steps: Vec<&Element>) -> Vec<ExtractedStep> {
    let mut keyed: Vec<(Option<i64>, &Element)> = steps
        .into_iter()
        .map(|step| (order_of(dialect, step), step))
        .collect();

    // Unparseable positions go last, keeping their document order
    keyed.sort_by_key(|(order, _)| (order.is_none(), *order));

    keyed
        .into_iter()
        .map(|(_, step)| ExtractedStep {
            description: step.child_text("step"),
            test_data: step.child_text("data"),
            expected_result: step.child_text("result"),
        })
        .collect()
}

fn order_of(dialect: StepDialect, step: &Element) -> Option<i64> {
    let key = dialect.order_key();
    let raw = step
        .child(key)
        .map(|e| e.text.trim().to_string())
        .or_else(|| step.attr(key).map(|v| v.trim().to_string()))
        .unwrap_or_default();

    match raw.parse::<i64>() {
        Ok(order) => Some(order),
        Err(_) => {
            tracing::warn!("Step has no numeric {} ('{}'), placing it last", key, raw);
            None
        }
    }
}
