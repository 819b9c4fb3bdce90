// src/feedback/engine.rs

use super::rules::{FaultRule, Severity, FAULT_RULES};
use crate::comparison::RankedDifference;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fallback items above this |delta| are moderate, otherwise minor.
pub const FALLBACK_MODERATE_DEGREES: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    #[serde(flatten)]
    pub difference: RankedDifference,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub coaching_tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityItem {
    #[serde(flatten)]
    pub difference: RankedDifference,
    pub title: String,
}

/// Fill a rule template with the difference's numbers.
pub fn render(template: &str, diff: &RankedDifference) -> String {
    template
        .replace("{user_value}", &format!("{:.1}", diff.user_value))
        .replace("{ref_value}", &format!("{:.1}", diff.reference_value))
        .replace("{abs_delta}", &format!("{:.1}", diff.delta.abs()))
        .replace("{delta}", &format!("{:+.1}", diff.delta))
}

/// First rule in catalog order that covers this difference.
pub fn find_rule<'a>(catalog: &'a [FaultRule], diff: &RankedDifference) -> Option<&'a FaultRule> {
    catalog
        .iter()
        .find(|rule| rule.applies_to(diff.angle_name, diff.phase, diff.view) && rule.matches(diff.delta))
}

fn from_rule(rule: &FaultRule, diff: &RankedDifference) -> FeedbackItem {
    FeedbackItem {
        difference: diff.clone(),
        severity: rule.severity,
        title: rule.title.to_string(),
        description: render(rule.description, diff),
        coaching_tip: render(rule.coaching_tip, diff),
    }
}

fn fallback(diff: &RankedDifference) -> FeedbackItem {
    let angle = diff.angle_name.display_name();
    let phase = diff.phase.display_name();
    let abs_delta = diff.delta.abs();
    let direction = if diff.delta > 0.0 { "more" } else { "less" };

    FeedbackItem {
        difference: diff.clone(),
        severity: if abs_delta > FALLBACK_MODERATE_DEGREES {
            Severity::Moderate
        } else {
            Severity::Minor
        },
        title: format!("{} Difference at {}", angle, phase),
        description: format!(
            "Your {} at {} is {:.1}° compared to the reference's {:.1}°, {:.1}° {}.",
            angle.to_lowercase(),
            phase.to_lowercase(),
            diff.user_value,
            diff.reference_value,
            abs_delta,
            direction
        ),
        coaching_tip: format!(
            "Work on matching the reference {} at the {} position. \
             Film yourself and compare side by side.",
            angle.to_lowercase(),
            phase.to_lowercase()
        ),
    }
}

pub fn generate_feedback_with(catalog: &[FaultRule], ranked: &[RankedDifference]) -> Vec<FeedbackItem> {
    let items: Vec<FeedbackItem> = ranked
        .iter()
        .map(|diff| match find_rule(catalog, diff) {
            Some(rule) => from_rule(rule, diff),
            None => {
                debug!(
                    "No rule for {}@{} ({}) delta {:+.1}, using fallback",
                    diff.angle_name, diff.phase, diff.view, diff.delta
                );
                fallback(diff)
            }
        })
        .collect();

    info!("Generated feedback for {} differences", items.len());
    items
}

/// Coaching feedback for ranked differences against the built-in catalog.
pub fn generate_feedback(ranked: &[RankedDifference]) -> Vec<FeedbackItem> {
    generate_feedback_with(FAULT_RULES, ranked)
}

/// Titles only; similarities carry no coaching.
pub fn similarity_titles(ranked: &[RankedDifference]) -> Vec<SimilarityItem> {
    ranked
        .iter()
        .map(|diff| SimilarityItem {
            difference: diff.clone(),
            title: format!(
                "{} at {}",
                diff.angle_name.display_name(),
                diff.phase.display_name()
            ),
        })
        .collect()
}
