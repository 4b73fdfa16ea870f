//! Plain-text rendering of analysis results

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::color::conversion::hex_to_srgb;
use crate::constants::display::{
    HIGH_CONFIDENCE_COLOR, HIGH_CONFIDENCE_PERCENT, LOW_CONFIDENCE_COLOR, MEDIUM_CONFIDENCE_COLOR,
    MEDIUM_CONFIDENCE_PERCENT,
};
use crate::scanner::{AnalysisResult, FoodItemResult};

/// Confidence bucket used for badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Bucket a confidence in [0, 1] by its rounded percentage
    pub fn from_confidence(confidence: f32) -> Self {
        let percent = confidence_percent(confidence);
        if percent >= HIGH_CONFIDENCE_PERCENT {
            ConfidenceLevel::High
        } else if percent >= MEDIUM_CONFIDENCE_PERCENT {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Badge color as "#rrggbb"
    pub fn badge_color(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => HIGH_CONFIDENCE_COLOR,
            ConfidenceLevel::Medium => MEDIUM_CONFIDENCE_COLOR,
            ConfidenceLevel::Low => LOW_CONFIDENCE_COLOR,
        }
    }

    fn paint(&self, text: &str) -> ColoredString {
        match hex_to_srgb(self.badge_color()) {
            Ok(srgb) => {
                let rgb = srgb.into_format::<u8>();
                text.truecolor(rgb.red, rgb.green, rgb.blue)
            }
            Err(_) => text.normal(),
        }
    }
}

/// Confidence as a whole percentage, clamped to 0..=100
pub fn confidence_percent(confidence: f32) -> u32 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Uppercase the first letter of every alphabetic run ("extra_large" -> "Extra_Large")
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// One item block: name, calories, portion and a colored confidence badge
pub fn render_item(item: &FoodItemResult) -> String {
    let level = ConfidenceLevel::from_confidence(item.confidence);
    let badge = format!("{}%", confidence_percent(item.confidence));

    format!(
        "  {}\n    Calories:     {:.1} kcal\n    Portion Size: {}\n    Confidence:   {}\n",
        title_case(&item.food_name).bold(),
        item.calories,
        title_case(item.portion_size.as_str()),
        level.paint(&badge),
    )
}

/// Full report: total card, item list and completion time
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Total Calories".bold());
    let _ = writeln!(out, "  {}", format!("{:.1}", result.total_calories).bold());
    let _ = writeln!(out, "  Estimated calories in your meal");
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "Detected Food Items".bold());
    for item in &result.food_items {
        out.push_str(&render_item(item));
    }

    if let Some(quality) = &result.quality {
        if !quality.is_good_quality {
            let _ = writeln!(
                out,
                "\n{}",
                format!(
                    "Image quality is low (score {:.2}); estimates may be less reliable",
                    quality.quality_score
                )
                .yellow()
            );
        }
    }

    let _ = writeln!(
        out,
        "\nAnalysis completed at: {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    out
}
