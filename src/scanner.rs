//! End-to-end analysis: preprocess, detect, estimate
//!
//! [`CalorieScanner`] owns one instance of each pipeline stage and reuses them
//! across images. [`analyze_food_image`] runs a shared default scanner.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use opencv::{core::Mat, prelude::*};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::detection::{DetectedFood, FoodDetector};
use crate::image_loader::{load_image, load_image_from_bytes, ImageFormat};
use crate::nutrition::{CalorieEstimator, PortionSize};
use crate::preprocessing::{to_bgr, ImageProcessor, QualityAssessment};
use crate::Result;

static DEFAULT_SCANNER: Lazy<CalorieScanner> = Lazy::new(CalorieScanner::new);

/// Calorie estimate for one detected item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItemResult {
    pub food_name: String,
    pub calories: f32,
    pub confidence: f32,
    pub portion_size: PortionSize,
}

/// Outcome of analyzing one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub food_items: Vec<FoodItemResult>,
    /// Sum of item calories, rounded to one decimal
    pub total_calories: f32,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityAssessment>,
}

impl AnalysisResult {
    /// Build a result stamped with the current time
    pub fn new(food_items: Vec<FoodItemResult>, quality: Option<QualityAssessment>) -> Self {
        let total: f32 = food_items.iter().map(|item| item.calories).sum();
        Self {
            food_items,
            total_calories: round_tenth(total),
            timestamp: Utc::now(),
            quality,
        }
    }
}

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Holds the three pipeline stages for reuse
#[derive(Debug, Clone, Default)]
pub struct CalorieScanner {
    processor: ImageProcessor,
    detector: FoodDetector,
    estimator: CalorieEstimator,
}

impl CalorieScanner {
    /// Create a scanner with default parameters and the built-in food table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner from a pipeline configuration
    pub fn with_config(config: &PipelineConfig) -> Self {
        Self {
            processor: ImageProcessor::with_config(config.preprocessing.clone()),
            detector: FoodDetector::with_config(config.detection.clone()),
            estimator: CalorieEstimator::with_config(config.estimation.clone()),
        }
    }

    /// Create a scanner from a JSON configuration file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::with_config(&PipelineConfig::from_json_file(path)?))
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    pub fn detector(&self) -> &FoodDetector {
        &self.detector
    }

    pub fn estimator(&self) -> &CalorieEstimator {
        &self.estimator
    }

    /// Mutable access for adding custom foods
    pub fn estimator_mut(&mut self) -> &mut CalorieEstimator {
        &mut self.estimator
    }

    /// Analyze an in-memory image
    ///
    /// # Arguments
    ///
    /// * `image` - 8-bit gray, BGR or BGRA image
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::UnsupportedImage` if the image is empty or not
    /// 8-bit. Failures inside the pipeline stages fall back to defaults.
    pub fn analyze(&self, image: &Mat) -> Result<AnalysisResult> {
        let bgr = to_bgr(image)?;
        let quality = self.processor.validate_image_quality(&bgr);

        let processed = self.processor.preprocess(&bgr);
        let foods = self.detector.detect_food(&processed);
        let items: Vec<FoodItemResult> = foods.iter().map(|food| self.estimate_item(food)).collect();

        let result = AnalysisResult::new(items, Some(quality));
        info!(
            "Detected {} food item(s), {:.1} kcal total",
            result.food_items.len(),
            result.total_calories
        );
        Ok(result)
    }

    /// Load an image file and analyze it
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError` if the file cannot be read or decoded.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisResult> {
        let image = load_image(path)?;
        if ImageFormat::from_extension(path).is_some_and(|format| !format.is_upload_format()) {
            warn!(
                "{} is not an upload format (JPEG, PNG, GIF, WebP); analyzing anyway",
                path.display()
            );
        }
        debug!("Loaded {} ({}x{})", path.display(), image.cols(), image.rows());
        self.analyze(&image)
    }

    /// Decode an encoded image (upload or camera capture) and analyze it
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult> {
        let image = load_image_from_bytes(bytes)?;
        self.analyze(&image)
    }

    fn estimate_item(&self, food: &DetectedFood) -> FoodItemResult {
        let calories = self
            .estimator
            .estimate_calories(&food.name, food.confidence, food.portion_size);
        debug!(
            "{}: {:.1} kcal ({}, confidence {:.2})",
            food.name, calories, food.portion_size, food.confidence
        );

        FoodItemResult {
            food_name: food.name.clone(),
            calories,
            confidence: food.confidence,
            portion_size: food.portion_size,
        }
    }
}

/// Analyze an image file with the shared default scanner
///
/// # Errors
///
/// Returns `AnalysisError` if the image cannot be loaded.
pub fn analyze_food_image(path: &Path) -> Result<AnalysisResult> {
    DEFAULT_SCANNER.analyze_path(path)
}
