//! Configuration structures for the calorie_scan analysis pipeline.
//!
//! This module defines all tunable parameters for food analysis,
//! organized into groups for preprocessing, detection, and estimation.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use calorie_scan::PipelineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = PipelineConfig::from_json_file(Path::new("config.json"))?;
//!
//! // Or use defaults
//! let config = PipelineConfig::default();
//! # Ok::<(), calorie_scan::AnalysisError>(())
//! ```
//!
//! Every section is optional in JSON; missing sections and fields take the
//! defaults from [`crate::constants`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::HsvRange;
use crate::constants::{detection, estimation, preprocessing};
use crate::nutrition::FoodCategory;
use crate::{AnalysisError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Preprocessing configuration
    pub preprocessing: PreprocessingConfig,

    /// Region detection configuration
    pub detection: DetectionConfig,

    /// Calorie estimation configuration
    pub estimation: EstimationConfig,
}

/// Resize, enhancement, and denoise parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Images are downscaled to fit this box (aspect preserved)
    pub target_width: u32,
    pub target_height: u32,

    /// Enhancement factors (1.0 = unchanged)
    pub contrast_factor: f64,
    pub sharpness_factor: f64,
    pub color_factor: f64,

    /// Bilateral filter parameters
    pub bilateral_diameter: i32,
    pub bilateral_sigma_color: f64,
    pub bilateral_sigma_space: f64,

    /// Score above which an image counts as good quality
    pub quality_threshold: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            target_width: preprocessing::TARGET_WIDTH,
            target_height: preprocessing::TARGET_HEIGHT,
            contrast_factor: preprocessing::CONTRAST_FACTOR,
            sharpness_factor: preprocessing::SHARPNESS_FACTOR,
            color_factor: preprocessing::COLOR_FACTOR,
            bilateral_diameter: preprocessing::BILATERAL_DIAMETER,
            bilateral_sigma_color: preprocessing::BILATERAL_SIGMA_COLOR,
            bilateral_sigma_space: preprocessing::BILATERAL_SIGMA_SPACE,
            quality_threshold: preprocessing::QUALITY_THRESHOLD,
        }
    }
}

/// HSV ranges of the four masked categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRanges {
    pub fruits: HsvRange,
    pub vegetables: HsvRange,
    pub proteins: HsvRange,
    pub grains: HsvRange,
}

impl Default for CategoryRanges {
    fn default() -> Self {
        Self {
            fruits: HsvRange::new([0, 50, 50], [20, 255, 255]),
            vegetables: HsvRange::new([35, 50, 50], [85, 255, 255]),
            proteins: HsvRange::new([0, 0, 0], [180, 255, 100]),
            grains: HsvRange::new([20, 50, 50], [35, 255, 255]),
        }
    }
}

impl CategoryRanges {
    /// Ranges in masking order
    pub fn iter(&self) -> impl Iterator<Item = (FoodCategory, HsvRange)> {
        [
            (FoodCategory::Fruits, self.fruits),
            (FoodCategory::Vegetables, self.vegetables),
            (FoodCategory::Proteins, self.proteins),
            (FoodCategory::Grains, self.grains),
        ]
        .into_iter()
    }
}

/// Region detection and classification parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Images wider than this are downscaled before masking
    pub max_width: i32,

    /// Gaussian blur kernel size (must be odd)
    pub blur_kernel_size: i32,

    /// Contours at or below this area (pixels) are ignored
    pub min_region_area: f64,

    /// Confidence = min(max_confidence, area / confidence_area_divisor)
    pub confidence_area_divisor: f64,
    pub max_confidence: f32,

    /// Portion breakpoints in pixels
    pub large_portion_area: f64,
    pub medium_portion_area: f64,

    /// Per-category HSV masks
    pub color_ranges: CategoryRanges,

    /// Fraction of pixels a color needs in the whole-image fallback
    pub general_color_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_width: detection::MAX_DETECTION_WIDTH,
            blur_kernel_size: detection::BLUR_KERNEL_SIZE,
            min_region_area: detection::MIN_REGION_AREA,
            confidence_area_divisor: detection::CONFIDENCE_AREA_DIVISOR,
            max_confidence: detection::MAX_REGION_CONFIDENCE,
            large_portion_area: detection::LARGE_PORTION_AREA,
            medium_portion_area: detection::MEDIUM_PORTION_AREA,
            color_ranges: CategoryRanges::default(),
            general_color_ratio: detection::GENERAL_COLOR_RATIO,
        }
    }
}

/// Calorie scaling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Floor applied to every estimate (kcal)
    pub min_calories: f32,

    /// Returned when an estimate fails (kcal)
    pub fallback_calories: f32,

    /// Adjustment = confidence_base + confidence_span * confidence
    pub confidence_base: f32,
    pub confidence_span: f32,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            min_calories: estimation::MIN_CALORIES,
            fallback_calories: estimation::FALLBACK_CALORIES,
            confidence_base: estimation::CONFIDENCE_BASE,
            confidence_span: estimation::CONFIDENCE_SPAN,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("Failed to read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::config(format!("Failed to parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| AnalysisError::config(format!("Failed to write {}", path.display()), e))?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocessing;
        if p.target_width == 0 || p.target_height == 0 {
            return Err(AnalysisError::invalid_parameter(
                "preprocessing.target_size",
                format!("{}x{}", p.target_width, p.target_height),
            ));
        }
        for (name, factor) in [
            ("preprocessing.contrast_factor", p.contrast_factor),
            ("preprocessing.sharpness_factor", p.sharpness_factor),
            ("preprocessing.color_factor", p.color_factor),
        ] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(AnalysisError::invalid_parameter(name, factor));
            }
        }

        let d = &self.detection;
        if d.blur_kernel_size <= 0 || d.blur_kernel_size % 2 == 0 {
            return Err(AnalysisError::invalid_parameter(
                "detection.blur_kernel_size",
                d.blur_kernel_size,
            ));
        }
        if d.max_width <= 0 {
            return Err(AnalysisError::invalid_parameter("detection.max_width", d.max_width));
        }
        if d.confidence_area_divisor <= 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "detection.confidence_area_divisor",
                d.confidence_area_divisor,
            ));
        }
        if !(0.0..=1.0).contains(&d.max_confidence) {
            return Err(AnalysisError::invalid_parameter(
                "detection.max_confidence",
                d.max_confidence,
            ));
        }
        if d.medium_portion_area > d.large_portion_area {
            return Err(AnalysisError::invalid_parameter(
                "detection.medium_portion_area",
                d.medium_portion_area,
            ));
        }

        let e = &self.estimation;
        if e.confidence_span < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "estimation.confidence_span",
                e.confidence_span,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "detection": { "min_region_area": 500.0 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.min_region_area, 500.0);
        assert_eq!(config.detection.blur_kernel_size, 5);
        assert_eq!(config.preprocessing, PreprocessingConfig::default());
        assert_eq!(config.estimation.min_calories, 10.0);
    }

    #[test]
    fn test_even_blur_kernel_rejected() {
        let mut config = PipelineConfig::default();
        config.detection.blur_kernel_size = 4;
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_category_range_order() {
        let order: Vec<FoodCategory> = CategoryRanges::default().iter().map(|(c, _)| c).collect();
        assert_eq!(
            order,
            vec![
                FoodCategory::Fruits,
                FoodCategory::Vegetables,
                FoodCategory::Proteins,
                FoodCategory::Grains
            ]
        );
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PipelineConfig::default();
        config.preprocessing.contrast_factor = 1.5;
        config.to_json_file(&path).unwrap();

        let loaded = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PipelineConfig::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError { .. }));
    }
}
