//! Pipeline constants and reference values for food analysis
//!
//! Every tunable here is also exposed through [`crate::config::PipelineConfig`];
//! these values are the defaults.

/// Image preprocessing parameters
pub mod preprocessing {
    /// Bounding box the preprocessed image must fit in (width, height)
    pub const TARGET_WIDTH: u32 = 800;
    pub const TARGET_HEIGHT: u32 = 600;

    /// Enhancement factors (1.0 = unchanged)
    pub const CONTRAST_FACTOR: f64 = 1.2;
    pub const SHARPNESS_FACTOR: f64 = 1.1;
    pub const COLOR_FACTOR: f64 = 1.1;

    /// Bilateral filter neighbourhood diameter and sigmas
    pub const BILATERAL_DIAMETER: i32 = 9;
    pub const BILATERAL_SIGMA_COLOR: f64 = 75.0;
    pub const BILATERAL_SIGMA_SPACE: f64 = 75.0;

    /// Minimum quality score for an image to count as good
    pub const QUALITY_THRESHOLD: f64 = 0.7;
}

/// Region detection and classification parameters
pub mod detection {
    /// Images wider than this are downscaled before masking
    pub const MAX_DETECTION_WIDTH: i32 = 800;

    /// Gaussian blur kernel size applied before HSV conversion (odd)
    pub const BLUR_KERNEL_SIZE: i32 = 5;

    /// Contours with area at or below this (pixels) are discarded
    pub const MIN_REGION_AREA: f64 = 1000.0;

    /// Region area that maps to confidence 1.0 before capping
    pub const CONFIDENCE_AREA_DIVISOR: f64 = 10000.0;

    /// Upper bound on region confidence
    pub const MAX_REGION_CONFIDENCE: f32 = 0.9;

    /// Portion breakpoints (pixels): above LARGE is large, above MEDIUM is medium
    pub const LARGE_PORTION_AREA: f64 = 15000.0;
    pub const MEDIUM_PORTION_AREA: f64 = 5000.0;

    /// Fraction of all pixels a color must cover in the whole-image fallback
    pub const GENERAL_COLOR_RATIO: f64 = 0.1;

    /// Confidence of whole-image fallback items
    pub const GENERAL_CONFIDENCE: f32 = 0.6;

    /// Confidence of the "mixed food" fallback
    pub const FALLBACK_CONFIDENCE: f32 = 0.5;

    /// Name reported when nothing more specific is known
    pub const FALLBACK_FOOD: &str = "mixed food";

    /// Region proposal limits (aspect ratio w/h, exclusive)
    pub const MIN_PROPOSAL_ASPECT: f64 = 0.2;
    pub const MAX_PROPOSAL_ASPECT: f64 = 5.0;

    /// Morphology kernel for region proposals
    pub const PROPOSAL_MORPH_KERNEL: i32 = 5;
}

/// Calorie estimation parameters
pub mod estimation {
    /// Estimates never go below this many kcal
    pub const MIN_CALORIES: f32 = 10.0;

    /// Returned when an estimate cannot be computed at all
    pub const FALLBACK_CALORIES: f32 = 150.0;

    /// Confidence adjustment: BASE + SPAN * confidence, so 0.7..=1.0
    pub const CONFIDENCE_BASE: f32 = 0.7;
    pub const CONFIDENCE_SPAN: f32 = 0.3;
}

/// Display thresholds for confidence badges (percent)
pub mod display {
    pub const HIGH_CONFIDENCE_PERCENT: u32 = 80;
    pub const MEDIUM_CONFIDENCE_PERCENT: u32 = 60;

    pub const HIGH_CONFIDENCE_COLOR: &str = "#28a745";
    pub const MEDIUM_CONFIDENCE_COLOR: &str = "#ffc107";
    pub const LOW_CONFIDENCE_COLOR: &str = "#dc3545";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_ranges() {
        assert!(detection::MEDIUM_PORTION_AREA < detection::LARGE_PORTION_AREA);
        assert!(detection::MIN_REGION_AREA < detection::MEDIUM_PORTION_AREA);
        assert!(detection::MAX_REGION_CONFIDENCE <= 1.0);
        assert!(display::MEDIUM_CONFIDENCE_PERCENT < display::HIGH_CONFIDENCE_PERCENT);
    }

    #[test]
    fn test_confidence_adjustment_range() {
        let low = estimation::CONFIDENCE_BASE;
        let high = estimation::CONFIDENCE_BASE + estimation::CONFIDENCE_SPAN;
        assert!((low - 0.7).abs() < 1e-6);
        assert!((high - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blur_kernel_is_odd() {
        assert_eq!(detection::BLUR_KERNEL_SIZE % 2, 1);
        assert_eq!(detection::PROPOSAL_MORPH_KERNEL % 2, 1);
    }
}
