//! HSV-threshold food detection with rule-based labelling
//!
//! Implements detection that:
//! - Masks the blurred HSV image with one fixed range per food category
//! - Keeps external contours above a minimum area
//! - Labels each region from the mean HSV of its bounding box and its area
//! - Falls back to whole-image color coverage, then to "mixed food"

use log::{debug, warn};
use opencv::{
    core::{Mat, Point, Size, Vector},
    imgproc::{self, CHAIN_APPROX_SIMPLE, INTER_LINEAR, RETR_EXTERNAL},
    prelude::*,
};

use super::{DetectedFood, DetectedRegion};
use crate::color::{hsv, HsvColor, HsvRange};
use crate::config::DetectionConfig;
use crate::constants::detection::{FALLBACK_CONFIDENCE, FALLBACK_FOOD, GENERAL_CONFIDENCE};
use crate::error::OpenCvResultExt;
use crate::nutrition::{FoodCategory, PortionSize};
use crate::preprocessing::to_bgr;
use crate::Result;

/// Whole-image color checks, in priority order
const GENERAL_ESTIMATES: [(&str, HsvRange); 3] = [
    ("mixed vegetables", HsvRange::new([35, 50, 50], [85, 255, 255])),
    ("mixed fruits", HsvRange::new([0, 50, 50], [20, 255, 255])),
    ("cooked food", HsvRange::new([10, 50, 50], [25, 255, 255])),
];

/// Food detector over fixed HSV ranges
#[derive(Debug, Clone, Default)]
pub struct FoodDetector {
    config: DetectionConfig,
}

impl FoodDetector {
    /// Create a detector with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom parameters
    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect food items in a BGR image
    ///
    /// Never returns an empty list: when detection fails the result is a
    /// single "mixed food" item.
    pub fn detect_food(&self, image: &Mat) -> Vec<DetectedFood> {
        match self.try_detect_food(image) {
            Ok(foods) => foods,
            Err(e) => {
                warn!("Error in food detection: {}", e);
                vec![DetectedFood::whole_image(FALLBACK_FOOD, FALLBACK_CONFIDENCE)]
            }
        }
    }

    /// Detect food items, propagating failures
    pub fn try_detect_food(&self, image: &Mat) -> Result<Vec<DetectedFood>> {
        let bgr = to_bgr(image)?;
        let resized = self.resize_for_detection(&bgr)?;
        let hsv_image = self.blurred_hsv(&resized)?;

        let regions = self.detect_regions(&hsv_image)?;
        debug!("{} candidate regions", regions.len());

        let mut detected = Vec::new();
        for region in regions {
            if let Some(food) = self.classify_region(&resized, region)? {
                detected.push(food);
            }
        }

        if detected.is_empty() {
            detected = self.general_estimation(&resized)?;
        }

        Ok(detected)
    }

    /// Downscale to the detection width, keeping aspect ratio
    fn resize_for_detection(&self, bgr: &Mat) -> Result<Mat> {
        let width = bgr.cols();
        if width <= self.config.max_width {
            return bgr.try_clone().cv_context("clone");
        }

        let scale = self.config.max_width as f64 / width as f64;
        let height = ((bgr.rows() as f64 * scale) as i32).max(1);
        let mut resized = Mat::default();
        imgproc::resize(
            bgr,
            &mut resized,
            Size::new(self.config.max_width, height),
            0.0,
            0.0,
            INTER_LINEAR,
        )
        .cv_context("resize")?;
        Ok(resized)
    }

    fn blurred_hsv(&self, bgr: &Mat) -> Result<Mat> {
        let k = self.config.blur_kernel_size;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur_def(bgr, &mut blurred, Size::new(k, k), 0.0).cv_context("GaussianBlur")?;
        hsv::bgr_to_hsv(&blurred)
    }

    /// Regions of every category mask whose contour area exceeds the minimum
    pub fn detect_regions(&self, hsv_image: &Mat) -> Result<Vec<DetectedRegion>> {
        let mut regions = Vec::new();

        for (category, range) in self.config.color_ranges.iter() {
            let mask = range.mask(hsv_image)?;

            let mut contours = Vector::<Vector<Point>>::new();
            imgproc::find_contours(
                &mask,
                &mut contours,
                RETR_EXTERNAL,
                CHAIN_APPROX_SIMPLE,
                Point::new(0, 0),
            )
            .cv_context("findContours")?;

            for contour in contours.iter() {
                let area = imgproc::contour_area(&contour, false).cv_context("contourArea")?;
                if area > self.config.min_region_area {
                    let rect = imgproc::bounding_rect(&contour).cv_context("boundingRect")?;
                    regions.push(DetectedRegion {
                        bbox: rect.into(),
                        area,
                        category,
                    });
                }
            }
        }

        Ok(regions)
    }

    /// Label a region from the mean HSV of its bounding box
    pub fn classify_region(&self, bgr: &Mat, region: DetectedRegion) -> Result<Option<DetectedFood>> {
        let roi = Mat::roi(bgr, region.bbox.to_rect())
            .cv_context("roi")?
            .try_clone()
            .cv_context("roi clone")?;
        let mean = hsv::mean_hsv(&hsv::bgr_to_hsv(&roi)?)?;

        Ok(classify_by_features(&region, mean).map(|name| DetectedFood {
            name: name.to_string(),
            confidence: self.region_confidence(region.area),
            portion_size: self.estimate_portion_size(region.area),
            region: Some(region),
        }))
    }

    /// min(max_confidence, area / divisor)
    pub fn region_confidence(&self, area: f64) -> f32 {
        let raw = (area / self.config.confidence_area_divisor) as f32;
        raw.min(self.config.max_confidence).max(0.0)
    }

    /// Portion bucket from pixel area
    pub fn estimate_portion_size(&self, area: f64) -> PortionSize {
        if area > self.config.large_portion_area {
            PortionSize::Large
        } else if area > self.config.medium_portion_area {
            PortionSize::Medium
        } else {
            PortionSize::Small
        }
    }

    /// Whole-image guess from color coverage when no region was labelled
    pub fn general_estimation(&self, bgr: &Mat) -> Result<Vec<DetectedFood>> {
        let hsv_image = hsv::bgr_to_hsv(bgr)?;
        let total = (bgr.rows() as f64) * (bgr.cols() as f64);
        let needed = total * self.config.general_color_ratio;

        for (name, range) in GENERAL_ESTIMATES {
            let count = range.count(&hsv_image)?;
            if count as f64 > needed {
                debug!("general estimate '{}' ({} of {} pixels)", name, count, total);
                return Ok(vec![DetectedFood::whole_image(name, GENERAL_CONFIDENCE)]);
            }
        }

        Ok(vec![DetectedFood::whole_image(FALLBACK_FOOD, FALLBACK_CONFIDENCE)])
    }
}

/// Rule set mapping a region's category, mean color and area to a food name
pub fn classify_by_features(region: &DetectedRegion, mean: HsvColor) -> Option<&'static str> {
    let HsvColor { h, s, v } = mean;

    match region.category {
        FoodCategory::Fruits => Some(if h < 20.0 {
            if s > 100.0 {
                "apple"
            } else {
                "orange"
            }
        } else if h < 40.0 {
            "banana"
        } else {
            "strawberry"
        }),
        FoodCategory::Vegetables => Some(if s > 100.0 {
            if region.area > 5000.0 {
                "broccoli"
            } else {
                "lettuce"
            }
        } else {
            "carrot"
        }),
        FoodCategory::Proteins => Some(if v > 150.0 {
            if region.area > 3000.0 {
                "chicken"
            } else {
                "cheese"
            }
        } else {
            "beef"
        }),
        FoodCategory::Grains => Some(if region.area > 2000.0 { "bread" } else { "rice" }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use opencv::core::{Rect, Scalar, CV_8UC3};

    fn region(category: FoodCategory, area: f64) -> DetectedRegion {
        DetectedRegion {
            bbox: BoundingBox::new(0, 0, 10, 10),
            area,
            category,
        }
    }

    fn white_canvas(rows: i32, cols: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(255.0)).unwrap()
    }

    /// Fill a rectangle with an RGB color
    fn fill(image: &mut Mat, rect: Rect, rgb: (f64, f64, f64)) {
        imgproc::rectangle(
            image,
            rect,
            Scalar::new(rgb.2, rgb.1, rgb.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
    }

    fn names(foods: &[DetectedFood]) -> Vec<&str> {
        foods.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_fruit_rules() {
        let fruit = region(FoodCategory::Fruits, 2000.0);
        assert_eq!(classify_by_features(&fruit, HsvColor::new(10.0, 150.0, 200.0)), Some("apple"));
        assert_eq!(classify_by_features(&fruit, HsvColor::new(10.0, 80.0, 200.0)), Some("orange"));
        assert_eq!(classify_by_features(&fruit, HsvColor::new(25.0, 150.0, 200.0)), Some("banana"));
        assert_eq!(classify_by_features(&fruit, HsvColor::new(90.0, 150.0, 200.0)), Some("strawberry"));
    }

    #[test]
    fn test_vegetable_rules() {
        let hsv = HsvColor::new(60.0, 150.0, 150.0);
        assert_eq!(classify_by_features(&region(FoodCategory::Vegetables, 6000.0), hsv), Some("broccoli"));
        assert_eq!(classify_by_features(&region(FoodCategory::Vegetables, 4000.0), hsv), Some("lettuce"));
        let dull = HsvColor::new(60.0, 60.0, 150.0);
        assert_eq!(classify_by_features(&region(FoodCategory::Vegetables, 6000.0), dull), Some("carrot"));
    }

    #[test]
    fn test_protein_and_grain_rules() {
        let light = HsvColor::new(10.0, 40.0, 200.0);
        let dark = HsvColor::new(10.0, 40.0, 60.0);
        assert_eq!(classify_by_features(&region(FoodCategory::Proteins, 3500.0), light), Some("chicken"));
        assert_eq!(classify_by_features(&region(FoodCategory::Proteins, 2500.0), light), Some("cheese"));
        assert_eq!(classify_by_features(&region(FoodCategory::Proteins, 9000.0), dark), Some("beef"));
        assert_eq!(classify_by_features(&region(FoodCategory::Grains, 2500.0), dark), Some("bread"));
        assert_eq!(classify_by_features(&region(FoodCategory::Grains, 1500.0), dark), Some("rice"));
        assert_eq!(classify_by_features(&region(FoodCategory::Snacks, 9000.0), dark), None);
    }

    #[test]
    fn test_confidence_capped() {
        let detector = FoodDetector::new();
        assert!((detector.region_confidence(5000.0) - 0.5).abs() < 1e-6);
        assert!((detector.region_confidence(50_000.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_portion_breakpoints() {
        let detector = FoodDetector::new();
        assert_eq!(detector.estimate_portion_size(1500.0), PortionSize::Small);
        assert_eq!(detector.estimate_portion_size(5000.0), PortionSize::Small);
        assert_eq!(detector.estimate_portion_size(5001.0), PortionSize::Medium);
        assert_eq!(detector.estimate_portion_size(15000.0), PortionSize::Medium);
        assert_eq!(detector.estimate_portion_size(15001.0), PortionSize::Large);
    }

    #[test]
    fn test_green_block_is_broccoli() {
        let mut image = white_canvas(400, 600);
        fill(&mut image, Rect::new(100, 100, 200, 100), (34.0, 139.0, 34.0));

        let foods = FoodDetector::new().try_detect_food(&image).unwrap();
        assert_eq!(names(&foods), vec!["broccoli"]);

        let item = &foods[0];
        assert_eq!(item.portion_size, PortionSize::Large);
        assert!((item.confidence - 0.9).abs() < 1e-6);
        let region = item.region.as_ref().unwrap();
        assert_eq!(region.category, FoodCategory::Vegetables);
        assert!(region.area > 15000.0);
    }

    #[test]
    fn test_red_block_is_medium_apple() {
        let mut image = white_canvas(300, 300);
        fill(&mut image, Rect::new(50, 50, 120, 60), (255.0, 69.0, 0.0));

        let foods = FoodDetector::new().try_detect_food(&image).unwrap();
        assert_eq!(names(&foods), vec!["apple"]);
        assert_eq!(foods[0].portion_size, PortionSize::Medium);
        assert!(foods[0].confidence > 0.6 && foods[0].confidence < 0.9);
    }

    #[test]
    fn test_yellow_block_is_bread() {
        let mut image = white_canvas(200, 200);
        fill(&mut image, Rect::new(60, 60, 50, 50), (230.0, 200.0, 40.0));

        let foods = FoodDetector::new().try_detect_food(&image).unwrap();
        assert_eq!(names(&foods), vec!["bread"]);
        assert_eq!(foods[0].portion_size, PortionSize::Small);
    }

    #[test]
    fn test_dark_block_includes_beef() {
        let mut image = white_canvas(300, 300);
        fill(&mut image, Rect::new(40, 40, 100, 100), (80.0, 50.0, 30.0));

        let foods = FoodDetector::new().try_detect_food(&image).unwrap();
        assert!(names(&foods).contains(&"beef"), "{:?}", names(&foods));
    }

    #[test]
    fn test_scattered_green_uses_general_estimate() {
        // 20px squares with 10px gaps: plenty of green, no region above the area minimum
        let mut image = white_canvas(300, 300);
        for row in 0..10 {
            for col in 0..10 {
                fill(
                    &mut image,
                    Rect::new(col * 30 + 5, row * 30 + 5, 20, 20),
                    (34.0, 139.0, 34.0),
                );
            }
        }

        let foods = FoodDetector::new().try_detect_food(&image).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "mixed vegetables");
        assert!((foods[0].confidence - 0.6).abs() < 1e-6);
        assert_eq!(foods[0].portion_size, PortionSize::Medium);
        assert!(foods[0].region.is_none());
    }

    #[test]
    fn test_blank_image_is_mixed_food() {
        let foods = FoodDetector::new().detect_food(&white_canvas(100, 100));
        assert_eq!(foods, vec![DetectedFood::whole_image("mixed food", 0.5)]);
    }

    #[test]
    fn test_failure_yields_single_fallback() {
        let detector = FoodDetector::new();
        assert!(detector.try_detect_food(&Mat::default()).is_err());
        let foods = detector.detect_food(&Mat::default());
        assert_eq!(foods, vec![DetectedFood::whole_image("mixed food", 0.5)]);
    }

    #[test]
    fn test_wide_image_is_downscaled() {
        let detector = FoodDetector::new();
        let image = white_canvas(400, 1600);
        let resized = detector.resize_for_detection(&image).unwrap();
        assert_eq!((resized.cols(), resized.rows()), (800, 200));
    }
}
