//! # Calorie Scan
//!
//! A Rust crate for estimating the calorie content of food photographs.
//!
//! This library turns a photo into a list of food items with calorie estimates by:
//! - Resizing, enhancing and denoising the image
//! - Segmenting candidate regions with fixed HSV color ranges per food category
//! - Labelling each region with simple rules on its mean color and area
//! - Looking up calories per 100 g and scaling by portion weight and confidence
//!
//! ## Example
//!
//! ```rust,no_run
//! use calorie_scan::analyze_food_image;
//! use std::path::Path;
//!
//! let result = analyze_food_image(Path::new("lunch.jpg"))?;
//! for item in &result.food_items {
//!     println!("{}: {:.1} kcal", item.food_name, item.calories);
//! }
//! println!("Total: {} kcal", result.total_calories);
//! # Ok::<(), calorie_scan::AnalysisError>(())
//! ```

pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod nutrition;
pub mod preprocessing;
pub mod report;
pub mod scanner;

pub use config::PipelineConfig;
pub use detection::{DetectedFood, DetectedRegion, FoodDetector};
pub use error::{AnalysisError, Result};
pub use nutrition::{CalorieEstimator, FoodCategory, FoodDatabase, PortionSize};
pub use preprocessing::{ImageProcessor, QualityAssessment};
pub use report::ConfidenceLevel;
pub use scanner::{analyze_food_image, AnalysisResult, CalorieScanner, FoodItemResult};
