//! Food region detection module
//!
//! This module segments candidate food regions by HSV color range, labels
//! them with a small rule set, and proposes generic regions with descriptive
//! features.

pub mod food;
pub mod proposals;

use opencv::core::Rect;
use serde::{Deserialize, Serialize};

use crate::nutrition::{FoodCategory, PortionSize};

pub use food::FoodDetector;
pub use proposals::{extract_features, propose_regions, RegionFeatures, RegionProposal};

/// Axis-aligned box in detection-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

/// A contour that passed the area filter of one category mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub bbox: BoundingBox,
    /// Contour area in pixels
    pub area: f64,
    /// Category of the mask that produced the contour
    pub category: FoodCategory,
}

/// A labelled food item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFood {
    pub name: String,
    pub confidence: f32,
    pub portion_size: PortionSize,
    /// Absent for whole-image estimates and fallbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<DetectedRegion>,
}

impl DetectedFood {
    /// An item not tied to a region
    pub fn whole_image(name: &str, confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            confidence,
            portion_size: PortionSize::Medium,
            region: None,
        }
    }
}
