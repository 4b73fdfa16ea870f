//! Color module
//!
//! HSV range masking and statistics used for food segmentation, plus
//! conversions to display colors.

pub mod conversion;
pub mod hsv;

pub use conversion::HsvColor;
pub use hsv::HsvRange;
