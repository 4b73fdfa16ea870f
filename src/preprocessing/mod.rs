//! Image preprocessing
//!
//! Prepares a photo for detection: downscale to fit the target box, enhance
//! contrast, sharpness and saturation, then denoise with a bilateral filter.

pub mod enhance;
pub mod quality;

use log::{debug, warn};
use opencv::{
    core::{self, Mat, Size, CV_8U},
    imgproc::{self, COLOR_BGRA2BGR, COLOR_GRAY2BGR, INTER_LANCZOS4},
    prelude::*,
};

use crate::config::PreprocessingConfig;
use crate::error::OpenCvResultExt;
use crate::{AnalysisError, Result};

pub use quality::{validate_image_quality, QualityAssessment};

/// Stateless image preprocessor
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {
    config: PreprocessingConfig,
}

impl ImageProcessor {
    /// Create a preprocessor with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preprocessor with custom parameters
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Resize, enhance and denoise; on failure the input is returned as-is
    pub fn preprocess(&self, image: &Mat) -> Mat {
        match self.try_preprocess(image) {
            Ok(processed) => processed,
            Err(e) => {
                warn!("Error preprocessing image: {}", e);
                image.clone()
            }
        }
    }

    /// Resize, enhance and denoise, propagating failures
    pub fn try_preprocess(&self, image: &Mat) -> Result<Mat> {
        let bgr = to_bgr(image)?;
        let resized = self.resize(&bgr)?;

        let enhanced = enhance::adjust_contrast(&resized, self.config.contrast_factor)?;
        let enhanced = enhance::adjust_sharpness(&enhanced, self.config.sharpness_factor)?;
        let enhanced = enhance::adjust_color(&enhanced, self.config.color_factor)?;

        self.reduce_noise(&enhanced)
    }

    /// Downscale to fit the target box, keeping aspect ratio
    pub fn resize(&self, image: &Mat) -> Result<Mat> {
        let Some(size) = fit_within(
            image.cols(),
            image.rows(),
            self.config.target_width as i32,
            self.config.target_height as i32,
        ) else {
            return image.try_clone().cv_context("clone");
        };

        debug!(
            "Resizing {}x{} to {}x{}",
            image.cols(),
            image.rows(),
            size.width,
            size.height
        );
        let mut resized = Mat::default();
        imgproc::resize(image, &mut resized, size, 0.0, 0.0, INTER_LANCZOS4).cv_context("resize")?;
        Ok(resized)
    }

    /// Edge-preserving bilateral denoise
    pub fn reduce_noise(&self, image: &Mat) -> Result<Mat> {
        let mut filtered = Mat::default();
        imgproc::bilateral_filter(
            image,
            &mut filtered,
            self.config.bilateral_diameter,
            self.config.bilateral_sigma_color,
            self.config.bilateral_sigma_space,
            core::BORDER_DEFAULT,
        )
        .cv_context("bilateralFilter")?;
        Ok(filtered)
    }

    /// Quality metrics of a photo against this processor's threshold
    pub fn validate_image_quality(&self, image: &Mat) -> QualityAssessment {
        quality::validate_image_quality(image, self.config.quality_threshold)
    }
}

/// Target size when (width, height) must shrink to fit the box; None if it already fits
pub fn fit_within(width: i32, height: i32, max_width: i32, max_height: i32) -> Option<Size> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    if scale >= 1.0 {
        return None;
    }
    Some(Size::new(
        ((width as f64 * scale) as i32).max(1),
        ((height as f64 * scale) as i32).max(1),
    ))
}

/// Normalize an 8-bit gray, BGR or BGRA image to 3-channel BGR
pub fn to_bgr(image: &Mat) -> Result<Mat> {
    if image.rows() == 0 || image.cols() == 0 {
        return Err(AnalysisError::UnsupportedImage {
            reason: "image is empty".into(),
        });
    }
    if image.depth() != CV_8U {
        return Err(AnalysisError::UnsupportedImage {
            reason: format!("expected 8-bit pixels, got depth {}", image.depth()),
        });
    }

    let code = match image.channels() {
        3 => return image.try_clone().cv_context("clone"),
        1 => COLOR_GRAY2BGR,
        4 => COLOR_BGRA2BGR,
        n => {
            return Err(AnalysisError::UnsupportedImage {
                reason: format!("unsupported channel count {}", n),
            })
        }
    };

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(image, &mut bgr, code).cv_context("cvtColor to BGR")?;
    Ok(bgr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3, CV_8UC4};

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1600, 1200, 800, 600), Some(Size::new(800, 600)));
        assert_eq!(fit_within(1600, 400, 800, 600), Some(Size::new(800, 200)));
        assert_eq!(fit_within(400, 1200, 800, 600), Some(Size::new(200, 600)));
        assert_eq!(fit_within(800, 600, 800, 600), None);
        assert_eq!(fit_within(300, 200, 800, 600), None);
    }

    #[test]
    fn test_resize_only_downscales() {
        let processor = ImageProcessor::new();
        let small = Mat::new_rows_cols_with_default(200, 300, CV_8UC3, Scalar::all(10.0)).unwrap();
        let out = processor.resize(&small).unwrap();
        assert_eq!((out.cols(), out.rows()), (300, 200));

        let large = Mat::new_rows_cols_with_default(1200, 1600, CV_8UC3, Scalar::all(10.0)).unwrap();
        let out = processor.resize(&large).unwrap();
        assert_eq!((out.cols(), out.rows()), (800, 600));
    }

    #[test]
    fn test_preprocess_fits_target_box() {
        let processor = ImageProcessor::new();
        let image = Mat::new_rows_cols_with_default(800, 1600, CV_8UC3, Scalar::new(30.0, 140.0, 30.0, 0.0)).unwrap();
        let out = processor.preprocess(&image);
        assert_eq!((out.cols(), out.rows()), (800, 400));
        assert_eq!(out.channels(), 3);
    }

    #[test]
    fn test_to_bgr_channel_handling() {
        let gray = Mat::new_rows_cols_with_default(4, 4, CV_8UC1, Scalar::all(7.0)).unwrap();
        assert_eq!(to_bgr(&gray).unwrap().channels(), 3);

        let bgra = Mat::new_rows_cols_with_default(4, 4, CV_8UC4, Scalar::all(7.0)).unwrap();
        assert_eq!(to_bgr(&bgra).unwrap().channels(), 3);

        assert!(matches!(
            to_bgr(&Mat::default()),
            Err(AnalysisError::UnsupportedImage { .. })
        ));
    }

    #[test]
    fn test_preprocess_failure_returns_input() {
        let processor = ImageProcessor::new();
        let out = processor.preprocess(&Mat::default());
        assert_eq!((out.rows(), out.cols()), (0, 0));
    }
}
