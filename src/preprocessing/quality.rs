//! Photo quality assessment (sharpness, brightness, contrast)

use log::warn;
use opencv::{
    core::{self, Mat, CV_64F},
    imgproc,
    prelude::*,
};
use serde::{Deserialize, Serialize};

use super::{enhance::to_gray, to_bgr};
use crate::error::OpenCvResultExt;
use crate::Result;

/// Quality metrics of a photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// min(1, sharpness/1000 * contrast/50)
    pub quality_score: f64,
    pub is_good_quality: bool,
    /// Variance of the Laplacian of the gray image
    pub sharpness: f64,
    /// Mean gray level
    pub brightness: f64,
    /// Standard deviation of gray levels
    pub contrast: f64,
}

impl Default for QualityAssessment {
    /// Neutral assessment used when measuring fails; never blocks analysis
    fn default() -> Self {
        Self {
            quality_score: 0.5,
            is_good_quality: true,
            sharpness: 0.0,
            brightness: 128.0,
            contrast: 50.0,
        }
    }
}

/// Assess a BGR photo; failures produce the neutral default
pub fn validate_image_quality(image: &Mat, threshold: f64) -> QualityAssessment {
    match assess(image, threshold) {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("Error validating image quality: {}", e);
            QualityAssessment::default()
        }
    }
}

fn assess(image: &Mat, threshold: f64) -> Result<QualityAssessment> {
    let gray = to_gray(&to_bgr(image)?)?;

    let mut laplacian = Mat::default();
    imgproc::laplacian(&gray, &mut laplacian, CV_64F, 1, 1.0, 0.0, core::BORDER_DEFAULT)
        .cv_context("Laplacian")?;
    let (_, lap_std) = mean_std(&laplacian)?;
    let sharpness = lap_std * lap_std;

    let (brightness, contrast) = mean_std(&gray)?;

    let quality_score = ((sharpness / 1000.0) * (contrast / 50.0)).min(1.0);

    Ok(QualityAssessment {
        quality_score,
        is_good_quality: quality_score > threshold,
        sharpness,
        brightness,
        contrast,
    })
}

fn mean_std(single_channel: &Mat) -> Result<(f64, f64)> {
    let mut mean = Mat::default();
    let mut stddev = Mat::default();
    core::mean_std_dev(single_channel, &mut mean, &mut stddev, &Mat::default())
        .cv_context("meanStdDev")?;
    let m = *mean.at::<f64>(0).cv_context("meanStdDev read")?;
    let s = *stddev.at::<f64>(0).cv_context("meanStdDev read")?;
    Ok((m, s))
}
