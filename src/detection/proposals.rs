//! Generic region proposals and per-region descriptors
//!
//! Proposals are any sufficiently saturated and bright blobs, independent of
//! food category. Features summarize a proposal's color, texture and shape.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::warn;
use opencv::{
    core::{self, Mat, Point, Size, Vec3b, Vector, BORDER_CONSTANT, CV_64F},
    imgproc::{self, CHAIN_APPROX_SIMPLE, MORPH_CLOSE, MORPH_OPEN, MORPH_RECT, RETR_EXTERNAL},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use super::BoundingBox;
use crate::color::{hsv, HsvColor, HsvRange};
use crate::constants::detection::{
    MAX_PROPOSAL_ASPECT, MIN_PROPOSAL_ASPECT, MIN_REGION_AREA, PROPOSAL_MORPH_KERNEL,
};
use crate::error::OpenCvResultExt;
use crate::preprocessing::{enhance::to_gray, to_bgr};
use crate::Result;

/// Anything with some saturation and brightness
const FOREGROUND: HsvRange = HsvRange::new([0, 30, 30], [180, 255, 255]);

/// A candidate food blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProposal {
    pub bbox: BoundingBox,
    pub area: f64,
    /// Closed contour length in pixels
    pub perimeter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFeatures {
    pub mean_hsv: HsvColor,
    pub std_hsv: HsvColor,
    /// Most frequent HSV triple in the region
    pub dominant_hsv: HsvColor,
    pub dominant_hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureFeatures {
    /// Mean Sobel gradient magnitude
    pub gradient_mean: f64,
    pub gradient_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    pub aspect_ratio: f64,
    /// 4πA/P², 1.0 for a circle
    pub circularity: f64,
    pub area: f64,
}

/// Descriptors of one proposed region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFeatures {
    pub color: ColorFeatures,
    pub texture: TextureFeatures,
    pub shape: ShapeFeatures,
}

/// Propose food-like regions of a BGR image
///
/// Returns an empty list when the image cannot be processed.
pub fn propose_regions(image: &Mat) -> Vec<RegionProposal> {
    match try_propose_regions(image) {
        Ok(proposals) => proposals,
        Err(e) => {
            warn!("Error detecting food regions: {}", e);
            Vec::new()
        }
    }
}

fn try_propose_regions(image: &Mat) -> Result<Vec<RegionProposal>> {
    let hsv_image = hsv::bgr_to_hsv(&to_bgr(image)?)?;
    let mask = FOREGROUND.mask(&hsv_image)?;

    let kernel = imgproc::get_structuring_element(
        MORPH_RECT,
        Size::new(PROPOSAL_MORPH_KERNEL, PROPOSAL_MORPH_KERNEL),
        Point::new(-1, -1),
    )
    .cv_context("getStructuringElement")?;

    let border = imgproc::morphology_default_border_value().cv_context("morphologyDefaultBorderValue")?;
    let mut closed = Mat::default();
    imgproc::morphology_ex(
        &mask,
        &mut closed,
        MORPH_CLOSE,
        &kernel,
        Point::new(-1, -1),
        1,
        BORDER_CONSTANT,
        border,
    )
    .cv_context("morphologyEx close")?;
    let mut opened = Mat::default();
    imgproc::morphology_ex(
        &closed,
        &mut opened,
        MORPH_OPEN,
        &kernel,
        Point::new(-1, -1),
        1,
        BORDER_CONSTANT,
        border,
    )
    .cv_context("morphologyEx open")?;

    let mut contours = Vector::<Vector<Point>>::new();
    imgproc::find_contours(
        &opened,
        &mut contours,
        RETR_EXTERNAL,
        CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )
    .cv_context("findContours")?;

    let mut proposals = Vec::new();
    for contour in contours.iter() {
        let area = imgproc::contour_area(&contour, false).cv_context("contourArea")?;
        if area <= MIN_REGION_AREA {
            continue;
        }

        let bbox = BoundingBox::from(imgproc::bounding_rect(&contour).cv_context("boundingRect")?);
        let aspect = bbox.aspect_ratio();
        if aspect > MIN_PROPOSAL_ASPECT && aspect < MAX_PROPOSAL_ASPECT {
            let perimeter = imgproc::arc_length(&contour, true).cv_context("arcLength")?;
            proposals.push(RegionProposal {
                bbox,
                area,
                perimeter,
            });
        }
    }

    Ok(proposals)
}

/// Color, texture and shape descriptors of a proposal in a BGR image
pub fn extract_features(image: &Mat, proposal: &RegionProposal) -> Result<RegionFeatures> {
    let bgr = to_bgr(image)?;
    let roi = Mat::roi(&bgr, proposal.bbox.to_rect())
        .cv_context("roi")?
        .try_clone()
        .cv_context("roi clone")?;

    Ok(RegionFeatures {
        color: color_features(&roi)?,
        texture: texture_features(&roi)?,
        shape: shape_features(proposal),
    })
}

fn color_features(roi: &Mat) -> Result<ColorFeatures> {
    let hsv_roi = hsv::bgr_to_hsv(roi)?;
    let (mean_hsv, std_hsv) = hsv::mean_std_hsv(&hsv_roi)?;
    let dominant_hsv = dominant_color(&hsv_roi)?;

    Ok(ColorFeatures {
        mean_hsv,
        std_hsv,
        dominant_hsv,
        dominant_hex: dominant_hsv.to_hex(),
    })
}

/// Mode of the HSV triples; ties resolve to the smallest triple
fn dominant_color(hsv_roi: &Mat) -> Result<HsvColor> {
    let mut counts: BTreeMap<[u8; 3], usize> = BTreeMap::new();
    for row in 0..hsv_roi.rows() {
        for col in 0..hsv_roi.cols() {
            let p = hsv_roi.at_2d::<Vec3b>(row, col).cv_context("pixel read")?;
            *counts.entry([p[0], p[1], p[2]]).or_insert(0) += 1;
        }
    }

    let mut best: Option<([u8; 3], usize)> = None;
    for (key, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((key, count));
        }
    }

    let [h, s, v] = best.map(|(key, _)| key).unwrap_or([0, 0, 0]);
    Ok(HsvColor::new(f64::from(h), f64::from(s), f64::from(v)))
}

fn texture_features(roi: &Mat) -> Result<TextureFeatures> {
    let gray = to_gray(roi)?;

    let mut grad_x = Mat::default();
    let mut grad_y = Mat::default();
    imgproc::sobel(&gray, &mut grad_x, CV_64F, 1, 0, 3, 1.0, 0.0, core::BORDER_DEFAULT)
        .cv_context("Sobel x")?;
    imgproc::sobel(&gray, &mut grad_y, CV_64F, 0, 1, 3, 1.0, 0.0, core::BORDER_DEFAULT)
        .cv_context("Sobel y")?;

    let mut magnitude = Mat::default();
    core::magnitude(&grad_x, &grad_y, &mut magnitude).cv_context("magnitude")?;

    let mut mean = Mat::default();
    let mut stddev = Mat::default();
    core::mean_std_dev(&magnitude, &mut mean, &mut stddev, &Mat::default()).cv_context("meanStdDev")?;

    Ok(TextureFeatures {
        gradient_mean: *mean.at::<f64>(0).cv_context("meanStdDev read")?,
        gradient_std: *stddev.at::<f64>(0).cv_context("meanStdDev read")?,
    })
}

fn shape_features(proposal: &RegionProposal) -> ShapeFeatures {
    let circularity = if proposal.perimeter > 0.0 {
        4.0 * PI * proposal.area / (proposal.perimeter * proposal.perimeter)
    } else {
        0.0
    };

    ShapeFeatures {
        aspect_ratio: proposal.bbox.aspect_ratio(),
        circularity,
        area: proposal.area,
    }
}
