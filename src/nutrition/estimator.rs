//! Calorie estimation from a food name, confidence, and portion size
//!
//! calories = kcal/100g * weight/100 * portion multiplier * (0.7 + 0.3 * confidence),
//! floored at 10 kcal. Weights come from a fixed category x portion table.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::database::{FoodCategory, FoodDatabase, FoodEntry, FoodMatch, PortionSize};
use crate::config::EstimationConfig;
use crate::{AnalysisError, Result};

/// Estimated grams for a portion of a category
pub fn estimate_weight(portion: PortionSize, category: FoodCategory) -> f32 {
    let row: [f32; 4] = match category {
        FoodCategory::Fruits => [80.0, 150.0, 250.0, 350.0],
        FoodCategory::Vegetables => [60.0, 120.0, 200.0, 300.0],
        FoodCategory::Proteins => [100.0, 150.0, 250.0, 350.0],
        FoodCategory::Grains => [50.0, 100.0, 150.0, 200.0],
        FoodCategory::Snacks => [30.0, 60.0, 100.0, 150.0],
        FoodCategory::Beverages => [150.0, 250.0, 350.0, 500.0],
        FoodCategory::Mixed | FoodCategory::Custom => [100.0, 200.0, 300.0, 400.0],
    };
    match portion {
        PortionSize::Small => row[0],
        PortionSize::Medium => row[1],
        PortionSize::Large => row[2],
        PortionSize::ExtraLarge => row[3],
    }
}

/// Table entry details for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    pub name: String,
    pub calories_per_100g: f32,
    pub category: FoodCategory,
    pub portion_sizes: Vec<PortionSize>,
}

/// Calorie estimator over a food table
#[derive(Debug, Clone, Default)]
pub struct CalorieEstimator {
    database: FoodDatabase,
    config: EstimationConfig,
}

impl CalorieEstimator {
    /// Create an estimator over the built-in table with default scaling
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator with custom scaling parameters
    pub fn with_config(config: EstimationConfig) -> Self {
        Self {
            database: FoodDatabase::builtin(),
            config,
        }
    }

    /// Estimate calories, substituting the fallback value on failure
    pub fn estimate_calories(&self, food_name: &str, confidence: f32, portion: PortionSize) -> f32 {
        match self.try_estimate_calories(food_name, confidence, portion) {
            Ok(calories) => calories,
            Err(e) => {
                warn!("Error estimating calories for {}: {}", food_name, e);
                self.config.fallback_calories
            }
        }
    }

    /// Estimate calories, reporting invalid input as an error
    pub fn try_estimate_calories(
        &self,
        food_name: &str,
        confidence: f32,
        portion: PortionSize,
    ) -> Result<f32> {
        if !confidence.is_finite() {
            return Err(AnalysisError::invalid_parameter("confidence", confidence));
        }

        let found = self.database.lookup(food_name);
        match found {
            FoodMatch::Exact(_) => {}
            FoodMatch::Similar(e) => debug!("'{}' matched '{}' by keyword", food_name, e.name),
            FoodMatch::Default(e) => debug!("'{}' not in table, using '{}'", food_name, e.name),
        }
        let entry = found.entry();

        let weight = estimate_weight(portion, entry.category);
        let total = entry.calories_per_100g * weight / 100.0 * portion.multiplier();
        let adjusted = total * self.confidence_adjustment(confidence);

        Ok(adjusted.max(self.config.min_calories))
    }

    /// Linear scaling in confidence; 0.7 at zero confidence, 1.0 at full
    pub fn confidence_adjustment(&self, confidence: f32) -> f32 {
        self.config.confidence_base + self.config.confidence_span * confidence.clamp(0.0, 1.0)
    }

    pub fn food_database(&self) -> &FoodDatabase {
        &self.database
    }

    pub fn foods_by_category(&self, category: FoodCategory) -> Vec<&FoodEntry> {
        self.database.by_category(category)
    }

    /// Add a food to this estimator's table (category defaults to custom)
    pub fn add_custom_food(
        &mut self,
        name: &str,
        calories_per_100g: f32,
        category: Option<FoodCategory>,
    ) -> Result<()> {
        if !calories_per_100g.is_finite() || calories_per_100g < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "calories_per_100g",
                calories_per_100g,
            ));
        }
        if name.trim().is_empty() {
            return Err(AnalysisError::invalid_parameter("name", name));
        }
        self.database
            .insert(name, calories_per_100g, category.unwrap_or(FoodCategory::Custom));
        Ok(())
    }

    /// Details of an exactly named food (case-insensitive)
    pub fn nutritional_info(&self, food_name: &str) -> Option<NutritionalInfo> {
        self.database
            .get(&food_name.to_lowercase())
            .map(|entry| NutritionalInfo {
                name: food_name.to_string(),
                calories_per_100g: entry.calories_per_100g,
                category: entry.category,
                portion_sizes: PortionSize::ALL.to_vec(),
            })
    }
}
