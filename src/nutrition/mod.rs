//! Nutrition module
//!
//! The static food table and the calorie estimator built on it.

pub mod database;
pub mod estimator;

pub use database::{FoodCategory, FoodDatabase, FoodEntry, FoodMatch, PortionSize};
pub use estimator::{CalorieEstimator, NutritionalInfo};
