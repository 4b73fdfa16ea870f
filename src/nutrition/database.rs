//! Static food table with calorie densities
//!
//! Entry order matters: keyword lookups return the first entry in table
//! order that shares a word with the query.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{constants::detection::FALLBACK_FOOD, AnalysisError};

/// Food category used for portion weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Fruits,
    Vegetables,
    Proteins,
    Grains,
    Snacks,
    Beverages,
    Mixed,
    /// User-added foods; weighed like mixed dishes
    Custom,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 8] = [
        FoodCategory::Fruits,
        FoodCategory::Vegetables,
        FoodCategory::Proteins,
        FoodCategory::Grains,
        FoodCategory::Snacks,
        FoodCategory::Beverages,
        FoodCategory::Mixed,
        FoodCategory::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Fruits => "fruits",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::Proteins => "proteins",
            FoodCategory::Grains => "grains",
            FoodCategory::Snacks => "snacks",
            FoodCategory::Beverages => "beverages",
            FoodCategory::Mixed => "mixed",
            FoodCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FoodCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| AnalysisError::invalid_parameter("category", s))
    }
}

/// Portion size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortionSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl PortionSize {
    pub const ALL: [PortionSize; 4] = [
        PortionSize::Small,
        PortionSize::Medium,
        PortionSize::Large,
        PortionSize::ExtraLarge,
    ];

    /// Scaling applied on top of the portion weight
    pub fn multiplier(&self) -> f32 {
        match self {
            PortionSize::Small => 0.5,
            PortionSize::Medium => 1.0,
            PortionSize::Large => 1.5,
            PortionSize::ExtraLarge => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PortionSize::Small => "small",
            PortionSize::Medium => "medium",
            PortionSize::Large => "large",
            PortionSize::ExtraLarge => "extra_large",
        }
    }
}

impl fmt::Display for PortionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortionSize {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        PortionSize::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| AnalysisError::invalid_parameter("portion_size", s))
    }
}

/// One row of the food table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    pub calories_per_100g: f32,
    pub category: FoodCategory,
}

/// Calories per 100 g (per 100 ml for beverages)
const BUILTIN_FOODS: &[(&str, f32, FoodCategory)] = &[
    ("apple", 52.0, FoodCategory::Fruits),
    ("banana", 89.0, FoodCategory::Fruits),
    ("orange", 47.0, FoodCategory::Fruits),
    ("strawberry", 32.0, FoodCategory::Fruits),
    ("grape", 62.0, FoodCategory::Fruits),
    ("lemon", 29.0, FoodCategory::Fruits),
    ("mixed fruits", 50.0, FoodCategory::Fruits),
    ("carrot", 41.0, FoodCategory::Vegetables),
    ("broccoli", 34.0, FoodCategory::Vegetables),
    ("tomato", 18.0, FoodCategory::Vegetables),
    ("lettuce", 15.0, FoodCategory::Vegetables),
    ("cucumber", 16.0, FoodCategory::Vegetables),
    ("onion", 40.0, FoodCategory::Vegetables),
    ("mixed vegetables", 25.0, FoodCategory::Vegetables),
    ("chicken", 165.0, FoodCategory::Proteins),
    ("beef", 250.0, FoodCategory::Proteins),
    ("fish", 206.0, FoodCategory::Proteins),
    ("egg", 155.0, FoodCategory::Proteins),
    ("cheese", 113.0, FoodCategory::Proteins),
    ("yogurt", 59.0, FoodCategory::Proteins),
    ("bread", 265.0, FoodCategory::Grains),
    ("rice", 130.0, FoodCategory::Grains),
    ("pasta", 131.0, FoodCategory::Grains),
    ("cereal", 350.0, FoodCategory::Grains),
    ("oats", 389.0, FoodCategory::Grains),
    ("chips", 536.0, FoodCategory::Snacks),
    ("cookies", 488.0, FoodCategory::Snacks),
    ("candy", 400.0, FoodCategory::Snacks),
    ("nuts", 607.0, FoodCategory::Snacks),
    ("chocolate", 546.0, FoodCategory::Snacks),
    ("coffee", 2.0, FoodCategory::Beverages),
    ("tea", 1.0, FoodCategory::Beverages),
    ("juice", 45.0, FoodCategory::Beverages),
    ("soda", 42.0, FoodCategory::Beverages),
    ("water", 0.0, FoodCategory::Beverages),
    ("milk", 42.0, FoodCategory::Beverages),
    ("mixed food", 200.0, FoodCategory::Mixed),
    ("cooked food", 180.0, FoodCategory::Mixed),
    ("salad", 50.0, FoodCategory::Mixed),
    ("sandwich", 250.0, FoodCategory::Mixed),
    ("pizza", 266.0, FoodCategory::Mixed),
    ("burger", 295.0, FoodCategory::Mixed),
    ("pasta_dish", 200.0, FoodCategory::Mixed),
    ("soup", 80.0, FoodCategory::Mixed),
];

/// Ordered food table keyed by lowercase name
#[derive(Debug, Clone)]
pub struct FoodDatabase {
    foods: IndexMap<String, FoodEntry>,
}

impl Default for FoodDatabase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FoodDatabase {
    /// The built-in table
    pub fn builtin() -> Self {
        let foods = BUILTIN_FOODS
            .iter()
            .map(|&(name, calories_per_100g, category)| {
                (
                    name.to_string(),
                    FoodEntry {
                        name: name.to_string(),
                        calories_per_100g,
                        category,
                    },
                )
            })
            .collect();
        Self { foods }
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// All entries in table order
    pub fn entries(&self) -> impl Iterator<Item = &FoodEntry> {
        self.foods.values()
    }

    /// Exact lookup by already-normalized name
    pub fn get(&self, name: &str) -> Option<&FoodEntry> {
        self.foods.get(name)
    }

    /// First entry sharing a whitespace-separated word with `name`
    pub fn find_similar(&self, name: &str) -> Option<&FoodEntry> {
        let keywords: Vec<&str> = name.split_whitespace().collect();
        if keywords.is_empty() {
            return None;
        }

        self.foods.iter().find_map(|(db_name, entry)| {
            db_name
                .split_whitespace()
                .any(|word| keywords.contains(&word))
                .then_some(entry)
        })
    }

    /// Exact match, then keyword match, then the "mixed food" default
    pub fn lookup(&self, name: &str) -> FoodMatch<'_> {
        let normalized = normalize_name(name);
        if let Some(entry) = self.get(&normalized) {
            return FoodMatch::Exact(entry);
        }
        if let Some(entry) = self.find_similar(&normalized) {
            return FoodMatch::Similar(entry);
        }
        FoodMatch::Default(self.default_entry())
    }

    /// The "mixed food" entry, or a built-in copy if it was removed
    pub fn default_entry(&self) -> &FoodEntry {
        static FALLBACK: once_cell::sync::Lazy<FoodEntry> = once_cell::sync::Lazy::new(|| FoodEntry {
            name: FALLBACK_FOOD.to_string(),
            calories_per_100g: 200.0,
            category: FoodCategory::Mixed,
        });
        self.foods.get(FALLBACK_FOOD).unwrap_or(&*FALLBACK)
    }

    /// Entries of one category, in table order
    pub fn by_category(&self, category: FoodCategory) -> Vec<&FoodEntry> {
        self.foods.values().filter(|e| e.category == category).collect()
    }

    /// Add or replace a food; the name is stored lowercased
    pub fn insert(&mut self, name: &str, calories_per_100g: f32, category: FoodCategory) {
        let key = name.to_lowercase();
        self.foods.insert(
            key.clone(),
            FoodEntry {
                name: key,
                calories_per_100g,
                category,
            },
        );
    }
}

/// How a name was resolved against the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoodMatch<'a> {
    Exact(&'a FoodEntry),
    Similar(&'a FoodEntry),
    Default(&'a FoodEntry),
}

impl<'a> FoodMatch<'a> {
    pub fn entry(&self) -> &'a FoodEntry {
        match *self {
            FoodMatch::Exact(e) | FoodMatch::Similar(e) | FoodMatch::Default(e) => e,
        }
    }
}

/// Lowercase and trim a food name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_size() {
        let db = FoodDatabase::builtin();
        assert_eq!(db.len(), 44);
        assert!(db.get("apple").is_some());
        assert!(db.get("pasta_dish").is_some());
    }

    #[test]
    fn test_exact_lookup_normalizes() {
        let db = FoodDatabase::builtin();
        match db.lookup("  Banana ") {
            FoodMatch::Exact(e) => assert_eq!(e.calories_per_100g, 89.0),
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_lookup() {
        let db = FoodDatabase::builtin();
        match db.lookup("grilled chicken") {
            FoodMatch::Similar(e) => assert_eq!(e.name, "chicken"),
            other => panic!("expected keyword match, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_lookup_uses_table_order() {
        let db = FoodDatabase::builtin();
        // "mixed fruits" precedes every other entry containing "mixed"
        assert_eq!(db.lookup("mixed platter").entry().name, "mixed fruits");
    }

    #[test]
    fn test_unknown_falls_back_to_mixed_food() {
        let db = FoodDatabase::builtin();
        let found = db.lookup("xyzzy");
        assert!(matches!(found, FoodMatch::Default(_)));
        assert_eq!(found.entry().name, "mixed food");
        assert_eq!(found.entry().calories_per_100g, 200.0);
    }

    #[test]
    fn test_empty_name_falls_back() {
        let db = FoodDatabase::builtin();
        assert!(matches!(db.lookup("   "), FoodMatch::Default(_)));
    }

    #[test]
    fn test_by_category() {
        let db = FoodDatabase::builtin();
        let grains: Vec<&str> = db
            .by_category(FoodCategory::Grains)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(grains, vec!["bread", "rice", "pasta", "cereal", "oats"]);
        assert!(db.by_category(FoodCategory::Custom).is_empty());
    }

    #[test]
    fn test_insert_custom_food() {
        let mut db = FoodDatabase::builtin();
        db.insert("Falafel", 333.0, FoodCategory::Custom);
        let entry = db.get("falafel").unwrap();
        assert_eq!(entry.name, "falafel");
        assert_eq!(entry.category, FoodCategory::Custom);
    }

    #[test]
    fn test_parse_portion_and_category() {
        assert_eq!("extra_large".parse::<PortionSize>().unwrap(), PortionSize::ExtraLarge);
        assert_eq!("Extra Large".parse::<PortionSize>().unwrap(), PortionSize::ExtraLarge);
        assert!("huge".parse::<PortionSize>().is_err());
        assert_eq!("Fruits".parse::<FoodCategory>().unwrap(), FoodCategory::Fruits);
        assert!("dessert".parse::<FoodCategory>().is_err());
    }

    #[test]
    fn test_portion_serialization() {
        let json = serde_json::to_string(&PortionSize::ExtraLarge).unwrap();
        assert_eq!(json, "\"extra_large\"");
    }
}
