//! Shared nutrition data structure
//!
//! Used for food item densities, meal item portions and daily totals.

use serde::{Deserialize, Serialize};

use crate::nutrition::scale;

/// Energy and macronutrient amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub kcal: f64,
    pub protein: f64, // grams
    pub fat: f64,     // grams
    pub carb: f64,    // grams
}

/// Selects one field of a [`Nutrition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Kcal,
    Protein,
    Fat,
    Carb,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [Nutrient::Kcal, Nutrient::Protein, Nutrient::Fat, Nutrient::Carb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Kcal => "kcal",
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carb => "carb",
        }
    }
}

impl Nutrition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Treat `self` as per-100g densities and compute the amounts in `grams`
    pub fn for_portion(&self, grams: f64) -> Self {
        Self {
            kcal: scale(self.kcal, grams),
            protein: scale(self.protein, grams),
            fat: scale(self.fat, grams),
            carb: scale(self.carb, grams),
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Kcal => self.kcal,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carb => self.carb,
        }
    }

    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            kcal: self.kcal + other.kcal,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carb: self.carb + other.carb,
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_portion_scales_every_field() {
        let density = Nutrition { kcal: 100.0, protein: 10.0, fat: 5.0, carb: 20.0 };
        let portion = density.for_portion(50.0);
        assert!((portion.kcal - 50.0).abs() < 1e-9);
        assert!((portion.protein - 5.0).abs() < 1e-9);
        assert!((portion.fat - 2.5).abs() < 1e-9);
        assert!((portion.carb - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum() {
        let a = Nutrition { kcal: 1.0, protein: 2.0, fat: 3.0, carb: 4.0 };
        let total: Nutrition = vec![a, a, a].into_iter().sum();
        assert_eq!(total.get(Nutrient::Carb), 12.0);
        assert_eq!(total.get(Nutrient::Kcal), 3.0);
    }
}
