//! Normalised OpenFoodFacts product

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used when a product carries neither a product nor a generic name
pub const UNNAMED_PRODUCT: &str = "Без названия";

/// One catalog product with per-100g densities; `None` where the catalog had
/// no usable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub code: String,
    pub name: String,
    pub brand: String,
    pub kcal_100g: Option<f64>,
    pub protein_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub carbs_100g: Option<f64>,
}

impl CatalogProduct {
    /// Build from a product object. `code` overrides the object's own code
    /// (product lookups trust the requested code). Returns `None` for
    /// non-objects and for products without a code.
    pub fn from_json(value: &Value, code: Option<&str>) -> Option<Self> {
        let obj = value.as_object()?;

        let code = match code {
            Some(c) => c.trim().to_string(),
            None => text(obj.get("code")),
        };
        if code.is_empty() {
            return None;
        }

        let name = [text(obj.get("product_name")), text(obj.get("generic_name"))]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string());

        let nutriments = obj.get("nutriments").and_then(Value::as_object);
        let nutriment = |key: &str| nutriments.and_then(|n| n.get(key)).and_then(to_float);

        Some(Self {
            code,
            name,
            brand: text(obj.get("brands")),
            kcal_100g: nutriment("energy-kcal_100g"),
            protein_100g: nutriment("proteins_100g"),
            fat_100g: nutriment("fat_100g"),
            carbs_100g: nutriment("carbohydrates_100g"),
        })
    }
}

/// Loose numeric coercion: numbers and numeric strings become finite floats,
/// anything else is `None`
pub fn to_float(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Trimmed string form of a scalar JSON value; empty for null and containers
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_float_coercion() {
        assert_eq!(to_float(&json!(12.5)), Some(12.5));
        assert_eq!(to_float(&json!(3)), Some(3.0));
        assert_eq!(to_float(&json!(" 4.25 ")), Some(4.25));
        assert_eq!(to_float(&json!("")), None);
        assert_eq!(to_float(&json!("abc")), None);
        assert_eq!(to_float(&json!("nan")), None);
        assert_eq!(to_float(&json!("inf")), None);
        assert_eq!(to_float(&Value::Null), None);
        assert_eq!(to_float(&json!(true)), None);
        assert_eq!(to_float(&json!({"v": 1})), None);
        assert_eq!(to_float(&json!([1])), None);
    }

    #[test]
    fn test_from_json_maps_fields() {
        let p = CatalogProduct::from_json(
            &json!({
                "code": "4600000000001",
                "product_name": "  Гречка ",
                "brands": "Мистраль",
                "nutriments": {
                    "energy-kcal_100g": 343,
                    "proteins_100g": "12.6",
                    "fat_100g": "",
                    "carbohydrates_100g": null
                }
            }),
            None,
        )
        .unwrap();

        assert_eq!(p.code, "4600000000001");
        assert_eq!(p.name, "Гречка");
        assert_eq!(p.brand, "Мистраль");
        assert_eq!(p.kcal_100g, Some(343.0));
        assert_eq!(p.protein_100g, Some(12.6));
        assert_eq!(p.fat_100g, None);
        assert_eq!(p.carbs_100g, None);
    }

    #[test]
    fn test_name_fallbacks() {
        let generic = CatalogProduct::from_json(&json!({"code": "1", "product_name": "", "generic_name": "Milk"}), None).unwrap();
        assert_eq!(generic.name, "Milk");

        let unnamed = CatalogProduct::from_json(&json!({"code": "2"}), None).unwrap();
        assert_eq!(unnamed.name, UNNAMED_PRODUCT);
        assert_eq!(unnamed.brand, "");
    }

    #[test]
    fn test_skips_non_objects_and_missing_codes() {
        assert!(CatalogProduct::from_json(&json!("not a product"), None).is_none());
        assert!(CatalogProduct::from_json(&json!({"product_name": "X"}), None).is_none());
        assert!(CatalogProduct::from_json(&json!({"code": "   "}), None).is_none());
        assert_eq!(CatalogProduct::from_json(&json!({"code": 42}), None).unwrap().code, "42");
    }

    #[test]
    fn test_explicit_code_wins() {
        let p = CatalogProduct::from_json(&json!({"product_name": "X"}), Some("123")).unwrap();
        assert_eq!(p.code, "123");
    }
}
