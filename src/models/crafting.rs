use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CraftingItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub tutorial: Option<String>,
    pub image_url: Option<String>,
    pub location_image_url: Option<String>,
    pub acquisition_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

// Ingredient row joined with its material, as the blueprint detail view serves it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IngredientDetail {
    pub material_id: Uuid,
    pub material_name: String,
    pub quantity: i32,
    pub tutorial: Option<String>,
    pub image_url: Option<String>,
    pub location_image_url: Option<String>,
    pub acquisition_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubIngredient {
    pub name: String,
    pub count: i64,
}

/// How a material is obtained in the world. The tag carries the method and each
/// variant carries the fields that method requires, so a payload missing its
/// required fields fails to deserialize instead of being stored as a loose blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AcquisitionData {
    Job {
        job_name: String,
        #[serde(default)]
        tools: Vec<String>,
    },
    Crafting {
        sub_ingredients: Vec<SubIngredient>,
        #[serde(rename = "yield")]
        yield_per_craft: i64,
        #[serde(default)]
        steps: Vec<String>,
    },
    Gathering {
        location_name: String,
        #[serde(default)]
        steps: Vec<String>,
    },
}

impl AcquisitionData {
    pub fn method(&self) -> &'static str {
        match self {
            AcquisitionData::Job { .. } => "job",
            AcquisitionData::Crafting { .. } => "crafting",
            AcquisitionData::Gathering { .. } => "gathering",
        }
    }

    /// Numeric constraints serde cannot express. Checked before a material is stored.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            AcquisitionData::Job { job_name, .. } => {
                if job_name.trim().is_empty() {
                    return Err("job_name must not be empty".to_string());
                }
            }
            AcquisitionData::Crafting {
                sub_ingredients,
                yield_per_craft,
                ..
            } => {
                if *yield_per_craft < 1 {
                    return Err("yield must be at least 1".to_string());
                }
                if sub_ingredients.is_empty() {
                    return Err("crafting acquisition needs at least one sub-ingredient".to_string());
                }
                for sub in sub_ingredients {
                    if sub.count < 1 {
                        return Err(format!("sub-ingredient {} has non-positive count", sub.name));
                    }
                }
            }
            AcquisitionData::Gathering { location_name, .. } => {
                if location_name.trim().is_empty() {
                    return Err("location_name must not be empty".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acquisition_data_parses_tagged_methods() {
        let data: AcquisitionData = serde_json::from_value(json!({
            "method": "crafting",
            "sub_ingredients": [{"name": "Herbs", "count": 2}],
            "yield": 4
        }))
        .unwrap();
        assert_eq!(data.method(), "crafting");
        assert!(data.validate().is_ok());

        let data: AcquisitionData = serde_json::from_value(json!({
            "method": "gathering",
            "location_name": "North Shore",
            "steps": ["dive", "collect"]
        }))
        .unwrap();
        assert_eq!(data.method(), "gathering");
    }

    #[test]
    fn acquisition_data_rejects_missing_method_fields() {
        // A job acquisition without its job_name must not parse.
        let result = serde_json::from_value::<AcquisitionData>(json!({
            "method": "job",
            "tools": ["pickaxe"]
        }));
        assert!(result.is_err());

        let result = serde_json::from_value::<AcquisitionData>(json!({
            "method": "teleport"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn acquisition_data_validates_numeric_bounds() {
        let data = AcquisitionData::Crafting {
            sub_ingredients: vec![SubIngredient {
                name: "Scrap".to_string(),
                count: 0,
            }],
            yield_per_craft: 4,
            steps: vec![],
        };
        assert!(data.validate().is_err());

        let data = AcquisitionData::Crafting {
            sub_ingredients: vec![SubIngredient {
                name: "Scrap".to_string(),
                count: 2,
            }],
            yield_per_craft: 0,
            steps: vec![],
        };
        assert!(data.validate().is_err());
    }
}
