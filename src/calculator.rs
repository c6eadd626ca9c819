//! Crafting quantity math. Pure functions, no I/O; the handlers feed them rows.

use serde::Serialize;
use uuid::Uuid;

use crate::models::AcquisitionData;

/// Raw material needed for one sub-ingredient across all crafts of a material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubRequirement {
    pub name: String,
    pub count_per_craft: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialRequirement {
    pub material_id: Uuid,
    pub name: String,
    pub method: Option<&'static str>,
    pub quantity_per_item: i64,
    pub required: i64,
    pub crafts_needed: Option<i64>,
    pub sub_ingredients: Vec<SubRequirement>,
}

pub fn required_quantity(quantity_per_item: i64, target_quantity: i64) -> i64 {
    quantity_per_item * target_quantity
}

/// Ceiling division: the last craft is paid for in full even when it overshoots.
pub fn crafts_needed(required: i64, yield_per_craft: i64) -> i64 {
    let per_craft = yield_per_craft.max(1);
    (required + per_craft - 1) / per_craft
}

/// Expands a crafting-type acquisition into crafts needed and per-sub-ingredient
/// totals. Non-crafting methods have nothing to expand.
pub fn expand_acquisition(
    acquisition: Option<&AcquisitionData>,
    required: i64,
) -> (Option<i64>, Vec<SubRequirement>) {
    match acquisition {
        Some(AcquisitionData::Crafting {
            sub_ingredients,
            yield_per_craft,
            ..
        }) => {
            let crafts = crafts_needed(required, *yield_per_craft);
            let subs = sub_ingredients
                .iter()
                .map(|sub| SubRequirement {
                    name: sub.name.clone(),
                    count_per_craft: sub.count,
                    total: sub.count * crafts,
                })
                .collect();
            (Some(crafts), subs)
        }
        _ => (None, Vec::new()),
    }
}

/// Full requirement line for one ingredient of a blueprint at a target quantity.
pub fn material_requirement(
    material_id: Uuid,
    name: &str,
    quantity_per_item: i64,
    acquisition: Option<&AcquisitionData>,
    target_quantity: i64,
) -> MaterialRequirement {
    let required = required_quantity(quantity_per_item, target_quantity);
    let (crafts, sub_ingredients) = expand_acquisition(acquisition, required);
    MaterialRequirement {
        material_id,
        name: name.to_string(),
        method: acquisition.map(AcquisitionData::method),
        quantity_per_item,
        required,
        crafts_needed: crafts,
        sub_ingredients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubIngredient;

    #[test]
    fn required_quantity_scales_linearly() {
        assert_eq!(required_quantity(3, 5), 15);
        assert_eq!(required_quantity(1, 1), 1);
        assert_eq!(required_quantity(10, 0), 0);
    }

    #[test]
    fn crafts_needed_rounds_up() {
        assert_eq!(crafts_needed(15, 4), 4);
        assert_eq!(crafts_needed(16, 4), 4);
        assert_eq!(crafts_needed(17, 4), 5);
        assert_eq!(crafts_needed(1, 4), 1);
        assert_eq!(crafts_needed(0, 4), 0);
        // Degenerate stored yields fall back to 1 per craft.
        assert_eq!(crafts_needed(5, 0), 5);
    }

    #[test]
    fn crafting_acquisition_expands_sub_ingredients() {
        let acquisition = AcquisitionData::Crafting {
            sub_ingredients: vec![SubIngredient {
                name: "Raw Ore".to_string(),
                count: 2,
            }],
            yield_per_craft: 4,
            steps: vec![],
        };
        let (crafts, subs) = expand_acquisition(Some(&acquisition), 15);
        assert_eq!(crafts, Some(4));
        assert_eq!(
            subs,
            vec![SubRequirement {
                name: "Raw Ore".to_string(),
                count_per_craft: 2,
                total: 8,
            }]
        );
    }

    #[test]
    fn non_crafting_methods_have_no_expansion() {
        let acquisition = AcquisitionData::Gathering {
            location_name: "Quarry".to_string(),
            steps: vec![],
        };
        assert_eq!(expand_acquisition(Some(&acquisition), 15), (None, vec![]));
        assert_eq!(expand_acquisition(None, 15), (None, vec![]));
    }

    #[test]
    fn material_requirement_combines_scaling_and_expansion() {
        let id = Uuid::new_v4();
        let acquisition = AcquisitionData::Crafting {
            sub_ingredients: vec![
                SubIngredient {
                    name: "Powder".to_string(),
                    count: 3,
                },
                SubIngredient {
                    name: "Casing".to_string(),
                    count: 1,
                },
            ],
            yield_per_craft: 10,
            steps: vec![],
        };
        let req = material_requirement(id, "Ammo Box", 4, Some(&acquisition), 6);
        assert_eq!(req.required, 24);
        assert_eq!(req.crafts_needed, Some(3));
        assert_eq!(req.sub_ingredients[0].total, 9);
        assert_eq!(req.sub_ingredients[1].total, 3);
        assert_eq!(req.method, Some("crafting"));
    }
}
