//! Seed meal library — immutable at runtime
//!
//! Both store backends load this on startup: Postgres inserts idempotently
//! after migrations, the in-memory store loads it on first use. Meal ids are
//! stable so decision events stay resolvable across restarts.

use chrono::{DateTime, FixedOffset};
use serde_json::json;

use crate::entity::{meal, meal_ingredient};

pub struct SeedMeal {
    pub id: &'static str,
    pub display_name: &'static str,
    pub steps_short: &'static str,
    pub est_minutes: i32,
    pub cost_band: &'static str,
    pub tags: &'static [&'static str],
    /// (ingredient name, qty text, pantry staple)
    pub ingredients: &'static [(&'static str, Option<&'static str>, bool)],
}

const SEED_MEALS: &[SeedMeal] = &[
    SeedMeal {
        id: "meal-001",
        display_name: "Spaghetti Marinara",
        steps_short: "Boil spaghetti. Warm marinara with garlic. Toss and top with parmesan.",
        est_minutes: 25,
        cost_band: "$",
        tags: &["pasta", "vegetarian"],
        ingredients: &[
            ("spaghetti", Some("1 lb"), false),
            ("marinara sauce", Some("1"), false),
            ("parmesan cheese", None, false),
            ("garlic", None, true),
            ("olive oil", None, true),
            ("salt", None, true),
        ],
    },
    SeedMeal {
        id: "meal-002",
        display_name: "Sheet Pan Salmon",
        steps_short: "Roast salmon and broccoli at 425F for 14 minutes. Finish with lemon.",
        est_minutes: 25,
        cost_band: "$$$",
        tags: &["fish", "sheet_pan"],
        ingredients: &[
            ("salmon fillet", Some("1 lb"), false),
            ("broccoli", Some("1"), false),
            ("lemon", Some("1"), false),
            ("olive oil", None, true),
            ("salt", None, true),
            ("black pepper", None, true),
        ],
    },
    SeedMeal {
        id: "meal-003",
        display_name: "Black Bean Tacos",
        steps_short: "Warm beans with cumin. Char tortillas. Assemble with cheese and salsa.",
        est_minutes: 20,
        cost_band: "$",
        tags: &["vegetarian", "mexican"],
        ingredients: &[
            ("black beans", Some("1"), false),
            ("tortillas", Some("6"), false),
            ("shredded cheese", None, false),
            ("salsa", None, false),
            ("cumin", None, true),
            ("salt", None, true),
        ],
    },
    SeedMeal {
        id: "meal-004",
        display_name: "Turkey Burgers",
        steps_short: "Form patties, sear 5 minutes a side. Toast buns, dress and serve.",
        est_minutes: 30,
        cost_band: "$$",
        tags: &["grill"],
        ingredients: &[
            ("ground turkey", Some("1 lb"), false),
            ("burger buns", Some("4"), false),
            ("lettuce", None, false),
            ("tomato", Some("1"), false),
            ("salt", None, true),
            ("black pepper", None, true),
        ],
    },
    SeedMeal {
        id: "meal-005",
        display_name: "Veggie Fried Rice",
        steps_short: "Scramble eggs, set aside. Fry rice with vegetables, soy sauce, eggs back in.",
        est_minutes: 20,
        cost_band: "$",
        tags: &["rice", "wok", "vegetarian"],
        ingredients: &[
            ("rice", Some("2"), true),
            ("eggs", Some("3"), false),
            ("frozen peas", Some("1"), false),
            ("carrots", Some("2"), false),
            ("soy sauce", None, true),
            ("garlic", None, true),
        ],
    },
    SeedMeal {
        id: "meal-006",
        display_name: "Baked Potato Bar",
        steps_short: "Bake potatoes until tender. Load with butter, cheese and toppings.",
        est_minutes: 60,
        cost_band: "$",
        tags: &["vegetarian", "slow"],
        ingredients: &[
            ("potatoes", Some("4"), false),
            ("butter", None, false),
            ("shredded cheese", None, false),
            ("sour cream", None, false),
            ("salt", None, true),
        ],
    },
    SeedMeal {
        id: "meal-007",
        display_name: "Chicken Thigh Traybake",
        steps_short: "Roast chicken thighs with potatoes and onion at 400F for 40 minutes.",
        est_minutes: 50,
        cost_band: "$$",
        tags: &["sheet_pan"],
        ingredients: &[
            ("chicken thighs", Some("1.5 lb"), false),
            ("potatoes", Some("3"), false),
            ("onion", Some("1"), false),
            ("olive oil", None, true),
            ("salt", None, true),
            ("black pepper", None, true),
        ],
    },
    SeedMeal {
        id: "meal-008",
        display_name: "Caprese Grilled Cheese",
        steps_short: "Layer mozzarella, tomato and basil between bread. Griddle until golden.",
        est_minutes: 15,
        cost_band: "$",
        tags: &["vegetarian", "fast"],
        ingredients: &[
            ("bread", Some("4"), false),
            ("mozzarella cheese", None, false),
            ("tomato", Some("1"), false),
            ("basil", None, false),
            ("butter", None, true),
        ],
    },
    SeedMeal {
        id: "meal-009",
        display_name: "Beef Chili",
        steps_short: "Brown beef with onion. Simmer with beans, tomatoes and chili powder 30 minutes.",
        est_minutes: 45,
        cost_band: "$$",
        tags: &["one_pot"],
        ingredients: &[
            ("ground beef", Some("1 lb"), false),
            ("black beans", Some("1"), false),
            ("canned tomatoes", Some("1"), false),
            ("onion", Some("1"), false),
            ("chili powder", None, true),
            ("salt", None, true),
        ],
    },
    SeedMeal {
        id: "meal-010",
        display_name: "Greek Yogurt Bowls",
        steps_short: "Spoon yogurt into bowls. Top with honey, berries and granola.",
        est_minutes: 10,
        cost_band: "$",
        tags: &["no_cook", "fast"],
        ingredients: &[
            ("greek yogurt", Some("2"), false),
            ("strawberries", Some("1"), false),
            ("granola", None, false),
            ("honey", None, true),
        ],
    },
    SeedMeal {
        id: "meal-011",
        display_name: "Pesto Tortellini",
        steps_short: "Boil tortellini 4 minutes. Toss with pesto and halved tomatoes.",
        est_minutes: 15,
        cost_band: "$$",
        tags: &["pasta", "fast", "vegetarian"],
        ingredients: &[
            ("cheese tortellini", Some("1"), false),
            ("pesto", Some("1"), false),
            ("tomatoes", Some("2"), false),
            ("parmesan cheese", None, false),
        ],
    },
    SeedMeal {
        id: "meal-012",
        display_name: "Chicken Stir-Fry",
        steps_short: "Sear sliced chicken breast. Stir-fry vegetables, add sauce, serve over rice.",
        est_minutes: 25,
        cost_band: "$$",
        tags: &["wok", "fast"],
        ingredients: &[
            ("chicken breast", Some("1 lb"), false),
            ("broccoli", Some("1"), false),
            ("bell pepper", Some("1"), false),
            ("rice", Some("2"), true),
            ("soy sauce", None, true),
            ("garlic", None, true),
            ("ginger", None, true),
        ],
    },
];

/// Materialize the seed library as entity rows. Ingredient row ids are
/// assigned sequentially so the in-memory store is deterministic.
pub fn meal_library() -> (Vec<meal::Model>, Vec<meal_ingredient::Model>) {
    let mut meals = Vec::with_capacity(SEED_MEALS.len());
    let mut ingredients = Vec::new();
    let mut next_ingredient_id: i64 = 1;

    for seed in SEED_MEALS {
        meals.push(meal::Model {
            id: seed.id.to_string(),
            canonical_key: seed.display_name.to_lowercase(),
            display_name: seed.display_name.to_string(),
            steps_short: seed.steps_short.to_string(),
            est_minutes: seed.est_minutes,
            cost_band: seed.cost_band.to_string(),
            tags: json!(seed.tags),
            active: true,
        });

        for (name, qty_text, staple) in seed.ingredients {
            ingredients.push(meal_ingredient::Model {
                id: next_ingredient_id,
                meal_id: seed.id.to_string(),
                ingredient_name: (*name).to_string(),
                qty_text: qty_text.map(str::to_string),
                is_pantry_staple: *staple,
            });
            next_ingredient_id += 1;
        }
    }

    (meals, ingredients)
}

/// Parse an ISO-8601 timestamp, preserving its offset
pub fn parse_iso(iso: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(iso).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_contains_the_stir_fry() {
        let (meals, ingredients) = meal_library();
        let stir_fry = meals.iter().find(|m| m.id == "meal-012").unwrap();
        assert_eq!(stir_fry.display_name, "Chicken Stir-Fry");
        assert!(stir_fry.active);

        let ings: Vec<_> = ingredients.iter().filter(|i| i.meal_id == "meal-012").collect();
        assert!(ings.iter().any(|i| i.ingredient_name == "chicken breast" && !i.is_pantry_staple));
        assert!(ings.iter().any(|i| i.ingredient_name == "rice" && i.is_pantry_staple));
    }

    #[test]
    fn canonical_keys_are_lowercase() {
        let (meals, _) = meal_library();
        for meal in &meals {
            assert_eq!(meal.canonical_key, meal.canonical_key.to_lowercase());
        }
    }

    #[test]
    fn ingredient_ids_are_sequential() {
        let (_, ingredients) = meal_library();
        for (idx, ing) in ingredients.iter().enumerate() {
            assert_eq!(ing.id, idx as i64 + 1);
        }
    }
}
