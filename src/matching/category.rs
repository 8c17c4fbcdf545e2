//! Pantry category inference from token sets
//!
//! Seven fixed categories. Matching priority (first hit wins):
//!   protein, produce, dairy, frozen, bakery, pantry — `Other` is the default.
//!
//! Generic tokens ("ground", "breast", …) are too ambiguous on their own and
//! only count when one of their category's core tokens appears in the same
//! token sequence: ["ground","beef"] is protein, ["ground","coffee"] is not.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PantryCategory {
    Protein,
    Produce,
    Dairy,
    Pantry,
    Bakery,
    Frozen,
    Other,
}

const PROTEIN_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "turkey", "fish", "salmon", "tuna", "shrimp",
    "tofu", "egg", "eggs", "bacon", "sausage", "ham", "steak", "lamb", "meat",
    "tilapia", "cod",
];

const PRODUCE_KEYWORDS: &[&str] = &[
    "tomato", "tomatoes", "onion", "onions", "pepper", "peppers", "lettuce",
    "spinach", "carrot", "carrots", "broccoli", "banana", "bananas", "apple",
    "apples", "potato", "potatoes", "garlic", "avocado", "cucumber", "celery",
    "mushroom", "mushrooms", "lemon", "lime", "orange", "grapes", "berries",
    "strawberries", "kale", "zucchini", "cilantro", "ginger", "cabbage",
];

const DAIRY_KEYWORDS: &[&str] = &[
    "milk", "cheese", "yogurt", "butter", "cream", "cheddar", "mozzarella",
    "parmesan", "feta", "sour",
];

const FROZEN_KEYWORDS: &[&str] = &[
    "frozen", "waffles", "fries", "popsicle", "sherbet",
];

const BAKERY_KEYWORDS: &[&str] = &[
    "bread", "bagel", "bagels", "muffin", "muffins", "tortilla", "tortillas",
    "bun", "buns", "roll", "rolls", "croissant", "baguette", "pita",
];

const PANTRY_KEYWORDS: &[&str] = &[
    "rice", "pasta", "flour", "sugar", "salt", "oil", "beans", "cereal",
    "sauce", "soup", "vinegar", "honey", "noodles", "broth", "stock",
    "spaghetti", "quinoa", "oats", "peanut", "lentils", "soy", "ketchup",
    "mustard", "mayo", "salsa", "crackers", "chips", "cornstarch",
];

/// Generic token → (validating category, core tokens that make it count)
const GENERIC_TOKENS: &[(&str, PantryCategory, &[&str])] = &[
    ("ground", PantryCategory::Protein, &["beef", "turkey", "pork", "chicken", "lamb", "meat"]),
    ("breast", PantryCategory::Protein, &["chicken", "turkey"]),
    ("thigh", PantryCategory::Protein, &["chicken", "turkey"]),
    ("thighs", PantryCategory::Protein, &["chicken", "turkey"]),
    ("whole", PantryCategory::Dairy, &["milk"]),
    ("half", PantryCategory::Dairy, &["cream"]),
    ("wheat", PantryCategory::Bakery, &["bread", "bagels", "tortillas", "buns"]),
    ("english", PantryCategory::Bakery, &["muffin", "muffins"]),
];

/// Does this token sequence hit `category`?
fn hits(tokens: &[String], category: PantryCategory, keywords: &[&str]) -> bool {
    for token in tokens {
        if keywords.contains(&token.as_str()) {
            return true;
        }
        // Generic tokens need a core co-token from the same category
        for (generic, target, cores) in GENERIC_TOKENS {
            if *target == category
                && token == generic
                && tokens.iter().any(|t| cores.contains(&t.as_str()))
            {
                return true;
            }
        }
    }
    false
}

/// Infer the pantry category of a tokenized name. Priority order is fixed;
/// the first matching category wins.
pub fn infer_category(tokens: &[String]) -> PantryCategory {
    let priority: &[(PantryCategory, &[&str])] = &[
        (PantryCategory::Protein, PROTEIN_KEYWORDS),
        (PantryCategory::Produce, PRODUCE_KEYWORDS),
        (PantryCategory::Dairy, DAIRY_KEYWORDS),
        (PantryCategory::Frozen, FROZEN_KEYWORDS),
        (PantryCategory::Bakery, BAKERY_KEYWORDS),
        (PantryCategory::Pantry, PANTRY_KEYWORDS),
    ];

    for (category, keywords) in priority {
        if hits(tokens, *category, keywords) {
            return *category;
        }
    }
    PantryCategory::Other
}

/// `Other` is compatible with everything; concrete categories only with
/// themselves.
pub fn compatible(a: PantryCategory, b: PantryCategory) -> bool {
    a == PantryCategory::Other || b == PantryCategory::Other || a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::tokenizer::tokenize;

    #[test]
    fn direct_keyword_hits() {
        assert_eq!(infer_category(&tokenize("chicken breast")), PantryCategory::Protein);
        assert_eq!(infer_category(&tokenize("roma tomatoes")), PantryCategory::Produce);
        assert_eq!(infer_category(&tokenize("milk")), PantryCategory::Dairy);
        assert_eq!(infer_category(&tokenize("white rice")), PantryCategory::Pantry);
        assert_eq!(infer_category(&tokenize("sourdough bread")), PantryCategory::Bakery);
    }

    #[test]
    fn priority_order_protein_beats_pantry() {
        // "chicken broth" hits both protein (chicken) and pantry (broth);
        // protein is checked first
        assert_eq!(infer_category(&tokenize("chicken broth")), PantryCategory::Protein);
    }

    #[test]
    fn generic_token_requires_core() {
        assert_eq!(infer_category(&tokenize("ground")), PantryCategory::Other);
        assert_eq!(infer_category(&tokenize("ground beef")), PantryCategory::Protein);
        // "coffee" is not a protein core token, so generic "ground" never fires
        assert_eq!(infer_category(&tokenize("ground coffee")), PantryCategory::Other);
        assert_eq!(infer_category(&tokenize("whole milk")), PantryCategory::Dairy);
        assert_eq!(infer_category(&tokenize("whole thing")), PantryCategory::Other);
    }

    #[test]
    fn unknown_defaults_to_other() {
        assert_eq!(infer_category(&tokenize("mystery widget")), PantryCategory::Other);
        assert_eq!(infer_category(&[]), PantryCategory::Other);
    }

    #[test]
    fn compatibility_rules() {
        assert!(compatible(PantryCategory::Other, PantryCategory::Protein));
        assert!(compatible(PantryCategory::Dairy, PantryCategory::Other));
        assert!(compatible(PantryCategory::Dairy, PantryCategory::Dairy));
        assert!(!compatible(PantryCategory::Dairy, PantryCategory::Protein));
    }
}
