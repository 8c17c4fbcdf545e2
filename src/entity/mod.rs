// Meal library (seeded, read-only at runtime)
pub mod meal;
pub mod meal_ingredient;

// Household pantry state
pub mod inventory_item;

// Append-only decision substrate
pub mod decision_event;

// Receipt ingestion
pub mod receipt_import;
pub mod receipt_line_item;

// Taste learning
pub mod taste_meal_score;
pub mod taste_signal;
