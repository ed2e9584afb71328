//! Default catalog of drink definitions.
//!
//! This module provides the built-in drinks and the merge point for
//! user-defined custom drinks.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
///
/// Returns a reference to the pre-built catalog, avoiding the overhead of
/// rebuilding it on every operation.
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of built-in drinks
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and for hosts
/// that merge custom drinks on top.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn builtin(id: &str, icon: &str, name: &str, portions: &[f64]) -> DrinkDefinition {
    DrinkDefinition {
        id: id.into(),
        icon: icon.into(),
        name: name.into(),
        portions: portions.to_vec(),
        custom: false,
    }
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Catalog {
    let mut drinks = HashMap::new();

    drinks.insert("wine".into(), builtin("wine", "🍷", "Wine", &[0.5, 1.0]));
    drinks.insert("sake".into(), builtin("sake", "🍶", "Sake", &[1.0]));
    drinks.insert("water".into(), builtin("water", "💦", "Water", &[0.5, 1.0]));
    drinks.insert("melon".into(), builtin("melon", "🍈", "Melon liqueur", &[0.5, 1.0]));
    drinks.insert("beer".into(), builtin("beer", "🍺", "Beer", &[1.0]));
    drinks.insert(
        "whiskey".into(),
        builtin("whiskey", "🥃", "Whiskey", &[0.5, 1.0]),
    );

    Catalog { drinks }
}

impl Catalog {
    /// Look up a drink definition by id
    pub fn get(&self, drink_id: &str) -> Option<&DrinkDefinition> {
        self.drinks.get(drink_id)
    }

    /// Look up a drink definition, failing with `UnknownDrink` if absent
    pub fn require(&self, drink_id: &str) -> Result<&DrinkDefinition> {
        self.get(drink_id)
            .ok_or_else(|| Error::UnknownDrink(drink_id.to_string()))
    }

    /// Whether a drink is user-defined and therefore rule-exempt.
    ///
    /// Unknown ids are treated as not custom: a drink missing from the
    /// catalog gets no rule exemption.
    pub fn is_custom(&self, drink_id: &str) -> bool {
        self.get(drink_id).map(|d| d.custom).unwrap_or(false)
    }

    /// Merge custom drink definitions on top of this catalog.
    ///
    /// Custom entries win over built-ins with the same id; every merged
    /// entry is marked `custom = true` regardless of what the source said.
    pub fn with_custom(mut self, custom: impl IntoIterator<Item = DrinkDefinition>) -> Self {
        for mut drink in custom {
            drink.custom = true;
            self.drinks.insert(drink.id.clone(), drink);
        }
        self
    }

    /// The user-defined entries, sorted by id for stable output
    pub fn custom_drinks(&self) -> Vec<DrinkDefinition> {
        let mut custom: Vec<_> = self.drinks.values().filter(|d| d.custom).cloned().collect();
        custom.sort_by(|a, b| a.id.cmp(&b.id));
        custom
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, drink) in &self.drinks {
            if id.is_empty() || drink.id.is_empty() {
                errors.push("Drink has empty ID".to_string());
            }
            if id != &drink.id {
                errors.push(format!(
                    "Drink key '{}' doesn't match drink.id '{}'",
                    id, drink.id
                ));
            }
            if drink.name.is_empty() {
                errors.push(format!("Drink '{}' has empty name", id));
            }
            if drink.portions.is_empty() {
                errors.push(format!("Drink '{}' has no portion sizes", id));
            }
            for portion in &drink.portions {
                if *portion <= 0.0 {
                    errors.push(format!(
                        "Drink '{}': portion size {} is not positive",
                        id, portion
                    ));
                }
            }
        }

        errors
    }
}
