//! Item catalog and featured-item ranking.
//!
//! The catalog is the built-in items followed by the user's custom items.
//! Quick access shows a bounded most-recently-used list of built-in items,
//! followed by every custom item.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Default number of featured slots
pub const FEATURED_CAPACITY: usize = 10;

/// Cached built-in items, in their default display order
static BUILTIN_ITEMS: Lazy<Vec<SugarItem>> = Lazy::new(build_builtin_items);

/// Get a reference to the cached built-in items
pub fn builtin_items() -> &'static [SugarItem] {
    &BUILTIN_ITEMS
}

fn build_builtin_items() -> Vec<SugarItem> {
    use SugarItemCategory::*;

    vec![
        // ====================================================================
        // Default quick-access set
        // ====================================================================
        SugarItem::builtin("Donut", 22, "donut", Bakery),
        SugarItem::builtin("Can of Soda", 39, "soda", Drink),
        SugarItem::builtin("Chocolate Bar", 24, "chocolate-bar", Candy),
        SugarItem::builtin("Ice Cream Scoop", 15, "ice-cream", Dessert),
        SugarItem::builtin("Cookie", 12, "cookie", Bakery),
        SugarItem::builtin("Energy Drink", 27, "energy-drink", Drink),
        SugarItem::builtin("Bowl of Cereal", 20, "cereal", Breakfast),
        SugarItem::builtin("Frappuccino", 45, "frappucino", Drink),
        SugarItem::builtin("Candy Pack", 30, "candy", Candy),
        SugarItem::builtin("Juice Box", 18, "juice-box", Kids),
        // ====================================================================
        // Library
        // ====================================================================
        SugarItem::builtin("Cupcake", 30, "cupcake", Bakery),
        SugarItem::builtin("Blueberry Muffin", 28, "muffin", Bakery),
        SugarItem::builtin("Cinnamon Roll", 24, "cinnamon-roll", Bakery),
        SugarItem::builtin("Sweet Iced Tea", 32, "iced-tea", Drink),
        SugarItem::builtin("Milkshake", 58, "milkshake", Drink),
        SugarItem::builtin("Gummy Bears", 21, "gummy-bears", Candy),
        SugarItem::builtin("Slice of Cake", 35, "cake", Dessert),
        SugarItem::builtin("Fruit Yogurt", 19, "yogurt", Breakfast),
        SugarItem::builtin("Pancakes with Syrup", 32, "pancakes", Breakfast),
        SugarItem::builtin("Ketchup Packet", 2, "ketchup", Condiment),
        SugarItem::builtin("Granola Bar", 12, "granola-bar", Snack),
        SugarItem::builtin("Fast Food Sundae", 44, "sundae", Fastfood),
        SugarItem::builtin("Chocolate Milk Box", 22, "chocolate-milk", Kids),
    ]
}

// ============================================================================
// Catalog
// ============================================================================

/// Built-in plus custom items
#[derive(Clone, Debug)]
pub struct Catalog {
    builtin: Vec<SugarItem>,
    custom: Vec<SugarItem>,
}

/// Why a custom item was not added
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CustomItemRejection {
    EmptyName,
    NonPositiveGrams,
    DuplicateName,
}

impl Catalog {
    /// Catalog over the cached built-in items
    pub fn with_builtins(custom: Vec<SugarItem>) -> Self {
        Self::new(builtin_items().to_vec(), custom)
    }

    pub fn new(builtin: Vec<SugarItem>, custom: Vec<SugarItem>) -> Self {
        let mut catalog = Self {
            builtin,
            custom: Vec::new(),
        };
        for item in custom {
            if let Err(reason) = catalog.try_add_custom(&item.name, item.sugar_grams, item.category) {
                tracing::warn!("Dropping stored custom item '{}': {:?}", item.name, reason);
            }
        }
        catalog
    }

    pub fn builtin(&self) -> &[SugarItem] {
        &self.builtin
    }

    pub fn custom(&self) -> &[SugarItem] {
        &self.custom
    }

    /// Full catalog: built-in items followed by custom items
    pub fn all(&self) -> impl Iterator<Item = &SugarItem> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact storage-key lookup
    pub fn get(&self, name: &str) -> Option<&SugarItem> {
        self.all().find(|item| item.storage_key() == name)
    }

    /// Case-insensitive lookup
    pub fn find(&self, name: &str) -> Option<&SugarItem> {
        let needle = name.trim().to_lowercase();
        self.all().find(|item| item.identity() == needle)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Validate and append a custom item
    pub fn try_add_custom(
        &mut self,
        name: &str,
        grams: i32,
        category: SugarItemCategory,
    ) -> std::result::Result<&SugarItem, CustomItemRejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CustomItemRejection::EmptyName);
        }
        if grams <= 0 {
            return Err(CustomItemRejection::NonPositiveGrams);
        }
        if self.contains_name(name) {
            return Err(CustomItemRejection::DuplicateName);
        }

        self.custom.push(SugarItem::custom(name, grams, category));
        Ok(&self.custom[self.custom.len() - 1])
    }

    /// Remove a custom item by case-insensitive name; built-ins cannot be removed
    pub fn remove_custom(&mut self, name: &str) -> Option<SugarItem> {
        let needle = name.trim().to_lowercase();
        let index = self.custom.iter().position(|item| item.identity() == needle)?;
        Some(self.custom.remove(index))
    }

    pub fn custom_records(&self) -> Vec<CustomItemRecord> {
        self.custom.iter().map(CustomItemRecord::from).collect()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for item in self.all() {
            if item.name.trim().is_empty() {
                errors.push("Item has empty name".to_string());
            }
            if item.sugar_grams <= 0 {
                errors.push(format!(
                    "Item '{}' has non-positive grams {}",
                    item.name, item.sugar_grams
                ));
            }
            if !seen.insert(item.identity()) {
                errors.push(format!("Duplicate item name '{}'", item.name));
            }
        }

        for item in &self.builtin {
            if item.is_custom {
                errors.push(format!("Built-in item '{}' is marked custom", item.name));
            }
        }
        for item in &self.custom {
            if !item.is_custom {
                errors.push(format!("Custom item '{}' is not marked custom", item.name));
            }
        }

        errors
    }
}

// ============================================================================
// Featured ranking
// ============================================================================

/// Bounded most-recently-used list of built-in item names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeaturedItems {
    names: Vec<String>,
    capacity: usize,
}

impl FeaturedItems {
    /// Restore from stored names and heal against the catalog
    pub fn restore(names: Vec<String>, capacity: usize, catalog: &Catalog) -> Self {
        let mut featured = Self {
            names,
            capacity: capacity.max(1),
        };
        featured.heal(catalog);
        featured
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Move a name to the front, dropping the oldest beyond capacity
    pub fn promote(&mut self, name: &str) {
        self.names.retain(|n| n != name);
        self.names.insert(0, name.to_string());
        self.names.truncate(self.capacity);
    }

    /// Drop unknown, custom, and duplicate names, then backfill from built-ins
    pub fn heal(&mut self, catalog: &Catalog) {
        let mut seen = HashSet::new();
        self.names.retain(|name| {
            let known = catalog.builtin().iter().any(|item| item.storage_key() == name);
            known && seen.insert(name.clone())
        });
        self.names.truncate(self.capacity);

        for item in catalog.builtin() {
            if self.names.len() >= self.capacity {
                break;
            }
            if !self.names.iter().any(|n| n == item.storage_key()) {
                self.names.push(item.storage_key().to_string());
            }
        }
    }

    /// Featured items in rank order followed by every custom item
    pub fn displayed<'a>(&self, catalog: &'a Catalog) -> Vec<&'a SugarItem> {
        self.names
            .iter()
            .filter_map(|name| catalog.get(name))
            .chain(catalog.custom().iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::with_builtins(Vec::new())
    }

    #[test]
    fn test_builtin_catalog_validates() {
        let errors = catalog().validate();
        assert!(errors.is_empty(), "Built-in catalog has errors: {:?}", errors);
    }

    #[test]
    fn test_builtin_catalog_exceeds_featured_capacity() {
        assert!(builtin_items().len() > FEATURED_CAPACITY);
        assert_eq!(builtin_items()[0].name, "Donut");
        assert!(builtin_items().iter().all(|item| !item.is_custom));
    }

    #[test]
    fn test_add_custom_rejects_invalid_input() {
        let mut c = catalog();
        let size = c.len();

        assert_eq!(
            c.try_add_custom("   ", 10, SugarItemCategory::Drink).unwrap_err(),
            CustomItemRejection::EmptyName
        );
        assert_eq!(
            c.try_add_custom("Boba", 0, SugarItemCategory::Drink).unwrap_err(),
            CustomItemRejection::NonPositiveGrams
        );
        assert_eq!(
            c.try_add_custom("donut", 10, SugarItemCategory::Bakery).unwrap_err(),
            CustomItemRejection::DuplicateName
        );
        assert_eq!(c.len(), size);
    }

    #[test]
    fn test_add_custom_case_insensitive_duplicate() {
        let mut c = catalog();
        let added = c.try_add_custom(" Boba ", 38, SugarItemCategory::Drink).unwrap();
        assert_eq!(added.name, "Boba");
        assert!(added.is_custom);

        let size = c.len();
        assert_eq!(
            c.try_add_custom("boba", 10, SugarItemCategory::Drink).unwrap_err(),
            CustomItemRejection::DuplicateName
        );
        assert_eq!(c.len(), size);
    }

    #[test]
    fn test_remove_custom_only() {
        let mut c = catalog();
        c.try_add_custom("Boba", 38, SugarItemCategory::Drink).unwrap();

        assert!(c.remove_custom("Donut").is_none());
        assert_eq!(c.remove_custom("BOBA").unwrap().name, "Boba");
        assert!(c.custom().is_empty());
    }

    #[test]
    fn test_stored_duplicates_are_dropped_on_load() {
        let c = Catalog::with_builtins(vec![
            SugarItem::custom("Boba", 38, SugarItemCategory::Drink),
            SugarItem::custom("BOBA", 10, SugarItemCategory::Drink),
            SugarItem::custom("Cookie", 5, SugarItemCategory::Bakery),
        ]);
        assert_eq!(c.custom().len(), 1);
        assert!(c.validate().is_empty());
    }

    #[test]
    fn test_featured_backfills_in_default_order() {
        let c = catalog();
        let featured = FeaturedItems::restore(Vec::new(), FEATURED_CAPACITY, &c);
        let expected: Vec<String> = builtin_items()[..FEATURED_CAPACITY]
            .iter()
            .map(|item| item.name.clone())
            .collect();
        assert_eq!(featured.names(), expected.as_slice());
    }

    #[test]
    fn test_featured_heal_drops_unknown_names() {
        let c = catalog();
        let featured = FeaturedItems::restore(
            vec!["Milkshake".into(), "Ghost Item".into(), "Milkshake".into()],
            FEATURED_CAPACITY,
            &c,
        );
        assert_eq!(featured.names().len(), FEATURED_CAPACITY);
        assert_eq!(featured.names()[0], "Milkshake");
        assert_eq!(featured.names()[1], "Donut");
        assert!(!featured.names().iter().any(|n| n == "Ghost Item"));
        assert_eq!(
            featured.names().iter().filter(|n| *n == "Milkshake").count(),
            1
        );
    }

    #[test]
    fn test_promote_moves_to_front_and_drops_oldest() {
        let c = catalog();
        let mut featured = FeaturedItems::restore(Vec::new(), FEATURED_CAPACITY, &c);
        let oldest = featured.names().last().unwrap().clone();

        featured.promote("Milkshake");

        assert_eq!(featured.names()[0], "Milkshake");
        assert_eq!(featured.names().len(), FEATURED_CAPACITY);
        assert!(!featured.names().contains(&oldest));

        // Promoting an existing entry only reorders
        featured.promote("Cookie");
        assert_eq!(featured.names()[0], "Cookie");
        assert_eq!(featured.names()[1], "Milkshake");
        assert_eq!(featured.names().len(), FEATURED_CAPACITY);
    }

    #[test]
    fn test_displayed_appends_custom_items() {
        let mut c = catalog();
        c.try_add_custom("Boba", 38, SugarItemCategory::Drink).unwrap();
        let featured = FeaturedItems::restore(vec!["Boba".into()], FEATURED_CAPACITY, &c);

        // Custom names never occupy featured slots
        assert!(!featured.names().iter().any(|n| n == "Boba"));

        let displayed = featured.displayed(&c);
        assert_eq!(displayed.len(), FEATURED_CAPACITY + 1);
        assert_eq!(displayed.last().unwrap().name, "Boba");
    }
}
