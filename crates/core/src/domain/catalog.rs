//! Fixed purchase-category catalog.

/// Categories an order may be filed under when written through the record store.
pub const CATEGORY_CATALOG: &[&str] = &[
    "Electronics",
    "Fashion",
    "Home",
    "Books",
    "Sports",
    "Travel",
    "Food",
    "Beauty",
    "Toys",
    "Entertainment",
];

pub fn is_catalog_category(category: &str) -> bool {
    CATEGORY_CATALOG.iter().any(|known| *known == category)
}

#[cfg(test)]
mod tests {
    use super::is_catalog_category;

    #[test]
    fn catalog_lookup_is_case_sensitive() {
        assert!(is_catalog_category("Electronics"));
        assert!(!is_catalog_category("electronics"));
        assert!(!is_catalog_category("Groceries"));
    }
}
