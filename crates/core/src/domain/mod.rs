pub mod catalog;
pub mod order;
pub mod preference;

/// Canonical form of a customer email: surrounding whitespace removed, ASCII lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
