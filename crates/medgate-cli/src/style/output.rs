//! Output helper functions for consistent styled messages.

use super::colors::SemanticStyle;

/// Prints a success message with a checkmark.
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".allow(), msg);
}

/// Prints an error message with an X mark to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".deny(), msg);
}

/// Prints a labeled key-value pair with indentation.
pub fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}

/// Prints the policy text with a caret under byte `offset` to stderr.
pub fn print_location(policy: &str, offset: usize) {
    let column = policy
        .get(..offset.min(policy.len()))
        .map_or(offset, |prefix| prefix.chars().count());
    eprintln!("  {}", policy.code());
    eprintln!("  {}{}", " ".repeat(column), "^".deny());
}
