//! Comparison keys for campus labels.
//!
//! Tracking sheets label campuses loosely: a trailing teacher annotation
//! (`"Bernal 1 - Tracey Sorrell"`), campus numbers with or without a `#`, and
//! mixed case. [`normalize`] reduces a label to a key that compares equal
//! across those variations. The key is never written back to a sheet.

/// Separator introducing a trailing annotation that is not part of the name.
pub const ANNOTATION_SEPARATOR: &str = " - ";

/// Maps a raw campus label to its canonical comparison key.
///
/// ```
/// use campus_rollup::normalize::normalize;
///
/// assert_eq!(normalize("Bernal 1 - Tracey Sorrell"), "bernal #1");
/// assert_eq!(normalize("Clark ( 3 Periods ) - Karen Pumphrey"), "clark ( 3 periods )");
/// ```
pub fn normalize(raw: &str) -> String {
    let name = match raw.find(ANNOTATION_SEPARATOR) {
        Some(index) => &raw[..index],
        None => raw,
    };
    mark_campus_numbers(name.trim()).to_lowercase()
}

/// Prefixes every standalone digit token that follows a space with `#`.
///
/// Parenthesized qualifiers such as `( 3 Periods )` are copied verbatim.
fn mark_campus_numbers(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut marked = String::with_capacity(name.len() + 4);
    let mut depth = 0usize;

    for (index, &ch) in chars.iter().enumerate() {
        marked.push(ch);
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 && starts_digit_token(&chars[index + 1..]) => marked.push('#'),
            _ => {}
        }
    }

    marked
}

fn starts_digit_token(rest: &[char]) -> bool {
    let digits = rest.iter().take_while(|ch| ch.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    match rest.get(digits) {
        None => true,
        Some(&next) => next.is_whitespace() || next == ')',
    }
}
