//! Small text helpers for display values.

/// Upper-case the first character and lower-case the rest.
///
/// ```
/// use pachamama_core::text::capitalize_first_letter;
///
/// assert_eq!(capitalize_first_letter("tÉ VERDE"), "Té verde");
/// assert_eq!(capitalize_first_letter(""), "");
/// ```
#[must_use]
pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}
