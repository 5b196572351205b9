/// Default digit alphabet, sufficient for bases up to 36.
pub const DEFAULT_DIGITS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Converts an integer to its digit string in `base`.
///
/// Negative numbers are rendered with a leading `-`. The digit for value `d`
/// is the `d`-th character of `digits`.
///
/// ## Parameters
/// - `value`: The integer to convert.
/// - `base`: The target base, at least 2.
/// - `digits`: The digit alphabet; must contain at least `base` characters.
///
/// ## Returns
/// - `Some(String)`: The converted digits.
/// - `None`: If `base < 2` or the alphabet is too short.
///
/// ## Example
/// ```
/// use opulse::util::base::{DEFAULT_DIGITS, convert};
///
/// assert_eq!(convert(10, 2, DEFAULT_DIGITS).as_deref(), Some("1010"));
/// assert_eq!(convert(-255, 16, DEFAULT_DIGITS).as_deref(), Some("-FF"));
/// assert_eq!(convert(0, 7, DEFAULT_DIGITS).as_deref(), Some("0"));
/// ```
#[must_use]
pub fn convert(value: i64, base: u32, digits: &str) -> Option<String> {
    let alphabet: Vec<char> = digits.chars().collect();
    let radix = usize::try_from(base).ok()?;
    if radix < 2 || alphabet.len() < radix {
        return None;
    }

    let mut magnitude = value.unsigned_abs();
    if magnitude == 0 {
        return alphabet.first().map(ToString::to_string);
    }

    let wide_base = u64::from(base);
    let mut out = Vec::new();
    while magnitude > 0 {
        let digit = usize::try_from(magnitude % wide_base).ok()?;
        out.push(alphabet[digit]);
        magnitude /= wide_base;
    }
    if value < 0 {
        out.push('-');
    }

    Some(out.into_iter().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_extreme_values() {
        assert_eq!(convert(i64::MIN, 2, DEFAULT_DIGITS).map(|s| s.len()), Some(65));
        assert_eq!(convert(35, 36, DEFAULT_DIGITS).as_deref(), Some("Z"));
    }

    #[test]
    fn rejects_unusable_bases() {
        assert_eq!(convert(5, 1, DEFAULT_DIGITS), None);
        assert_eq!(convert(5, 11, "0123456789"), None);
    }
}
