/// Numeric helpers.
///
/// Checked integer arithmetic with floor semantics for division and modulo,
/// and safe conversions between integer widths. Every function returns an
/// `Option` that is `None` whenever the mathematically exact result cannot be
/// represented, which callers turn into the NaN sentinel.
pub mod num;
/// Numeral-base conversion.
///
/// Renders integers as digit strings in an arbitrary base using a configurable
/// digit alphabet.
pub mod base;
