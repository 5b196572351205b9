/// Core runtime value type.
///
/// Defines `Value`, the integer-or-NaN values procedures compute with, plus the
/// booleans conditions evaluate to.
pub mod core;
