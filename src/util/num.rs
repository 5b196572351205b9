/// Floor division: the quotient rounded toward negative infinity.
///
/// ## Parameters
/// - `a`: The dividend.
/// - `b`: The divisor.
///
/// ## Returns
/// - `Some(q)`: The floored quotient.
/// - `None`: If `b` is zero or the quotient overflows (`i64::MIN / -1`).
///
/// ## Example
/// ```
/// use opulse::util::num::floor_div;
///
/// assert_eq!(floor_div(7, 2), Some(3));
/// assert_eq!(floor_div(-7, 2), Some(-4));
/// assert_eq!(floor_div(7, 0), None);
/// ```
#[must_use]
pub const fn floor_div(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let Some(q) = a.checked_div(b) else {
        return None;
    };
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Floor modulo: the remainder takes the sign of the divisor.
///
/// Together with [`floor_div`] it satisfies `a == floor_div(a, b) * b +
/// floor_mod(a, b)`.
///
/// ## Returns
/// - `Some(r)`: The remainder.
/// - `None`: If `b` is zero.
///
/// ## Example
/// ```
/// use opulse::util::num::floor_mod;
///
/// assert_eq!(floor_mod(7, 3), Some(1));
/// assert_eq!(floor_mod(-7, 3), Some(2));
/// assert_eq!(floor_mod(7, -3), Some(-2));
/// ```
#[must_use]
pub const fn floor_mod(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    if b == -1 {
        return Some(0);
    }
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

/// Checked absolute value.
///
/// ## Returns
/// `None` for `i64::MIN`, whose magnitude does not fit in an `i64`.
#[must_use]
pub const fn abs_checked(value: i64) -> Option<i64> {
    value.checked_abs()
}

/// Safely converts a `usize` to `i64`.
///
/// ## Returns
/// `None` if the value is larger than `i64::MAX`.
///
/// ## Example
/// ```
/// use opulse::util::num::usize_to_i64_checked;
///
/// assert_eq!(usize_to_i64_checked(42), Some(42));
/// ```
#[must_use]
pub fn usize_to_i64_checked(value: usize) -> Option<i64> {
    i64::try_from(value).ok()
}

/// Converts a `usize` to `f64` for ratio computations.
///
/// Counts of tree nodes are far below the 2^53 limit where `f64` loses
/// integer precision, so the cast is exact in practice.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub const fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Converts an `i64` to `f64` for ratio computations.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub const fn i64_to_f64(value: i64) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_matches_quotient_and_remainder() {
        for a in -20..=20 {
            for b in [-7, -3, -1, 1, 2, 5] {
                let q = floor_div(a, b).unwrap();
                let r = floor_mod(a, b).unwrap();
                assert_eq!(q * b + r, a, "a = {a}, b = {b}");
                assert!(r == 0 || (r < 0) == (b < 0));
            }
        }
    }

    #[test]
    fn overflowing_division_is_none() {
        assert_eq!(floor_div(i64::MIN, -1), None);
        assert_eq!(floor_mod(i64::MIN, -1), Some(0));
        assert_eq!(abs_checked(i64::MIN), None);
    }
}
