//! Fixed-point arithmetic helpers.
//!
//! All factors and ratios are u128 integers to avoid floating-point errors.
//! Scale factors (capacity reduction, payout ratios) use `UNIT` = 1e18;
//! configured ratios use basis points (`BPS_DENOM` = 10_000).

/// One fixed-point unit (1e18). A factor of `UNIT` means 1.0.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOM: u128 = 10_000;

/// Compute `a * b / den` with overflow detection, returning `None` on
/// overflow or division by zero.
///
/// The multiply is checked rather than widened: engine amounts are asset
/// raw units and factors are at most `UNIT`, so a genuine overflow means a
/// misconfigured deployment, not a value to silently clamp.
pub fn mul_div_checked(a: u128, b: u128, den: u128) -> Option<u128> {
    if den == 0 {
        return None;
    }
    // Split the multiply to keep the common (a * b fits) path branch-free.
    a.checked_mul(b).map(|p| p / den).or_else(|| {
        // Fall back to (a / den) * b + (a % den) * b / den, exact when
        // the intermediate products fit.
        let q = a / den;
        let r = a % den;
        let high = q.checked_mul(b)?;
        let low = r.checked_mul(b)? / den;
        high.checked_add(low)
    })
}

/// Compute `a * b / den`, saturating to 0 on overflow (query-path variant).
pub fn mul_div(a: u128, b: u128, den: u128) -> u128 {
    mul_div_checked(a, b, den).unwrap_or(0)
}

/// Take `bps` basis points of `amount`.
pub fn bps_of(amount: u128, bps: u32) -> u128 {
    mul_div(amount, bps as u128, BPS_DENOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_exact() {
        assert_eq!(mul_div(300, UNIT, 500), 3 * UNIT / 5);
        assert_eq!(mul_div(1000, 60, 100), 600);
    }

    #[test]
    fn mul_div_zero_denominator_is_none() {
        assert_eq!(mul_div_checked(1, 1, 0), None);
        assert_eq!(mul_div(1, 1, 0), 0);
    }

    #[test]
    fn mul_div_survives_large_operands() {
        // a * b overflows u128, but the quotient fits.
        let a = u128::MAX / 2;
        assert_eq!(mul_div_checked(a, 4, 4), Some(a));
    }

    #[test]
    fn bps_of_full_and_half() {
        assert_eq!(bps_of(1000, 10_000), 1000);
        assert_eq!(bps_of(1000, 5_000), 500);
        assert_eq!(bps_of(1000, 0), 0);
    }
}
