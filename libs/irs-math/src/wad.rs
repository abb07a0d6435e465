use irs_types::WAD;
use soroban_sdk::{Env, I256, U256};

/// Multiply two wad values (rounds down)
pub fn mul_wad(env: &Env, a: u128, b: u128) -> u128 {
    mul_div(env, a, b, WAD)
}

/// Divide two wad values (rounds down)
pub fn div_wad(env: &Env, a: u128, b: u128) -> u128 {
    mul_div(env, a, WAD, b)
}

/// Divide two wad values (rounds up)
pub fn div_wad_rounding_up(env: &Env, a: u128, b: u128) -> u128 {
    mul_div_rounding_up(env, a, WAD, b)
}

/// Multiply and divide with 256-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        panic!("Division by zero");
    }

    let a_256 = U256::from_u128(env, a);
    let b_256 = U256::from_u128(env, b);
    let denom_256 = U256::from_u128(env, denominator);

    let product = a_256.mul(&b_256);
    let result = product.div(&denom_256);

    u128_from_u256(env, &result)
}

/// Multiply and divide with 256-bit intermediate precision (rounds up)
/// Returns ceil((a * b) / denominator)
pub fn mul_div_rounding_up(env: &Env, a: u128, b: u128, denominator: u128) -> u128 {
    let result = mul_div(env, a, b, denominator);

    let a_256 = U256::from_u128(env, a);
    let b_256 = U256::from_u128(env, b);
    let denom_256 = U256::from_u128(env, denominator);

    let product = a_256.mul(&b_256);
    let remainder = product.rem_euclid(&denom_256);

    if remainder.gt(&U256::from_u32(env, 0)) {
        result + 1
    } else {
        result
    }
}

/// Multiply two signed wad values, truncating toward zero
pub fn smul_wad(env: &Env, a: i128, b: i128) -> i128 {
    smul_div(env, a, b, WAD as i128)
}

/// Divide two signed wad values, truncating toward zero
pub fn sdiv_wad(env: &Env, a: i128, b: i128) -> i128 {
    smul_div(env, a, WAD as i128, b)
}

/// Signed multiply-and-divide with 256-bit intermediate precision.
/// Host signed division truncates toward zero, which keeps settlement
/// cashflows reproducible across implementations.
pub fn smul_div(env: &Env, a: i128, b: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        panic!("Division by zero");
    }

    let a_256 = I256::from_i128(env, a);
    let b_256 = I256::from_i128(env, b);
    let denom_256 = I256::from_i128(env, denominator);

    let product = a_256.mul(&b_256);
    let result = product.div(&denom_256);

    i128_from_i256(&result)
}

/// Square root of a wad value, returning a wad value (rounds down)
pub fn sqrt_wad(x: u128) -> u128 {
    if x == 0 {
        return 0;
    }
    // sqrt(x * WAD) keeps the result wad-scaled
    let scaled = x.checked_mul(WAD).unwrap_or_else(|| panic!("Overflow in sqrt"));
    isqrt(scaled)
}

/// Convert a non-negative amount to i128, panics if overflow
pub fn to_signed(value: u128) -> i128 {
    if value > i128::MAX as u128 {
        panic!("Overflow when converting to i128");
    }
    value as i128
}

/// Integer square root via Newton iteration (rounds down)
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Start above the root: 2^ceil(bits/2)
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Convert U256 to u128, panics if overflow
fn u128_from_u256(env: &Env, value: &U256) -> u128 {
    let max_u128 = U256::from_u128(env, u128::MAX);
    if value.gt(&max_u128) {
        panic!("U256 overflow when converting to u128");
    }
    value.to_u128().unwrap()
}

/// Convert I256 to i128, panics if overflow
fn i128_from_i256(value: &I256) -> i128 {
    match value.to_i128() {
        Some(v) => v,
        None => panic!("I256 overflow when converting to i128"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::Env;

    // === unsigned wad tests ===

    #[test]
    fn test_mul_wad_identity() {
        let env = Env::default();
        assert_eq!(mul_wad(&env, WAD, WAD), WAD);
        assert_eq!(mul_wad(&env, 5 * WAD, WAD), 5 * WAD);
    }

    #[test]
    fn test_mul_wad_fraction() {
        let env = Env::default();
        // 1.5 * 2 = 3
        assert_eq!(mul_wad(&env, 3 * WAD / 2, 2 * WAD), 3 * WAD);
        // 0.1 * 0.1 = 0.01
        assert_eq!(mul_wad(&env, WAD / 10, WAD / 10), WAD / 100);
    }

    #[test]
    fn test_mul_wad_rounds_down() {
        let env = Env::default();
        // smallest representable values truncate to zero
        assert_eq!(mul_wad(&env, 1, 1), 0);
        assert_eq!(mul_wad(&env, WAD - 1, 1), 0);
        assert_eq!(mul_wad(&env, WAD + 1, 1), 1);
    }

    #[test]
    fn test_mul_wad_no_phantom_overflow() {
        let env = Env::default();
        // a * b overflows u128 but the result fits
        let big = 1u128 << 100;
        assert_eq!(mul_wad(&env, big, WAD), big);
    }

    #[test]
    fn test_div_wad_basic() {
        let env = Env::default();
        assert_eq!(div_wad(&env, 6 * WAD, 2 * WAD), 3 * WAD);
        assert_eq!(div_wad(&env, WAD, 3 * WAD), 333_333_333_333_333_333);
    }

    #[test]
    fn test_div_wad_rounding_up() {
        let env = Env::default();
        assert_eq!(div_wad_rounding_up(&env, WAD, 3 * WAD), 333_333_333_333_333_334);
        assert_eq!(div_wad_rounding_up(&env, 6 * WAD, 2 * WAD), 3 * WAD);
    }

    #[test]
    #[should_panic(expected = "Division by zero")]
    fn test_div_wad_zero_denominator() {
        let env = Env::default();
        div_wad(&env, WAD, 0);
    }

    // === signed wad tests ===

    #[test]
    fn test_smul_wad_signs() {
        let env = Env::default();
        let w = WAD as i128;
        assert_eq!(smul_wad(&env, 2 * w, 3 * w), 6 * w);
        assert_eq!(smul_wad(&env, -2 * w, 3 * w), -6 * w);
        assert_eq!(smul_wad(&env, -2 * w, -3 * w), 6 * w);
    }

    #[test]
    fn test_smul_wad_truncates_toward_zero() {
        let env = Env::default();
        // -1.5 wad-units truncates to -1, not -2
        assert_eq!(smul_wad(&env, -3, (WAD / 2) as i128), -1);
        assert_eq!(smul_wad(&env, 3, (WAD / 2) as i128), 1);
    }

    #[test]
    fn test_sdiv_wad_truncates_toward_zero() {
        let env = Env::default();
        let w = WAD as i128;
        assert_eq!(sdiv_wad(&env, -7 * w, 2 * w), -3 * w - w / 2);
        assert_eq!(sdiv_wad(&env, -1, 3 * w), 0);
        assert_eq!(sdiv_wad(&env, 1, 3 * w), 0);
    }

    #[test]
    #[should_panic(expected = "Division by zero")]
    fn test_smul_div_zero_denominator() {
        let env = Env::default();
        smul_div(&env, 1, 1, 0);
    }

    #[test]
    #[should_panic(expected = "I256 overflow when converting to i128")]
    fn test_smul_div_overflow() {
        let env = Env::default();
        smul_div(&env, i128::MAX, i128::MAX, 1);
    }

    // === sqrt tests ===

    #[test]
    fn test_sqrt_wad_exact() {
        assert_eq!(sqrt_wad(0), 0);
        assert_eq!(sqrt_wad(WAD), WAD);
        assert_eq!(sqrt_wad(4 * WAD), 2 * WAD);
        assert_eq!(sqrt_wad(9 * WAD / 4), 3 * WAD / 2);
    }

    #[test]
    fn test_sqrt_wad_irrational() {
        // sqrt(2) = 1.414213562373095048...
        assert_eq!(sqrt_wad(2 * WAD), 1_414_213_562_373_095_048);
        // sqrt(0.01) = 0.1
        assert_eq!(sqrt_wad(WAD / 100), WAD / 10);
    }

    // === conversion tests ===

    #[test]
    fn test_to_signed() {
        assert_eq!(to_signed(0), 0);
        assert_eq!(to_signed(WAD), WAD as i128);
        assert_eq!(to_signed(i128::MAX as u128), i128::MAX);
    }

    #[test]
    #[should_panic(expected = "Overflow when converting to i128")]
    fn test_to_signed_overflow() {
        to_signed(u128::MAX);
    }
}
