use irs_types::{SECONDS_PER_YEAR_WAD, WAD};
use soroban_sdk::Env;

use crate::wad::{div_wad, smul_wad, to_signed};

/// Current ledger time in wad-scaled seconds
pub fn scaled_timestamp(env: &Env) -> u128 {
    (env.ledger().timestamp() as u128) * WAD
}

/// Fixed-leg accrual factor for a term, as a wad year fraction.
///
/// With `at_maturity` the factor covers the whole term and no longer depends
/// on `now`; otherwise it accrues with `now`, capped at the full-term value.
/// All timestamps are wad-scaled seconds.
pub fn fixed_factor(env: &Env, at_maturity: bool, term_start: u128, term_end: u128, now: u128) -> u128 {
    if term_start >= term_end {
        panic!("Invalid time range");
    }

    let effective_end = if at_maturity { term_end } else { now.min(term_end) };
    let elapsed = effective_end.saturating_sub(term_start);

    div_wad(env, elapsed, SECONDS_PER_YEAR_WAD)
}

/// Settlement cashflow owed to (positive) or by (negative) an account at
/// maturity: the fixed leg accrued at the full-term fixed factor plus the
/// variable leg at the realised variable factor. Pure and side-effect free;
/// intermediate products truncate toward zero.
pub fn settlement_cashflow(
    env: &Env,
    fixed_balance: i128,
    variable_balance: i128,
    term_start: u128,
    term_end: u128,
    variable_factor: u128,
) -> i128 {
    let factor = fixed_factor(env, true, term_start, term_end, term_end);
    let fixed_cashflow = smul_wad(env, fixed_balance, to_signed(factor));
    let variable_cashflow = smul_wad(env, variable_balance, to_signed(variable_factor));
    fixed_cashflow + variable_cashflow
}
