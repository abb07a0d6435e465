use irs_math::{div_wad, fixed_factor, mul_wad, smul_wad, sqrt_wad, to_signed};
use irs_types::{MarginParams, SECONDS_PER_YEAR_WAD, WAD};
use soroban_sdk::Env;

/// Margin requirement for a net fixed/variable exposure, in underlying wad.
///
/// The requirement is the projected shortfall if rates move to the worse edge
/// of an APY band around the historical estimate and the exposure has to be
/// flattened at a deviated fixed rate, floored at the liquidator-incentive
/// minimum. `is_lm` selects the liquidation (tighter) parameter set; with
/// `_lm` params no larger than `_im` params the result is monotone:
/// LM <= IM for the same exposure.
pub fn margin_requirement(
    env: &Env,
    params: &MarginParams,
    fixed_balance: i128,
    variable_balance: i128,
    historical_apy: u128,
    term_start: u128,
    term_end: u128,
    now: u128,
    is_lm: bool,
) -> u128 {
    if fixed_balance == 0 && variable_balance == 0 {
        return 0;
    }

    let time_to_maturity = term_end.saturating_sub(now);
    let remaining_years = div_wad(env, time_to_maturity, SECONDS_PER_YEAR_WAD);
    let capped_years = div_wad(env, time_to_maturity.min(params.t_max), SECONDS_PER_YEAR_WAD);

    let width = apy_band_width(env, params, is_lm, capped_years);
    let apy_upper = mul_wad(env, historical_apy, params.apy_upper_multiplier)
        + mul_wad(env, params.xi_upper, width);
    let apy_lower = mul_wad(env, historical_apy, params.apy_lower_multiplier)
        .saturating_sub(mul_wad(env, params.xi_lower, width));

    // projected cashflow at each band edge; the worse one drives the requirement
    let fixed_cashflow = smul_wad(
        env,
        fixed_balance,
        to_signed(fixed_factor(env, true, term_start, term_end, now)),
    );
    let variable_at_upper = smul_wad(
        env,
        variable_balance,
        to_signed(mul_wad(env, apy_upper, remaining_years)),
    );
    let variable_at_lower = smul_wad(
        env,
        variable_balance,
        to_signed(mul_wad(env, apy_lower, remaining_years)),
    );
    let worst_cashflow = (fixed_cashflow + variable_at_upper).min(fixed_cashflow + variable_at_lower);

    let unwind = unwind_cost(env, params, variable_balance, capped_years, remaining_years, is_lm);

    let shortfall = to_signed(unwind) - worst_cashflow;
    let requirement = if shortfall > 0 { shortfall as u128 } else { 0 };

    requirement.max(params.min_margin_for_liquidators)
}

/// A record is liquidatable when its margin sits below the liquidation
/// requirement
pub fn is_liquidatable(margin: i128, liquidation_margin: u128) -> bool {
    margin < to_signed(liquidation_margin)
}

/// Half-width of the APY confidence band: a volatility term over the capped
/// horizon, floored at the configured minimum for the requested kind
fn apy_band_width(env: &Env, params: &MarginParams, is_lm: bool, capped_years: u128) -> u128 {
    let vol = sqrt_wad(mul_wad(env, params.sigma_squared, capped_years));
    let width = params.alpha + mul_wad(env, params.beta, vol);
    let floor = if is_lm {
        params.min_delta_lm
    } else {
        params.min_delta_im
    };
    width.max(floor)
}

/// Cost of flattening the variable exposure at a deviated fixed rate. The
/// deviation decays toward maturity as 1 / (1 + gamma * t_years) and is
/// floored at the configured minimum for the exposure's side.
fn unwind_cost(
    env: &Env,
    params: &MarginParams,
    variable_balance: i128,
    capped_years: u128,
    remaining_years: u128,
    is_lm: bool,
) -> u128 {
    if variable_balance == 0 {
        return 0;
    }

    let (dev_mul, dev_min) = match (is_lm, variable_balance < 0) {
        (true, true) => (
            params.dev_mul_left_unwind_lm,
            params.dev_min_left_unwind_lm,
        ),
        (true, false) => (
            params.dev_mul_right_unwind_lm,
            params.dev_min_right_unwind_lm,
        ),
        (false, true) => (
            params.dev_mul_left_unwind_im,
            params.dev_min_left_unwind_im,
        ),
        (false, false) => (
            params.dev_mul_right_unwind_im,
            params.dev_min_right_unwind_im,
        ),
    };

    let decay = div_wad(env, WAD, WAD + mul_wad(env, params.gamma, capped_years));
    let deviation = mul_wad(env, dev_mul, decay).max(dev_min);
    let notional = variable_balance.unsigned_abs();

    mul_wad(env, mul_wad(env, notional, deviation), remaining_years)
}
