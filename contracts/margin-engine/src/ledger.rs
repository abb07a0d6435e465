use irs_math::{mul_wad, smul_wad, to_signed};
use irs_types::{GrowthInside, Position, Trader};
use soroban_sdk::Env;

/// Apply a signed liquidity delta to an unsigned liquidity amount
pub fn add_liquidity_delta(liquidity: u128, delta: i128) -> u128 {
    if delta < 0 {
        let abs = delta.unsigned_abs();
        if abs > liquidity {
            panic!("Liquidity underflow");
        }
        liquidity - abs
    } else {
        liquidity
            .checked_add(delta as u128)
            .unwrap_or_else(|| panic!("Liquidity overflow"))
    }
}

/// Apply one position update against a fresh growth snapshot.
///
/// Accrued fee and token deltas are computed from the change in the growth
/// accumulators since the last snapshot, weighted by the PRE-update liquidity;
/// the liquidity delta only takes effect afterwards. Margin is recomputed as a
/// whole: prior margin plus fee accrual plus the caller-supplied delta. The
/// fixed and variable balances commit as a pair.
pub fn update_position(
    env: &Env,
    position: &mut Position,
    liquidity_delta: i128,
    growth: &GrowthInside,
    margin_delta: i128,
) {
    if liquidity_delta == 0 && position.liquidity == 0 {
        panic!("No liquidity to poke");
    }

    let new_liquidity = add_liquidity_delta(position.liquidity, liquidity_delta);

    let liquidity_signed = to_signed(position.liquidity);
    let fee_delta = mul_wad(
        env,
        growth.fee - position.fee_growth_inside_last,
        position.liquidity,
    );
    let fixed_delta = smul_wad(
        env,
        growth.fixed_token - position.fixed_token_growth_inside_last,
        liquidity_signed,
    );
    let variable_delta = smul_wad(
        env,
        growth.variable_token - position.var_token_growth_inside_last,
        liquidity_signed,
    );

    position.liquidity = new_liquidity;
    position.fee_growth_inside_last = growth.fee;
    position.fixed_token_growth_inside_last = growth.fixed_token;
    position.var_token_growth_inside_last = growth.variable_token;

    position.margin = position.margin + to_signed(fee_delta) + margin_delta;

    if fixed_delta != 0 || variable_delta != 0 {
        position.fixed_token_balance += fixed_delta;
        position.variable_token_balance += variable_delta;
    }
}

/// Trader-path balance update: plain delta accumulation, no liquidity
/// weighting and no accumulator snapshots
pub fn update_balances_via_deltas(trader: &mut Trader, fixed_delta: i128, variable_delta: i128) {
    trader.fixed_token_balance += fixed_delta;
    trader.variable_token_balance += variable_delta;
}
