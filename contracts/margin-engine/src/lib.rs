#![no_std]

mod ledger;
mod margin;
mod storage;

use irs_math::{div_wad, mul_wad, scaled_timestamp, settlement_cashflow, to_signed};
use irs_types::{
    EngineConfig, GrowthInside, Position, PositionKey, Trader, TraderStatus, VammSwapParams,
    VammSwapResult, SECONDS_PER_YEAR_WAD,
};
use soroban_sdk::{contract, contractimpl, token, Address, Env, IntoVal, Symbol};
use storage::{get_config, get_position, get_trader, set_config, set_position, set_trader, DataKey};

#[contract]
pub struct MarginEngine;

#[contractimpl]
impl MarginEngine {
    /// Initialize the engine for one interest-rate-swap term
    pub fn initialize(env: Env, config: EngineConfig) {
        if env.storage().instance().has(&DataKey::Config) {
            panic!("Already initialized");
        }
        if config.term_start_wad >= config.term_end_wad {
            panic!("Invalid time range");
        }
        set_config(&env, &config);
    }

    /// Deposit to or withdraw from a position's margin account. Anyone may
    /// deposit on behalf of the owner; only the owner can withdraw. Balances
    /// are brought up to date against the VAMM's accumulators first, and the
    /// resulting state must satisfy the initial margin requirement.
    pub fn update_position_margin(
        env: Env,
        caller: Address,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        margin_delta: i128,
    ) {
        caller.require_auth();
        if margin_delta == 0 {
            panic!("Zero margin delta");
        }
        if caller != owner && margin_delta < 0 {
            panic!("Only owner can withdraw margin");
        }

        let config = get_config(&env);
        let key = PositionKey {
            owner: owner.clone(),
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);

        if position.liquidity > 0 {
            let growth = query_growth_inside(&env, &config.vamm, tick_lower, tick_upper);
            ledger::update_position(&env, &mut position, 0, &growth, margin_delta);
        } else {
            position.margin += margin_delta;
        }

        check_position_initial_margin(&env, &config, &position);
        set_position(&env, &key, &position);

        transfer_margin_delta(&env, &config, &caller, &owner, margin_delta);

        env.events().publish(
            (Symbol::new(&env, "position_margin_update"),),
            (owner, tick_lower, tick_upper, margin_delta),
        );
    }

    /// Deposit to or withdraw from a trader's margin account
    pub fn update_trader_margin(env: Env, caller: Address, trader: Address, margin_delta: i128) {
        caller.require_auth();
        if margin_delta == 0 {
            panic!("Zero margin delta");
        }
        if caller != trader && margin_delta < 0 {
            panic!("Only owner can withdraw margin");
        }

        let config = get_config(&env);
        let mut record = get_trader(&env, &trader);
        record.margin += margin_delta;

        check_trader_initial_margin(&env, &config, &record);
        set_trader(&env, &trader, &record);

        transfer_margin_delta(&env, &config, &caller, &trader, margin_delta);

        env.events().publish(
            (Symbol::new(&env, "trader_margin_update"),),
            (trader, margin_delta),
        );
    }

    /// Settle a matured position: realise the settlement cashflow into margin
    /// and zero the exposure. Repeat calls are no-ops.
    pub fn settle_position(env: Env, owner: Address, tick_lower: i32, tick_upper: i32) {
        let config = get_config(&env);
        require_matured(&env, &config);

        let key = PositionKey {
            owner: owner.clone(),
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);

        if position.liquidity > 0 {
            let growth = query_growth_inside(&env, &config.vamm, tick_lower, tick_upper);
            ledger::update_position(&env, &mut position, 0, &growth, 0);
        }

        let variable_factor = query_variable_factor(
            &env,
            &config.rate_oracle,
            config.term_start_wad,
            config.term_end_wad,
        );
        let cashflow = settlement_cashflow(
            &env,
            position.fixed_token_balance,
            position.variable_token_balance,
            config.term_start_wad,
            config.term_end_wad,
            variable_factor,
        );

        position.margin += cashflow;
        position.fixed_token_balance = 0;
        position.variable_token_balance = 0;
        set_position(&env, &key, &position);

        env.events().publish(
            (Symbol::new(&env, "position_settled"),),
            (owner, tick_lower, tick_upper, cashflow),
        );
    }

    /// Settle a matured trader. Repeat calls are no-ops.
    pub fn settle_trader(env: Env, trader: Address) {
        let config = get_config(&env);
        require_matured(&env, &config);

        let mut record = get_trader(&env, &trader);
        if record.status == TraderStatus::Settled {
            return;
        }

        let variable_factor = query_variable_factor(
            &env,
            &config.rate_oracle,
            config.term_start_wad,
            config.term_end_wad,
        );
        let cashflow = settlement_cashflow(
            &env,
            record.fixed_token_balance,
            record.variable_token_balance,
            config.term_start_wad,
            config.term_end_wad,
            variable_factor,
        );

        record.margin += cashflow;
        record.fixed_token_balance = 0;
        record.variable_token_balance = 0;
        record.status = TraderStatus::Settled;
        set_trader(&env, &trader, &record);

        env.events().publish((Symbol::new(&env, "trader_settled"),), (trader, cashflow));
    }

    /// Liquidate an undercollateralised position: pay the liquidator a share
    /// of the remaining margin and burn all liquidity so no further exposure
    /// accrues
    pub fn liquidate_position(
        env: Env,
        liquidator: Address,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) {
        liquidator.require_auth();
        let config = get_config(&env);

        let key = PositionKey {
            owner: owner.clone(),
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);

        if position.liquidity > 0 {
            let growth = query_growth_inside(&env, &config.vamm, tick_lower, tick_upper);
            ledger::update_position(&env, &mut position, 0, &growth, 0);
        }

        let lm = margin::margin_requirement(
            &env,
            &config.margin_params,
            position.fixed_token_balance,
            position.variable_token_balance,
            historical_apy_estimate(&env, &config),
            config.term_start_wad,
            config.term_end_wad,
            scaled_timestamp(&env),
            true,
        );
        if !margin::is_liquidatable(position.margin, lm) {
            panic!("Position not liquidatable");
        }

        let reward = liquidator_reward(&env, &config, position.margin);
        position.margin -= to_signed(reward);

        if position.liquidity > 0 {
            let liquidity = position.liquidity;
            let growth = invoke_vamm_burn(&env, &config.vamm, &owner, tick_lower, tick_upper, liquidity);
            ledger::update_position(&env, &mut position, -to_signed(liquidity), &growth, 0);
        }
        set_position(&env, &key, &position);

        pay_out(&env, &config, &liquidator, reward);

        env.events().publish(
            (Symbol::new(&env, "position_liquidated"),),
            (owner, tick_lower, tick_upper, liquidator, reward),
        );
    }

    /// Liquidate an undercollateralised trader: pay the liquidator a share of
    /// the remaining margin and force-unwind the variable exposure to zero
    pub fn liquidate_trader(env: Env, liquidator: Address, trader: Address) {
        liquidator.require_auth();
        let config = get_config(&env);

        let mut record = get_trader(&env, &trader);
        if record.status == TraderStatus::Settled {
            panic!("Trader not liquidatable");
        }

        let lm = margin::margin_requirement(
            &env,
            &config.margin_params,
            record.fixed_token_balance,
            record.variable_token_balance,
            historical_apy_estimate(&env, &config),
            config.term_start_wad,
            config.term_end_wad,
            scaled_timestamp(&env),
            true,
        );
        if !margin::is_liquidatable(record.margin, lm) {
            panic!("Trader not liquidatable");
        }

        let reward = liquidator_reward(&env, &config, record.margin);
        record.margin -= to_signed(reward);

        if record.variable_token_balance != 0 {
            let result = execute_unwind_swap(&env, &config, &trader, record.variable_token_balance);
            ledger::update_balances_via_deltas(
                &mut record,
                result.fixed_token_delta,
                result.variable_token_delta,
            );
            record.margin -= to_signed(result.cumulative_fee_incurred);
        }
        set_trader(&env, &trader, &record);

        pay_out(&env, &config, &liquidator, reward);

        env.events().publish(
            (Symbol::new(&env, "trader_liquidated"),),
            (trader, liquidator, reward),
        );
    }

    /// Flatten a position's net variable exposure with an opposing trade.
    /// No-op when there is nothing to unwind.
    pub fn unwind_position(env: Env, owner: Address, tick_lower: i32, tick_upper: i32) {
        owner.require_auth();
        let config = get_config(&env);

        let key = PositionKey {
            owner: owner.clone(),
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);

        if position.liquidity > 0 {
            let growth = query_growth_inside(&env, &config.vamm, tick_lower, tick_upper);
            ledger::update_position(&env, &mut position, 0, &growth, 0);
        }
        if position.variable_token_balance == 0 {
            return;
        }

        let result = execute_unwind_swap(&env, &config, &owner, position.variable_token_balance);
        position.fixed_token_balance += result.fixed_token_delta;
        position.variable_token_balance += result.variable_token_delta;
        position.margin -= to_signed(result.cumulative_fee_incurred);
        set_position(&env, &key, &position);

        env.events().publish(
            (Symbol::new(&env, "position_unwound"),),
            (owner, tick_lower, tick_upper),
        );
    }

    /// Read-only check of a position against its initial margin requirement,
    /// on the would-be state after a poke; nothing is written back
    pub fn check_position_margin_satisfied(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) -> bool {
        let config = get_config(&env);
        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);

        if position.liquidity > 0 {
            let growth = query_growth_inside(&env, &config.vamm, tick_lower, tick_upper);
            ledger::update_position(&env, &mut position, 0, &growth, 0);
        }

        let im = margin::margin_requirement(
            &env,
            &config.margin_params,
            position.fixed_token_balance,
            position.variable_token_balance,
            historical_apy_estimate(&env, &config),
            config.term_start_wad,
            config.term_end_wad,
            scaled_timestamp(&env),
            false,
        );
        position.margin >= to_signed(im)
    }

    // === VAMM notifications ===

    /// VAMM callback after a mint or burn touched a position's range. Mints
    /// must leave the position above its initial margin requirement; burns
    /// only reduce risk and are always allowed.
    pub fn notify_position_mint_burn(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        growth: GrowthInside,
    ) {
        let config = get_config(&env);
        config.vamm.require_auth();

        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);
        ledger::update_position(&env, &mut position, liquidity_delta, &growth, 0);

        if liquidity_delta > 0 {
            check_position_initial_margin(&env, &config, &position);
        }
        set_position(&env, &key, &position);
    }

    /// VAMM callback after a position took the taker side of a swap
    pub fn notify_position_swap(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        fixed_token_delta: i128,
        variable_token_delta: i128,
        cumulative_fee_incurred: u128,
        growth: GrowthInside,
    ) {
        let config = get_config(&env);
        config.vamm.require_auth();

        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let mut position = get_position(&env, &key);
        if position.liquidity > 0 {
            ledger::update_position(&env, &mut position, 0, &growth, 0);
        }
        position.fixed_token_balance += fixed_token_delta;
        position.variable_token_balance += variable_token_delta;
        position.margin -= to_signed(cumulative_fee_incurred);

        check_position_initial_margin(&env, &config, &position);
        set_position(&env, &key, &position);
    }

    /// VAMM callback after a trader swap
    pub fn notify_trader_swap(
        env: Env,
        trader: Address,
        fixed_token_delta: i128,
        variable_token_delta: i128,
        cumulative_fee_incurred: u128,
    ) {
        let config = get_config(&env);
        config.vamm.require_auth();

        let mut record = get_trader(&env, &trader);
        ledger::update_balances_via_deltas(&mut record, fixed_token_delta, variable_token_delta);
        record.margin -= to_signed(cumulative_fee_incurred);

        check_trader_initial_margin(&env, &config, &record);
        set_trader(&env, &trader, &record);
    }

    /// Pay out a fully-collateralised settlement cashflow from the engine's
    /// collateral pool. Only the configured FCM may request this.
    pub fn fcm_transfer(env: Env, to: Address, amount: u128) {
        let config = get_config(&env);
        config.fcm.require_auth();
        pay_out(&env, &config, &to, amount);
    }

    // === Views ===

    pub fn get_position(env: Env, owner: Address, tick_lower: i32, tick_upper: i32) -> Position {
        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        get_position(&env, &key)
    }

    pub fn get_trader(env: Env, trader: Address) -> Trader {
        get_trader(&env, &trader)
    }

    pub fn get_config(env: Env) -> EngineConfig {
        get_config(&env)
    }

    /// Annualised variable factor over the configured lookback window
    pub fn historical_apy(env: Env) -> u128 {
        let config = get_config(&env);
        historical_apy_estimate(&env, &config)
    }
}

// === Internal helpers ===

fn require_matured(env: &Env, config: &EngineConfig) {
    if scaled_timestamp(env) < config.term_end_wad {
        panic!("Cannot settle before maturity");
    }
}

fn check_position_initial_margin(env: &Env, config: &EngineConfig, position: &Position) {
    let im = margin::margin_requirement(
        env,
        &config.margin_params,
        position.fixed_token_balance,
        position.variable_token_balance,
        historical_apy_estimate(env, config),
        config.term_start_wad,
        config.term_end_wad,
        scaled_timestamp(env),
        false,
    );
    if position.margin < to_signed(im) {
        panic!("Margin requirement not met");
    }
}

fn check_trader_initial_margin(env: &Env, config: &EngineConfig, record: &Trader) {
    let im = margin::margin_requirement(
        env,
        &config.margin_params,
        record.fixed_token_balance,
        record.variable_token_balance,
        historical_apy_estimate(env, config),
        config.term_start_wad,
        config.term_end_wad,
        scaled_timestamp(env),
        false,
    );
    if record.margin < to_signed(im) {
        panic!("Margin requirement not met");
    }
}

/// Share of a positive margin paid to the liquidator
fn liquidator_reward(env: &Env, config: &EngineConfig, margin: i128) -> u128 {
    if margin > 0 {
        mul_wad(env, margin as u128, config.liquidator_reward_wad)
    } else {
        0
    }
}

fn historical_apy_estimate(env: &Env, config: &EngineConfig) -> u128 {
    let now = scaled_timestamp(env);
    let from = now.saturating_sub(config.apy_lookback_wad);
    if from >= now {
        return 0;
    }
    let factor = query_variable_factor(env, &config.rate_oracle, from, now);
    let window_years = div_wad(env, now - from, SECONDS_PER_YEAR_WAD);
    if window_years == 0 {
        return 0;
    }
    div_wad(env, factor, window_years)
}

/// Move collateral for a signed margin delta: deposits come from the caller,
/// withdrawals go to the account owner
fn transfer_margin_delta(
    env: &Env,
    config: &EngineConfig,
    caller: &Address,
    owner: &Address,
    margin_delta: i128,
) {
    let client = token::Client::new(env, &config.underlying_token);
    if margin_delta > 0 {
        client.transfer(caller, &env.current_contract_address(), &margin_delta);
    } else {
        client.transfer(&env.current_contract_address(), owner, &-margin_delta);
    }
}

fn pay_out(env: &Env, config: &EngineConfig, to: &Address, amount: u128) {
    if amount > 0 {
        let client = token::Client::new(env, &config.underlying_token);
        client.transfer(&env.current_contract_address(), to, &to_signed(amount));
    }
}

/// Opposing swap sized to flatten a variable exposure. The VAMM chooses the
/// execution range for trader-style swaps.
fn execute_unwind_swap(
    env: &Env,
    config: &EngineConfig,
    account: &Address,
    variable_balance: i128,
) -> VammSwapResult {
    let params = VammSwapParams {
        recipient: account.clone(),
        is_fixed_taker: variable_balance > 0,
        amount_specified: to_signed(variable_balance.unsigned_abs()),
        tick_lower: 0,
        tick_upper: 0,
    };
    invoke_vamm_swap(env, &config.vamm, &params)
}

fn query_growth_inside(env: &Env, vamm: &Address, tick_lower: i32, tick_upper: i32) -> GrowthInside {
    env.invoke_contract(
        vamm,
        &Symbol::new(env, "growth_inside"),
        (tick_lower, tick_upper).into_val(env),
    )
}

fn query_variable_factor(env: &Env, rate_oracle: &Address, from: u128, to: u128) -> u128 {
    env.invoke_contract(
        rate_oracle,
        &Symbol::new(env, "variable_factor"),
        (from, to).into_val(env),
    )
}

fn invoke_vamm_swap(env: &Env, vamm: &Address, params: &VammSwapParams) -> VammSwapResult {
    env.invoke_contract(vamm, &Symbol::new(env, "swap"), (params.clone(),).into_val(env))
}

fn invoke_vamm_burn(
    env: &Env,
    vamm: &Address,
    owner: &Address,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> GrowthInside {
    env.invoke_contract(
        vamm,
        &Symbol::new(env, "burn"),
        (owner, tick_lower, tick_upper, liquidity).into_val(env),
    )
}
