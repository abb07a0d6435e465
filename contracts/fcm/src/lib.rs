#![no_std]

use irs_math::{div_wad_rounding_up, mul_wad, scaled_timestamp, settlement_cashflow, to_signed};
use irs_types::{TraderStatus, VammSwapParams, VammSwapResult, YieldBearingTrader};
use soroban_sdk::{
    contract, contractimpl, contracttype, token, Address, Env, IntoVal, Symbol,
};

/// Fully-collateralised trading module. Traders take the fixed side of the
/// swap and back the whole variable leg with yield-bearing tokens, so their
/// accounts can never become undercollateralised and are exempt from the
/// margin engine's liquidation machinery.
#[contract]
pub struct Fcm;

/// Storage keys for the FCM contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Module configuration (Instance storage)
    Config,
    /// Trader ledger: address -> YieldBearingTrader (Persistent storage)
    Trader(Address),
}

/// FCM instance configuration
#[contracttype]
#[derive(Clone, Debug)]
pub struct FcmConfig {
    /// Margin engine paying out positive settlement cashflows
    pub margin_engine: Address,
    /// Virtual AMM the swaps execute against
    pub vamm: Address,
    /// Rate oracle for exchange rates and variable factors
    pub rate_oracle: Address,
    /// Yield-bearing wrapper of the underlying, used as collateral
    pub yield_bearing_token: Address,
    /// Term start, wad seconds
    pub term_start_wad: u128,
    /// Term end (maturity), wad seconds
    pub term_end_wad: u128,
    /// Half-width of the synthetic execution range for FCM swaps
    pub tick_spacing: i32,
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

#[contractimpl]
impl Fcm {
    pub fn initialize(
        env: Env,
        margin_engine: Address,
        vamm: Address,
        rate_oracle: Address,
        yield_bearing_token: Address,
        term_start_wad: u128,
        term_end_wad: u128,
    ) {
        if env.storage().instance().has(&DataKey::Config) {
            panic!("Already initialized");
        }
        if term_start_wad >= term_end_wad {
            panic!("Invalid time range");
        }

        let tick_spacing = query_tick_spacing(&env, &vamm);
        let config = FcmConfig {
            margin_engine,
            vamm,
            rate_oracle,
            yield_bearing_token,
            term_start_wad,
            term_end_wad,
            tick_spacing,
        };
        set_config(&env, &config);
    }

    /// Open or increase a fully-collateralised fixed-taker swap. Collateral
    /// in scaled yield-bearing tokens is topped up so it covers the whole
    /// variable leg at the current exchange rate.
    pub fn initiate_fc_fixed_taker_swap(env: Env, trader: Address, notional: u128) {
        trader.require_auth();
        if notional == 0 {
            panic!("Notional must be non-zero");
        }

        let config = get_config(&env);
        let mut record = get_trader(&env, &trader);
        if record.status == TraderStatus::Settled {
            panic!("Trader already settled");
        }

        let result = invoke_vamm_swap(
            &env,
            &config,
            &VammSwapParams {
                recipient: trader.clone(),
                is_fixed_taker: true,
                amount_specified: to_signed(notional),
                tick_lower: -config.tick_spacing,
                tick_upper: config.tick_spacing,
            },
        );

        record.fixed_token_balance += result.fixed_token_delta;
        record.variable_token_balance += result.variable_token_delta;

        let rate = query_exchange_rate(&env, &config.rate_oracle);
        let token_client = token::Client::new(&env, &config.yield_bearing_token);

        // top the collateral up to the full requirement for the new exposure
        let required_scaled =
            div_wad_rounding_up(&env, record.variable_token_balance.unsigned_abs(), rate);
        if required_scaled > record.margin_in_scaled_tokens {
            let top_up = required_scaled - record.margin_in_scaled_tokens;
            token_client.transfer(&trader, &env.current_contract_address(), &to_signed(top_up));
            record.margin_in_scaled_tokens = required_scaled;
        }

        // the swap fee goes to the engine's collateral pool, in scaled tokens
        if result.cumulative_fee_incurred > 0 {
            let fee_scaled = div_wad_rounding_up(&env, result.cumulative_fee_incurred, rate);
            token_client.transfer(&trader, &config.margin_engine, &to_signed(fee_scaled));
        }

        check_margin_requirement(&env, &record, rate);
        set_trader(&env, &trader, &record);

        env.events().publish(
            (Symbol::new(&env, "fcm_swap"),),
            (trader, notional, result.fixed_token_delta, result.variable_token_delta),
        );
    }

    /// Unwind part or all of the swap, releasing collateral the remaining
    /// exposure no longer needs
    pub fn unwind_fc_fixed_taker_swap(env: Env, trader: Address, notional: u128) {
        trader.require_auth();
        if notional == 0 {
            panic!("Notional must be non-zero");
        }

        let config = get_config(&env);
        let mut record = get_trader(&env, &trader);
        if record.status == TraderStatus::Settled {
            panic!("Trader already settled");
        }
        if notional > record.variable_token_balance.unsigned_abs() {
            panic!("Cannot unwind more than the open notional");
        }

        let result = invoke_vamm_swap(
            &env,
            &config,
            &VammSwapParams {
                recipient: trader.clone(),
                is_fixed_taker: false,
                amount_specified: to_signed(notional),
                tick_lower: -config.tick_spacing,
                tick_upper: config.tick_spacing,
            },
        );

        record.fixed_token_balance += result.fixed_token_delta;
        record.variable_token_balance += result.variable_token_delta;

        let rate = query_exchange_rate(&env, &config.rate_oracle);
        let token_client = token::Client::new(&env, &config.yield_bearing_token);

        if result.cumulative_fee_incurred > 0 {
            let fee_scaled = div_wad_rounding_up(&env, result.cumulative_fee_incurred, rate);
            token_client.transfer(&trader, &config.margin_engine, &to_signed(fee_scaled));
        }

        let required_scaled =
            div_wad_rounding_up(&env, record.variable_token_balance.unsigned_abs(), rate);
        if record.margin_in_scaled_tokens > required_scaled {
            let release = record.margin_in_scaled_tokens - required_scaled;
            record.margin_in_scaled_tokens = required_scaled;
            token_client.transfer(&env.current_contract_address(), &trader, &to_signed(release));
        }

        check_margin_requirement(&env, &record, rate);
        set_trader(&env, &trader, &record);

        env.events().publish(
            (Symbol::new(&env, "fcm_unwind"),),
            (trader, notional, result.fixed_token_delta, result.variable_token_delta),
        );
    }

    /// Settle a matured trader: a negative cashflow comes out of the scaled
    /// collateral, a positive one is paid by the margin engine; whatever
    /// collateral remains goes back to the trader. Repeat calls are no-ops.
    pub fn settle_trader(env: Env, trader: Address) {
        let config = get_config(&env);
        if scaled_timestamp(&env) < config.term_end_wad {
            panic!("Cannot settle before maturity");
        }

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

        let rate = query_exchange_rate(&env, &config.rate_oracle);
        let token_client = token::Client::new(&env, &config.yield_bearing_token);

        if cashflow < 0 {
            let owed_scaled = div_wad_rounding_up(&env, cashflow.unsigned_abs(), rate);
            if owed_scaled > record.margin_in_scaled_tokens {
                panic!("Margin requirement not met");
            }
            record.margin_in_scaled_tokens -= owed_scaled;
            // the forfeited collateral accrues to the engine's pool
            token_client.transfer(
                &env.current_contract_address(),
                &config.margin_engine,
                &to_signed(owed_scaled),
            );
        } else if cashflow > 0 {
            invoke_engine_transfer(&env, &config.margin_engine, &trader, cashflow as u128);
        }

        if record.margin_in_scaled_tokens > 0 {
            token_client.transfer(
                &env.current_contract_address(),
                &trader,
                &to_signed(record.margin_in_scaled_tokens),
            );
            record.margin_in_scaled_tokens = 0;
        }

        record.fixed_token_balance = 0;
        record.variable_token_balance = 0;
        record.status = TraderStatus::Settled;
        set_trader(&env, &trader, &record);

        env.events().publish((Symbol::new(&env, "fcm_settled"),), (trader, cashflow));
    }

    // === Views ===

    pub fn get_trader(env: Env, trader: Address) -> YieldBearingTrader {
        get_trader(&env, &trader)
    }

    pub fn get_config(env: Env) -> FcmConfig {
        get_config(&env)
    }
}

// === Invariants ===

/// The account must stay a net fixed receiver, with scaled collateral worth
/// at least the variable leg at the current exchange rate
fn check_margin_requirement(env: &Env, record: &YieldBearingTrader, exchange_rate: u128) {
    if record.variable_token_balance > 0 {
        panic!("Variable balance must not be positive");
    }
    let collateral_value = mul_wad(env, record.margin_in_scaled_tokens, exchange_rate);
    if to_signed(collateral_value) < -record.variable_token_balance {
        panic!("Margin requirement not met");
    }
}

// === Storage ===

fn get_config(env: &Env) -> FcmConfig {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("FCM not initialized")
}

fn set_config(env: &Env, config: &FcmConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

fn get_trader(env: &Env, trader: &Address) -> YieldBearingTrader {
    let key = DataKey::Trader(trader.clone());
    env.storage().persistent().get(&key).unwrap_or_default()
}

fn set_trader(env: &Env, trader: &Address, record: &YieldBearingTrader) {
    let key = DataKey::Trader(trader.clone());
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Cross-contract calls ===

fn query_tick_spacing(env: &Env, vamm: &Address) -> i32 {
    env.invoke_contract(vamm, &Symbol::new(env, "tick_spacing"), ().into_val(env))
}

fn query_exchange_rate(env: &Env, rate_oracle: &Address) -> u128 {
    env.invoke_contract(rate_oracle, &Symbol::new(env, "exchange_rate"), ().into_val(env))
}

fn query_variable_factor(env: &Env, rate_oracle: &Address, from: u128, to: u128) -> u128 {
    env.invoke_contract(
        rate_oracle,
        &Symbol::new(env, "variable_factor"),
        (from, to).into_val(env),
    )
}

fn invoke_vamm_swap(env: &Env, config: &FcmConfig, params: &VammSwapParams) -> VammSwapResult {
    env.invoke_contract(
        &config.vamm,
        &Symbol::new(env, "swap"),
        (params.clone(),).into_val(env),
    )
}

fn invoke_engine_transfer(env: &Env, margin_engine: &Address, to: &Address, amount: u128) {
    env.invoke_contract::<()>(
        margin_engine,
        &Symbol::new(env, "fcm_transfer"),
        (to, amount).into_val(env),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use irs_types::{to_wad, GrowthInside, SECONDS_PER_YEAR_WAD, WAD};
    use soroban_sdk::testutils::{Address as _, Ledger};

    const YEAR: u128 = SECONDS_PER_YEAR_WAD;

    // === Mock collaborators ===

    #[contract]
    pub struct MockVamm;

    #[contractimpl]
    impl MockVamm {
        pub fn set_swap_result(env: Env, result: VammSwapResult) {
            env.storage().instance().set(&Symbol::new(&env, "swap"), &result);
        }

        pub fn swap(env: Env, _params: VammSwapParams) -> VammSwapResult {
            env.storage().instance().get(&Symbol::new(&env, "swap")).unwrap()
        }

        pub fn tick_spacing(_env: Env) -> i32 {
            60
        }
    }

    #[contract]
    pub struct MockRateOracle;

    #[contractimpl]
    impl MockRateOracle {
        pub fn set_exchange_rate(env: Env, rate: u128) {
            env.storage().instance().set(&Symbol::new(&env, "rate"), &rate);
        }

        pub fn exchange_rate(env: Env) -> u128 {
            env.storage()
                .instance()
                .get(&Symbol::new(&env, "rate"))
                .unwrap_or(WAD)
        }

        pub fn set_variable_factor(env: Env, factor: u128) {
            env.storage().instance().set(&Symbol::new(&env, "factor"), &factor);
        }

        pub fn variable_factor(env: Env, _from: u128, _to: u128) -> u128 {
            env.storage()
                .instance()
                .get(&Symbol::new(&env, "factor"))
                .unwrap_or(0)
        }
    }

    #[contract]
    pub struct MockEngine;

    #[contractimpl]
    impl MockEngine {
        pub fn fcm_transfer(env: Env, to: Address, amount: u128) {
            env.storage().instance().set(&Symbol::new(&env, "last"), &(to, amount));
        }

        pub fn last_transfer(env: Env) -> Option<(Address, u128)> {
            env.storage().instance().get(&Symbol::new(&env, "last"))
        }
    }

    // === Fixtures ===

    struct TestSet<'a> {
        env: Env,
        fcm: FcmClient<'a>,
        vamm: MockVammClient<'a>,
        oracle: MockRateOracleClient<'a>,
        engine: MockEngineClient<'a>,
        token: token::Client<'a>,
        token_admin: token::StellarAssetClient<'a>,
    }

    fn setup<'a>() -> TestSet<'a> {
        let env = Env::default();
        env.mock_all_auths();

        let vamm_id = env.register(MockVamm, ());
        let oracle_id = env.register(MockRateOracle, ());
        let engine_id = env.register(MockEngine, ());
        let fcm_id = env.register(Fcm, ());

        let token_owner = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(token_owner);

        let fcm = FcmClient::new(&env, &fcm_id);
        fcm.initialize(&engine_id, &vamm_id, &oracle_id, &sac.address(), &0u128, &YEAR);

        TestSet {
            fcm,
            vamm: MockVammClient::new(&env, &vamm_id),
            oracle: MockRateOracleClient::new(&env, &oracle_id),
            engine: MockEngineClient::new(&env, &engine_id),
            token: token::Client::new(&env, &sac.address()),
            token_admin: token::StellarAssetClient::new(&env, &sac.address()),
            env,
        }
    }

    fn put_trader(t: &TestSet, trader: &Address, record: &YieldBearingTrader) {
        t.env.as_contract(&t.fcm.address, || {
            set_trader(&t.env, trader, record);
        });
    }

    fn fixed_taker_fill(notional: u64, fixed: u64) -> VammSwapResult {
        VammSwapResult {
            fixed_token_delta: to_signed(to_wad(fixed)),
            variable_token_delta: -to_signed(to_wad(notional)),
            cumulative_fee_incurred: 0,
            fixed_token_delta_unbalanced: to_signed(to_wad(fixed)),
            growth_inside: GrowthInside::default(),
        }
    }

    // === Initialization ===

    #[test]
    fn test_initialize_reads_tick_spacing() {
        let t = setup();
        let config = t.fcm.get_config();
        assert_eq!(config.tick_spacing, 60);
        assert_eq!(config.term_end_wad, YEAR);
    }

    #[test]
    #[should_panic(expected = "Already initialized")]
    fn test_initialize_twice_fails() {
        let t = setup();
        let config = t.fcm.get_config();
        t.fcm.initialize(
            &config.margin_engine,
            &config.vamm,
            &config.rate_oracle,
            &config.yield_bearing_token,
            &0u128,
            &YEAR,
        );
    }

    // === Initiate ===

    #[test]
    fn test_initiate_collects_scaled_collateral() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(100)));

        // 100 notional at an exchange rate of 1.25 needs 80 scaled tokens
        t.oracle.set_exchange_rate(&(5 * WAD / 4));
        t.vamm.set_swap_result(&fixed_taker_fill(100, 5));

        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));

        let record = t.fcm.get_trader(&trader);
        assert_eq!(record.margin_in_scaled_tokens, to_wad(80));
        assert_eq!(record.fixed_token_balance, to_signed(to_wad(5)));
        assert_eq!(record.variable_token_balance, -to_signed(to_wad(100)));
        assert!(record.variable_token_balance <= 0);
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(20)));
        assert_eq!(t.token.balance(&t.fcm.address), to_signed(to_wad(80)));
    }

    #[test]
    fn test_second_initiate_tops_up_collateral() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(300)));
        t.vamm.set_swap_result(&fixed_taker_fill(100, 5));

        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));

        let record = t.fcm.get_trader(&trader);
        // rate defaults to 1.0: the full 200 variable leg is collateralised
        assert_eq!(record.margin_in_scaled_tokens, to_wad(200));
        assert_eq!(record.variable_token_balance, -to_signed(to_wad(200)));
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(100)));
    }

    #[test]
    fn test_swap_fee_forwarded_to_engine() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(200)));

        let mut fill = fixed_taker_fill(100, 5);
        fill.cumulative_fee_incurred = to_wad(1);
        t.vamm.set_swap_result(&fill);

        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));

        assert_eq!(t.token.balance(&t.engine.address), to_signed(to_wad(1)));
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(99)));
    }

    #[test]
    #[should_panic(expected = "Notional must be non-zero")]
    fn test_initiate_zero_notional_fails() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &0);
    }

    #[test]
    #[should_panic(expected = "Variable balance must not be positive")]
    fn test_positive_variable_fill_rejected() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(100)));

        // a misbehaving fill that would leave the trader net variable receiver
        t.vamm.set_swap_result(&VammSwapResult {
            fixed_token_delta: -to_signed(to_wad(5)),
            variable_token_delta: to_signed(to_wad(100)),
            cumulative_fee_incurred: 0,
            fixed_token_delta_unbalanced: -to_signed(to_wad(5)),
            growth_inside: GrowthInside::default(),
        });
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));
    }

    // === Unwind ===

    #[test]
    fn test_unwind_releases_freed_collateral() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(100)));
        t.vamm.set_swap_result(&fixed_taker_fill(100, 5));
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));

        // unwind 40 of the 100 notional
        t.vamm.set_swap_result(&VammSwapResult {
            fixed_token_delta: -to_signed(to_wad(2)),
            variable_token_delta: to_signed(to_wad(40)),
            cumulative_fee_incurred: 0,
            fixed_token_delta_unbalanced: -to_signed(to_wad(2)),
            growth_inside: GrowthInside::default(),
        });
        t.fcm.unwind_fc_fixed_taker_swap(&trader, &to_wad(40));

        let record = t.fcm.get_trader(&trader);
        assert_eq!(record.variable_token_balance, -to_signed(to_wad(60)));
        assert_eq!(record.fixed_token_balance, to_signed(to_wad(3)));
        assert_eq!(record.margin_in_scaled_tokens, to_wad(60));
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(40)));
    }

    #[test]
    #[should_panic(expected = "Cannot unwind more than the open notional")]
    fn test_unwind_more_than_open_fails() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&trader, &to_signed(to_wad(100)));
        t.vamm.set_swap_result(&fixed_taker_fill(100, 5));
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(100));

        t.fcm.unwind_fc_fixed_taker_swap(&trader, &to_wad(200));
    }

    // === Settlement ===

    #[test]
    fn test_settle_negative_cashflow_forfeits_collateral() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&t.fcm.address, &to_signed(to_wad(100)));

        // fixed +1 over a year, variable -100 at a realised 3% factor:
        // 1 * 1.0 - 100 * 0.03 = -2
        put_trader(
            &t,
            &trader,
            &YieldBearingTrader {
                margin_in_scaled_tokens: to_wad(100),
                fixed_token_balance: to_signed(to_wad(1)),
                variable_token_balance: -to_signed(to_wad(100)),
                status: TraderStatus::Active,
            },
        );
        t.oracle.set_variable_factor(&(3 * WAD / 100));
        t.env.ledger().with_mut(|li| li.timestamp = 31_536_000);

        t.fcm.settle_trader(&trader);

        let record = t.fcm.get_trader(&trader);
        assert_eq!(record.status, TraderStatus::Settled);
        assert_eq!(record.margin_in_scaled_tokens, 0);
        assert_eq!(record.variable_token_balance, 0);
        // 2 forfeited to the engine, 98 returned
        assert_eq!(t.token.balance(&t.engine.address), to_signed(to_wad(2)));
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(98)));
    }

    #[test]
    fn test_settle_positive_cashflow_paid_by_engine() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&t.fcm.address, &to_signed(to_wad(50)));

        put_trader(
            &t,
            &trader,
            &YieldBearingTrader {
                margin_in_scaled_tokens: to_wad(50),
                fixed_token_balance: to_signed(to_wad(10)),
                variable_token_balance: 0,
                status: TraderStatus::Active,
            },
        );
        t.env.ledger().with_mut(|li| li.timestamp = 31_536_000);

        t.fcm.settle_trader(&trader);

        // the engine owes the full fixed leg
        assert_eq!(t.engine.last_transfer(), Some((trader.clone(), to_wad(10))));
        // collateral comes home
        assert_eq!(t.token.balance(&trader), to_signed(to_wad(50)));
        assert_eq!(t.fcm.get_trader(&trader).status, TraderStatus::Settled);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.token_admin.mint(&t.fcm.address, &to_signed(to_wad(10)));
        put_trader(
            &t,
            &trader,
            &YieldBearingTrader {
                margin_in_scaled_tokens: to_wad(10),
                fixed_token_balance: 0,
                variable_token_balance: 0,
                status: TraderStatus::Active,
            },
        );
        t.env.ledger().with_mut(|li| li.timestamp = 31_536_000);

        t.fcm.settle_trader(&trader);
        let balance_after_first = t.token.balance(&trader);
        t.fcm.settle_trader(&trader);

        assert_eq!(balance_after_first, to_signed(to_wad(10)));
        assert_eq!(t.token.balance(&trader), balance_after_first);
    }

    #[test]
    #[should_panic(expected = "Cannot settle before maturity")]
    fn test_settle_before_maturity_fails() {
        let t = setup();
        let trader = Address::generate(&t.env);
        t.env.ledger().with_mut(|li| li.timestamp = 31_536_000 / 2);
        t.fcm.settle_trader(&trader);
    }

    #[test]
    #[should_panic(expected = "Trader already settled")]
    fn test_initiate_after_settle_fails() {
        let t = setup();
        let trader = Address::generate(&t.env);
        put_trader(
            &t,
            &trader,
            &YieldBearingTrader {
                margin_in_scaled_tokens: 0,
                fixed_token_balance: 0,
                variable_token_balance: 0,
                status: TraderStatus::Settled,
            },
        );
        t.vamm.set_swap_result(&fixed_taker_fill(10, 1));
        t.fcm.initiate_fc_fixed_taker_swap(&trader, &to_wad(10));
    }
}
