use soroban_sdk::{contracttype, Address};

use crate::GrowthInside;

/// Risk-model parameters for the margin calculator. All values wad-scaled.
///
/// The `_lm` variants must be no larger than their `_im` counterparts so the
/// liquidation requirement never exceeds the initial requirement.
#[contracttype]
#[derive(Clone, Debug)]
pub struct MarginParams {
    /// Multiplier on the historical APY for the upper rate bound
    pub apy_upper_multiplier: u128,
    /// Multiplier on the historical APY for the lower rate bound
    pub apy_lower_multiplier: u128,
    /// Minimum APY band half-width for the liquidation requirement
    pub min_delta_lm: u128,
    /// Minimum APY band half-width for the initial requirement
    pub min_delta_im: u128,
    /// Rate variance per year
    pub sigma_squared: u128,
    /// Constant term of the band width
    pub alpha: u128,
    /// Volatility weight of the band width
    pub beta: u128,
    /// Band scale above the APY estimate
    pub xi_upper: u128,
    /// Band scale below the APY estimate
    pub xi_lower: u128,
    /// Horizon cap for the volatility term, wad seconds
    pub t_max: u128,
    pub dev_mul_left_unwind_lm: u128,
    pub dev_mul_right_unwind_lm: u128,
    pub dev_mul_left_unwind_im: u128,
    pub dev_mul_right_unwind_im: u128,
    pub dev_min_left_unwind_lm: u128,
    pub dev_min_right_unwind_lm: u128,
    pub dev_min_left_unwind_im: u128,
    pub dev_min_right_unwind_im: u128,
    /// Decay rate of the unwind deviation with time to maturity
    pub gamma: u128,
    /// Floor on any nonzero-exposure requirement
    pub min_margin_for_liquidators: u128,
}

/// Margin engine instance configuration
#[contracttype]
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Virtual AMM the engine receives notifications from
    pub vamm: Address,
    /// Rate oracle for variable factors and exchange rates
    pub rate_oracle: Address,
    /// Fully-collateralised module allowed to request transfers
    pub fcm: Address,
    /// Underlying collateral token
    pub underlying_token: Address,
    /// Term start, wad seconds
    pub term_start_wad: u128,
    /// Term end (maturity), wad seconds
    pub term_end_wad: u128,
    /// Lookback window for the historical APY estimate, wad seconds
    pub apy_lookback_wad: u128,
    /// Fraction of remaining margin paid to a liquidator, wad
    pub liquidator_reward_wad: u128,
    pub margin_params: MarginParams,
}

/// Swap request consumed by the external VAMM. Fixed takers receive the fixed
/// leg and pay the variable leg, so their variable token delta is non-positive.
#[contracttype]
#[derive(Clone, Debug)]
pub struct VammSwapParams {
    pub recipient: Address,
    pub is_fixed_taker: bool,
    /// Notional to trade, wad
    pub amount_specified: i128,
    /// Execution range; (0, 0) lets the VAMM choose for trader swaps
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Swap outcome reported by the external VAMM
#[contracttype]
#[derive(Clone, Debug)]
pub struct VammSwapResult {
    pub fixed_token_delta: i128,
    pub variable_token_delta: i128,
    /// Fee charged by the VAMM for this swap, wad
    pub cumulative_fee_incurred: u128,
    /// Fixed delta before rebalancing to the current fixed rate
    pub fixed_token_delta_unbalanced: i128,
    /// Accumulator snapshot after the swap
    pub growth_inside: GrowthInside,
}
