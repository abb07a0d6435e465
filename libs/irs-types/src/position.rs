use soroban_sdk::{contracttype, Address};

/// Position key for engine-level tracking
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Snapshot of the VAMM's growth accumulators inside a tick range.
/// All values are wad-scaled per unit of liquidity. The fee accumulator is
/// monotone non-decreasing; the token accumulators are signed and move with
/// the direction of swaps through the range.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GrowthInside {
    pub fee: u128,
    pub fixed_token: i128,
    pub variable_token: i128,
}

/// Liquidity-provider ledger record stored in the margin engine
#[contracttype]
#[derive(Clone, Debug, Default)]
pub struct Position {
    /// Virtual liquidity provided over [tick_lower, tick_upper), wad-scaled
    pub liquidity: u128,
    /// Collateral margin in underlying token units (wad)
    pub margin: i128,
    /// Fee growth inside the range at last update
    pub fee_growth_inside_last: u128,
    /// Fixed token growth inside the range at last update
    pub fixed_token_growth_inside_last: i128,
    /// Variable token growth inside the range at last update
    pub var_token_growth_inside_last: i128,
    /// Net fixed-leg exposure accrued since inception (wad)
    pub fixed_token_balance: i128,
    /// Net variable-leg exposure accrued since inception (wad)
    pub variable_token_balance: i128,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }
}
