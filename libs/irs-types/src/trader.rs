use soroban_sdk::contracttype;

/// Settlement state of a trader account. The transition Active -> Settled is
/// one-way; repeat settles of a Settled account are no-ops.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TraderStatus {
    Active,
    Settled,
}

impl Default for TraderStatus {
    fn default() -> Self {
        TraderStatus::Active
    }
}

/// Margin-engine trader ledger record
#[contracttype]
#[derive(Clone, Debug, Default)]
pub struct Trader {
    /// Collateral margin in underlying token units (wad)
    pub margin: i128,
    /// Net fixed-leg exposure (wad)
    pub fixed_token_balance: i128,
    /// Net variable-leg exposure (wad)
    pub variable_token_balance: i128,
    pub status: TraderStatus,
}

/// Fully-collateralised trader record. Collateral is held in the yield-bearing
/// wrapper's scaled units, so it appreciates with the variable rate and keeps
/// covering the variable leg without top-ups.
#[contracttype]
#[derive(Clone, Debug, Default)]
pub struct YieldBearingTrader {
    /// Collateral in scaled yield-bearing token units (wad)
    pub margin_in_scaled_tokens: u128,
    /// Net fixed-leg exposure (wad)
    pub fixed_token_balance: i128,
    /// Net variable-leg exposure (wad), never positive for this account type
    pub variable_token_balance: i128,
    pub status: TraderStatus,
}
