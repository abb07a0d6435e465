use irs_types::{EngineConfig, Position, PositionKey, Trader};
use soroban_sdk::{contracttype, Address, Env};

/// Storage keys for the margin engine contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Engine configuration (Instance storage)
    Config,
    /// Position ledger: PositionKey -> Position (Persistent storage)
    Position(PositionKey),
    /// Trader ledger: address -> Trader (Persistent storage)
    Trader(Address),
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

/// Extend instance storage TTL
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

/// Extend persistent storage TTL for a key
pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Config ===

pub fn get_config(env: &Env) -> EngineConfig {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("Engine not initialized")
}

pub fn set_config(env: &Env, config: &EngineConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

// === Position ===

// Ledger records are created lazily and kept after settlement so margin
// withdrawals and queries keep working on zeroed balances.

pub fn get_position(env: &Env, key: &PositionKey) -> Position {
    let data_key = DataKey::Position(key.clone());
    env.storage()
        .persistent()
        .get(&data_key)
        .unwrap_or_default()
}

pub fn set_position(env: &Env, key: &PositionKey, position: &Position) {
    let data_key = DataKey::Position(key.clone());
    env.storage().persistent().set(&data_key, position);
    extend_persistent_ttl(env, &data_key);
}

// === Trader ===

pub fn get_trader(env: &Env, trader: &Address) -> Trader {
    let data_key = DataKey::Trader(trader.clone());
    env.storage()
        .persistent()
        .get(&data_key)
        .unwrap_or_default()
}

pub fn set_trader(env: &Env, trader: &Address, record: &Trader) {
    let data_key = DataKey::Trader(trader.clone());
    env.storage().persistent().set(&data_key, record);
    extend_persistent_ttl(env, &data_key);
}
