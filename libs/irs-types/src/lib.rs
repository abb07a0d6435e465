#![no_std]

mod params;
mod position;
mod trader;

pub use params::*;
pub use position::*;
pub use trader::*;

/// One unit in 18-decimal fixed point ("wad")
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Seconds in a 365-day year, wad-scaled
pub const SECONDS_PER_YEAR_WAD: u128 = (SECONDS_PER_YEAR as u128) * WAD;

/// Scale a whole-number amount to wad
pub fn to_wad(amount: u64) -> u128 {
    (amount as u128) * WAD
}
