#![no_std]

mod time;
mod wad;

pub use time::*;
pub use wad::*;
