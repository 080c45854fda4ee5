//! Pure, deterministic logic: no I/O, no clocks, no network.

pub mod fallback;
pub mod normalize;
pub mod plan;
pub mod state;
pub mod types;
pub mod validate;
