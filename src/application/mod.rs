// Deterministic rotation and credential pools
pub mod rotation;

// Per-provider circuit breaking
pub mod health;

// Cache tiers
pub mod cache;

// Provider chain resolution
pub mod chain;

// Timeout-bounded execution
pub mod executor;

// Market data acquisition
pub mod market_data;

// Text generation acquisition
pub mod generation;
