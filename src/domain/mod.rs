// Market data domain
pub mod market;

// Text generation domain
pub mod generation;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
