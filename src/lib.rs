// Pooled-lottery core: deterministic, in-memory, test-first.

pub mod account;
pub mod chain;
pub mod client;
pub mod compiler;
pub mod entropy;
pub mod lottery;

// Global constants for the entry rules
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
pub const MIN_ENTRY_WEI: u128 = WEI_PER_ETHER / 10;

// No randomness or wall clock access; block time and entropy are injected explicitly.

/*
Intentionally avoids:
- async
- threads
- global mutable state
- gas accounting
*/
