// Winner selection as an injected capability.
// Constraints: pure function of its inputs; never touches round validity.

use crate::account::Address;
use sha2::{Digest, Sha256};

/// Index-selection policy for the draw.
/// Implementations must return an index strictly below `bound`;
/// callers guard the empty round, so `bound` is never zero.
pub trait WinnerSelector {
    fn pick_index(&self, bound: usize) -> usize;
}

/// Production policy: fold volatile block state plus the transacting caller
/// through sha256. Unpredictable before the draw lands, deterministic once
/// the chain state is final.
#[derive(Debug, Clone, Copy)]
pub struct ChainEntropy {
    pub difficulty: u64,
    pub timestamp_ms: u64,
    pub caller: Address,
}

impl WinnerSelector for ChainEntropy {
    fn pick_index(&self, bound: usize) -> usize {
        let mut h = Sha256::new();
        h.update(self.difficulty.to_le_bytes());
        h.update(self.timestamp_ms.to_le_bytes());
        h.update(self.caller);
        let digest = h.finalize();

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(word) % bound as u64) as usize
    }
}

/// Test stub: always the same slot, clamped to the round size.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIndex(pub usize);

impl WinnerSelector for FixedIndex {
    fn pick_index(&self, bound: usize) -> usize {
        self.0.min(bound.saturating_sub(1))
    }
}
