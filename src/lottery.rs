// The lottery contract state machine.
// Separates rules from settlement: this module enforces entry and draw
// preconditions and reports the payout; the ledger moves the funds.

use crate::account::Address;
use crate::entropy::WinnerSelector;
use crate::MIN_ENTRY_WEI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryError {
    BelowMinimumStake,
    ManagerMayNotEnter,
    NotManager,
    NoPlayers,
}

/// Per-invocation context, filled from the transaction envelope.
#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub caller: Address,
    pub value: u128,
}

/// Settlement instruction returned by a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub winner: Address,
    pub amount: u128,
}

/// One deployed lottery round-keeper: a manager, the open round's players,
/// and the pooled stake. Every failed operation leaves the state unchanged.
#[derive(Debug, Clone)]
pub struct Lottery {
    manager: Address,
    players: Vec<Address>,
    pot: u128,
    winner_index: Option<u64>,
}

impl Lottery {
    pub fn new(manager: Address) -> Self {
        Lottery {
            manager,
            players: Vec::new(),
            pot: 0,
            winner_index: None,
        }
    }

    /// Join the open round with the attached stake.
    /// - Reject stakes below the minimum
    /// - Reject the manager (the manager is never a player)
    pub fn enter(&mut self, call: Call) -> Result<(), LotteryError> {
        if call.value < MIN_ENTRY_WEI {
            return Err(LotteryError::BelowMinimumStake);
        }
        if call.caller == self.manager {
            return Err(LotteryError::ManagerMayNotEnter);
        }

        self.players.push(call.caller);
        self.pot = self.pot.saturating_add(call.value);
        Ok(())
    }

    /// Draw a winner and reset the round.
    /// Manager-only; an empty round is rejected before any entropy is drawn.
    /// The selector must return an index strictly below the player count.
    pub fn pick_winner(
        &mut self,
        call: Call,
        selector: &dyn WinnerSelector,
    ) -> Result<Payout, LotteryError> {
        if call.caller != self.manager {
            return Err(LotteryError::NotManager);
        }
        if self.players.is_empty() {
            return Err(LotteryError::NoPlayers);
        }

        let index = selector.pick_index(self.players.len());
        let payout = Payout {
            winner: self.players[index],
            amount: self.pot,
        };

        self.winner_index = Some(index as u64);
        self.players.clear();
        self.pot = 0;

        Ok(payout)
    }

    /// Current round's entrants, in entry order.
    pub fn players(&self) -> &[Address] {
        &self.players
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Index drawn by the most recent payout; None until the first draw.
    pub fn winner_index(&self) -> Option<u64> {
        self.winner_index
    }

    /// Pooled stake held for the open round.
    pub fn pot(&self) -> u128 {
        self.pot
    }
}
