// In-memory development chain the test suite runs against.
// Single-threaded and instamining: one transaction per block, applied
// atomically. All checks precede any mutation, so a rejected transaction
// leaves no trace (no balance change, no nonce change, no new block).

use crate::account::{
    address_from_pubkey, verify_signature, Account, Address, Hash, PublicKey, Signature,
};
use crate::compiler::Artifact;
use crate::entropy::{ChainEntropy, WinnerSelector};
use crate::lottery::{Call, Lottery, LotteryError};
use crate::WEI_PER_ETHER;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Stake each genesis account starts with.
pub const GENESIS_BALANCE_WEI: u128 = 100 * WEI_PER_ETHER;

/// Minimum mainnet difficulty; a plausible floor for the simulated field.
const GENESIS_DIFFICULTY: u64 = 131_072;

const BLOCK_TIME_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    UnknownSender,
    BadSignature,
    BadNonce,
    InsufficientFunds,
    UnknownContract,
    NonPayableCall,
    BadBytecode,
    Lottery(LotteryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxData {
    /// Bare value transfer. A transfer to a contract address enters the pool.
    Transfer,
    Enter,
    PickWinner,
}

#[derive(Debug, Clone, Copy)]
pub struct Tx {
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub value: u128,
    pub data: TxData,
}

#[derive(Debug, Clone, Copy)]
pub struct SignedTx {
    pub tx: Tx,
    pub pubkey: PublicKey,
    pub signature: Signature,
}

pub fn tx_bytes(tx: &Tx) -> Vec<u8> {
    let mut out = Vec::with_capacity(20 + 20 + 8 + 16 + 1);
    out.extend_from_slice(&tx.from);
    out.extend_from_slice(&tx.to);
    out.extend_from_slice(&tx.nonce.to_le_bytes());
    out.extend_from_slice(&tx.value.to_le_bytes());
    out.push(match tx.data {
        TxData::Transfer => 0,
        TxData::Enter => 1,
        TxData::PickWinner => 2,
    });
    out
}

pub fn tx_hash(tx: &Tx) -> Hash {
    let mut h = Sha256::new();
    h.update(tx_bytes(tx));
    h.finalize().into()
}

/// Volatile per-block state the entropy policy draws from.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext {
    pub height: u64,
    pub timestamp_ms: u64,
    pub difficulty: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub height: u64,
}

struct ContractInstance {
    code_hash: Hash,
    state: Lottery,
}

pub struct DevChain {
    order: Vec<Address>,
    keys: HashMap<Address, Account>,
    balances: HashMap<Address, u128>,
    nonces: HashMap<Address, u64>,
    contracts: HashMap<Address, ContractInstance>,
    block: BlockContext,
    selector: Option<Box<dyn WinnerSelector>>,
}

impl DevChain {
    /// Boot a chain with `n_accounts` funded accounts derived from fixed
    /// seeds. The genesis timestamp is injected; the chain never reads a
    /// wall clock.
    pub fn new(n_accounts: usize, genesis_timestamp_ms: u64) -> Self {
        let mut order = Vec::with_capacity(n_accounts);
        let mut keys = HashMap::new();
        let mut balances = HashMap::new();

        for seed in 1..=n_accounts {
            let account = Account::from_seed([seed as u8; 32]);
            let address = account.address();
            order.push(address);
            balances.insert(address, GENESIS_BALANCE_WEI);
            keys.insert(address, account);
        }

        DevChain {
            order,
            keys,
            balances,
            nonces: HashMap::new(),
            contracts: HashMap::new(),
            block: BlockContext {
                height: 0,
                timestamp_ms: genesis_timestamp_ms,
                difficulty: GENESIS_DIFFICULTY,
            },
            selector: None,
        }
    }

    /// Funded account addresses, in genesis order.
    pub fn accounts(&self) -> Vec<Address> {
        self.order.clone()
    }

    pub fn block(&self) -> BlockContext {
        self.block
    }

    pub fn balance(&self, addr: &Address) -> u128 {
        self.balances.get(addr).copied().unwrap_or(0)
    }

    pub fn nonce(&self, addr: &Address) -> u64 {
        self.nonces.get(addr).copied().unwrap_or(0)
    }

    /// Substitute the draw's entropy policy (tests install a deterministic
    /// stub here). Without an override each draw folds the current block
    /// context through `ChainEntropy`.
    pub fn set_winner_selector(&mut self, selector: Box<dyn WinnerSelector>) {
        self.selector = Some(selector);
    }

    /// Register a contract instance under a fresh address derived from the
    /// deployer and its nonce. The artifact's bytecode is carried opaquely;
    /// only its hash is retained.
    pub fn deploy(&mut self, from: Address, artifact: &Artifact) -> Result<Address, ChainError> {
        if !self.keys.contains_key(&from) {
            return Err(ChainError::UnknownSender);
        }
        let code = hex::decode(&artifact.bytecode).map_err(|_| ChainError::BadBytecode)?;

        let nonce = self.nonce(&from);
        let address = contract_address(&from, nonce);

        let mut h = Sha256::new();
        h.update(&code);
        let code_hash: Hash = h.finalize().into();

        self.contracts.insert(
            address,
            ContractInstance {
                code_hash,
                state: Lottery::new(from),
            },
        );
        self.balances.entry(address).or_insert(0);
        self.nonces.insert(from, nonce + 1);
        self.advance_block();

        Ok(address)
    }

    /// Sign and apply a transaction from an unlocked dev account.
    pub fn send(
        &mut self,
        from: Address,
        to: Address,
        value: u128,
        data: TxData,
    ) -> Result<Receipt, ChainError> {
        let tx = Tx {
            from,
            to,
            nonce: self.nonce(&from),
            value,
            data,
        };
        let signed = self.sign_tx(tx)?;
        self.send_raw(&signed)
    }

    /// Sign with an unlocked dev account's key without applying.
    pub fn sign_tx(&self, tx: Tx) -> Result<SignedTx, ChainError> {
        let account = self.keys.get(&tx.from).ok_or(ChainError::UnknownSender)?;
        Ok(SignedTx {
            pubkey: account.pubkey(),
            signature: account.sign(&tx_bytes(&tx)),
            tx,
        })
    }

    /// Verify and apply one externally-signed transaction.
    pub fn send_raw(&mut self, signed: &SignedTx) -> Result<Receipt, ChainError> {
        let tx = &signed.tx;

        if address_from_pubkey(&signed.pubkey) != tx.from {
            return Err(ChainError::UnknownSender);
        }
        if !verify_signature(&signed.pubkey, &tx_bytes(tx), &signed.signature) {
            return Err(ChainError::BadSignature);
        }
        if tx.nonce != self.nonce(&tx.from) {
            return Err(ChainError::BadNonce);
        }
        if self.balance(&tx.from) < tx.value {
            return Err(ChainError::InsufficientFunds);
        }

        self.execute(tx)?;

        self.nonces.insert(tx.from, tx.nonce + 1);
        let receipt = Receipt {
            tx_hash: tx_hash(tx),
            height: self.block.height + 1,
        };
        self.advance_block();
        Ok(receipt)
    }

    fn execute(&mut self, tx: &Tx) -> Result<(), ChainError> {
        if !self.contracts.contains_key(&tx.to) {
            return match tx.data {
                TxData::Transfer => {
                    self.move_value(tx.from, tx.to, tx.value);
                    Ok(())
                }
                TxData::Enter | TxData::PickWinner => Err(ChainError::UnknownContract),
            };
        }

        let call = Call {
            caller: tx.from,
            value: tx.value,
        };
        match tx.data {
            // The contract treats a plain value transfer as an entry.
            TxData::Transfer | TxData::Enter => {
                {
                    let Some(instance) = self.contracts.get_mut(&tx.to) else {
                        return Err(ChainError::UnknownContract);
                    };
                    instance.state.enter(call).map_err(ChainError::Lottery)?;
                }
                self.move_value(tx.from, tx.to, tx.value);
                Ok(())
            }
            TxData::PickWinner => {
                if tx.value != 0 {
                    return Err(ChainError::NonPayableCall);
                }
                let fallback = ChainEntropy {
                    difficulty: self.block.difficulty,
                    timestamp_ms: self.block.timestamp_ms,
                    caller: tx.from,
                };
                let payout = {
                    let Some(instance) = self.contracts.get_mut(&tx.to) else {
                        return Err(ChainError::UnknownContract);
                    };
                    let selector: &dyn WinnerSelector = match &self.selector {
                        Some(s) => s.as_ref(),
                        None => &fallback,
                    };
                    instance
                        .state
                        .pick_winner(call, selector)
                        .map_err(ChainError::Lottery)?
                };
                self.move_value(tx.to, payout.winner, payout.amount);
                Ok(())
            }
        }
    }

    // Caller has already checked the debit side can cover `value`.
    fn move_value(&mut self, from: Address, to: Address, value: u128) {
        let debit = self.balances.entry(from).or_insert(0);
        *debit = debit.saturating_sub(value);
        let credit = self.balances.entry(to).or_insert(0);
        *credit = credit.saturating_add(value);
    }

    fn advance_block(&mut self) {
        let next_height = self.block.height + 1;
        let next_timestamp = self.block.timestamp_ms + BLOCK_TIME_MS;

        let mut h = Sha256::new();
        h.update(self.block.difficulty.to_le_bytes());
        h.update(next_height.to_le_bytes());
        h.update(next_timestamp.to_le_bytes());
        let digest = h.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);

        self.block = BlockContext {
            height: next_height,
            timestamp_ms: next_timestamp,
            difficulty: u64::from_le_bytes(word),
        };
    }

    // --- read-only queries (no side effects) ---

    pub fn players(&self, contract: &Address) -> Result<Vec<Address>, ChainError> {
        self.with_contract(contract, |c| c.state.players().to_vec())
    }

    pub fn manager(&self, contract: &Address) -> Result<Address, ChainError> {
        self.with_contract(contract, |c| c.state.manager())
    }

    pub fn winner_index(&self, contract: &Address) -> Result<Option<u64>, ChainError> {
        self.with_contract(contract, |c| c.state.winner_index())
    }

    pub fn pot(&self, contract: &Address) -> Result<u128, ChainError> {
        self.with_contract(contract, |c| c.state.pot())
    }

    pub fn code_hash(&self, contract: &Address) -> Result<Hash, ChainError> {
        self.with_contract(contract, |c| c.code_hash)
    }

    fn with_contract<T>(
        &self,
        contract: &Address,
        read: impl FnOnce(&ContractInstance) -> T,
    ) -> Result<T, ChainError> {
        self.contracts
            .get(contract)
            .map(read)
            .ok_or(ChainError::UnknownContract)
    }
}

/// Contract addresses are derived from the deployer and its nonce,
/// hashed and truncated like account addresses.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut h = Sha256::new();
    h.update(deployer);
    h.update(nonce.to_le_bytes());
    let digest = h.finalize();
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[..20]);
    addr
}
