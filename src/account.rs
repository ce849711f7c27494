// Chain primitives: addresses, hashes, and keyed dev accounts.
// Crypto here is reference-grade only (not hardened).

use ed25519_dalek::{
    Keypair, PublicKey as DalekPublicKey, SecretKey, Signature as DalekSignature, Signer, Verifier,
};
use sha2::{Digest, Sha256};

pub type Address = [u8; 20];
pub type Hash = [u8; 32];
pub type PublicKey = [u8; 32];
pub type Signature = [u8; 64];

pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Derive an account address from its public key: sha256, truncated to 20 bytes.
pub fn address_from_pubkey(pubkey: &PublicKey) -> Address {
    let mut h = Sha256::new();
    h.update(pubkey);
    let digest = h.finalize();
    let mut addr = ZERO_ADDRESS;
    addr.copy_from_slice(&digest[..20]);
    addr
}

pub fn address_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}

/// An externally-owned account the dev chain holds the key for.
pub struct Account {
    keypair: Keypair,
    address: Address,
}

impl Account {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let secret = SecretKey::from_bytes(&seed).expect("secret key must be 32 bytes");
        let public: DalekPublicKey = (&secret).into();
        let address = address_from_pubkey(&public.to_bytes());
        Account {
            keypair: Keypair { secret, public },
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pubkey(&self) -> PublicKey {
        self.keypair.public.to_bytes()
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.keypair.sign(msg).to_bytes()
    }
}

fn to_verifying_key(pk: &PublicKey) -> Option<DalekPublicKey> {
    DalekPublicKey::from_bytes(pk).ok()
}

fn to_signature(sig: &Signature) -> Option<DalekSignature> {
    DalekSignature::from_bytes(sig).ok()
}

/// Verify an ed25519 signature over `msg`. False on any malformed input.
pub fn verify_signature(pubkey: &PublicKey, msg: &[u8], sig: &Signature) -> bool {
    let Some(vk) = to_verifying_key(pubkey) else {
        return false;
    };
    let Some(sig) = to_signature(sig) else {
        return false;
    };
    vk.verify(msg, &sig).is_ok()
}
