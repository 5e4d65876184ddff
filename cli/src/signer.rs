//! Ed25519 signer backed by a wallet file keypair, and a keyless stand-in for quoting

use liquidswap_core::{AccountAddress, RawTransaction, SignedTransaction, Signer, SignerError};
use solana_sdk::signature::Signer as _;
use solana_sdk::signer::keypair::Keypair;

/// Signs for one account with the key loaded from its wallet file
///
/// The account address is taken from the wallet rather than derived from the
/// key, so rotated accounts keep working.
pub struct WalletSigner {
    address: AccountAddress,
    keypair: Keypair,
}

impl WalletSigner {
    pub fn new(address: AccountAddress, keypair: Keypair) -> Self {
        Self { address, keypair }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.pubkey().to_bytes()
    }
}

impl Signer for WalletSigner {
    fn address(&self) -> &AccountAddress {
        &self.address
    }

    fn sign(&self, transaction: RawTransaction) -> Result<SignedTransaction, SignerError> {
        if transaction.sender != self.address {
            return Err(SignerError(format!(
                "wallet holds {}, transaction is from {}",
                self.address, transaction.sender
            )));
        }
        if transaction.signing_message.is_empty() {
            return Err(SignerError("empty signing message".into()));
        }

        let signature = self.keypair.sign_message(&transaction.signing_message);
        Ok(SignedTransaction {
            public_key: self.public_key().to_vec(),
            signature: signature.as_ref().to_vec(),
            raw: transaction,
        })
    }
}

/// Signer for commands that only read the ledger
///
/// Lets `rate` run without a wallet file; any attempt to sign fails.
pub struct ReadOnlySigner {
    address: AccountAddress,
}

impl ReadOnlySigner {
    pub fn new(address: AccountAddress) -> Self {
        Self { address }
    }
}

impl Signer for ReadOnlySigner {
    fn address(&self) -> &AccountAddress {
        &self.address
    }

    fn sign(&self, transaction: RawTransaction) -> Result<SignedTransaction, SignerError> {
        Err(SignerError(format!(
            "no wallet loaded, cannot sign for {}",
            transaction.sender
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidswap_core::{EntryFunction, TransactionPayload};
    use solana_sdk::signature::Signature;
    use solana_sdk::signer::keypair::keypair_from_seed;

    fn signer() -> WalletSigner {
        WalletSigner::new("0xa11ce".parse().unwrap(), keypair_from_seed(&[7u8; 32]).unwrap())
    }

    fn raw(sender: &str) -> RawTransaction {
        RawTransaction {
            sender: sender.parse().unwrap(),
            sequence_number: 3,
            max_gas_amount: 100_000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_600,
            payload: TransactionPayload::EntryFunctionPayload(EntryFunction::new(
                "0x1::managed_coin::register",
                vec!["0x1::aptos_coin::AptosCoin".into()],
            )),
            signing_message: b"APTOS::RawTransaction test bytes".to_vec(),
        }
    }

    #[test]
    fn test_signature_verifies_against_public_key() {
        let signer = signer();
        let signed = signer.sign(raw("0xa11ce")).unwrap();

        assert_eq!(signed.public_key.len(), 32);
        assert_eq!(signed.signature.len(), 64);

        let signature = Signature::try_from(signed.signature.as_slice()).unwrap();
        assert!(signature.verify(&signed.public_key, &signed.raw.signing_message));
        assert!(!signature.verify(&signed.public_key, b"something else"));
    }

    #[test]
    fn test_refuses_foreign_sender() {
        let err = signer().sign(raw("0xb0b")).unwrap_err();
        assert!(err.to_string().contains("0xb0b"));
    }

    #[test]
    fn test_read_only_signer_never_signs() {
        let signer = ReadOnlySigner::new("0xa11ce".parse().unwrap());
        assert_eq!(signer.address().as_str(), "0xa11ce");
        let err = signer.sign(raw("0xa11ce")).unwrap_err();
        assert!(err.to_string().contains("no wallet loaded"));
    }
}
