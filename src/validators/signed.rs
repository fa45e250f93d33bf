//! Signed, sequence numbered values.

use bytes::Bytes;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha1_smol::Sha1;

use crate::collaborators::Validator;
use crate::error::ValidationError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A value signed by an ed25519 key, stored as the value of a record.
///
/// The record key ends with the hex sha1 of the public key, so only the key holder
/// can publish under it. Newer versions carry higher sequence numbers.
pub struct SignedValue {
    /// ed25519 public key
    #[serde(with = "serde_bytes")]
    k: [u8; 32],
    /// sequence number
    seq: i64,
    /// signed value
    v: Bytes,
    /// ed25519 signature
    #[serde(with = "serde_bytes")]
    sig: [u8; 64],
}

impl SignedValue {
    /// Sign a new value with a sequence number.
    pub fn new(signer: &SigningKey, value: &[u8], seq: i64) -> Self {
        let signable = encode_signable(seq, value);
        let signature = signer.sign(&signable);

        Self {
            k: signer.verifying_key().to_bytes(),
            seq,
            v: Bytes::copy_from_slice(value),
            sig: signature.to_bytes(),
        }
    }

    /// Record key under `namespace` for values signed by `public_key`.
    pub fn record_key(namespace: &str, public_key: &[u8; 32]) -> Bytes {
        format!("/{}/{}", namespace, key_suffix(public_key)).into()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_bencode::from_bytes(bytes)
            .map_err(|error| ValidationError::MalformedValue(error.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }

    /// Check the signature, and that `key` belongs to the signer.
    pub fn verify(&self, key: &[u8]) -> Result<(), ValidationError> {
        let suffix = key.rsplit(|b| *b == b'/').next().unwrap_or_default();

        if suffix != key_suffix(&self.k).as_bytes() {
            return Err(ValidationError::InvalidKey);
        }

        let public_key =
            VerifyingKey::from_bytes(&self.k).map_err(|_| ValidationError::InvalidPublicKey)?;
        let signature = Signature::from_bytes(&self.sig);

        public_key
            .verify(&encode_signable(self.seq, &self.v), &signature)
            .map_err(|_| ValidationError::InvalidSignature)
    }

    // === Getters ===

    pub fn public_key(&self) -> &[u8; 32] {
        &self.k
    }

    pub fn seq(&self) -> i64 {
        self.seq
    }

    pub fn value(&self) -> &[u8] {
        &self.v
    }
}

fn key_suffix(public_key: &[u8; 32]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(public_key);

    hex::encode(hasher.digest().bytes())
}

pub fn encode_signable(seq: i64, value: &[u8]) -> Box<[u8]> {
    let mut signable = vec![];

    signable.extend(format!("3:seqi{}e1:v{}:", seq, value.len()).into_bytes());
    signable.extend(value);

    signable.into()
}

#[derive(Debug, Default, Clone, Copy)]
/// [Validator] for [SignedValue] records.
///
/// Selection prefers the highest sequence number. On equal sequence numbers the
/// later candidate wins, so a put never replaces an existing record of the same
/// sequence.
pub struct SignedValueValidator;

impl Validator for SignedValueValidator {
    fn validate(&self, key: &[u8], value: &[u8]) -> Result<(), ValidationError> {
        SignedValue::from_bytes(value)?.verify(key)
    }

    fn select(&self, _key: &[u8], values: &[&[u8]]) -> Result<usize, ValidationError> {
        let mut best: Option<(usize, i64)> = None;

        for (index, value) in values.iter().enumerate() {
            let seq = SignedValue::from_bytes(value)?.seq();

            match best {
                Some((_, best_seq)) if seq < best_seq => {}
                _ => best = Some((index, seq)),
            }
        }

        best.map(|(index, _)| index)
            .ok_or(ValidationError::NoCandidates)
    }
}
