//! VRF engine backing the mock coordinator
//!
//! Random words are derived from a schnorrkel signature over a
//! deterministic input message, so every draw ships with a publicly
//! verifiable proof of where its randomness came from.

use crate::errors::CoordinatorError;
use schnorrkel::context::SigningContext;
use schnorrkel::{Keypair, PublicKey, Signature};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const VRF_SIGNING_CONTEXT: &[u8] = b"tombola-draw";

/// Proof material published alongside each batch of random words
#[derive(Debug, Clone)]
pub struct VrfProof {
    /// Hex-encoded VRF output (32 bytes)
    pub output: String,
    /// Hex-encoded proof (64-byte schnorrkel signature)
    pub proof: String,
    /// Hex-encoded public key (32 bytes)
    pub public_key: String,
    /// Input message the proof commits to
    pub input_message: String,
}

/// VRF-based random word generator
pub struct VrfEngine {
    keypair: Arc<Keypair>,
}

impl VrfEngine {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Create an engine with a fresh random keypair
    pub fn new_random() -> Self {
        use rand_core::OsRng;
        let keypair = Keypair::generate_with(OsRng);
        Self::new(keypair)
    }

    /// Build the input message a request's randomness commits to
    pub fn input_message(request_id: u64, gas_lane: &str, subscription_id: u64) -> String {
        format!("{}:{}:{}", request_id, gas_lane, subscription_id)
    }

    /// Derive `num_words` random words for a request, with proof
    pub fn random_words(
        &self,
        request_id: u64,
        gas_lane: &str,
        subscription_id: u64,
        num_words: u32,
    ) -> (Vec<u64>, VrfProof) {
        let input_message = Self::input_message(request_id, gas_lane, subscription_id);

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let transcript = ctx.bytes(input_message.as_bytes());
        let signature = self.keypair.sign(transcript);

        // Output is the hash of the signature; the signature is the proof
        let mut hasher = Sha256::new();
        hasher.update(signature.to_bytes());
        let output = hasher.finalize().to_vec();

        let words = Self::expand_words(&output, num_words);

        let proof = VrfProof {
            output: hex::encode(&output),
            proof: hex::encode(signature.to_bytes()),
            public_key: hex::encode(self.keypair.public.to_bytes()),
            input_message,
        };

        (words, proof)
    }

    /// Expand a 32-byte output into word-sized chunks by counter hashing
    fn expand_words(output: &[u8], num_words: u32) -> Vec<u64> {
        (0..num_words)
            .map(|i| {
                let mut hasher = Sha256::new();
                hasher.update(output);
                hasher.update(i.to_le_bytes());
                let digest = hasher.finalize();
                let mut word = [0u8; 8];
                word.copy_from_slice(&digest[..8]);
                u64::from_le_bytes(word)
            })
            .collect()
    }

    /// Verify a proof against the input message it claims to commit to
    pub fn verify_proof(proof: &VrfProof, expected_input: &str) -> Result<bool, CoordinatorError> {
        if proof.input_message != expected_input {
            return Ok(false);
        }

        let output = hex::decode(&proof.output)
            .map_err(|e| CoordinatorError::Vrf(format!("invalid output hex: {}", e)))?;
        let signature_bytes = hex::decode(&proof.proof)
            .map_err(|e| CoordinatorError::Vrf(format!("invalid proof hex: {}", e)))?;
        let public_key_bytes = hex::decode(&proof.public_key)
            .map_err(|e| CoordinatorError::Vrf(format!("invalid public key hex: {}", e)))?;

        let public_key = PublicKey::from_bytes(&public_key_bytes)
            .map_err(|e| CoordinatorError::Vrf(format!("invalid public key: {:?}", e)))?;
        let signature = Signature::from_bytes(&signature_bytes)
            .map_err(|e| CoordinatorError::Vrf(format!("invalid signature: {:?}", e)))?;

        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let transcript = ctx.bytes(expected_input.as_bytes());
        if public_key.verify(transcript, &signature).is_err() {
            return Ok(false);
        }

        // The output must be derived from the verified signature
        let mut hasher = Sha256::new();
        hasher.update(&signature_bytes);
        let computed = hasher.finalize();

        Ok(computed.as_slice() == output.as_slice())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }
}
