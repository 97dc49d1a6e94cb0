// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! At-rest encryption for game API keys.
//!
//! Each value gets a fresh 32-byte salt and 16-byte IV. The AES key is
//! derived with PBKDF2-HMAC-SHA256 from the master key and the salt, and the
//! salt is bound as additional authenticated data so it cannot be swapped.
//!
//! Serialized form, every field lowercase hex:
//!
//! ```text
//! salt:iv:tag:ciphertext
//! ```

use aes_gcm::{
	aead::{consts::U16, generic_array::GenericArray, AeadInPlace, KeyInit, OsRng},
	aes::Aes256,
	AesGcm,
};
use hmac::{Hmac, Mac};
use pnw_common_secret::SecretString;
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::error::CipherError;

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

pub const SALT_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

const SELF_CHECK_PLAINTEXT: &str = "pnw-credential-cipher-self-check";

/// Outcome of [`CredentialCipher::self_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfCheck {
	Passed,
	Unconfigured,
	Failed(String),
}

impl SelfCheck {
	pub fn as_str(&self) -> &'static str {
		match self {
			SelfCheck::Passed => "ok",
			SelfCheck::Unconfigured => "unconfigured",
			SelfCheck::Failed(_) => "failed",
		}
	}
}

#[derive(Clone)]
pub struct CredentialCipher {
	master_key: Option<SecretString>,
	iterations: u32,
}

impl std::fmt::Debug for CredentialCipher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CredentialCipher")
			.field("configured", &self.is_configured())
			.field("iterations", &self.iterations)
			.finish()
	}
}

impl CredentialCipher {
	pub fn new(master_key: SecretString, iterations: u32) -> Self {
		let master_key = if master_key.is_blank() {
			None
		} else {
			Some(master_key)
		};
		Self {
			master_key,
			iterations,
		}
	}

	/// A cipher with no master key. Every operation fails with
	/// [`CipherError::MasterKeyUnset`].
	pub fn unconfigured() -> Self {
		Self {
			master_key: None,
			iterations: 0,
		}
	}

	pub fn is_configured(&self) -> bool {
		self.master_key.is_some()
	}

	fn master_key(&self) -> Result<&SecretString, CipherError> {
		self.master_key.as_ref().ok_or(CipherError::MasterKeyUnset)
	}

	fn derive_key(&self, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CipherError> {
		let master_key = self.master_key()?;
		let mut key = Zeroizing::new([0u8; KEY_LEN]);
		pbkdf2::pbkdf2_hmac::<Sha256>(
			master_key.expose().as_bytes(),
			salt,
			self.iterations,
			&mut key[..],
		);
		Ok(key)
	}

	/// Encrypt `plaintext` into the `salt:iv:tag:ciphertext` form.
	#[instrument(level = "debug", skip_all)]
	pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
		let mut salt = [0u8; SALT_LEN];
		let mut iv = [0u8; IV_LEN];
		OsRng.fill_bytes(&mut salt);
		OsRng.fill_bytes(&mut iv);

		let key = self.derive_key(&salt)?;
		let cipher = Aes256Gcm16::new_from_slice(&key[..])
			.map_err(|e| CipherError::Encryption(format!("invalid key length: {e}")))?;

		let mut buffer = plaintext.as_bytes().to_vec();
		let tag = cipher
			.encrypt_in_place_detached(GenericArray::from_slice(&iv), &salt, &mut buffer)
			.map_err(|_| CipherError::Encryption("AEAD encryption failed".to_string()))?;

		debug!(ciphertext_len = buffer.len(), "credential encrypted");
		Ok(format!(
			"{}:{}:{}:{}",
			hex::encode(salt),
			hex::encode(iv),
			hex::encode(tag),
			hex::encode(&buffer)
		))
	}

	/// Decrypt a value produced by [`CredentialCipher::encrypt`].
	#[instrument(level = "debug", skip_all)]
	pub fn decrypt(&self, blob: &str) -> Result<SecretString, CipherError> {
		self.master_key()?;

		let parts: Vec<&str> = blob.split(':').collect();
		let [salt, iv, tag, ciphertext] = parts.as_slice() else {
			return Err(CipherError::Malformed(format!(
				"expected 4 fields, found {}",
				parts.len()
			)));
		};

		let salt = decode_field(salt, "salt", Some(SALT_LEN))?;
		let iv = decode_field(iv, "iv", Some(IV_LEN))?;
		let tag = decode_field(tag, "tag", Some(TAG_LEN))?;
		let mut buffer = Zeroizing::new(decode_field(ciphertext, "ciphertext", None)?);

		let key = self.derive_key(&salt)?;
		let cipher = Aes256Gcm16::new_from_slice(&key[..])
			.map_err(|e| CipherError::Malformed(format!("invalid key length: {e}")))?;

		cipher
			.decrypt_in_place_detached(
				GenericArray::from_slice(&iv),
				&salt,
				buffer.as_mut_slice(),
				GenericArray::from_slice(&tag),
			)
			.map_err(|_| CipherError::TagMismatch)?;

		let plaintext =
			String::from_utf8(buffer.to_vec()).map_err(|_| CipherError::InvalidUtf8)?;
		Ok(SecretString::new(plaintext))
	}

	/// HMAC-SHA256 of `plaintext` keyed with the master key, lowercase hex.
	///
	/// Deterministic, so two owners holding the same key can be detected
	/// without decrypting every stored credential.
	#[instrument(level = "debug", skip_all)]
	pub fn fingerprint(&self, plaintext: &str) -> Result<String, CipherError> {
		let master_key = self.master_key()?;
		let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(master_key.expose().as_bytes())
			.map_err(|e| CipherError::Encryption(format!("invalid HMAC key: {e}")))?;
		mac.update(plaintext.as_bytes());
		Ok(hex::encode(mac.finalize().into_bytes()))
	}

	/// Round-trip a fixed string. Logs at `warn` on anything but success and
	/// never fails.
	pub fn self_check(&self) -> SelfCheck {
		if !self.is_configured() {
			warn!("credential master key is not configured; credential linking is disabled");
			return SelfCheck::Unconfigured;
		}

		let outcome = self
			.encrypt(SELF_CHECK_PLAINTEXT)
			.and_then(|blob| self.decrypt(&blob));

		match outcome {
			Ok(value) if value.expose() == SELF_CHECK_PLAINTEXT => {
				debug!("credential cipher self-check passed");
				SelfCheck::Passed
			}
			Ok(_) => {
				warn!("credential cipher self-check returned a different value");
				SelfCheck::Failed("round-trip mismatch".to_string())
			}
			Err(e) => {
				warn!(error = %e, "credential cipher self-check failed");
				SelfCheck::Failed(e.to_string())
			}
		}
	}
}

fn decode_field(field: &str, name: &str, expected_len: Option<usize>) -> Result<Vec<u8>, CipherError> {
	let bytes =
		hex::decode(field).map_err(|_| CipherError::Malformed(format!("{name} is not valid hex")))?;
	if let Some(expected) = expected_len {
		if bytes.len() != expected {
			return Err(CipherError::Malformed(format!(
				"{name} must be {expected} bytes, got {}",
				bytes.len()
			)));
		}
	}
	Ok(bytes)
}
