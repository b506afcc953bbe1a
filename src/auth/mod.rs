pub mod callback;
pub mod email;
pub mod jar;
pub mod role_router;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ── PKCE helpers ──────────────────────────────────────────────

/// Generate a 64-char hex token from two UUIDs (244 random bits). Valid as a
/// PKCE code verifier: 43..=128 unreserved characters.
pub fn generate_code_verifier() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// S256 challenge for a verifier: `BASE64URL(SHA256(verifier))`, unpadded.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
