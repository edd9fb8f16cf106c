use tracing::{error, trace, warn};

// For signature verification
use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";
const BRANCH_REF_PREFIX: &str = "refs/heads/";
pub const ELLIPSIS: &str = "...";

/// Helper function for verifying GitHub webhook signature.
///
/// An empty `secret` disables verification entirely. Every other failure
/// (missing prefix, bad hex, wrong digest) yields `false`.
pub fn verify_github_signature(secret: &str, payload: &[u8], signature_header: &str) -> bool {
    if secret.is_empty() {
        warn!("GitHub webhook secret not configured. Skipping signature verification.");
        return true;
    }

    // Expected format: "sha256=..."
    let Some(git_signature) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
        error!("Invalid signature format");
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Error verifying GitHub signature: {}", e);
            return false;
        }
    };
    mac.update(payload);

    // GitHub provides the signature as hex
    match hex_decode(git_signature) {
        // Constant-time comparison
        Ok(git_signature_bytes) => mac.verify_slice(&git_signature_bytes).is_ok(),
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", git_signature);
            false
        }
    }
}

/// Shortens `text` to at most `max_chars` characters, replacing the tail with
/// [`ELLIPSIS`] when something had to be cut.
///
/// Counts chars, not bytes, so multi-byte characters are never split. A
/// trailing lone backslash is dropped so the ellipsis isn't escaped by it.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();

    let trailing_backslashes = truncated.chars().rev().take_while(|c| *c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        truncated.pop();
    }

    truncated.push_str(ELLIPSIS);
    truncated
}

/// Hard cap on character count, without any marker.
pub fn cap_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Capitalizes the first letter of every word and lowercases the rest, where
/// any non-alphabetic character starts a new word (`ready_for_review` becomes
/// `Ready_For_Review`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}

/// Branch name from a git ref: `refs/heads/main` becomes `main`, anything
/// else is returned unchanged.
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(git_ref)
}
