//! Session name policies.
//!
//! Concurrent invocations share the tmux server, so every run needs a name
//! nobody else will pick. The default combines the process id with a random
//! suffix (e.g. `usagesnap-4242-k3x9qa`).

use rand::RngExt;

/// Characters used for the random suffix (valid in tmux session names)
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix
const SUFFIX_LEN: usize = 6;

/// Produces identifiers for ephemeral sessions
pub trait NamePolicy {
    /// Next session name; must match `^[A-Za-z0-9_-]+$`
    fn next_name(&self) -> String;
}

/// `<prefix>-<pid>-<random>` names
#[derive(Debug, Clone)]
pub struct PidRandomNames {
    prefix: String,
}

impl PidRandomNames {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: sanitize_prefix(prefix),
        }
    }
}

impl Default for PidRandomNames {
    fn default() -> Self {
        Self::new("usagesnap")
    }
}

impl NamePolicy for PidRandomNames {
    fn next_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.prefix,
            std::process::id(),
            random_suffix(SUFFIX_LEN)
        )
    }
}

/// Generates `len` random lowercase alphanumerics
fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Replace characters tmux would reject or reinterpret (`.`, `:`, spaces)
fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "usagesnap".to_string()
    } else {
        cleaned
    }
}
