use anyhow::{Result, bail};
use campaign_engine::seed::label_digest;
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;

/// A resolved CLI seed and the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Set when the seed was hashed from a word rather than given as a number.
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        Self {
            seed: label_digest(&label),
            label: Some(label),
        }
    }
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts decimal integers (negatives use their magnitude), `0x` hex, and
/// plain words such as `battleground`, which hash to a stable seed.
/// Duplicates keep their first position; an empty list yields the default seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let info = if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            match u64::from_str_radix(hex, 16) {
                Ok(value) => SeedInfo::from_numeric(value),
                Err(_) => bail!("Unrecognized seed token: {token}"),
            }
        } else if token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            SeedInfo::from_label(token)
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_numbers_hex_and_words() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0x10", "Battleground"])).unwrap();
        assert_eq!(seeds[0], SeedInfo::from_numeric(42));
        assert_eq!(seeds[1], SeedInfo::from_numeric(7));
        assert_eq!(seeds[2], SeedInfo::from_numeric(16));
        assert_eq!(seeds[3].label.as_deref(), Some("battleground"));
        assert_eq!(seeds[3].seed, label_digest("battleground"));
    }

    #[test]
    fn dedupes_and_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", "5"])).unwrap();
        assert_eq!(seeds.len(), 1);
        let seeds = resolve_seed_inputs(&tokens(&["", " "])).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["two words"])).is_err());
    }
}
