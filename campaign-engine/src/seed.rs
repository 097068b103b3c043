//! Deterministic string-seeded randomness.
//!
//! Every simulated outcome is derived from a seed string rather than a live
//! RNG, so an action can be replayed or audited from its seed alone. The
//! uniform generator hashes the string to a 32-bit integer, feeds it through
//! `sin`, and keeps the fractional part.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::f64::consts::PI;
use std::hash::Hasher;
use twox_hash::XxHash64;

const SEED_HEX_LEN: usize = 16;
const GAUSSIAN_U1_FLOOR: f64 = 1e-12;

/// 32-bit string hash over UTF-16 code units (`h = h * 31 + unit`, wrapping).
#[must_use]
pub fn hash_seed(seed: &str) -> i32 {
    seed.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Uniform value in `[0, 1)` derived purely from `seed`.
#[must_use]
pub fn seeded_random(seed: &str) -> f64 {
    let x = f64::from(hash_seed(seed)).sin() * 10_000.0;
    x - x.floor()
}

/// Normal deviate via Box–Muller over `seed` and `seed + "-2"`.
#[must_use]
pub fn seeded_gaussian(seed: &str, mean: f64, std_dev: f64) -> f64 {
    let u1 = seeded_random(seed).max(GAUSSIAN_U1_FLOOR);
    let u2 = seeded_random(&format!("{seed}-2"));
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + z * std_dev
}

/// Uniform value in `[-span/2, span/2)` derived from `seed`.
#[must_use]
pub fn seeded_jitter(seed: &str, span: f64) -> f64 {
    (seeded_random(seed) - 0.5) * span
}

/// Stable action seed derived from `(campaign, action, timestamp)`.
#[must_use]
pub fn derive_action_seed(campaign_id: &str, action_key: &str, at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(campaign_id.as_bytes());
    hasher.update(b":");
    hasher.update(action_key.as_bytes());
    hasher.update(b":");
    hasher.update(at.timestamp_millis().to_le_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(SEED_HEX_LEN);
    for byte in digest.iter().take(SEED_HEX_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// 64-bit digest of a label, used for ids and RNG stream seeds.
#[must_use]
pub fn label_digest(label: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(label.as_bytes());
    hasher.finish()
}

/// Stable identifier for an action initiated at `at`.
#[must_use]
pub fn derive_action_id(campaign_id: &str, action_key: &str, at: DateTime<Utc>) -> String {
    let digest = label_digest(&format!(
        "{campaign_id}|{action_key}|{}",
        at.timestamp_millis()
    ));
    format!("act-{digest:016x}")
}

/// Independent `ChaCha20Rng` stream keyed by a label.
#[must_use]
pub fn seeded_rng(label: &str) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(label_digest(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::Rng;

    #[test]
    fn hash_matches_java_style_string_hash() {
        assert_eq!(hash_seed(""), 0);
        assert_eq!(hash_seed("a"), 97);
        assert_eq!(hash_seed("ab"), 97 * 31 + 98);
        // Wraps instead of overflowing.
        let long = "x".repeat(64);
        let _ = hash_seed(&long);
    }

    #[test]
    fn uniform_is_deterministic_and_in_range() {
        for seed in ["s1", "s1-poll", "campaign-42", "", "ünïcode"] {
            let value = seeded_random(seed);
            assert!((0.0..1.0).contains(&value), "{seed} -> {value}");
            assert!((value - seeded_random(seed)).abs() < f64::EPSILON);
        }
        assert!((seeded_random("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gaussian_is_deterministic_and_scales() {
        let a = seeded_gaussian("s1-poll", 2.0, 0.5);
        let b = seeded_gaussian("s1-poll", 2.0, 0.5);
        assert!((a - b).abs() < f64::EPSILON);
        let flat = seeded_gaussian("s1-poll", 2.0, 0.0);
        assert!((flat - 2.0).abs() < f64::EPSILON);
        assert!(a.is_finite());
    }

    #[test]
    fn jitter_stays_within_span() {
        for i in 0..200 {
            let value = seeded_jitter(&format!("j-{i}"), 5.0);
            assert!((-2.5..2.5).contains(&value));
        }
    }

    #[test]
    fn derived_seeds_and_ids_are_stable() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let seed = derive_action_seed("camp-1", "tv_ad_national", at);
        assert_eq!(seed.len(), SEED_HEX_LEN);
        assert_eq!(seed, derive_action_seed("camp-1", "tv_ad_national", at));
        assert_ne!(seed, derive_action_seed("camp-2", "tv_ad_national", at));
        let id = derive_action_id("camp-1", "tv_ad_national", at);
        assert!(id.starts_with("act-"));
        assert_eq!(id, derive_action_id("camp-1", "tv_ad_national", at));
    }

    #[test]
    fn rng_streams_repeat_for_same_label() {
        let mut a = seeded_rng("poll-national");
        let mut b = seeded_rng("poll-national");
        let xs: Vec<u32> = (0..4).map(|_| a.r#gen()).collect();
        let ys: Vec<u32> = (0..4).map(|_| b.r#gen()).collect();
        assert_eq!(xs, ys);
    }
}
