//! JSON round trips for the serializable config and stats types.
#![cfg(feature = "serde")]

use linebloom::{BackendKind, CacheBloomFilter, CacheStats, FilterParameters, RetryPolicy};

#[test]
fn test_parameters_round_trip() {
    let params = FilterParameters::derive(1000, 0.01).unwrap();
    let json = serde_json::to_string(&params).unwrap();
    let back: FilterParameters = serde_json::from_str(&json).unwrap();
    assert_eq!(params, back);
    assert!(json.contains("\"bit_count\":9728"));
}

#[test]
fn test_stats_round_trip() {
    let filter = CacheBloomFilter::new(1000, 0.01).unwrap();
    filter.add_str("apple");
    let stats = filter.stats();
    let json = serde_json::to_string(&stats).unwrap();
    let back: CacheStats = serde_json::from_str(&json).unwrap();
    assert_eq!(stats, back);
}

#[test]
fn test_retry_policy_from_config() {
    let policy: RetryPolicy =
        serde_json::from_str(r#"{"fast_retries":8,"max_backoff_exponent":4}"#).unwrap();
    assert_eq!(policy, RetryPolicy::new(8, 4).unwrap());
}

#[test]
fn test_backend_kind_names() {
    for kind in BackendKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        let back: BackendKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }
}
