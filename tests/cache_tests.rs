// TTL cache behavior - testing only public APIs

use luach::cache::TtlCache;
use serde_json::json;
use std::time::Duration;

#[test]
fn get_after_set_returns_value_within_ttl() {
    let cache = TtlCache::new();
    cache.set("weather:31.768,35.214", json!({"temp": 30.1}), 60);

    assert_eq!(
        cache.get("weather:31.768,35.214"),
        Some(json!({"temp": 30.1}))
    );
}

#[test]
fn get_after_wall_clock_passes_expiry_is_a_miss() {
    let cache = TtlCache::new();
    cache.set("shabbat", json!({"parsha": "Va'etchanan"}), 1);
    assert!(cache.get("shabbat").is_some());

    std::thread::sleep(Duration::from_millis(1100));

    assert_eq!(cache.get("shabbat"), None);
    // Expired entries are not removed proactively.
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidate_removes_exactly_the_literal_prefix() {
    let cache = TtlCache::new();
    cache.set("emails:combined", json!([1]), 60);
    cache.set("emails:a@b.com", json!([2]), 60);
    cache.set("cal:combined:2026-08-04", json!({}), 60);
    cache.set("calweek:combined:2026-08-02", json!({}), 60);

    cache.invalidate("cal:");

    assert!(cache.get("emails:combined").is_some());
    assert!(cache.get("emails:a@b.com").is_some());
    assert_eq!(cache.get("cal:combined:2026-08-04"), None);
    // "calweek:" keys do not carry the literal "cal:" prefix.
    assert!(cache.get("calweek:combined:2026-08-02").is_some());
}

#[test]
fn last_write_wins_for_the_same_key() {
    let cache = TtlCache::new();
    cache.set("news:israel", json!(["old"]), 60);
    cache.set("news:israel", json!(["new"]), 60);

    assert_eq!(cache.get("news:israel"), Some(json!(["new"])));
    assert_eq!(cache.len(), 1);
}
