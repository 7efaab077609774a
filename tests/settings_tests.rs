// Persisted settings document behavior

use luach::settings::SettingsStore;
use tempfile::tempdir;

#[test]
fn updating_one_field_leaves_the_rest_unchanged() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("config.json"));

    store
        .update(|s| {
            s.personal = "me@example.com".to_string();
            s.business = "work@example.com".to_string();
            s.hebrew_date_language = "hebrew".to_string();
        })
        .unwrap();

    // Posting a new air-quality token touches only that key.
    store
        .update(|s| s.waqi_token = "waqi-123".to_string())
        .unwrap();

    let settings = store.load();
    assert_eq!(settings.waqi_token, "waqi-123");
    assert_eq!(settings.personal, "me@example.com");
    assert_eq!(settings.business, "work@example.com");
    assert_eq!(settings.hebrew_date_language, "hebrew");
}

#[test]
fn persisted_document_survives_a_new_store_instance() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    SettingsStore::new(path.clone())
        .update(|s| s.waqi_token = "tok".to_string())
        .unwrap();

    let reopened = SettingsStore::new(path);
    assert_eq!(reopened.load().waqi_token, "tok");
}
