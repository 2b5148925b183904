//! Persisted favorites end to end, on real files under a temp
//! directory.

use serde_json::json;

use bloomcart_client::{FavoritesStore, FileKv, KvStore};
use bloomcart_core::{FavoriteRecord, OwnerId, RawProduct};

fn open_kv(dir: &std::path::Path) -> Box<dyn KvStore> {
    Box::new(FileKv::open(dir).expect("storage dir opens"))
}

fn rose() -> RawProduct {
    serde_json::from_value(json!({
        "id": "p1",
        "name": "Rose bouquet",
        "price": 23
    }))
    .expect("raw product deserializes")
}

fn read_snapshot(dir: &std::path::Path, owner: &str) -> String {
    std::fs::read_to_string(dir.join(format!("favorites_{owner}.json")))
        .expect("snapshot file exists")
}

// =============================================================================
// Toggle scenario
// =============================================================================

#[test]
fn toggle_writes_and_clears_the_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());

    let on = store.toggle(&rose()).expect("usable product");
    assert!(on.is_favorite && on.persisted);
    assert!(store.is_favorite("p1"));

    let records: Vec<FavoriteRecord> =
        serde_json::from_str(&read_snapshot(dir.path(), "guest")).expect("snapshot parses");
    assert_eq!(records.len(), 1);
    assert_eq!(records.first().map(|r| r.id.as_str()), Some("p1"));
    assert_eq!(records.first().map(|r| r.name.as_str()), Some("Rose bouquet"));

    let off = store.toggle(&rose()).expect("usable product");
    assert!(!off.is_favorite);
    assert_eq!(read_snapshot(dir.path(), "guest"), "[]");
    assert_eq!(store.list().len(), 0);
}

#[test]
fn favorites_survive_a_reload() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let store = FavoritesStore::load(open_kv(dir.path()), OwnerId::new("u-1"));
        store.toggle(&rose()).expect("usable product");
    }

    let reloaded = FavoritesStore::load(open_kv(dir.path()), OwnerId::new("u-1"));
    assert!(reloaded.is_favorite("p1"));

    let records = reloaded.list();
    let record = records.first().expect("one record");
    assert_eq!(record.name, "Rose bouquet");
    assert_eq!(record.price.display(), "$23.00");
    assert_eq!(record.owner_id, OwnerId::new("u-1"));
}

#[test]
fn switching_owners_switches_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");

    let guest = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());
    guest.toggle(&rose()).expect("usable product");

    let user = FavoritesStore::load(open_kv(dir.path()), OwnerId::new("u-1"));
    assert!(!user.is_favorite("p1"));

    // the guest snapshot is untouched by the other owner's session
    let back = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());
    assert!(back.is_favorite("p1"));
}

// =============================================================================
// Corrupt storage recovery
// =============================================================================

#[test]
fn corrupt_snapshot_on_disk_degrades_to_empty_and_heals() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("favorites_guest.json"),
        r#"{"definitely": "not an array"}"#,
    )
    .expect("seed corrupt snapshot");

    let store = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());
    assert_eq!(store.list().len(), 0);
    assert_eq!(read_snapshot(dir.path(), "guest"), "[]");

    // the healed store is fully usable
    store.toggle(&rose()).expect("usable product");
    assert!(store.is_favorite("p1"));
}

#[test]
fn truncated_snapshot_on_disk_degrades_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("favorites_guest.json"), r#"[{"id": "p1""#)
        .expect("seed truncated snapshot");

    let store = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());
    assert_eq!(store.list().len(), 0);
    assert_eq!(read_snapshot(dir.path(), "guest"), "[]");
}

// =============================================================================
// Normalization across heterogeneous shapes
// =============================================================================

#[test]
fn legacy_and_modern_shapes_land_in_one_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FavoritesStore::load(open_kv(dir.path()), OwnerId::guest());

    let modern: RawProduct = serde_json::from_value(json!({
        "id": "p1",
        "image": "rose.jpg"
    }))
    .expect("deserializes");
    let legacy_same_product: RawProduct = serde_json::from_value(json!({
        "_id": "p1",
        "images": [{"image": "rose.jpg"}]
    }))
    .expect("deserializes");

    store.add(&modern).expect("usable product");
    let second = store.add(&legacy_same_product).expect("usable product");
    assert!(!second.changed, "same id via _id must deduplicate");
    assert_eq!(store.list().len(), 1);
}
