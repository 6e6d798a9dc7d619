use garage_core::model::validation::NAME_TOO_SHORT;
use garage_core::{IdPolicy, JsonFileUserStore, RecordStore, RepoError, User, UserPatch};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn open_store(dir: &Path) -> JsonFileUserStore {
    JsonFileUserStore::open(dir.join("users.json"), IdPolicy::MaxPlusOne).unwrap()
}

fn sample(name: &str) -> User {
    User::new(name, format!("{name}@example.com"), "secret", "Kazan")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn list_on_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    assert!(store.list().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn list_on_empty_or_malformed_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    for contents in ["", "   \n", "{not json", "{\"id\": 1}", "\"text\"", "[1, 2]"] {
        fs::write(store.path(), contents).unwrap();
        assert!(
            store.list().unwrap().is_empty(),
            "expected empty list for {contents:?}"
        );
    }
}

#[test]
fn unreadable_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::create_dir(store.path()).unwrap();

    let err = store.list().unwrap_err();
    assert!(matches!(err, RepoError::Io { .. }), "unexpected error: {err}");
}

#[test]
fn create_assigns_sequential_ids_starting_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let first = store.create(&sample("Anna")).unwrap();
    let second = store.create(&sample("Boris")).unwrap();
    let third = store.create(&sample("Vera")).unwrap();

    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));
    assert_eq!(third.id, Some(3));

    let names: Vec<String> = store.list().unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(names, ["Anna", "Boris", "Vera"]);
}

#[test]
fn create_continues_after_last_stored_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(
        store.path(),
        r#"[{"name": "Legacy", "id": 41}, {"name": "Older", "id": "7"}]"#,
    )
    .unwrap();

    let max_based = store.create(&sample("Newcomer")).unwrap();
    assert_eq!(max_based.id, Some(42));

    let last_based = JsonFileUserStore::open(store.path(), IdPolicy::LastPlusOne).unwrap();
    assert_eq!(last_based.create(&sample("Second")).unwrap().id, Some(43));
}

#[test]
fn last_plus_one_policy_follows_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileUserStore::open(dir.path().join("users.json"), IdPolicy::LastPlusOne)
        .unwrap();
    fs::write(store.path(), r#"[{"name": "High", "id": 9}, {"name": "Low", "id": 3}]"#).unwrap();

    assert_eq!(store.create(&sample("Next")).unwrap().id, Some(4));
}

#[test]
fn create_writes_pretty_unescaped_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    store
        .create(&User::new("Алексей", "a@example.com", "pw", "Москва"))
        .unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.starts_with("[\n    {\n"));
    assert!(text.contains("\"name\": \"Алексей\""));
    assert!(text.contains("\"passwordConfirmation\": \"pw\""));
    assert!(text.contains("\"id\": 1"));
    assert!(!text.contains("\\u"));
}

#[test]
fn get_matches_numeric_and_string_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(
        store.path(),
        r#"[{"name": "Numeric", "id": 1}, {"name": "Stringy", "id": "2"}]"#,
    )
    .unwrap();

    assert_eq!(store.get(1).unwrap().unwrap().name, "Numeric");
    assert_eq!(store.get(2).unwrap().unwrap().name, "Stringy");
    assert!(store.get(3).unwrap().is_none());
}

#[test]
fn invalid_user_is_rejected_and_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.create(&sample("Anna")).unwrap();
    let before = fs::read(store.path()).unwrap();

    let err = store.create(&sample("Bo")).unwrap_err();
    match err {
        RepoError::Validation(errors) => assert_eq!(errors.get("name"), Some(NAME_TOO_SHORT)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read(store.path()).unwrap(), before);

    // The lock was released: a later write still succeeds.
    assert_eq!(store.create(&sample("Boris")).unwrap().id, Some(2));
}

#[test]
fn update_changes_only_name_of_matching_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(
        store.path(),
        r#"[
            {"name": "Anna", "email": "anna@example.com", "password": "a1",
             "passwordConfirmation": "a1", "city": "Omsk", "id": 1},
            {"name": "Boris", "email": "boris@example.com", "password": "b2",
             "passwordConfirmation": "b2", "city": "Tver", "id": 2, "nickname": "bob"}
        ]"#,
    )
    .unwrap();
    let before = read_json(store.path());

    let updated = store.update(1, &UserPatch::name("Annushka")).unwrap().unwrap();
    assert_eq!(updated.name, "Annushka");
    assert_eq!(updated.email, "anna@example.com");

    let after = read_json(store.path());
    assert_eq!(after[0]["name"], json!("Annushka"));
    assert_eq!(after[0]["email"], before[0]["email"]);
    assert_eq!(after[0]["city"], before[0]["city"]);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[1]["nickname"], json!("bob"));
}

#[test]
fn update_leaves_other_records_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.create(&sample("Anna")).unwrap();
    store.create(&sample("Boris")).unwrap();

    let before: Vec<String> = serialized_records(store.path());
    store.update(2, &UserPatch::name("Borislav")).unwrap();
    let after: Vec<String> = serialized_records(store.path());

    assert_eq!(after[0], before[0]);
    assert_ne!(after[1], before[1]);
}

#[test]
fn update_missing_or_invalid_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.create(&sample("Anna")).unwrap();
    let before = fs::read(store.path()).unwrap();

    assert!(store.update(5, &UserPatch::name("Nobody")).unwrap().is_none());
    assert!(matches!(
        store.update(1, &UserPatch::name("An")),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn delete_missing_id_leaves_collection_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.create(&sample("Anna")).unwrap();
    store.create(&sample("Boris")).unwrap();
    let before = fs::read(store.path()).unwrap();

    assert!(!store.delete(99).unwrap());
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn delete_removes_matching_record_and_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    for name in ["Anna", "Boris", "Vera"] {
        store.create(&sample(name)).unwrap();
    }

    assert!(store.delete(2).unwrap());

    let remaining: Vec<(Option<i64>, String)> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|user| (user.id, user.name))
        .collect();
    assert_eq!(
        remaining,
        vec![(Some(1), "Anna".to_string()), (Some(3), "Vera".to_string())]
    );
}

#[test]
fn delete_on_missing_file_does_not_create_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    assert!(!store.delete(1).unwrap());
    assert!(!store.path().exists());
}

#[test]
fn save_routes_by_id_presence() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let mut user = sample("Anna");
    store.save(&mut user).unwrap();
    assert_eq!(user.id, Some(1));

    user.city = "Samara".to_string();
    store.save(&mut user).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(store.get(1).unwrap().unwrap().city, "Samara");

    let mut ghost = sample("Ghost");
    ghost.id = Some(50);
    store.save(&mut ghost).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn malformed_file_is_replaced_on_next_create() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(store.path(), "garbage").unwrap();

    let created = store.create(&sample("Anna")).unwrap();
    assert_eq!(created.id, Some(1));
    assert_eq!(read_json(store.path()).as_array().unwrap().len(), 1);
}

#[test]
fn odd_field_types_do_not_hide_other_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(
        store.path(),
        r#"[
    {"name": 1234, "email": "a@example.com", "city": null, "id": 1},
    {"name": "Boris", "email": "b@example.com", "city": "Omsk", "id": 2}
]"#,
    )
    .unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "1234");
    assert_eq!(listed[0].city, "");

    let created = store.create(&sample("Vera")).unwrap();
    assert_eq!(created.id, Some(3));

    let stored = read_json(store.path());
    let records = stored.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["id"], json!(1));
    assert_eq!(records[1]["name"], json!("Boris"));
    assert_eq!(records[1]["city"], json!("Omsk"));
}

#[test]
fn unreadable_id_survives_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    fs::write(store.path(), r#"[{"name": "Anna", "id": 1.5}]"#).unwrap();

    let created = store.create(&sample("Boris")).unwrap();
    assert_eq!(created.id, Some(1));

    let stored = read_json(store.path());
    assert_eq!(stored[0]["name"], json!("Anna"));
    assert_eq!(stored[0]["id"], json!(1.5));
    assert_eq!(stored[1]["id"], json!(1));
}

#[test]
fn exhausted_ids_fail_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let contents = format!(r#"[{{"name": "Anna", "id": {}}}]"#, i64::MAX);
    fs::write(store.path(), &contents).unwrap();

    let err = store.create(&sample("Boris")).unwrap_err();
    assert!(
        matches!(err, RepoError::IdsExhausted { .. }),
        "unexpected error: {err}"
    );
    assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
}

/// Re-serializes each stored object on its own so records can be compared.
fn serialized_records(path: &Path) -> Vec<String> {
    read_json(path)
        .as_array()
        .unwrap()
        .iter()
        .map(|record| serde_json::to_string(record).unwrap())
        .collect()
}
