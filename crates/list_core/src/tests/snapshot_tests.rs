use super::*;

fn items(entries: &[(&str, bool)]) -> Vec<Item> {
    entries
        .iter()
        .map(|(id, status)| Item::new(*id, format!("item {id}"), *status))
        .collect()
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.item_id.as_str()).collect()
}

#[test]
fn derive_partitions_stably_and_exhaustively() {
    let input = items(&[
        ("a", false),
        ("b", true),
        ("c", false),
        ("d", true),
        ("e", false),
    ]);
    let snapshot = Snapshot::derive(&input);

    assert_eq!(ids(&snapshot.active), vec!["a", "c", "e"]);
    assert_eq!(ids(&snapshot.completed), vec!["b", "d"]);
    assert_eq!(snapshot.len(), input.len());
    assert!(snapshot
        .active
        .iter()
        .all(|item| !snapshot.completed.contains(item)));
}

#[test]
fn derive_holds_for_generated_sequences() {
    for mask in 0u32..64 {
        let input: Vec<Item> = (0..6)
            .map(|i| Item::new(format!("i{i}"), "x", mask & (1 << i) != 0))
            .collect();
        let snapshot = Snapshot::derive(&input);

        let expected_active: Vec<&Item> = input.iter().filter(|item| !item.status).collect();
        let expected_completed: Vec<&Item> = input.iter().filter(|item| item.status).collect();
        assert_eq!(snapshot.active.iter().collect::<Vec<_>>(), expected_active);
        assert_eq!(
            snapshot.completed.iter().collect::<Vec<_>>(),
            expected_completed
        );
    }
}

#[test]
fn fetch_items_keeps_order_and_unique_ids() {
    let mut input = items(&[("a", false), ("b", false), ("c", true)]);
    input.push(Item::new("a", "renamed", true));

    let indexed = fetch_items(input);
    let keys: Vec<&str> = indexed.keys().map(ItemId::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(indexed[&ItemId::from("a")].text, "renamed");
}

#[tokio::test]
async fn confirmed_refresh_replaces_tentative_written_before_fetch() {
    let store = SnapshotStore::new();
    let list_id = ListId::from("l");
    store
        .replace_confirmed(list_id.clone(), &items(&[("a", false), ("b", false)]), 0)
        .await;

    store
        .install_tentative(list_id.clone(), items(&[("b", false), ("a", false)]))
        .await;
    let began = store.revision().await;

    assert!(
        store
            .replace_confirmed(list_id.clone(), &items(&[("a", false), ("b", false)]), began)
            .await
    );
    let current = store.current().await;
    assert_eq!(current.provenance, Provenance::Confirmed);
    assert_eq!(ids(&current.active), vec!["a", "b"]);
}

#[tokio::test]
async fn stale_fetch_does_not_clobber_newer_tentative_order() {
    let store = SnapshotStore::new();
    let list_id = ListId::from("l");
    store
        .replace_confirmed(list_id.clone(), &items(&[("a", false), ("b", false)]), 0)
        .await;

    let began = store.revision().await;
    store
        .install_tentative(list_id.clone(), items(&[("b", false), ("a", false)]))
        .await;

    assert!(
        !store
            .replace_confirmed(list_id.clone(), &items(&[("a", false), ("b", false)]), began)
            .await
    );
    let current = store.current().await;
    assert!(current.is_tentative());
    assert_eq!(ids(&current.active), vec!["b", "a"]);
}

#[tokio::test]
async fn tentative_snapshot_keeps_completed_items() {
    let store = SnapshotStore::new();
    let list_id = ListId::from("l");
    store
        .replace_confirmed(list_id.clone(), &items(&[("a", false), ("z", true)]), 0)
        .await;
    store
        .install_tentative(list_id, items(&[("a", false)]))
        .await;

    assert_eq!(ids(&store.current().await.completed), vec!["z"]);
}

#[tokio::test]
async fn retarget_drops_items_of_the_previous_list() {
    let store = SnapshotStore::new();
    let groceries = ListId::from("g");
    let weekend = ListId::from("w");
    store
        .replace_confirmed(groceries.clone(), &items(&[("a", false), ("z", true)]), 0)
        .await;

    assert!(!store.retarget(&groceries).await);
    assert!(store.current().await.describes(&groceries));

    assert!(store.retarget(&weekend).await);
    let current = store.current().await;
    assert!(current.is_pending());
    assert!(current.is_empty());
    assert_eq!(current.list_id, Some(weekend.clone()));
    assert!(!current.describes(&weekend));
    assert!(!current.describes(&groceries));

    store
        .replace_confirmed(weekend.clone(), &items(&[("b", false)]), current.revision)
        .await;
    assert!(store.current().await.describes(&weekend));
}
