use super::*;
use shared::domain::ListType;

fn list(id: &str, title: &str) -> ListSummary {
    ListSummary {
        list_id: ListId::from(id),
        title: title.to_string(),
        list_type: ListType::Shopping,
        items: vec![Item::new(format!("{id}-1"), "Milk", false)],
    }
}

fn host(lists: &[ListSummary]) -> HostState {
    HostState::from_lists(DEFAULT_LISTS_SENSOR, lists)
}

#[test]
fn first_load_selects_the_first_list_exactly_once() {
    let mut directory = ListDirectory::default();
    let state = host(&[list("g", "Groceries"), list("t", "Chores")]);

    directory.load_lists(Some(&state));
    directory.load_lists(Some(&state));

    assert_eq!(directory.current_id(), Some(&ListId::from("g")));
    assert_eq!(directory.selection_changes(), 1);
}

#[test]
fn missing_source_keeps_prior_lists() {
    let mut directory = ListDirectory::default();
    directory.load_lists(Some(&host(&[list("g", "Groceries")])));

    assert_eq!(directory.load_lists(None).len(), 1);
    assert_eq!(directory.load_lists(Some(&HostState::new())).len(), 1);
    assert_eq!(directory.current_id(), Some(&ListId::from("g")));
}

#[test]
fn empty_list_set_leaves_nothing_selected() {
    let mut directory = ListDirectory::default();
    directory.load_lists(Some(&host(&[])));

    assert!(directory.lists().is_empty());
    assert!(directory.current().is_none());
}

#[test]
fn select_out_of_range_is_a_no_op() {
    let mut directory = ListDirectory::default();
    directory.load_lists(Some(&host(&[list("g", "Groceries"), list("t", "Chores")])));

    assert!(!directory.select_list(7));
    assert_eq!(directory.current_index(), Some(0));

    assert!(directory.select_list(1));
    assert_eq!(directory.current().map(|l| l.title.as_str()), Some("Chores"));
    assert!(!directory.select_list(1));
}

#[test]
fn selection_survives_reload_and_falls_back_when_list_disappears() {
    let mut directory = ListDirectory::default();
    directory.load_lists(Some(&host(&[list("g", "Groceries"), list("t", "Chores")])));
    directory.select_list(1);

    directory.load_lists(Some(&host(&[list("t", "Chores"), list("g", "Groceries")])));
    assert_eq!(directory.current_id(), Some(&ListId::from("t")));

    directory.load_lists(Some(&host(&[list("g", "Groceries")])));
    assert_eq!(directory.current_id(), Some(&ListId::from("g")));
}

#[test]
fn custom_sensor_entity_is_honored() {
    let mut directory = ListDirectory::new("sensor.other_lists");
    directory.load_lists(Some(&host(&[list("g", "Groceries")])));
    assert!(directory.lists().is_empty());

    let state = HostState::from_lists("sensor.other_lists", &[list("g", "Groceries")]);
    directory.load_lists(Some(&state));
    assert_eq!(directory.lists().len(), 1);
}
