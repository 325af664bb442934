use optica_core::model::order::{Order, OrderStatus};
use optica_core::model::patient::Patient;
use optica_core::store::{EntityStore, MutationOutcome, PatientRef};
use optica_core::RecordValidationError;
use proptest::prelude::*;

fn seeded_store() -> EntityStore {
    let mut store = EntityStore::new();
    store.add_patient(Patient::with_id("p1", "Ana Diaz", "555-0101")).unwrap();
    store.add_patient(Patient::with_id("p2", "Luis Mba", "555-0202")).unwrap();
    store.create_order(Order::with_id("o1", "p1", "", 45_000.0)).unwrap();
    store.create_order(Order::with_id("o2", "p2", "Lentes de contacto", 12_000.0)).unwrap();
    store
}

#[test]
fn end_to_end_orders_survive_patient_deletion() {
    let mut store = EntityStore::new();
    store.add_patient(Patient::with_id("p1", "Ana", "555")).unwrap();
    store.create_order(Order::with_id("o1", "p1", "", 100.0)).unwrap();

    assert_eq!(
        store.update_order_status("o1", OrderStatus::Ready),
        MutationOutcome::Applied
    );
    assert_eq!(store.delete_patient("p1"), MutationOutcome::Applied);

    assert!(store.patients().is_empty());
    assert_eq!(store.orders().len(), 1);
    let order = &store.orders()[0];
    assert_eq!(order.patient_id, "p1");
    assert_eq!(order.status, OrderStatus::Ready);
    assert_eq!(store.patient_for_order(order), PatientRef::Unknown);
    assert_eq!(store.orphaned_orders().len(), 1);
}

#[test]
fn unknown_ids_are_silent_no_ops() {
    let mut store = seeded_store();
    let before = store.clone();

    assert_eq!(store.delete_patient("nope"), MutationOutcome::NoMatch);
    assert_eq!(store.delete_order("nope"), MutationOutcome::NoMatch);
    assert_eq!(
        store.update_order_status("nope", OrderStatus::Cancelled),
        MutationOutcome::NoMatch
    );
    assert_eq!(
        store.update_patient(Patient::with_id("nope", "X", "0")).unwrap(),
        MutationOutcome::NoMatch
    );
    assert_eq!(
        store.update_order(Order::with_id("nope", "p1", "", 1.0)).unwrap(),
        MutationOutcome::NoMatch
    );

    assert_eq!(store, before);
}

#[test]
fn status_update_touches_only_status() {
    let mut store = seeded_store();
    let before = store.order("o1").unwrap().clone();

    store.update_order_status("o1", OrderStatus::InProgress);

    let after = store.order("o1").unwrap();
    assert_eq!(after.status, OrderStatus::InProgress);
    assert_eq!(
        Order {
            status: before.status,
            ..after.clone()
        },
        before
    );
    assert_eq!(store.order("o2").unwrap().status, OrderStatus::Pending);
}

#[test]
fn delete_patient_keeps_other_collections_intact() {
    let mut store = seeded_store();
    let orders_before = store.orders().to_vec();

    store.delete_patient("p2");

    assert_eq!(store.orders(), orders_before.as_slice());
    assert!(store.patient("p1").is_some());
    assert!(store.patient("p2").is_none());
}

#[test]
fn negative_amount_is_rejected_before_mutation() {
    let mut store = seeded_store();
    let before = store.clone();

    let err = store
        .create_order(Order::with_id("o3", "p1", "", -1.0))
        .unwrap_err();
    assert!(matches!(err, RecordValidationError::NegativeAmount { .. }));
    assert_eq!(store, before);
}

#[test]
fn search_matches_name_case_insensitively_or_phone() {
    let store = seeded_store();

    let by_name: Vec<_> = store.search_patients("ana").iter().map(|p| p.id.clone()).collect();
    assert_eq!(by_name, vec!["p1"]);

    let by_phone: Vec<_> = store.search_patients("0202").iter().map(|p| p.id.clone()).collect();
    assert_eq!(by_phone, vec!["p2"]);

    assert_eq!(store.search_patients("").len(), 2);
}

#[test]
fn orders_for_patient_follow_insertion_order() {
    let mut store = seeded_store();
    store.create_order(Order::with_id("o3", "p1", "", 5.0)).unwrap();

    let ids: Vec<_> = store
        .orders_for_patient("p1")
        .into_iter()
        .map(|o| o.id.clone())
        .collect();
    assert_eq!(ids, vec!["o1", "o3"]);
}

proptest! {
    #[test]
    fn replacing_a_patient_twice_equals_replacing_once(
        name in "[A-Za-z ]{1,16}",
        phone in "[0-9]{3,9}",
    ) {
        let replacement = Patient::with_id("p1", name, phone);

        let mut once = seeded_store();
        once.update_patient(replacement.clone()).unwrap();

        let mut twice = once.clone();
        twice.update_patient(replacement).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn replacing_an_order_twice_equals_replacing_once(amount in 0u32..1_000_000) {
        let replacement = Order::with_id("o2", "p2", "Montura", f64::from(amount));

        let mut once = seeded_store();
        once.update_order(replacement.clone()).unwrap();

        let mut twice = once.clone();
        twice.update_order(replacement).unwrap();

        prop_assert_eq!(once, twice);
    }
}
