use chrono::{TimeZone, Utc};
use optica_core::backup::{self, BackupFormatError, Collection, BACKUP_FORMAT_VERSION};
use optica_core::model::order::{Order, OrderStatus};
use optica_core::model::patient::{EyePrescription, Patient, Prescription};
use optica_core::persist::keys::{ORDERS_KEY, PATIENTS_KEY};
use optica_core::repo::kv_repo::{KeyValueStore, SqliteKeyValueStore};
use optica_core::service::{boot, ClinicService, ServiceError, Startup};
use optica_core::store::EntityStore;
use optica_core::{open_db_in_memory, TrialPolicy};
use proptest::prelude::*;

fn unlocked<S: KeyValueStore>(kv: S) -> ClinicService<S> {
    match boot(kv, TrialPolicy::default(), Utc::now()).unwrap() {
        Startup::Unlocked(service) => service,
        Startup::Locked(_) => panic!("fresh storage must start in trial"),
    }
}

fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,@+-]{0,12}"
}

fn eye() -> impl Strategy<Value = EyePrescription> {
    (text(), text(), text(), proptest::option::of(text())).prop_map(|(sph, cyl, axis, add)| {
        EyePrescription {
            sph,
            cyl,
            axis,
            add,
        }
    })
}

fn patient() -> impl Strategy<Value = Patient> {
    (
        "[a-z0-9]{1,8}",
        text(),
        text(),
        proptest::option::of(text()),
        proptest::option::of(text()),
        eye(),
        eye(),
    )
        .prop_map(|(id, name, phone, email, notes, od, oi)| {
            let mut patient = Patient::with_id(id, name, phone);
            patient.email = email;
            patient.notes = notes;
            patient.prescription = Prescription { od, oi };
            patient
        })
}

/// Any finite, non-negative amount, including ones whose shortest decimal
/// form parses back only with correctly rounded float parsing.
fn amount() -> impl Strategy<Value = f64> {
    prop_oneof![
        0.0f64..1.0e6,
        0.0f64..1.0e12,
        (0u64..=f64::MAX.to_bits())
            .prop_map(f64::from_bits)
            .prop_filter("finite", |value| value.is_finite()),
    ]
}

fn order() -> impl Strategy<Value = Order> {
    (
        "[a-z0-9]{1,8}",
        "[a-z0-9]{0,8}",
        amount(),
        proptest::sample::select(OrderStatus::ALL.to_vec()),
        any::<bool>(),
        text(),
    )
        .prop_map(|(id, patient_id, amount, status, is_paid, items)| {
            let mut order = Order::with_id(id, patient_id, items, amount);
            order.status = status;
            order.is_paid = is_paid;
            order
        })
}

proptest! {
    #[test]
    fn import_of_export_reproduces_the_store(
        patients in proptest::collection::vec(patient(), 0..6),
        orders in proptest::collection::vec(order(), 0..6),
    ) {
        let store = EntityStore::from_parts(patients, orders);
        let json = backup::export(&store, Utc::now()).to_json().unwrap();

        let snapshot = backup::import(&json).unwrap();

        prop_assert_eq!(EntityStore::from_parts(snapshot.patients, snapshot.orders), store);
    }
}

#[test]
fn amounts_keep_their_exact_bits_through_a_backup() {
    let amounts = [
        f64::from_bits(4_692_573_390_945_656_955),
        224_428_656_366.732_54,
        0.1 + 0.2,
        f64::MIN_POSITIVE,
    ];
    let orders = amounts
        .iter()
        .enumerate()
        .map(|(index, amount)| Order::with_id(format!("o{index}"), "p1", "", *amount))
        .collect();
    let store = EntityStore::from_parts(Vec::new(), orders);
    let json = backup::export(&store, Utc::now()).to_json().unwrap();

    let snapshot = backup::import(&json).unwrap();

    let bits: Vec<u64> = snapshot.orders.iter().map(|o| o.amount.to_bits()).collect();
    let expected: Vec<u64> = amounts.iter().map(|a| a.to_bits()).collect();
    assert_eq!(bits, expected);
}

#[test]
fn export_stamps_version_and_timestamp() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
    let snapshot = backup::export(&EntityStore::new(), now);

    assert_eq!(snapshot.version, BACKUP_FORMAT_VERSION);
    assert_eq!(snapshot.timestamp, "2024-03-09T14:30:00.000Z");
    assert_eq!(
        backup::backup_file_name(now.date_naive()),
        "optica_backup_2024-03-09.json"
    );
}

#[test]
fn import_accepts_legacy_document_with_extra_fields() {
    let raw = r#"{
        "version": "1.0",
        "exportedBy": "someone",
        "patients": [{"id": "p1", "name": "Ana", "phone": "555",
                      "registrationDate": "2023-01-01T00:00:00.000Z",
                      "prescription": {"od": {"sph": "-1.25", "cyl": "0.00", "axis": "0"},
                                       "oi": {"sph": "-1.00", "cyl": "-0.50", "axis": "90", "add": "+1.00"}}}],
        "orders": [{"id": "o1", "patientId": "p1", "date": "2023-01-02T00:00:00.000Z",
                    "amount": 45000, "status": "Listo para Retiro", "isPaid": true,
                    "items": "Gafas Graduadas"}]
    }"#;

    let snapshot = backup::import(raw).unwrap();

    assert_eq!(snapshot.timestamp, "");
    assert_eq!(snapshot.patients[0].prescription.oi.add.as_deref(), Some("+1.00"));
    assert_eq!(snapshot.orders[0].status, OrderStatus::Ready);
    assert!(snapshot.orders[0].is_paid);
}

#[test]
fn import_rejects_documents_without_arrays() {
    assert!(matches!(
        backup::import("not json"),
        Err(BackupFormatError::InvalidJson(_))
    ));
    assert!(matches!(
        backup::import("[]"),
        Err(BackupFormatError::NotAnObject)
    ));
    assert!(matches!(
        backup::import(r#"{"patients": []}"#),
        Err(BackupFormatError::MissingCollection(Collection::Orders))
    ));
    assert!(matches!(
        backup::import(r#"{"patients": {}, "orders": []}"#),
        Err(BackupFormatError::CollectionNotArray(Collection::Patients))
    ));
    assert!(matches!(
        backup::import(r#"{"patients": [], "orders": [{"id": "o1"}]}"#),
        Err(BackupFormatError::InvalidRecord { index: 0, .. })
    ));
    assert!(matches!(
        backup::import(
            r#"{"patients": [], "orders": [{"id": "o1", "patientId": "p", "amount": -5, "status": "Pendiente"}]}"#
        ),
        Err(BackupFormatError::RejectedRecord { index: 0, .. })
    ));
}

#[test]
fn rejected_import_leaves_memory_and_storage_untouched() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    let mut service = unlocked(kv);
    service.add_patient(Patient::with_id("p1", "Ana", "555")).unwrap();
    service.create_order(Order::with_id("o1", "p1", "", 10.0)).unwrap();

    let store_before = service.store().clone();
    let patients_before = kv.get(PATIENTS_KEY).unwrap();
    let orders_before = kv.get(ORDERS_KEY).unwrap();

    let raw = r#"{"patients": [{"id": "p2", "name": "Luis"}], "orders": "nope"}"#;
    let err = service.import_backup(raw).unwrap_err();

    assert!(matches!(err, ServiceError::Backup(_)));
    assert_eq!(service.store(), &store_before);
    assert_eq!(kv.get(PATIENTS_KEY).unwrap(), patients_before);
    assert_eq!(kv.get(ORDERS_KEY).unwrap(), orders_before);
}

#[test]
fn accepted_import_replaces_both_collections() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);
    let mut service = unlocked(kv);
    service.add_patient(Patient::with_id("p1", "Ana", "555")).unwrap();

    let mut source = EntityStore::new();
    source.add_patient(Patient::with_id("p7", "Marta", "999")).unwrap();
    source.create_order(Order::with_id("o7", "p7", "", 300.0)).unwrap();
    source.create_order(Order::with_id("o8", "ghost", "", 0.0)).unwrap();
    let raw = backup::export(&source, Utc::now()).to_json().unwrap();

    let preview = service.preview_import(&raw).unwrap();
    assert_eq!((preview.patient_count, preview.order_count), (1, 2));
    assert_eq!(service.store().patients()[0].id, "p1");

    let summary = service.import_backup(&raw).unwrap();

    assert_eq!(summary, preview);
    assert_eq!(service.store(), &source);
    let stored: Vec<Patient> =
        serde_json::from_str(&kv.get(PATIENTS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, source.patients());
    let stored: Vec<Order> = serde_json::from_str(&kv.get(ORDERS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, source.orders());
}
