use serde_json::json;
use terras_core::db::{entity_counts, open_db_in_memory};
use terras_core::service::location_resolver::ensure_home_country;
use terras_core::service::reconciler::{LandAction, RecordError, SkipReason};
use terras_core::{ReconcileOptions, RecordReconciler, SqliteGeoRepository};

#[test]
fn reconcile_creates_then_skips_the_same_record() {
    let conn = open_db_in_memory().unwrap();
    ensure_home_country(&SqliteGeoRepository::new(&conn)).unwrap();
    let reconciler = RecordReconciler::sqlite(&conn, ReconcileOptions::default());
    let record = json!({
        "id": 4184,
        "nome_ti": "Acapuri de Cima",
        "municipio": [
            {"nome_municipio": "Fonte Boa", "uf": "AM"},
            {"nome_municipio": "Jutaí", "uf": "AM"}
        ],
        "povo": {"data": [{"povo": "Kokama"}, {"povo": "KOKAMA"}]}
    });

    let first = reconciler.reconcile(&record).unwrap();
    let second = reconciler.reconcile(&record).unwrap();

    assert!(matches!(first.action, LandAction::Created(_)));
    assert!(first.municipality_created);
    assert_eq!(first.communities_created, 1);
    assert_eq!(second.action, LandAction::Skipped(SkipReason::AlreadyImported));
    assert!(!second.municipality_created);

    // Only the first location is used; duplicate community names link once.
    let counts = entity_counts(&conn).unwrap();
    assert_eq!(counts.municipalities, 1);
    assert_eq!(counts.communities, 1);
    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM land_communities;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(links, 1);
}

#[test]
fn reconcile_update_mode_keeps_land_identity() {
    let conn = open_db_in_memory().unwrap();
    ensure_home_country(&SqliteGeoRepository::new(&conn)).unwrap();
    let record = json!({"id": "17", "nome_ti": "Old Name"});
    let created = RecordReconciler::sqlite(&conn, ReconcileOptions::default())
        .reconcile(&record)
        .unwrap();

    let options = ReconcileOptions {
        update_existing: true,
        ..ReconcileOptions::default()
    };
    let updated = RecordReconciler::sqlite(&conn, options)
        .reconcile(&json!({"id": 17, "nome_ti": "New Name"}))
        .unwrap();

    let LandAction::Created(created_id) = created.action else {
        panic!("expected creation, got {:?}", created.action);
    };
    assert_eq!(updated.action, LandAction::Updated(created_id));
}

#[test]
fn reconcile_skips_blank_identity_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let reconciler = RecordReconciler::sqlite(&conn, ReconcileOptions::default());

    for record in [
        json!({"id": 1, "nome_ti": "   "}),
        json!({"id": "", "nome_ti": "Blank Id"}),
        json!({"id": null, "nome_ti": "Null Id"}),
    ] {
        let outcome = reconciler.reconcile(&record).unwrap();
        assert_eq!(outcome.action, LandAction::Skipped(SkipReason::MissingIdentity));
    }
    assert_eq!(entity_counts(&conn).unwrap().lands, 0);
}

#[test]
fn reconcile_rejects_unknown_category() {
    let conn = open_db_in_memory().unwrap();
    let reconciler = RecordReconciler::sqlite(&conn, ReconcileOptions::default());

    let err = reconciler
        .reconcile(&json!({"id": 5, "nome_ti": "Odd", "categoria": "XX"}))
        .unwrap_err();

    assert!(matches!(err, RecordError::InvalidCategory(_)));
    assert_eq!(entity_counts(&conn).unwrap().lands, 0);
}
