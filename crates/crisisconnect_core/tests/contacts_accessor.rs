mod common;

use crisisconnect_core::backend::Table;
use crisisconnect_core::cache::QueryKey;
use crisisconnect_core::{
    Contact, ContactPatch, EmergencyContactInput, NewContact, ServiceError, ValidationError,
};
use std::sync::Arc;
use uuid::Uuid;

fn shared_contact(contacts: &[Contact]) -> Contact {
    contacts
        .iter()
        .find(|contact| contact.is_shared())
        .cloned()
        .unwrap()
}

#[test]
fn signed_out_list_shows_only_defaults() {
    let (app, _data) = common::recording_app();
    let contacts = app.contacts().list_contacts().unwrap();
    assert_eq!(contacts.len(), 6);
    assert!(contacts.iter().all(Contact::is_shared));
    assert!(contacts[0].is_favorite);
}

#[test]
fn created_contact_appears_before_defaults() {
    let (app, data) = common::signed_in_app();
    let before = app.contacts().list_contacts().unwrap();
    assert_eq!(before.len(), 6);

    let created = app
        .contacts()
        .create_contact(&NewContact::personal("Mai Rudo", "+263 77 123 4567"))
        .unwrap();
    assert!(!created.is_shared());

    let after = app.contacts().list_contacts().unwrap();
    assert_eq!(after.len(), 7);
    assert_eq!(after[0].id, created.id);
    assert!(after[1..].iter().all(Contact::is_shared));
    assert_eq!(data.write_calls(), vec!["insert:contacts".to_string()]);
}

#[test]
fn own_favorites_come_first_then_newest() {
    let (app, _data) = common::signed_in_app();
    let contacts = app.contacts();
    let older = contacts
        .create_contact(&NewContact::personal("Older", "0771000001"))
        .unwrap();
    let mut favorite = NewContact::personal("Favorite", "0771000002");
    favorite.is_favorite = true;
    let favorite = contacts.create_contact(&favorite).unwrap();
    let newer = contacts
        .create_contact(&NewContact::personal("Newer", "0771000003"))
        .unwrap();

    let ids = contacts
        .list_contacts()
        .unwrap()
        .into_iter()
        .take(3)
        .map(|contact| contact.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![favorite.id, newer.id, older.id]);
}

#[test]
fn shared_contact_writes_fail_locally_without_remote_call() {
    let (app, data) = common::signed_in_app();
    let shared = shared_contact(&app.contacts().list_contacts().unwrap());
    data.clear();

    let patch = ContactPatch {
        name: Some("Renamed".to_string()),
        ..ContactPatch::default()
    };
    let update = app.contacts().update_contact(&shared, &patch).unwrap_err();
    assert_eq!(update, ServiceError::SharedRecordReadOnly);
    assert_eq!(update.to_string(), "cannot modify a default/shared record");

    let delete = app.contacts().delete_contact(&shared).unwrap_err();
    assert_eq!(delete, ServiceError::SharedRecordReadOnly);

    assert!(data.calls().is_empty());
}

#[test]
fn foreign_contact_writes_fail_locally() {
    let (app, data) = common::signed_in_app();
    let mut foreign = shared_contact(&app.contacts().list_contacts().unwrap());
    foreign.user_id = Some(Uuid::new_v4());
    data.clear();

    let err = app.contacts().delete_contact(&foreign).unwrap_err();
    assert_eq!(err, ServiceError::NotOwner);
    assert!(data.calls().is_empty());
}

#[test]
fn update_and_delete_own_contact() {
    let (app, _data) = common::signed_in_app();
    let created = app
        .contacts()
        .create_contact(&NewContact::personal("Baba Tino", "0772000000"))
        .unwrap();

    let patch = ContactPatch {
        name: Some("Baba Tinotenda".to_string()),
        is_favorite: Some(true),
        ..ContactPatch::default()
    };
    let updated = app.contacts().update_contact(&created, &patch).unwrap();
    assert_eq!(updated.name, "Baba Tinotenda");
    assert!(updated.is_favorite);
    assert_eq!(
        app.contacts().list_contacts().unwrap()[0].name,
        "Baba Tinotenda"
    );

    app.contacts().delete_contact(&updated).unwrap();
    let remaining = app.contacts().list_contacts().unwrap();
    assert!(remaining.iter().all(|contact| contact.id != created.id));
}

#[test]
fn failed_write_leaves_cached_list_identical() {
    let (app, data) = common::signed_in_app();
    let before = app.contacts().list_contacts().unwrap();
    let key = QueryKey::contacts(app.snapshot().identity.map(|user| user.id));

    data.reject_writes(true);
    let err = app
        .contacts()
        .create_contact(&NewContact::personal("Ghost", "0773000000"))
        .unwrap_err();
    assert_eq!(err.to_string(), "connection reset by peer");

    assert_eq!(app.cache().is_stale(&key), Some(false));
    assert_eq!(app.cache().peek::<Vec<Contact>>(&key), Some(before.clone()));
    assert_eq!(app.contacts().list_contacts().unwrap(), before);
}

#[test]
fn invalid_contact_input_is_rejected_before_backend() {
    let (app, data) = common::signed_in_app();
    let err = app
        .contacts()
        .create_contact(&NewContact::personal("Bad", "call me"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidPhone(_))
    ));
    assert!(data.calls().is_empty());
}

#[test]
fn emergency_contact_add_updates_contacts_and_profile() {
    let (app, data) = common::signed_in_app();
    let profile = app.profiles().get_profile().unwrap().unwrap();
    assert!(profile.emergency_contact_name.is_none());
    app.contacts().list_contacts().unwrap();
    data.clear();

    let created = app
        .contacts()
        .add_emergency_contact(&EmergencyContactInput {
            name: "Amai Moyo".to_string(),
            phone: "+263 77 765 4321".to_string(),
            email: Some("amai@example.com".to_string()),
            relationship: Some("Mother".to_string()),
        })
        .unwrap();
    assert_eq!(created.kind, "emergency");
    assert!(created.is_favorite);
    assert!(created.is_emergency_contact);
    assert_eq!(
        data.write_calls(),
        vec!["insert:contacts".to_string(), "update:profiles".to_string()]
    );

    let profile = app.profiles().get_profile().unwrap().unwrap();
    assert_eq!(profile.emergency_contact_name.as_deref(), Some("Amai Moyo"));
    assert_eq!(
        profile.emergency_contact_phone.as_deref(),
        Some("+263 77 765 4321")
    );
    assert_eq!(
        profile.emergency_contact_email.as_deref(),
        Some("amai@example.com")
    );

    let emergency = app.contacts().list_emergency_contacts().unwrap();
    assert_eq!(emergency.len(), 1);
    assert_eq!(emergency[0].id, created.id);
}

#[test]
fn emergency_contact_survives_failed_profile_copy() {
    let (app, data) = common::signed_in_app();
    let before = app.profiles().get_profile().unwrap().unwrap();
    data.reject_write("update", Table::Profiles);

    let created = app
        .contacts()
        .add_emergency_contact(&EmergencyContactInput {
            name: "Baba Moyo".to_string(),
            phone: "+263 77 111 2222".to_string(),
            email: Some("baba@example.com".to_string()),
            relationship: Some("Father".to_string()),
        })
        .unwrap();
    assert_eq!(
        data.write_calls(),
        vec!["insert:contacts".to_string(), "update:profiles".to_string()]
    );

    let contacts = app.contacts().list_contacts().unwrap();
    assert!(contacts.iter().any(|contact| contact.id == created.id));

    let after = app.profiles().get_profile().unwrap().unwrap();
    assert!(after.emergency_contact_name.is_none());
    assert!(after.emergency_contact_phone.is_none());
    assert!(after.emergency_contact_email.is_none());
    assert_eq!(after, before);
}

#[test]
fn emergency_contact_requires_name_and_phone() {
    let (app, data) = common::signed_in_app();
    let err = app
        .contacts()
        .add_emergency_contact(&EmergencyContactInput {
            name: "  ".to_string(),
            phone: "0771234567".to_string(),
            ..EmergencyContactInput::default()
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(data.calls().is_empty());
}

#[test]
fn create_contact_requires_sign_in() {
    let (app, data) = common::recording_app();
    let err = app
        .contacts()
        .create_contact(&NewContact::personal("Mai Rudo", "0771234567"))
        .unwrap_err();
    assert_eq!(err, ServiceError::NotAuthenticated);
    assert!(data.write_calls().is_empty());
}

#[test]
fn contact_writes_only_mark_contacts_stale() {
    let (app, _data) = common::signed_in_app();
    let user = app.snapshot().identity.unwrap().id;
    app.profiles().get_profile().unwrap();
    app.contacts().list_contacts().unwrap();

    app.contacts()
        .create_contact(&NewContact::personal("Sekuru", "0774000000"))
        .unwrap();
    assert_eq!(
        app.cache().is_stale(&QueryKey::contacts(Some(user))),
        Some(true)
    );
    assert_eq!(app.cache().is_stale(&QueryKey::profile(user)), Some(false));
}

#[test]
fn identical_write_in_flight_is_rejected() {
    use crisisconnect_core::backend::{
        BackendResult, DataBackend, Row, Table, TableQuery,
    };
    use crisisconnect_core::{CrisisApp, LocalBackend};
    use std::sync::mpsc;
    use std::sync::Mutex;

    struct GatedInsert {
        inner: Arc<LocalBackend>,
        entered: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl DataBackend for GatedInsert {
        fn select(&self, query: &TableQuery) -> BackendResult<Vec<Row>> {
            self.inner.select(query)
        }
        fn insert(&self, table: Table, row: Row) -> BackendResult<Row> {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
                let release = self.release.lock().unwrap().take().unwrap();
                release.recv().unwrap();
            }
            self.inner.insert(table, row)
        }
        fn update(&self, query: &TableQuery, patch: Row) -> BackendResult<Vec<Row>> {
            self.inner.update(query, patch)
        }
        fn upsert(&self, table: Table, row: Row) -> BackendResult<Row> {
            self.inner.upsert(table, row)
        }
        fn delete(&self, query: &TableQuery) -> BackendResult<usize> {
            self.inner.delete(query)
        }
    }

    let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let data = Arc::new(GatedInsert {
        inner: backend.clone(),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
    });
    let app = Arc::new(CrisisApp::with_backends(backend, data));
    app.auth()
        .sign_up("rumbi@example.com", "secret123", None)
        .unwrap();

    let contact = NewContact::personal("Mai Rudo", "0771234567");
    let first = {
        let app = Arc::clone(&app);
        let contact = contact.clone();
        std::thread::spawn(move || app.contacts().create_contact(&contact))
    };
    entered_rx.recv().unwrap();

    let second = app.contacts().create_contact(&contact).unwrap_err();
    assert!(matches!(second, ServiceError::WriteInFlight { .. }));

    release_tx.send(()).unwrap();
    first.join().unwrap().unwrap();
    let own = app
        .contacts()
        .list_contacts()
        .unwrap()
        .into_iter()
        .filter(|contact| !contact.is_shared())
        .count();
    assert_eq!(own, 1);
}
