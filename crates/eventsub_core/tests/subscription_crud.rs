use eventsub_core::db::open_db_in_memory;
use eventsub_core::{
    Person, PersonFilter, PersonService, RepoError, SqlitePersonRepository,
    SqliteSubscriptionRepository, Subscription, SubscriptionFilter, SubscriptionRepository,
    SubscriptionService, SubscriptionValidationError,
};
use rusqlite::Connection;

/// Saves `n_samples` people and re-fetches each one by its identity fields.
fn setup(conn: &Connection, n_samples: i64) -> Vec<Person> {
    let service = PersonService::new(SqlitePersonRepository::try_new(conn).unwrap());
    let mut people = Vec::new();

    for index in 1..=n_samples {
        let fullname = format!("test{index}");
        let email = format!("test@test.com{index}");
        let phone = format!("111111111{index}");

        let mut person = Person::new(fullname.as_str(), email.as_str(), phone.as_str());
        service.save(&mut person).unwrap();

        let person = service
            .get(&PersonFilter::by_identity(fullname, email, phone))
            .unwrap()
            .unwrap();
        assert!(person.id.unwrap() > 0);
        people.push(person);
    }

    people
}

fn subscription_service(
    conn: &Connection,
) -> SubscriptionService<SqliteSubscriptionRepository<'_>> {
    SubscriptionService::new(SqliteSubscriptionRepository::try_new(conn).unwrap())
}

fn assert_same_person(actual: &Person, expected: &Person) {
    assert_eq!(actual.fullname, expected.fullname);
    assert_eq!(actual.email, expected.email);
    assert_eq!(actual.phone, expected.phone);
    assert_eq!(actual.id, expected.id);
}

#[test]
fn get_by_person_id_before_and_after_save() {
    let conn = open_db_in_memory().unwrap();
    let person = setup(&conn, 1).remove(0);
    let service = subscription_service(&conn);
    let by_person = SubscriptionFilter::by_person_id(person.id.unwrap());

    assert!(service.get(&by_person).unwrap().is_none());

    let mut subscription = Subscription::new(person.clone(), "asdf");
    service.save(&mut subscription).unwrap();

    let result = service.get(&by_person).unwrap().unwrap();
    assert_eq!(result.id, Some(1));
    assert_eq!(result.qr, "asdf");
    assert_same_person(result.person.as_ref().unwrap(), &person);
    assert_eq!(result.person.unwrap().fullname, "test1");
}

#[test]
fn get_by_id_hydrates_person() {
    let conn = open_db_in_memory().unwrap();
    let person = setup(&conn, 1).remove(0);
    let service = subscription_service(&conn);

    let mut subscription = Subscription::new(person.clone(), "sdf");
    let id = service.save(&mut subscription).unwrap();
    assert_eq!(id, 1);
    assert_eq!(subscription.id, Some(1));

    let result = service.get(&SubscriptionFilter::by_id(1)).unwrap().unwrap();
    assert_eq!(result.id, Some(1));
    assert_same_person(result.person.as_ref().unwrap(), &person);
    assert!(service.get(&SubscriptionFilter::by_id(2)).unwrap().is_none());
}

#[test]
fn list_is_empty_then_returns_every_subscription_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let people = setup(&conn, 5);
    let service = subscription_service(&conn);

    assert!(service.list().unwrap().is_empty());

    for person in &people {
        let mut subscription = Subscription::new(person.clone(), "asdf");
        service.save(&mut subscription).unwrap();
    }

    let result = service.list().unwrap();
    assert_eq!(result.len(), people.len());
    for (offset, subscription) in result.iter().enumerate() {
        let id = subscription.id.unwrap();
        assert_eq!(id, offset as i64 + 1);
        let expected = &people[(id - 1) as usize];
        assert_same_person(subscription.person.as_ref().unwrap(), expected);
    }
}

#[test]
fn invalid_person_is_rejected_with_exact_messages() {
    let conn = open_db_in_memory().unwrap();
    setup(&conn, 1);
    let service = subscription_service(&conn);

    let cases = [
        (None, "sdfasdf", "Person is required."),
        (Some(Person::default()), "asdf", "Person is invalid."),
    ];

    for (person, qr, message) in cases {
        let mut subscription = Subscription {
            id: None,
            person,
            qr: qr.to_string(),
        };

        let err = service.save(&mut subscription).unwrap_err();
        assert_eq!(err.to_string(), message);
        assert_eq!(subscription.id, None);
    }

    assert!(service.list().unwrap().is_empty());
}

#[test]
fn validation_errors_carry_their_kind() {
    let conn = open_db_in_memory().unwrap();
    let service = subscription_service(&conn);

    let mut missing = Subscription::default();
    assert!(matches!(
        service.save(&mut missing).unwrap_err(),
        RepoError::SubscriptionValidation(SubscriptionValidationError::PersonRequired)
    ));

    let unsaved_person = Person::new("test1", "test@test.com1", "1");
    let mut unsaved = Subscription::new(unsaved_person, "asdf");
    assert!(matches!(
        service.save(&mut unsaved).unwrap_err(),
        RepoError::SubscriptionValidation(SubscriptionValidationError::PersonInvalid)
    ));
}

#[test]
fn zero_id_counts_as_transient() {
    let conn = open_db_in_memory().unwrap();
    let person = setup(&conn, 1).remove(0);
    let service = subscription_service(&conn);

    let mut subscription = Subscription::new(person, "asdf");
    subscription.id = Some(0);
    assert_eq!(service.save(&mut subscription).unwrap(), 1);
    assert_eq!(subscription.id, Some(1));

    let err = service.save(&mut subscription).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyPersisted(1)));
    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn person_id_missing_from_store_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubscriptionRepository::try_new(&conn).unwrap();

    let mut ghost = Person::new("ghost", "ghost@test.com", "000");
    ghost.id = Some(77);

    let err = repo
        .insert_subscription(&Subscription::new(ghost, "asdf"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::SubscriptionValidation(SubscriptionValidationError::PersonInvalid)
    ));
    assert!(repo.list_subscriptions().unwrap().is_empty());
}

#[test]
fn get_filters_combine_with_and() {
    let conn = open_db_in_memory().unwrap();
    let people = setup(&conn, 2);
    let service = subscription_service(&conn);

    for (person, qr) in people.iter().zip(["first", "second"]) {
        service
            .save(&mut Subscription::new(person.clone(), qr))
            .unwrap();
    }

    let matching = SubscriptionFilter {
        person_id: people[1].id,
        qr: Some("second".to_string()),
        ..SubscriptionFilter::default()
    };
    assert_eq!(service.get(&matching).unwrap().unwrap().id, Some(2));

    let mismatched = SubscriptionFilter {
        qr: Some("first".to_string()),
        ..matching
    };
    assert!(service.get(&mismatched).unwrap().is_none());
}

#[test]
fn upload_csv_smoke() {
    let conn = open_db_in_memory().unwrap();
    let service = subscription_service(&conn);
    let csv = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/google_forms.csv");

    service.upload_csv(csv).unwrap();
}
