use anyhow::{bail, Result};
use roster_sync::{
    insert_records, read_records, run_sync, run_verify, setup_table, ChangeClassifier, ChangeReason,
    EmptySnapshotGuard, League, NoProfiles, Notifier, Record, RecordFields, Settings, SyncOptions,
    WebhookPayload,
};
use rusqlite::Connection;
use std::cell::RefCell;
use std::time::Duration;

const TABLE: &str = "VCTContractsTable";

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<WebhookPayload>>,
    fail: bool,
}

impl RecordingNotifier {
    fn titles(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|p| p.embeds.first().and_then(|e| e.title.clone()))
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn post(&self, payload: &WebhookPayload) -> Result<()> {
        if self.fail {
            bail!("webhook unavailable");
        }
        self.sent.borrow_mut().push(payload.clone());
        Ok(())
    }
}

fn player(handle: &str, first: &str, family: &str, team: &str, end_date: i32) -> Record {
    Record::new(
        League::Emea,
        RecordFields {
            team_name: team.to_string(),
            handle_name: handle.to_string(),
            role: "Duelist".to_string(),
            first_name: first.to_string(),
            family_name: family.to_string(),
            end_date: end_date.to_string(),
            resident: "Yes".to_string(),
            roster_status: "Active".to_string(),
            team_tag: "".to_string(),
            team_contact_info: "".to_string(),
        },
    )
}

fn options() -> SyncOptions {
    SyncOptions {
        guard: EmptySnapshotGuard::EitherEmpty,
        send_interval: Duration::ZERO,
    }
}

fn seeded(records: &[Record]) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_table(&conn, TABLE).unwrap();
    insert_records(&conn, TABLE, records).unwrap();
    conn
}

#[test]
fn full_run_writes_table_and_announces_changes() {
    let conn = seeded(&[
        player("Derke", "Nikita", "Sirmitev", "Fnatic", 2025),
        player("Chronicle", "Timofey", "Khromov", "Fnatic", 2025),
        player("Alfajer", "Emir", "Ali Beder", "Fnatic", 2025),
    ]);
    let feed = vec![
        player("Derke", "Nikita", "Sirmitev", "Fnatic", 2025),
        player("Chronicle", "Timofey", "Khromov", "Team Vitality", 2026),
        player("Kaajak", "Kajetan", "Haremski", "Fnatic", 2026),
        // Stale second line for the same person, older contract
        player("Chronicle", "Timofey", "Khromov", "Fnatic", 2024),
    ];
    let notifier = RecordingNotifier::default();

    let outcome = run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options()).unwrap();

    assert_eq!(outcome.fetched, 4);
    assert_eq!(outcome.persisted, 3);
    assert_eq!(outcome.written.updated, 1);
    assert_eq!(outcome.written.inserted, 1);
    assert_eq!(outcome.written.deleted, 1);
    assert_eq!(outcome.delivered, 3);
    assert_eq!(
        notifier.titles(),
        vec![
            "Chronicle(Timofey Khromov, Duelist, ex-Fnatic) joined Team Vitality",
            "Alfajer(Emir Ali Beder, Duelist) was removed from Fnatic",
            "Kaajak(Kajetan Haremski, Duelist) joined Fnatic",
        ]
    );

    let stored = read_records(&conn, TABLE).unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().any(|r| r.handle_name() == "Kaajak"));
    assert!(stored.iter().all(|r| r.handle_name() != "Alfajer"));
}

#[test]
fn second_run_is_quiet() {
    let conn = seeded(&[player("Boaster", "Jake", "Howlett", "Fnatic", 2025)]);
    let feed = vec![player("Boaster", "Jake", "Howlett", "Fnatic", 2026)];

    let first = RecordingNotifier::default();
    run_sync(&conn, TABLE, &feed, &NoProfiles, &first, options()).unwrap();
    assert_eq!(first.sent.borrow().len(), 1);

    let second = RecordingNotifier::default();
    let outcome = run_sync(&conn, TABLE, &feed, &NoProfiles, &second, options()).unwrap();
    assert_eq!(outcome.notifications, 0);
    assert!(second.sent.borrow().is_empty());
}

#[test]
fn accented_feed_names_match_stored_names() {
    let conn = seeded(&[player("Sayf", "Saif", "Jibraeel", "Vitality", 2025)]);
    let feed = vec![player("Sayf", "Sáif", "Jibraéel", "Vitality", 2025)];
    let notifier = RecordingNotifier::default();

    let outcome = run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options()).unwrap();

    assert_eq!(outcome.notifications, 0);
    assert_eq!(outcome.written.inserted, 0);
}

#[test]
fn empty_table_on_first_run_is_left_alone() {
    let conn = seeded(&[]);
    let feed = vec![player("Boaster", "Jake", "Howlett", "Fnatic", 2025)];
    let notifier = RecordingNotifier::default();

    let outcome = run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options()).unwrap();

    assert_eq!(outcome.notifications, 0);
    assert!(read_records(&conn, TABLE).unwrap().is_empty());
}

#[test]
fn empty_table_is_filled_when_guard_is_off() {
    let conn = seeded(&[]);
    let feed = vec![player("Boaster", "Jake", "Howlett", "Fnatic", 2025)];
    let notifier = RecordingNotifier::default();
    let options = SyncOptions { guard: EmptySnapshotGuard::Off, ..options() };

    let outcome = run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options).unwrap();

    assert_eq!(outcome.written.inserted, 1);
    assert_eq!(notifier.titles(), vec!["Boaster(Jake Howlett, Duelist) joined Fnatic"]);
}

#[test]
fn delivery_failure_still_leaves_table_written() {
    let conn = seeded(&[player("Boaster", "Jake", "Howlett", "Fnatic", 2025)]);
    let feed = vec![player("Boaster", "Jake", "Howlett", "Fnatic", 2027)];
    let notifier = RecordingNotifier { fail: true, ..RecordingNotifier::default() };

    let result = run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options());

    assert!(result.is_err());
    assert_eq!(read_records(&conn, TABLE).unwrap()[0].end_date(), 2027);
}

#[test]
fn verify_syncs_a_copy_of_the_live_table() {
    let live = [
        player("Boaster", "Jake", "Howlett", "Fnatic", 2025),
        player("Leo", "Leo", "Jannesson", "Fnatic", 2025),
    ];
    let conn = seeded(&live);
    let settings = Settings::from_lookup(|name| match name {
        "WEBHOOK_URL" => Some("https://live".to_string()),
        "WEBHOOK_URL_TEST" => Some("https://test".to_string()),
        "SEND_INTERVAL_SECS" => Some("0".to_string()),
        _ => None,
    })
    .unwrap();
    // Leftovers in the test table are discarded before the copy
    setup_table(&conn, &settings.table_name_test).unwrap();
    insert_records(&conn, &settings.table_name_test, &[player("Old", "Old", "Row", "X", 2020)]).unwrap();

    let feed = vec![
        player("Boaster", "Jake", "Howlett", "Fnatic", 2025),
        player("Leo", "Leo", "Jannesson", "Fnatic", 2026),
    ];
    let notifier = RecordingNotifier::default();

    let outcome = run_verify(&conn, &settings, &feed, &NoProfiles, &notifier).unwrap();

    assert_eq!(outcome.persisted, 2);
    assert_eq!(outcome.delivered, 1);
    assert_eq!(notifier.sent.borrow().len(), 1);

    // Live table untouched, test table updated
    let mut stored_live = read_records(&conn, TABLE).unwrap();
    stored_live.sort_by_key(|r| r.key());
    let mut expected = live.to_vec();
    expected.sort_by_key(|r| r.key());
    assert_eq!(stored_live, expected);
    let test_rows = read_records(&conn, &settings.table_name_test).unwrap();
    assert!(test_rows.iter().any(|r| r.handle_name() == "Leo" && r.end_date() == 2026));
    assert!(test_rows.iter().all(|r| r.handle_name() != "Old"));
}

#[test]
fn only_one_reason_per_changed_player() {
    let stored = player("Boaster", "Jake", "Howlett", "Foo", 2024);
    let conn = seeded(&[stored.clone()]);
    let mut moved = player("Boaster", "Jake", "Howlett", "Bar", 2026).values();
    moved[3] = "IGL".to_string();
    let feed = vec![Record::from_fields(&moved).unwrap()];
    let notifier = RecordingNotifier::default();

    run_sync(&conn, TABLE, &feed, &NoProfiles, &notifier, options()).unwrap();

    let titles = notifier.titles();
    assert_eq!(titles.len(), 1);
    assert!(titles[0].contains("ex-Foo) joined Bar"));
    assert_eq!(
        ChangeClassifier::new().dominant_reason(&stored, &feed[0]),
        Some(ChangeReason::TeamChange)
    );
}
