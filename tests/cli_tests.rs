use predicates::prelude::*;
use predicates::str::contains;

mod common;
use common::TestEnv;

/// Two places, three visits on 2025-03-07 (ids 1 and 2 at the cafe, 3 at
/// the office).
fn seeded() -> TestEnv {
    let env = TestEnv::new();
    env.init();

    env.run(&["place", "add", "Cafe", "--category", "food"])
        .success()
        .stdout(contains("Saved place #1 'Cafe'"));
    env.run(&["visit", "add", "1", "--in", "2025-03-07 09:00", "--out", "10:00"])
        .success()
        .stdout(contains("Visit #1 recorded at place #1"));
    env.run(&["visit", "add", "1", "--in", "2025-03-07 11:00", "--out", "12:30"])
        .success();
    env.run(&["place", "add", "Office", "--category", "work"])
        .success()
        .stdout(contains("Saved place #2 'Office'"));
    env.run(&["visit", "add", "2", "--in", "2025-03-07 13:00", "--out", "17:00"])
        .success()
        .stdout(contains("Visit #3 recorded at place #2"));

    env
}

#[test]
fn test_init_creates_database() {
    let env = TestEnv::new();
    env.run(&["--test", "init"])
        .success()
        .stdout(contains("Database initialized"));
    assert!(std::path::Path::new(&env.db).exists());
}

#[test]
fn test_list_day() {
    let env = seeded();
    env.run(&["list", "--date", "2025-03-07"])
        .success()
        .stdout(contains("Cafe"))
        .stdout(contains("Office"))
        .stdout(contains("#2"))
        .stdout(contains("Visits: 3"));
}

#[test]
fn test_merge_same_place() {
    let env = seeded();

    // selection order does not matter
    env.run(&["merge", "2", "1"])
        .success()
        .stdout(contains("Merged into visit #1 (2025-03-07 09:00 – 2025-03-07 12:30)"));

    env.run(&["list", "--date", "2025-03-07"])
        .success()
        .stdout(contains("#1"))
        .stdout(contains("#2").not())
        .stdout(contains("Visits: 2"));
}

#[test]
fn test_merge_rejects_different_places() {
    let env = seeded();
    env.run(&["merge", "1", "3"])
        .failure()
        .stderr(contains("You can only merge visits at the same location."));

    env.run(&["list", "--date", "2025-03-07"])
        .success()
        .stdout(contains("Visits: 3"));
}

#[test]
fn test_merge_needs_two_visits() {
    let env = seeded();
    env.run(&["merge", "1"])
        .failure()
        .stderr(contains("Select exactly two visits to merge."));
    env.run(&["merge", "1", "2", "3"])
        .failure()
        .stderr(contains("Select exactly two visits to merge."));
}

#[test]
fn test_summary_without_api_key_uses_place_sequence() {
    let env = seeded();
    env.run(&["summary", "2025-03-07"])
        .success()
        .stdout(contains("Cafe → Office"))
        .stdout(contains("fallback"));

    // nothing changed: served from the stored row
    env.run(&["summary", "2025-03-07"])
        .success()
        .stdout(contains("Cafe → Office"))
        .stdout(contains("stored"));
}

#[test]
fn test_summary_of_empty_day() {
    let env = TestEnv::new();
    env.init();
    env.run(&["summary", "2025-03-08"])
        .success()
        .stdout(contains("No visits recorded."));
}

#[test]
fn test_visit_notes() {
    let env = seeded();
    env.run(&["visit", "note", "1", "flat white and emails"])
        .success()
        .stdout(contains("Notes of visit #1 updated"));
    env.run(&["list", "--date", "2025-03-07"])
        .success()
        .stdout(contains("flat white and emails"));

    env.run(&["visit", "note", "1", "  "])
        .success()
        .stdout(contains("Notes of visit #1 cleared"));
    env.run(&["visit", "note", "99", "x"])
        .failure()
        .stderr(contains("Visit #99 not found"));
}

#[test]
fn test_enter_and_exit() {
    let env = TestEnv::new();
    env.init();
    env.run(&["place", "add", "Gym", "--category", "gym"]).success();

    env.run(&["visit", "enter", "1", "--at", "2025-03-07 18:00"])
        .success()
        .stdout(contains("Visit #1 opened at place #1"));
    env.run(&["visit", "enter", "1", "--at", "2025-03-07 18:05"])
        .failure()
        .stderr(contains("already open"));
    env.run(&["visit", "exit", "1", "--at", "2025-03-07 19:30"])
        .success()
        .stdout(contains("Visit #1 closed (90 min)"));
    env.run(&["visit", "exit", "1", "--at", "2025-03-07 20:00"])
        .failure()
        .stderr(contains("No open visit at place #1"));
}

#[test]
fn test_overnight_visit_is_split() {
    let env = TestEnv::new();
    env.init();
    env.run(&["place", "add", "Home", "--category", "home"]).success();
    env.run(&[
        "visit", "add", "1", "--in", "2025-03-07 22:00", "--out", "2025-03-08 07:00",
    ])
    .success();

    env.run(&["list", "--date", "2025-03-07"])
        .success()
        .stdout(contains("22:00 – 00:00"));
    env.run(&["list", "--date", "2025-03-08"])
        .success()
        .stdout(contains("00:00 – 07:00"));
}

#[test]
fn test_month_view() {
    let env = seeded();
    env.run(&["list", "--month", "2025-03"])
        .success()
        .stdout(contains("2025-03-07"))
        .stdout(contains("Cafe, Office"));
    env.run(&["list", "--month", "2025-13"])
        .failure()
        .stderr(contains("2025-13"));
}

#[test]
fn test_json_listing() {
    let env = seeded();
    env.run(&["list", "--date", "2025-03-07", "--json"])
        .success()
        .stdout(contains("\"place_name\": \"Office\""));
}

#[test]
fn test_place_in_use_cannot_be_deleted() {
    let env = seeded();
    env.run(&["place", "del", "2"])
        .failure()
        .stderr(contains("still has recorded visits"));

    env.run(&["visit", "del", "3", "--yes"])
        .success()
        .stdout(contains("Visit #3 has been deleted."));
    env.run(&["place", "del", "2"])
        .success()
        .stdout(contains("Deleted place #2 'Office'"));
}

#[test]
fn test_visits_belong_to_user() {
    let env = seeded();
    env.cmd_as("someone-else")
        .args(["list", "--date", "2025-03-07"])
        .assert()
        .success()
        .stdout(contains("No visits for 2025-03-07"));
}

#[test]
fn test_log_records_operations() {
    let env = seeded();
    env.run(&["merge", "1", "2"]).success();
    env.run(&["log", "--print"])
        .success()
        .stdout(contains("merge"))
        .stdout(contains("Merged visit #2 into #1"));
}

#[test]
fn test_list_defaults_to_today() {
    let env = TestEnv::new();
    env.init();
    env.run(&["place", "add", "Desk"]).success();
    env.run(&["visit", "enter", "1"]).success();

    env.run(&["list"])
        .success()
        .stdout(contains("Desk"))
        .stdout(contains("Visits: 1"));
    env.run(&["list", "--today"]).failure();
}
