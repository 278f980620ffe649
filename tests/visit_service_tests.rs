use chrono::{NaiveDate, NaiveDateTime};
use rvisitlog::config::AiConfig;
use rvisitlog::core::places::PlaceLogic;
use rvisitlog::core::visits::VisitService;
use rvisitlog::db::queries;
use rvisitlog::errors::{AppError, MergeError};
use rvisitlog::models::day_summary::SummarySource;
use rvisitlog::models::place::PlaceCategory;
use rvisitlog::models::visit::Visit;
use rvisitlog::utils::time::parse_datetime;
use std::time::Duration;

mod common;
use common::{RecordingGenerator, service};

const MINUTES: Duration = Duration::from_secs(300);

fn ts(s: &str) -> NaiveDateTime {
    parse_datetime(s).expect("valid timestamp")
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn place(svc: &VisitService, name: &str) -> i64 {
    PlaceLogic::add(svc.pool(), svc.user_id(), name, PlaceCategory::Other, 45.0, 9.0, "")
        .expect("add place")
        .id
}

#[test]
fn merge_same_place_in_either_order() {
    for reversed in [false, true] {
        let mut svc = service("u", MINUTES);
        let p = place(&svc, "Cafe");
        let nine = svc
            .add(p, ts("2025-03-07 09:00"), Some(ts("2025-03-07 10:00")), None)
            .unwrap();
        let eleven = svc
            .add(p, ts("2025-03-07 11:00"), Some(ts("2025-03-07 12:30")), None)
            .unwrap();

        let ids = if reversed {
            [eleven.id, nine.id]
        } else {
            [nine.id, eleven.id]
        };
        let merged = svc.merge(&ids).unwrap();

        assert_eq!(merged.id, nine.id);
        assert_eq!(merged.entry, ts("2025-03-07 09:00"));
        assert_eq!(merged.exit, Some(ts("2025-03-07 12:30")));
        assert!(svc.last_error().is_none());

        // the day was reloaded after the merge
        assert_eq!(svc.current_day.len(), 1);
        assert_eq!(svc.current_day[0].visit_id, nine.id);
        assert!(matches!(svc.visit(eleven.id), Err(AppError::VisitNotFound(_))));
    }
}

#[test]
fn merge_different_places_is_rejected_with_message() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Home");
    let q = place(&svc, "Office");
    let a = svc.add(p, ts("2025-03-07 08:00"), Some(ts("2025-03-07 08:30")), None).unwrap();
    let b = svc.add(q, ts("2025-03-07 09:00"), Some(ts("2025-03-07 17:00")), None).unwrap();

    let err = svc.merge(&[a.id, b.id]).unwrap_err();
    assert!(matches!(err, AppError::Merge(MergeError::DifferentPlaces)));
    assert_eq!(
        svc.last_error(),
        Some("You can only merge visits at the same location.")
    );

    // both rows untouched
    assert_eq!(svc.fetch_day(day("2025-03-07")).unwrap().len(), 2);
}

#[test]
fn merge_needs_exactly_two_visits() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Home");
    let a = svc.add(p, ts("2025-03-07 08:00"), None, None).unwrap();

    for ids in [vec![], vec![a.id], vec![a.id, a.id], vec![a.id, 2, 3]] {
        let err = svc.merge(&ids).unwrap_err();
        assert!(matches!(err, AppError::Merge(MergeError::WrongSelection(_))));
        assert_eq!(svc.last_error(), Some("Select exactly two visits to merge."));
    }
}

#[test]
fn merge_with_unknown_visit_reports_not_found() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Home");
    let a = svc.add(p, ts("2025-03-07 08:00"), None, None).unwrap();

    assert!(matches!(svc.merge(&[a.id, 999]), Err(AppError::VisitNotFound(999))));
    assert_eq!(svc.last_error(), Some("Visit #999 not found"));
}

#[test]
fn day_cache_serves_until_invalidated_or_expired() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Park");
    svc.add(p, ts("2025-03-07 10:00"), Some(ts("2025-03-07 11:00")), None).unwrap();
    assert_eq!(svc.fetch_day(day("2025-03-07")).unwrap().len(), 1);

    // a row written behind the service's back is not seen while cached
    let behind = Visit::new("u", p, ts("2025-03-07 15:00"), Some(ts("2025-03-07 16:00")), None);
    queries::insert_visit(&svc.pool().conn, &behind).unwrap();
    assert_eq!(svc.fetch_day(day("2025-03-07")).unwrap().len(), 1);

    svc.invalidate_day(day("2025-03-07"));
    assert_eq!(svc.fetch_day(day("2025-03-07")).unwrap().len(), 2);
}

#[test]
fn zero_ttl_never_serves_stale_data() {
    let mut svc = service("u", Duration::ZERO);
    let p = place(&svc, "Park");
    assert!(svc.fetch_day(day("2025-03-07")).unwrap().is_empty());

    let behind = Visit::new("u", p, ts("2025-03-07 15:00"), None, None);
    queries::insert_visit(&svc.pool().conn, &behind).unwrap();

    assert_eq!(svc.fetch_day(day("2025-03-07")).unwrap().len(), 1);
    assert_eq!(svc.fetch_month(2025, 3).unwrap().days[6].visit_count, 1);
}

#[test]
fn writes_through_the_service_refresh_day_and_month() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Gym");
    assert_eq!(svc.fetch_month(2025, 3).unwrap().active_days().count(), 0);
    assert!(svc.fetch_day(day("2025-03-08")).unwrap().is_empty());

    let v = svc.add(p, ts("2025-03-07 22:00"), Some(ts("2025-03-08 01:00")), None).unwrap();

    // both days of an overnight visit are invalidated
    let d8 = svc.fetch_day(day("2025-03-08")).unwrap();
    assert_eq!(d8.len(), 1);
    assert!(d8[0].continued);
    assert_eq!(d8[0].duration_minutes(), 60);
    assert_eq!(svc.fetch_month(2025, 3).unwrap().active_days().count(), 2);

    svc.delete(v.id).unwrap();
    assert!(svc.fetch_day(day("2025-03-08")).unwrap().is_empty());
}

#[test]
fn visits_are_scoped_to_their_user() {
    let mut alice = service("alice", MINUTES);
    let p = place(&alice, "Home");
    let v = alice.add(p, ts("2025-03-07 08:00"), None, None).unwrap();

    let other = Visit::new("bob", p, ts("2025-03-07 09:00"), None, None);
    let bob_visit = queries::insert_visit(&alice.pool().conn, &other).unwrap();

    assert_eq!(alice.fetch_day(day("2025-03-07")).unwrap().len(), 1);
    assert!(matches!(alice.visit(bob_visit), Err(AppError::VisitNotFound(_))));
    assert!(matches!(
        alice.set_notes(bob_visit, "mine now"),
        Err(AppError::VisitNotFound(_))
    ));
    assert!(alice.set_notes(v.id, "ok").is_ok());
}

#[test]
fn geofence_enter_and_exit() {
    let mut svc = service("u", MINUTES).with_now(ts("2025-03-07 12:00"));
    let p = place(&svc, "Library");

    let v = svc.enter(p, ts("2025-03-07 10:00")).unwrap();
    assert!(v.is_open());
    assert!(matches!(
        svc.enter(p, ts("2025-03-07 10:05")),
        Err(AppError::VisitAlreadyOpen(_))
    ));

    // open visit is clipped at "now"
    let segs = svc.fetch_day(day("2025-03-07")).unwrap();
    assert!(segs[0].open);
    assert_eq!(segs[0].duration_minutes(), 120);

    assert!(matches!(
        svc.exit(p, ts("2025-03-07 09:00")),
        Err(AppError::ExitBeforeEntry { .. })
    ));

    let closed = svc.exit(p, ts("2025-03-07 11:15")).unwrap();
    assert_eq!(closed.duration_minutes(), Some(75));
    assert!(matches!(
        svc.exit(p, ts("2025-03-07 11:30")),
        Err(AppError::NoOpenVisit(_))
    ));

    let segs = svc.fetch_day(day("2025-03-07")).unwrap();
    assert!(!segs[0].open);
    assert_eq!(segs[0].duration_minutes(), 75);
}

#[test]
fn manual_open_visit_is_refused_while_one_is_open() {
    let mut svc = service("u", MINUTES).with_now(ts("2025-03-07 14:00"));
    let p = place(&svc, "Library");

    let first = svc.enter(p, ts("2025-03-07 09:00")).unwrap();
    assert!(matches!(
        svc.add(p, ts("2025-03-07 11:00"), None, None),
        Err(AppError::VisitAlreadyOpen(_))
    ));

    // a closed visit can still be added alongside the open one
    svc.add(p, ts("2025-03-07 07:00"), Some(ts("2025-03-07 08:00")), None)
        .unwrap();

    let closed = svc.exit(p, ts("2025-03-07 12:00")).unwrap();
    assert_eq!(closed.id, first.id);
    assert!(svc.enter(p, ts("2025-03-07 13:00")).is_ok());
}

#[test]
fn undecodable_rows_are_skipped() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Office");
    svc.add(p, ts("2025-03-07 09:00"), Some(ts("2025-03-07 10:00")), None)
        .unwrap();

    svc.pool()
        .conn
        .execute(
            "INSERT INTO location_visits (user_id, saved_place_id, entry_time, exit_time, visit_notes, updated_at)
             VALUES ('u', ?1, '2025-03-07T11:00:00', 'garbage', NULL, '')",
            [p],
        )
        .unwrap();

    let segs = svc.fetch_day(day("2025-03-07")).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].start, ts("2025-03-07 09:00"));
    assert_eq!(svc.fetch_month(2025, 3).unwrap().days[6].visit_count, 1);
}

#[test]
fn unknown_place_and_backwards_visits_are_rejected() {
    let mut svc = service("u", MINUTES);
    assert!(matches!(
        svc.enter(42, ts("2025-03-07 10:00")),
        Err(AppError::PlaceNotFound(42))
    ));

    let p = place(&svc, "Home");
    assert!(matches!(
        svc.add(p, ts("2025-03-07 10:00"), Some(ts("2025-03-07 09:00")), None),
        Err(AppError::ExitBeforeEntry { .. })
    ));
}

#[test]
fn place_with_visits_cannot_be_deleted() {
    let mut svc = service("u", MINUTES);
    let p = place(&svc, "Home");
    let v = svc.add(p, ts("2025-03-07 10:00"), None, None).unwrap();

    assert!(matches!(
        PlaceLogic::delete(svc.pool(), "u", p),
        Err(AppError::PlaceInUse(_))
    ));

    svc.delete(v.id).unwrap();
    assert_eq!(PlaceLogic::delete(svc.pool(), "u", p).unwrap().name, "Home");
    assert!(PlaceLogic::list(svc.pool(), "u").unwrap().is_empty());
}

#[test]
fn summary_regenerates_only_after_note_changes() {
    let mut svc = service("u", MINUTES);
    let cafe = place(&svc, "Cafe");
    let office = place(&svc, "Office");
    let a = svc
        .add(cafe, ts("2025-03-07 08:00"), Some(ts("2025-03-07 08:30")), Some("espresso".into()))
        .unwrap();
    svc.add(office, ts("2025-03-07 09:00"), Some(ts("2025-03-07 17:00")), None)
        .unwrap();

    let generator = RecordingGenerator::replying("I grabbed an espresso and worked all day.");
    let ai = AiConfig::default();
    let d = day("2025-03-07");

    let first = svc.summarize_day(d, Some(&generator), &ai, false).unwrap();
    assert_eq!(first.source, SummarySource::Generated);
    assert_eq!(generator.calls(), 1);
    assert_eq!(
        generator.requests.borrow()[0].user_prompt,
        "Today's visits with notes:\nCafe: espresso"
    );

    let again = svc.summarize_day(d, Some(&generator), &ai, false).unwrap();
    assert_eq!(again.source, SummarySource::Memory);
    assert_eq!(again.text, first.text);
    assert_eq!(generator.calls(), 1);

    svc.set_notes(a.id, "espresso and a croissant").unwrap();
    let edited = svc.summarize_day(d, Some(&generator), &ai, false).unwrap();
    assert_eq!(edited.source, SummarySource::Generated);
    assert_ne!(edited.visits_hash, first.visits_hash);
    assert_eq!(generator.calls(), 2);

    let stored = queries::load_day_summary(&svc.pool().conn, "u", &d)
        .unwrap()
        .unwrap();
    assert_eq!(stored.visits_hash, edited.visits_hash);
}

#[test]
fn summary_falls_back_when_generation_fails() {
    let mut svc = service("u", MINUTES);
    let names = ["Home", "Cafe", "Office", "Gym", "Home"];
    let mut hour = 7;
    for n in names {
        let p = match PlaceLogic::list(svc.pool(), "u")
            .unwrap()
            .into_iter()
            .find(|pl| pl.name == n)
        {
            Some(existing) => existing.id,
            None => place(&svc, n),
        };
        let entry = ts(&format!("2025-03-07 {:02}:00", hour));
        let exit = ts(&format!("2025-03-07 {:02}:30", hour));
        svc.add(p, entry, Some(exit), Some(format!("note {hour}"))).unwrap();
        hour += 2;
    }

    let generator = RecordingGenerator::failing();
    let out = svc
        .summarize_day(day("2025-03-07"), Some(&generator), &AiConfig::default(), false)
        .unwrap();

    assert_eq!(out.source, SummarySource::Fallback);
    assert_eq!(out.text, "Home → Cafe → Office +2 more");
    assert!(
        queries::load_day_summary(&svc.pool().conn, "u", &day("2025-03-07"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn empty_day_has_a_fixed_summary() {
    let mut svc = service("u", MINUTES);
    let out = svc
        .summarize_day(day("2025-03-07"), None, &AiConfig::default(), false)
        .unwrap();
    assert_eq!(out.text, "No visits recorded.");
}
