mod common;

use anyhow::Result;
use common::{StandardStations, low_ids, parse_date, test_repo};
use flasktrack::application::{
    CommandOutcome, LedgerCommand, LedgerError, ReceiveRequest, ShipRequest, StationLedgerSet,
};
use flasktrack::domain::{StationFlag, StationLedger, format_padded};

#[test]
fn test_load_keeps_configured_order() -> Result<()> {
    let (repo, _temp) = test_repo()?;
    StandardStations::write(&repo)?;

    let set = StationLedgerSet::load(repo, &["SPO", "MLO", "SMO"], "")?;
    let stations: Vec<&str> = set.stations().collect();
    assert_eq!(stations, vec!["SPO", "MLO", "SMO"]);
    assert_eq!(set.original(), set.ledgers());

    Ok(())
}

#[test]
fn test_load_missing_station_fails() -> Result<()> {
    let (repo, _temp) = test_repo()?;
    StandardStations::write(&repo)?;

    let result = StationLedgerSet::load(repo, &["MLO", "BRW"], "");
    match result {
        Err(LedgerError::LoadError { station, path, .. }) => {
            assert_eq!(station, "BRW");
            assert!(path.ends_with("BRW/BRW.csv"));
        }
        other => panic!("expected load error, got {:?}", other.map(|_| ())),
    }

    Ok(())
}

#[test]
fn test_load_with_variant_tag() -> Result<()> {
    let (repo, temp) = test_repo()?;
    StandardStations::write(&repo)?;
    std::fs::copy(
        temp.path().join("SMO/SMO.csv"),
        temp.path().join("SMO/SMO_backup.csv"),
    )?;

    let set = StationLedgerSet::load(repo, &["SMO"], "_backup")?;
    assert_eq!(low_ids(set.ledger("SMO")?), vec!["101", "205"]);

    Ok(())
}

#[test]
fn test_ship_to_empty_station_then_duplicate() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    let outcome = set.ship(ShipRequest::new("MLO", "101", parse_date("2023-01-01")))?;
    assert!(matches!(outcome, CommandOutcome::Shipped { .. }));

    let mlo = set.ledger("MLO")?;
    assert_eq!(mlo.len(), 1);
    assert_eq!(mlo.rows()[0].low_id, "101");
    assert!(!mlo.rows()[0].returned);

    // Same pair again in the same session
    let result = set.ship(ShipRequest::new("MLO", "101", parse_date("2023-01-08")));
    assert!(matches!(
        result,
        Err(LedgerError::DuplicateActiveFlask { ref station, .. }) if station == "MLO"
    ));
    assert_eq!(set.ledger("MLO")?.len(), 1);

    Ok(())
}

#[test]
fn test_ship_without_low_id_is_rejected() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;
    let before = set.ledger("SPO")?.clone();

    for low_id in ["", "  "] {
        let result = set.ship(ShipRequest::new("SPO", low_id, parse_date("2023-03-01")));
        assert!(matches!(
            result,
            Err(LedgerError::MissingLowId { ref station }) if station == "SPO"
        ));
    }
    assert_eq!(set.ledger("SPO")?, &before);
    assert!(!set.has_changes());

    Ok(())
}

#[test]
fn test_padded_ids_are_trimmed_on_ship_and_receive() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    set.ship(ShipRequest::new("MLO", " 101 ", parse_date("2023-03-01")).with_high_id(" 102"))?;
    let mlo = set.ledger("MLO")?;
    assert_eq!(low_ids(mlo), vec!["101"]);
    assert_eq!(mlo.rows()[0].high_id.as_deref(), Some("102"));

    // The padded id names the same pair
    let result = set.ship(ShipRequest::new("MLO", "101", parse_date("2023-03-02")));
    assert!(matches!(result, Err(LedgerError::DuplicateActiveFlask { .. })));

    set.receive(ReceiveRequest::new("MLO", "101 "))?;
    assert!(set.ledger("MLO")?.is_empty());

    Ok(())
}

#[test]
fn test_ship_duplicate_from_snapshot_leaves_ledger_unchanged() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;
    let before = set.ledger("SMO")?.clone();

    let result = set.ship(ShipRequest::new("SMO", "205", parse_date("2023-06-01")));
    match result {
        Err(LedgerError::DuplicateActiveFlask { existing, .. }) => {
            assert_eq!(existing.ship_date, parse_date("2023-02-01"));
        }
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(set.ledger("SMO")?, &before);

    Ok(())
}

#[test]
fn test_received_pair_still_blocked_by_snapshot() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    set.receive(ReceiveRequest::new("SMO", "101"))?;
    let result = set.ship(ShipRequest::new("SMO", "101", parse_date("2023-06-01")));

    assert!(matches!(result, Err(LedgerError::DuplicateActiveFlask { .. })));
    assert_eq!(low_ids(set.ledger("SMO")?), vec!["205"]);

    Ok(())
}

#[test]
fn test_same_pair_may_go_to_another_station() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    set.ship(ShipRequest::new("MLO", "205", parse_date("2023-03-01")))?;

    let found: Vec<&str> = set.search("205").iter().map(|l| l.station()).collect();
    assert_eq!(found, vec!["MLO", "SMO"]);

    Ok(())
}

#[test]
fn test_receive_then_receive_again() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    set.ship(ShipRequest::new("MLO", "101", parse_date("2023-01-01")))?;
    let outcome = set.receive(ReceiveRequest::new("MLO", "101").with_notes("all good"))?;
    assert_eq!(outcome.flask().low_id, "101");
    assert!(set.ledger("MLO")?.is_empty());

    let result = set.receive(ReceiveRequest::new("MLO", "101"));
    assert!(matches!(
        result,
        Err(LedgerError::FlaskNotPresent { ref low_id, .. }) if low_id == "101"
    ));
    assert!(set.ledger("MLO")?.is_empty());

    Ok(())
}

#[test]
fn test_ship_then_receive_restores_rows() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;
    let before = set.ledger("SPO")?.clone();

    set.apply(LedgerCommand::Ship(
        ShipRequest::new("SPO", "400", parse_date("2023-03-01")).with_high_id("401"),
    ))?;
    assert_eq!(low_ids(set.ledger("SPO")?), vec!["310", "312", "314", "400"]);

    set.apply(LedgerCommand::Receive(ReceiveRequest::new("SPO", "400")))?;
    assert_eq!(set.ledger("SPO")?, &before);
    assert!(!set.has_changes());

    Ok(())
}

#[test]
fn test_receive_from_middle_keeps_relative_order() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    set.receive(ReceiveRequest::new("SPO", "312"))?;
    assert_eq!(low_ids(set.ledger("SPO")?), vec!["310", "314"]);
    assert_eq!(set.changed_stations(), vec!["SPO"]);

    Ok(())
}

#[test]
fn test_receive_missing_reports_absence() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;
    let before = set.ledger("SMO")?.clone();

    let err = set
        .receive(ReceiveRequest::new("SMO", "999"))
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.to_string(), "Flask 999 is not currently at SMO");
    assert_eq!(set.ledger("SMO")?, &before);

    Ok(())
}

#[test]
fn test_unknown_station_is_an_error() -> Result<()> {
    let (mut set, _temp) = StandardStations::load()?;

    let err = set
        .ship(ShipRequest::new("BRW", "1", parse_date("2023-01-01")))
        .unwrap_err();
    assert!(!err.is_rejection());
    assert_eq!(err.station(), Some("BRW"));

    Ok(())
}

#[test]
fn test_view_single_and_all() -> Result<()> {
    let (set, _temp) = StandardStations::load()?;

    let one = set.view(Some("SMO"))?;
    assert_eq!(one.len(), 1);
    assert!(one[0].to_string().contains("2023-02-01"));

    let all: Vec<&str> = set.view(None)?.iter().map(|l| l.station()).collect();
    assert_eq!(all, vec!["MLO", "SMO", "SPO"]);

    Ok(())
}

#[test]
fn test_overview_report() -> Result<()> {
    let (set, _temp) = StandardStations::load()?;
    let summaries = set.overview(parse_date("2023-03-01"));

    let mlo = &summaries[0];
    assert_eq!(format_padded(mlo.count as f64, true), "00");
    assert!(mlo.flags.contains(&StationFlag::NoFlasks));
    assert!(mlo.flags.contains(&StationFlag::UnderThree));
    assert!(mlo.flags.contains(&StationFlag::FewerThanWeeks));

    // SMO: 2 pairs, last shipped 2023-02-01, 28 days ago
    let smo = &summaries[1];
    assert_eq!(smo.days_since_newest, 28);
    assert_eq!(format_padded(smo.weeks_since_newest, false), "04.0");
    assert_eq!(smo.oldest.as_ref().unwrap().low_id, "101");
    assert_eq!(smo.newest.as_ref().unwrap().low_id, "205");
    assert_eq!(
        smo.flags,
        vec![StationFlag::UnderThree, StationFlag::FewerThanWeeks]
    );

    // SPO: 3 pairs, last shipped 2023-02-15, 2 weeks ago
    let spo = &summaries[2];
    assert!(spo.flags.is_empty());
    assert_eq!(spo.flag_text(), "");

    Ok(())
}

#[test]
fn test_overview_weeks_grow_without_mutation() -> Result<()> {
    let (set, _temp) = StandardStations::load()?;

    let earlier = set.overview(parse_date("2023-03-01"));
    let later = set.overview(parse_date("2023-04-01"));
    for (a, b) in earlier.iter().zip(&later) {
        assert!(b.weeks_since_newest >= a.weeks_since_newest);
    }

    Ok(())
}

#[test]
fn test_new_set_snapshot_is_independent() -> Result<()> {
    let (repo, _temp) = test_repo()?;
    let mut set = StationLedgerSet::new(repo, vec![StationLedger::new("MLO")]);

    set.ship(ShipRequest::new("MLO", "7", parse_date("2023-01-01")))?;
    assert!(set.original()[0].is_empty());
    assert_eq!(set.ledger("MLO")?.len(), 1);

    Ok(())
}
