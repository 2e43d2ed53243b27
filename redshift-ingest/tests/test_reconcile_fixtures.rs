use redshift_core::{MatchKind, MatchResult, PlanetRecord, find_match, reconcile};
use redshift_ingest::{append_confirmed, load_catalog, load_likely_planets, read_rows};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join(name)
}

#[test]
fn test_loads_confirmed_fixture_with_mangled_headers() {
    let cat = load_catalog(fixture("confirmed_sample.csv")).unwrap();
    assert_eq!(cat.len(), 6);

    let k22 = cat.find_by_name("Kepler-22 b").unwrap();
    assert_eq!(k22.stellar_temp_k, Some(5518.0));
    assert_eq!(k22.stellar_surface_gravity, Some(4.44));
    assert_eq!(k22.disposition.as_deref(), Some("CONFIRMED"));

    // blank cells stay empty
    let k16 = cat.find_by_name("kepler-16 b").unwrap();
    assert_eq!(k16.transit_epoch, None);
    assert_eq!(k16.planet_radius_earth, Some(8.45));
}

/// Real-data regression: every rule fires once on the sample upload.
#[test]
fn test_reconcile_sample_upload() {
    let cat = load_catalog(fixture("confirmed_sample.csv")).unwrap();
    let before = cat.clone();
    let rows = read_rows(fixture("upload_sample.csv")).unwrap();
    assert_eq!(rows.len(), 5, "blank row should be skipped");

    let report = reconcile(&rows, &cat);

    let matched: Vec<_> = report
        .matched
        .iter()
        .map(|m| (m.candidate.display_name(), m.matched.display_name(), m.kind))
        .collect();
    assert_eq!(
        matched,
        vec![
            ("kepler-452 B", "Kepler-452 b", MatchKind::ExactName),
            ("Renamed-186f", "Kepler-186 f", MatchKind::Position),
            ("Twin-62", "Kepler-62 f", MatchKind::Parameters),
        ]
    );

    let unmatched: Vec<_> = report.unmatched.iter().map(|r| r.display_name()).collect();
    assert_eq!(unmatched, vec!["KOI-9999.01", "Hot-Jupiter-X"]);
    assert_eq!(report.unmatched[1].equilibrium_temp_k, Some(1400.0));

    assert_eq!(cat, before);
}

#[test]
fn test_confirmed_planet_is_found_after_append() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Confirmed.csv");
    std::fs::copy(fixture("confirmed_sample.csv"), &path).unwrap();

    let cand = PlanetRecord::named("KOI-9999.01").with_orbit(14.2, 2.9);
    let cat = load_catalog(&path).unwrap();
    assert_eq!(find_match(&cand, &cat), MatchResult::NoMatch);

    append_confirmed(&path, cand.clone()).unwrap();
    let cat = load_catalog(&path).unwrap();
    assert_eq!(cat.len(), 7);
    assert!(matches!(find_match(&cand, &cat), MatchResult::ExactName(_)));
}

#[test]
fn test_likely_planets_fixture_in_rank_order() {
    let planets = load_likely_planets(fixture("top10_likely_planets.csv")).unwrap();
    assert_eq!(planets.len(), 4);

    let first = &planets[0];
    assert_eq!(first.rank, 1);
    assert_eq!(first.record.display_name(), "KOI-7016.01");
    assert_eq!(first.likelihood, Some(98.7));
    assert_eq!(first.record.orbital_period_days, Some(384.85));
    assert_eq!(first.record.planet_radius_earth, Some(1.64));
    assert_eq!(first.record.equilibrium_temp_k, Some(232.0));
    assert_eq!(first.record.transit_depth_ppm, Some(140.0));
    assert_eq!(first.record.stellar_temp_k, Some(5726.0));

    let last = &planets[3];
    assert_eq!(last.rank, 4);
    assert_eq!(last.likelihood, None);
}
