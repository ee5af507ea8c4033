use chrono::NaiveDate;
use proptest::prelude::*;

use crate::export::{self, ExportFormat, ExportOptions};
use crate::store::{sample_records, Category, EmissionRecord, RecordStore, Status};
use crate::view::{compute, SortDirection, SortKey, StatusFilter, Summary, ViewState};

fn arb_status() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

fn arb_filter() -> impl Strategy<Value = StatusFilter> {
    prop_oneof![Just(StatusFilter::All), arb_status().prop_map(StatusFilter::Only)]
}

fn arb_sort_key() -> impl Strategy<Value = SortKey> {
    prop::sample::select(vec![
        SortKey::Date,
        SortKey::Category,
        SortKey::Location,
        SortKey::Emission,
    ])
}

fn arb_direction() -> impl Strategy<Value = SortDirection> {
    prop::sample::select(vec![SortDirection::Ascending, SortDirection::Descending])
}

fn arb_search() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["", "a", "ROAD", "vehicle", "ind", "zone", "zzz"])
        .prop_map(str::to_string)
}

// small value domains so ties show up often
fn arb_records() -> impl Strategy<Value = Vec<EmissionRecord>> {
    let row = (
        1u32..=5,
        prop::sample::select(vec!["Vehicle", "Industrial", "Marine"]),
        prop::sample::select(vec![0.0, 3.8, 4.2, 12.5, 45.2]),
        arb_status(),
        prop::sample::select(vec!["Mombasa Rd", "Factory Zone A", "Kisii Campus", "Ring Road"]),
    );
    prop::collection::vec(row, 0..24).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (day, category, emission, status, location))| EmissionRecord {
                id: i as u32,
                date: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
                category: Category::from(category),
                emission,
                status,
                location: location.to_string(),
            })
            .collect()
    })
}

fn key_order(key: SortKey, a: &EmissionRecord, b: &EmissionRecord) -> std::cmp::Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Category => a.category.label().cmp(b.category.label()),
        SortKey::Location => a.location.cmp(&b.location),
        SortKey::Emission => a.emission.total_cmp(&b.emission),
    }
}

proptest! {
    #[test]
    fn compute_is_pure_and_idempotent(
        records in arb_records(),
        search in arb_search(),
        filter in arb_filter(),
        key in arb_sort_key(),
        direction in arb_direction(),
    ) {
        let before = records.clone();
        let first = compute(&records, &search, filter, key, direction);
        let second = compute(&records, &search, filter, key, direction);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&records, &before);
    }

    #[test]
    fn output_is_the_matching_subset(
        records in arb_records(),
        search in arb_search(),
        filter in arb_filter(),
        key in arb_sort_key(),
        direction in arb_direction(),
    ) {
        let out = compute(&records, &search, filter, key, direction);
        let needle = search.to_lowercase();
        let expected = records
            .iter()
            .filter(|r| {
                (r.location.to_lowercase().contains(&needle)
                    || r.category.label().to_lowercase().contains(&needle))
                    && filter.matches(r.status)
            })
            .count();
        prop_assert_eq!(out.len(), expected);
        for r in out.iter() {
            prop_assert!(records.iter().any(|orig| std::ptr::eq(orig, *r)));
        }
    }

    #[test]
    fn sort_is_stable_and_respects_direction(
        records in arb_records(),
        key in arb_sort_key(),
        direction in arb_direction(),
    ) {
        let out = compute(&records, "", StatusFilter::All, key, direction);
        for pair in out.windows(2) {
            let ord = key_order(key, pair[0], pair[1]);
            match ord {
                std::cmp::Ordering::Equal => prop_assert!(pair[0].id < pair[1].id),
                std::cmp::Ordering::Less => prop_assert_eq!(direction, SortDirection::Ascending),
                std::cmp::Ordering::Greater => prop_assert_eq!(direction, SortDirection::Descending),
            }
        }
    }

    #[test]
    fn summary_matches_visible_rows(records in arb_records(), filter in arb_filter()) {
        let mut state = ViewState::default();
        state.set_status_filter(filter);
        let visible = state.apply(&records);
        let summary = Summary::of(&visible);
        prop_assert_eq!(summary.total, visible.len());
        prop_assert!(summary.critical + summary.low <= summary.total);
    }
}

#[test]
fn critical_filter_ignores_search_and_sort_settings() {
    let records = sample_records();
    let mut state = ViewState::default();
    state.set_status_filter(StatusFilter::Only(Status::Critical));
    state.toggle_sort(SortKey::Emission);
    let visible = state.apply(&records);
    let locations: Vec<&str> = visible.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["Nairobi Highway", "Factory Zone A"]);
}

#[test]
fn vehicle_search_yields_vehicle_records() {
    let store = RecordStore::sample();
    let mut state = ViewState::default();
    state.set_search("vehicle");
    let visible = state.apply(store.records());
    let ids: Vec<u32> = visible.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3, 5, 6]);
}

#[test]
fn header_clicks_then_export_low_records() {
    let records = sample_records();
    let mut state = ViewState::default();
    state.set_status_filter(StatusFilter::Only(Status::Low));
    state.toggle_sort(SortKey::Location);
    assert_eq!(state.direction, SortDirection::Ascending);

    let visible = state.apply(&records);
    let doc = export::build_document(
        &visible,
        state.status_filter,
        &ExportOptions::default(),
        "2/20/2026",
    );
    assert_eq!(doc.status_filter, "Low");
    let locations: Vec<&str> = doc.rows.iter().map(|r| r[2].as_str()).collect();
    assert_eq!(
        locations,
        vec!["Kisii Campus", "Nyali Bridge", "Processing Plant C"]
    );

    let pdf = String::from_utf8_lossy(&export::pdf::render_pdf(&doc)).into_owned();
    assert!(pdf.contains("(Applied Filters - Status: Low) Tj"));
    for location in locations {
        assert!(pdf.contains(&format!("({location}) Tj")));
    }
    assert!(!pdf.contains("(Mombasa Rd) Tj"));
}

#[test]
fn export_to_disk_in_each_format() {
    let dir = tempfile::tempdir().unwrap();
    let records = sample_records();
    let visible = ViewState::default().apply(&records);

    // pdf string literals escape parentheses
    for (name, format, header) in [
        ("report.pdf", ExportFormat::Pdf, "(Emission \\(tCO2e\\)) Tj"),
        ("report.json", ExportFormat::Json, "\"Emission (tCO2e)\""),
        ("report.txt", ExportFormat::Text, "Emission (tCO2e)"),
    ] {
        let options = ExportOptions {
            format,
            unit: Some("tCO2e".to_string()),
            ..ExportOptions::default()
        };
        let path = dir.path().join(name);
        export::export(&visible, StatusFilter::All, &options, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(header), "{name}");
        assert!(text.contains("Factory Zone A"), "{name}");
    }
}

#[test]
fn empty_view_exports_header_only() {
    let records = sample_records();
    let mut state = ViewState::default();
    state.set_search("zzz-no-match");
    let visible = state.apply(&records);
    assert!(visible.is_empty());
    let doc = export::build_document(
        &visible,
        StatusFilter::All,
        &ExportOptions::default(),
        "1/1/2026",
    );
    assert!(doc.rows.is_empty());
    let text = String::from_utf8(export::render_text(&doc)).unwrap();
    assert_eq!(text.lines().count(), 6);
}
