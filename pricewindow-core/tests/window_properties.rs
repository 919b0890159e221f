//! Property tests for window invariants.
//!
//! Uses proptest to verify:
//! 1. Anchor correctness: the anchor is the latest session on or before the nominal date
//! 2. Window bounds: the anchor is always inside the window, clipped to the series
//! 3. Shape: a conformed record always has exactly the schema columns, in order
//! 4. Floor semantics: flattened values never exceed their source

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use pricewindow_core::domain::{TimeSeries, TradingSession};
use pricewindow_core::window::{
    align, extract, flatten, floor_to_int, resolve, ColumnSchema, WindowSpec,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Series with random gaps (1..=4 calendar days between sessions).
fn arb_series() -> impl Strategy<Value = TimeSeries> {
    prop::collection::vec((1i64..=4, 1.0..5000.0_f64, 0u64..5_000_000), 0..60).prop_map(
        |steps| {
            let mut date = base_date();
            let sessions = steps
                .into_iter()
                .map(|(gap, close, volume)| {
                    date += Duration::days(gap);
                    TradingSession::new(date, close * 0.99, close * 1.02, close * 0.97, close, volume)
                })
                .collect();
            TimeSeries::new("7203", sessions).unwrap()
        },
    )
}

fn arb_nominal() -> impl Strategy<Value = NaiveDate> {
    (0i64..300).prop_map(|d| base_date() + Duration::days(d))
}

fn arb_spec() -> impl Strategy<Value = WindowSpec> {
    (0usize..12, 0usize..12).prop_map(|(p, f)| WindowSpec::new(p, f))
}

// ── 1. Anchor correctness ────────────────────────────────────────────

proptest! {
    #[test]
    fn anchor_is_latest_session_not_after_nominal(
        series in arb_series(),
        nominal in arb_nominal(),
    ) {
        match align(&series, nominal) {
            Some(anchor) => {
                prop_assert!(anchor.date <= nominal);
                prop_assert_eq!(series.sessions()[anchor.index].date, anchor.date);
                if let Some(next) = series.get(anchor.index + 1) {
                    prop_assert!(next.date > nominal);
                }
            }
            None => {
                prop_assert!(series.first_date().map_or(true, |d| d > nominal));
            }
        }
    }
}

// ── 2. Window bounds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn window_contains_anchor_and_respects_bounds(
        series in arb_series(),
        nominal in arb_nominal(),
        spec in arb_spec(),
    ) {
        if let Some(anchor) = align(&series, nominal) {
            let window = extract(&series, anchor, spec);
            prop_assert!(window.start <= anchor.index);
            prop_assert!(anchor.index < window.end);
            prop_assert!(window.end <= series.len());
            prop_assert!(window.len() <= spec.width());

            let (first, last) = window.offset_range();
            prop_assert!(first >= -(spec.past as i64));
            prop_assert!(last <= spec.future as i64);

            let offsets: Vec<i64> = window.sessions(&series).map(|(o, _)| o).collect();
            let expected: Vec<i64> = (first..=last).collect();
            prop_assert_eq!(offsets, expected);
        }
    }
}

// ── 3. Shape ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolved_record_matches_schema(
        series in arb_series(),
        nominal in arb_nominal(),
        spec in arb_spec(),
    ) {
        let schema = ColumnSchema::new(spec);
        if let Some(resolved) = resolve(&series, nominal, &schema) {
            let keys: Vec<&str> = resolved.record.keys().collect();
            let columns: Vec<&str> = schema.iter().collect();
            prop_assert_eq!(keys, columns);
            prop_assert_eq!(resolved.record.populated(), resolved.window.len() * 5);
        }
    }

    #[test]
    fn schema_is_idempotent(spec in arb_spec()) {
        let a = ColumnSchema::new(spec);
        let b = ColumnSchema::new(spec);
        prop_assert_eq!(a.columns(), b.columns());
        prop_assert_eq!(a.len(), spec.width() * 5);
    }
}

// ── 4. Floor semantics ───────────────────────────────────────────────

proptest! {
    #[test]
    fn floor_never_rounds_up(value in -1.0e9..1.0e9_f64) {
        let floored = floor_to_int(value).unwrap();
        prop_assert!((floored as f64) <= value);
        prop_assert!(value - (floored as f64) < 1.0);
    }

    #[test]
    fn flattened_prices_never_exceed_source(close in 0.0..10_000.0_f64) {
        let session = TradingSession::new(base_date(), close, close, close, close, 1);
        let record = flatten(std::iter::once((0, &session)));
        let flat_close = record.get("close_d0").flatten().unwrap();
        prop_assert!((flat_close as f64) <= close);
    }
}

// ── Fixed scenarios ──────────────────────────────────────────────────

#[test]
fn clipped_three_session_series_nulls_eight_offsets() {
    let sessions = (0..3)
        .map(|i| {
            TradingSession::new(
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap() + Duration::days(i),
                100.0,
                101.0,
                99.0,
                100.5,
                1_000,
            )
        })
        .collect();
    let series = TimeSeries::new("7203", sessions).unwrap();
    let schema = ColumnSchema::new(WindowSpec::new(5, 5));

    let resolved = resolve(
        &series,
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        &schema,
    )
    .unwrap();

    assert_eq!((resolved.window.start, resolved.window.end), (0, 3));
    assert_eq!(resolved.record.len(), 55);
    assert_eq!(resolved.record.populated(), 15);
    for tag in ["d0", "d+1", "d+2"] {
        assert_eq!(resolved.record.get(&format!("close_{tag}")), Some(Some(100)));
    }
    // d-5..d-1 and d+3..d+5 are clipped: 8 offsets x 5 fields
    let nulls = resolved.record.iter().filter(|(_, v)| v.is_none()).count();
    assert_eq!(nulls, 40);
    assert!(resolved
        .record
        .iter()
        .filter(|(_, v)| v.is_none())
        .all(|(k, _)| !k.ends_with("_d0") && !k.ends_with("_d+1") && !k.ends_with("_d+2")));
}
