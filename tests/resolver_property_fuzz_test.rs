use date_attrs::{
    Error, format_iso_8601_utc, parse_date_attrs_at, parse_date_string_to_epoch_ms,
    resolve_epoch_at,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};
use std::collections::HashMap;

const RESOLVER_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/resolver_property_fuzz_test.txt";
const DEFAULT_RESOLVER_PROPTEST_CASES: u32 = 128;

const REGISTRY_NAMES: [&str; 5] = [
    "datetime",
    "end-date",
    "timeleft-ms",
    "timestamp-ms",
    "timestamp-seconds",
];

// Clock readings stay well inside the exactly-representable f64 integer
// range so additive properties can compare with plain equality.
const EXACT_CLOCK_RANGE: std::ops::RangeInclusive<i64> = -(1i64 << 45)..=(1i64 << 45);

fn env_proptest_cases(var_name: &str, default_cases: u32) -> u32 {
    std::env::var(var_name)
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default_cases)
}

fn resolver_proptest_cases() -> u32 {
    std::env::var("DATE_ATTRS_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or_else(|| {
            env_proptest_cases("DATE_ATTRS_FUZZ_CASES", DEFAULT_RESOLVER_PROPTEST_CASES)
        })
}

fn registry_name_strategy() -> BoxedStrategy<&'static str> {
    prop_oneof![
        Just("datetime"),
        Just("end-date"),
        Just("timeleft-ms"),
        Just("timestamp-ms"),
        Just("timestamp-seconds"),
    ]
    .boxed()
}

fn unknown_name_strategy() -> BoxedStrategy<&'static str> {
    prop_oneof![
        Just("expiry"),
        Just("start-date"),
        Just("timestamp"),
        Just("offset-seconds"),
        Just("data-deadline"),
        Just("DATETIME"),
    ]
    .boxed()
}

fn attribute_value_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just(String::new()),
        Just("2023-01-01T00:00:00Z".to_string()),
        Just("1970-01-01".to_string()),
        Just("Mar 1, 2026".to_string()),
        Just("30 Sept 2019 12:00 UTC".to_string()),
        Just("not a date".to_string()),
        Just("Infinity".to_string()),
        Just("0x20".to_string()),
        any::<i32>().prop_map(|value| value.to_string()),
        (any::<i32>(), 0u32..1_000).prop_map(|(whole, frac)| format!("{whole}.{frac:03}")),
    ]
    .boxed()
}

fn source_strategy() -> BoxedStrategy<HashMap<String, String>> {
    vec(
        (
            prop_oneof![
                5 => registry_name_strategy(),
                1 => Just("offset-seconds"),
            ],
            attribute_value_strategy(),
        ),
        0..=6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    })
    .boxed()
}

fn candidate_list_strategy() -> BoxedStrategy<Vec<&'static str>> {
    vec(
        prop_oneof![
            4 => registry_name_strategy(),
            1 => unknown_name_strategy(),
        ],
        1..=5,
    )
    .boxed()
}

fn registry_candidate_list_strategy() -> BoxedStrategy<Vec<&'static str>> {
    vec(registry_name_strategy(), 1..=5).boxed()
}

fn first_unknown_candidate(names: &[&'static str]) -> Option<&'static str> {
    names
        .iter()
        .copied()
        .find(|name| !REGISTRY_NAMES.contains(name))
}

fn presence_scan_winner(
    source: &HashMap<String, String>,
    names: &[&'static str],
) -> Option<&'static str> {
    names
        .iter()
        .copied()
        .find(|name| source.get(*name).is_some_and(|value| !value.is_empty()))
}

fn epochs_agree(left: Option<f64>, right: Option<f64>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => {
            left.to_bits() == right.to_bits() || (left.is_nan() && right.is_nan())
        }
        _ => false,
    }
}

fn assert_resolution_matches_the_contract(
    source: &HashMap<String, String>,
    names: &[&'static str],
    now_ms: i64,
) -> TestCaseResult {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        parse_date_attrs_at(source, names, now_ms)
    }));
    let Ok(result) = outcome else {
        return Err(TestCaseError::fail(format!(
            "parse_date_attrs_at panicked for names={names:?}, source={source:?}"
        )));
    };

    let first_unknown = first_unknown_candidate(names);
    let winner = presence_scan_winner(source, names);

    match (first_unknown, winner, result) {
        (Some(unknown), _, Err(Error::UnknownAttribute { attribute })) => {
            prop_assert_eq!(
                attribute,
                unknown,
                "validation must name the first unknown candidate, names={:?}",
                names
            );
        }
        (Some(unknown), _, other) => {
            prop_assert!(
                false,
                "unknown candidate {unknown} must fail validation, got {other:?}"
            );
        }
        (None, None, Err(Error::MissingAttribute { candidates })) => {
            let requested: Vec<String> = names.iter().map(|name| name.to_string()).collect();
            prop_assert_eq!(
                candidates,
                requested,
                "missing-attribute error must list the request in order"
            );
        }
        (None, None, other) => {
            prop_assert!(
                false,
                "absent candidates must report a missing attribute, got {other:?}"
            );
        }
        (None, Some(winner), Err(Error::InvalidDate { attribute, .. })) => {
            prop_assert_eq!(attribute, winner, "invalid date must name the scan winner");
            prop_assert!(
                matches!(winner, "datetime" | "end-date"),
                "only the date kinds may fail parsing, winner={winner}"
            );
        }
        (None, Some(_), Ok(_)) => {}
        (None, Some(winner), other) => {
            prop_assert!(
                false,
                "present candidate {winner} must resolve, got {other:?}"
            );
        }
    }
    Ok(())
}

fn assert_scan_winner_decides_the_epoch(
    source: &HashMap<String, String>,
    names: &[&'static str],
    now_ms: i64,
) -> TestCaseResult {
    let combined = resolve_epoch_at(source, names, now_ms);
    let Some(winner) = presence_scan_winner(source, names) else {
        prop_assert!(
            matches!(combined, Ok(None)),
            "no present candidate must yield None, got {combined:?}"
        );
        return Ok(());
    };

    let solo = resolve_epoch_at(source, &[winner], now_ms);
    match (combined, solo) {
        (Ok(combined), Ok(solo)) => {
            prop_assert!(
                epochs_agree(combined, solo),
                "winner {winner} alone resolved {solo:?} but the full scan gave {combined:?}"
            );
        }
        (Err(combined), Err(solo)) => {
            prop_assert_eq!(combined, solo, "winner {} must fail identically", winner);
        }
        (combined, solo) => {
            prop_assert!(
                false,
                "full scan {combined:?} disagrees with winner {winner} alone {solo:?}"
            );
        }
    }
    Ok(())
}

fn assert_offset_only_shifts_the_epoch(
    source: &HashMap<String, String>,
    names: &[&'static str],
    offset_seconds: i32,
    now_ms: i64,
) -> TestCaseResult {
    let mut base = source.clone();
    base.remove("offset-seconds");
    let mut shifted = base.clone();
    shifted.insert("offset-seconds".to_string(), offset_seconds.to_string());

    let resolved = resolve_epoch_at(&base, names, now_ms);
    let adjusted = parse_date_attrs_at(&shifted, names, now_ms);
    match (resolved, adjusted) {
        (Ok(Some(epoch)), Ok(total)) => {
            if epoch.is_nan() {
                prop_assert!(total.is_nan(), "NaN epochs must stay NaN through the offset");
            } else {
                prop_assert_eq!(
                    total,
                    epoch + f64::from(offset_seconds) * 1_000.0,
                    "offset must add exactly {} seconds",
                    offset_seconds
                );
            }
        }
        (Ok(None), Err(Error::MissingAttribute { .. })) => {}
        (Err(resolved), Err(adjusted)) => {
            prop_assert_eq!(resolved, adjusted, "offset must not change the failure");
        }
        (resolved, adjusted) => {
            prop_assert!(
                false,
                "offset changed the outcome: without={resolved:?}, with={adjusted:?}"
            );
        }
    }
    Ok(())
}

fn assert_timeleft_tracks_the_clock(
    timeleft_ms: i32,
    now_ms: i64,
    delta_ms: u32,
) -> TestCaseResult {
    let source: HashMap<String, String> =
        [("timeleft-ms".to_string(), timeleft_ms.to_string())].into();

    let first = parse_date_attrs_at(&source, &["timeleft-ms"], now_ms)
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    let second = parse_date_attrs_at(&source, &["timeleft-ms"], now_ms + i64::from(delta_ms))
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    prop_assert_eq!(
        second - first,
        f64::from(delta_ms),
        "advancing the clock by {}ms must shift timeleft by the same amount",
        delta_ms
    );
    Ok(())
}

fn assert_iso_rendering_reparses(epoch_ms: i64) -> TestCaseResult {
    let rendered = format_iso_8601_utc(epoch_ms);
    let reparsed = parse_date_string_to_epoch_ms(&rendered);
    prop_assert_eq!(
        reparsed,
        Some(epoch_ms),
        "rendered form {} must parse back to its epoch",
        rendered
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: resolver_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(RESOLVER_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn resolver_outcomes_follow_the_contract(
        source in source_strategy(),
        names in candidate_list_strategy(),
        now_ms in EXACT_CLOCK_RANGE,
    ) {
        assert_resolution_matches_the_contract(&source, &names, now_ms)?;
    }

    #[test]
    fn full_scan_agrees_with_the_first_present_candidate(
        source in source_strategy(),
        names in registry_candidate_list_strategy(),
        now_ms in EXACT_CLOCK_RANGE,
    ) {
        assert_scan_winner_decides_the_epoch(&source, &names, now_ms)?;
    }

    #[test]
    fn offset_seconds_shifts_without_changing_resolution(
        source in source_strategy(),
        names in registry_candidate_list_strategy(),
        offset_seconds in any::<i32>(),
        now_ms in EXACT_CLOCK_RANGE,
    ) {
        assert_offset_only_shifts_the_epoch(&source, &names, offset_seconds, now_ms)?;
    }

    #[test]
    fn timeleft_resolution_moves_with_the_clock(
        timeleft_ms in any::<i32>(),
        now_ms in EXACT_CLOCK_RANGE,
        delta_ms in 0u32..=1_000_000_000,
    ) {
        assert_timeleft_tracks_the_clock(timeleft_ms, now_ms, delta_ms)?;
    }

    #[test]
    fn iso_rendering_reparses_to_the_same_epoch(
        epoch_ms in -8_640_000_000_000_000i64..=8_640_000_000_000_000,
    ) {
        assert_iso_rendering_reparses(epoch_ms)?;
    }
}
