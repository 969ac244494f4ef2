//! End-to-end pipeline tests over the pure stages: input parsing, trial
//! aggregation, ranking, selection validation, and report serialization.
//! Stages that need a live systemd or network are exercised separately.

use dpitune::service::render_unit;
use dpitune_common::errors::TuneError;
use dpitune_common::input;
use dpitune_common::model::{ProbeOutcome, Trial};
use dpitune_common::ranking;

fn trial_from_codes(setting: &str, domains: &[&str], codes: &[u16]) -> Trial {
    let outcomes = domains
        .iter()
        .zip(codes)
        .map(|(d, &c)| ProbeOutcome::new(*d, c))
        .collect();
    Trial::from_outcomes(setting, outcomes)
}

#[test]
fn ranked_report_from_raw_input() {
    let settings = input::parse_list("--a\n\n--bb\n");
    let domains = input::parse_list("x.com\ny.com\n\n");
    assert_eq!(settings.len(), 2);
    assert_eq!(domains.len(), 2);

    let doms: Vec<&str> = domains.iter().map(String::as_str).collect();
    let trials = vec![
        trial_from_codes(&settings[0], &doms, &[200, 500]),
        trial_from_codes(&settings[1], &doms, &[200, 200]),
    ];

    let ranked = ranking::rank(trials).unwrap();
    assert_eq!(ranked[0].trial.setting, "--bb");
    assert_eq!(ranked[0].trial.success_rate, 100);
    assert_eq!(ranked[1].trial.setting, "--a");
    assert_eq!(ranked[1].trial.success_rate, 50);

    // every trial covers the full domain list
    for entry in &ranked {
        assert_eq!(entry.trial.total_count, domains.len());
        assert_eq!(
            entry.trial.success_count + entry.trial.failed_count,
            entry.trial.total_count
        );
    }
}

#[test]
fn skipped_trials_are_absent_from_the_ranking() {
    // a candidate whose service never started contributes no Trial at all
    let trials = vec![trial_from_codes("--came-up", &["x.com"], &[200])];
    let ranked = ranking::rank(trials).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].trial.setting, "--came-up");
}

#[test]
fn selection_is_validated_against_the_ranked_set() {
    let trials = vec![
        trial_from_codes("--a", &["x.com"], &[200]),
        trial_from_codes("--b", &["x.com"], &[404]),
    ];
    let ranked = ranking::rank(trials).unwrap();

    assert!(input::parse_selection("1", ranked.len()).is_ok());
    let err = input::parse_selection("2", ranked.len()).unwrap_err();
    assert!(matches!(err, TuneError::InvalidSelection { .. }));
}

#[test]
fn empty_domain_list_aborts_before_selection() {
    // blank-only domain input: every trial totals zero and scores zero
    let domains = input::parse_list("\n   \n");
    assert!(domains.is_empty());

    let trials = vec![
        Trial::from_outcomes("--a", vec![]),
        Trial::from_outcomes("--b", vec![]),
    ];
    assert!(trials.iter().all(|t| t.success_rate == 0));
    assert!(matches!(
        ranking::rank(trials),
        Err(TuneError::NoViableConfiguration)
    ));
}

#[test]
fn json_report_carries_the_glue_facing_fields() {
    let trials = vec![trial_from_codes("--a", &["x.com", "y.com"], &[200, 503])];
    let ranked = ranking::rank(trials).unwrap();
    let json = serde_json::to_value(&ranked).unwrap();

    let entry = &json[0];
    assert_eq!(entry["rank"], 0);
    assert_eq!(entry["trial"]["setting"], "--a");
    assert_eq!(entry["trial"]["success_rate"], 50);
    assert_eq!(entry["trial"]["success_count"], 1);
    assert_eq!(entry["trial"]["failed_count"], 1);
    assert_eq!(entry["trial"]["total_count"], 2);
}

#[test]
fn installed_unit_matches_the_proxy_contract() {
    let unit = render_unit("ciadpi", 8080, "--disorder 1 --split 3");
    assert!(unit.contains("ExecStart=ciadpi --ip 127.0.0.1 --port 8080 --disorder 1 --split 3"));
    assert!(unit.contains("Restart=on-failure"));
}
