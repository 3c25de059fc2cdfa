//! End-to-end tests for the engine API
//!
//! These build sessions from the bundled demo suites and feature files,
//! collect them and run them with a silent reporter.

use std::path::PathBuf;

use steprun::bdd::{Feature, StepDef};
use steprun::engine::{
    collect, run, CollectOptions, ExitStatus, Mark, Outcome, RunOptions, RunReport, Selection,
    Session, Silent, TestCase, TestModule,
};
use steprun::{check_eq, demo};

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn feature(name: &str) -> Feature {
    Feature::load(&manifest_dir().join("features").join(name)).expect("feature parses")
}

/// Session with the demo steps and the given feature files, no code modules
fn scenario_session(features: &[&str]) -> Session {
    let mut session = Session::new();
    demo::steps::register(&mut session).expect("steps register");
    for name in features {
        session.add_feature(feature(name));
    }
    session
}

fn run_session(session: &Session, options: &CollectOptions) -> RunReport {
    let collection = collect(session, options);
    assert!(collection.errors.is_empty(), "{:?}", collection.errors);
    run(session.steps(), &collection, &RunOptions::default(), &mut Silent)
}

fn outcomes(report: &RunReport) -> Vec<(String, &'static str)> {
    report
        .items
        .iter()
        .map(|item| (item.nodeid.clone(), item.outcome.label()))
        .collect()
}

#[test]
fn test_account_withdrawal_passes() {
    let session = scenario_session(&["account.feature"]);
    let report = run_session(&session, &CollectOptions::default());

    assert_eq!(
        report.outcome("account::withdrawal_of_money"),
        Some(&Outcome::Passed)
    );
    assert_eq!(
        report.outcome("account::removal_of_items_from_set"),
        Some(&Outcome::Passed)
    );
    assert_eq!(report.exit_status(), ExitStatus::Ok);
}

#[test]
fn test_set_narrowing_is_local_to_the_scenario() {
    let session = scenario_session(&["sets.feature"]);
    let report = run_session(&session, &CollectOptions::default());

    // The narrowed and extended set reaches 5; the shared fixture still has 4.
    assert_eq!(
        report.outcome("sets::set_length_check"),
        Some(&Outcome::Passed)
    );
    assert_eq!(
        report.outcome("sets::shared_set_is_left_untouched"),
        Some(&Outcome::Passed)
    );
}

#[test]
fn test_outline_rows_become_items() {
    let session = scenario_session(&["outline.feature"]);
    let report = run_session(&session, &CollectOptions::default());

    let ids: Vec<&str> = report.items.iter().map(|i| i.nodeid.as_str()).collect();
    assert_eq!(
        ids,
        [
            "outline::eating_fruits[12-5-7]",
            "outline::eating_fruits[20-5-15]",
            "outline::eating_fruits[9-9-0]",
        ]
    );
    assert_eq!(report.summary.passed, 3);
}

#[test]
fn test_parametrized_conversion_gives_five_labelled_results() {
    let session = demo::session(&manifest_dir().join("demos")).expect("demo session");
    let options = CollectOptions {
        selection: Selection {
            keyword: Some("test_conversion".to_string()),
            marks: Vec::new(),
        },
        ..CollectOptions::default()
    };
    let report = run_session(&session, &options);

    assert_eq!(report.items.len(), 5);
    assert!(report.items.iter().all(|i| i.outcome == Outcome::Passed));
    assert_eq!(report.items[0].nodeid, "markers::test_conversion[8-46.4]");
    assert_eq!(report.items[2].nodeid, "markers::test_conversion[100-212]");
}

#[test]
fn test_xfail_and_xpass_inversion() {
    let mut session = Session::new();
    let mut module = TestModule::new("inversion");
    module
        .test(
            TestCase::new("fails", |_| {
                check_eq!(1 + 1, 3);
                Ok(())
            })
            .mark(Mark::xfail("arithmetic is hard")),
        )
        .test(TestCase::new("passes", |_| Ok(())).mark(Mark::xfail("maybe")))
        .test(TestCase::new("passes_strict", |_| Ok(())).mark(Mark::xfail_strict("must fail")));
    session.add_module(module);

    let report = run_session(&session, &CollectOptions::default());
    assert!(matches!(
        report.outcome("inversion::fails"),
        Some(Outcome::XFailed { .. })
    ));
    assert!(matches!(
        report.outcome("inversion::passes"),
        Some(Outcome::XPassed { strict: false, .. })
    ));
    assert!(matches!(
        report.outcome("inversion::passes_strict"),
        Some(Outcome::XPassed { strict: true, .. })
    ));
    assert_eq!(report.exit_status(), ExitStatus::TestsFailed);
}

#[test]
fn test_ambiguous_step_errors_only_its_scenario() {
    let mut session = scenario_session(&["account.feature", "outline.feature"]);
    session.step(StepDef::given("The account balance is {amount}", |_, _| Ok(())).unwrap());

    let report = run_session(&session, &CollectOptions::default());
    match report.outcome("account::withdrawal_of_money") {
        Some(Outcome::Errored { message }) => assert!(message.contains("ambiguous"), "{message}"),
        other => panic!("expected an error, got {other:?}"),
    }
    assert_eq!(report.summary.passed, 4);
}

#[test]
fn test_selection_by_mark() {
    let session = scenario_session(&["account.feature", "sets.feature", "outline.feature"]);
    let options = CollectOptions {
        selection: Selection {
            keyword: None,
            marks: vec!["sets".to_string()],
        },
        ..CollectOptions::default()
    };
    let collection = collect(&session, &options);

    let ids: Vec<&str> = collection.items().map(|i| i.nodeid.as_str()).collect();
    assert_eq!(
        ids,
        [
            "account::removal_of_items_from_set",
            "sets::set_length_check",
            "sets::shared_set_is_left_untouched",
        ]
    );
    assert_eq!(collection.deselected, 4);
}

#[test]
fn test_runs_are_repeatable() {
    let mut session = demo::session(&manifest_dir().join("demos")).expect("demo session");
    for feature in Feature::load_dir(&manifest_dir().join("features")).expect("features") {
        session.add_feature(feature);
    }

    let first = run_session(&session, &CollectOptions::default());
    let second = run_session(&session, &CollectOptions::default());
    assert_eq!(outcomes(&first), outcomes(&second));
    assert_eq!(first.summary, second.summary);
}

#[test]
fn test_demo_suites_exit_cleanly() {
    let mut session = demo::session(&manifest_dir().join("demos")).expect("demo session");
    for feature in Feature::load_dir(&manifest_dir().join("features")).expect("features") {
        session.add_feature(feature);
    }

    let report = run_session(&session, &CollectOptions::default());
    let failures: Vec<_> = report
        .items
        .iter()
        .filter(|i| i.outcome.is_failure())
        .map(|i| (&i.nodeid, &i.outcome))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert!(report.summary.xfailed > 0);
    assert!(report.summary.skipped >= 5);
    assert!(report.scope_errors.is_empty());
}

#[test]
fn test_missing_data_file_skips_the_data_test() {
    let dir = tempfile::tempdir().unwrap();
    let module = demo::config::data_module(dir.path());
    let mut session = Session::new();
    session.add_module(module);

    let report = run_session(&session, &CollectOptions::default());
    assert!(matches!(
        report.outcome("data::test_login_rows"),
        Some(Outcome::Skipped { .. })
    ));
}
