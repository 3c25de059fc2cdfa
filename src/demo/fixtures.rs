//! Fixture demonstrations: plain values, two-phase fixtures with teardown,
//! usefixtures, and fixtures built from other fixtures

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tempfile::TempDir;

use crate::check::{CheckResult, FailureKind};
use crate::common::Result;
use crate::engine::{Context, Mark, Session, TestCase, TestModule};
use crate::fixture::{FixtureDef, Scope, Setup};

/// The two halves of a week, shared by the whole run
#[derive(Debug, Clone)]
pub struct WeekHalves {
    pub first: Vec<String>,
    pub last: Vec<String>,
}

/// A file written by the `file_write` fixture
#[derive(Debug)]
pub struct WrittenFile {
    pub path: PathBuf,
    _dir: TempDir,
}

pub const FILE_CONTENT: &str = "Pytest is good.";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Session-wide fixtures every demo module can use
pub fn register_shared(session: &mut Session) -> Result<()> {
    session.fixture(FixtureDef::new("setup_city", |_| {
        tracing::debug!("fixture under execution");
        Ok(Setup::value(strings(&["Singapore", "Delhi", "Chicago", "Almaty"])))
    }))?;

    session.fixture(
        FixtureDef::new("week_halves", |_| {
            Ok(Setup::value(WeekHalves {
                first: strings(&["mon", "tue", "wed"]),
                last: strings(&["fri", "sat", "sun"]),
            }))
        })
        .scope(Scope::Session),
    )?;

    session.fixture(FixtureDef::new("file_write", |_| {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("file1.txt");
        fs::write(&path, FILE_CONTENT)?;
        tracing::debug!(path = %path.display(), "file written with data");

        Ok(Setup::with_teardown(
            WrittenFile { path, _dir: dir },
            |file: &mut WrittenFile| {
                fs::remove_file(&file.path)?;
                tracing::debug!("file deleted after test execution");
                Ok(())
            },
        ))
    }))?;

    Ok(())
}

fn week(ctx: &Context) -> CheckResult<&WeekHalves> {
    ctx.get::<WeekHalves>("week_halves")
}

fn reversed(list: &mut Vec<String>) -> Vec<String> {
    list.reverse();
    list.clone()
}

/// The `fixtures` demo module
pub fn module() -> Result<TestModule> {
    let mut module = TestModule::new("fixtures");

    module.fixture(
        FixtureDef::new("teardown_setup", |req| {
            let halves = req.get::<WeekHalves>("week_halves")?;
            let mut days = halves.first.clone();
            days.push("thur".to_string());

            Ok(Setup::with_teardown(days, |days: &mut Vec<String>| {
                tracing::debug!("week completed, teardown started");
                days.pop();
                Ok(())
            }))
        })
        .depends_on(["week_halves"]),
    )?;

    module.fixture(
        FixtureDef::new("days_2_manipulation", |req| {
            let halves = req.get::<WeekHalves>("week_halves")?;
            let mut days = halves.last.clone();
            days.insert(0, "thur".to_string());
            Ok(Setup::with_teardown(days, |_: &mut Vec<String>| {
                tracing::debug!("days_2 manipulation over");
                Ok(())
            }))
        })
        .depends_on(["week_halves"]),
    )?;

    module.test(
        TestCase::new("test_city", |ctx| {
            let city = ctx.get::<Vec<String>>("setup_city")?;
            check_eq!(city[0], "Singapore");
            let every_other: Vec<&String> = city.iter().step_by(2).collect();
            check_eq!(every_other, ["Singapore", "Chicago"]);
            Ok(())
        })
        .uses(["setup_city"]),
    );

    module.test(
        TestCase::new("test_city_reversed", |ctx| {
            let city = ctx.get_mut::<Vec<String>>("setup_city")?;
            let once = reversed(city);
            let expected: Vec<String> = once.iter().rev().cloned().collect();
            check_eq!(expected, reversed(city));
            Ok(())
        })
        .uses(["setup_city"]),
    );

    module.test(
        TestCase::new("test_always_true", |_| {
            check_eq!(1, 1);
            Ok(())
        })
        .mark(Mark::use_fixtures(["setup_city"])),
    );

    module.test(
        TestCase::new("test_fixture_access_using_mark", |ctx| {
            let city = ctx.get::<Vec<String>>("setup_city")?;
            check_eq!(city[0], "Singapore");
            Ok(())
        })
        .mark(Mark::use_fixtures(["setup_city"]))
        .mark(Mark::xfail_raises(
            "usefixtures cannot hand the fixture value to the test",
            FailureKind::Error,
        )),
    );

    module.test(
        TestCase::new("test_complete_week", |ctx| {
            let last = week(ctx)?.last.clone();
            let days = ctx.get_mut::<Vec<String>>("teardown_setup")?;
            days.extend(last);
            check_eq!(
                *days,
                ["mon", "tue", "wed", "thur", "fri", "sat", "sun"]
            );
            Ok(())
        })
        .uses(["teardown_setup", "week_halves"]),
    );

    module.test(
        TestCase::new("test_equal_length", |ctx| {
            let halves = week(ctx)?;
            let shifted = ctx.get::<Vec<String>>("days_2_manipulation")?;
            let extended = ctx.get::<Vec<String>>("teardown_setup")?;
            check_eq!(
                halves.first.len() + shifted.len(),
                extended.len() + halves.last.len()
            );
            Ok(())
        })
        .uses(["teardown_setup", "days_2_manipulation", "week_halves"]),
    );

    module.test(
        TestCase::new("test_file_data", |ctx| {
            let file = ctx.get::<WrittenFile>("file_write")?;
            let mut reader = BufReader::new(fs::File::open(&file.path)?);
            let mut first = String::new();
            reader.read_line(&mut first)?;
            check_eq!(first, FILE_CONTENT);
            Ok(())
        })
        .uses(["file_write"]),
    );

    Ok(module)
}
