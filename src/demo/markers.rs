//! Marker demonstrations: labels for `-m`, skip, skip-if, xfail, and a
//! parametrized conversion table

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::check::{approx_eq, raises, CheckResult, Failure, FailureKind};
use crate::collab::IniConfig;
use crate::engine::{Mark, ParamRow, TestCase, TestModule};
use crate::row;

const CENT: [i64; 5] = [8, 42, 100, 23, 35];
const FAREN: [f64; 5] = [46.4, 107.6, 212.0, 73.4, 95.0];
const CONVERSION: f64 = 9.0 / 5.0;

/// Labels every test in this module carries
const MODULE_MARKS: [&str; 3] = ["markerr", "temp_conversion", "str_test"];

fn cent_to_faren(cent: f64) -> f64 {
    cent * CONVERSION + 32.0
}

fn marked(mut case: TestCase) -> TestCase {
    for name in MODULE_MARKS {
        case = case.mark(Mark::tag(name));
    }
    case
}

/// Connect to a local port nothing listens on
fn closed_port() -> CheckResult {
    let addr = SocketAddr::from(([127, 0, 0, 1], 9));
    TcpStream::connect_timeout(&addr, Duration::from_millis(200))?;
    Ok(())
}

/// The `markers` demo module
pub fn module() -> TestModule {
    let mut module = TestModule::new("markers");

    let conversions: Vec<ParamRow> = CENT.iter().zip(FAREN).map(|(&c, f)| row![c, f]).collect();
    module.test(marked(
        TestCase::new("test_conversion", |ctx| {
            let result = cent_to_faren(ctx.float("cent")?);
            let expected = ctx.float("expected")?;
            check!(
                approx_eq(result, expected, 1e-3),
                "{} != {} within 0.1%",
                result,
                expected
            );
            Ok(())
        })
        .mark(Mark::tag("temp_conversion"))
        .parametrize("cent, expected", conversions),
    ));

    module.test(marked(
        TestCase::new("test_no_input", |_| {
            check_eq!(cent_to_faren(f64::default()), 32.0);
            Ok(())
        })
        .mark(Mark::tag("temp_conversion")),
    ));

    module.test(marked(
        TestCase::new("test_datatype_confirm_float", |ctx| {
            let result = cent_to_faren(ctx.float("temperature")?);
            check!(result.is_finite());
            Ok(())
        })
        .mark(Mark::skip("Skipping Test"))
        .parametrize("temperature", CENT.iter().map(|&c| row![c])),
    ));

    module.test(marked(
        TestCase::new("test_unreachable_service", |_| {
            let failure = raises(closed_port)?;
            check_eq!(failure.kind, FailureKind::External);
            Ok(())
        })
        .mark(Mark::skip_if(
            |env| env.var("STEPRUN_OFFLINE").is_some(),
            "STEPRUN_OFFLINE is set",
        ))
        .mark(Mark::skip_if(
            |env| !env.version_matches(">=0.1"),
            "needs steprun 0.1 or newer",
        )),
    ));

    module.test(marked(
        TestCase::new("test_str_slice", |_| {
            let letters = "abcdefghijklmnopqrstuvwxyz";
            check_eq!(&letters[..3], "abc");
            check_eq!(&letters[letters.len() - 3..], "xyz");
            let stepped: String = letters[..21].chars().step_by(5).collect();
            check_eq!(stepped, "afkpu");
            let reversed: String = letters.chars().rev().collect();
            check_eq!(reversed, "zyxwvutsrqponmlkjihgfedcba");
            Ok(())
        })
        .mark(Mark::tag("str_test")),
    ));

    module.test(marked(
        TestCase::new("test_str_split", |_| {
            let s = "My name is Aman and, I am a Python Developer";
            check_eq!(
                s.split_whitespace().collect::<Vec<_>>(),
                ["My", "name", "is", "Aman", "and,", "I", "am", "a", "Python", "Developer"]
            );
            check_eq!(
                s.split(',').collect::<Vec<_>>(),
                ["My name is Aman and", " I am a Python Developer"]
            );
            Ok(())
        })
        .mark(Mark::tag("str_test")),
    ));

    module.test(marked(
        TestCase::new("test_missing_credentials_xfail", |_| {
            let config = IniConfig::parse("[gmail]\nurl = qa.gmail.com\n", "inline")?;
            let token = config.get("gmail", "token")?;
            check!(!token.is_empty());
            Ok(())
        })
        .mark(Mark::xfail_raises("Expected to fail", FailureKind::External)),
    ));

    module.test(marked(TestCase::new("test_strict_xfail_holds", |_| {
        Err(Failure::assertion("still broken"))
    }))
    .mark(Mark::xfail_strict("tracked regression")));

    module
}
