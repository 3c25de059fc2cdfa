//! Assertion demonstrations: comparisons with messages, parametrized rows
//! that are known to fail, and expecting failures with `raises`

use std::hint::black_box;

use crate::check::{raises, CheckResult, Failure, FailureKind};
use crate::engine::{Mark, ParamRow, TestCase, TestModule};
use crate::row;

fn greater_rows() -> Vec<ParamRow> {
    vec![
        row![9, 5],
        row![5, 9].mark(Mark::xfail("5 is not greater than 9")),
        row![5, 4],
        row![10, 5],
    ]
}

fn func1() -> CheckResult {
    Err(Failure::error("Exception func1"))
}

/// The `assertions` demo module
pub fn module() -> TestModule {
    let mut module = TestModule::new("assertions");

    module.test(
        TestCase::new("test_greater", |ctx| {
            let (a, b) = (ctx.int("a")?, ctx.int("b")?);
            check!(a > b, "{} is not greater than {}", a, b);
            Ok(())
        })
        .parametrize("a, b", greater_rows()),
    );

    module.test(
        TestCase::new("test_greater_ascending", |ctx| {
            let (a, b) = (ctx.int("a")?, ctx.int("b")?);
            check!(b > a, "{} is not greater than {}", b, a);
            Ok(())
        })
        .parametrize(
            "a, b",
            [
                row![1, 2],
                row![3, 4],
                row![5, 6],
                row![7, 8],
                row![10, 9].mark(Mark::xfail_raises("last row is reversed", FailureKind::Assertion)),
            ],
        ),
    );

    module.test(TestCase::new("test_true", |_| {
        check!(!"non-empty".is_empty());
        Ok(())
    }));

    module.test(TestCase::new("test_cmpr_string_char", |_| {
        check_eq!("ab", String::from("ab"));
        Ok(())
    }));

    module.test(
        TestCase::new("test_divmod", |ctx| {
            let (a, b) = (ctx.int("a")?, ctx.int("b")?);
            let (quotient, remainder) = (a / b, a % b);
            check!(
                quotient == 1 || remainder == 1,
                "1 is not in divmod({}, {}) = ({}, {})",
                a,
                b,
                quotient,
                remainder
            );
            Ok(())
        })
        .parametrize(
            "a, b",
            [
                row![9, 5],
                row![5, 9].mark(Mark::xfail("divmod(5, 9) is (0, 5)")),
                row![5, 4],
                row![10, 5].mark(Mark::xfail("divmod(10, 5) is (2, 0)")),
            ],
        ),
    );

    module.test(TestCase::new("test_find_in_string", |_| {
        check!("This is pytest.".contains("py"));
        Ok(())
    }));

    module.test(TestCase::new("test_is_not_in_string", |_| {
        check!(!"This is pytest.".contains("put"));
        Ok(())
    }));

    module.test(TestCase::new("test_zero_divisibility", |_| {
        let failure = raises(|| -> CheckResult<i64> { Ok(1 / black_box(0_i64)) })?;
        check!(failure.message.contains("divide by zero"), "{}", failure.message);
        Ok(())
    }));

    module.test(
        TestCase::new("test_equation", |ctx| {
            let (a, b) = (ctx.int("a")?, ctx.int("b")?);
            let lhs = (a + b) * (a - b);
            let rhs = a * a - b * b;
            check_eq!(lhs, rhs);
            Ok(())
        })
        .parametrize("a, b", [row![1, 2], row![2, 1]]),
    );

    module.test(TestCase::new("test_error_assert", |_| {
        let failure = raises(func1)?;
        check_eq!(failure.message, "Exception func1");
        Ok(())
    }));

    module.test(TestCase::new("test_tuple_cmpr", |_| {
        let failure = raises(|| -> CheckResult {
            check_eq!((1, 2, 3), (1, 2, 4));
            Ok(())
        })?;
        check_eq!(failure.kind, FailureKind::Assertion);
        Ok(())
    }));

    module
}
