//! Step library for the feature files under `features/`

use std::collections::BTreeSet;

use crate::bdd::{Keyword, StepDef};
use crate::check::{self, CheckResult};
use crate::common::Result;
use crate::engine::{Context, Session};
use crate::fixture::{FixtureDef, Scope, Setup};

type Fruits = BTreeSet<String>;

/// Fruit count for the outline scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basket {
    pub start: i64,
    pub eaten: i64,
}

fn set_of(items: &[&str]) -> Fruits {
    items.iter().map(|s| s.to_string()).collect()
}

fn fruits(ctx: &mut Context) -> CheckResult<&mut Fruits> {
    ctx.get_mut::<Fruits>("fruits")
}

/// Register the demo steps and the fixtures they read
pub fn register(session: &mut Session) -> Result<()> {
    account(session)?;
    fruit_set(session)?;
    countries(session)?;
    varieties(session)?;
    basket(session)?;
    Ok(())
}

fn account(session: &mut Session) -> Result<()> {
    session.step(StepDef::producing(
        Keyword::Given,
        "The account balance is {amount:d}",
        "balance",
        |_, args| {
            let amount = args.int("amount")?;
            tracing::debug!(amount, "starting account balance");
            Ok(amount)
        },
    )?);

    session.step(
        StepDef::when("The account holder withdraws {amount:d}", |ctx, args| {
            let amount = args.int("amount")?;
            *ctx.get_mut::<i64>("balance")? -= amount;
            Ok(())
        })?
        .uses(["balance"]),
    );

    session.step(
        StepDef::then("The account balance remaining should be {amount:d}", |ctx, args| {
            check_eq!(*ctx.get::<i64>("balance")?, args.int("amount")?);
            Ok(())
        })?
        .uses(["balance"]),
    );

    Ok(())
}

fn fruit_set(session: &mut Session) -> Result<()> {
    session.step(StepDef::producing(
        Keyword::Given,
        "A set of 3 fruits",
        "fruits",
        |_, _| Ok(set_of(&["apple", "mango", "banana"])),
    )?);

    session.step(
        StepDef::when("We remove a fruit from the set", |ctx, _| {
            let removed = fruits(ctx)?.pop_first();
            tracing::debug!(?removed, "fruit removed");
            Ok(())
        })?
        .uses(["fruits"]),
    );

    session.step(
        StepDef::then("The set will have {count:d} fruits", |ctx, args| {
            let count = args.int("count")?;
            check_eq!(fruits(ctx)?.len() as i64, count);
            Ok(())
        })?
        .uses(["fruits"]),
    );

    Ok(())
}

fn countries(session: &mut Session) -> Result<()> {
    session.fixture(
        FixtureDef::new("setup_set", |_| {
            let countries = set_of(&["India", "China", "US", "Germany"]);
            tracing::debug!(?countries, "forming set");
            Ok(Setup::value(countries))
        })
        .scope(Scope::Session),
    )?;

    session.step(
        StepDef::given("A datatype set", |ctx, _| {
            if ctx.get::<Fruits>("setup_set").is_err() {
                return check::xfail("setup_set is not a set");
            }
            Ok(())
        })?
        .uses(["setup_set"]),
    );

    session.step(
        StepDef::given("The Set is not empty", |ctx, _| {
            let len = ctx.get::<Fruits>("setup_set")?.len();
            if len == 0 {
                return check::xfail("set is empty");
            }
            tracing::debug!(len, "set size checked");
            Ok(())
        })?
        .uses(["setup_set"]),
    );

    session.step(
        StepDef::producing(Keyword::Given, "Set has {n:d} elements", "setup_set", |ctx, args| {
            let n = usize::try_from(args.int("n")?).map_err(|e| check::Failure::error(e.to_string()))?;
            let set = ctx.get::<Fruits>("setup_set")?;
            if set.is_empty() {
                return check::xfail("set is empty");
            }
            Ok(set.iter().take(n).cloned().collect::<Fruits>())
        })?
        .uses(["setup_set"]),
    );

    session.step(
        StepDef::when("We add 2 elements to the set", |ctx, _| {
            let set = ctx.get_mut::<Fruits>("setup_set")?;
            set.insert("UK".to_string());
            set.insert("Russia".to_string());
            Ok(())
        })?
        .uses(["setup_set"]),
    );

    session.step(
        StepDef::then("Set now has {n:d} elements", |ctx, args| {
            let len = ctx.get::<Fruits>("setup_set")?.len();
            check_eq!(len as i64, args.int("n")?);
            Ok(())
        })?
        .uses(["setup_set"]),
    );

    Ok(())
}

fn varieties(session: &mut Session) -> Result<()> {
    session.step(StepDef::producing(
        Keyword::Given,
        "There are 3 varieties of fruit",
        "fruits",
        |_, _| Ok(set_of(&["apple", "grapes", "strawberry"])),
    )?);

    session.step(
        StepDef::when("We add a same variety of fruit", |ctx, _| {
            fruits(ctx)?.insert("grapes".to_string());
            Ok(())
        })?
        .uses(["fruits"]),
    );

    session.step(
        StepDef::then("There is same count of varieties", |ctx, _| {
            check_eq!(fruits(ctx)?.len(), 3);
            Ok(())
        })?
        .uses(["fruits"]),
    );

    session.step(
        StepDef::then("If we add a different variety of fruit", |ctx, _| {
            fruits(ctx)?.insert("Tomato".to_string());
            Ok(())
        })?
        .uses(["fruits"]),
    );

    session.step(
        StepDef::then("The count of varieties increases to {count:d}", |ctx, args| {
            let count = args.int("count")?;
            check_eq!(fruits(ctx)?.len() as i64, count);
            Ok(())
        })?
        .uses(["fruits"]),
    );

    Ok(())
}

fn basket(session: &mut Session) -> Result<()> {
    session.step(StepDef::producing(
        Keyword::Given,
        "We have {count:d} fruits",
        "start_fruits",
        |_, args| {
            Ok(Basket {
                start: args.int("count")?,
                eaten: 0,
            })
        },
    )?);

    session.step(
        StepDef::when("I eat {eat:d} fruits", |ctx, args| {
            ctx.get_mut::<Basket>("start_fruits")?.eaten += args.int("eat")?;
            Ok(())
        })?
        .uses(["start_fruits"]),
    );

    session.step(
        StepDef::then("I should have {left:d} fruits", |ctx, args| {
            let basket = ctx.get::<Basket>("start_fruits")?;
            check_eq!(basket.start - basket.eaten, args.int("left")?);
            Ok(())
        })?
        .uses(["start_fruits"]),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new();
        register(&mut session).unwrap();
        session
    }

    #[test]
    fn test_every_demo_step_text_binds_to_one_definition() {
        let session = session();
        let lines = [
            (Keyword::Given, "The account balance is 100"),
            (Keyword::When, "The account holder withdraws 30"),
            (Keyword::Then, "The account balance remaining should be 70"),
            (Keyword::Given, "A set of 3 fruits"),
            (Keyword::When, "We remove a fruit from the set"),
            (Keyword::Then, "The set will have 2 fruits"),
            (Keyword::Given, "A datatype set"),
            (Keyword::Given, "The Set is not empty"),
            (Keyword::Given, "Set has 3 elements"),
            (Keyword::When, "We add 2 elements to the set"),
            (Keyword::Then, "Set now has 5 elements"),
            (Keyword::Given, "There are 3 varieties of fruit"),
            (Keyword::When, "We add a same variety of fruit"),
            (Keyword::Then, "There is same count of varieties"),
            (Keyword::Then, "If we add a different variety of fruit"),
            (Keyword::Then, "The count of varieties increases to 4"),
            (Keyword::Given, "We have 12 fruits"),
            (Keyword::When, "I eat 5 fruits"),
            (Keyword::Then, "I should have 7 fruits"),
        ];
        for (keyword, text) in lines {
            assert!(
                session.steps().find(keyword, text).is_ok(),
                "{keyword} {text}"
            );
        }
    }

    #[test]
    fn test_keyword_kind_is_part_of_the_match() {
        let session = session();
        assert!(session.steps().find(Keyword::When, "A set of 3 fruits").is_err());
    }

    #[test]
    fn test_steps_register_the_set_fixture() {
        let session = session();
        let def = session.fixtures().get("setup_set").unwrap();
        assert_eq!(def.get_scope(), Scope::Session);
    }
}
