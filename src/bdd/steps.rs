//! Step definitions and the registry scenarios are bound against

use std::any::Any;
use std::fmt;

use super::feature::Keyword;
use super::pattern::{StepArgs, StepPattern};
use crate::check::CheckResult;
use crate::common::{Error, Result};
use crate::engine::context::Context;
use crate::value::Value;

type RunFn = Box<dyn Fn(&mut Context, &StepArgs) -> CheckResult>;
type ProduceFn = Box<dyn Fn(&mut Context, &StepArgs) -> CheckResult<Value>>;

/// What a step does when it runs
pub enum StepAction {
    /// Act on the context
    Run(RunFn),
    /// Produce a value that replaces `target` for the following steps
    Produce { target: String, produce: ProduceFn },
}

/// A step definition: keyword, pattern, the fixtures it reads, and its action
pub struct StepDef {
    keyword: Keyword,
    pattern: StepPattern,
    uses: Vec<String>,
    action: StepAction,
}

impl StepDef {
    pub fn new<F>(keyword: Keyword, pattern: &str, run: F) -> Result<Self>
    where
        F: Fn(&mut Context, &StepArgs) -> CheckResult + 'static,
    {
        Ok(Self {
            keyword,
            pattern: StepPattern::compile(pattern)?,
            uses: Vec::new(),
            action: StepAction::Run(Box::new(run)),
        })
    }

    /// A step whose return value replaces `target` in the context
    ///
    /// `target` counts as produced for every later step of the scenario, so
    /// those steps do not pull in a fixture of the same name.
    pub fn producing<T, F>(keyword: Keyword, pattern: &str, target: &str, produce: F) -> Result<Self>
    where
        T: Any,
        F: Fn(&mut Context, &StepArgs) -> CheckResult<T> + 'static,
    {
        Ok(Self {
            keyword,
            pattern: StepPattern::compile(pattern)?,
            uses: Vec::new(),
            action: StepAction::Produce {
                target: target.to_string(),
                produce: Box::new(move |ctx, args| produce(ctx, args).map(Value::new)),
            },
        })
    }

    pub fn given<F>(pattern: &str, run: F) -> Result<Self>
    where
        F: Fn(&mut Context, &StepArgs) -> CheckResult + 'static,
    {
        Self::new(Keyword::Given, pattern, run)
    }

    pub fn when<F>(pattern: &str, run: F) -> Result<Self>
    where
        F: Fn(&mut Context, &StepArgs) -> CheckResult + 'static,
    {
        Self::new(Keyword::When, pattern, run)
    }

    pub fn then<F>(pattern: &str, run: F) -> Result<Self>
    where
        F: Fn(&mut Context, &StepArgs) -> CheckResult + 'static,
    {
        Self::new(Keyword::Then, pattern, run)
    }

    /// Declare context names this step reads
    pub fn uses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uses.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    pub fn used(&self) -> &[String] {
        &self.uses
    }

    /// Name this step produces, if it is a producing step
    pub fn target(&self) -> Option<&str> {
        match &self.action {
            StepAction::Run(_) => None,
            StepAction::Produce { target, .. } => Some(target),
        }
    }

    /// Run the step against `ctx`
    pub fn call(&self, ctx: &mut Context, args: &StepArgs) -> CheckResult {
        match &self.action {
            StepAction::Run(run) => run(ctx, args),
            StepAction::Produce { target, produce } => {
                let value = produce(ctx, args)?;
                ctx.replace(target, value);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for StepDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDef")
            .field("keyword", &self.keyword)
            .field("pattern", &self.pattern.as_str())
            .field("uses", &self.uses)
            .field("target", &self.target())
            .finish()
    }
}

/// All step definitions of a session
#[derive(Debug, Default)]
pub struct StepRegistry {
    defs: Vec<StepDef>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition and return its index
    pub fn register(&mut self, def: StepDef) -> usize {
        tracing::debug!(keyword = %def.keyword, pattern = def.pattern.as_str(), "registered step");
        self.defs.push(def);
        self.defs.len() - 1
    }

    /// Find the single definition of `keyword` that matches `text`
    pub fn find(&self, keyword: Keyword, text: &str) -> Result<(usize, StepArgs)> {
        let mut found: Vec<(usize, StepArgs)> = self
            .defs
            .iter()
            .enumerate()
            .filter(|(_, def)| def.keyword == keyword)
            .filter_map(|(index, def)| def.pattern.matches(text).map(|args| (index, args)))
            .collect();

        match found.len() {
            0 => Err(Error::StepNotFound {
                keyword: keyword.to_string(),
                text: text.to_string(),
            }),
            1 => Ok(found.remove(0)),
            _ => {
                let candidates = found
                    .iter()
                    .map(|(index, _)| format!("'{}'", self.defs[*index].pattern.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(Error::AmbiguousStep {
                    keyword: keyword.to_string(),
                    text: text.to_string(),
                    candidates,
                })
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&StepDef> {
        self.defs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StepRegistry {
        let mut steps = StepRegistry::new();
        steps
            .register(StepDef::given("The account balance is {balance:d}", |_, _| Ok(())).unwrap());
        steps.register(StepDef::when("I withdraw {amount:d}", |_, _| Ok(())).unwrap());
        steps.register(StepDef::when("I withdraw everything", |_, _| Ok(())).unwrap());
        steps
    }

    #[test]
    fn test_find_matches_keyword_and_text() {
        let steps = registry();
        let (index, args) = steps.find(Keyword::Given, "The account balance is 100").unwrap();
        assert_eq!(index, 0);
        assert_eq!(args.int("balance").unwrap(), 100);

        let (index, _) = steps.find(Keyword::When, "I withdraw everything").unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn test_keyword_must_match() {
        let steps = registry();
        let err = steps.find(Keyword::Then, "I withdraw 30").unwrap_err();
        assert!(matches!(err, Error::StepNotFound { keyword, .. } if keyword == "Then"));
    }

    #[test]
    fn test_ambiguous_step_lists_candidates() {
        let mut steps = registry();
        steps.register(StepDef::when("I withdraw {what}", |_, _| Ok(())).unwrap());

        let err = steps.find(Keyword::When, "I withdraw 30").unwrap_err();
        match err {
            Error::AmbiguousStep { candidates, .. } => {
                assert!(candidates.contains("'I withdraw {amount:d}'"));
                assert!(candidates.contains("'I withdraw {what}'"));
            }
            other => panic!("Expected AmbiguousStep, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern_is_rejected_at_definition() {
        let err = StepDef::given("broken {", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_producing_step_replaces_target() {
        let def = StepDef::producing(Keyword::Given, "a balance of {n:d}", "balance", |_, args| {
            args.int("n")
        })
        .unwrap();
        assert_eq!(def.target(), Some("balance"));

        let mut ctx = Context::new("account::withdraw");
        let args = def.pattern().matches("a balance of 100").unwrap();
        def.call(&mut ctx, &args).unwrap();
        assert_eq!(*ctx.get::<i64>("balance").unwrap(), 100);
    }
}
