//! Collection: turns a session into executable items
//!
//! Every test is expanded over its parameter rows and the parameters of the
//! fixtures it resolves to, every scenario over its example rows. Fixture
//! plans are resolved here, so a configuration problem stops the run before
//! any test executes.

use std::collections::HashSet;

use super::case::{Session, TestCase, TestModule};
use super::marker::{Environment, ItemMarks, Mark, BUILTIN_MARKS};
use crate::bdd::{bind, requirements, BoundStep, Feature};
use crate::common::{Error, Result};
use crate::fixture::{resolve, FixtureDef, FixtureLookup};
use crate::value::Param;

/// One fixture an item sets up, in setup order
#[derive(Debug, Clone, Copy)]
pub struct PlannedFixture<'s> {
    pub def: &'s FixtureDef,
    /// Index into the fixture's parameter list
    pub param: Option<usize>,
    /// Whether the item asked for the value (as opposed to usefixtures or a
    /// transitive dependency)
    pub visible: bool,
}

/// What an item runs
#[derive(Debug)]
pub enum ItemKind<'s> {
    Test(&'s TestCase),
    /// Bound steps, or the binding error that makes the item an error
    Scenario(std::result::Result<Vec<BoundStep>, Error>),
}

/// An executable unit: one test or scenario with one parameter choice
#[derive(Debug)]
pub struct Item<'s> {
    pub nodeid: String,
    pub params: Vec<(String, Param)>,
    pub plan: Vec<PlannedFixture<'s>>,
    pub marks: ItemMarks,
    pub kind: ItemKind<'s>,
}

/// Items of one module or feature file
#[derive(Debug)]
pub struct ModuleItems<'s> {
    pub name: String,
    pub items: Vec<Item<'s>>,
}

/// `-k` and `-m` filters
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub keyword: Option<String>,
    pub marks: Vec<String>,
}

impl Selection {
    /// Whether an item passes every filter
    ///
    /// Each filter is a substring (or mark name), optionally prefixed with
    /// `not `. All `-m` filters must hold.
    pub fn matches(&self, nodeid: &str, marks: &ItemMarks) -> bool {
        let keyword_ok = self.keyword.as_deref().map_or(true, |expr| {
            let (negated, text) = split_not(expr);
            nodeid.contains(text) != negated
        });
        keyword_ok
            && self.marks.iter().all(|expr| {
                let (negated, name) = split_not(expr);
                marks.has(name) != negated
            })
    }
}

fn split_not(expr: &str) -> (bool, &str) {
    match expr.trim().strip_prefix("not ") {
        Some(rest) => (true, rest.trim()),
        None => (false, expr.trim()),
    }
}

/// Collection settings
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub selection: Selection,
    pub strict_markers: bool,
    pub registered_markers: Vec<String>,
    pub environment: Environment,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            strict_markers: false,
            registered_markers: Vec::new(),
            environment: Environment::capture(),
        }
    }
}

/// Result of collection
#[derive(Debug, Default)]
pub struct Collection<'s> {
    pub modules: Vec<ModuleItems<'s>>,
    /// Items filtered out by `-k` / `-m`
    pub deselected: usize,
    /// Errors that make the run invalid
    pub errors: Vec<Error>,
}

impl<'s> Collection<'s> {
    pub fn len(&self) -> usize {
        self.modules.iter().map(|m| m.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> impl Iterator<Item = &Item<'s>> {
        self.modules.iter().flat_map(|m| m.items.iter())
    }
}

/// Collect every test module, then every feature file
pub fn collect<'s>(session: &'s Session, options: &CollectOptions) -> Collection<'s> {
    let mut collection = Collection::default();
    let mut collector = Collector {
        options,
        deselected: 0,
        errors: Vec::new(),
        seen: HashSet::new(),
    };

    for module in &session.modules {
        let lookup = FixtureLookup::with_local(&session.fixtures, &module.fixtures);
        let items = collector.module(module, lookup);
        collection.modules.push(ModuleItems {
            name: module.name.clone(),
            items,
        });
    }

    for feature in &session.features {
        let lookup = FixtureLookup::new(&session.fixtures);
        let items = collector.feature(session, feature, lookup);
        collection.modules.push(ModuleItems {
            name: feature.module_name(),
            items,
        });
    }

    collection.deselected = collector.deselected;
    collection.errors = collector.errors;
    tracing::info!(
        items = collection.len(),
        deselected = collection.deselected,
        errors = collection.errors.len(),
        "collected"
    );
    collection
}

/// One combination of a test's own parameter rows
struct RowChoice {
    label: Vec<String>,
    params: Vec<(String, Param)>,
    marks: Vec<Mark>,
}

struct Collector<'o> {
    options: &'o CollectOptions,
    deselected: usize,
    errors: Vec<Error>,
    /// Node ids handed out so far, selected or not
    seen: HashSet<String>,
}

impl<'o> Collector<'o> {
    fn check_markers<'m>(&mut self, marks: impl IntoIterator<Item = &'m Mark>, item: &str) {
        if !self.options.strict_markers {
            return;
        }
        for mark in marks {
            if mark.is_custom()
                && !self
                    .options
                    .registered_markers
                    .iter()
                    .any(|r| r == mark.name())
            {
                let reported = self.errors.iter().any(|e| match e {
                    Error::UnknownMarker { name, item: at } => name == mark.name() && at == item,
                    _ => false,
                });
                if !reported {
                    self.errors.push(Error::UnknownMarker {
                        name: mark.name().to_string(),
                        item: item.to_string(),
                    });
                }
            }
        }
    }

    fn module<'s>(&mut self, module: &'s TestModule, lookup: FixtureLookup<'s>) -> Vec<Item<'s>> {
        let mut items = Vec::new();
        for case in &module.tests {
            let test_id = format!("{}::{}", module.name, case.name);
            self.check_markers(&case.marks, &test_id);
            for set in &case.parametrize {
                for row in &set.rows {
                    self.check_markers(&row.marks, &test_id);
                }
            }

            let rows = match row_choices(case, &test_id) {
                Ok(rows) => rows,
                Err(e) => {
                    self.errors.push(e);
                    continue;
                }
            };

            for row in rows {
                let marks = ItemMarks::evaluate(
                    case.marks.iter().chain(row.marks.iter()),
                    &self.options.environment,
                );
                let mut requested = case.uses.clone();
                for name in &marks.use_fixtures {
                    if !requested.contains(name) {
                        requested.push(name.clone());
                    }
                }

                let expanded = self.expand(
                    &lookup,
                    &test_id,
                    &requested,
                    &case.uses,
                    row.label,
                    marks,
                );
                for (nodeid, plan, marks) in expanded {
                    self.push(
                        &mut items,
                        Item {
                            nodeid,
                            params: row.params.clone(),
                            plan,
                            marks,
                            kind: ItemKind::Test(case),
                        },
                    );
                }
            }
        }
        items
    }

    fn feature<'s>(
        &mut self,
        session: &'s Session,
        feature: &'s Feature,
        lookup: FixtureLookup<'s>,
    ) -> Vec<Item<'s>> {
        let module = feature.module_name();
        let mut items = Vec::new();

        for scenario in &feature.scenarios {
            let scenario_id = format!("{}::{}", module, slug(&scenario.name));

            for run in scenario.expand() {
                let mut tags = feature.tags.clone();
                for tag in run.tags {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                let marks: Vec<Mark> = tags.iter().map(|t| Mark::from_tag(t)).collect();
                self.check_markers(&marks, &scenario_id);
                let marks = ItemMarks::evaluate(&marks, &self.options.environment);

                let mut steps = feature.background.clone();
                steps.extend(run.steps);
                let label: Vec<String> = run.label.into_iter().collect();

                let bound = match bind(&session.steps, &steps) {
                    Ok(bound) => bound,
                    Err(e) if e.is_fatal_to_collection() => {
                        self.errors.push(e);
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(scenario = %scenario_id, error = %e, "step binding failed");
                        let nodeid = node_id(&scenario_id, &label);
                        self.push(
                            &mut items,
                            Item {
                                nodeid,
                                params: Vec::new(),
                                plan: Vec::new(),
                                marks,
                                kind: ItemKind::Scenario(Err(e)),
                            },
                        );
                        continue;
                    }
                };

                let requested = requirements(&session.steps, &bound);
                let expanded =
                    self.expand(&lookup, &scenario_id, &requested, &requested, label, marks);
                for (nodeid, plan, marks) in expanded {
                    self.push(
                        &mut items,
                        Item {
                            nodeid,
                            params: Vec::new(),
                            plan,
                            marks,
                            kind: ItemKind::Scenario(Ok(bound.clone())),
                        },
                    );
                }
            }
        }
        items
    }

    /// Resolve fixtures and cross the row with fixture parameters
    ///
    /// Skipped items are not resolved and get a single empty plan.
    fn expand<'s>(
        &mut self,
        lookup: &FixtureLookup<'s>,
        base_id: &str,
        requested: &[String],
        visible: &[String],
        label: Vec<String>,
        marks: ItemMarks,
    ) -> Vec<(String, Vec<PlannedFixture<'s>>, ItemMarks)> {
        if marks.skip.is_some() {
            return vec![(node_id(base_id, &label), Vec::new(), marks)];
        }

        let order = match resolve(lookup, requested, base_id) {
            Ok(order) => order,
            Err(e) => {
                self.errors.push(e);
                return Vec::new();
            }
        };

        let mut combos: Vec<(Vec<String>, Vec<PlannedFixture<'s>>)> = vec![(label, Vec::new())];
        for def in order {
            let visible = visible.iter().any(|v| v == def.name());
            if !def.is_parametrized() {
                for (_, plan) in combos.iter_mut() {
                    plan.push(PlannedFixture {
                        def,
                        param: None,
                        visible,
                    });
                }
                continue;
            }

            let mut next = Vec::new();
            for (label, plan) in &combos {
                for (index, param) in def.param_values().iter().enumerate() {
                    let mut label = label.clone();
                    label.push(param.id.clone());
                    let mut plan = plan.clone();
                    plan.push(PlannedFixture {
                        def,
                        param: Some(index),
                        visible,
                    });
                    next.push((label, plan));
                }
            }
            combos = next;
        }

        combos
            .into_iter()
            .map(|(label, plan)| (node_id(base_id, &label), plan, marks.clone()))
            .collect()
    }

    fn push<'s>(&mut self, items: &mut Vec<Item<'s>>, mut item: Item<'s>) {
        item.nodeid = self.unique_id(item.nodeid);
        if self.options.selection.matches(&item.nodeid, &item.marks) {
            items.push(item);
        } else {
            tracing::debug!(node = %item.nodeid, "deselected");
            self.deselected += 1;
        }
    }

    /// Suffix a repeated node id with its position among the repeats
    ///
    /// `a::b` becomes `a::b[2]`, `a::b[x-y]` becomes `a::b[x-y-2]`.
    fn unique_id(&mut self, nodeid: String) -> String {
        if self.seen.insert(nodeid.clone()) {
            return nodeid;
        }
        let mut position = 2;
        loop {
            let candidate = match nodeid.strip_suffix(']') {
                Some(open) => format!("{open}-{position}]"),
                None => format!("{nodeid}[{position}]"),
            };
            if self.seen.insert(candidate.clone()) {
                tracing::debug!(node = %nodeid, renamed = %candidate, "duplicate node id");
                return candidate;
            }
            position += 1;
        }
    }
}

/// Cross product of a test's parametrize sets, first set outermost
fn row_choices(case: &TestCase, test_id: &str) -> Result<Vec<RowChoice>> {
    let mut choices = vec![RowChoice {
        label: Vec::new(),
        params: Vec::new(),
        marks: Vec::new(),
    }];

    for set in &case.parametrize {
        let mut next = Vec::new();
        for choice in &choices {
            for row in &set.rows {
                if row.values.len() != set.names.len() {
                    return Err(Error::ParamArity {
                        test: test_id.to_string(),
                        expected: set.names.len(),
                        found: row.values.len(),
                    });
                }
                let mut label = choice.label.clone();
                label.push(row.label());
                let mut params = choice.params.clone();
                params.extend(set.names.iter().cloned().zip(row.values.iter().cloned()));
                let mut marks = choice.marks.clone();
                marks.extend(row.marks.iter().cloned());
                next.push(RowChoice {
                    label,
                    params,
                    marks,
                });
            }
        }
        choices = next;
    }

    Ok(choices)
}

fn node_id(base: &str, label: &[String]) -> String {
    if label.is_empty() {
        base.to_string()
    } else {
        format!("{}[{}]", base, label.join("-"))
    }
}

/// Scenario name as a node id segment
fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Tag names in use that strict mode would reject
pub fn unregistered_tags<'a>(names: impl IntoIterator<Item = &'a str>, registered: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|n| !BUILTIN_MARKS.contains(n) && !registered.iter().any(|r| r == n))
        .filter(|n| seen.insert(*n))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::{Keyword, StepDef};
    use crate::engine::case::{ParamRow, TestCase};
    use crate::fixture::{ParamValue, Scope, Setup};
    use semver::Version;
    use std::collections::HashMap;
    use std::path::Path;

    fn options() -> CollectOptions {
        CollectOptions {
            environment: Environment {
                os: "linux".to_string(),
                vars: HashMap::new(),
                version: Version::new(0, 1, 0),
            },
            ..CollectOptions::default()
        }
    }

    fn ids(collection: &Collection<'_>) -> Vec<String> {
        collection.items().map(|i| i.nodeid.clone()).collect()
    }

    #[test]
    fn test_parametrize_labels_and_order() {
        let mut module = TestModule::new("markers");
        module.test(
            TestCase::new("test_conversion", |_| Ok(())).parametrize(
                "cent, expected",
                [crate::row![8, 46.4], crate::row![42, 107.6], crate::row![100, 212.0]],
            ),
        );
        let mut session = Session::new();
        session.add_module(module);

        let collection = collect(&session, &options());
        assert!(collection.errors.is_empty());
        assert_eq!(
            ids(&collection),
            vec![
                "markers::test_conversion[8-46.4]",
                "markers::test_conversion[42-107.6]",
                "markers::test_conversion[100-212]",
            ]
        );
        let first = collection.items().next().unwrap();
        assert_eq!(first.params[0], ("cent".to_string(), Param::Int(8)));
    }

    #[test]
    fn test_sets_and_fixture_params_multiply() {
        let mut session = Session::new();
        session
            .fixture(
                FixtureDef::new("env", |req| Ok(Setup::value(req.param()?.to_string())))
                    .params([ParamValue::new("qa"), ParamValue::new("prod")]),
            )
            .unwrap();
        let mut module = TestModule::new("m");
        module.test(
            TestCase::new("t", |_| Ok(()))
                .uses(["env"])
                .parametrize("a", [crate::row![1], crate::row![2]])
                .parametrize("b", [crate::row!["x"]]),
        );
        session.add_module(module);

        let collection = collect(&session, &options());
        assert_eq!(
            ids(&collection),
            vec!["m::t[1-x-qa]", "m::t[1-x-prod]", "m::t[2-x-qa]", "m::t[2-x-prod]"]
        );
    }

    #[test]
    fn test_arity_mismatch_is_a_collection_error() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("t", |_| Ok(())).parametrize("a, b", [crate::row![1]]));
        let mut session = Session::new();
        session.add_module(module);

        let collection = collect(&session, &options());
        assert!(matches!(
            collection.errors[0],
            Error::ParamArity { expected: 2, found: 1, .. }
        ));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_unknown_fixture_is_a_collection_error() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("t", |_| Ok(())).uses(["ghost"]));
        let mut session = Session::new();
        session.add_module(module);

        let collection = collect(&session, &options());
        assert!(matches!(
            &collection.errors[0],
            Error::UnknownFixture { name, .. } if name == "ghost"
        ));
    }

    #[test]
    fn test_skipped_items_are_not_resolved() {
        let mut module = TestModule::new("m");
        module.test(
            TestCase::new("t", |_| Ok(()))
                .uses(["ghost"])
                .mark(Mark::skip("later")),
        );
        let mut session = Session::new();
        session.add_module(module);

        let collection = collect(&session, &options());
        assert!(collection.errors.is_empty());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_use_fixtures_are_planned_but_hidden() {
        let mut session = Session::new();
        session
            .fixture(FixtureDef::new("base", |_| Ok(Setup::value(1))).scope(Scope::Session))
            .unwrap();
        session
            .fixture(FixtureDef::new("city", |_| Ok(Setup::value(2))).depends_on(["base"]))
            .unwrap();
        let mut module = TestModule::new("m");
        module.test(
            TestCase::new("t", |_| Ok(()))
                .uses(["city"])
                .mark(Mark::use_fixtures(["base"])),
        );
        session.add_module(module);

        let collection = collect(&session, &options());
        let item = collection.items().next().unwrap();
        let plan: Vec<(&str, bool)> = item.plan.iter().map(|p| (p.def.name(), p.visible)).collect();
        assert_eq!(plan, vec![("base", false), ("city", true)]);
    }

    #[test]
    fn test_selection_by_keyword_and_mark() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("test_str_slice", |_| Ok(())).mark(Mark::tag("str_test")));
        module.test(TestCase::new("test_str_split", |_| Ok(())).mark(Mark::tag("str_test")));
        module.test(TestCase::new("test_no_input", |_| Ok(())));
        let mut session = Session::new();
        session.add_module(module);

        let mut opts = options();
        opts.selection.marks = vec!["str_test".to_string()];
        opts.selection.keyword = Some("not split".to_string());
        let collection = collect(&session, &opts);
        assert_eq!(ids(&collection), vec!["m::test_str_slice"]);
        assert_eq!(collection.deselected, 2);

        let mut opts = options();
        opts.selection.marks = vec!["not str_test".to_string()];
        let collection = collect(&session, &opts);
        assert_eq!(ids(&collection), vec!["m::test_no_input"]);
    }

    #[test]
    fn test_strict_markers() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("t", |_| Ok(())).mark(Mark::tag("markerr")));
        module.test(
            TestCase::new("u", |_| Ok(()))
                .mark(Mark::tag("str_test"))
                .mark(Mark::xfail("builtin marks are always known")),
        );
        let mut session = Session::new();
        session.add_module(module);

        let mut opts = options();
        opts.strict_markers = true;
        opts.registered_markers = vec!["str_test".to_string()];
        let collection = collect(&session, &opts);
        assert_eq!(collection.errors.len(), 1);
        assert!(matches!(
            &collection.errors[0],
            Error::UnknownMarker { name, item } if name == "markerr" && item == "m::t"
        ));
    }

    #[test]
    fn test_outline_rows_become_items() {
        let mut session = Session::new();
        session.step(
            StepDef::producing(Keyword::Given, "We have {count:d} fruits", "start", |_, args| {
                args.int("count")
            })
            .unwrap(),
        );
        session.step(StepDef::when("I eat {eat:d} fruits", |_, _| Ok(())).unwrap().uses(["start"]));
        let feature = Feature::parse(
            "Feature: Outline\n\
             Scenario Outline: Eating fruits\n\
             Given We have <start> fruits\n\
             When I eat <eat> fruits\n\
             Examples:\n\
             | start | eat |\n\
             | 12 | 5 |\n\
             | 20 | 5 |\n",
            Path::new("outline.feature"),
        )
        .unwrap();
        session.add_feature(feature);

        let collection = collect(&session, &options());
        assert!(collection.errors.is_empty());
        assert_eq!(
            ids(&collection),
            vec!["outline::eating_fruits[12-5]", "outline::eating_fruits[20-5]"]
        );
        assert!(collection.items().all(|i| i.plan.is_empty()));
    }

    #[test]
    fn test_unbound_step_yields_an_error_item() {
        let mut session = Session::new();
        let feature = Feature::parse(
            "Feature: Missing\nScenario: Nothing matches\nGiven an undefined step\n",
            Path::new("missing.feature"),
        )
        .unwrap();
        session.add_feature(feature);

        let collection = collect(&session, &options());
        assert!(collection.errors.is_empty());
        let item = collection.items().next().unwrap();
        assert_eq!(item.nodeid, "missing::nothing_matches");
        assert!(matches!(item.kind, ItemKind::Scenario(Err(Error::StepNotFound { .. }))));
    }

    #[test]
    fn test_ambiguous_step_stays_with_its_scenario() {
        let mut session = Session::new();
        session.step(StepDef::given("a set of {n:d}", |_, _| Ok(())).unwrap());
        session.step(StepDef::given("a set of {what}", |_, _| Ok(())).unwrap());
        let feature = Feature::parse(
            "Feature: Twice\nScenario: Two definitions\nGiven a set of 3\n",
            Path::new("twice.feature"),
        )
        .unwrap();
        session.add_feature(feature);

        let collection = collect(&session, &options());
        assert!(collection.errors.is_empty());
        let item = collection.items().next().unwrap();
        assert!(matches!(item.kind, ItemKind::Scenario(Err(Error::AmbiguousStep { .. }))));
    }

    #[test]
    fn test_repeated_node_ids_get_positional_suffixes() {
        let mut session = Session::new();
        session.step(StepDef::given("We have {count:d} fruits", |_, _| Ok(())).unwrap());
        let feature = Feature::parse(
            "Feature: Repeats\n\
             Scenario: Same name\n\
             Given We have 1 fruits\n\
             Scenario: Same  name!\n\
             Given We have 2 fruits\n\
             Scenario Outline: Rows\n\
             Given We have <n> fruits\n\
             Examples:\n\
             | n |\n\
             | 5 |\n\
             | 5 |\n\
             | 5 |\n",
            Path::new("repeats.feature"),
        )
        .unwrap();
        session.add_feature(feature);

        let collection = collect(&session, &options());
        assert_eq!(
            ids(&collection),
            vec![
                "repeats::same_name",
                "repeats::same_name[2]",
                "repeats::rows[5]",
                "repeats::rows[5-2]",
                "repeats::rows[5-3]",
            ]
        );
    }

    #[test]
    fn test_deselected_items_still_claim_their_ids() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("t", |_| Ok(())).mark(Mark::tag("slow")));
        module.test(TestCase::new("t", |_| Ok(())));
        let mut session = Session::new();
        session.add_module(module);

        let mut opts = options();
        opts.selection.marks = vec!["not slow".to_string()];
        let collection = collect(&session, &opts);
        assert_eq!(ids(&collection), vec!["m::t[2]"]);
    }

    #[test]
    fn test_unknown_row_mark_is_reported_once() {
        let mut module = TestModule::new("m");
        module.test(
            TestCase::new("t", |_| Ok(()))
                .parametrize("a", [ParamRow::new([1]).mark(Mark::tag("nightly")), crate::row![2]])
                .parametrize("b", [crate::row![1], crate::row![2], crate::row![3]]),
        );
        let mut session = Session::new();
        session.add_module(module);

        let mut opts = options();
        opts.strict_markers = true;
        let collection = collect(&session, &opts);
        assert_eq!(collection.errors.len(), 1, "{:?}", collection.errors);
        assert!(matches!(
            &collection.errors[0],
            Error::UnknownMarker { name, .. } if name == "nightly"
        ));
    }

    #[test]
    fn test_unknown_feature_tag_is_reported_once_per_scenario() {
        let mut session = Session::new();
        session.step(StepDef::given("We have {count:d} fruits", |_, _| Ok(())).unwrap());
        let feature = Feature::parse(
            "@nightly\n\
             Feature: Tagged\n\
             Scenario Outline: Rows\n\
             Given We have <n> fruits\n\
             Examples:\n\
             | n |\n\
             | 1 |\n\
             | 2 |\n",
            Path::new("tagged.feature"),
        )
        .unwrap();
        session.add_feature(feature);

        let mut opts = options();
        opts.strict_markers = true;
        let collection = collect(&session, &opts);
        assert_eq!(collection.errors.len(), 1, "{:?}", collection.errors);
    }

    #[test]
    fn test_slug_and_unregistered_tags() {
        assert_eq!(slug("Withdrawal of Money"), "withdrawal_of_money");
        assert_eq!(slug("  Set length -- check! "), "set_length_check");
        assert_eq!(
            unregistered_tags(["smoke", "xfail", "smoke", "slow"], &["slow".to_string()]),
            vec!["smoke"]
        );
    }

    #[test]
    fn test_row_marks_apply_to_that_row_only() {
        let mut module = TestModule::new("m");
        module.test(TestCase::new("t", |_| Ok(())).parametrize(
            "a, b",
            [crate::row![1, 2], ParamRow::new([10, 9]).mark(Mark::xfail("not greater"))],
        ));
        let mut session = Session::new();
        session.add_module(module);

        let collection = collect(&session, &options());
        let xfails: Vec<bool> = collection.items().map(|i| i.marks.xfail.is_some()).collect();
        assert_eq!(xfails, vec![false, true]);
    }
}
