//! Feature file parser
//!
//! Reads the Gherkin subset used by steprun feature files: `Feature:`,
//! `Background:`, `Scenario:`, `Scenario Outline:` with `Examples:` tables,
//! `@tags` and `#` comments. `And`, `But` and `*` steps take the keyword of
//! the step before them.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Concrete step keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    Given,
    When,
    Then,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Given => write!(f, "Given"),
            Keyword::When => write!(f, "When"),
            Keyword::Then => write!(f, "Then"),
        }
    }
}

/// One step line of a scenario or background
#[derive(Debug, Clone, PartialEq)]
pub struct StepLine {
    pub keyword: Keyword,
    pub text: String,
    pub line: usize,
}

/// An examples table attached to a scenario outline
#[derive(Debug, Clone, Default)]
pub struct Examples {
    pub tags: Vec<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub line: usize,
}

/// A scenario or scenario outline as written
#[derive(Debug, Clone)]
pub struct ScenarioDef {
    pub name: String,
    pub tags: Vec<String>,
    pub outline: bool,
    pub steps: Vec<StepLine>,
    pub examples: Vec<Examples>,
    pub line: usize,
}

/// One execution of a scenario, after outline expansion
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    /// Row values joined with `-`, for node ids; `None` for plain scenarios
    pub label: Option<String>,
    pub steps: Vec<StepLine>,
    pub tags: Vec<String>,
}

impl ScenarioDef {
    /// Expand into executions: one for a plain scenario, one per example
    /// row for an outline, with `<column>` placeholders substituted
    pub fn expand(&self) -> Vec<ScenarioRun> {
        if !self.outline {
            return vec![ScenarioRun {
                label: None,
                steps: self.steps.clone(),
                tags: self.tags.clone(),
            }];
        }

        let mut runs = Vec::new();
        for examples in &self.examples {
            let mut tags = self.tags.clone();
            tags.extend(examples.tags.iter().cloned());

            for row in &examples.rows {
                let steps = self
                    .steps
                    .iter()
                    .map(|step| StepLine {
                        keyword: step.keyword,
                        text: substitute(&step.text, &examples.header, row),
                        line: step.line,
                    })
                    .collect();
                runs.push(ScenarioRun {
                    label: Some(row.join("-")),
                    steps,
                    tags: tags.clone(),
                });
            }
        }
        runs
    }
}

fn substitute(text: &str, header: &[String], row: &[String]) -> String {
    header
        .iter()
        .zip(row)
        .fold(text.to_string(), |acc, (column, value)| {
            acc.replace(&format!("<{column}>"), value)
        })
}

/// A parsed feature file
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub path: PathBuf,
    pub description: Vec<String>,
    pub tags: Vec<String>,
    pub background: Vec<StepLine>,
    pub scenarios: Vec<ScenarioDef>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Start,
    Feature,
    Background,
    Scenario,
    Examples,
}

struct Parser<'a> {
    path: &'a Path,
    section: Section,
    feature: Option<Feature>,
    pending_tags: Vec<String>,
    last_keyword: Option<Keyword>,
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::feature_parse(&self.path.display().to_string(), line, message)
    }

    fn feature_mut(&mut self, line: usize, what: &str) -> Result<&mut Feature> {
        let path = self.path;
        self.feature.as_mut().ok_or_else(|| {
            Error::feature_parse(
                &path.display().to_string(),
                line,
                format!("'{what}' before 'Feature:'"),
            )
        })
    }

    fn scenario_mut(&mut self, line: usize) -> Result<&mut ScenarioDef> {
        let path = self.path;
        self.feature
            .as_mut()
            .and_then(|f| f.scenarios.last_mut())
            .ok_or_else(|| {
                Error::feature_parse(&path.display().to_string(), line, "no scenario is open")
            })
    }

    /// Examples blocks need a header row before anything else starts
    fn close_examples(&mut self) -> Result<()> {
        if self.section != Section::Examples {
            return Ok(());
        }
        let open = self
            .feature
            .as_ref()
            .and_then(|f| f.scenarios.last())
            .and_then(|s| s.examples.last())
            .filter(|e| e.header.is_empty())
            .map(|e| e.line);
        match open {
            Some(line) => Err(self.error(line, "'Examples:' without a table")),
            None => Ok(()),
        }
    }

    fn close_scenario(&mut self) -> Result<()> {
        self.close_examples()?;
        let unfinished = self
            .feature
            .as_ref()
            .and_then(|f| f.scenarios.last())
            .filter(|s| s.outline && s.examples.is_empty())
            .map(|s| s.line);
        match unfinished {
            Some(line) => Err(self.error(line, "'Scenario Outline:' without 'Examples:'")),
            None => Ok(()),
        }
    }

    fn line(&mut self, number: usize, line: &str) -> Result<()> {
        if line.starts_with('@') {
            for tag in line.split_whitespace() {
                let Some(name) = tag.strip_prefix('@').filter(|n| !n.is_empty()) else {
                    return Err(self.error(number, format!("malformed tag '{tag}'")));
                };
                self.pending_tags.push(name.to_string());
            }
            return Ok(());
        }

        if let Some(name) = line.strip_prefix("Feature:") {
            if self.feature.is_some() {
                return Err(self.error(number, "a file may contain only one 'Feature:'"));
            }
            self.feature = Some(Feature {
                name: name.trim().to_string(),
                path: self.path.to_path_buf(),
                description: Vec::new(),
                tags: std::mem::take(&mut self.pending_tags),
                background: Vec::new(),
                scenarios: Vec::new(),
            });
            self.section = Section::Feature;
            return Ok(());
        }

        if line.starts_with("Background:") {
            if !self.pending_tags.is_empty() {
                return Err(self.error(number, "tags cannot be applied to 'Background:'"));
            }
            self.close_scenario()?;
            let feature = self.feature_mut(number, "Background:")?;
            if !feature.background.is_empty() || !feature.scenarios.is_empty() {
                return Err(self.error(number, "'Background:' must come once, before any scenario"));
            }
            self.section = Section::Background;
            self.last_keyword = None;
            return Ok(());
        }

        let scenario_header = ["Scenario Outline:", "Scenario Template:"]
            .iter()
            .find_map(|k| line.strip_prefix(k).map(|rest| (rest, true)))
            .or_else(|| {
                ["Scenario:", "Example:"]
                    .iter()
                    .find_map(|k| line.strip_prefix(k).map(|rest| (rest, false)))
            });
        if let Some((name, outline)) = scenario_header {
            self.close_scenario()?;
            let tags = std::mem::take(&mut self.pending_tags);
            let feature = self.feature_mut(number, "Scenario:")?;
            feature.scenarios.push(ScenarioDef {
                name: name.trim().to_string(),
                tags,
                outline,
                steps: Vec::new(),
                examples: Vec::new(),
                line: number,
            });
            self.section = Section::Scenario;
            self.last_keyword = None;
            return Ok(());
        }

        if line.starts_with("Examples:") || line.starts_with("Scenarios:") {
            self.close_examples()?;
            if !matches!(self.section, Section::Scenario | Section::Examples) {
                return Err(self.error(number, "'Examples:' outside of a scenario outline"));
            }
            if !self.scenario_mut(number)?.outline {
                return Err(self.error(number, "'Examples:' on a plain 'Scenario:'"));
            }
            let tags = std::mem::take(&mut self.pending_tags);
            self.scenario_mut(number)?.examples.push(Examples {
                tags,
                line: number,
                ..Examples::default()
            });
            self.section = Section::Examples;
            return Ok(());
        }

        if line.starts_with('|') {
            if self.section != Section::Examples {
                return Err(self.error(number, "table row outside of 'Examples:'"));
            }
            let cells = parse_row(line);
            let path = self.path;
            let examples = self
                .scenario_mut(number)?
                .examples
                .last_mut()
                .ok_or_else(|| {
                    Error::feature_parse(&path.display().to_string(), number, "no examples open")
                })?;
            if examples.header.is_empty() {
                examples.header = cells;
            } else if cells.len() != examples.header.len() {
                let expected = examples.header.len();
                return Err(self.error(
                    number,
                    format!("row has {} cells, header has {}", cells.len(), expected),
                ));
            } else {
                examples.rows.push(cells);
            }
            return Ok(());
        }

        if let Some((word, text)) = split_step(line) {
            let keyword = match word {
                "Given" => Keyword::Given,
                "When" => Keyword::When,
                "Then" => Keyword::Then,
                _ => self.last_keyword.ok_or_else(|| {
                    self.error(number, format!("'{word}' without a preceding Given/When/Then"))
                })?,
            };
            let step = StepLine {
                keyword,
                text: text.to_string(),
                line: number,
            };
            match self.section {
                Section::Background => self.feature_mut(number, word)?.background.push(step),
                Section::Scenario => self.scenario_mut(number)?.steps.push(step),
                Section::Examples => {
                    return Err(self.error(number, "step after 'Examples:'"));
                }
                Section::Start | Section::Feature => {
                    return Err(self.error(number, "step outside of a scenario"));
                }
            }
            self.last_keyword = Some(keyword);
            return Ok(());
        }

        if self.section == Section::Feature {
            self.feature_mut(number, "description")?
                .description
                .push(line.to_string());
            return Ok(());
        }

        Err(self.error(number, format!("unexpected line '{line}'")))
    }
}

fn split_step(line: &str) -> Option<(&str, &str)> {
    if let Some(text) = line.strip_prefix("* ") {
        return Some(("*", text.trim()));
    }
    let (word, text) = line.split_once(char::is_whitespace)?;
    matches!(word, "Given" | "When" | "Then" | "And" | "But").then(|| (word, text.trim()))
}

fn parse_row(line: &str) -> Vec<String> {
    let inner = line.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

impl Feature {
    /// Parse feature text; `path` is used for error messages
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        let mut parser = Parser {
            path,
            section: Section::Start,
            feature: None,
            pending_tags: Vec::new(),
            last_keyword: None,
        };

        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            parser.line(index + 1, line)?;
        }
        parser.close_scenario()?;
        if !parser.pending_tags.is_empty() {
            let last = source.lines().count();
            return Err(parser.error(last, "tags at the end of the file tag nothing"));
        }

        parser
            .feature
            .ok_or_else(|| Error::feature_parse(&path.display().to_string(), 1, "missing 'Feature:'"))
    }

    /// Read and parse a feature file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::parse(&source, path)
    }

    /// Load every `*.feature` file in `dir`, sorted by file name
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::file_read(dir, &e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "feature") {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| Self::load(p)).collect()
    }

    /// Module name used in node ids: the file stem
    pub fn module_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}
