//! MSBuild `Condition` attributes.
//!
//! Visual Studio gates configuration-specific groups with conditions such as
//!
//! - `'$(Configuration)|$(Platform)'=='Release|Win32'`
//! - `'$(Configuration)'=='Debug' and '$(Platform)'=='x64'`
//! - `Exists('$(VCTargetsPath)\Microsoft.Cpp.props')`
//!
//! ```text
//! expr       = and_expr ('or' and_expr)*
//! and_expr   = atom ('and' atom)*
//! atom       = comparison | exists | '(' expr ')'
//! comparison = quoted ('==' | '!=') quoted
//! exists     = 'Exists' '(' quoted ')'
//! quoted     = "'" [^']* "'"
//! ```
//!
//! Keywords and comparisons are case-insensitive, as in MSBuild.

use std::collections::HashMap;

use chumsky::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        lhs: Vec<Part>,
        negated: bool,
        rhs: Vec<Part>,
    },
    /// Always true: no filesystem is consulted.
    Exists(Vec<Part>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

/// A piece of a quoted string.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// `$(Name)`
    Var(String),
}

/// Property values a condition is evaluated against. Names are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Vars(HashMap<String, String>);

impl Vars {
    /// The `Configuration` / `Platform` pair Visual Studio conditions test.
    pub fn for_configuration(configuration: &str, platform: &str) -> Self {
        let mut vars = Self::default();
        vars.set("Configuration", configuration);
        vars.set("Platform", platform);
        vars
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    fn get(&self, name: &str) -> &str {
        self.0.get(&name.to_ascii_lowercase()).map_or("", String::as_str)
    }
}

fn split_parts(raw: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find("$(") {
        if start > 0 {
            parts.push(Part::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after.find(')').unwrap_or(after.len());
        parts.push(Part::Var(after[..end].to_string()));
        rest = after.get(end + 1..).unwrap_or_default();
    }
    if !rest.is_empty() {
        parts.push(Part::Text(rest.to_string()));
    }
    parts
}

fn condition_parser<'a>() -> impl Parser<'a, &'a str, Condition, extra::Err<Simple<'a, char>>> {
    recursive(|expr| {
        let quoted = just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\''))
            .map(split_parts);

        let op = just("==").to(false).or(just("!=").to(true));

        let comparison = quoted
            .clone()
            .padded()
            .then(op.padded())
            .then(quoted.clone().padded())
            .map(|((lhs, negated), rhs)| Condition::Compare { lhs, negated, rhs });

        let word = any()
            .filter(|c: &char| c.is_ascii_alphabetic())
            .repeated()
            .at_least(1)
            .to_slice();
        let keyword = move |kw: &'static str| {
            word.clone()
                .filter(move |w: &&str| w.eq_ignore_ascii_case(kw))
                .padded()
        };

        let exists = keyword("exists")
            .ignore_then(quoted.padded().delimited_by(just('('), just(')')))
            .map(Condition::Exists);

        let group = expr.delimited_by(just('(').padded(), just(')').padded());

        let atom = choice((comparison, exists, group)).padded();

        let and = atom.clone().foldl(keyword("and").ignore_then(atom).repeated(), |a, b| {
            Condition::And(Box::new(a), Box::new(b))
        });

        and.clone().foldl(keyword("or").ignore_then(and).repeated(), |a, b| {
            Condition::Or(Box::new(a), Box::new(b))
        })
    })
}

impl Condition {
    pub fn parse(input: &str) -> Result<Self, String> {
        condition_parser().parse(input).into_result().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            format!("bad condition '{input}': {}", messages.join("; "))
        })
    }

    pub fn matches(&self, vars: &Vars) -> bool {
        match self {
            Condition::Compare { lhs, negated, rhs } => {
                let equal = expand(lhs, vars).eq_ignore_ascii_case(&expand(rhs, vars));
                equal != *negated
            }
            Condition::Exists(_) => true,
            Condition::And(a, b) => a.matches(vars) && b.matches(vars),
            Condition::Or(a, b) => a.matches(vars) || b.matches(vars),
        }
    }
}

fn expand(parts: &[Part], vars: &Vars) -> String {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => text.as_str(),
            Part::Var(name) => vars.get(name),
        })
        .collect()
}

/// Whether an element with this `Condition` attribute applies under `vars`.
/// Absent conditions always apply; conditions that do not parse never do.
pub fn applies(condition: Option<&str>, vars: &Vars) -> bool {
    match condition {
        None => true,
        Some(text) => match Condition::parse(text) {
            Ok(cond) => cond.matches(vars),
            Err(message) => {
                tracing::debug!("{message}");
                false
            }
        },
    }
}
