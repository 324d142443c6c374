//! Regex-level structure extraction from source code.
//!
//! This is not a parser in any real sense: it pulls `if`/`when` headers,
//! their sub-conditions and `;`-terminated statements out of the text so
//! the coverage analyzer has something to match tests against.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(else\s+if|if|when)\s*\(([^)]*)\)").unwrap());
static STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^;{}]+;").unwrap());
static CONDITION_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"&&|\|\|").unwrap());
static CONTAINS_OP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bin\b|\.contains\(").unwrap());
static ASSIGNMENT_OP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^=!<>])=([^=]|$)").unwrap());

/// An `if`/`when` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Full matched header, e.g. `if (n < 0)`
    pub content: String,
    /// Text between the parentheses
    pub condition: String,
    /// Byte offset in the source
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    Equality,
    Inequality,
    GreaterThan,
    LessThan,
    Contains,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub content: String,
    pub kind: ConditionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Assignment,
    MethodCall,
    Return,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub content: String,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub branches: Vec<Branch>,
    pub conditions: Vec<Condition>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeParser;

impl CodeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, code: &str) -> ParseResult {
        ParseResult {
            branches: find_branches(code),
            conditions: find_conditions(code),
            statements: find_statements(code),
        }
    }
}

fn find_branches(code: &str) -> Vec<Branch> {
    BRANCH
        .captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Branch {
                content: whole.as_str().to_string(),
                condition: caps[2].trim().to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

fn find_conditions(code: &str) -> Vec<Condition> {
    BRANCH
        .captures_iter(code)
        .flat_map(|caps| {
            CONDITION_SPLIT
                .split(&caps[2])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Condition {
                    content: part.to_string(),
                    kind: classify_condition(part),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn find_statements(code: &str) -> Vec<Statement> {
    STATEMENT
        .find_iter(code)
        .map(|m| m.as_str().trim())
        .filter(|s| s.len() > 1)
        .map(|s| Statement {
            content: s.to_string(),
            kind: classify_statement(s),
        })
        .collect()
}

pub fn classify_condition(condition: &str) -> ConditionKind {
    if condition.contains("!=") {
        ConditionKind::Inequality
    } else if condition.contains("==") {
        ConditionKind::Equality
    } else if condition.contains('>') {
        ConditionKind::GreaterThan
    } else if condition.contains('<') {
        ConditionKind::LessThan
    } else if CONTAINS_OP.is_match(condition) {
        ConditionKind::Contains
    } else {
        ConditionKind::Other
    }
}

pub fn classify_statement(statement: &str) -> StatementKind {
    let trimmed = statement.trim();
    if trimmed.starts_with("return") {
        StatementKind::Return
    } else if ASSIGNMENT_OP.is_match(trimmed) {
        StatementKind::Assignment
    } else if trimmed.contains('(') {
        StatementKind::MethodCall
    } else {
        StatementKind::Other
    }
}
