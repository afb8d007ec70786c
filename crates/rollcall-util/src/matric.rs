//! Matriculation-number parsing
//!
//! Matric numbers look like `UNI/CSC/21/0042`: an institution prefix, a
//! department code, a two-digit entry year, and a sequence number. Parsing
//! is best-effort: fields that cannot be resolved come back as `None`,
//! which downstream code treats as "cannot resolve yet", not an error.

use std::collections::HashMap;

/// Result of parsing a matric number. Either field may be unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedMatric {
    /// Department name, if the code was recognized
    pub department: Option<String>,

    /// Four-digit enrollment year, if the year field parsed
    pub entry_year: Option<i32>,
}

impl ParsedMatric {
    /// True when both department and entry year resolved.
    pub fn is_resolved(&self) -> bool {
        self.department.is_some() && self.entry_year.is_some()
    }
}

/// Department-code lookup table used by the parser.
#[derive(Debug, Clone, Default)]
pub struct MatricCodeTable {
    codes: HashMap<String, String>,
}

impl MatricCodeTable {
    pub fn new(codes: HashMap<String, String>) -> Self {
        Self { codes }
    }

    /// Built-in code table; deployments override it via configuration.
    pub fn builtin() -> Self {
        let codes = [
            ("CSC", "Computer Science"),
            ("PHY", "Physics"),
            ("CHM", "Chemistry"),
            ("MAT", "Mathematics"),
            ("BIO", "Biology"),
            ("ENG", "English"),
            ("ACC", "Accounting"),
            ("ECO", "Economics"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();

        Self { codes }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Parse a raw matric number against this code table.
    pub fn parse(&self, raw: &str) -> ParsedMatric {
        let normalized = raw.trim().to_uppercase();
        let parts: Vec<&str> = normalized.split('/').collect();

        if parts.len() < 4 {
            return ParsedMatric::default();
        }

        let department = self.codes.get(parts[1]).cloned();
        let entry_year = parts[2].parse::<i32>().ok().map(|yy| 2000 + yy);

        ParsedMatric {
            department,
            entry_year,
        }
    }
}
