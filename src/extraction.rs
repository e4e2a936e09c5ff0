// 🔎 Reference Token Extraction
// Pulls a UTR-like token out of free-text bank statement narratives
//
// Rules, in order:
//   1. first `/<token>/` where token has no slash
//   2. everything after the first underscore (at least one character),
//      ignoring one trailing newline
//   3. nothing -> Absent

use crate::table::Cell;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DEFAULT_EXTRACTOR: Lazy<TokenExtractor> = Lazy::new(TokenExtractor::new);

// ============================================================================
// REFERENCE TOKEN
// ============================================================================

/// Outcome of narrative extraction. Absent never matches anything in a join,
/// not even another Absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceToken {
    /// Found between two slashes
    Delimited(String),

    /// Found after the first underscore
    AfterUnderscore(String),

    Absent,
}

impl ReferenceToken {
    pub fn value(&self) -> Option<&str> {
        match self {
            ReferenceToken::Delimited(v) | ReferenceToken::AfterUnderscore(v) => Some(v),
            ReferenceToken::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ReferenceToken::Absent)
    }

    pub fn rule(&self) -> &str {
        match self {
            ReferenceToken::Delimited(_) => "delimited",
            ReferenceToken::AfterUnderscore(_) => "after_underscore",
            ReferenceToken::Absent => "absent",
        }
    }

    pub fn into_cell(self) -> Cell {
        match self {
            ReferenceToken::Delimited(v) | ReferenceToken::AfterUnderscore(v) => Cell::Text(v),
            ReferenceToken::Absent => Cell::Empty,
        }
    }
}

// ============================================================================
// TOKEN EXTRACTOR
// ============================================================================

pub struct TokenExtractor {
    delimited: Regex,
    after_underscore: Regex,
}

impl TokenExtractor {
    pub fn new() -> Self {
        TokenExtractor {
            // Both patterns are literals and always compile
            delimited: Regex::new(r"/([^/]+)/").unwrap(),
            after_underscore: Regex::new(r"_(.+)\n?\z").unwrap(),
        }
    }

    pub fn extract(&self, narrative: &str) -> ReferenceToken {
        if let Some(caps) = self.delimited.captures(narrative) {
            return ReferenceToken::Delimited(caps[1].to_string());
        }

        if let Some(caps) = self.after_underscore.captures(narrative) {
            return ReferenceToken::AfterUnderscore(caps[1].to_string());
        }

        ReferenceToken::Absent
    }

    /// Only text cells carry a narrative; blanks and numbers are Absent
    pub fn extract_cell(&self, narrative: &Cell) -> ReferenceToken {
        match narrative {
            Cell::Text(text) => self.extract(text),
            _ => ReferenceToken::Absent,
        }
    }
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_reference_token(narrative: &str) -> ReferenceToken {
    DEFAULT_EXTRACTOR.extract(narrative)
}

pub fn extract_reference_cell(narrative: &Cell) -> ReferenceToken {
    DEFAULT_EXTRACTOR.extract_cell(narrative)
}

// ============================================================================
// TESTS
// ============================================================================
