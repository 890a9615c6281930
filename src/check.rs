//! Flaw accumulation for validity checks.
//!
//! Every predicate walks its whole input and records each violation rather
//! than stopping at the first one. A [`Report`] distinguishes shape flaws
//! (the value is not even a candidate for its claimed kind) from content
//! flaws (right shape, broken rule), so callers get the candidate/valid
//! tri-state without an error path.

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flaw {
    Shape(String),
    Content(String),
}

impl Flaw {
    pub fn message(&self) -> &str {
        match self {
            Flaw::Shape(m) | Flaw::Content(m) => m,
        }
    }
}

/// Outcome of a validity check. Never constructed through an error path;
/// an empty flaw list means the value is valid.
#[derive(Debug, Clone)]
pub struct Report {
    /// What was checked, e.g. `"signal group"` or `"dataset 'meas'"`.
    pub subject: String,
    pub flaws: Vec<Flaw>,
}

impl Report {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            flaws: Vec::new(),
        }
    }

    pub fn shape(&mut self, detail: impl Into<String>) {
        self.flaws.push(Flaw::Shape(detail.into()));
    }

    pub fn content(&mut self, detail: impl Into<String>) {
        self.flaws.push(Flaw::Content(detail.into()));
    }

    /// Absorb another report, prefixing its flaws with its subject.
    pub fn absorb(&mut self, inner: Report) {
        for flaw in inner.flaws {
            let tagged = format!("{}: {}", inner.subject, flaw.message());
            match flaw {
                Flaw::Shape(_) => self.flaws.push(Flaw::Shape(tagged)),
                Flaw::Content(_) => self.flaws.push(Flaw::Content(tagged)),
            }
        }
    }

    /// Shape criteria hold: the value has the right container kind and
    /// field set for what it claims to be.
    pub fn is_candidate(&self) -> bool {
        !self.flaws.iter().any(|f| matches!(f, Flaw::Shape(_)))
    }

    /// All criteria hold, content rules included.
    pub fn is_valid(&self) -> bool {
        self.flaws.is_empty()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.flaws.iter().map(Flaw::message).collect()
    }

    /// Hard-error form: shape flaws win over content flaws, and all
    /// collected details are kept in the error text.
    pub fn into_result(self) -> Result<()> {
        if self.flaws.is_empty() {
            return Ok(());
        }
        let shape: Vec<&str> = self
            .flaws
            .iter()
            .filter(|f| matches!(f, Flaw::Shape(_)))
            .map(Flaw::message)
            .collect();
        if !shape.is_empty() {
            return Err(ModelError::shape(self.subject, shape.join("; ")));
        }
        let content: Vec<&str> = self.flaws.iter().map(Flaw::message).collect();
        Err(ModelError::content(self.subject, content.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_state() {
        let mut r = Report::new("thing");
        assert!(r.is_candidate() && r.is_valid());

        r.content("bad name");
        assert!(r.is_candidate());
        assert!(!r.is_valid());

        r.shape("wrong container");
        assert!(!r.is_candidate());
    }

    #[test]
    fn shape_wins_in_hard_form() {
        let mut r = Report::new("thing");
        r.content("bad name");
        r.shape("wrong container");
        match r.into_result() {
            Err(ModelError::Shape { detail, .. }) => assert!(detail.contains("wrong container")),
            other => panic!("expected shape error, got {other:?}"),
        }
    }
}
