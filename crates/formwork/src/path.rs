//! Field paths: dotted/indexed locators into the form value tree.
//!
//! A path like `social.twitter` walks object keys; `ph_numbers.0.number`
//! mixes keys and array indexes. Purely-numeric segments are parsed as
//! indexes, everything else as keys.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Parsed locator for one field inside the form values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,
    #[error("field path `{0}` contains an empty segment")]
    EmptySegment(String),
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            match part.parse::<usize>() {
                Ok(index) => segments.push(Segment::Index(index)),
                Err(_) => segments.push(Segment::Key(part.to_string())),
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Child path addressing one entry of a list field.
    pub fn index(&self, index: usize) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        FieldPath { segments }
    }

    /// True if `self` addresses something at or below `prefix`.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(raw)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_indexes() {
        let path = FieldPath::parse("ph_numbers.0.number").expect("parse");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("ph_numbers".into()),
                Segment::Index(0),
                Segment::Key("number".into()),
            ]
        );
        assert_eq!(path.to_string(), "ph_numbers.0.number");
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert_eq!(
            FieldPath::parse("social..twitter"),
            Err(PathError::EmptySegment("social..twitter".into()))
        );
    }

    #[test]
    fn prefix_matching() {
        let list = FieldPath::parse("ph_numbers").expect("parse");
        let entry = list.index(2);
        assert!(entry.starts_with(&list));
        assert!(!list.starts_with(&entry));
        assert_eq!(entry.to_string(), "ph_numbers.2");
    }
}
