//! Job-array range sets.
//!
//! Array specifications use the compact syntax shared by SLURM and LSF:
//!
//! ```text
//! 1-10,15,20-30:2
//! ```
//!
//! Each comma-separated token is either a single index or an inclusive
//! `start-end` range with an optional `:step`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{JobError, JobResult};

/// One token of a range set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeElement {
    /// A single array index.
    Index(u32),
    /// An inclusive range of indices.
    Span { start: u32, end: u32, step: u32 },
}

impl RangeElement {
    /// Iterate over the indices covered by this element.
    pub fn indices(&self) -> Box<dyn Iterator<Item = u32>> {
        match *self {
            RangeElement::Index(i) => Box::new(std::iter::once(i)),
            RangeElement::Span { start, end, step } => {
                Box::new((start..=end).step_by(step as usize))
            }
        }
    }

    fn parse(token: &str) -> JobResult<Self> {
        if is_digits(token) {
            return Ok(RangeElement::Index(parse_u32(token)?));
        }

        let Some((start, rest)) = token.split_once('-') else {
            return Err(invalid(token));
        };
        let (end, step) = match rest.split_once(':') {
            Some((end, step)) => (end, Some(step)),
            None => (rest, None),
        };
        if !is_digits(start) || !is_digits(end) || !step.is_none_or(is_digits) {
            return Err(invalid(token));
        }

        let step = step.map(parse_u32).transpose()?.unwrap_or(1);
        if step == 0 {
            return Err(JobError::Format(format!(
                "array range '{token}' has a zero step"
            )));
        }

        Ok(RangeElement::Span {
            start: parse_u32(start)?,
            end: parse_u32(end)?,
            step,
        })
    }
}

impl fmt::Display for RangeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeElement::Index(i) => write!(f, "{i}"),
            RangeElement::Span {
                start,
                end,
                step: 1,
            } => write!(f, "{start}-{end}"),
            RangeElement::Span { start, end, step } => write!(f, "{start}-{end}:{step}"),
        }
    }
}

/// Normalized job-array specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RangeSet(Vec<RangeElement>);

impl RangeSet {
    /// Create a range set from its elements.
    pub fn new(elements: Vec<RangeElement>) -> Self {
        Self(elements)
    }

    /// Range set covering `start..=end` with unit step.
    pub fn span(start: u32, end: u32) -> Self {
        Self(vec![RangeElement::Span {
            start,
            end,
            step: 1,
        }])
    }

    /// The elements in specification order.
    pub fn elements(&self) -> &[RangeElement] {
        &self.0
    }

    /// Whether the set has no tokens.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into array indices, preserving token order and duplicates.
    pub fn indices(&self) -> Vec<u32> {
        self.0.iter().flat_map(RangeElement::indices).collect()
    }
}

impl FromStr for RangeSet {
    type Err = JobError;

    fn from_str(text: &str) -> JobResult<Self> {
        text.split(',')
            .map(RangeElement::parse)
            .collect::<JobResult<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

impl Serialize for RangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_u32(s: &str) -> JobResult<u32> {
    s.parse()
        .map_err(|e| JobError::Format(format!("array index '{s}': {e}")))
}

fn invalid(token: &str) -> JobError {
    JobError::Format(format!("invalid array token '{token}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed() {
        let set: RangeSet = "1-10,15,20-30:2".parse().unwrap();
        assert_eq!(
            set.elements(),
            &[
                RangeElement::Span {
                    start: 1,
                    end: 10,
                    step: 1
                },
                RangeElement::Index(15),
                RangeElement::Span {
                    start: 20,
                    end: 30,
                    step: 2
                },
            ]
        );
        assert_eq!(set.to_string(), "1-10,15,20-30:2");
    }

    #[test]
    fn test_explicit_unit_step_normalizes() {
        let set: RangeSet = "1-4:1".parse().unwrap();
        assert_eq!(set, RangeSet::span(1, 4));
        assert_eq!(set.to_string(), "1-4");
    }

    #[test]
    fn test_indices() {
        let set: RangeSet = "1-3,5".parse().unwrap();
        assert_eq!(set.indices(), vec![1, 2, 3, 5]);

        let set: RangeSet = "0-9:3".parse().unwrap();
        assert_eq!(set.indices(), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_indices_keep_duplicates() {
        let set: RangeSet = "2,1-3,2".parse().unwrap();
        assert_eq!(set.indices(), vec![2, 1, 2, 3, 2]);
    }

    #[test]
    fn test_reversed_span_is_empty() {
        let set: RangeSet = "5-3".parse().unwrap();
        assert!(set.indices().is_empty());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_invalid_tokens() {
        for text in ["", "a", "1-", "-3", "1-3:", "1,,2", "1-3:x", "1:2", "1-2-3", " 1"] {
            assert!(
                matches!(text.parse::<RangeSet>(), Err(JobError::Format(_))),
                "expected format error for {text:?}"
            );
        }
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(matches!(
            "1-10:0".parse::<RangeSet>(),
            Err(JobError::Format(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let set: RangeSet = "1-4,7".parse().unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "\"1-4,7\"");
        let back: RangeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
