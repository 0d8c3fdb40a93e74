//! License requirement expressions.
//!
//! An expression lists alternatives separated by `+`. Each alternative is a
//! `:`-separated list of `feature=count` pairs, e.g.
//! `eclipse=1:compositional=2+eclipse=3`. Alternatives keep their declared
//! order because the first satisfiable one wins.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const ALTERNATIVE_SEP: char = '+';
const PAIR_SEP: char = ':';
const COUNT_SEP: char = '=';

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub feature: String,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// LicenseAlternative
// ---------------------------------------------------------------------------

/// One self-sufficient combination of features. Feature names are unique
/// within an alternative; pairs are queried in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseAlternative {
    requirements: Vec<Requirement>,
}

impl LicenseAlternative {
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().map(|r| r.feature.as_str())
    }

    pub fn required(&self, feature: &str) -> Option<u32> {
        self.requirements
            .iter()
            .find(|r| r.feature == feature)
            .map(|r| r.count)
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl fmt::Display for LicenseAlternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                write!(f, "{PAIR_SEP}")?;
            }
            write!(f, "{}{COUNT_SEP}{}", r.feature, r.count)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AlternativeSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlternativeSet {
    alternatives: Vec<LicenseAlternative>,
}

impl AlternativeSet {
    pub fn iter(&self) -> std::slice::Iter<'_, LicenseAlternative> {
        self.alternatives.iter()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

impl<'a> IntoIterator for &'a AlternativeSet {
    type Item = &'a LicenseAlternative;
    type IntoIter = std::slice::Iter<'a, LicenseAlternative>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for AlternativeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, "{ALTERNATIVE_SEP}")?;
            }
            write!(f, "{alt}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for AlternativeSet {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a requirement expression into its ordered alternatives.
///
/// A blank expression yields an empty set, meaning "no requirement".
/// Whitespace around names and counts is ignored.
pub fn parse(expression: &str) -> Result<AlternativeSet> {
    if expression.trim().is_empty() {
        return Ok(AlternativeSet::default());
    }

    let alternatives = expression
        .split(ALTERNATIVE_SEP)
        .map(|alt| parse_alternative(expression, alt))
        .collect::<Result<Vec<_>>>()?;

    Ok(AlternativeSet { alternatives })
}

fn parse_alternative(expression: &str, alt: &str) -> Result<LicenseAlternative> {
    if alt.trim().is_empty() {
        return Err(GateError::malformed(expression, "empty alternative"));
    }

    let mut requirements: Vec<Requirement> = Vec::new();
    for pair in alt.split(PAIR_SEP) {
        let Some((name, count)) = pair.split_once(COUNT_SEP) else {
            return Err(GateError::malformed(
                expression,
                format!("expected feature=count, got '{pair}'"),
            ));
        };
        let feature = name.trim();
        if feature.is_empty() {
            return Err(GateError::malformed(
                expression,
                format!("missing feature name in '{pair}'"),
            ));
        }
        let count: u32 = count.trim().parse().map_err(|_| {
            GateError::malformed(
                expression,
                format!("count for '{feature}' is not a non-negative integer: '{count}'"),
            )
        })?;
        if requirements.iter().any(|r| r.feature == feature) {
            return Err(GateError::malformed(
                expression,
                format!("feature '{feature}' listed twice in one alternative"),
            ));
        }
        requirements.push(Requirement {
            feature: feature.to_string(),
            count,
        });
    }

    Ok(LicenseAlternative { requirements })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_alternatives_in_declared_order() {
        let set = parse("eclipse=1:compositional=2+eclipse=3").unwrap();
        assert_eq!(set.len(), 2);

        let first: Vec<_> = set.iter().next().unwrap().features().collect();
        assert_eq!(first, vec!["eclipse", "compositional"]);

        let second = set.iter().nth(1).unwrap();
        assert_eq!(second.required("eclipse"), Some(3));
        assert_eq!(second.required("compositional"), None);
    }

    #[test]
    fn empty_expression_is_no_requirement() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn display_is_canonical_fixed_point() {
        for expr in [
            "eclipse=1",
            "eclipse=1:compositional=2+eclipse=3",
            "e300=1:lgr=4+eclipse=2:networks=1+gaslift=0",
        ] {
            let set = parse(expr).unwrap();
            assert_eq!(set.to_string(), expr);
            assert_eq!(parse(&set.to_string()).unwrap(), set);
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        let set = parse(" eclipse = 2 : lgr=1 ").unwrap();
        assert_eq!(set.to_string(), "eclipse=2:lgr=1");
    }

    #[test]
    fn non_integer_count_is_malformed() {
        let err = parse("eclipse=two").unwrap_err();
        match err {
            GateError::MalformedExpression { expression, reason } => {
                assert_eq!(expression, "eclipse=two");
                assert!(reason.contains("eclipse"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_count_is_malformed() {
        assert!(matches!(
            parse("eclipse=-1"),
            Err(GateError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert!(parse("eclipse").is_err());
        assert!(parse("eclipse=1:lgr").is_err());
        assert!(parse("=1").is_err());
    }

    #[test]
    fn empty_alternative_is_malformed() {
        assert!(parse("eclipse=1++lgr=1").is_err());
        assert!(parse("eclipse=1+").is_err());
    }

    #[test]
    fn duplicate_feature_is_malformed() {
        assert!(parse("eclipse=1:eclipse=2").is_err());
        // The same feature may appear in different alternatives.
        assert!(parse("eclipse=1+eclipse=2").is_ok());
    }

    #[test]
    fn from_str_matches_parse() {
        let set: AlternativeSet = "lgr=1+eclipse=1".parse().unwrap();
        assert_eq!(set, parse("lgr=1+eclipse=1").unwrap());
    }
}
