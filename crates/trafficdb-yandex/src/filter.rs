//! Typed builder for Metrika `filters` expressions.
//!
//! Values are always emitted as single-quoted literals with `\` and `'`
//! escaped, so URLs and query text containing reserved characters cannot
//! break out of the literal. URL prefixes used in regex comparisons are
//! additionally passed through [`regex::escape`].

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `attribute=='value'`
    Eq {
        attribute: &'static str,
        value: String,
    },
    /// `attribute!='value'`
    Ne {
        attribute: &'static str,
        value: String,
    },
    /// `attribute=~'pattern'`
    Matches {
        attribute: &'static str,
        pattern: String,
    },
    /// Conjunction of all terms.
    And(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn eq(attribute: &'static str, value: impl Into<String>) -> Self {
        Filter::Eq {
            attribute,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn ne(attribute: &'static str, value: impl Into<String>) -> Self {
        Filter::Ne {
            attribute,
            value: value.into(),
        }
    }

    /// Regex match; `pattern` is used as-is. See [`url_prefix_pattern`].
    #[must_use]
    pub fn matches(attribute: &'static str, pattern: impl Into<String>) -> Self {
        Filter::Matches {
            attribute,
            pattern: pattern.into(),
        }
    }

    /// Combines two filters with `AND`, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        let mut terms = match self {
            Filter::And(terms) => terms,
            single => vec![single],
        };
        match other {
            Filter::And(more) => terms.extend(more),
            single => terms.push(single),
        }
        Filter::And(terms)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { attribute, value } => write!(f, "{attribute}=={}", quote(value)),
            Filter::Ne { attribute, value } => write!(f, "{attribute}!={}", quote(value)),
            Filter::Matches { attribute, pattern } => {
                write!(f, "{attribute}=~{}", quote(pattern))
            }
            Filter::And(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Drops the query string and fragment from `url`.
#[must_use]
pub fn strip_query_and_fragment(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Regex `^<escaped prefix><tail>` for matching URLs under `prefix`.
///
/// `tail` is appended verbatim and may contain regex syntax.
#[must_use]
pub fn url_prefix_pattern(prefix: &str, tail: &str) -> String {
    format!(
        "^{}{tail}",
        regex::escape(strip_query_and_fragment(prefix))
    )
}
