use std::fmt::Display;

use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Direct child of the previous step
    Child,
    /// Any descendant of the previous step
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    /// Element (local) name; `None` matches any element
    name: Option<String>,
}

///
/// Selects event elements of an XML document by their ancestry
///
/// Two small selector languages are supported:
///
/// * XPath location paths made of name steps: `/log/entry`, `//entry`, `/log//entry`, `*`.
///   Relative paths (`entry`) are evaluated against the root element, i.e., `entry` selects the
///   `entry` children of the root element.
/// * CSS selectors made of type selectors and `*`, combined with descendant (whitespace) and
///   child (`>`) combinators: `entry`, `log > entry`, `log entry`.
///
/// Predicates, attributes axes, functions, classes, ids and pseudo-classes are not supported.
///
/// ```rust
/// use something_to_xes::record::ElementSelector;
/// let s = ElementSelector::xpath("/log//entry").unwrap();
/// assert!(s.matches(&["log", "day", "entry"]));
/// assert!(!s.matches(&["entry"]));
/// let c = ElementSelector::css("day > entry").unwrap();
/// assert!(c.matches(&["log", "day", "entry"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSelector {
    source: String,
    steps: Vec<Step>,
}

fn unsupported_step(selector: &str, name: &str) -> ConversionError {
    ConversionError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("unsupported step {name:?} (only element names and * are supported)"),
    }
}

fn xpath_step_name(selector: &str, name: &str) -> Result<Option<String>, ConversionError> {
    if name == "*" {
        return Ok(None);
    }
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if !valid {
        return Err(unsupported_step(selector, name));
    }
    // Namespace prefixes are ignored, elements are compared by local name
    let local = name.rsplit(':').next().unwrap_or(name);
    Ok(Some(local.to_string()))
}

/// Type selectors only: `.class`, `#id`, `:pseudo`, `[attr]` and `ns|name` are rejected
fn css_step_name(selector: &str, name: &str) -> Result<Option<String>, ConversionError> {
    if name == "*" {
        return Ok(None);
    }
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-'));
    if !valid {
        return Err(unsupported_step(selector, name));
    }
    Ok(Some(name.to_string()))
}

impl ElementSelector {
    /// Compile an XPath location path
    pub fn xpath(expression: &str) -> Result<Self, ConversionError> {
        let expr = expression.trim();
        let mut steps = Vec::new();
        let mut rest = expr;
        if rest.is_empty() {
            return Err(ConversionError::InvalidSelector {
                selector: expression.to_string(),
                reason: "empty expression".to_string(),
            });
        }
        if !rest.starts_with('/') {
            // Relative paths start at the root element
            let mut selector = Self::xpath(&format!("/*/{expr}"))?;
            selector.source = expression.to_string();
            return Ok(selector);
        }
        while !rest.is_empty() {
            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else {
                unreachable!("every step starts with a slash")
            };
            let end = rest.find('/').unwrap_or(rest.len());
            steps.push(Step {
                axis,
                name: xpath_step_name(expression, &rest[..end])?,
            });
            rest = &rest[end..];
        }
        Ok(Self {
            source: expression.to_string(),
            steps,
        })
    }

    /// Compile a CSS selector
    pub fn css(selector: &str) -> Result<Self, ConversionError> {
        let spaced = selector.replace('>', " > ");
        let mut steps = Vec::new();
        let mut axis = Axis::Descendant;
        for token in spaced.split_whitespace() {
            if token == ">" {
                if steps.is_empty() || axis == Axis::Child {
                    return Err(ConversionError::InvalidSelector {
                        selector: selector.to_string(),
                        reason: "misplaced '>' combinator".to_string(),
                    });
                }
                axis = Axis::Child;
                continue;
            }
            steps.push(Step {
                axis,
                name: css_step_name(selector, token)?,
            });
            axis = Axis::Descendant;
        }
        if steps.is_empty() || axis == Axis::Child {
            return Err(ConversionError::InvalidSelector {
                selector: selector.to_string(),
                reason: "selector must end with an element name".to_string(),
            });
        }
        Ok(Self {
            source: selector.to_string(),
            steps,
        })
    }

    /// Whether an element with the given ancestry (root element first, the element itself last) is selected
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        fn match_from<S: AsRef<str>>(steps: &[Step], path: &[S]) -> bool {
            let Some((step, remaining_steps)) = steps.split_first() else {
                return path.is_empty();
            };
            let name_matches = |s: &S| step.name.as_deref().map_or(true, |n| n == s.as_ref());
            match step.axis {
                Axis::Child => match path.split_first() {
                    Some((first, rest)) => name_matches(first) && match_from(remaining_steps, rest),
                    None => false,
                },
                Axis::Descendant => (0..path.len())
                    .any(|i| name_matches(&path[i]) && match_from(remaining_steps, &path[i + 1..])),
            }
        }
        match_from(&self.steps, path)
    }
}

impl Display for ElementSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::ElementSelector;

    #[test]
    fn test_absolute_xpath() {
        let s = ElementSelector::xpath("/log/entry").unwrap();
        assert!(s.matches(&["log", "entry"]));
        assert!(!s.matches(&["log", "day", "entry"]));
        assert!(!s.matches(&["log"]));
    }

    #[test]
    fn test_descendant_xpath() {
        let s = ElementSelector::xpath("//entry").unwrap();
        assert!(s.matches(&["entry"]));
        assert!(s.matches(&["log", "day", "entry"]));
        assert!(!s.matches(&["log", "entry", "note"]));
    }

    #[test]
    fn test_relative_xpath_starts_at_root_element() {
        let s = ElementSelector::xpath("entry").unwrap();
        assert!(s.matches(&["log", "entry"]));
        assert!(!s.matches(&["entry"]));
        let s = ElementSelector::xpath("day//entry").unwrap();
        assert!(s.matches(&["log", "day", "x", "entry"]));
        assert!(!s.matches(&["day", "entry"]));
    }

    #[test]
    fn test_wildcards_and_namespaces() {
        let s = ElementSelector::xpath("/*/x:entry").unwrap();
        assert!(s.matches(&["log", "entry"]));
    }

    #[test]
    fn test_css() {
        let s = ElementSelector::css("entry").unwrap();
        assert!(s.matches(&["entry"]));
        assert!(s.matches(&["log", "entry"]));
        let s = ElementSelector::css("log>entry").unwrap();
        assert!(s.matches(&["log", "entry"]));
        assert!(!s.matches(&["log", "day", "entry"]));
        let s = ElementSelector::css("log entry").unwrap();
        assert!(s.matches(&["root", "log", "day", "entry"]));
    }

    #[test]
    fn test_unsupported_selectors() {
        assert!(ElementSelector::xpath("//entry[@id='1']").is_err());
        assert!(ElementSelector::xpath("").is_err());
        assert!(ElementSelector::css("entry.important").is_err());
        assert!(ElementSelector::css("log >").is_err());
        assert!(ElementSelector::css("> entry").is_err());
    }

    #[test]
    fn test_css_rejects_non_type_selectors() {
        for selector in [
            "entry:first-child",
            "entry.important",
            "#main",
            "log > entry[kind]",
            "x|entry",
            "log + entry",
        ] {
            assert!(ElementSelector::css(selector).is_err(), "{selector}");
        }
        // XPath still ignores namespace prefixes
        let s = ElementSelector::xpath("//x:entry").unwrap();
        assert!(s.matches(&["log", "entry"]));
    }
}
