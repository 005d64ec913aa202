use std::fmt::Display;

use crate::{error::ConversionError, record::Record};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateToken {
    Literal(String),
    Field(String),
}

///
/// A compiled value template
///
/// Templates consist of literal text and `%(field)s` placeholders referencing raw record fields.
/// `%%` produces a literal `%`.
///
/// Templates are compiled once (see [`Template::compile`]) and evaluated against every record.
///
/// ```rust
/// use something_to_xes::{mapping::Template, record};
/// let t = Template::compile("%(first)s %(last)s").unwrap();
/// assert_eq!(t.evaluate(&record! {"first" => "Jens", "last" => "Jensen"}).as_deref(), Some("Jens Jensen"));
/// assert_eq!(t.evaluate(&record! {"first" => "Jens"}), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<TemplateToken>,
}

impl Template {
    /// The empty template, which matches every record and evaluates to `""`
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            tokens: Vec::new(),
        }
    }

    /// Compile a template string into literal and field tokens
    pub fn compile(source: &str) -> Result<Self, ConversionError> {
        let invalid = |reason: String| ConversionError::InvalidTemplate {
            template: source.to_string(),
            reason,
        };
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some((_, '%')) => literal.push('%'),
                Some((open, '(')) => {
                    let rest = &source[open + 1..];
                    let close = rest.find(')').ok_or_else(|| {
                        invalid(format!("unterminated placeholder at position {pos}"))
                    })?;
                    let field = &rest[..close];
                    // Skip the field name and closing parenthesis
                    for _ in 0..field.chars().count() + 1 {
                        chars.next();
                    }
                    match chars.next() {
                        Some((_, 's')) => {}
                        Some((_, other)) => {
                            return Err(invalid(format!(
                                "unsupported conversion '{other}' for field \"{field}\" (only 's' is supported)"
                            )))
                        }
                        None => {
                            return Err(invalid(format!(
                                "missing conversion after field \"{field}\""
                            )))
                        }
                    }
                    if !literal.is_empty() {
                        tokens.push(TemplateToken::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(TemplateToken::Field(field.to_string()));
                }
                Some((_, other)) => {
                    return Err(invalid(format!(
                        "'%{other}' at position {pos} is not a named placeholder; use %(field)s or %%"
                    )))
                }
                None => return Err(invalid("template ends with a single '%'".to_string())),
            }
        }
        if !literal.is_empty() {
            tokens.push(TemplateToken::Literal(literal));
        }
        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    /// Substitute all placeholders with the values of `record`
    ///
    /// Returns `None` if any referenced field is missing or has no value.
    pub fn evaluate(&self, record: &Record) -> Option<String> {
        let mut res = String::new();
        for t in &self.tokens {
            match t {
                TemplateToken::Literal(s) => res.push_str(s),
                TemplateToken::Field(f) => res.push_str(record.get(f)?),
            }
        }
        Some(res)
    }

    /// Names of all fields referenced by this template
    pub fn referenced_fields(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            TemplateToken::Field(f) => Some(f.as_str()),
            TemplateToken::Literal(_) => None,
        })
    }

    /// The template string this template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
