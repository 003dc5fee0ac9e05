//! Template validation rules: `required`, `pattern:<re>`, `not_future`,
//! `min_length:<n>` and `one_of:<a>|<b>`.

use regex::Regex;

#[derive(Debug, Clone)]
pub enum RuleKind {
    Required,
    /// The whole value must match.
    Pattern(Regex),
    /// An ISO date value must not lie after the validation day.
    NotFuture,
    /// Minimum length in characters after trimming.
    MinLength(usize),
    /// Value must equal one of the options, ignoring case.
    OneOf(Vec<String>),
}

impl RuleKind {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (name, arg) = match raw.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (raw, None),
        };
        match (name, arg) {
            ("required", None) => Ok(RuleKind::Required),
            ("not_future", None) => Ok(RuleKind::NotFuture),
            ("pattern", Some(pattern)) => Regex::new(&format!("^(?:{})$", pattern.trim()))
                .map(RuleKind::Pattern)
                .map_err(|err| err.to_string()),
            ("min_length", Some(n)) => n
                .trim()
                .parse::<usize>()
                .map(RuleKind::MinLength)
                .map_err(|err| format!("invalid length {n:?}: {err}")),
            ("one_of", Some(options)) => {
                let options: Vec<String> = options
                    .split('|')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect();
                if options.is_empty() {
                    Err("one_of needs at least one option".to_string())
                } else {
                    Ok(RuleKind::OneOf(options))
                }
            }
            ("required" | "not_future", Some(_)) => Err(format!("{name} takes no argument")),
            ("pattern" | "min_length" | "one_of", None) => {
                Err(format!("{name} needs an argument"))
            }
            _ => Err(format!("unknown rule {name:?}")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Pattern(_) => "pattern",
            RuleKind::NotFuture => "not_future",
            RuleKind::MinLength(_) => "min_length",
            RuleKind::OneOf(_) => "one_of",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: String,
    pub rule: RuleKind,
    /// Rule text as written in the catalog.
    pub source: String,
    pub message: String,
}
