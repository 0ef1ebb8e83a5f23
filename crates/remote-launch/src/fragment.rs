//! Lazily-resolved text
//!
//! Every piece of a composed command is kept as a [`Fragments`] sequence of
//! literals and late-bound references. Nothing becomes a plain string until
//! [`Fragments::resolve`] is called at execution time with a
//! [`ResolutionContext`].
//!
//! Text written in a description uses `${name}` for a reference and
//! `${name:-default}` for a reference with a fallback. `$${...}` is an escape
//! that produces a literal `${...}` for the remote shell.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One node of a fragment sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Text used as-is
    Literal(String),
    /// Value looked up in the resolution context
    Reference {
        /// Lookup key
        key: String,
        /// Used when the key has no value
        default: Option<String>,
    },
    /// Resolves `inner`, then replaces every `find` with `replace`
    Replace {
        /// Literal to search for
        find: String,
        /// Literal to put in its place
        replace: String,
        /// The wrapped sequence
        inner: Fragments,
    },
}

impl Fragment {
    fn resolve_into(&self, ctx: &ResolutionContext, out: &mut String) -> Result<()> {
        match self {
            Fragment::Literal(text) => out.push_str(text),
            Fragment::Reference { key, default } => match ctx.lookup(key) {
                Some(value) => out.push_str(&value),
                None => match default {
                    Some(default) => out.push_str(default),
                    None => return Err(Error::UnresolvedReference { key: key.clone() }),
                },
            },
            Fragment::Replace {
                find,
                replace,
                inner,
            } => {
                let resolved = inner.resolve(ctx)?;
                if find.is_empty() {
                    out.push_str(&resolved);
                } else {
                    out.push_str(&resolved.replace(find.as_str(), replace));
                }
            }
        }
        Ok(())
    }
}

/// An ordered, immutable-by-convention sequence of fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments(Vec<Fragment>);

impl Fragments {
    /// Empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// A single literal
    pub fn literal(text: impl Into<String>) -> Self {
        Self(vec![Fragment::Literal(text.into())])
    }

    /// A single reference without default
    pub fn reference(key: impl Into<String>) -> Self {
        Self(vec![Fragment::Reference {
            key: key.into(),
            default: None,
        }])
    }

    /// Parse description text into literals and `${...}` references
    pub fn parse(text: &str) -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\$\{[^}]*\}|\$\{([^}]+)\}").expect("reference pattern is valid")
        });

        let mut fragments = Self::new();
        let mut last = 0;
        for cap in re.captures_iter(text) {
            let whole = cap.get(0).expect("capture 0 always present");
            fragments.push_str(&text[last..whole.start()]);
            last = whole.end();

            match cap.get(1) {
                Some(expr) => {
                    let expr = expr.as_str();
                    let (key, default) = match expr.find(":-") {
                        Some(pos) => (&expr[..pos], Some(expr[pos + 2..].to_string())),
                        None => (expr, None),
                    };
                    fragments.push(Fragment::Reference {
                        key: key.to_string(),
                        default,
                    });
                }
                // `$${...}` drops one `$`
                None => fragments.push_str(&whole.as_str()[1..]),
            }
        }
        fragments.push_str(&text[last..]);
        fragments
    }

    /// Append one fragment
    pub fn push(&mut self, fragment: Fragment) {
        self.0.push(fragment);
    }

    /// Append literal text, merging with a trailing literal
    pub fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Fragment::Literal(last)) = self.0.last_mut() {
            last.push_str(text);
        } else {
            self.0.push(Fragment::Literal(text.to_string()));
        }
    }

    /// Append a copy of another sequence
    pub fn append(&mut self, other: &Fragments) {
        for fragment in &other.0 {
            match fragment {
                Fragment::Literal(text) => self.push_str(text),
                other => self.0.push(other.clone()),
            }
        }
    }

    /// Builder form of [`Fragments::push_str`]
    pub fn with_str(mut self, text: &str) -> Self {
        self.push_str(text);
        self
    }

    /// Builder form of [`Fragments::append`]
    pub fn with(mut self, other: &Fragments) -> Self {
        self.append(other);
        self
    }

    /// True when the sequence has no fragments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the fragments
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.0.iter()
    }

    /// The text of this sequence if it contains no references
    pub fn as_literal(&self) -> Option<String> {
        self.resolve(&ResolutionContext::new()).ok().filter(|_| !self.has_references())
    }

    fn has_references(&self) -> bool {
        self.0.iter().any(|f| match f {
            Fragment::Literal(_) => false,
            Fragment::Reference { .. } => true,
            Fragment::Replace { inner, .. } => inner.has_references(),
        })
    }

    /// Resolve to a final string
    pub fn resolve(&self, ctx: &ResolutionContext) -> Result<String> {
        let mut out = String::new();
        for fragment in &self.0 {
            fragment.resolve_into(ctx, &mut out)?;
        }
        Ok(out)
    }
}

impl From<&str> for Fragments {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Fragments {
    fn from(text: String) -> Self {
        Self::literal(text)
    }
}

impl From<&Fragments> for Fragments {
    fn from(fragments: &Fragments) -> Self {
        fragments.clone()
    }
}

impl From<Fragment> for Fragments {
    fn from(fragment: Fragment) -> Self {
        Self(vec![fragment])
    }
}

impl FromIterator<Fragment> for Fragments {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Values available to references at resolution time
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Explicit values, checked first
    variables: HashMap<String, String>,
    /// Fall back to the process environment
    use_process_env: bool,
}

impl ResolutionContext {
    /// A context with no values
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that falls back to the process environment
    pub fn with_process_env() -> Self {
        Self {
            variables: HashMap::new(),
            use_process_env: true,
        }
    }

    /// Add or override a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Builder form of [`ResolutionContext::set`]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up a key
    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.variables.get(key) {
            return Some(value.clone());
        }
        if self.use_process_env {
            return std::env::var(key).ok();
        }
        None
    }
}
