//! Gate deciding whether a launch happens at all

use crate::error::{Error, Result};
use crate::fragment::{Fragments, ResolutionContext};

/// A launch gate, evaluated once when the launch is planned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Condition {
    /// Always launch
    #[default]
    Always,
    /// Launch when the expression resolves to true
    If(Fragments),
    /// Launch when the expression resolves to false
    Unless(Fragments),
}

impl Condition {
    /// Resolve and evaluate the gate
    pub fn evaluate(&self, ctx: &ResolutionContext) -> Result<bool> {
        match self {
            Condition::Always => Ok(true),
            Condition::If(expr) => parse_bool(&expr.resolve(ctx)?),
            Condition::Unless(expr) => parse_bool(&expr.resolve(ctx)?).map(|v| !v),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::InvalidCondition {
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always() {
        assert!(Condition::Always.evaluate(&ResolutionContext::new()).unwrap());
    }

    #[test]
    fn test_if_and_unless() {
        let ctx = ResolutionContext::new().with_var("remote", "True");
        let expr = Fragments::reference("remote");
        assert!(Condition::If(expr.clone()).evaluate(&ctx).unwrap());
        assert!(!Condition::Unless(expr).evaluate(&ctx).unwrap());

        assert!(!Condition::If(Fragments::literal("0")).evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_rejects_non_boolean() {
        let err = Condition::If(Fragments::literal("yes"))
            .evaluate(&ResolutionContext::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCondition { ref value } if value == "yes"));
    }
}
