//! Path placeholders in attribute values and their evaluation against the
//! input document.

mod document;
mod evaluator;
mod template;

pub use document::DataDocument;
pub use evaluator::{PathEvaluator, PathValue};
pub use template::{InternalCall, Segment, Template};

use crate::ProcessorError;

/// Answers `^counter_<name>~` and `^uniqueidentifier_<name>~` calls.
pub trait InternalResolver {
    fn resolve(&self, call: &InternalCall) -> Result<String, ProcessorError>;
}

/// Replace every internal call in `expr` with its current value. Anything
/// else between `^` and `~` is left untouched.
pub fn resolve_internal_calls<R: InternalResolver + ?Sized>(
    expr: &str,
    resolver: &R,
) -> Result<String, ProcessorError> {
    if !expr.contains('^') {
        return Ok(expr.to_string());
    }
    let mut resolved = String::with_capacity(expr.len());
    let mut rest = expr;
    while let Some(start) = rest.find('^') {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('~') else {
            resolved.push_str(&rest[start..]);
            return Ok(resolved);
        };
        match InternalCall::parse(&after[..end]) {
            Some(call) => resolved.push_str(&resolver.resolve(&call)?),
            None => resolved.push_str(&rest[start..start + end + 2]),
        }
        rest = &after[end + 1..];
    }
    resolved.push_str(rest);
    Ok(resolved)
}

/// Turn a `match` attribute into an evaluable expression: nested internal
/// calls are resolved, then one pair of surrounding braces is dropped.
pub fn prepare_match<R: InternalResolver + ?Sized>(
    raw: &str,
    resolver: &R,
) -> Result<String, ProcessorError> {
    let resolved = resolve_internal_calls(raw.trim(), resolver)?;
    let inner = resolved.strip_prefix('{').unwrap_or(&resolved);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    Ok(inner.to_string())
}
