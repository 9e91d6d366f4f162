//! Enum adaptation
//!
//! A value is converted to a constant of the target enum by name, ignoring
//! case, and failing that by the name split into upper-case words (so that
//! `fooBar` and `FOO_BAR` both find `FOO_BAR`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::reflect::{ClassRef, EnumConstant, Value};
use crate::{AdapterError, AdapterResult};

static UPPER_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new("([A-Z]*)([a-z0-9]*)").expect("word pattern is valid"));

/// Convert `source` to a constant of the enum `target`
pub(crate) fn adapt_to_enum(target: &ClassRef, source: &Value) -> AdapterResult<Value> {
    let literal = match source {
        Value::Enum(constant) => constant.name().to_string(),
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    };
    to_enum(target, &literal).map(Value::Enum)
}

fn to_enum(target: &ClassRef, literal: &str) -> AdapterResult<EnumConstant> {
    if let Some(constant) = find_constant(target, literal) {
        return Ok(constant);
    }
    let words = to_words(literal, '_');
    if let Some(constant) = find_constant(target, &words) {
        return Ok(constant);
    }
    Err(AdapterError::InvalidEnumLiteral {
        literal: literal.to_string(),
        enum_type: target.name().to_string(),
        valid: target.enum_constants().collect::<Vec<_>>().join(", "),
    })
}

fn find_constant(target: &ClassRef, literal: &str) -> Option<EnumConstant> {
    let wanted = literal.to_lowercase();
    target
        .enum_constants()
        .find(|name| name.to_lowercase() == wanted)
        .and_then(|name| EnumConstant::of(target, name).ok())
}

/// Split a camel-case string into lower-case words joined by `separator`.
///
/// Words are runs of upper-case letters followed by lower-case letters or
/// digits. When such a run has more than one upper-case letter, its last one
/// starts the next word (`URLPath` gives `url_path`). Other characters are
/// dropped.
pub fn to_words(camel_case: &str, separator: char) -> String {
    let mut words = String::with_capacity(camel_case.len() + 4);
    for captures in UPPER_LOWER.captures_iter(camel_case) {
        let upper = captures.get(1).map_or("", |m| m.as_str());
        let lower = captures.get(2).map_or("", |m| m.as_str());
        if upper.is_empty() && lower.is_empty() {
            continue;
        }
        if !words.is_empty() {
            words.push(separator);
        }
        if upper.len() > 1 && !lower.is_empty() {
            let split = upper.len() - 1;
            words.push_str(&upper[..split].to_lowercase());
            words.push(separator);
            words.push_str(&upper[split..].to_lowercase());
        } else {
            words.push_str(&upper.to_lowercase());
        }
        words.push_str(lower);
    }
    words
}
