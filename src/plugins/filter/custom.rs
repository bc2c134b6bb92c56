//! The `custom` filter module.
//!
//! This is the filter the tutorial is about. It exposes a single filter,
//! `custom_title`, which title-cases a string and prepends an optional prefix:
//!
//! ```jinja2
//! {{ 'hello ansible' | custom_title('Custom: ') }}   {# Custom: Hello Ansible #}
//! {{ 42 | custom_title('Custom: ') }}                {# 42 #}
//! ```
//!
//! Anything that is not a string goes through untouched, so the filter can be
//! applied to arbitrary variables without guarding them first.

use minijinja::value::{Value, ValueKind};
use minijinja::{Error, ErrorKind};
use tracing::trace;

use super::{FilterMap, FilterModule};

/// Name under which the filter is registered.
pub const CUSTOM_TITLE: &str = "custom_title";

/// Name of the filter module.
pub const MODULE_NAME: &str = "custom";

/// Filter module providing `custom_title`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomFilters;

impl FilterModule for CustomFilters {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn description(&self) -> &'static str {
        "Title-case a string and prepend a prefix"
    }

    fn filters(&self) -> FilterMap {
        let mut filters = FilterMap::new();
        filters.insert(CUSTOM_TITLE, custom_title_filter);
        filters
    }
}

/// Title-case `value` and prepend `prefix`, passing non-strings through.
///
/// Strings are split on whitespace, each word gets an uppercase first letter
/// and a lowercase remainder, and the words are re-joined with single spaces.
/// Safe (already escaped) strings stay safe. Every other kind of value,
/// including numbers, booleans, `none`, lists and maps, is returned as is and
/// the prefix is ignored.
pub fn custom_title(value: &Value, prefix: &str) -> Value {
    if value.kind() != ValueKind::String {
        trace!(kind = %value.kind(), "custom_title: passing non-string value through");
        return value.clone();
    }

    let text = value.as_str().unwrap_or_default();
    let transformed = format!("{}{}", prefix, title_case(text));

    if value.is_safe() {
        Value::from_safe_string(transformed)
    } else {
        Value::from(transformed)
    }
}

/// Title-case a string word by word.
///
/// Leading, trailing and repeated whitespace collapse, since words are
/// re-joined with a single space.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character of a word and lowercase the rest.
///
/// When the uppercase mapping of the first character expands to several
/// characters (`ß` becomes `SS`), only the first of them stays uppercase;
/// the others are lowercased with the tail. That keeps `title_case`
/// idempotent.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let mut out = String::with_capacity(word.len());
    if let Some(head) = upper.next() {
        out.push(head);
    }

    let mut tail: String = upper.collect();
    tail.push_str(chars.as_str());
    out.push_str(&tail.to_lowercase());
    out
}

/// Template-facing adapter: `value | custom_title(prefix)`.
///
/// A missing, `none` or undefined prefix is treated as empty. A non-string
/// prefix is used through its string form.
fn custom_title_filter(value: Value, args: &[Value]) -> Result<Value, Error> {
    if args.len() > 1 {
        return Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("{CUSTOM_TITLE} takes at most one argument (prefix)"),
        ));
    }

    let prefix = match args.first() {
        None => String::new(),
        Some(arg) if arg.is_undefined() || arg.is_none() => String::new(),
        Some(arg) => match arg.as_str() {
            Some(s) => s.to_string(),
            None => arg.to_string(),
        },
    };

    Ok(custom_title(&value, &prefix))
}
