//! Property-based tests for the custom_title filter using proptest.
//!
//! Random inputs check the filter's laws: prefix plus title case for
//! strings, identity for everything else, and idempotent title casing.

use custom_filter::plugins::filter::custom::{custom_title, title_case};
use custom_filter::template::{TemplateEngine, TemplateVars};
use minijinja::Value;
use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Strategy for ASCII words separated by assorted whitespace
fn ascii_sentence() -> impl Strategy<Value = String> {
    vec(("[a-zA-Z0-9']{1,12}", "[ \\t\\n]{1,3}"), 0..8).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(word, space)| format!("{word}{space}"))
            .collect()
    })
}

/// Strategy for text drawn from Latin letters, including accented ones
fn latin_text() -> impl Strategy<Value = String> {
    prop_oneof![
        ascii_sentence(),
        "[a-zA-ZàáâäçèéêëìíîïñòóôöùúûüÿßÀÁÂÄÇÈÉÊËÌÍÎÏÑÒÓÔÖÙÚÛÜ ]{0,40}",
        Just(String::new()),
    ]
}

/// Strategy for prefixes
fn prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Custom: ".to_string()),
        "[ -~]{0,10}",
    ]
}

/// Strategy for values that are not strings
fn non_string_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        Just(Value::from(())),
        Just(Value::UNDEFINED),
        vec("[a-z]{0,5}", 0..5).prop_map(Value::from),
        vec(any::<i32>(), 0..5).prop_map(Value::from),
    ]
}

// ============================================================================
// Filter laws
// ============================================================================

mod filter_laws {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: strings become prefix + title case
        #[test]
        fn string_gets_prefix_and_title_case(s in latin_text(), p in prefix()) {
            let out = custom_title(&Value::from(s.as_str()), &p);
            let expected = format!("{}{}", p, title_case(&s));
            prop_assert_eq!(out.as_str(), Some(expected.as_str()));
        }

        /// Property: non-strings are returned unchanged
        #[test]
        fn non_string_is_identity(v in non_string_value(), p in prefix()) {
            let out = custom_title(&v, &p);
            prop_assert_eq!(out.kind(), v.kind());
            prop_assert_eq!(out, v);
        }

        /// Property: title casing twice changes nothing
        #[test]
        fn title_case_is_idempotent(s in latin_text()) {
            let once = title_case(&s);
            prop_assert_eq!(title_case(&once), once);
        }

        /// Property: every word starts uppercase and continues lowercase
        #[test]
        fn ascii_words_are_capitalized(s in ascii_sentence()) {
            for word in title_case(&s).split(' ') {
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    prop_assert!(!first.is_ascii_lowercase());
                }
                prop_assert!(chars.all(|c| !c.is_ascii_uppercase()));
            }
        }

        /// Property: the word count survives, whitespace collapses
        #[test]
        fn word_count_is_preserved(s in ascii_sentence()) {
            let out = title_case(&s);
            prop_assert_eq!(out.split_whitespace().count(), s.split_whitespace().count());
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}

// ============================================================================
// Through the template engine
// ============================================================================

mod template_pipe {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the pipe form agrees with the direct call
        #[test]
        fn pipe_matches_direct_call(s in ascii_sentence(), p in "[a-zA-Z: ]{0,8}") {
            let engine = TemplateEngine::new();
            let mut vars = TemplateVars::new();
            vars.insert("s".to_string(), serde_json::Value::String(s.clone()));
            vars.insert("p".to_string(), serde_json::Value::String(p.clone()));

            let out = engine.evaluate("s | custom_title(p)", &vars).unwrap();
            prop_assert_eq!(out, serde_json::Value::String(format!("{}{}", p, title_case(&s))));
        }

        /// Property: integers keep their type through the engine
        #[test]
        fn integers_survive_the_pipe(n in any::<i32>()) {
            let engine = TemplateEngine::new();
            let mut vars = TemplateVars::new();
            vars.insert("n".to_string(), serde_json::json!(n));

            let out = engine.evaluate("n | custom_title('Custom: ')", &vars).unwrap();
            prop_assert_eq!(out, serde_json::json!(n));
        }
    }
}
