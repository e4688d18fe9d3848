//! Property-based tests for the expansion invariants.

mod common;

use common::expand_plain;
use proptest::prelude::*;

/// Text with no identifier characters and no quote, comment or macro
/// syntax: expansion must be the identity on it.
fn inert_text() -> impl Strategy<Value = String> {
    "[0-9 .;:+*/=!?@<>{}\\[\\]\n-]{0,60}"
}

/// Lowercase names prefixed so they can never collide with a builtin or
/// a predefined platform macro.
fn fresh_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|s| format!("v{s}"))
}

/// Body text that is safe to rescan: uppercase only, so it can never
/// form a builtin name, and free of quote, dollar, parenthesis and
/// comma characters.
fn plain_body() -> impl Strategy<Value = String> {
    "[A-Z0-9 .;:!?-]{0,30}"
}

proptest! {
    /// Identity on macro-free text.
    #[test]
    fn macro_free_text_is_identity(text in inert_text()) {
        prop_assert_eq!(expand_plain(&text), text);
    }

    /// An identifier with no active definition passes through
    /// byte-for-byte.
    #[test]
    fn undefined_words_pass_through(name in fresh_name()) {
        prop_assert_eq!(expand_plain(&name), name);
    }

    /// pushdef/pushdef/popdef leaves the first definition; a second
    /// popdef leaves the name undefined.
    #[test]
    fn pushdef_popdef_is_a_stack(name in fresh_name(), a in plain_body(), b in plain_body()) {
        let input = format!(
            "pushdef(`{name}',`{a}')pushdef(`{name}',`{b}')popdef(`{name}'){name}"
        );
        prop_assert_eq!(expand_plain(&input), a.clone());

        let input = format!(
            "pushdef(`{name}',`{a}')pushdef(`{name}',`{b}')popdef(`{name}')popdef(`{name}')ifdef(`{name}',`Y',`N')"
        );
        prop_assert_eq!(expand_plain(&input), "N");
    }

    /// define then undefine prints the else branch of ifdef.
    #[test]
    fn undefine_erases(name in fresh_name(), body in plain_body()) {
        let input = format!(
            "define(`{name}',`{body}')undefine(`{name}')ifdef(`{name}',`Y',`N')"
        );
        prop_assert_eq!(expand_plain(&input), "N");
    }

    /// Nested quotes of depth k need exactly k right quotes to close and
    /// shed exactly one level.
    #[test]
    fn nested_quotes_shed_one_level(depth in 1usize..6, inner in "[a-z0-9 ]{0,20}") {
        let input = format!("{}{}{}", "`".repeat(depth), inner, "'".repeat(depth));
        let expected = format!("{}{}{}", "`".repeat(depth - 1), inner, "'".repeat(depth - 1));
        prop_assert_eq!(expand_plain(&input), expected);
    }

    /// Once translit has removed every source-set character, running it
    /// again changes nothing.
    #[test]
    fn translit_reaches_a_fixed_point(text in "[a-z]{0,30}") {
        let once = expand_plain(&format!("translit(`{text}', `a-m', `n-z')"));
        let twice = expand_plain(&format!("translit(`{once}', `a-m', `n-z')"));
        prop_assert_eq!(once, twice);
    }

    /// Substituting the whole match by itself is the identity, so
    /// patsubst with `&` is idempotent.
    #[test]
    fn patsubst_of_the_whole_match_is_idempotent(text in "[a-z ]{0,30}") {
        let once = expand_plain(&format!("patsubst(`{text}', `[a-z]+', `&')"));
        prop_assert_eq!(&once, &text);
        let twice = expand_plain(&format!("patsubst(`{once}', `[a-z]+', `&')"));
        prop_assert_eq!(twice, once);
    }

    /// Wrapping any valid expression in parentheses never changes eval.
    #[test]
    fn eval_is_stable_under_parenthesization(
        a in -99i64..100,
        b in -99i64..100,
        c in 1i64..50,
    ) {
        let expr = format!("{a}+{b}*{c}");
        let direct = mfour::eval::eval(&expr).unwrap();
        let wrapped = mfour::eval::eval(&format!("({expr})")).unwrap();
        prop_assert_eq!(direct, wrapped);
    }

    /// eval output re-fed to eval is a fixed point.
    #[test]
    fn eval_output_is_normal_form(a in -999i64..1000) {
        let rendered = expand_plain(&format!("eval({a})"));
        prop_assert_eq!(expand_plain(&format!("eval({rendered})")), rendered);
    }

    /// A defined name expands to its body wherever the body is inert.
    #[test]
    fn define_substitutes_the_body(name in fresh_name(), body in plain_body()) {
        let input = format!("define(`{name}',`{body}'){name}");
        prop_assert_eq!(expand_plain(&input), body);
    }
}
