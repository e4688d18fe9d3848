//! End-to-end expansion behavior: the token loop, argument collection,
//! rescanning, quoting, comments, diversions and the wrap queue.

mod common;

use common::{expand_plain, plain_config, run_with_sinks};
use mfour::{Config, Error};

#[test]
fn define_then_invoke() {
    assert_eq!(expand_plain("define(`foo', `bar')foo"), "bar");
}

#[test]
fn positional_parameters_substitute() {
    assert_eq!(
        expand_plain("define(`greet', `hello $1!')greet(`world')"),
        "hello world!"
    );
}

#[test]
fn pushdef_shadows_and_popdef_restores() {
    assert_eq!(
        expand_plain("pushdef(`x',`1')pushdef(`x',`2')x popdef(`x')x"),
        "2 1"
    );
}

#[test]
fn ifelse_compares() {
    assert_eq!(expand_plain("ifelse(a,a,yes,no)-ifelse(a,b,yes,no)"), "yes-no");
}

#[test]
fn eval_respects_precedence() {
    assert_eq!(expand_plain("eval(2+3*4)"), "14");
}

#[test]
fn translit_maps_ranges() {
    assert_eq!(expand_plain("translit(`HELLO',`A-Z',`a-z')"), "hello");
}

#[test]
fn diverted_text_appears_after_current_output() {
    assert_eq!(
        expand_plain("divert(1)one divert(0)zero undivert(1)"),
        "zero one "
    );
}

#[test]
fn undefined_identifiers_print_literally() {
    assert_eq!(expand_plain("nodef(a)b"), "nodef(a)b");
}

#[test]
fn macro_free_text_is_identity() {
    let text = "just plain text with 123 numbers.\nsecond line\n";
    assert_eq!(expand_plain(text), text);
}

#[test]
fn quoting_suppresses_expansion() {
    assert_eq!(expand_plain("define(`foo',`bar')`foo'"), "foo");
}

#[test]
fn nested_quotes_lose_one_level() {
    assert_eq!(expand_plain("``foo''"), "`foo'");
    assert_eq!(expand_plain("```deep'''"), "``deep''");
}

#[test]
fn expansion_results_are_rescanned() {
    assert_eq!(expand_plain("define(`a',`b')define(`x',`a')x"), "b");
}

#[test]
fn arguments_expand_during_collection() {
    assert_eq!(
        expand_plain("define(`inner',`X')define(`outer',`[$1]')outer(inner)"),
        "[X]"
    );
}

#[test]
fn quoted_arguments_do_not_expand() {
    assert_eq!(
        expand_plain("define(`inner',`X')define(`outer',`[$1]')outer(`inner')"),
        "[inner]"
    );
}

#[test]
fn unquoted_leading_whitespace_is_skipped_in_arguments() {
    assert_eq!(expand_plain("define(`id',`<$1>')id(  padded  )"), "<padded  >");
}

#[test]
fn parentheses_nest_inside_arguments() {
    assert_eq!(expand_plain("define(`id',`$1')id((a,b))"), "(a,b)");
}

#[test]
fn nesting_limit_aborts_runaway_recursion() {
    let mut config = plain_config();
    config.nesting_limit = 20;
    let (result, _, _) = run_with_sinks("define(`x', `x(x($1))')x(1)", config);
    assert!(matches!(result, Err(Error::NestingLimit(20))));
}

#[test]
fn eof_inside_argument_list_is_fatal() {
    let (result, _, _) = run_with_sinks("define(`f',`$1')f(unclosed", plain_config());
    assert!(matches!(result, Err(Error::EofInArguments)));
}

#[test]
fn unterminated_quote_is_fatal() {
    let (result, _, _) = run_with_sinks("`never closed", plain_config());
    assert!(matches!(result, Err(Error::UnterminatedString { .. })));
}

#[test]
fn changequote_switches_delimiters_and_restores() {
    assert_eq!(
        expand_plain("changequote([,])[foo] changequote`bar'"),
        "foo bar"
    );
}

#[test]
fn comments_pass_through_uninterpreted() {
    assert_eq!(
        expand_plain("define(`foo',`bar')# foo `quote'\nfoo"),
        "# foo `quote'\nbar"
    );
}

#[test]
fn changecom_switches_comment_delimiters() {
    assert_eq!(
        expand_plain("changecom(`<!--',`-->')<!-- define(`a',`b') -->a"),
        "<!-- define(`a',`b') -->a"
    );
}

#[test]
fn dnl_discards_the_rest_of_the_line() {
    assert_eq!(expand_plain("define(`foo',`bar')dnl trailing junk\nfoo"), "bar");
}

#[test]
fn dnl_at_eof_warns_but_does_not_abort() {
    let (result, out, err) = run_with_sinks("ok dnl junk with no newline", plain_config());
    assert!(result.is_ok());
    assert_eq!(out, "ok ");
    assert!(err.contains("end of file treated as newline"));
}

#[test]
fn divnum_reports_the_current_diversion() {
    assert_eq!(expand_plain("divnum"), "0");
    assert_eq!(expand_plain("divert(3)divnum"), "3");
    assert_eq!(expand_plain("divert(-1)divnum"), "");
}

#[test]
fn negative_diversions_discard_text() {
    assert_eq!(expand_plain("divert(-1)gone divert(0)kept"), "kept");
}

#[test]
fn remaining_diversions_flush_at_eof_in_id_order() {
    assert_eq!(
        expand_plain("divert(2)two divert(1)one divert(0)zero "),
        "zero one two "
    );
}

#[test]
fn m4wrap_defers_text_to_eof() {
    assert_eq!(expand_plain("m4wrap(`bye')main"), "mainbye");
}

#[test]
fn m4wrap_entries_replay_in_registration_order() {
    assert_eq!(expand_plain("m4wrap(`1')m4wrap(`2')x"), "x12");
}

#[test]
fn m4wrap_text_is_rescanned() {
    assert_eq!(
        expand_plain("define(`late',`LATE')m4wrap(`late')body "),
        "body LATE"
    );
}

#[test]
fn blind_builtins_print_literally_without_parens() {
    assert_eq!(expand_plain("define and len"), "define and len");
}

#[test]
fn prefix_mode_registers_m4_names_only() {
    let mut config = plain_config();
    config.prefix_all_builtins = true;
    let (result, out, _) = run_with_sinks("m4_define(`a',`b')a define", config);
    assert!(result.is_ok());
    assert_eq!(out, "b define");
}

#[test]
fn traditional_mode_drops_gnu_extensions() {
    let mut config = plain_config();
    config.no_gnu_extensions = true;
    let (result, out, _) = run_with_sinks("patsubst(`x', `x', `y')", config);
    assert!(result.is_ok());
    assert_eq!(out, "patsubst(x, x, y)");
}

#[test]
fn dollar_star_and_at_forward_arguments() {
    assert_eq!(
        expand_plain("define(`all',`$*|$@|$#')all(`a', `b', `c')"),
        "a,b,c|a,b,c|3"
    );
}

#[test]
fn dollar_zero_is_the_macro_name() {
    assert_eq!(expand_plain("define(`self',`$0')self"), "self");
}

#[test]
fn m4exit_carries_its_code() {
    let (result, out, _) = run_with_sinks("before m4exit(`2') after", plain_config());
    assert!(matches!(result, Err(Error::Exit(2))));
    assert_eq!(out, "before ");
}

#[test]
fn m4exit_defaults_to_zero() {
    let (result, _, _) = run_with_sinks("m4exit", plain_config());
    assert!(matches!(result, Err(Error::Exit(0))));
}

#[test]
fn sync_lines_track_the_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.m4");
    std::fs::write(&path, "hello\nworld\n").unwrap();

    let config = Config::default();
    let out = mfour::CaptureBuffer::new();
    let mut processor = mfour::Processor::new(config).with_output(Box::new(out.clone()));
    processor.process_file(path.to_str().unwrap()).unwrap();
    assert_eq!(out.contents(), "#line 1 \"in.m4\"\nhello\nworld\n");
}

#[test]
fn sync_lines_resync_after_dnl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.m4");
    std::fs::write(&path, "dnl heading\nbody\n").unwrap();

    let out = mfour::CaptureBuffer::new();
    let mut processor = mfour::Processor::new(Config::default()).with_output(Box::new(out.clone()));
    processor.process_file(path.to_str().unwrap()).unwrap();
    assert_eq!(out.contents(), "#line 2 \"in.m4\"\nbody\n");
}
