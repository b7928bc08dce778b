//! End-to-end checks that each demo walkthrough actually produces the
//! result its doc comment promises.

use std::io::Write;

use deriva_cli::config::SynthConfig;
use deriva_cli::demo;

#[test]
fn constant_demo_finds_zero() {
    let out = demo::constant().expect("constant demo should not error");
    assert!(out.contains("0 == 0"), "unexpected output: {out}");
}

#[test]
fn variable_binding_demo_converges_on_the_free_variable() {
    let out = demo::variable_binding().expect("variable demo should not error");
    assert!(out.contains("x == x"), "unexpected output: {out}");
}

#[test]
fn bag_sum_demo_finds_the_sum_lift() {
    let out = demo::bag_sum().expect("bag sum demo should not error");
    assert!(out.contains("sum(xs)"), "unexpected output: {out}");
}

#[test]
fn filter_discovery_demo_finds_a_filter() {
    let out = demo::filter_discovery().expect("filter demo should not error");
    assert!(out.contains("Filter"), "unexpected output: {out}");
}

#[test]
fn cost_tie_break_demo_keeps_only_the_cheap_candidate() {
    let out = demo::cost_tie_break().expect("cost tie-break demo should not error");
    assert!(out.contains("true; (x + 0) excluded at size 3 in favor of it: true"));
}

#[test]
fn pick_to_sum_demo_matches_the_documented_order() {
    let out = demo::pick_to_sum(3, 5).expect("pick_to_sum demo should not error");
    assert_eq!(out, "[1, 1, 3], [1, 2, 2], [1, 3, 1], [2, 1, 2], [2, 2, 1], [3, 1, 1]");
}

#[test]
fn pick_to_sum_demo_honors_a_config_override() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp config file");
    write!(file, "[pick_to_sum]\nn = 2\ntotal = 4\n").expect("should write temp config file");

    let config = SynthConfig::load(file.path()).expect("should load the config file");
    let out = demo::pick_to_sum(config.pick_to_sum.n, config.pick_to_sum.total)
        .expect("pick_to_sum demo should not error");
    assert_eq!(out, "[1, 3], [2, 2], [3, 1]");
}
