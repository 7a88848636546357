use super::*;
use crate::data::Relation;
use crate::test_support::{FakeFactory, FakeWiring};
use std::cell::RefCell;

#[derive(Default)]
struct RecordingCacheBuilder {
    requests: RefCell<Vec<CacheRequest>>,
}

impl CacheBuilder for RecordingCacheBuilder {
    fn build(&self, request: &CacheRequest) -> Result<(), SmatchError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(())
    }
}

fn invocation(command: &str, args: &[&str]) -> Invocation {
    Invocation::new(command, args.iter().map(|arg| arg.to_string()).collect())
}

fn run(factory: &FakeFactory, command: &str, args: &[&str]) -> Outcome {
    let cache = RecordingCacheBuilder::default();
    Dispatcher::new(factory, &cache).dispatch(&invocation(command, args))
}

fn assert_declined(outcome: &Outcome, kind: ErrorKind) {
    match outcome {
        Outcome::Declined(err) => assert_eq!(err.kind(), kind, "{err}"),
        other => panic!("expected {kind} to be declined, got {other}"),
    }
}

#[test]
fn short_argument_lists_are_usage_errors_before_resolution() {
    let cases: &[(&str, &[&str])] = &[
        ("convert", &["in"]),
        ("offline", &["in"]),
        ("online", &["src", "tgt"]),
        ("filter", &["src", "tgt", "map"]),
        ("allsteps", &["src", "tgt"]),
        ("wntoflat", &["props"]),
        ("translate", &["a", "b"]),
    ];
    for (command, args) in cases {
        let factory = FakeFactory::new(FakeWiring::full());
        let outcome = run(&factory, command, args);
        assert_declined(&outcome, ErrorKind::Usage);
        assert!(!outcome.is_failure());
        assert_eq!(factory.resolutions.get(), 0, "{command} resolved a manager");
        assert!(factory.recorder.calls().is_empty(), "{command} ran stages");
    }
}

#[test]
fn wntoflat_rejects_eight_arguments() {
    let factory = FakeFactory::new(FakeWiring::full());
    let cache = RecordingCacheBuilder::default();
    let args = ["props", "f1", "f2", "f3", "f4", "f5", "f6", "f7"];
    let outcome = Dispatcher::new(&factory, &cache).dispatch(&invocation("wntoflat", &args));
    assert_declined(&outcome, ErrorKind::Usage);
    assert!(cache.requests.borrow().is_empty());
}

#[test]
fn wntoflat_bypasses_the_manager() {
    let factory = FakeFactory::new(FakeWiring::full());
    let cache = RecordingCacheBuilder::default();
    let args = ["props", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8"];
    let outcome = Dispatcher::new(&factory, &cache).dispatch(&invocation("wntoflat", &args));
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(factory.resolutions.get(), 0);
    let requests = cache.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].properties, Path::new("props"));
    assert_eq!(requests[0].outputs.len(), 8);
}

#[test]
fn convert_with_two_arguments_converts_one_context() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "convert", &["in.txt", "out.txt"]);
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(
        factory.recorder.calls(),
        vec!["load_context in", "render_context out"]
    );
}

#[test]
fn convert_with_four_arguments_converts_a_mapping() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "convert", &["s.txt", "t.txt", "in.map", "out.map"]);
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(
        factory.recorder.calls(),
        vec![
            "load_context s",
            "load_context t",
            "load_mapping in",
            "render_mapping out"
        ]
    );
}

#[test]
fn convert_with_three_arguments_is_a_usage_error() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "convert", &["s.txt", "t.txt", "in.map"]);
    assert_declined(&outcome, ErrorKind::Usage);
    assert_eq!(factory.resolutions.get(), 0);
}

#[test]
fn mapping_conversion_needs_structured_loading() {
    let factory = FakeFactory::new(FakeWiring {
        structured_loading: false,
        ..FakeWiring::full()
    });
    let outcome = run(&factory, "convert", &["s.txt", "t.txt", "in.map", "out.map"]);
    assert_declined(&outcome, ErrorKind::CapabilityUnavailable);
    assert!(!outcome.is_failure());
    assert_eq!(factory.resolutions.get(), 1);
    assert!(factory.recorder.calls().is_empty());
}

#[test]
fn offline_needs_structured_loading_and_rendering() {
    let factory = FakeFactory::new(FakeWiring {
        structured_rendering: false,
        ..FakeWiring::full()
    });
    let outcome = run(&factory, "offline", &["in.txt", "out.txt"]);
    assert_declined(&outcome, ErrorKind::CapabilityUnavailable);
    assert!(factory.recorder.calls().is_empty());

    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "offline", &["in.txt", "out.txt"]);
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(
        factory.recorder.calls(),
        vec!["load_context in", "offline in", "render_context out preprocessed"]
    );
}

#[test]
fn online_loads_matches_and_renders_only() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "online", &["src.xml", "tgt.xml", "out.xml"]);
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(
        factory.recorder.calls(),
        vec![
            "load_context src",
            "load_context tgt",
            "online src",
            "render_mapping out"
        ]
    );
    assert_eq!(factory.recorder.rendered(), factory.recorder.matched());
}

#[test]
fn filter_failure_outside_allsteps_fails_the_command() {
    let factory = FakeFactory::new(FakeWiring {
        filter: Some(true),
        ..FakeWiring::full()
    });
    let outcome = run(&factory, "filter", &["s.txt", "t.txt", "in.map", "out.map"]);
    match &outcome {
        Outcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::Filter),
        other => panic!("expected failure, got {other}"),
    }
    assert!(factory.recorder.rendered().is_empty());
}

#[test]
fn allsteps_renders_the_filtered_subset() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "allsteps", &["s.txt", "t.txt", "out.map"]);
    assert!(matches!(outcome, Outcome::Completed), "{outcome}");
    assert_eq!(
        factory.recorder.calls(),
        vec![
            "load_context s",
            "offline s",
            "load_context t",
            "offline t",
            "online s preprocessed",
            "filter",
            "render_mapping out"
        ]
    );
    let (matched, rendered) = (factory.recorder.matched(), factory.recorder.rendered());
    let (matched, rendered) = (&matched[0], &rendered[0]);
    assert!(rendered.is_subset_of(matched));
    assert!(rendered.len() < matched.len());
    assert!(rendered
        .elements()
        .all(|element| element.relation == Relation::Equivalent));
}

#[test]
fn allsteps_renders_the_unfiltered_mapping_when_filtering_fails() {
    let factory = FakeFactory::new(FakeWiring {
        filter: Some(true),
        ..FakeWiring::full()
    });
    let outcome = run(&factory, "allsteps", &["s.txt", "t.txt", "out.map"]);
    assert!(matches!(outcome, Outcome::Unfiltered), "{outcome}");
    assert!(!outcome.is_failure());
    assert_eq!(factory.recorder.rendered(), factory.recorder.matched());
}

#[test]
fn allsteps_without_a_filter_skips_the_stage() {
    let factory = FakeFactory::new(FakeWiring {
        filter: None,
        ..FakeWiring::full()
    });
    let outcome = run(&factory, "allsteps", &["s.txt", "t.txt", "out.map"]);
    assert!(matches!(outcome, Outcome::Unfiltered), "{outcome}");
    assert!(!factory.recorder.calls().contains(&"filter".to_string()));
    assert_eq!(factory.recorder.rendered(), factory.recorder.matched());
}

#[test]
fn stage_failures_abort_the_remaining_stages() {
    let factory = FakeFactory::new(FakeWiring::full());
    let outcome = run(&factory, "allsteps", &["s.txt", "missing.txt", "out.map"]);
    match &outcome {
        Outcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::Load),
        other => panic!("expected failure, got {other}"),
    }
    assert_eq!(
        factory.recorder.calls(),
        vec!["load_context s", "offline s", "load_context missing"]
    );
}

#[test]
fn configuration_errors_fail_before_any_stage() {
    let mut factory = FakeFactory::new(FakeWiring::full());
    factory.fail = true;
    let outcome = run(&factory, "online", &["s.txt", "t.txt", "out.map"]);
    match &outcome {
        Outcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::Configuration),
        other => panic!("expected failure, got {other}"),
    }
    assert!(factory.recorder.calls().is_empty());
}

#[test]
fn extra_arguments_are_ignored() {
    let args: Vec<String> = ["s", "t", "o", "x"].iter().map(|arg| arg.to_string()).collect();
    let plan = plan("online", &args).expect("plan");
    assert_eq!(plan.form.recipe, Recipe::Online);
    assert_eq!(plan.args, vec!["s", "t", "o"]);
}

#[test]
fn usage_lists_every_form() {
    let text = usage();
    for form in FORMS {
        assert!(text.contains(&form.synopsis()), "{}", form.synopsis());
    }
    assert!(text.contains("-config="));
    assert!(text.contains("-D<key>=<value>"));
}
