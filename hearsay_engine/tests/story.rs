use hearsay_data::{BindingHint, Bindings, Node, Script, ValidationError, Value, ValueType};
use hearsay_engine::{Line, Presentation, Story, StoryConfig, StoryError, Yield};
use hearsay_script::{CompileOptions, compile, compile_with};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load(source: &str) -> Story {
    init_logs();
    let script = compile(source, &CompileOptions::default()).unwrap();
    Story::new(script, Bindings::new()).unwrap()
}

fn texts(view: &Presentation) -> Vec<&str> {
    view.lines().iter().map(|line| line.text.as_str()).collect()
}

#[test]
fn wait_and_pause_hand_control_back() {
    let mut story = load("alice: Hello.\nwait\nalice: Still here?\npause 2 s\n: Bye.\n");
    let mut view = Presentation::new();

    assert_eq!(story.start(&mut view).unwrap(), Yield::AwaitResume);
    assert_eq!(texts(&view), ["Hello."]);
    assert_eq!(story.advance(&mut view).unwrap(), Yield::AwaitResume);

    assert_eq!(story.resume(&mut view).unwrap(), Yield::AwaitDuration(2.0));
    assert_eq!(texts(&view), ["Still here?"]);
    assert_eq!(story.update(0.5, &mut view).unwrap(), Yield::AwaitDuration(1.5));
    assert_eq!(story.update(2.0, &mut view).unwrap(), Yield::Finished);
    assert_eq!(
        view.lines(),
        &[Line {
            speaker: None,
            text: "Bye.".into()
        }]
    );
    assert!(story.is_finished());
}

#[test]
fn resume_skips_a_pause() {
    let mut story = load("pause 10 minutes\n: Done.\n");
    let mut view = Presentation::new();
    assert_eq!(story.start(&mut view).unwrap(), Yield::AwaitDuration(600.0));
    assert_eq!(story.resume(&mut view).unwrap(), Yield::Finished);
    assert_eq!(texts(&view), ["Done."]);
}

#[test]
fn update_ignores_other_suspensions() {
    let mut story = load("wait\n");
    let mut view = Presentation::new();
    story.start(&mut view).unwrap();
    assert_eq!(story.update(5.0, &mut view).unwrap(), Yield::AwaitResume);
}

const ORDER: &str = "\
: Tea or coffee?
choice
  > Tea, please.
    : Tea it is.
  > Coffee.
    : Coffee then.
    return
    : unreachable
choose
: Enjoy.
";

#[test]
fn picked_option_returns_to_the_caller() {
    let mut story = load(ORDER);
    let mut view = Presentation::new();
    assert_eq!(story.start(&mut view).unwrap(), Yield::AwaitChoice);
    let offered: Vec<&str> = view.choices().iter().map(|offer| offer.text.as_str()).collect();
    assert_eq!(offered, ["Tea, please.", "Coffee."]);

    let tea = view.choices()[0].id.clone();
    assert_eq!(story.choose(&tea, &mut view).unwrap(), Yield::Finished);
    assert!(view.choices().is_empty());
    assert_eq!(texts(&view), ["Enjoy."]);
}

#[test]
fn return_inside_an_option_leaves_only_that_option() {
    let mut story = load(ORDER);
    let mut view = Presentation::new();
    story.start(&mut view).unwrap();
    let coffee = view.choices()[1].id.clone();

    story.choose(&coffee, &mut view).unwrap();
    assert_eq!(texts(&view), ["Enjoy."]);
    assert!(story.is_finished());
}

#[test]
fn choice_errors() {
    let mut story = load(ORDER);
    let mut view = Presentation::new();
    assert_eq!(story.choose("anything", &mut view), Err(StoryError::NotAwaitingChoice));

    story.start(&mut view).unwrap();
    assert_eq!(
        story.choose("nope", &mut view),
        Err(StoryError::UnknownChoice("nope".into()))
    );
    assert_eq!(story.resume(&mut view), Err(StoryError::AwaitingChoice));
    assert_eq!(story.status(), Yield::AwaitChoice);
}

#[test]
fn named_choice_offers_its_name() {
    let mut story = load("choice [tea]\n  > Tea\n    : Tea.\nchoose\n");
    let mut view = Presentation::new();
    story.start(&mut view).unwrap();
    assert!(view.has_choice("tea"));
    assert_eq!(story.choose("tea", &mut view).unwrap(), Yield::Finished);
    assert_eq!(texts(&view), ["Tea."]);
}

#[test]
fn choose_without_choices_fails() {
    let mut story = load(": Nothing to pick.\nchoose\n");
    assert_eq!(story.start(&mut Presentation::new()), Err(StoryError::NoChoices));
}

#[test]
fn jump_and_return() {
    let mut story = load("jump end\n: skipped\nlabel [end]\n  : arrived\n  return\n  : never\n");
    let mut view = Presentation::new();
    assert_eq!(story.start(&mut view).unwrap(), Yield::Finished);
    assert_eq!(texts(&view), ["arrived"]);
}

#[test]
fn append_and_clear() {
    let mut story = load("alice: Hello\nalice+ there.\nbob+ Hi.\nwait\nclear dialog\nwait\n");
    let mut view = Presentation::new();
    story.start(&mut view).unwrap();
    assert_eq!(texts(&view), ["Hello there.", "Hi."]);
    story.resume(&mut view).unwrap();
    assert!(view.lines().is_empty());
}

#[test]
fn text_follows_the_scope() {
    let mut story = load("label [greet]\n  : Hi {name}.\n  wait\n  jump greet\njump greet\n");
    let mut view = Presentation::new();
    story.set_variable("name", "Bob").unwrap();
    story.start(&mut view).unwrap();
    assert_eq!(texts(&view), ["Hi Bob."]);
    assert_eq!(story.current_block(), Some("greet"));

    story.set_variable("name", "Carol").unwrap();
    story.resume(&mut view).unwrap();
    assert_eq!(texts(&view), ["Hi Carol."]);

    assert!(matches!(story.set_variable("name", 3.0), Err(StoryError::Scope(_))));
}

#[test]
fn missing_variable_stops_the_story() {
    let mut story = load(": Hi {name}.\n");
    let err = story.start(&mut Presentation::new()).unwrap_err();
    assert!(matches!(err, StoryError::Eval(_)), "{err:?}");
    assert!(story.is_finished());
}

#[test]
fn bindings_are_called_at_runtime() {
    init_logs();
    let mut bindings = Bindings::new();
    bindings.bind(
        "double",
        BindingHint::new([ValueType::Number], ValueType::Number),
        |args| Value::from(args[0].as_number().unwrap_or_default() * 2.0),
    );
    let script = compile_with(": You have {double(coins)} coins.\n", &CompileOptions::default(), &bindings).unwrap();
    let mut story = Story::new(script, bindings).unwrap();
    story.scope_mut().set("coins", 3.0).unwrap();

    let mut view = Presentation::new();
    story.start(&mut view).unwrap();
    assert_eq!(texts(&view), ["You have 6 coins."]);
}

#[test]
fn endless_jumps_are_stopped() {
    init_logs();
    let script = compile("label [a]\n  jump a\n", &CompileOptions::default()).unwrap();
    let mut story = Story::with_config(script, Bindings::new(), StoryConfig { max_steps: 100 }).unwrap();
    let mut view = Presentation::new();

    assert_eq!(story.start(&mut view).unwrap(), Yield::Finished);
    assert_eq!(story.start_at("a", &mut view), Err(StoryError::Runaway(100)));
    assert_eq!(
        story.start_at("b", &mut view),
        Err(StoryError::UnknownBlock("b".into()))
    );
}

#[test]
fn hand_built_scripts_are_validated() {
    let script = Script::from_main(vec![Node::say(None, "hi"), Node::jump("nowhere")]);
    let Err(StoryError::Invalid(problems)) = Story::new(script, Bindings::new()) else {
        panic!("expected the script to be rejected");
    };
    assert_eq!(problems.len(), 1);
    assert!(matches!(&problems[0], ValidationError::MissingBlock { id, .. } if id == "nowhere"));
}

#[test]
fn presentation_can_be_snapshotted() {
    let mut story = load("alice: Hello.\nchoice [bye]\n  > Goodbye.\n    : Bye!\nchoose\n");
    let mut view = Presentation::new();
    story.start(&mut view).unwrap();

    let json = serde_json::to_string(&view).unwrap();
    let restored: Presentation = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, view);
    assert!(restored.has_choice("bye"));
}
