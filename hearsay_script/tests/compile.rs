use std::time::{Duration, Instant};

use hearsay_data::{
    BindingHint, Bindings, Call, ClearKind, Expression, MAIN, Node, NumberExpression,
    StringExpression, Value, ValueType,
};
use hearsay_script::{CompileError, CompileOptions, compile, compile_with};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options() -> CompileOptions {
    CompileOptions::default()
}

#[test]
fn empty_source_is_an_empty_graph() {
    assert!(compile("", &options()).unwrap().is_empty());
    assert!(compile("  \n\n\t\n", &options()).unwrap().is_empty());
}

#[test]
fn top_level_lines_form_the_main_block() {
    init_logging();
    let graph = compile("alice: Hi\n\nbob: Hello\nwait\nclear dialog\nreturn\n", &options()).unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(
        graph.main().unwrap(),
        &[
            Node::say(Some("alice"), "Hi"),
            Node::say(Some("bob"), "Hello"),
            Node::Wait,
            Node::Clear(ClearKind::Dialog),
            Node::Return,
        ][..]
    );
}

#[test]
fn labels_become_blocks() {
    let source = "label [start]\n  alice: One\n  jump [end]\nlabel [end]\n  alice: Two\n";
    let graph = compile(source, &options()).unwrap();
    assert!(graph.main().is_none());
    assert_eq!(
        graph.block("start").unwrap(),
        &[Node::say(Some("alice"), "One"), Node::jump("end")][..]
    );
    assert_eq!(graph.block("end").unwrap(), &[Node::say(Some("alice"), "Two")][..]);
}

#[test]
fn nested_labels_are_flattened() {
    let source = "label [outer]\n  : a\n  label [inner]\n    : b\n  : c\n";
    let graph = compile(source, &options()).unwrap();
    assert_eq!(graph.block("outer").unwrap(), &[Node::say(None, "a"), Node::say(None, "c")][..]);
    assert_eq!(graph.block("inner").unwrap(), &[Node::say(None, "b")][..]);
}

#[test]
fn example_script_compiles() {
    init_logging();
    let source = "\
label [start]
  alice: Hello, {name}!
  choice
    > Ask about the weather
      alice: It's sunny.
      jump [start]
    > Leave
      return
";
    let graph = compile(source, &options()).unwrap();
    assert_eq!(graph.len(), 3);

    let start = graph.block("start").unwrap();
    assert_eq!(start.len(), 3);
    assert_eq!(
        start[0],
        Node::Say {
            speaker: Some("alice".into()),
            dialog: StringExpression::concat(
                StringExpression::concat(
                    StringExpression::literal("Hello, "),
                    StringExpression::Interpolate("name".into())
                ),
                StringExpression::literal("!"),
            ),
        }
    );
    let Node::Choice { id: weather, .. } = &start[1] else {
        panic!("expected a choice, got {:?}", start[1]);
    };
    assert!(weather.starts_with('_'));
    assert_eq!(
        graph.block(weather).unwrap(),
        &[Node::say(Some("alice"), "It's sunny."), Node::jump("start")][..]
    );
    let Node::Choice { id: leave, text } = &start[2] else {
        panic!("expected a choice, got {:?}", start[2]);
    };
    assert_eq!(text, &StringExpression::literal("Leave"));
    assert_eq!(graph.block(leave).unwrap(), &[Node::Return][..]);
}

#[test]
fn generated_ids_are_deterministic() {
    let source = "choice\n  > Go left\n    : left\nchoose\n";
    let first = compile(source, &options()).unwrap();
    let second = compile(source, &options()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.main().unwrap()[1], Node::Choose);
}

#[test]
fn named_choice() {
    let source = "choice [door]\n  > Open the door\n    : creak\n";
    let graph = compile(source, &options()).unwrap();
    assert_eq!(graph.main().unwrap(), &[Node::choice("door", "Open the door")][..]);
    assert_eq!(graph.block("door").unwrap(), &[Node::say(None, "creak")][..]);
}

#[test]
fn multi_line_prompt() {
    let source = "choice\n  > Ask about\n  > the weather\n    : ok\n";
    let graph = compile(source, &options()).unwrap();
    let Node::Choice { text, .. } = &graph.main().unwrap()[0] else {
        panic!("expected a choice");
    };
    assert_eq!(text, &StringExpression::literal("Ask about the weather"));
}

#[test]
fn duplicate_label_is_rejected() {
    let source = "label [a]\n  : one\nlabel [a]\n  : two\n";
    match compile(source, &options()) {
        Err(CompileError::Semantic { at, reason }) => {
            assert_eq!((at.line, at.column), (3, 7));
            assert!(reason.contains("\"a\""), "{reason}");
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn repeated_anonymous_prompt_is_rejected() {
    let source = "choice\n  > Again\n    : one\nchoice\n  > Again\n    : two\n";
    match compile(source, &options()) {
        Err(CompileError::Semantic { at, reason }) => {
            assert_eq!(at.line, 5);
            assert!(reason.contains("explicit name"), "{reason}");
        },
        other => panic!("unexpected {other:?}"),
    }

    let named = "choice\n  > Again\n    : one\nchoice [again]\n  > Again\n    : two\n";
    assert!(compile(named, &options()).is_ok());
}

#[test]
fn unresolved_jump_is_reported_after_parsing() {
    let forward = "jump later\nlabel [later]\n  : here\n";
    assert!(compile(forward, &options()).is_ok());

    match compile("jump nowhere\n", &options()) {
        Err(CompileError::UnresolvedJump { at, id }) => {
            assert_eq!(id, "nowhere");
            assert_eq!(at.column, 6);
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn variable_category_conflict() {
    let source = ": {count + 1}\n: {count and true}\n";
    match compile(source, &options()) {
        Err(CompileError::VariableType { at, name, expected, found }) => {
            assert_eq!(name, "count");
            assert_eq!(at.line, 2);
            assert_eq!((expected, found), (ValueType::Number, ValueType::Boolean));
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn syntax_errors_carry_a_location() {
    let err = compile("wait\n    wait\n", &options()).unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }), "{err:?}");
    assert_eq!(err.location().line, 2);

    let err = compile("pause 3 fortnights\n", &options()).unwrap_err();
    assert_eq!(err.location().line, 1);
}

#[test]
fn carriage_returns_end_lines_in_error_locations() {
    let err = compile("wait\r    wait\r", &options()).unwrap_err();
    assert_eq!((err.location().line, err.location().column), (2, 5));
    let err = compile("wait\r\n    wait\r\n", &options()).unwrap_err();
    assert_eq!((err.location().line, err.location().column), (2, 5));
}

#[test]
fn error_offsets_count_characters() {
    let err = compile(": café\nwait\n    wait\n", &options()).unwrap_err();
    let at = err.location();
    assert_eq!((at.line, at.column), (3, 5));
    assert_eq!(at.offset, 16);
    assert_eq!(at.byte_offset, 17);
}

#[test]
fn deeply_parenthesised_logic_compiles_quickly() {
    let depth = 30;
    let source = format!(": {{{}true{}}}\n", "(".repeat(depth), ")".repeat(depth));
    let started = Instant::now();
    let graph = compile(&source, &options()).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(graph.block(MAIN).unwrap(), &[Node::say(None, "true")][..]);

    let source = format!(": {{{}1 + 1{} is 2 and true}}\n", "(".repeat(depth), ")".repeat(depth));
    let started = Instant::now();
    let graph = compile(&source, &options()).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(graph.block(MAIN).unwrap(), &[Node::say(None, "true")][..]);
}

#[test]
fn tabs_expand_to_the_configured_stop() {
    let source = "label [a]\n\t: tabbed\n       : spaced\n";
    let wide = compile(source, &CompileOptions { tab_size: 8 }).unwrap();
    assert_eq!(wide.block("a").unwrap().len(), 2);
    // At tab size 4 the spaced line sits deeper, so it continues the first line's text.
    let narrow = compile(source, &CompileOptions { tab_size: 4 }).unwrap();
    assert_eq!(narrow.block("a").unwrap(), &[Node::say(None, "tabbed : spaced")][..]);
}

#[test]
fn pause_units() {
    let graph = compile("pause 500 ms\npause 2 s\npause 1 minutes\n", &options()).unwrap();
    assert_eq!(
        graph.block(MAIN).unwrap(),
        &[
            Node::Pause(NumberExpression::literal(0.5)),
            Node::Pause(NumberExpression::literal(2.0)),
            Node::Pause(NumberExpression::literal(60.0)),
        ][..]
    );
}

#[test]
fn binding_calls_are_checked_against_the_registry() {
    let mut bindings = Bindings::new();
    bindings.bind(
        "greeting",
        BindingHint::new([ValueType::String], ValueType::String),
        |args| Value::from(format!("Hello, {}!", args[0].as_str().unwrap_or_default())),
    );
    let graph = compile_with(": {greeting(\"Bob\")}\n", &options(), &bindings).unwrap();
    assert_eq!(
        graph.main().unwrap()[0],
        Node::Say {
            speaker: None,
            dialog: StringExpression::Call(Call::new(
                "greeting",
                vec![Expression::String(StringExpression::literal("Bob"))]
            )),
        }
    );

    let err = compile(": {greeting(\"Bob\")}\n", &options()).unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }), "{err:?}");
    let err = compile_with(": {greeting()}\n", &options(), &bindings).unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }), "{err:?}");
}

#[test]
fn constant_logic_is_folded() {
    let graph = compile(": {not (1 is 2) and true}\n", &options()).unwrap();
    assert_eq!(graph.main().unwrap(), &[Node::say(None, "true")][..]);
}
