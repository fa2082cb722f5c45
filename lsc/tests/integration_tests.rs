//! Integration tests for lsc
//!
//! Drive the public API the way an embedding host does: build a shell with
//! a buffer sink, register commands, run lines and `.lsf` scripts.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lsc::{
    lex, BufferSink, Command, CommandError, LexemeKind, LscError, ParamType, Shell, Style, Value,
};

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

fn host_shell() -> (Shell, BufferSink, Calls) {
    let sink = BufferSink::new();
    let calls = Calls::default();

    let recorded = Arc::clone(&calls);
    let greet = Command::builder("greet")
        .param("who", ParamType::String)
        .description("Say hello")
        .handler(move |shell, args| {
            recorded.lock().unwrap().push(args.values().to_vec());
            let who = args.str("who").unwrap_or_default().to_string();
            shell.write_line(&format!("hello {who}"), Style::Success);
            Ok(())
        })
        .build()
        .unwrap();

    let recorded = Arc::clone(&calls);
    let resize = Command::builder("resize")
        .param("width", ParamType::Int)
        .optional("height", ParamType::Int)
        .handler(move |_, args| {
            recorded.lock().unwrap().push(args.values().to_vec());
            Ok(())
        })
        .build()
        .unwrap();

    let fail = Command::builder("fail")
        .handler(|_, _| Err(CommandError::failed("disk on fire")))
        .build()
        .unwrap();

    let shell = Shell::builder()
        .output(sink.clone())
        .with_builtins()
        .command(greet)
        .command(resize)
        .command(fail)
        .build()
        .unwrap();
    (shell, sink, calls)
}

fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_lexer_reconstructs_source() {
    let source = "function f(a, b) {\r\n  if a >= b && !c { return \"x\\\"y\" }\n}";
    let lexemes: Vec<_> = lex(source).collect::<Result<_, _>>().unwrap();
    let rebuilt: String = lexemes.iter().map(|l| l.content.as_str()).collect();
    assert_eq!(rebuilt, format!("{}\0", source.replace("\r\n", "\n")));
    assert_eq!(lexemes.last().unwrap().kind, LexemeKind::EndOfFile);
}

#[test]
fn test_echo_gets_whole_text() {
    let (mut shell, sink, _) = host_shell();
    shell.execute_line("echo hello world").unwrap();
    assert_eq!(sink.lines(), vec!["hello world"]);
}

#[test]
fn test_variable_round_trip() {
    let (mut shell, sink, _) = host_shell();
    shell.execute_line("$x = 5").unwrap();
    sink.clear();
    shell.execute_line("$x").unwrap();
    assert_eq!(sink.lines(), vec!["x = 5"]);

    shell.execute_line("$x =").unwrap();
    assert!(matches!(
        shell.execute_line("$x"),
        Err(LscError::VariableNotFound(_))
    ));
}

#[test]
fn test_substitution_into_arguments() {
    let (mut shell, _, calls) = host_shell();
    shell.execute_line("greet $x").unwrap();
    shell.execute_line("$x = 5").unwrap();
    shell.execute_line("greet $x").unwrap();
    shell.execute_line(r"greet \$x").unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], vec![Value::Str("$x".to_string())]);
    assert_eq!(calls[1], vec![Value::Str("5".to_string())]);
    assert_eq!(calls[2], vec![Value::Str("$x".to_string())]);
}

#[test]
fn test_optional_parameter_not_supplied() {
    let (mut shell, _, calls) = host_shell();
    shell.execute_line("RESIZE 80").unwrap();
    shell.execute_line("resize 80 24 # trailing comment").unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], vec![Value::Int(80), Value::NotSupplied]);
    assert_eq!(calls[1], vec![Value::Int(80), Value::Int(24)]);
}

#[test]
fn test_user_errors_are_classified() {
    let (mut shell, sink, _) = host_shell();
    assert!(matches!(
        shell.execute_line("frobnicate"),
        Err(LscError::CommandNotFound(_))
    ));
    shell.execute_line("resize 1 2 3").unwrap();
    assert_eq!(sink.styled(Style::Usage), vec!["resize <width:int> [height:int]"]);
    assert!(matches!(
        shell.execute_line("resize wide"),
        Err(LscError::ParameterConversion { .. })
    ));
    assert!(matches!(
        shell.execute_line("greet \"unclosed"),
        Err(LscError::Parse(_))
    ));
}

#[test]
fn test_handler_failure_keeps_running() {
    let (mut shell, sink, _) = host_shell();
    shell.execute_line("fail").unwrap();
    shell.execute_line("echo after").unwrap();
    assert_eq!(shell.last_error(), Some("disk on fire"));
    assert_eq!(sink.lines(), vec!["disk on fire", "after"]);
}

#[test]
fn test_script_runs_statements() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "setup.lsf",
        "# setup script\n\n$name = world\ngreet $name\n   \nresize 10\n",
    );

    let (mut shell, sink, calls) = host_shell();
    shell.execute_lsf(&path).unwrap();
    assert!(sink.lines().contains(&"hello world".to_string()));
    assert_eq!(calls.lock().unwrap().len(), 2);
    assert_eq!(shell.history().len(), 3);
}

#[test]
fn test_script_extension_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "init.lsf", "echo from init\n");

    let (mut shell, sink, _) = host_shell();
    shell.execute_lsf(dir.path().join("init")).unwrap();
    assert_eq!(sink.lines(), vec!["from init"]);
}

#[test]
fn test_script_halts_on_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "broken.lsf",
        "echo one\n# comment\nmissing thing\necho never\n",
    );

    let (mut shell, sink, _) = host_shell();
    let err = shell.execute_lsf(&path).unwrap_err();
    match err {
        LscError::Script { file, line, message } => {
            assert!(file.ends_with("broken.lsf"));
            assert_eq!(line, 3);
            assert_eq!(message, "command not found: missing");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sink.lines(), vec!["one"]);
}

#[test]
fn test_script_continues_after_usage() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "usage.lsf", "resize\nresize 1 2\n");

    let (mut shell, sink, calls) = host_shell();
    shell.execute_lsf(&path).unwrap();
    assert_eq!(sink.styled(Style::Usage), vec!["resize <width:int> [height:int]"]);
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        &[vec![Value::Int(1), Value::Int(2)]]
    );
}

#[test]
fn test_missing_script() {
    let dir = tempfile::tempdir().unwrap();
    let (mut shell, _, _) = host_shell();
    let err = shell.execute_lsf(dir.path().join("nothing")).unwrap_err();
    assert!(matches!(err, LscError::ScriptNotFound(ref p) if p.ends_with("nothing.lsf")));
    assert!(!err.is_user_error());
}

#[test]
fn test_run_builtin_reports_nested_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "inner.lsf", "resize x\n");

    let (mut shell, _, _) = host_shell();
    shell
        .execute_line(&format!("run \"{}\"", path.display()))
        .unwrap();
    let last = shell.last_error().unwrap();
    assert!(last.contains("inner.lsf:1:"), "{last}");
    assert!(last.contains("cannot convert"), "{last}");
}

#[test]
fn test_custom_converter() {
    let sink = BufferSink::new();
    let seen = Arc::new(Mutex::new(None));
    let recorded = Arc::clone(&seen);
    let paint = Command::builder("paint")
        .param("color", ParamType::Custom("color".to_string()))
        .handler(move |_, args| {
            *recorded.lock().unwrap() = args.get(0).cloned();
            Ok(())
        })
        .build()
        .unwrap();

    let mut shell = Shell::builder().output(sink).command(paint).build().unwrap();
    shell.converter_mut().register("color", |raw| match raw {
        "red" | "green" => Ok(Value::Custom {
            type_name: "color".to_string(),
            raw: raw.to_string(),
        }),
        other => Err(format!("no such color {other}")),
    });

    shell.execute_line("paint red").unwrap();
    assert_eq!(
        seen.lock().unwrap().as_ref().and_then(Value::as_str),
        Some("red")
    );
    assert!(shell.execute_line("paint mauve").is_err());
}
