//! Embed lsc as a command interpreter in your Rust application.
//!
//! Run:  cargo run -p lsc --example embed

use std::sync::{Arc, Mutex};

use lsc::{BufferSink, Command, CommandError, LscResult, ParamType, Shell, Style, Value};

fn main() -> LscResult<()> {
    let volume = Arc::new(Mutex::new(5i64));

    let level = Arc::clone(&volume);
    let set_volume = Command::builder("volume")
        .param("level", ParamType::Int)
        .description("Set the output volume (0-11)")
        .handler(move |shell, args| {
            let value = args.int("level").unwrap_or_default();
            if !(0..=11).contains(&value) {
                return Err(CommandError::failed(format!("volume out of range: {value}")));
            }
            if let Ok(mut level) = level.lock() {
                *level = value;
            }
            shell.write_line(&format!("volume set to {value}"), Style::Success);
            Ok(())
        })
        .build()?;

    let paint = Command::builder("paint")
        .param("color", ParamType::Custom("color".to_string()))
        .description("Paint with a named color")
        .handler(|shell, args| {
            let color = args.str("color").unwrap_or("?").to_string();
            shell.write_line(&format!("painting {color}"), Style::Info);
            Ok(())
        })
        .build()?;

    let sink = BufferSink::new();
    let mut shell = Shell::builder()
        .output(sink.clone())
        .with_builtins()
        .command(set_volume)
        .command(paint)
        .build()?;
    shell.converter_mut().register("color", |raw| match raw {
        "red" | "green" | "blue" => Ok(Value::Custom {
            type_name: "color".to_string(),
            raw: raw.to_string(),
        }),
        other => Err(format!("unknown color {other}")),
    });

    let lines = [
        "$loud = 11",
        "volume $loud",
        "volume 99",
        "paint red",
        "paint mauve",
        "help volume",
        "echo done",
    ];
    for line in lines {
        println!("> {line}");
        if let Err(e) = shell.execute_line(line) {
            println!("error: {e}");
        }
        for output in sink.lines() {
            println!("  {output}");
        }
        sink.clear();
    }

    println!("\nfinal volume: {:?}", volume.lock().map(|v| *v).ok());
    println!("last handler error: {:?}", shell.last_error());
    Ok(())
}
