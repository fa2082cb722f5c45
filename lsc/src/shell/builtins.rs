//! Built-in console commands

use super::Shell;
use crate::command::{Args, Command};
use crate::convert::ParamType;
use crate::environment::is_identifier;
use crate::error::{CommandError, ControlSignal, LscError, LscResult};
use crate::lexer::{self, LexemeKind};
use crate::output::Style;

pub(super) fn commands() -> LscResult<Vec<Command>> {
    Ok(vec![
        Command::builder("help")
            .optional("command", ParamType::String)
            .description("List commands, or show usage for one command")
            .handler(cmd_help)
            .build()?,
        Command::builder("echo")
            .param("text", ParamType::String)
            .description("Print text")
            .handler(cmd_echo)
            .build()?,
        Command::builder("run")
            .param("path", ParamType::Path)
            .description("Execute a script file")
            .handler(cmd_run)
            .build()?,
        Command::builder("history")
            .description("Show entered lines")
            .handler(cmd_history)
            .build()?,
        Command::builder("vars")
            .description("List variables")
            .handler(cmd_vars)
            .build()?,
        Command::builder("unset")
            .param("name", ParamType::String)
            .description("Remove a variable")
            .handler(cmd_unset)
            .build()?,
        Command::builder("lex")
            .param("text", ParamType::String)
            .description("Show the lexemes of a piece of text")
            .handler(cmd_lex)
            .build()?,
        Command::builder("exit")
            .optional("code", ParamType::Int)
            .description("Leave the console")
            .handler(cmd_exit)
            .build()?,
    ])
}

fn cmd_help(shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    if let Some(name) = args.str("command") {
        let candidates = shell.registry().candidates(name);
        if candidates.is_empty() {
            return Err(LscError::CommandNotFound(name.to_string()).into());
        }
        for command in candidates {
            shell.write_line(&command.usage(), Style::Usage);
            if !command.description().is_empty() {
                shell.write_line(&format!("    {}", command.description()), Style::Plain);
            }
        }
        return Ok(());
    }

    let mut lines = Vec::new();
    for name in shell.registry().names() {
        let description = shell
            .registry()
            .candidates(name)
            .iter()
            .map(|c| c.description().to_string())
            .find(|d| !d.is_empty())
            .unwrap_or_default();
        lines.push((name.to_string(), description));
    }
    let width = lines.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    shell.write_line("Commands:", Style::Info);
    for (name, description) in lines {
        shell.write(&format!("  {name:<width$}"), Style::Command);
        shell.write_line(&format!("  {description}"), Style::Plain);
    }
    Ok(())
}

fn cmd_echo(shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    let text = args.str("text").unwrap_or_default().to_string();
    shell.write_line(&text, Style::Plain);
    Ok(())
}

fn cmd_run(shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    let path = args
        .path("path")
        .ok_or_else(|| CommandError::failed("run: missing path"))?
        .to_path_buf();
    shell.execute_lsf(path)?;
    Ok(())
}

fn cmd_history(shell: &mut Shell, _args: &Args) -> Result<(), CommandError> {
    let entries: Vec<String> = shell
        .history()
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>5}  {line}", i + 1))
        .collect();
    for entry in entries {
        shell.write_line(&entry, Style::Plain);
    }
    Ok(())
}

fn cmd_vars(shell: &mut Shell, _args: &Args) -> Result<(), CommandError> {
    let entries: Vec<String> = shell
        .env()
        .sorted()
        .into_iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect();
    if entries.is_empty() {
        shell.write_line("no variables set", Style::Info);
    }
    for entry in entries {
        shell.write_line(&entry, Style::Plain);
    }
    Ok(())
}

fn cmd_unset(shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    let name = args
        .str("name")
        .unwrap_or_default()
        .trim_start_matches('$')
        .to_string();
    if !is_identifier(&name) {
        return Err(LscError::InvalidVariable(name).into());
    }
    if shell.env_mut().remove(&name).is_none() {
        return Err(LscError::VariableNotFound(name).into());
    }
    shell.write_line(&format!("{name} cleared"), Style::Info);
    Ok(())
}

fn cmd_lex(shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    let text = args.str("text").unwrap_or_default().to_string();
    let mut lexemes = lexer::lex(&text);
    let mut lines = Vec::new();
    let mut failure = None;

    for lexeme in lexemes.by_ref() {
        match lexeme {
            Ok(lexeme) if lexeme.kind == LexemeKind::EndOfFile => {}
            Ok(lexeme) => lines.push(format!(
                "{:>6}  {:<13} {:?}",
                lexeme.start.to_string(),
                lexeme.kind.to_string(),
                lexeme.content
            )),
            Err(err) => failure = Some(err),
        }
    }

    for line in lines {
        shell.write_line(&line, Style::Plain);
    }
    let warnings: Vec<String> = lexemes
        .diagnostics()
        .iter()
        .filter(|d| d.severity == lexer::Severity::Warning)
        .map(ToString::to_string)
        .collect();
    for warning in warnings {
        shell.write_line(&format!("warning: {warning}"), Style::Warning);
    }

    match failure {
        Some(err) => Err(CommandError::failed(err.message())),
        None => Ok(()),
    }
}

fn cmd_exit(_shell: &mut Shell, args: &Args) -> Result<(), CommandError> {
    let code = args.int("code").unwrap_or(0);
    let code = i32::try_from(code)
        .map_err(|_| CommandError::failed(format!("exit code out of range: {code}")))?;
    Err(CommandError::Signal(ControlSignal::Exit(code)))
}
