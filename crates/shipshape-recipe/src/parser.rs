//! Recursive descent over logical lines into the recipe AST.

use shipshape_common::error::{Result, ShipshapeError};
use shipshape_common::types::ImageRef;

use crate::ast::{
    ArgDecl, CommandLine, CopyDecl, HealthcheckDecl, HealthcheckSpec, Instruction, Recipe, Stage,
};
use crate::lexer::{self, LogicalLine, exec_array, leading_flag, split_words};
use crate::validator;

/// Instruction keywords the parser accepts but does not interpret.
const PASSTHROUGH_KEYWORDS: &[&str] = &["ONBUILD", "MAINTAINER"];

fn parse_err(line: usize, message: impl Into<String>) -> ShipshapeError {
    ShipshapeError::Parse {
        line,
        message: message.into(),
    }
}

/// Parses recipe source text into a validated [`Recipe`].
///
/// # Errors
///
/// Returns an error if the input contains syntax errors or fails
/// semantic validation.
pub fn parse_recipe(input: &str) -> Result<Recipe> {
    tracing::debug!(bytes = input.len(), "parsing recipe");
    let lines = lexer::lex(input)?;
    let mut recipe = Recipe::default();
    let mut current: Option<Stage> = None;

    for line in &lines {
        if line.keyword == "FROM" {
            if let Some(stage) = current.take() {
                recipe.stages.push(stage);
            }
            current = Some(parse_from(line)?);
        } else if let Some(stage) = current.as_mut() {
            stage.instructions.push(parse_instruction(line)?);
        } else if line.keyword == "ARG" {
            recipe.pre_args.push(parse_arg(line)?);
        } else {
            return Err(parse_err(
                line.number,
                format!("{} before the first FROM", line.keyword),
            ));
        }
    }
    if let Some(stage) = current.take() {
        recipe.stages.push(stage);
    }

    validator::validate(&recipe)?;
    Ok(recipe)
}

fn parse_from(line: &LogicalLine) -> Result<Stage> {
    let mut rest = line.args.as_str();
    let mut platform = None;

    while let Some((name, value, after)) = leading_flag(rest) {
        match name {
            "platform" => platform = Some(value.to_owned()),
            other => {
                return Err(parse_err(line.number, format!("unknown FROM flag: --{other}")));
            }
        }
        rest = after;
    }

    let words = split_words(rest);
    match words.as_slice() {
        [image] => Ok(Stage {
            base: ImageRef::new(image.clone()),
            platform,
            alias: None,
            instructions: Vec::new(),
            line: line.number,
        }),
        [image, as_kw, alias] if as_kw.eq_ignore_ascii_case("AS") => Ok(Stage {
            base: ImageRef::new(image.clone()),
            platform,
            alias: Some(alias.clone()),
            instructions: Vec::new(),
            line: line.number,
        }),
        _ => Err(parse_err(
            line.number,
            format!("expected FROM <image> [AS <name>], got \"{}\"", line.args),
        )),
    }
}

fn parse_instruction(line: &LogicalLine) -> Result<Instruction> {
    match line.keyword.as_str() {
        "RUN" => Ok(Instruction::Run(parse_command(line, strip_run_flags(&line.args))?)),
        "CMD" => Ok(Instruction::Cmd(parse_command(line, &line.args)?)),
        "ENTRYPOINT" => Ok(Instruction::Entrypoint(parse_command(line, &line.args)?)),
        "COPY" => Ok(Instruction::Copy(parse_copy(line)?)),
        "ADD" => Ok(Instruction::Add(parse_copy(line)?)),
        "WORKDIR" => require_args(line).map(|a| Instruction::Workdir(a.to_owned())),
        "ENV" => Ok(Instruction::Env(parse_pairs(line)?)),
        "ARG" => Ok(Instruction::Arg(parse_arg(line)?)),
        "LABEL" => Ok(Instruction::Label(parse_pairs(line)?)),
        "EXPOSE" => Ok(Instruction::Expose(parse_expose(line)?)),
        "USER" => require_args(line).map(|a| Instruction::User(a.to_owned())),
        "VOLUME" => Ok(Instruction::Volume(parse_volume(line)?)),
        "HEALTHCHECK" => Ok(Instruction::Healthcheck(parse_healthcheck(line)?)),
        "SHELL" => parse_shell(line).map(Instruction::Shell),
        "STOPSIGNAL" => require_args(line).map(|a| Instruction::Stopsignal(a.to_owned())),
        kw if PASSTHROUGH_KEYWORDS.contains(&kw) => Ok(Instruction::Other {
            keyword: line.keyword.clone(),
            args: line.args.clone(),
        }),
        other => Err(parse_err(line.number, format!("unknown instruction: {other}"))),
    }
}

fn require_args(line: &LogicalLine) -> Result<&str> {
    if line.args.is_empty() {
        return Err(parse_err(
            line.number,
            format!("{} requires an argument", line.keyword),
        ));
    }
    Ok(line.args.as_str())
}

/// Strips `RUN` mount/network/security flags; the audit only cares about
/// the command text.
fn strip_run_flags(args: &str) -> &str {
    let mut rest = args;
    while let Some((name, _, after)) = leading_flag(rest) {
        if matches!(name, "mount" | "network" | "security") {
            rest = after;
        } else {
            break;
        }
    }
    rest
}

fn parse_command(line: &LogicalLine, args: &str) -> Result<CommandLine> {
    let _ = require_args(line)?;
    match exec_array(line.number, args)? {
        Some(argv) => Ok(CommandLine::Exec(argv)),
        None => Ok(CommandLine::Shell(args.trim().to_owned())),
    }
}

fn parse_copy(line: &LogicalLine) -> Result<CopyDecl> {
    let mut rest = line.args.as_str();
    let mut decl = CopyDecl {
        from: None,
        chown: None,
        chmod: None,
        sources: Vec::new(),
        dest: String::new(),
    };

    loop {
        if let Some((name, value, after)) = leading_flag(rest) {
            match name {
                "from" => decl.from = Some(value.to_owned()),
                "chown" => decl.chown = Some(value.to_owned()),
                "chmod" => decl.chmod = Some(value.to_owned()),
                // Other flags (--link, --parents, …) are irrelevant here.
                _ => {}
            }
            rest = after;
        } else if let Some(after) = rest.strip_prefix("--link") {
            rest = after.trim_start();
        } else {
            break;
        }
    }

    let mut paths = match exec_array(line.number, rest)? {
        Some(items) => items,
        None => split_words(rest),
    };
    if paths.len() < 2 {
        return Err(parse_err(
            line.number,
            format!("{} requires at least a source and a destination", line.keyword),
        ));
    }
    decl.dest = paths.pop().unwrap_or_default();
    decl.sources = paths;
    Ok(decl)
}

/// Parses `key=value` pairs, falling back to the legacy `key value` form.
fn parse_pairs(line: &LogicalLine) -> Result<Vec<(String, String)>> {
    let words = split_words(require_args(line)?);
    let first_has_eq = words.first().is_some_and(|w| w.contains('='));

    if first_has_eq {
        words
            .into_iter()
            .map(|word| {
                word.split_once('=')
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .ok_or_else(|| {
                        parse_err(line.number, format!("expected key=value, got \"{word}\""))
                    })
            })
            .collect()
    } else {
        // Legacy form: single key, remainder is the value.
        let mut words = words.into_iter();
        let key = words
            .next()
            .ok_or_else(|| parse_err(line.number, "expected a key"))?;
        let value = words.collect::<Vec<_>>().join(" ");
        Ok(vec![(key, value)])
    }
}

fn parse_arg(line: &LogicalLine) -> Result<ArgDecl> {
    let arg = require_args(line)?;
    match arg.split_once('=') {
        Some((name, default)) => Ok(ArgDecl {
            name: name.trim().to_owned(),
            default: Some(default.trim().to_owned()),
        }),
        None => Ok(ArgDecl {
            name: arg.to_owned(),
            default: None,
        }),
    }
}

fn parse_expose(line: &LogicalLine) -> Result<Vec<u16>> {
    split_words(require_args(line)?)
        .iter()
        .map(|entry| {
            let port = entry.split('/').next().unwrap_or(entry);
            port.parse::<u16>()
                .map_err(|_| parse_err(line.number, format!("invalid EXPOSE port: {entry}")))
        })
        .collect()
}

fn parse_volume(line: &LogicalLine) -> Result<Vec<String>> {
    let args = require_args(line)?;
    match exec_array(line.number, args)? {
        Some(items) => Ok(items),
        None => Ok(split_words(args)),
    }
}

fn parse_healthcheck(line: &LogicalLine) -> Result<HealthcheckDecl> {
    let args = require_args(line)?;
    if args.eq_ignore_ascii_case("NONE") {
        return Ok(HealthcheckDecl::None);
    }

    let mut spec = HealthcheckSpec::default();
    let mut rest = args;
    while let Some((name, value, after)) = leading_flag(rest) {
        match name {
            "interval" => spec.interval = Some(value.to_owned()),
            "timeout" => spec.timeout = Some(value.to_owned()),
            "start-period" => spec.start_period = Some(value.to_owned()),
            "retries" => {
                spec.retries = Some(value.parse().map_err(|_| {
                    parse_err(line.number, format!("invalid --retries value: {value}"))
                })?);
            }
            other => {
                return Err(parse_err(
                    line.number,
                    format!("unknown HEALTHCHECK flag: --{other}"),
                ));
            }
        }
        rest = after;
    }

    let mut parts = rest.splitn(2, |c: char| c.is_ascii_whitespace());
    let word = parts.next().unwrap_or("");
    if !word.eq_ignore_ascii_case("CMD") {
        return Err(parse_err(
            line.number,
            format!("expected HEALTHCHECK [flags] CMD <command>, got \"{args}\""),
        ));
    }
    let command_text = parts.next().unwrap_or("").trim_start();
    if command_text.is_empty() {
        return Err(parse_err(line.number, "HEALTHCHECK CMD requires a command"));
    }
    spec.command = Some(match exec_array(line.number, command_text)? {
        Some(argv) => CommandLine::Exec(argv),
        None => CommandLine::Shell(command_text.to_owned()),
    });
    Ok(HealthcheckDecl::Check(spec))
}

fn parse_shell(line: &LogicalLine) -> Result<Vec<String>> {
    exec_array(line.number, require_args(line)?)?.ok_or_else(|| {
        parse_err(line.number, "SHELL requires an exec-form array")
    })
}
