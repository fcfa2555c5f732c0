//! Abstract syntax tree for build recipes.
//!
//! A recipe is an ordered list of stages; each stage owns its base image
//! reference and the instructions that follow it. Accessors mirror the
//! questions the audit checklist asks (final stage, effective user,
//! declared health probe).

use serde::{Deserialize, Serialize};
use shipshape_common::types::ImageRef;

/// Root node of a parsed recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    /// Build arguments declared before the first stage.
    pub pre_args: Vec<ArgDecl>,
    /// Build stages in declaration order.
    pub stages: Vec<Stage>,
}

impl Recipe {
    /// Number of stages in the recipe.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// The stage that produces the runnable artifact.
    #[must_use]
    pub fn final_stage(&self) -> Option<&Stage> {
        self.stages.last()
    }

    /// Looks up a stage by alias or by zero-based index string.
    #[must_use]
    pub fn resolve_stage(&self, reference: &str) -> Option<&Stage> {
        if let Ok(index) = reference.parse::<usize>() {
            return self.stages.get(index);
        }
        self.stages
            .iter()
            .find(|s| s.alias.as_deref() == Some(reference))
    }
}

/// A single build stage, opened by a `FROM` instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Base image reference.
    pub base: ImageRef,
    /// Optional `--platform` constraint on the base.
    pub platform: Option<String>,
    /// Optional stage alias (`FROM x AS alias`).
    pub alias: Option<String>,
    /// Instructions in declaration order.
    pub instructions: Vec<Instruction>,
    /// 1-based source line of the opening `FROM`.
    pub line: usize,
}

impl Stage {
    /// The user the stage's processes run as, if one is configured.
    ///
    /// The last `USER` instruction wins.
    #[must_use]
    pub fn configured_user(&self) -> Option<&str> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::User(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The declared health probe, if any.
    ///
    /// The last `HEALTHCHECK` instruction wins; `HEALTHCHECK NONE` yields
    /// `Some(HealthcheckDecl::None)`, absence yields `None`.
    #[must_use]
    pub fn healthcheck(&self) -> Option<&HealthcheckDecl> {
        self.instructions.iter().rev().find_map(|i| match i {
            Instruction::Healthcheck(decl) => Some(decl),
            _ => None,
        })
    }

    /// All ports exposed by the stage.
    #[must_use]
    pub fn exposed_ports(&self) -> Vec<u16> {
        self.instructions
            .iter()
            .flat_map(|i| match i {
                Instruction::Expose(ports) => ports.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Whether the stage declares a runnable entry (`CMD` or `ENTRYPOINT`).
    #[must_use]
    pub fn has_entry(&self) -> bool {
        self.instructions
            .iter()
            .any(|i| matches!(i, Instruction::Cmd(_) | Instruction::Entrypoint(_)))
    }

    /// Shell command lines executed by `RUN` instructions.
    pub fn run_commands(&self) -> impl Iterator<Item = &CommandLine> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Run(cmd) => Some(cmd),
            _ => None,
        })
    }
}

/// A build instruction inside a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// `RUN` — execute a command in a new layer.
    Run(CommandLine),
    /// `COPY` — copy files, optionally from an earlier stage.
    Copy(CopyDecl),
    /// `ADD` — copy files with archive/URL semantics.
    Add(CopyDecl),
    /// `WORKDIR` — set the working directory.
    Workdir(String),
    /// `ENV` — set environment variables.
    Env(Vec<(String, String)>),
    /// `ARG` — declare a build argument.
    Arg(ArgDecl),
    /// `LABEL` — attach metadata key/value pairs.
    Label(Vec<(String, String)>),
    /// `EXPOSE` — document listening ports.
    Expose(Vec<u16>),
    /// `USER` — set the run-as account.
    User(String),
    /// `VOLUME` — declare mount points.
    Volume(Vec<String>),
    /// `HEALTHCHECK` — declare or disable the health probe.
    Healthcheck(HealthcheckDecl),
    /// `ENTRYPOINT` — set the container entry point.
    Entrypoint(CommandLine),
    /// `CMD` — set the default command.
    Cmd(CommandLine),
    /// `SHELL` — override the shell used for shell-form commands.
    Shell(Vec<String>),
    /// `STOPSIGNAL` — set the stop signal.
    Stopsignal(String),
    /// Any instruction the audit does not interpret (`ONBUILD`, …).
    Other {
        /// Uppercased instruction keyword.
        keyword: String,
        /// Raw argument text.
        args: String,
    },
}

/// A command in either exec (JSON array) or shell form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandLine {
    /// Exec form: `["binary", "arg", …]`.
    Exec(Vec<String>),
    /// Shell form: raw text handed to the stage shell.
    Shell(String),
}

impl CommandLine {
    /// Flattens the command to a single searchable string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Exec(argv) => argv.join(" "),
            Self::Shell(text) => text.clone(),
        }
    }
}

/// `COPY`/`ADD` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyDecl {
    /// Source stage for `--from=<stage>`.
    pub from: Option<String>,
    /// Ownership for `--chown=<user[:group]>`.
    pub chown: Option<String>,
    /// Permissions for `--chmod=<mode>`.
    pub chmod: Option<String>,
    /// Source paths.
    pub sources: Vec<String>,
    /// Destination path.
    pub dest: String,
}

/// An `ARG` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDecl {
    /// Argument name.
    pub name: String,
    /// Optional default value.
    pub default: Option<String>,
}

/// A `HEALTHCHECK` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthcheckDecl {
    /// `HEALTHCHECK NONE` — explicitly disables inherited probes.
    None,
    /// `HEALTHCHECK [flags] CMD <command>`.
    Check(HealthcheckSpec),
}

/// Parameters of an active health probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckSpec {
    /// Probe command.
    pub command: Option<CommandLine>,
    /// `--interval` duration string.
    pub interval: Option<String>,
    /// `--timeout` duration string.
    pub timeout: Option<String>,
    /// `--start-period` duration string.
    pub start_period: Option<String>,
    /// `--retries` count.
    pub retries: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with(instructions: Vec<Instruction>) -> Stage {
        Stage {
            base: ImageRef::new("python:3.12-slim"),
            platform: None,
            alias: None,
            instructions,
            line: 1,
        }
    }

    #[test]
    fn configured_user_takes_last() {
        let stage = stage_with(vec![
            Instruction::User("root".into()),
            Instruction::User("appuser".into()),
        ]);
        assert_eq!(stage.configured_user(), Some("appuser"));
    }

    #[test]
    fn configured_user_absent() {
        let stage = stage_with(vec![Instruction::Workdir("/app".into())]);
        assert_eq!(stage.configured_user(), None);
    }

    #[test]
    fn healthcheck_none_is_distinct_from_absent() {
        let stage = stage_with(vec![Instruction::Healthcheck(HealthcheckDecl::None)]);
        assert_eq!(stage.healthcheck(), Some(&HealthcheckDecl::None));
        assert!(stage_with(Vec::new()).healthcheck().is_none());
    }

    #[test]
    fn resolve_stage_by_alias_and_index() {
        let recipe = Recipe {
            pre_args: Vec::new(),
            stages: vec![
                Stage {
                    alias: Some("builder".into()),
                    ..stage_with(Vec::new())
                },
                stage_with(Vec::new()),
            ],
        };
        assert!(recipe.resolve_stage("builder").is_some());
        assert!(recipe.resolve_stage("0").is_some());
        assert!(recipe.resolve_stage("2").is_none());
        assert!(recipe.resolve_stage("ghost").is_none());
    }

    #[test]
    fn recipe_serializes_for_inspection() {
        let recipe = Recipe {
            pre_args: Vec::new(),
            stages: vec![stage_with(vec![Instruction::User("appuser".into())])],
        };
        let json = serde_json::to_string(&recipe).expect("should serialize");
        assert!(json.contains("\"user\":\"appuser\""), "got: {json}");
        assert!(json.contains("python:3.12-slim"), "got: {json}");
    }

    #[test]
    fn exposed_ports_collects_all() {
        let stage = stage_with(vec![
            Instruction::Expose(vec![5000]),
            Instruction::Expose(vec![8080, 8443]),
        ]);
        assert_eq!(stage.exposed_ports(), vec![5000, 8080, 8443]);
    }
}
