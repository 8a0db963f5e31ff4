//! Command line surface of the `gomote` binary

use crate::shared::error::{GomoteError, GomoteResult};
use crate::shared::types::{CreateOptions, GroupCommitPolicy};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

pub const CREATE_USAGE: &str = "create usage: gomote create [create-opts] <type>";

/// Create and manage remote build instances
#[derive(Parser, Debug)]
#[command(name = "gomote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create one or more instances of a builder type
    Create(CreateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Print regular status updates while waiting
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub status: bool,

    /// Number of instances to create
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Set up the instance by pushing GOROOT and building the Go toolchain
    #[arg(long)]
    pub setup: bool,

    /// Also create a new group and add the new instances to it
    #[arg(long, value_name = "NAME")]
    pub new_group: Option<String>,

    /// Only save the group if every instance was created and set up
    #[arg(long)]
    pub all_or_nothing: bool,

    /// Create through the coordinator instead of the gomote service
    #[arg(long)]
    pub legacy: bool,

    /// Builder type to create, e.g. linux-amd64
    pub builder_type: Option<String>,
}

impl CreateArgs {
    /// Rejects flag combinations the selected creation path cannot honor.
    pub fn validate(&self) -> GomoteResult<()> {
        if self.count == 0 {
            return Err(GomoteError::InvalidRequest(
                "--count must be at least 1".to_string(),
            ));
        }
        if !self.legacy {
            return Ok(());
        }
        if self.new_group.is_some() {
            return Err(GomoteError::InvalidRequest(
                "--legacy does not support --new-group".to_string(),
            ));
        }
        if self.setup {
            return Err(GomoteError::InvalidRequest(
                "--legacy does not support --setup".to_string(),
            ));
        }
        if self.count > 1 {
            return Err(GomoteError::InvalidRequest(
                "--legacy creates exactly one instance".to_string(),
            ));
        }
        if self.all_or_nothing {
            return Err(GomoteError::InvalidRequest(
                "--legacy does not support --all-or-nothing".to_string(),
            ));
        }
        Ok(())
    }

    /// `None` when no builder type was given.
    pub fn to_options(&self) -> Option<CreateOptions> {
        let builder_type = self.builder_type.as_deref()?;
        let policy = if self.all_or_nothing {
            GroupCommitPolicy::AllOrNothing
        } else {
            GroupCommitPolicy::SavePartial
        };
        Some(
            CreateOptions::new(builder_type)
                .with_count(self.count)
                .with_setup(self.setup)
                .with_status(self.status)
                .with_commit_policy(policy),
        )
    }
}

/// Usage line plus the flag listing of `gomote create`.
pub fn create_usage() -> String {
    let mut command = Cli::command();
    let flags = command
        .find_subcommand_mut("create")
        .map(|create| create.render_help().to_string())
        .unwrap_or_default();
    format!("{CREATE_USAGE}\n{flags}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CreateArgs {
        let cli = Cli::try_parse_from(std::iter::once("gomote").chain(args.iter().copied()))
            .unwrap();
        match cli.command {
            Commands::Create(args) => args,
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_defaults() {
        let args = parse(&["create", "linux-amd64"]);
        assert!(args.status);
        assert_eq!(args.count, 1);
        assert!(!args.setup);
        assert!(!args.legacy);
        assert!(args.new_group.is_none());
        assert_eq!(args.builder_type.as_deref(), Some("linux-amd64"));

        let options = args.to_options().unwrap();
        assert_eq!(options.commit_policy, GroupCommitPolicy::SavePartial);
        assert!(options.show_status);
    }

    #[test]
    fn test_create_all_flags() {
        let args = parse(&[
            "create",
            "--status=false",
            "--count",
            "3",
            "--setup",
            "--new-group",
            "fleet",
            "--all-or-nothing",
            "windows-amd64-2016",
        ]);

        let options = args.to_options().unwrap();
        assert!(!options.show_status);
        assert_eq!(options.count, 3);
        assert!(options.setup);
        assert_eq!(options.commit_policy, GroupCommitPolicy::AllOrNothing);
        assert_eq!(args.new_group.as_deref(), Some("fleet"));
    }

    #[test]
    fn test_bare_status_flag_does_not_swallow_builder_type() {
        let args = parse(&["create", "--status", "linux-amd64"]);
        assert!(args.status);
        assert_eq!(args.builder_type.as_deref(), Some("linux-amd64"));
    }

    #[test]
    fn test_missing_builder_type_has_no_options() {
        let args = parse(&["create"]);
        assert!(args.to_options().is_none());
    }

    #[test]
    fn test_legacy_rejects_incompatible_flags() {
        for flags in [
            &["create", "--legacy", "--setup", "x"][..],
            &["create", "--legacy", "--count", "2", "x"][..],
            &["create", "--legacy", "--new-group", "g", "x"][..],
            &["create", "--legacy", "--all-or-nothing", "x"][..],
        ] {
            let err = parse(flags).validate().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_REQUEST");
        }
        assert!(parse(&["create", "--legacy", "x"]).validate().is_ok());
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = parse(&["create", "--count", "0", "x"]).validate().unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_create_usage_lists_flags() {
        let usage = create_usage();
        assert!(usage.starts_with(CREATE_USAGE));
        assert!(usage.contains("--new-group"));
        assert!(usage.contains("--count"));
    }
}
