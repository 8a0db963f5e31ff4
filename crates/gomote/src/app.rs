use crate::cli::{create_usage, Cli, Commands, CreateArgs};
use crate::config::GomoteConfig;
use crate::features::builder_catalog::controller::BuilderCatalogController;
use crate::features::builder_catalog::repo::ReqwestBuilderCatalogRepository;
use crate::features::builder_catalog::service::BuilderCatalogService;
use crate::features::groups::repo::{FileGroupStore, GroupStore};
use crate::features::groups::service::GroupService;
use crate::features::instance_creation::controller::CreateController;
use crate::features::instance_creation::repo::GrpcProvisioningRepository;
use crate::features::instance_creation::service::{CreateError, CreateService};
use crate::features::instance_setup::repo::{GorootResolver, ProcessSetupRepository};
use crate::features::instance_setup::service::SetupService;
use crate::features::legacy_creation::controller::LegacyCreateController;
use crate::features::legacy_creation::repo::HttpCoordinatorClient;
use crate::features::legacy_creation::service::LegacyCreateService;
use crate::shared::console::Console;
use crate::shared::error::GomoteResult;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// The single line printed for a failed command.
///
/// Each error message already names its cause, so the chain is not appended.
pub fn render_error(error: &anyhow::Error) -> String {
    format!("gomote: {error}")
}

/// Wires configuration into controllers and dispatches parsed commands.
pub struct App {
    config: GomoteConfig,
    console: Console,
}

impl App {
    pub fn new(config: GomoteConfig, console: Console) -> Self {
        Self { config, console }
    }

    pub async fn run(&self, cli: Cli) -> GomoteResult<ExitCode> {
        match cli.command {
            Commands::Create(args) => self.create(args).await,
        }
    }

    async fn create(&self, args: CreateArgs) -> GomoteResult<ExitCode> {
        let Some(options) = args.to_options() else {
            self.print_usage().await?;
            return Ok(ExitCode::FAILURE);
        };
        args.validate()?;

        if args.legacy {
            self.legacy_controller()
                .create(&options.builder_type, options.show_status)
                .await?;
            return Ok(ExitCode::SUCCESS);
        }

        let outcome = self
            .create_controller()?
            .create(options, args.new_group.as_deref())
            .await?;
        info!(
            instances = outcome.instances.len(),
            group = outcome.group.as_ref().map(|g| g.name.as_str()).unwrap_or(""),
            "Create finished"
        );
        Ok(ExitCode::SUCCESS)
    }

    async fn print_usage(&self) -> GomoteResult<()> {
        let repo = ReqwestBuilderCatalogRepository::new(self.config.builders_url.clone());
        let controller =
            BuilderCatalogController::new(Arc::new(BuilderCatalogService::new(Arc::new(repo))));
        let usage = controller.usage(&create_usage()).await?;
        self.console.status(usage.trim_end());
        Ok(())
    }

    fn legacy_controller(&self) -> LegacyCreateController {
        let client = HttpCoordinatorClient::new(self.config.coordinator_url.clone());
        let service = LegacyCreateService::new(Arc::new(client), self.console.clone());
        LegacyCreateController::new(
            Arc::new(service),
            self.config.active_group.clone(),
            self.console.clone(),
        )
    }

    fn create_controller(&self) -> GomoteResult<CreateController> {
        let provisioning = GrpcProvisioningRepository::connect(&self.config.server_addr)
            .map_err(CreateError::Connect)?;
        let store: Arc<dyn GroupStore> = Arc::new(FileGroupStore::new(&self.config.group_dir));
        let setup = SetupService::new(
            Arc::new(ProcessSetupRepository::new(&self.config.gomote_bin)),
            Arc::new(GorootResolver::new(self.config.goroot.clone())),
            self.console.clone(),
        );
        let service = CreateService::new(
            Arc::new(provisioning),
            Arc::new(setup),
            Arc::clone(&store),
            self.console.clone(),
        );
        Ok(CreateController::new(
            Arc::new(GroupService::new(store)),
            Arc::new(service),
            self.config.active_group.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SERVER_ADDR;
    use crate::features::builder_catalog::repo::CatalogError;
    use crate::features::instance_creation::repo::ProvisioningError;
    use crate::features::instance_setup::repo::SetupError;
    use crate::shared::error::GomoteError;
    use clap::Parser;

    fn app(active_group: Option<&str>) -> (App, crate::shared::console::CapturedOutput) {
        let dir = std::env::temp_dir();
        let config = GomoteConfig::from_lookup(|key| match key {
            "GOMOTE_GROUP" => active_group.map(str::to_string),
            "GOMOTE_GROUP_DIR" => Some(dir.display().to_string()),
            _ => None,
        });
        assert_eq!(config.server_addr, DEFAULT_SERVER_ADDR);
        let (console, output) = Console::captured();
        (App::new(config, console), output)
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gomote").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_legacy_with_active_group_is_rejected() {
        let (app, output) = app(Some("fleet"));
        let err = app
            .run(cli(&["create", "--legacy", "linux-amd64"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "command does not support groups");
        assert!(output.stdout().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_flags_rejected_before_connecting() {
        let (app, _) = app(None);
        let err = app
            .run(cli(&["create", "--legacy", "--setup", "linux-amd64"]))
            .await
            .unwrap_err();
        assert!(matches!(err, GomoteError::InvalidRequest(_)));
    }

    #[test]
    fn test_rendered_rpc_error_names_cause_once() {
        let error = anyhow::Error::from(GomoteError::Create(CreateError::Rpc {
            index: 2,
            builder_type: "linux-amd64".to_string(),
            elapsed: std::time::Duration::from_secs(4),
            source: ProvisioningError::Rpc(
                "rpc error: code = Unavailable desc = pool exhausted".to_string(),
            ),
        }));

        let line = render_error(&error);
        assert!(line.starts_with("gomote: failed to create buildlet (2) of type linux-amd64"));
        assert_eq!(line.matches("pool exhausted").count(), 1);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_rendered_setup_error_names_cause_once() {
        let error = anyhow::Error::from(GomoteError::Create(CreateError::Setup {
            index: 1,
            instance: gomote_core::InstanceId::new("a").unwrap(),
            source: SetupError::Failed {
                op: "run",
                instance: "a".to_string(),
                detail: "exit status: 1".to_string(),
            },
        }));

        assert_eq!(
            render_error(&error),
            "gomote: setting up buildlet (1) a: run on a failed: exit status: 1"
        );
    }

    #[test]
    fn test_rendered_catalog_error_names_cause_once() {
        let error = anyhow::Error::from(GomoteError::Catalog(CatalogError::Status(
            "503 Service Unavailable".to_string(),
        )));

        let line = render_error(&error);
        assert_eq!(line.matches("503 Service Unavailable").count(), 1);
    }

    #[tokio::test]
    async fn test_create_controller_builds_lazily() {
        let (app, _) = app(None);
        assert!(app.create_controller().is_ok());
    }
}
