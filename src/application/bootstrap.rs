use crate::application::planning_list::TaskPlanningListManager;
use crate::application::session::PlannerSession;
use crate::infrastructure::command_log::CommandLog;
use crate::infrastructure::config::{
    BackendKind, PlannerConfig, ensure_default_configs, load_planner_config,
    load_rest_config_from_lookup,
};
use crate::infrastructure::error::PlannerError;
use crate::infrastructure::planning_store::{PlanningStore, SqlitePlanningStore};
use crate::infrastructure::rest_client::RestBackendClient;
use crate::infrastructure::storage::initialize_database;
use crate::infrastructure::task_catalog::{SqliteTaskCatalog, TaskCatalog};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DATABASE_FILE: &str = "dayplan.sqlite";

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub config: PlannerConfig,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, PlannerError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join(DATABASE_FILE);

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_planner_config(&config_dir)?;
    initialize_database(&database_path)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
        config,
    })
}

pub type DynPlannerSession = PlannerSession<dyn PlanningStore, dyn TaskCatalog>;

/// Bootstraps `workspace_root` and opens a session on `date` against the
/// backend named in `planner.json`.
pub async fn open_session(
    workspace_root: &Path,
    date: NaiveDate,
) -> Result<DynPlannerSession, PlannerError> {
    open_session_with_lookup(workspace_root, date, |key| std::env::var(key).ok()).await
}

pub async fn open_session_with_lookup<F>(
    workspace_root: &Path,
    date: NaiveDate,
    lookup: F,
) -> Result<DynPlannerSession, PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    let bootstrap = bootstrap_workspace(workspace_root)?;
    let (planning_store, task_catalog) = open_backend(&bootstrap, lookup)?;

    let config = &bootstrap.config;
    let manager =
        TaskPlanningListManager::new(planning_store, task_catalog, config.user_id.clone(), date);
    let mut session = PlannerSession::new(manager, config.time_grid()?)
        .with_default_sort(config.default_sort)
        .with_command_log(CommandLog::new(&bootstrap.logs_dir));
    session.select_date(date).await?;
    Ok(session)
}

fn open_backend<F>(
    bootstrap: &BootstrapResult,
    lookup: F,
) -> Result<(Arc<dyn PlanningStore>, Arc<dyn TaskCatalog>), PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    match bootstrap.config.backend {
        BackendKind::Sqlite => {
            let planning_store: Arc<dyn PlanningStore> =
                Arc::new(SqlitePlanningStore::new(&bootstrap.database_path));
            let task_catalog: Arc<dyn TaskCatalog> =
                Arc::new(SqliteTaskCatalog::new(&bootstrap.database_path));
            Ok((planning_store, task_catalog))
        }
        BackendKind::Rest => {
            let client = Arc::new(RestBackendClient::new(load_rest_config_from_lookup(lookup)?)?);
            let planning_store: Arc<dyn PlanningStore> = client.clone();
            let task_catalog: Arc<dyn TaskCatalog> = client;
            Ok((planning_store, task_catalog))
        }
    }
}
