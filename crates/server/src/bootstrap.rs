use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use teller_agent::{AuthService, IntentClassifier, OpenAiChatClient, Orchestrator, ToolDispatcher};
use teller_core::config::{AppConfig, ConfigError, LoadOptions};
use teller_db::repositories::{
    ConversationRepository, CustomerRepository, RepositoryError, SqlConversationRepository,
    SqlCustomerRepository, SqlRemittanceRepository,
};
use teller_db::{connect, migrations, seed_sample_data, DbPool};

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("fixture seeding failed: {0}")]
    Seed(#[source] sqlx::Error),
    #[error("statistics restore failed: {0}")]
    Statistics(#[source] RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    if config.database.seed_fixtures {
        let summary = seed_sample_data(&db_pool).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.fixtures_seeded",
            customers = summary.customers,
            remittances = summary.remittances,
            "sample data seeded"
        );
    }

    let customers: Arc<dyn CustomerRepository> =
        Arc::new(SqlCustomerRepository::new(db_pool.clone()));
    let conversations: Arc<dyn ConversationRepository> =
        Arc::new(SqlConversationRepository::new(db_pool.clone()));
    let remittances = Arc::new(SqlRemittanceRepository::new(db_pool.clone()));

    let llm = Arc::new(OpenAiChatClient::new(&config.llm));
    let orchestrator = Orchestrator::new(
        IntentClassifier::new(llm),
        ToolDispatcher::new(remittances),
        conversations.clone(),
    );
    orchestrator.restore_statistics().await.map_err(BootstrapError::Statistics)?;
    info!(
        event_name = "system.bootstrap.statistics_restored",
        "statistics restored from the conversation log"
    );

    let auth = AuthService::new(customers.clone(), &config.auth);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        auth: Arc::new(auth),
        customers,
        conversations,
    };

    Ok(Application { config, db_pool, state })
}
