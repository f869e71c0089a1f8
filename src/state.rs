use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::{
    self, DocumentRepository, InMemoryDocuments, InMemoryUsers, PgDocuments, PgUsers,
    UserRepository,
};
use crate::grammar::{GrammarClient, GrammarError};
use crate::storage::{BlobStore, LocalBlobStore};
use std::sync::Arc;

pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub sessions: SessionStore,
    pub grammar: Option<GrammarClient>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by in-memory repositories and a local upload folder.
    pub fn in_memory(config: Config) -> Result<Self, GrammarError> {
        Self::with_repositories(
            config,
            Arc::new(InMemoryUsers::new()),
            Arc::new(InMemoryDocuments::new()),
        )
    }

    pub fn with_repositories(
        config: Config,
        users: Arc<dyn UserRepository>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Result<Self, GrammarError> {
        let grammar = match &config.grammar_check_url {
            Some(url) => Some(GrammarClient::new(
                url.clone(),
                config.grammar_check_language.clone(),
            )?),
            None => None,
        };

        Ok(Self {
            users,
            documents,
            blobs: Arc::new(LocalBlobStore::new(config.upload_folder.clone())),
            sessions: SessionStore::new(chrono::Duration::hours(config.session_ttl_hours)),
            grammar,
            config: Arc::new(config),
        })
    }

    /// Postgres-backed state when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn from_config(
        config: Config,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let Some(url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            return Ok(Self::in_memory(config)?);
        };

        let pool = db::create_pool(&url).await?;
        db::run_migrations(pool.as_ref()).await?;

        Ok(Self::with_repositories(
            config,
            Arc::new(PgUsers::new(pool.clone())),
            Arc::new(PgDocuments::new(pool)),
        )?)
    }
}
