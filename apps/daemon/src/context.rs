//! Explicit service wiring: one `ServiceContext` built at startup owns every
//! store, repository, and the push engine. Nothing here is global; handing
//! the context around is the only way to reach the platform.

use std::env;
use std::sync::Arc;

use anyhow::Context as _;

use tulia_core::appointments::AppointmentRepository;
use tulia_core::chat::ChatRepository;
use tulia_core::counselors::CounselorRepository;
use tulia_core::remote::DocumentStore;
use tulia_core::resources::ResourceRepository;
use tulia_core::session::StaticSession;
use tulia_core::sync::OutboxPusher;
use tulia_core::users::UserRepository;
use tulia_remote::HttpDocumentStore;
use tulia_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, AppointmentStore, ChatStore, CounselorStore,
    OutboxStore, ResourceStore, UserStore,
};

/// Daemon configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub remote_url: String,
    pub api_token: String,
    pub user_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self {
            data_dir: env::var("TULIA_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            remote_url: env::var("TULIA_REMOTE_URL").context("TULIA_REMOTE_URL is not set")?,
            api_token: env::var("TULIA_API_TOKEN").context("TULIA_API_TOKEN is not set")?,
            user_id: env::var("TULIA_USER_ID").ok(),
        })
    }
}

pub struct ServiceContext {
    pub session: Arc<StaticSession>,
    pub users: Arc<UserRepository>,
    pub counselors: Arc<CounselorRepository>,
    pub appointments: Arc<AppointmentRepository>,
    pub resources: Arc<ResourceRepository>,
    pub chat: Arc<ChatRepository>,
    pub outbox: Arc<OutboxStore>,
    pub pusher: Arc<OutboxPusher>,
}

impl ServiceContext {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let db_path = init(&config.data_dir).context("initializing data directory")?;
        run_migrations(&db_path).context("running database migrations")?;
        let pool = create_pool(&db_path).context("creating connection pool")?;
        let writer = spawn_writer(pool.as_ref().clone());

        let remote: Arc<dyn DocumentStore> = Arc::new(
            HttpDocumentStore::new(&config.remote_url, &config.api_token)
                .context("building remote document store client")?,
        );

        let outbox = Arc::new(OutboxStore::new(pool.clone(), writer.clone()));
        let pusher = Arc::new(OutboxPusher::new(outbox.clone(), remote.clone()));

        let user_store = Arc::new(UserStore::new(pool.clone(), writer.clone()));
        let counselor_store = Arc::new(CounselorStore::new(pool.clone(), writer.clone()));
        let appointment_store = Arc::new(AppointmentStore::new(pool.clone(), writer.clone()));
        let resource_store = Arc::new(ResourceStore::new(pool.clone(), writer.clone()));
        let chat_store = Arc::new(ChatStore::new(pool.clone(), writer.clone()));

        let session = Arc::new(match &config.user_id {
            Some(user_id) => StaticSession::new(user_id.clone()),
            None => StaticSession::signed_out(),
        });

        Ok(Self {
            session,
            users: Arc::new(UserRepository::new(
                user_store,
                remote.clone(),
                pusher.clone(),
            )),
            counselors: Arc::new(CounselorRepository::new(
                counselor_store,
                remote.clone(),
                pusher.clone(),
            )),
            appointments: Arc::new(AppointmentRepository::new(
                appointment_store,
                remote.clone(),
                pusher.clone(),
            )),
            resources: Arc::new(ResourceRepository::new(
                resource_store,
                remote.clone(),
                pusher.clone(),
            )),
            chat: Arc::new(ChatRepository::new(chat_store, remote, pusher.clone())),
            outbox,
            pusher,
        })
    }
}
