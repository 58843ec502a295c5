pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    ApiConfig, Config, NotificationsConfig, PresentationConfig, RatingsConfig, SchedulerConfig,
    ServerConfig, TelegramConfig, DEFAULT_REFERENCE_URL_BASE,
};
pub use credentials::{load_dotenv, CredentialStore};
pub use paths::{container_base_path, PathManager};
