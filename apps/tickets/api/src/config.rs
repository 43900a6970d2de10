use core_config::{
    AppInfo, DebugConfig, FromEnv, LinksConfig, MailConfig, ServerConfig, SessionConfig,
    SuggestionsConfig, app_info,
};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Everything the service reads from the environment at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub mail: MailConfig,
    pub links: LinksConfig,
    pub debug: DebugConfig,
    pub session: SessionConfig,
    pub suggestions: SuggestionsConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            mongodb: MongoConfig::from_env()?,
            mail: MailConfig::from_env()?,
            links: LinksConfig::from_env()?,
            debug: DebugConfig::from_env()?,
            session: SessionConfig::from_env()?,
            suggestions: SuggestionsConfig::from_env()?,
        })
    }
}
