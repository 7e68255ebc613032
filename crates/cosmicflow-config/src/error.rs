use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'api_url', 'api_key', 'secret_key' and 'zone' should all have values")]
    IncompleteCredentials,

    #[error("'config' and 'profile' should both have a value")]
    IncompleteProfile,

    #[error(
        "either 'api_url', 'api_key', 'secret_key' and 'zone' or 'config' and 'profile' should have values"
    )]
    MissingCredentials,

    #[error("'{0}' conflicts with 'config' and 'profile'")]
    Conflict(String),

    #[error("profile '{profile}' not found in {path}")]
    ProfileNotFound { profile: String, path: String },

    #[error("value for '{0}' is empty or missing from config profile")]
    MissingProfileValue(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("home directory not found")]
    HomeDirNotFound,

    #[error("config file error: {0}")]
    File(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
