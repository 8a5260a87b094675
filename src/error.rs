use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ReadFile({0}, {1})")]
    ReadFile(std::io::Error, String),
    #[error("Parse({0})")]
    Parse(#[from] toml::de::Error),
    #[error("InvalidBaseUrl({0})")]
    InvalidBaseUrl(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport({0})")]
    Transport(#[from] reqwest::Error),
    #[error("Status({status}, {message})")]
    Status { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("MissingFields({0})")]
    MissingFields(String),
    #[error("InvalidRole({0})")]
    InvalidRole(String),
    #[error("InvalidEmail({0})")]
    InvalidEmail(String),
    #[error("NoChanges")]
    NoChanges,
}

///An HTTP-success payload whose body reports a domain-level failure.
#[derive(Error, Debug)]
pub enum InviteRejectedError {
    #[error("Rejected({0})")]
    Rejected(String),
    #[error("EmptyResults")]
    EmptyResults,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config({0})")]
    Config(#[from] ConfigError),
    #[error("Api({0})")]
    Api(#[from] ApiError),
    #[error("Validation({0})")]
    Validation(#[from] ValidationError),
    #[error("InviteRejected({0})")]
    InviteRejected(#[from] InviteRejectedError),
    #[error("Io({0})")]
    Io(#[from] std::io::Error),
}
