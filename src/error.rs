use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("In-stock observation for {0} carried no price")]
    MissingPrice(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Email build error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("Email address error: {0}")]
    Address(#[from] lettre::address::AddressError),
}

pub type Result<T> = std::result::Result<T, AppError>;
