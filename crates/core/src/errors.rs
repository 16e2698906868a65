use thiserror::Error;

/// Precondition failures surfaced to the acting user. Each variant renders a
/// one-line rejection naming the check that failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("amount must be a positive whole number")]
    InvalidAmount,
    #[error("insufficient funds: requested {requested}, bank holds {available}")]
    InsufficientFunds { requested: u64, available: u64 },
    #[error("caller lacks the required role")]
    Unauthorized,
    #[error("no event matches `{reference}`")]
    EventNotFound { reference: String },
}

impl DomainError {
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::EventNotFound { reference: reference.into() }
    }

    /// Short rejection line shown back to the user who triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount => "Amount must be a positive whole number.".to_owned(),
            Self::InsufficientFunds { available, .. } => {
                format!("The bank does not hold that much. Current total: {available} aUEC.")
            }
            Self::Unauthorized => "You do not have the role required for that action.".to_owned(),
            Self::EventNotFound { reference } => {
                format!("No event matches `{reference}`. It may have been removed.")
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("platform integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// User-safe reply text. Domain rejections keep their specific line;
    /// everything else collapses to a generic notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message, .. } => message.clone(),
            Self::ServiceUnavailable { .. } => {
                "The bot is temporarily unable to process that. Please retry shortly.".to_owned()
            }
            Self::Internal { .. } => "An unexpected error occurred.".to_owned(),
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(domain) => {
                InterfaceError::BadRequest { message: domain.user_message(), correlation_id }
            }
            Self::Persistence(message) | Self::Integration(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::Configuration(message) => InterfaceError::Internal { message, correlation_id },
        }
    }
}
