use thiserror::Error;

/// Failure of a single call against the game API.
///
/// Every variant is local to the action that caused it; none of them end the
/// whole session on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Token missing, invalid or expired.
    #[error("You must have a valid session")]
    Unauthenticated,

    /// The server did not accept the guessed word.
    #[error("{0}")]
    Rejected(String),

    /// The player has already played every available word.
    #[error("{0}")]
    GameAlreadyComplete(String),

    /// Any other non-success status, with the server message when present.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text shown to the player for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthenticated => self.to_string(),
            ApiError::Rejected(msg) | ApiError::GameAlreadyComplete(msg) => msg.clone(),
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Status { .. } | ApiError::Decode(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "An unexpected error occurred. Please check your network.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("row {row} is outside the grid")]
    RowOutOfBounds { row: usize },

    #[error("feedback is missing column {col}")]
    MissingFeedback { col: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        assert_eq!(
            ApiError::Rejected("Word not found".into()).user_message(),
            "Word not found"
        );
        assert_eq!(
            ApiError::Status {
                status: 500,
                message: String::new()
            }
            .user_message(),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn unauthenticated_message_is_fixed() {
        assert_eq!(
            ApiError::Unauthenticated.user_message(),
            "You must have a valid session"
        );
    }
}
