use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Completion API error ({status}): {message}")]
    CompletionApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Completion response error: {0}")]
    CompletionResponse(String),

    #[error("Completion timed out after {0:?}")]
    CompletionTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Missing required option '{0}'")]
    MissingOption(String),

    #[error("Failed to {action} command '{name}': {source}")]
    CommandSync {
        action: &'static str,
        name: String,
        #[source]
        source: Box<BotError>,
    },
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for displaying in Discord
    pub fn user_message(&self) -> String {
        match self {
            BotError::Serenity(_) | BotError::CommandSync { .. } => {
                "Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) | BotError::Url(_) | BotError::Io(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::CompletionApi { status, .. } => {
                match *status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        "Sorry, I'm having authentication issues with my AI service. Please contact the bot administrator.".to_string()
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        "Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
                    }
                    status if status.is_server_error() => {
                        "Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                    }
                    status if status.is_client_error() => {
                        "Sorry, there was an issue with my request to the AI service. Please try again or contact the bot administrator.".to_string()
                    }
                    _ => {
                        "Sorry, I'm having trouble connecting to my AI service. Please try again later.".to_string()
                    }
                }
            }
            BotError::CompletionResponse(_) => {
                "Sorry, I received an unexpected response from my AI service. Please try again.".to_string()
            }
            BotError::CompletionTimeout(_) => {
                "Sorry, the AI service took too long to answer. Please try again later.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::MissingOption(name) => {
                format!("Please provide a `{name}` for this command.")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_specific_notice() {
        let unauthorized = BotError::CompletionApi {
            status: StatusCode::UNAUTHORIZED,
            message: "bad key".to_string(),
        };
        assert!(unauthorized.user_message().contains("authentication"));

        let limited = BotError::CompletionApi {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: String::new(),
        };
        assert!(limited.user_message().contains("rate limit"));

        let outage = BotError::CompletionApi {
            status: StatusCode::BAD_GATEWAY,
            message: String::new(),
        };
        assert!(outage.user_message().contains("experiencing issues"));
    }

    #[test]
    fn timeout_notice_differs_from_generic_failure() {
        let timeout = BotError::CompletionTimeout(Duration::from_secs(5)).user_message();
        let response = BotError::CompletionResponse("empty".to_string()).user_message();
        assert!(timeout.contains("too long"));
        assert_ne!(timeout, response);
    }

    #[test]
    fn command_sync_error_names_the_command() {
        let err = BotError::CommandSync {
            action: "create",
            name: "gpt".to_string(),
            source: Box::new(BotError::Config("boom".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create command 'gpt': Configuration error: boom"
        );
    }
}
