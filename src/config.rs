//! Configuration types.
//!
//! Everything is read from the environment once at startup. A missing or
//! malformed required value is fatal before any conversation can begin.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Which transport the bot runs on.
#[derive(Debug, Clone)]
pub enum ChannelSettings {
    /// Telegram Bot API via long-polling.
    Telegram { bot_token: SecretString },
    /// Local stdin/stdout REPL.
    Cli,
}

impl ChannelSettings {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Telegram { .. } => "telegram",
            Self::Cli => "cli",
        }
    }
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub channel: ChannelSettings,
    /// Chat that receives finished submissions.
    pub operator_chat_id: String,
    /// Path of the checklist document sent on completion.
    pub checklist_path: PathBuf,
    /// Port for the health-check listener, if hosting needs one.
    pub health_port: Option<u16>,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let channel = match get("BOT_CHANNEL").as_deref() {
            None | Some("telegram") => {
                let token = get("BOT_TOKEN")
                    .ok_or_else(|| ConfigError::MissingEnvVar("BOT_TOKEN".into()))?;
                ChannelSettings::Telegram {
                    bot_token: SecretString::from(token),
                }
            }
            Some("cli") => ChannelSettings::Cli,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "BOT_CHANNEL".into(),
                    message: format!("expected `telegram` or `cli`, got `{other}`"),
                });
            }
        };

        let operator_chat_id =
            get("ADMIN_CHAT_ID").ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_CHAT_ID".into()))?;
        if operator_chat_id.parse::<i64>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: "ADMIN_CHAT_ID".into(),
                message: format!("`{operator_chat_id}` is not a numeric chat id"),
            });
        }

        let checklist_path = get("CHECKLIST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("checklist.pdf"));

        let health_port = match get("PORT") {
            Some(port) => Some(port.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            channel,
            operator_chat_id,
            checklist_path,
            health_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn telegram_defaults() {
        let config = load(&[("BOT_TOKEN", "123:ABC"), ("ADMIN_CHAT_ID", "-100200300")]).unwrap();
        match &config.channel {
            ChannelSettings::Telegram { bot_token } => {
                assert_eq!(bot_token.expose_secret(), "123:ABC");
            }
            other => panic!("expected telegram, got {other:?}"),
        }
        assert_eq!(config.operator_chat_id, "-100200300");
        assert_eq!(config.checklist_path, PathBuf::from("checklist.pdf"));
        assert_eq!(config.health_port, None);
    }

    #[test]
    fn missing_operator_is_fatal() {
        let err = load(&[("BOT_TOKEN", "123:ABC")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ADMIN_CHAT_ID"));
    }

    #[test]
    fn blank_operator_counts_as_missing() {
        let err = load(&[("BOT_TOKEN", "t"), ("ADMIN_CHAT_ID", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn non_numeric_operator_is_invalid() {
        let err = load(&[("BOT_TOKEN", "t"), ("ADMIN_CHAT_ID", "@admin")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ADMIN_CHAT_ID"));
    }

    #[test]
    fn telegram_requires_token() {
        let err = load(&[("ADMIN_CHAT_ID", "1")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BOT_TOKEN"));
    }

    #[test]
    fn cli_needs_no_token() {
        let config = load(&[("BOT_CHANNEL", "cli"), ("ADMIN_CHAT_ID", "1")]).unwrap();
        assert_eq!(config.channel.name(), "cli");
    }

    #[test]
    fn unknown_channel_is_invalid() {
        let err = load(&[("BOT_CHANNEL", "slack"), ("ADMIN_CHAT_ID", "1")]).unwrap_err();
        assert!(err.to_string().contains("BOT_CHANNEL"));
    }

    #[test]
    fn optional_values() {
        let config = load(&[
            ("BOT_CHANNEL", "cli"),
            ("ADMIN_CHAT_ID", "1"),
            ("CHECKLIST_PATH", "/srv/docs/acceptance.pdf"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.checklist_path, PathBuf::from("/srv/docs/acceptance.pdf"));
        assert_eq!(config.health_port, Some(8080));
    }

    #[test]
    fn bad_port_is_invalid() {
        let err = load(&[("BOT_CHANNEL", "cli"), ("ADMIN_CHAT_ID", "1"), ("PORT", "http")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }
}
