//! Bot configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blog::mastodon::MastodonVisibility;
use crate::blog::ohagi::OhagiVisibility;
use crate::error::{AppError, Result};

/// Root bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Account whose posts feed the model
    pub fetch_client: ClientConfig,

    /// Account that publishes generated text (defaults to `fetch_client`)
    #[serde(default)]
    pub post_client: Option<ClientConfig>,

    /// Model building and generation settings
    #[serde(default)]
    pub chain: ChainConfig,

    /// HTTP client settings shared by every adapter
    #[serde(default)]
    pub http: HttpConfig,

    /// Log generated text instead of publishing it
    #[serde(default)]
    pub dry_run: bool,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Client used for publishing.
    pub fn post_client(&self) -> &ClientConfig {
        self.post_client.as_ref().unwrap_or(&self.fetch_client)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.fetch_client.validate("fetch_client")?;
        if let Some(post) = &self.post_client {
            post.validate("post_client")?;
        }
        if self.chain.state_size == 0 {
            return Err(AppError::validation("chain.state_size must be > 0"));
        }
        if self.chain.fetch_status_count == 0 {
            return Err(AppError::validation("chain.fetch_status_count must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Which platform an account lives on, with its credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ClientConfig {
    Mastodon {
        /// Instance host name, e.g. `mastodon.social`
        domain: String,
        access_token: String,
        #[serde(default = "defaults::mastodon_visibility")]
        post_visibility: MastodonVisibility,
    },
    Ohagi {
        /// Full origin including scheme, e.g. `https://ohagi.example`
        origin: String,
        access_token: String,
        #[serde(default = "defaults::ohagi_visibility")]
        post_visibility: OhagiVisibility,
    },
}

impl ClientConfig {
    fn validate(&self, section: &str) -> Result<()> {
        match self {
            Self::Mastodon {
                domain,
                access_token,
                post_visibility,
            } => {
                if domain.trim().is_empty() {
                    return Err(AppError::validation(format!("{section}.domain is empty")));
                }
                if domain.contains("://") || domain.contains('/') {
                    return Err(AppError::validation(format!(
                        "{section}.domain must be a host name without scheme or path"
                    )));
                }
                check_token(section, access_token)?;
                if *post_visibility == MastodonVisibility::Unknown {
                    return Err(AppError::validation(format!(
                        "{section}.post_visibility is not a Mastodon visibility"
                    )));
                }
            }
            Self::Ohagi {
                origin,
                access_token,
                post_visibility,
            } => {
                url::Url::parse(origin).map_err(|e| {
                    AppError::validation(format!("{section}.origin is not a URL: {e}"))
                })?;
                check_token(section, access_token)?;
                if *post_visibility == OhagiVisibility::Unknown {
                    return Err(AppError::validation(format!(
                        "{section}.post_visibility is not an Ohagi visibility"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_token(section: &str, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(AppError::validation(format!("{section}.access_token is empty")));
    }
    Ok(())
}

/// Model building and text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Maximum number of posts collected per rebuild
    #[serde(default = "defaults::fetch_status_count")]
    pub fetch_status_count: usize,

    /// Model lifetime in seconds before a rebuild is attempted
    #[serde(default = "defaults::expires_in")]
    pub expires_in: u64,

    /// Number of preceding tokens forming a chain state
    #[serde(default = "defaults::state_size")]
    pub state_size: usize,

    /// Generated text with fewer words is retried
    #[serde(default = "defaults::min_words_count")]
    pub min_words_count: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            fetch_status_count: defaults::fetch_status_count(),
            expires_in: defaults::expires_in(),
            state_size: defaults::state_size(),
            min_words_count: defaults::min_words_count(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    use super::{MastodonVisibility, OhagiVisibility};

    pub fn mastodon_visibility() -> MastodonVisibility {
        MastodonVisibility::Unlisted
    }
    pub fn ohagi_visibility() -> OhagiVisibility {
        OhagiVisibility::Public
    }

    // Chain defaults
    pub fn fetch_status_count() -> usize {
        1000
    }
    pub fn expires_in() -> u64 {
        24 * 60 * 60
    }
    pub fn state_size() -> usize {
        2
    }
    pub fn min_words_count() -> usize {
        1
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        concat!("markov-bot/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[fetch_client]
platform = "mastodon"
domain = "mastodon.example"
access_token = "secret"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = BotConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.chain.fetch_status_count, 1000);
        assert_eq!(config.chain.expires_in, 86400);
        assert_eq!(config.chain.state_size, 2);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());

        match config.post_client() {
            ClientConfig::Mastodon {
                post_visibility, ..
            } => assert_eq!(*post_visibility, MastodonVisibility::Unlisted),
            other => panic!("unexpected post client: {other:?}"),
        }
    }

    #[test]
    fn test_separate_post_client() {
        let text = format!(
            "{MINIMAL}
[post_client]
platform = \"ohagi\"
origin = \"https://ohagi.example\"
access_token = \"other\"
post_visibility = \"followers-only\"

[chain]
expires_in = 60
min_words_count = 3
"
        );
        let config = BotConfig::from_toml(&text).unwrap();
        assert_eq!(config.chain.expires_in, 60);
        assert_eq!(config.chain.min_words_count, 3);
        match config.post_client() {
            ClientConfig::Ohagi {
                origin,
                post_visibility,
                ..
            } => {
                assert_eq!(origin, "https://ohagi.example");
                assert_eq!(*post_visibility, OhagiVisibility::FollowersOnly);
            }
            other => panic!("unexpected post client: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BotConfig::from_toml(MINIMAL).unwrap();
        config.chain.state_size = 0;
        assert!(config.validate().is_err());

        let text = MINIMAL.replace("secret", " ");
        let config = BotConfig::from_toml(&text).unwrap();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let text = r#"
[fetch_client]
platform = "ohagi"
origin = "not a url"
access_token = "secret"
"#;
        let config = BotConfig::from_toml(text).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_domain_with_scheme_or_path() {
        for domain in ["https://mastodon.example", "mastodon.example/@bot"] {
            let text = MINIMAL.replace("mastodon.example", domain);
            let config = BotConfig::from_toml(&text).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("fetch_client.domain"), "{err}");
        }
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let text = MINIMAL.replace("mastodon\"", "misskey\"");
        assert!(matches!(
            BotConfig::from_toml(&text),
            Err(AppError::Toml(_))
        ));
    }
}
