use anyhow::Result;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    pub bg: String,      // background
    pub main: String,    // brand color (chosen token, active highlights)
    pub caret: String,   // prompt cursor
    pub text: String,    // answer and generated text
    pub sub: String,     // hints, placeholders, losing options
    pub sub_alt: String, // borders, footer
    pub error: String,   // relay failures
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: "#2c2e34".to_string(),
            main: "#e2b714".to_string(),
            caret: "#e2b714".to_string(),
            text: "#d1d0c5".to_string(),
            sub: "#646669".to_string(),
            sub_alt: "#45474d".to_string(),
            error: "#ca4754".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Timing {
    pub step_ms: u64,
    pub token_reveal_ms: u64,
    pub embedding_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            step_ms: 700,
            token_reveal_ms: 400,
            embedding_delay_ms: 600,
        }
    }
}

impl Timing {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.token_reveal_ms)
    }

    pub fn embedding_delay(&self) -> Duration {
        Duration::from_millis(self.embedding_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    /// where the terminal app sends prompts
    pub url: String,
    /// where `--serve` listens
    pub host: String,
    pub port: u16,
    /// OpenAI-compatible upstream
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// name of the environment variable holding the upstream key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:4000/api/chat".to_string(),
            host: "127.0.0.1".to_string(),
            port: 4000,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub theme: Theme,
    pub timing: Timing,
    pub relay: RelaySettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let theme = Theme::default();
        let timing = Timing::default();
        let relay = RelaySettings::default();

        let mut builder = Config::builder()
            .set_default("theme.bg", theme.bg)?
            .set_default("theme.main", theme.main)?
            .set_default("theme.caret", theme.caret)?
            .set_default("theme.text", theme.text)?
            .set_default("theme.sub", theme.sub)?
            .set_default("theme.sub_alt", theme.sub_alt)?
            .set_default("theme.error", theme.error)?
            .set_default("timing.step_ms", timing.step_ms)?
            .set_default("timing.token_reveal_ms", timing.token_reveal_ms)?
            .set_default("timing.embedding_delay_ms", timing.embedding_delay_ms)?
            .set_default("relay.url", relay.url)?
            .set_default("relay.host", relay.host)?
            .set_default("relay.port", u64::from(relay.port))?
            .set_default("relay.base_url", relay.base_url)?
            .set_default("relay.model", relay.model)?
            .set_default("relay.temperature", f64::from(relay.temperature))?
            .set_default("relay.api_key_env", relay.api_key_env)?
            .set_default("relay.timeout_secs", relay.timeout_secs)?;

        if let Some(proj_dirs) = ProjectDirs::from("", "", "ruleta") {
            let config_path = proj_dirs.config_dir().join("config.toml");

            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            }
        }

        // e.g. RULETA__RELAY__PORT=5000
        builder = builder.add_source(
            Environment::with_prefix("RULETA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let app_config: AppConfig = cfg.try_deserialize()?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_timings() {
        let timing = Timing::default();
        assert_eq!(timing.step_delay(), Duration::from_millis(700));
        assert_eq!(timing.reveal_delay(), Duration::from_millis(400));
        assert_eq!(timing.embedding_delay(), Duration::from_millis(600));
    }

    #[test]
    fn relay_defaults_point_at_local_server() {
        let relay = RelaySettings::default();
        assert_eq!(relay.port, 4000);
        assert!(relay.url.ends_with("/api/chat"));
        assert_eq!(relay.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = Config::builder()
            .add_source(File::from_str(
                "[timing]\nstep_ms = 250\n[theme]\nsub_alt = \"#444444\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let loaded: AppConfig = cfg.try_deserialize().unwrap();
        assert_eq!(loaded.timing.step_ms, 250);
        assert_eq!(loaded.timing.token_reveal_ms, 400);
        assert_eq!(loaded.theme.sub_alt, "#444444");
        assert_eq!(loaded.theme.bg, Theme::default().bg);
        assert_eq!(loaded.relay, RelaySettings::default());
    }
}
