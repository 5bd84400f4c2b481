use std::sync::Arc;

use crate::config::Config;
use crate::enforcement::sanitize::Sanitizer;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Text-generation capability. `LlmClient` in production, mocks in tests.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
    /// Compiled style policy applied to every model-revised statement.
    pub sanitizer: Arc<Sanitizer>,
}

#[cfg(test)]
impl AppState {
    /// State backed by a generator that always replies with `reply`.
    pub fn with_reply(reply: &str) -> Self {
        use std::time::Duration;

        use crate::enforcement::sanitize::StylePolicy;

        let config = Config {
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            llm_model: "test-model".to_string(),
            llm_call_timeout: Duration::from_secs(5),
            style_policy_path: None,
        };
        let sanitizer = Sanitizer::new(StylePolicy::bundled().unwrap()).unwrap();
        Self {
            llm: Arc::new(testing::FixedReply(reply.to_string())),
            config,
            sanitizer: Arc::new(sanitizer),
        }
    }

    pub fn for_tests() -> Self {
        Self::with_reply("")
    }
}
