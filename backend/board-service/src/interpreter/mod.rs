/// Command interpretation strategies.
///
/// `PatternInterpreter` is deterministic and always available.
/// `DelegatedInterpreter` asks a remote language model and falls back to the
/// pattern strategy whenever the remote answer is missing or unusable.
/// `InterpreterSwitch` holds whichever strategy is active and can be
/// re-pointed at runtime when a credential is supplied.
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::activity::{ActivityCategory, ActivityEntry, ActivityLevel, ActivityLog};
use crate::config::LlmConfig;
use crate::llm::{AnthropicProvider, CallPolicy, LlmError};
use crate::models::ParsedCommand;

pub mod delegated;
pub mod fields;
pub mod patterns;

pub use delegated::DelegatedInterpreter;
pub use patterns::{detect_chart_kind, PatternInterpreter, CHART_KEYWORDS};

#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    /// Turn free text into a structured command. Never fails; unusable input
    /// comes back with `valid == false` and a reason.
    async fn interpret(&self, text: &str) -> ParsedCommand;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InterpreterStatus {
    pub strategy: String,
    pub model: Option<String>,
    pub credential_configured: bool,
    pub fallback: &'static str,
}

struct Active {
    interpreter: Arc<dyn CommandInterpreter>,
    credential_configured: bool,
}

pub struct InterpreterSwitch {
    active: RwLock<Active>,
    llm: LlmConfig,
    activity: Arc<ActivityLog>,
}

impl InterpreterSwitch {
    /// Delegated strategy when a credential is configured, pattern otherwise.
    pub fn from_config(llm: &LlmConfig, activity: Arc<ActivityLog>) -> Self {
        let delegated = llm
            .api_key
            .as_deref()
            .map(|key| build_delegated(llm, key, activity.clone()));

        let active = match delegated {
            Some(Ok(interpreter)) => Active {
                interpreter: Arc::new(interpreter),
                credential_configured: true,
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "remote interpreter unavailable, using pattern strategy");
                pattern_active()
            }
            None => pattern_active(),
        };

        info!(strategy = active.interpreter.name(), "command interpreter ready");
        Self {
            active: RwLock::new(active),
            llm: llm.clone(),
            activity,
        }
    }

    pub fn pattern_only(activity: Arc<ActivityLog>) -> Self {
        Self {
            active: RwLock::new(pattern_active()),
            llm: LlmConfig::default(),
            activity,
        }
    }

    /// Wrap an arbitrary strategy; used to inject test doubles.
    pub fn with_interpreter(
        interpreter: Arc<dyn CommandInterpreter>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            active: RwLock::new(Active {
                interpreter,
                credential_configured: false,
            }),
            llm: LlmConfig::default(),
            activity,
        }
    }

    /// Install a credential and switch to the delegated strategy.
    pub async fn set_credential(&self, api_key: &str) -> Result<(), LlmError> {
        let interpreter = build_delegated(&self.llm, api_key, self.activity.clone())?;

        let mut active = self.active.write().await;
        *active = Active {
            interpreter: Arc::new(interpreter),
            credential_configured: true,
        };
        drop(active);

        info!(model = %self.llm.model, "remote interpreter credential updated");
        self.activity.record(ActivityEntry::new(
            ActivityLevel::Info,
            ActivityCategory::System,
            format!("remote interpreter enabled ({})", self.llm.model),
        ));
        Ok(())
    }

    pub async fn status(&self) -> InterpreterStatus {
        let active = self.active.read().await;
        InterpreterStatus {
            strategy: active.interpreter.name().to_string(),
            model: active
                .credential_configured
                .then(|| self.llm.model.clone()),
            credential_configured: active.credential_configured,
            fallback: "pattern",
        }
    }

    async fn current(&self) -> Arc<dyn CommandInterpreter> {
        self.active.read().await.interpreter.clone()
    }
}

#[async_trait]
impl CommandInterpreter for InterpreterSwitch {
    async fn interpret(&self, text: &str) -> ParsedCommand {
        // The lock is released before the (possibly slow) interpretation.
        let interpreter = self.current().await;
        interpreter.interpret(text).await
    }

    fn name(&self) -> &str {
        "switch"
    }
}

fn pattern_active() -> Active {
    Active {
        interpreter: Arc::new(PatternInterpreter::new()),
        credential_configured: false,
    }
}

fn build_delegated(
    llm: &LlmConfig,
    api_key: &str,
    activity: Arc<ActivityLog>,
) -> Result<DelegatedInterpreter, LlmError> {
    let provider = AnthropicProvider::new(api_key, &llm.model, &llm.base_url)?;
    Ok(DelegatedInterpreter::new(
        Arc::new(provider),
        CallPolicy::new(llm.timeout(), llm.max_retries),
        llm.max_tokens,
    )
    .with_activity(activity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operation;

    #[tokio::test]
    async fn without_key_the_pattern_strategy_is_active() {
        let switch = InterpreterSwitch::from_config(&LlmConfig::default(), Arc::new(ActivityLog::default()));
        let status = switch.status().await;
        assert_eq!(status.strategy, "pattern");
        assert!(!status.credential_configured);
        assert_eq!(status.model, None);

        let cmd = switch.interpret("홍길동의 데이터를 막대그래프로").await;
        assert_eq!(cmd.operation, Operation::Chart);
    }

    #[tokio::test]
    async fn setting_a_credential_switches_strategy() {
        let activity = Arc::new(ActivityLog::default());
        let switch = InterpreterSwitch::pattern_only(activity.clone());

        switch.set_credential("sk-test").await.unwrap();
        let status = switch.status().await;
        assert_eq!(status.strategy, "delegated");
        assert!(status.credential_configured);
        assert_eq!(status.model.as_deref(), Some(LlmConfig::default().model.as_str()));
        assert_eq!(activity.len(), 1);
    }

    #[tokio::test]
    async fn blank_credential_is_rejected() {
        let switch = InterpreterSwitch::pattern_only(Arc::new(ActivityLog::default()));
        assert!(matches!(
            switch.set_credential("   ").await,
            Err(LlmError::NotConfigured)
        ));
        assert_eq!(switch.status().await.strategy, "pattern");
    }
}
