//! Interpreter - Execute Effects in a Plan through a Provider

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resource::{ResourceId, State};

/// Result of executing a single Effect
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete and re-create succeeded
    Replaced { state: State },
    /// Delete succeeded
    Deleted { id: ResourceId },
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

/// Result of executing the entire Plan
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Resources whose Replace deleted the old instance before the create failed
    pub removed: Vec<ResourceId>,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan) -> ApplyResult {
        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut removed = Vec::new();

        for effect in plan.effects() {
            log::info!("{} {}", effect.kind(), effect.resource_id());
            let result = self.execute_effect(effect, &mut removed).await;

            match &result {
                Ok(_) => success_count += 1,
                Err(e) => {
                    log::warn!("{} {} failed: {}", effect.kind(), effect.resource_id(), e);
                    failure_count += 1;
                    if !self.config.continue_on_error {
                        outcomes.push(result);
                        break;
                    }
                }
            }

            outcomes.push(result);
        }

        ApplyResult {
            outcomes,
            success_count,
            failure_count,
            removed,
        }
    }

    /// Execute a single Effect
    async fn execute_effect(
        &self,
        effect: &Effect,
        removed: &mut Vec<ResourceId>,
    ) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        match effect {
            Effect::Read(id) => {
                let state = self.provider.read(id, None).await?;
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(resource) => {
                let state = self.provider.create(resource).await?;
                Ok(EffectOutcome::Created { state })
            }
            Effect::Update { id, from, to, .. } => {
                let identifier = require_identifier(from)?;
                let state = self.provider.update(id, identifier, from, to).await?;
                Ok(EffectOutcome::Updated { state })
            }
            Effect::Replace { id, from, to, .. } => {
                let identifier = require_identifier(from)?;
                self.provider.delete(id, identifier).await?;
                match self.provider.create(to).await {
                    Ok(state) => Ok(EffectOutcome::Replaced { state }),
                    Err(e) => {
                        removed.push(id.clone());
                        Err(e)
                    }
                }
            }
            Effect::Delete(state) => {
                let identifier = require_identifier(state)?;
                self.provider.delete(&state.id, identifier).await?;
                Ok(EffectOutcome::Deleted {
                    id: state.id.clone(),
                })
            }
        }
    }
}

fn require_identifier(state: &State) -> ProviderResult<&str> {
    state.identifier.as_deref().ok_or_else(|| {
        ProviderError::new("No identifier recorded for resource").for_resource(state.id.clone())
    })
}
