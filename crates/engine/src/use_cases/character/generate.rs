//! Generate one character profile.

use std::sync::Arc;

use npcgen_domain::{CharacterProfile, WorldTemplate};

use crate::infrastructure::generation_client::GenerationClient;
use crate::infrastructure::ports::RandomPort;
use crate::use_cases::prompt_builder::{self, PromptOverrides};
use crate::use_cases::response_validator;

use super::{GenerationError, RetryPolicy};

/// World + overrides → prompt → one gated completion → validated profile.
pub struct GenerateCharacter {
    client: GenerationClient,
    random: Arc<dyn RandomPort>,
}

impl GenerateCharacter {
    pub fn new(client: GenerationClient, random: Arc<dyn RandomPort>) -> Self {
        Self { client, random }
    }

    pub async fn execute(
        &self,
        world: &WorldTemplate,
        overrides: &PromptOverrides,
        policy: &RetryPolicy,
    ) -> Result<CharacterProfile, GenerationError> {
        let prompt = prompt_builder::build(world, overrides);
        let attempts = policy.attempts();

        let mut attempt = 1;
        loop {
            match self.attempt(&prompt).await {
                Ok(profile) => {
                    if attempt > 1 {
                        tracing::info!(attempt, name = %profile.name, "Character generated after retry");
                    }
                    return Ok(profile);
                }
                Err(e) if attempt < attempts && RetryPolicy::is_retryable(&e) => {
                    let delay = policy.delay_after(attempt, self.random.as_ref());
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Character generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<CharacterProfile, GenerationError> {
        let raw = self.client.generate_character(prompt).await?;
        Ok(response_validator::validate(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::admission::AdmissionGate;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::generation_client::UpstreamError;
    use crate::infrastructure::ports::{LlmError, MockImageGenPort};
    use crate::test_fixtures::image_mocks::ScriptedLlm;
    use crate::test_fixtures::{profile_response, sample_world};

    fn use_case(llm: Arc<ScriptedLlm>) -> GenerateCharacter {
        let client = GenerationClient::new(
            llm.clone(),
            llm,
            Arc::new(MockImageGenPort::new()),
            Arc::new(AdmissionGate::new(2)),
        );
        GenerateCharacter::new(client, Arc::new(FixedRandom(0)))
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            base_delay_ms: 1,
            max_delay_ms: 1,
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn when_model_returns_valid_json_then_profile_is_returned() {
        let llm = Arc::new(ScriptedLlm::replying(&profile_response("Aulus Varro")));
        let overrides = PromptOverrides::default()
            .with_personalities(vec!["brave".to_string(), "cynical".to_string()]);

        let profile = use_case(llm.clone())
            .execute(&sample_world(), &overrides, &RetryPolicy::default())
            .await
            .expect("profile");

        assert_eq!(profile.name, "Aulus Varro");
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0].content.contains("brave, cynical"));
    }

    #[tokio::test]
    async fn when_output_is_malformed_then_validation_error_keeps_raw() {
        let llm = Arc::new(ScriptedLlm::replying("{not valid json"));
        let err = use_case(llm)
            .execute(&sample_world(), &PromptOverrides::default(), &RetryPolicy::default())
            .await
            .expect_err("malformed");
        match err {
            GenerationError::Validation(v) => assert_eq!(v.raw, "{not valid json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn when_retry_allowed_then_second_attempt_succeeds() {
        let llm = Arc::new(ScriptedLlm::new([
            Ok("{not valid json".to_string()),
            Ok(profile_response("Livia")),
        ]));
        let profile = use_case(llm.clone())
            .execute(&sample_world(), &PromptOverrides::default(), &fast_policy(3))
            .await
            .expect("second attempt");
        assert_eq!(profile.name, "Livia");
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn when_error_is_not_retryable_then_single_attempt() {
        let llm = Arc::new(ScriptedLlm::new([Err(LlmError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        })]));
        let err = use_case(llm.clone())
            .execute(&sample_world(), &PromptOverrides::default(), &fast_policy(3))
            .await
            .expect_err("unauthorized");
        assert!(matches!(
            err,
            GenerationError::Upstream(UpstreamError::Status { status: 401, .. })
        ));
        assert_eq!(llm.requests().len(), 1);
    }
}
