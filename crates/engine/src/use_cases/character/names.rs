//! Suggest NPC names for an environment.

use npcgen_domain::WorldTemplate;

use crate::infrastructure::generation_client::GenerationClient;
use crate::use_cases::prompt_builder;
use crate::use_cases::response_validator;

use super::GenerationError;

pub const MAX_NAMES: usize = 100;

pub struct SuggestNames {
    client: GenerationClient,
}

impl SuggestNames {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    /// Up to `amount` distinct names. The model may return fewer after de-duplication.
    pub async fn execute(
        &self,
        world: &WorldTemplate,
        amount: usize,
    ) -> Result<Vec<String>, GenerationError> {
        if amount == 0 || amount > MAX_NAMES {
            return Err(GenerationError::InvalidRequest(format!(
                "amount must be between 1 and {}",
                MAX_NAMES
            )));
        }
        let prompt = prompt_builder::build_names_prompt(world, amount);
        let raw = self.client.generate_names(&prompt).await?;
        let mut names = response_validator::validate_names(&raw)?;
        names.truncate(amount);
        tracing::debug!(requested = amount, returned = names.len(), "Suggested names");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::infrastructure::admission::AdmissionGate;
    use crate::infrastructure::ports::MockImageGenPort;
    use crate::test_fixtures::image_mocks::ScriptedLlm;
    use crate::test_fixtures::sample_world;

    fn use_case(llm: Arc<ScriptedLlm>) -> SuggestNames {
        SuggestNames::new(GenerationClient::new(
            llm.clone(),
            llm,
            Arc::new(MockImageGenPort::new()),
            Arc::new(AdmissionGate::new(1)),
        ))
    }

    #[tokio::test]
    async fn when_model_over_delivers_then_list_is_truncated() {
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"names": ["Aulus", "Livia", "Marcus"]}"#,
        ));
        let names = use_case(llm.clone())
            .execute(&sample_world(), 2)
            .await
            .expect("names");
        assert_eq!(names, vec!["Aulus", "Livia"]);
        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.starts_with("Era: Roman Empire, Time Period: 44 BC"));
        assert!(prompt.contains("create 2 unique names"));
    }

    #[tokio::test]
    async fn when_amount_is_zero_then_no_call_is_made() {
        let llm = Arc::new(ScriptedLlm::new([]));
        let err = use_case(llm.clone())
            .execute(&sample_world(), 0)
            .await
            .expect_err("zero");
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
        assert!(llm.requests().is_empty());
    }
}
