//! One-shot story-starter generation.
//!
//! A generator fragment plus free text is sent to the model, which answers
//! with a draft prompt. A fixed agreement phrase then asks it for the final
//! version, which is stored as `<name>_prompt.txt` so it shows up among the
//! selectable story starters.

use bookjibe_types::{session::PromptTemplate, turn::Turn, Result};

use crate::ports::{ChatRequest, LlmPort, PromptPort};
use crate::writer::WriterSettings;

pub const DRAFT_SUFFIX: &str = "_draft.txt";
pub const PROMPT_SUFFIX: &str = "_prompt.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPrompt {
    pub draft_name: String,
    pub draft: String,
    pub prompt_name: String,
    pub prompt: String,
}

pub struct PromptGenerator {
    template: PromptTemplate,
    settings: WriterSettings,
}

impl PromptGenerator {
    pub fn new(settings: WriterSettings) -> Self {
        Self {
            template: PromptTemplate::default(),
            settings,
        }
    }

    fn request(&self, messages: Vec<Turn>) -> ChatRequest {
        ChatRequest {
            system: self.template.render(&[]),
            messages,
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Run both calls and store the draft and the agreed prompt in `target`.
    pub async fn generate(
        &self,
        llm: &dyn LlmPort,
        source: &dyn PromptPort,
        target: &dyn PromptPort,
        fragment_name: &str,
        text: &str,
        output_name: &str,
    ) -> Result<GeneratedPrompt> {
        let fragment = source.load_prompt(fragment_name).await?;
        let mut conversation = vec![Turn::human(format!("{} {}", fragment.trim_end(), text))];

        log::info!("Generating prompt draft from {}", fragment_name);
        let draft = llm.chat_completion(self.request(conversation.clone())).await?.text;
        let draft_name = format!("{}{}", output_name, DRAFT_SUFFIX);
        target.store_prompt(&draft_name, &draft).await?;

        conversation.push(Turn::assistant(draft.clone()));
        conversation.push(Turn::human(self.settings.language.agreement_phrase()));

        log::info!("Asking for the agreed version of {}", output_name);
        let prompt = llm.chat_completion(self.request(conversation)).await?.text;
        let prompt_name = format!("{}{}", output_name, PROMPT_SUFFIX);
        target.store_prompt(&prompt_name, &prompt).await?;

        Ok(GeneratedPrompt {
            draft_name,
            draft,
            prompt_name,
            prompt,
        })
    }
}
