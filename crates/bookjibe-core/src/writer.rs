//! The book writer. Owns one session's transcript.
//!
//! Every generation call is built from a snapshot of the committed turns, so
//! chapter candidates never leak into the transcript or into each other.
//! Only `generate_book_story` and `add_chapter_to_book_as_messages` (and the
//! bulk loaders) grow the transcript.

use std::path::Path;

use bookjibe_types::{
    book::{ChapterCandidate, ChapterVersions, HistoryRecord, SectionPair},
    config::{BookjibeConfig, Language},
    session::{PromptTemplate, Session},
    turn::{Role, SectionLabel, Turn},
    BookError, Result,
};

use crate::ports::{ChatRequest, LlmPort, PromptPort};

/// Generation parameters a writer sends with every request
#[derive(Debug, Clone, PartialEq)]
pub struct WriterSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub language: Language,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self::from(&BookjibeConfig::default())
    }
}

impl From<&BookjibeConfig> for WriterSettings {
    fn from(config: &BookjibeConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            language: config.language,
        }
    }
}

pub struct Writer {
    session: Session,
    settings: WriterSettings,
}

impl Writer {
    pub fn new(settings: WriterSettings) -> Self {
        Self::from_session(Session::default(), settings)
    }

    pub fn with_template(template: PromptTemplate, settings: WriterSettings) -> Self {
        Self::from_session(Session::new(template), settings)
    }

    pub fn from_session(session: Session, settings: WriterSettings) -> Self {
        Self { session, settings }
    }

    pub fn from_token(token: &str, settings: WriterSettings) -> Result<Self> {
        Ok(Self::from_session(Session::from_token(token)?, settings))
    }

    pub fn to_token(&self) -> Result<String> {
        self.session.to_token()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn turns(&self) -> &[Turn] {
        &self.session.turns
    }

    /// Start over with an empty transcript and the same template.
    pub fn reset(&mut self) {
        self.session = Session::new(self.session.template.clone());
    }

    fn build_request(&self, input: &str, context: &[String]) -> ChatRequest {
        let mut messages = self.session.turns.clone();
        messages.push(Turn::human(input));
        ChatRequest {
            system: self.session.template.render(context),
            messages,
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    fn push_pair(&mut self, label: Option<SectionLabel>, human: String, ai: String) {
        let mut human = Turn::human(human);
        let mut ai = Turn::assistant(ai);
        human.label = label.clone();
        ai.label = label;
        self.session.turns.push(human);
        self.session.turns.push(ai);
        self.session.touch();
    }

    // ─── Generation ──────────────────────────────────────────

    /// Generate the book synopsis from a stored story starter and the user's
    /// description. The exchange is appended unlabelled.
    pub async fn generate_book_story(
        &mut self,
        llm: &dyn LlmPort,
        prompts: &dyn PromptPort,
        prompt_file: &str,
        description: &str,
    ) -> Result<String> {
        log::info!("Generating book story from prompt file {}", prompt_file);
        let fragment = prompts.load_prompt(prompt_file).await?;
        let input = format!("{} {}", fragment.trim_end(), description);

        let request = self.build_request(&input, &[]);
        let response = llm.chat_completion(request).await?;
        log::debug!("Book story generated ({} chars)", response.text.len());

        self.push_pair(None, input, response.text.clone());
        Ok(response.text)
    }

    /// Generate two independent versions of a chapter. Nothing is committed;
    /// pass the result to `accept_version` to keep one of them.
    pub async fn generate_chapter_versions(
        &self,
        llm: &dyn LlmPort,
        prompt: &str,
        chapter_number: u32,
    ) -> Result<ChapterVersions> {
        if chapter_number == 0 {
            return Err(BookError::InvalidChapter(chapter_number));
        }
        let instruction = self.settings.language.chapter_instruction(chapter_number);
        let input = format!("{} {}", instruction, prompt);
        let context = vec![prompt.to_string()];

        log::info!("Generating two versions of chapter {}", chapter_number);
        let first = self.generate_candidate(llm, &input, &context).await?;
        let second = self.generate_candidate(llm, &input, &context).await?;

        Ok(ChapterVersions {
            chapter: chapter_number,
            candidates: [first, second],
        })
    }

    async fn generate_candidate(
        &self,
        llm: &dyn LlmPort,
        input: &str,
        context: &[String],
    ) -> Result<ChapterCandidate> {
        let request = self.build_request(input, context);
        let response = llm.chat_completion(request).await?;
        Ok(ChapterCandidate {
            human_message: input.to_string(),
            ai_message: response.text,
        })
    }

    // ─── Committing chapters ─────────────────────────────────

    /// Append a chosen chapter as a labelled human/assistant pair.
    pub fn add_chapter_to_book_as_messages(
        &mut self,
        chapter_number: u32,
        human_message: impl Into<String>,
        ai_message: impl Into<String>,
    ) -> Result<()> {
        if chapter_number == 0 {
            return Err(BookError::InvalidChapter(chapter_number));
        }
        if self.has_chapter(chapter_number) {
            return Err(BookError::DuplicateChapter(chapter_number));
        }
        self.push_pair(
            Some(SectionLabel::Chapter(chapter_number)),
            human_message.into(),
            ai_message.into(),
        );
        log::info!("Chapter {} added to the book", chapter_number);
        Ok(())
    }

    /// Commit version 1 or 2 of a generated chapter.
    pub fn accept_version(&mut self, versions: &ChapterVersions, choice: u8) -> Result<()> {
        let candidate = versions
            .candidate(choice)
            .ok_or(BookError::InvalidChoice(choice))?;
        self.add_chapter_to_book_as_messages(
            versions.chapter,
            candidate.human_message.clone(),
            candidate.ai_message.clone(),
        )
    }

    /// Append a labelled pair without any validation. Used when rebuilding a
    /// transcript from imported data.
    pub fn push_section(&mut self, label: SectionLabel, pair: SectionPair) {
        self.push_pair(Some(label), pair.human_message, pair.ai_message);
    }

    // ─── Queries ─────────────────────────────────────────────

    fn has_chapter(&self, n: u32) -> bool {
        self.session.turns.iter().any(|t| t.chapter_number() == Some(n))
    }

    /// Highest labelled chapter number; 0 when no turn carries a chapter label.
    pub fn get_last_chapter_number(&self) -> u32 {
        self.session
            .turns
            .iter()
            .filter_map(Turn::chapter_number)
            .max()
            .unwrap_or(0)
    }

    fn chapter_text(&self, n: u32, role: Role) -> Option<&str> {
        self.session
            .turns
            .iter()
            .find(|t| t.role == role && t.chapter_number() == Some(n))
            .map(|t| t.text.as_str())
    }

    pub fn get_chapter_ai_message(&self, n: u32) -> Option<&str> {
        self.chapter_text(n, Role::Assistant)
    }

    pub fn get_chapter_human_message(&self, n: u32) -> Option<&str> {
        self.chapter_text(n, Role::Human)
    }

    /// Labelled chapter numbers in transcript order
    pub fn chapter_numbers(&self) -> Vec<u32> {
        self.session
            .turns
            .iter()
            .filter(|t| t.is_assistant())
            .filter_map(Turn::chapter_number)
            .collect()
    }

    /// The synopsis text: the assistant turn labelled `synopsis`, or the
    /// first assistant turn of an unlabelled opening.
    pub fn synopsis(&self) -> Option<&str> {
        let turns = &self.session.turns;
        turns
            .iter()
            .find(|t| t.is_assistant() && t.label == Some(SectionLabel::Synopsis))
            .or_else(|| turns.iter().find(|t| t.is_assistant()).filter(|t| t.label.is_none()))
            .map(|t| t.text.as_str())
    }

    // ─── Export ──────────────────────────────────────────────

    /// Every assistant turn, in order, newline-joined.
    pub fn book_text(&self) -> String {
        self.session
            .turns
            .iter()
            .filter(|t| t.is_assistant())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn save_book_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.book_text()).map_err(|e| BookError::io(path, e))?;
        log::info!("Book saved to {}", path.display());
        Ok(())
    }

    /// The transcript as section → pair.
    ///
    /// Pairs are keyed by their own label. An unlabelled opening pair is the
    /// synopsis; other unlabelled pairs take the next chapter number after
    /// the last one written.
    pub fn history(&self) -> HistoryRecord {
        let mut history = HistoryRecord::new();
        let mut next_chapter = 1;
        let turns = &self.session.turns;

        for (i, turn) in turns.iter().enumerate() {
            if !turn.is_assistant() {
                continue;
            }
            let human = match i.checked_sub(1).map(|p| &turns[p]) {
                Some(prev) if prev.role == Role::Human => prev.text.clone(),
                _ => String::new(),
            };
            let label = match &turn.label {
                Some(label) => label.clone(),
                None if history.is_empty() => SectionLabel::Synopsis,
                None => SectionLabel::Chapter(next_chapter),
            };
            if let SectionLabel::Chapter(n) = label {
                next_chapter = n + 1;
            }
            history.push(label, SectionPair::new(human, turn.text.clone()));
        }
        history
    }

    pub fn save_history_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.history())?;
        std::fs::write(path, json).map_err(|e| BookError::io(path, e))?;
        log::info!("History saved to {}", path.display());
        Ok(())
    }

    // ─── Bulk loading ────────────────────────────────────────

    /// Append the sections of a saved history. With `keep_chapters`, loading
    /// stops at the first chapter past that number. A section whose key is
    /// already in `history()` (a chapter, or the synopsis of an unlabelled
    /// opening) is rejected before anything is appended.
    pub fn extend_from_history(
        &mut self,
        history: &HistoryRecord,
        keep_chapters: Option<u32>,
    ) -> Result<usize> {
        let kept: Vec<_> = history
            .sections
            .iter()
            .take_while(|s| match (s.label.chapter_number(), keep_chapters) {
                (Some(n), Some(keep)) => n <= keep,
                _ => true,
            })
            .collect();

        // every section key, the synopsis included, stays unique in history()
        let mut taken: Vec<SectionLabel> =
            self.history().sections.into_iter().map(|s| s.label).collect();
        for section in &kept {
            if taken.contains(&section.label) {
                return Err(match &section.label {
                    SectionLabel::Chapter(n) => BookError::DuplicateChapter(*n),
                    label => BookError::DuplicateSection(label.to_string()),
                });
            }
            taken.push(section.label.clone());
        }

        for section in &kept {
            self.push_section(section.label.clone(), section.pair.clone());
        }
        log::info!("Loaded {} sections from history", kept.len());
        Ok(kept.len())
    }

    pub fn extend_from_history_file(
        &mut self,
        path: impl AsRef<Path>,
        keep_chapters: Option<u32>,
    ) -> Result<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BookError::io(path, e))?;
        let history: HistoryRecord =
            serde_json::from_str(&raw).map_err(|e| BookError::ImportParse(e.to_string()))?;
        self.extend_from_history(&history, keep_chapters)
    }
}
