//! Composition root: wires the writer to the configured adapters and
//! persists the session between commands.

use std::fs::OpenOptions;
use std::cell::OnceCell;
use std::io::Write as _;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context};

use bookjibe_core::ports::{LlmPort, PromptPort, StoragePort};
use bookjibe_core::{
    create_writer_from_book_data, parse_upload, GeneratedPrompt, PromptGenerator, SessionStore,
    Writer, WriterSettings,
};
use bookjibe_platform::prompts::STORY_PROMPT_SUFFIX;
use bookjibe_platform::storage::open_state_storage;
use bookjibe_platform::{FsPromptLibrary, OpenAiCompatProvider};
use bookjibe_types::{book::ChapterVersions, config::BookjibeConfig, session::PromptTemplate};

/// What happened to a generated chapter
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome {
    Accepted { chapter: u32, choice: u8 },
    Discarded { chapter: u32 },
}

pub struct BookApp {
    config: BookjibeConfig,
    settings: WriterSettings,
    llm: OnceCell<Rc<dyn LlmPort>>,
    prompts: FsPromptLibrary,
    generator_prompts: FsPromptLibrary,
    sessions: SessionStore,
    session_key: String,
}

impl BookApp {
    pub fn new(
        config: BookjibeConfig,
        session_key: impl Into<String>,
        storage: Rc<dyn StoragePort>,
    ) -> Self {
        log::debug!("Session storage backend: {}", storage.backend_name());
        Self {
            settings: WriterSettings::from(&config),
            prompts: FsPromptLibrary::new(&config.folders.prompts),
            generator_prompts: FsPromptLibrary::new(&config.folders.prompt_generator),
            sessions: SessionStore::new(storage),
            session_key: session_key.into(),
            llm: OnceCell::new(),
            config,
        }
    }

    /// App whose session lives in the configured state folder.
    pub fn open(config: BookjibeConfig, session_key: impl Into<String>) -> anyhow::Result<Self> {
        let storage = open_state_storage(&config.folders.state)?;
        Ok(Self::new(config, session_key, storage))
    }

    /// Use `llm` instead of building a provider from the configuration.
    pub fn with_llm(self, llm: Rc<dyn LlmPort>) -> Self {
        let _ = self.llm.set(llm);
        self
    }

    /// The generation client, built on first use so offline commands never
    /// depend on the provider settings.
    fn llm(&self) -> anyhow::Result<Rc<dyn LlmPort>> {
        if let Some(llm) = self.llm.get() {
            return Ok(llm.clone());
        }
        if self.config.llm.api_key.is_empty() {
            log::warn!("OPENAI_API_KEY is not set; generation requests will be rejected");
        }
        let llm: Rc<dyn LlmPort> = Rc::new(OpenAiCompatProvider::new(self.config.llm.clone())?);
        let _ = self.llm.set(llm.clone());
        Ok(llm)
    }

    // ─── Session plumbing ────────────────────────────────────

    async fn load_writer(&self) -> anyhow::Result<Writer> {
        match self.sessions.load(&self.session_key).await? {
            Some(session) => Ok(Writer::from_session(session, self.settings.clone())),
            None => {
                log::info!("No stored session {:?}, starting an empty book", self.session_key);
                Ok(Writer::new(self.settings.clone()))
            }
        }
    }

    async fn store_writer(&self, writer: &Writer) -> anyhow::Result<()> {
        self.sessions.save(&self.session_key, writer.session()).await?;
        Ok(())
    }

    // ─── Commands ────────────────────────────────────────────

    pub async fn prompts(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.prompts.list_prompts(STORY_PROMPT_SUFFIX).await?)
    }

    pub async fn models(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.llm()?.list_models().await?)
    }

    /// Start a fresh book and return its synopsis.
    pub async fn init(&self, prompt_file: &str, description: &str) -> anyhow::Result<String> {
        let llm = self.llm()?;
        let mut writer = Writer::new(self.settings.clone());
        let synopsis = writer
            .generate_book_story(llm.as_ref(), &self.prompts, prompt_file, description)
            .await?;
        self.store_writer(&writer).await?;
        Ok(synopsis)
    }

    /// Generate two versions of a chapter, log both to the draft file and
    /// commit the one `choose` picks. Choice 0 keeps neither.
    pub async fn chapter<F>(
        &self,
        description: &str,
        number: Option<u32>,
        choose: F,
    ) -> anyhow::Result<ChapterOutcome>
    where
        F: FnOnce(&ChapterVersions) -> anyhow::Result<u8>,
    {
        let mut writer = self.load_writer().await?;
        let chapter = number.unwrap_or_else(|| writer.get_last_chapter_number() + 1);
        if writer.get_chapter_ai_message(chapter).is_some() {
            bail!("Chapter {} is already written", chapter);
        }

        let llm = self.llm()?;
        let versions = writer
            .generate_chapter_versions(llm.as_ref(), description, chapter)
            .await?;
        self.log_draft(&versions)?;

        match choose(&versions)? {
            0 => {
                log::info!("Both versions of chapter {} discarded", chapter);
                Ok(ChapterOutcome::Discarded { chapter })
            }
            choice => {
                writer.accept_version(&versions, choice)?;
                self.store_writer(&writer).await?;
                Ok(ChapterOutcome::Accepted { chapter, choice })
            }
        }
    }

    fn log_draft(&self, versions: &ChapterVersions) -> anyhow::Result<()> {
        let dir = &self.config.folders.temporary;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating draft folder {}", dir.display()))?;
        let path = dir.join(format!("chapter{}.txt", versions.chapter));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening draft file {}", path.display()))?;
        file.write_all(versions.render_draft().as_bytes())
            .with_context(|| format!("writing draft file {}", path.display()))?;
        log::debug!("Chapter {} versions logged to {}", versions.chapter, path.display());
        Ok(())
    }

    /// Chapter `n`, the synopsis for 0, or an overview without a number.
    pub async fn show(&self, number: Option<u32>) -> anyhow::Result<String> {
        let writer = self.load_writer().await?;
        match number {
            Some(0) => writer
                .synopsis()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("The book has no synopsis yet")),
            Some(n) => writer
                .get_chapter_ai_message(n)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Chapter {} is not written", n)),
            None => {
                let chapters = writer.chapter_numbers();
                let synopsis = if writer.synopsis().is_some() { "yes" } else { "no" };
                let list = if chapters.is_empty() {
                    "none".to_string()
                } else {
                    chapters.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
                };
                Ok(format!("Synopsis: {}\nChapters: {}", synopsis, list))
            }
        }
    }

    /// Replace the session with an imported book; returns the section count.
    pub async fn import(&self, path: &Path) -> anyhow::Result<usize> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let book = parse_upload(&contents, filename)?;
        let writer =
            create_writer_from_book_data(&book, PromptTemplate::default(), self.settings.clone());
        self.store_writer(&writer).await?;
        Ok(book.len())
    }

    pub async fn save_book(&self, path: &Path) -> anyhow::Result<()> {
        self.load_writer().await?.save_book_to_file(path)?;
        Ok(())
    }

    pub async fn save_history(&self, path: &Path) -> anyhow::Result<()> {
        self.load_writer().await?.save_history_to_file(path)?;
        Ok(())
    }

    pub async fn load_history(&self, path: &Path, keep: Option<u32>) -> anyhow::Result<usize> {
        let mut writer = self.load_writer().await?;
        let loaded = writer.extend_from_history_file(path, keep)?;
        self.store_writer(&writer).await?;
        Ok(loaded)
    }

    pub async fn generate_prompt(
        &self,
        fragment: &str,
        text: &str,
        output: &str,
    ) -> anyhow::Result<GeneratedPrompt> {
        let llm = self.llm()?;
        let generator = PromptGenerator::new(self.settings.clone());
        let generated = generator
            .generate(
                llm.as_ref(),
                &self.generator_prompts,
                &self.prompts,
                fragment,
                text,
                output,
            )
            .await?;
        Ok(generated)
    }

    pub async fn restart(&self) -> anyhow::Result<()> {
        self.sessions.clear(&self.session_key).await?;
        log::info!("Session {:?} cleared", self.session_key);
        Ok(())
    }
}
