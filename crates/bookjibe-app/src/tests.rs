#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::rc::Rc;

    use async_trait::async_trait;
    use clap::Parser;
    use futures::executor::block_on;

    use bookjibe_core::ports::{ChatRequest, ChatResponse, LlmPort};
    use bookjibe_platform::storage::MemoryStorage;
    use bookjibe_types::{
        config::{BookjibeConfig, LlmProvider},
        BookError, Result,
    };

    use crate::app::{BookApp, ChapterOutcome};
    use crate::cli::{Cli, Command};

    struct QueueLlm {
        replies: RefCell<VecDeque<String>>,
    }

    impl QueueLlm {
        fn new(replies: &[&str]) -> Rc<Self> {
            Rc::new(Self {
                replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
            })
        }
    }

    #[async_trait(?Send)]
    impl LlmPort for QueueLlm {
        async fn chat_completion(&self, _req: ChatRequest) -> Result<ChatResponse> {
            let text = self
                .replies
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| BookError::Generation("no reply queued".to_string()))?;
            Ok(ChatResponse { text, usage: None })
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["gpt-3.5-turbo".to_string()])
        }
    }

    fn config_in(root: &Path) -> BookjibeConfig {
        let mut config = BookjibeConfig::default();
        config.folders.prompts = root.join("prompts");
        config.folders.prompt_generator = root.join("generator");
        config.folders.temporary = root.join("tmp");
        config.folders.state = root.join("state");
        std::fs::create_dir_all(&config.folders.prompts).unwrap();
        std::fs::create_dir_all(&config.folders.prompt_generator).unwrap();
        std::fs::write(
            config.folders.prompts.join("space_prompt.txt"),
            "Write the synopsis of a space opera.",
        )
        .unwrap();
        std::fs::write(
            config.folders.prompt_generator.join("starter.txt"),
            "Write a story starter prompt about:",
        )
        .unwrap();
        config
    }

    fn app_with(root: &Path, replies: &[&str]) -> BookApp {
        BookApp::new(config_in(root), "test", Rc::new(MemoryStorage::new()))
            .with_llm(QueueLlm::new(replies))
    }

    fn write_book_csv(path: &Path) {
        std::fs::write(
            path,
            "section,human_message,ai_message\nsynopsis,s,The premise\nchapter1,c1,\"One, begun\"\n",
        )
        .unwrap();
    }

    // ─── CLI parsing ─────────────────────────────────────────

    #[test]
    fn test_cli_parses_chapter() {
        let cli = Cli::try_parse_from([
            "bookjibe", "--session", "novel", "chapter", "--number", "3", "--description", "A duel",
        ])
        .unwrap();
        assert_eq!(cli.session, "novel");
        assert_eq!(
            cli.command,
            Command::Chapter {
                description: Some("A duel".to_string()),
                number: Some(3),
            }
        );
    }

    #[test]
    fn test_cli_defaults_session() {
        let cli = Cli::try_parse_from(["bookjibe", "load-history", "h.json", "--keep", "2"]).unwrap();
        assert_eq!(cli.session, "default");
        assert!(matches!(cli.command, Command::LoadHistory { keep: Some(2), .. }));
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["bookjibe", "publish"]).is_err());
    }

    // ─── Commands ────────────────────────────────────────────

    #[test]
    fn test_prompts_and_models() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &[]);
        assert_eq!(block_on(app.prompts()).unwrap(), vec!["space_prompt.txt"]);
        assert_eq!(block_on(app.models()).unwrap(), vec!["gpt-3.5-turbo"]);
    }

    #[test]
    fn test_init_then_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &["Synopsis", "1a", "1b", "2a", "2b"]);

        let synopsis = block_on(app.init("space_prompt.txt", "Pirates in orbit")).unwrap();
        assert_eq!(synopsis, "Synopsis");

        let outcome = block_on(app.chapter("Boarding", None, |_| Ok(2))).unwrap();
        assert_eq!(outcome, ChapterOutcome::Accepted { chapter: 1, choice: 2 });
        let outcome = block_on(app.chapter("Escape", None, |_| Ok(1))).unwrap();
        assert_eq!(outcome, ChapterOutcome::Accepted { chapter: 2, choice: 1 });

        assert_eq!(block_on(app.show(None)).unwrap(), "Synopsis: yes\nChapters: 1, 2");
        assert_eq!(block_on(app.show(Some(0))).unwrap(), "Synopsis");
        assert_eq!(block_on(app.show(Some(1))).unwrap(), "1b");
        assert!(block_on(app.show(Some(9))).is_err());
    }

    #[test]
    fn test_chapter_discard_keeps_draft_only() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &["first", "second"]);

        let outcome = block_on(app.chapter("Opening", None, |versions| {
            assert_eq!(versions.candidates[0].ai_message, "first");
            assert_eq!(versions.candidates[1].ai_message, "second");
            Ok(0)
        }))
        .unwrap();
        assert_eq!(outcome, ChapterOutcome::Discarded { chapter: 1 });
        assert_eq!(block_on(app.show(None)).unwrap(), "Synopsis: no\nChapters: none");

        let draft = std::fs::read_to_string(dir.path().join("tmp").join("chapter1.txt")).unwrap();
        assert!(draft.starts_with("Chapter 1\nVersion 1:\nfirst"));
        assert!(draft.contains("Version 2:\nsecond"));
    }

    #[test]
    fn test_chapter_rejects_written_number() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &["a", "b"]);
        block_on(app.chapter("One", Some(1), |_| Ok(1))).unwrap();
        assert!(block_on(app.chapter("One again", Some(1), |_| Ok(1))).is_err());
    }

    #[test]
    fn test_import_save_and_restart() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &[]);
        let book = dir.path().join("book.csv");
        write_book_csv(&book);

        assert_eq!(block_on(app.import(&book)).unwrap(), 2);

        let out = dir.path().join("book.txt");
        block_on(app.save_book(&out)).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "The premise\nOne, begun");

        let history = dir.path().join("history.json");
        block_on(app.save_history(&history)).unwrap();

        block_on(app.restart()).unwrap();
        assert_eq!(block_on(app.show(None)).unwrap(), "Synopsis: no\nChapters: none");

        assert_eq!(block_on(app.load_history(&history, None)).unwrap(), 2);
        assert_eq!(block_on(app.show(Some(1))).unwrap(), "One, begun");
    }

    #[test]
    fn test_generate_prompt_lands_among_starters() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), &["draft text", "final text"]);

        let generated = block_on(app.generate_prompt("starter.txt", "a heist", "heist")).unwrap();
        assert_eq!(generated.prompt, "final text");

        assert_eq!(
            block_on(app.prompts()).unwrap(),
            vec!["heist_prompt.txt", "space_prompt.txt"]
        );
        let draft = std::fs::read_to_string(dir.path().join("prompts").join("heist_draft.txt")).unwrap();
        assert_eq!(draft, "draft text");
    }

    // ─── Wiring ──────────────────────────────────────────────

    #[test]
    fn test_open_refuses_state_path_that_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.folders.state, "not a folder").unwrap();

        match BookApp::open(config, "test") {
            Err(e) => assert!(e.to_string().contains("state folder"), "{}", e),
            Ok(_) => panic!("opened an app without persistent storage"),
        }
    }

    #[test]
    fn test_open_keeps_session_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("book.csv");
        write_book_csv(&book);

        let first = BookApp::open(config_in(dir.path()), "novel").unwrap();
        block_on(first.import(&book)).unwrap();
        drop(first);

        let second = BookApp::open(config_in(dir.path()), "novel").unwrap();
        assert_eq!(block_on(second.show(None)).unwrap(), "Synopsis: yes\nChapters: 1");
    }

    #[test]
    fn test_offline_commands_ignore_provider_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.llm.provider = LlmProvider::Custom;
        config.llm.api_base = None;
        let app = BookApp::new(config, "test", Rc::new(MemoryStorage::new()));

        let book = dir.path().join("book.csv");
        write_book_csv(&book);
        assert_eq!(block_on(app.import(&book)).unwrap(), 2);
        assert_eq!(block_on(app.show(Some(1))).unwrap(), "One, begun");
        block_on(app.save_book(&dir.path().join("book.txt"))).unwrap();
        block_on(app.restart()).unwrap();

        let err = block_on(app.init("space_prompt.txt", "Pirates")).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_BASE"), "{}", err);
    }
}
