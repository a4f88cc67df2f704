#[cfg(test)]
mod tests {
    use crate::Result;
    use crate::book::*;
    use crate::config::*;
    use crate::error::*;
    use crate::session::*;
    use crate::turn::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    // ─── SectionLabel Tests ──────────────────────────────────

    #[test]
    fn test_label_parses_synopsis() {
        assert_eq!(SectionLabel::from("synopsis"), SectionLabel::Synopsis);
    }

    #[test]
    fn test_label_parses_chapter() {
        assert_eq!(SectionLabel::from("chapter12"), SectionLabel::Chapter(12));
        assert_eq!(SectionLabel::Chapter(12).to_string(), "chapter12");
    }

    #[test]
    fn test_label_non_canonical_chapter_is_other() {
        assert_eq!(
            SectionLabel::from("chapter01"),
            SectionLabel::Other("chapter01".to_string())
        );
        assert_eq!(
            SectionLabel::from("chapter0"),
            SectionLabel::Other("chapter0".to_string())
        );
        assert_eq!(
            SectionLabel::from("chapterX"),
            SectionLabel::Other("chapterX".to_string())
        );
    }

    #[test]
    fn test_label_serializes_as_string() {
        let json = serde_json::to_string(&SectionLabel::Chapter(3)).unwrap();
        assert_eq!(json, "\"chapter3\"");
        let back: SectionLabel = serde_json::from_str("\"epilogue\"").unwrap();
        assert_eq!(back, SectionLabel::Other("epilogue".to_string()));
    }

    // ─── Turn Tests ──────────────────────────────────────────

    #[test]
    fn test_turn_constructors() {
        let h = Turn::human("hello");
        assert_eq!(h.role, Role::Human);
        assert!(h.label.is_none());
        assert!(!h.is_assistant());

        let a = Turn::assistant("world").labelled("chapter2");
        assert!(a.is_assistant());
        assert_eq!(a.chapter_number(), Some(2));
    }

    #[test]
    fn test_turn_unlabelled_omits_label_field() {
        let json = serde_json::to_string(&Turn::human("x")).unwrap();
        assert!(!json.contains("label"));
        assert!(json.contains("\"human\""));
    }

    // ─── PromptTemplate Tests ────────────────────────────────

    #[test]
    fn test_template_render_without_context() {
        let t = PromptTemplate::default();
        assert_eq!(t.render(&[]), "You are a helpful assistant.");
    }

    #[test]
    fn test_template_render_substitutes_context() {
        let t = PromptTemplate::default();
        let rendered = t.render(&["The hero is tired.".to_string()]);
        assert_eq!(rendered, "You are a helpful assistant.\n\nThe hero is tired.");
    }

    #[test]
    fn test_template_without_placeholder_appends_context() {
        let t = PromptTemplate {
            id: "plain".to_string(),
            system: "Be brief.".to_string(),
        };
        assert_eq!(t.render(&[]), "Be brief.");
        assert_eq!(t.render(&["ctx".to_string()]), "Be brief.\n\nctx");
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_session_new_is_empty() {
        let s = Session::default();
        assert_eq!(s.version, SESSION_FORMAT_VERSION);
        assert!(s.turns.is_empty());
        assert!(!s.id.is_empty());
        assert_eq!(s.created_at, s.updated_at);
    }

    #[test]
    fn test_session_token_roundtrip_keeps_turns() {
        let mut s = Session::default();
        s.turns.push(Turn::human("Tell a story").labelled("synopsis"));
        s.turns.push(Turn::assistant("Once upon a time").labelled("synopsis"));
        s.turns.push(Turn::human("Chapter 1 please"));
        s.turns.push(Turn::assistant("It was raining. \"Quotes\" & ünïcode").labelled("chapter1"));

        let token = s.to_token().unwrap();
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let back = Session::from_token(&token).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_session_token_rejects_garbage() {
        let err = Session::from_token("not a token!").unwrap_err();
        assert!(matches!(err, BookError::Session(_)));
    }

    #[test]
    fn test_session_token_rejects_unknown_version() {
        let mut s = Session::default();
        s.version = 99;
        let token = s.to_token().unwrap();
        let err = Session::from_token(&token).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    // ─── BookData Tests ──────────────────────────────────────

    #[test]
    fn test_book_data_keeps_file_order() {
        let json = r#"{
            "synopsis": {"human_message": "h0", "ai_message": "a0"},
            "chapter2": {"human_message": "h2", "ai_message": "a2"},
            "chapter1": {"human": "h1", "ai": "a1"}
        }"#;
        let book: BookData = serde_json::from_str(json).unwrap();
        let labels: Vec<String> = book.sections.iter().map(|s| s.label.to_string()).collect();
        assert_eq!(labels, vec!["synopsis", "chapter2", "chapter1"]);
        assert_eq!(book.get(&SectionLabel::Chapter(1)).unwrap().ai_message, "a1");
    }

    #[test]
    fn test_book_data_serializes_as_object() {
        let mut book = BookData::new();
        book.push("synopsis", SectionPair::new("h", "a"));
        book.push(SectionLabel::Chapter(1), SectionPair::new("h1", "a1"));
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["chapter1"]["ai_message"], "a1");
        let text = serde_json::to_string(&book).unwrap();
        assert!(text.find("synopsis").unwrap() < text.find("chapter1").unwrap());
    }

    #[test]
    fn test_book_data_rejects_missing_field() {
        let json = r#"{"synopsis": {"human_message": "h"}}"#;
        assert!(serde_json::from_str::<BookData>(json).is_err());
    }

    // ─── ChapterVersions Tests ───────────────────────────────

    fn versions() -> ChapterVersions {
        ChapterVersions {
            chapter: 4,
            candidates: [
                ChapterCandidate {
                    human_message: "Write chapter 4".to_string(),
                    ai_message: "first".to_string(),
                },
                ChapterCandidate {
                    human_message: "Write chapter 4".to_string(),
                    ai_message: "second".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_versions_candidate_choice_is_one_based() {
        let v = versions();
        assert_eq!(v.candidate(1).unwrap().ai_message, "first");
        assert_eq!(v.candidate(2).unwrap().ai_message, "second");
        assert!(v.candidate(0).is_none());
        assert!(v.candidate(3).is_none());
    }

    #[test]
    fn test_versions_render_draft() {
        assert_eq!(
            versions().render_draft(),
            "Chapter 4\nVersion 1:\nfirst\nVersion 2:\nsecond\n\n\n"
        );
    }

    // ─── Config Tests ────────────────────────────────────────

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = BookjibeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BookjibeConfig::default());
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_config_reads_environment_keys() {
        let config = BookjibeConfig::from_lookup(lookup(&[
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "http://localhost:8080"),
            ("BOOKJIBE_LLM_PROVIDER", "deepseek"),
            ("BOOKJIBE_TEMPERATURE", "0.9"),
            ("BOOKJIBE_MAX_TOKENS", "512"),
            ("BOOKJIBE_PROMPT_FOLDER", "/srv/prompts"),
            ("BOOKJIBE_PROMPT_GENERATOR_FOLDER", "/srv/gen"),
            ("BOOKJIBE_TEMPORARY_FOLDER", "/tmp/book"),
            ("BOOKJIBE_STATE_FOLDER", "/var/book"),
            ("BOOKJIBE_LANGUAGE", "fr"),
        ]))
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.api_base.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.llm.provider, LlmProvider::DeepSeek);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.folders.prompts, PathBuf::from("/srv/prompts"));
        assert_eq!(config.folders.prompt_generator, PathBuf::from("/srv/gen"));
        assert_eq!(config.folders.temporary, PathBuf::from("/tmp/book"));
        assert_eq!(config.folders.state, PathBuf::from("/var/book"));
        assert_eq!(config.language, Language::Fr);
    }

    #[test]
    fn test_config_provider_picks_base_url() {
        let pick = |name: &str| {
            BookjibeConfig::from_lookup(lookup(&[("BOOKJIBE_LLM_PROVIDER", name)]))
                .unwrap()
                .llm
                .provider
        };
        assert_eq!(pick("OpenAI").default_base_url(), "https://api.openai.com");
        assert_eq!(pick("deepseek").default_base_url(), "https://api.deepseek.com");
        assert_eq!(pick("custom").default_base_url(), "");

        let err = BookjibeConfig::from_lookup(lookup(&[("BOOKJIBE_LLM_PROVIDER", "claude")]))
            .unwrap_err();
        assert!(matches!(err, BookError::Config(_)));
    }

    #[test]
    fn test_config_init_folder_is_fallback() {
        let config =
            BookjibeConfig::from_lookup(lookup(&[("BOOKJIBE_PROMPT_INIT_FOLDER", "/init")])).unwrap();
        assert_eq!(config.folders.prompts, PathBuf::from("/init"));
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let err = BookjibeConfig::from_lookup(lookup(&[("BOOKJIBE_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(err, BookError::Config(_)));
    }

    #[test]
    fn test_config_rejects_unknown_language() {
        let result: Result<Language> = "klingon".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_language_phrases() {
        assert_eq!(Language::En.chapter_instruction(3), "Write chapter 3 of the story.");
        assert_eq!(Language::Fr.chapter_instruction(3), "Ecris le chapitre 3 de l'histoire.");
        assert_ne!(Language::En.agreement_phrase(), Language::Fr.agreement_phrase());
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = BookError::PromptNotFound("mystery_prompt.txt".to_string());
        assert_eq!(err.to_string(), "Prompt not found: mystery_prompt.txt");

        let err = BookError::Io {
            path: "/a/b".to_string(),
            message: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "Filesystem error: /a/b: denied");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: BookError = json_err.into();
        assert!(matches!(err, BookError::Serialization(_)));
    }
}
