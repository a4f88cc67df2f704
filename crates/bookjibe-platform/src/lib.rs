pub mod llm;
pub mod prompts;
pub mod storage;

pub use llm::OpenAiCompatProvider;
pub use prompts::FsPromptLibrary;
