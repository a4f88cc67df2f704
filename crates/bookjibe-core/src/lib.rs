pub mod ports;
pub mod writer;
pub mod import;
pub mod prompt_generator;
pub mod session_store;


pub use import::{create_writer_from_book_data, parse_book_file, parse_upload};
pub use prompt_generator::{GeneratedPrompt, PromptGenerator};
pub use session_store::SessionStore;
pub use writer::{Writer, WriterSettings};
