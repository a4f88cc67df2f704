pub mod turn;
pub mod session;
pub mod book;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::BookError;
pub type Result<T> = std::result::Result<T, BookError>;
