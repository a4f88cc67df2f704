pub mod memory;
pub mod file;
pub mod state;

pub use memory::MemoryStorage;
pub use file::FileStorage;
pub use state::open_state_storage;
