//! Storage network handlers

pub mod memory;

pub use memory::MemoryStorageHandler;
