/// Board store abstraction and its filesystem backend.
pub mod board_store;
/// Stored board definitions.
pub mod models;
/// Storage error types shared by the stores.
pub mod storage;
