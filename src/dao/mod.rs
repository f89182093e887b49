/// Database model definitions.
pub mod models;
/// Read-only pool of multiple-choice questions.
pub mod question_bank;
/// Room state storage and compare-and-swap primitives.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
