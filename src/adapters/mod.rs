pub mod repository;
pub mod storage;

pub use repository::FileRecordRepository;
pub use storage::LocalStorage;
