pub mod acquisition_repository;
pub mod entities;
pub mod event_repository;
pub mod store;

pub use acquisition_repository::SeaOrmAcquisitionRepository;
pub use event_repository::SeaOrmEventRepository;
pub use store::PostgresStore;
