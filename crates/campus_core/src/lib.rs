//! Core domain logic for the campus academic records system.
//! Owns entity validation, storage, reference checks and student queries.

pub mod collection;
pub mod config;
pub mod credential;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use collection::{
    CollectionError, CollectionResult, IdPolicy, JsonFileStudentStore, MemoryStudentStore,
    StudentStore,
};
pub use config::{ConfigError, CoreConfig, StoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, ScopedConnection, Store};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::student::{NewStudent, Student, StudentPatch};
pub use model::{EntityId, EntityKind, ValidationError};
pub use query::pagination::{paginate, Page, PageRequest, PaginationMeta};
pub use query::student_query::{SortOrder, StudentQuery};
pub use query::{QueryError, QueryResult};
pub use repo::{RepoError, RepoResult};
pub use service::guard::{Reference, ReferentialGuard};
pub use service::records_service::RecordsService;
pub use service::student_service::{StudentService, StudentServiceError, StudentServiceResult};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
