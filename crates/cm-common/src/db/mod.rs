pub mod match_results;
pub mod migrations;
pub mod pool;
pub mod similarity_cache;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use match_results::{
    fetch_match_result, fetch_top_matches_for_job, upsert_match_result, MatchResultStorageError,
    StoredMatch,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool};
pub use similarity_cache::{
    count_entries, fetch_similarity, list_entries, upsert_similarity, DurableCacheConfig,
    SimilarityCacheError,
};
