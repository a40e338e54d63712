// maskward-core/src/infrastructure/adapters/mod.rs

pub mod bucket;
pub mod catalog;
pub mod duckdb;

pub use bucket::LocalBucketStore;
pub use catalog::LocalPolicyTagManager;
pub use self::duckdb::DuckDBWarehouse;
