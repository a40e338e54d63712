pub mod access;
pub mod audit;
pub mod configuration;
pub mod error;
pub mod rule;
pub mod schema;
pub mod taxonomy;

// Re-exports to keep imports short elsewhere
pub use access::{Binding, IamPolicy};
pub use audit::{AuditMode, AuditRecord};
pub use configuration::{MaskingConfig, TableRef};
pub use error::DomainError;
pub use rule::MaskingRule;
pub use schema::{FieldMode, FieldType, SchemaField, Table};
pub use taxonomy::{PolicyTag, PolicyTagIndex, Taxonomy};
