// maskward-core/src/ports/mod.rs
//
// What the workflow needs from the outside world, without knowing who provides it.

pub mod catalog;
pub mod object_store;
pub mod warehouse;

pub use catalog::PolicyTagManager;
pub use object_store::ObjectStore;
pub use warehouse::{LoadJobConfig, Warehouse, WriteDisposition};
