// maskward/src/commands/mod.rs

pub mod run;
pub mod serve;
pub mod stage;
pub mod trigger;

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use maskward_core::application::{ReconcileOptions, Services};
use maskward_core::domain::{AuditMode, MaskingConfig};
use maskward_core::infrastructure::adapters::{
    DuckDBWarehouse, LocalBucketStore, LocalPolicyTagManager,
};
use maskward_core::infrastructure::config::load_masking_config;

/// Loaded configuration plus the local adapters it points at.
pub struct Workspace {
    pub config: MaskingConfig,
    pub services: Services,
}

impl Workspace {
    pub fn open(
        config_path: Option<&Path>,
        project_dir: &Path,
        strict_columns: bool,
    ) -> anyhow::Result<Self> {
        let mut config = load_masking_config(config_path, project_dir).with_context(|| {
            format!("Failed to load masking configuration from {:?}", project_dir)
        })?;
        if strict_columns {
            config.strict_columns = true;
        }
        resolve_local_paths(&mut config, project_dir);

        let warehouse = DuckDBWarehouse::new(&config.local.warehouse_path).with_context(|| {
            format!(
                "Failed to initialize DuckDB at {}",
                config.local.warehouse_path
            )
        })?;
        let catalog = LocalPolicyTagManager::open(&config.local.catalog_path).with_context(|| {
            format!(
                "Failed to open policy tag catalog at {:?}",
                config.local.catalog_path
            )
        })?;
        let store = LocalBucketStore::new(config.local.bucket_root.clone());

        let services = Services {
            object_store: Arc::new(store),
            warehouse: Arc::new(warehouse),
            catalog: Arc::new(catalog),
        };
        Ok(Self { config, services })
    }

    pub fn reconcile_options(&self, mode: AuditMode) -> ReconcileOptions {
        ReconcileOptions {
            mode,
            strict_columns: self.config.strict_columns,
        }
    }

    pub fn describe(&self) {
        println!(
            "   Project: {} | Dataset: {} | Location: {}",
            self.config.project_id, self.config.dataset_id, self.config.location
        );
        println!(
            "   Engine: {} 🦆 | Sheet: gs://{}/{}",
            self.services.warehouse.engine_name(),
            self.config.bucket(),
            self.config.sheet_path
        );
    }
}

fn resolve_local_paths(config: &mut MaskingConfig, project_dir: &Path) {
    let resolve = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            project_dir.join(p)
        }
    };

    if config.local.warehouse_path != ":memory:" {
        config.local.warehouse_path = resolve(Path::new(&config.local.warehouse_path))
            .to_string_lossy()
            .into_owned();
    }
    config.local.catalog_path = resolve(&config.local.catalog_path);
    config.local.bucket_root = resolve(&config.local.bucket_root);
    config.staging_path = resolve(&config.staging_path);
}
