use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use duckdb::Connection;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const CONFIG: &str = r#"
project_id: p1
bucket_name: gs://rls_files
dataset_id: sales
staging_path: stage/masking_policies.csv
local:
  warehouse_path: maskward.duckdb
  catalog_path: catalog.json
  bucket_root: buckets
"#;

const SHEET: &str = "project_id,dataset_id,table_id,column_name,restricted_users\n\
p1,sales,customers,email,\"a@x.com, b@x.com\"\n\
p1,sales,orders,card,c@x.com\n";

/// Temporary project: config, a bucket holding the rule sheet, a warehouse with two tables.
struct MaskwardTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl MaskwardTestEnv {
    fn new(sheet: &str) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();

        fs::write(root.join("maskward.yaml"), CONFIG)?;
        fs::create_dir_all(root.join("buckets/rls_files"))?;
        fs::write(root.join("buckets/rls_files/masking_policies.csv"), sheet)?;

        let conn = Connection::open(root.join("maskward.duckdb"))?;
        conn.execute_batch(
            "CREATE SCHEMA sales;
             CREATE TABLE sales.customers (id BIGINT, email VARCHAR, phone VARCHAR);
             CREATE TABLE sales.orders (id BIGINT, card VARCHAR);",
        )?;
        drop(conn);

        Ok(Self { _tmp: tmp, root })
    }

    fn maskward(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("maskward"));
        cmd.current_dir(&self.root);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn query_i64(&self, sql: &str) -> Result<i64> {
        let conn = Connection::open(self.root.join("maskward.duckdb"))?;
        let value: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value)
    }

    fn catalog(&self) -> Result<serde_json::Value> {
        let content = fs::read_to_string(self.root.join("catalog.json"))
            .context("catalog.json should exist after a run")?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[test]
fn test_scheduled_run_masks_columns_and_audits() -> Result<()> {
    let env = MaskwardTestEnv::new(SHEET)?;

    env.maskward()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    assert_eq!(env.query_i64("SELECT count(*) FROM sales.masking_policies")?, 2);
    assert_eq!(env.query_i64("SELECT count(*) FROM sales.masking_audit")?, 2);
    assert_eq!(
        env.query_i64(
            "SELECT count(*) FROM maskward_meta.column_metadata
             WHERE table_id = 'customers' AND column_name = 'email' AND policy_tags LIKE '%/policyTags/%'"
        )?,
        1
    );
    assert_eq!(
        env.query_i64(
            "SELECT count(*) FROM sales.masking_audit WHERE restricted_users = 'a@x.com,b@x.com'"
        )?,
        1
    );

    let catalog = env.catalog()?;
    let taxonomies = catalog["taxonomies"].as_array().context("taxonomies")?;
    assert_eq!(taxonomies.len(), 1);
    assert_eq!(taxonomies[0]["display_name"], "Masking");
    assert_eq!(catalog["policy_tags"].as_array().context("tags")?.len(), 2);
    Ok(())
}

#[test]
fn test_second_run_keeps_one_taxonomy() -> Result<()> {
    let env = MaskwardTestEnv::new(SHEET)?;

    env.maskward().arg("run").assert().success();
    env.maskward().arg("run").assert().success();

    let catalog = env.catalog()?;
    assert_eq!(catalog["taxonomies"].as_array().context("taxonomies")?.len(), 1);
    assert_eq!(catalog["policy_tags"].as_array().context("tags")?.len(), 2);
    assert_eq!(env.query_i64("SELECT count(*) FROM sales.masking_audit")?, 4);
    Ok(())
}

#[test]
fn test_trigger_numbers_batches() -> Result<()> {
    let env = MaskwardTestEnv::new(SHEET)?;

    env.maskward()
        .arg("trigger")
        .assert()
        .success()
        .stdout(predicate::str::contains("200 Masking process completed"));
    env.maskward().arg("trigger").assert().success();

    assert_eq!(env.query_i64("SELECT max(batch_id) FROM sales.masking_audit")?, 2);
    assert_eq!(
        env.query_i64("SELECT count(*) FROM sales.masking_audit WHERE batch_id = 1")?,
        2
    );
    Ok(())
}

#[test]
fn test_trigger_failure_reports_500() -> Result<()> {
    let env = MaskwardTestEnv::new(SHEET)?;
    fs::remove_file(env.root.join("buckets/rls_files/masking_policies.csv"))?;

    env.maskward()
        .arg("trigger")
        .assert()
        .failure()
        .stdout(predicate::str::starts_with("500"));
    Ok(())
}

#[test]
fn test_stage_commands_in_sequence() -> Result<()> {
    let env = MaskwardTestEnv::new(SHEET)?;

    env.maskward()
        .arg("ingest")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows"));
    assert!(env.root.join("stage/masking_policies.csv").exists());

    env.maskward().arg("load").assert().success();
    assert_eq!(env.query_i64("SELECT count(*) FROM sales.masking_policies")?, 2);

    env.maskward()
        .args(["apply", "--audit", "batched"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Columns bound"));

    env.maskward()
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("customers.email"));
    assert_eq!(
        env.query_i64(
            "SELECT count(*) FROM maskward_meta.column_metadata WHERE policy_tags IS NOT NULL"
        )?,
        0
    );
    assert!(env.catalog()?["taxonomies"].as_array().context("taxonomies")?.is_empty());
    Ok(())
}

#[test]
fn test_strict_columns_fails_on_missing_column() -> Result<()> {
    let env = MaskwardTestEnv::new(
        "project_id,dataset_id,table_id,column_name,restricted_users\n\
         p1,sales,customers,fax,a@x.com\n",
    )?;

    env.maskward().arg("run").assert().success();
    env.maskward()
        .args(["run", "--strict-columns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fax"));
    Ok(())
}

#[test]
fn test_missing_config_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;

    Command::new(assert_cmd::cargo::cargo_bin!("maskward"))
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load masking configuration"));
    Ok(())
}
