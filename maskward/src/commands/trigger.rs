// maskward/src/commands/trigger.rs
//
// USE CASE: One request-style run, reported the way the HTTP endpoint reports it.

use maskward_core::application::handle_request;

use crate::commands::Workspace;

pub async fn execute(workspace: &Workspace) -> anyhow::Result<()> {
    let outcome = handle_request(&workspace.services, &workspace.config).await;
    println!("{} {}", outcome.status(), outcome.message());

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
