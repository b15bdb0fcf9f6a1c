//! Destroy command.

use anyhow::Context;

/// Tear down the environment's stack.
pub async fn destroy(environment: &str, project: &str) -> anyhow::Result<()> {
    let pipeline = super::pipeline(environment, project)?;
    let (tx, printer) = super::spawn_printer();

    println!("Destroying {} ({})", project, environment);

    let result = pipeline.destroy(Some(tx)).await;
    printer.await.context("output forwarding task failed")?;

    result.with_context(|| format!("destroying {} failed", environment))?;
    println!("Teardown complete");
    Ok(())
}
