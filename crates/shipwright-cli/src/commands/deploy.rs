//! Deploy command.

use anyhow::Context;
use shipwright_core::StackOutputs;

/// Run the full deploy pipeline and report the reachable endpoints.
pub async fn deploy(environment: &str, project: &str) -> anyhow::Result<()> {
    let pipeline = super::pipeline(environment, project)?;
    let (tx, printer) = super::spawn_printer();

    println!("Deploying {} ({})", project, environment);

    let result = pipeline.deploy(Some(tx)).await;
    printer.await.context("output forwarding task failed")?;

    let outputs = result.with_context(|| format!("deploying {} failed", environment))?;
    report(&outputs);
    Ok(())
}

/// Final report; reaching this point means the deployment already
/// succeeded, so it never fails the run.
fn report(outputs: &StackOutputs) {
    println!();
    println!("Frontend: {}", outputs.cdn_url);
    println!("API:      {}", outputs.api_endpoint);
    if let Some(domain) = &outputs.custom_domain_url {
        println!("Domain:   {}", domain);
    }
}
