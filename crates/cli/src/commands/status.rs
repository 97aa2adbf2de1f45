use ssofetch::{FetchClient, Result};

/// Lists every host with a cached session. An empty cache is informational,
/// not an error.
pub fn execute(client: &FetchClient) -> Result<()> {
    let mut hosts = client.list_sessions()?;

    if hosts.is_empty() {
        println!("No cached sessions found.");
        return Ok(());
    }

    hosts.sort();
    println!("Cached sessions:");
    for host in hosts {
        println!("  {host}");
    }

    Ok(())
}
