//! Domain probing through the local SOCKS5 proxy
//!
//! One probe is one GET to `https://<domain>` with tight timeouts and no
//! retry. The dispatcher fans a domain batch out over a semaphore-bounded
//! set of tasks; the bound is an explicit parameter, never derived from
//! the batch size.

use anyhow::{Context, Result};
use dpitune_common::model::ProbeOutcome;
use reqwest::{Client, Proxy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// TCP connect budget per probe.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Whole-request budget per probe (connect + TLS + response headers).
const TOTAL_TIMEOUT: Duration = Duration::from_secs(3);

/// Build the shared probe client for one trial.
///
/// `socks5h` makes the proxy resolve hostnames, so DNS poisoning on the
/// host does not skew results. Redirects are not followed: 301/302 are
/// themselves accepted status codes.
pub fn build_client(proxy_port: u16) -> Result<Client> {
    let proxy = Proxy::all(format!("socks5h://127.0.0.1:{proxy_port}"))
        .context("Failed to construct SOCKS5 proxy URL")?;
    Client::builder()
        .proxy(proxy)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(TOTAL_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build probe HTTP client")
}

/// Probe one domain. Exactly one attempt; any transport-level failure
/// (DNS, connect, TLS, timeout) becomes the sentinel outcome.
pub async fn probe(client: &Client, domain: &str) -> ProbeOutcome {
    let url = format!("https://{domain}");
    match client.get(&url).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            debug!("{} -> {}", domain, code);
            ProbeOutcome::new(domain, code)
        }
        Err(e) => {
            debug!("{} -> transport failure: {}", domain, e);
            ProbeOutcome::transport_failure(domain)
        }
    }
}

/// Probe a domain batch concurrently, bounded by `concurrency_limit`.
///
/// Blank entries are skipped and not counted. The returned sequence is in
/// completion order; aggregation only sums it. Every non-blank domain is
/// accounted for: a probe task that is lost (panic, runtime shutdown) is
/// recorded as a transport failure rather than silently dropped.
pub async fn dispatch(
    domains: &[String],
    proxy_port: u16,
    concurrency_limit: usize,
) -> Result<Vec<ProbeOutcome>> {
    let client = build_client(proxy_port)?;
    let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut dispatched: HashMap<String, usize> = HashMap::new();

    for domain in domains {
        let domain = domain.trim().to_string();
        if domain.is_empty() {
            continue;
        }
        *dispatched.entry(domain.clone()).or_insert(0) += 1;

        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // permit acquisition inside the task keeps spawn order
            // irrelevant; at most `concurrency_limit` probes are in flight
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("probe semaphore closed");
            probe(&client, &domain).await
        });
    }

    let mut outcomes = Vec::with_capacity(dispatched.values().sum());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                if let Some(pending) = dispatched.get_mut(&outcome.domain) {
                    *pending = pending.saturating_sub(1);
                }
                outcomes.push(outcome);
            }
            Err(e) => warn!("Probe task lost: {}", e),
        }
    }

    // Anything still pending never reported back; count it as failed.
    for (domain, pending) in dispatched {
        for _ in 0..pending {
            warn!("No result collected for {}, recording failure", domain);
            outcomes.push(ProbeOutcome::transport_failure(domain.clone()));
        }
    }

    Ok(outcomes)
}
