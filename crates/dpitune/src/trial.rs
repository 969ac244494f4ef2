//! Sequential trial loop
//!
//! The proxy process and its port are one exclusive resource, so candidate
//! settings are trialed strictly one after another: service up, probe
//! batch, service down. A setting whose service never comes up is skipped
//! and contributes no trial.

use crate::probe;
use crate::service::ServiceController;
use anyhow::Result;
use dpitune_common::model::{ServiceState, Trial};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct TrialConfig {
    pub proxy_port: u16,
    pub concurrency_limit: usize,
}

/// Trial every candidate setting against the domain list.
///
/// The controller is taken and released per trial; on every path, success
/// or failure, the service is stopped before the next candidate starts.
pub async fn run_trials(
    controller: Arc<Mutex<ServiceController>>,
    settings: &[String],
    domains: &[String],
    config: TrialConfig,
) -> Result<Vec<Trial>> {
    let mut trials = Vec::with_capacity(settings.len());

    for (index, setting) in settings.iter().enumerate() {
        info!(
            "Trial {}/{}: starting proxy with '{}'",
            index + 1,
            settings.len(),
            setting
        );

        let started = {
            let mut ctl = controller.lock().await;
            ctl.start(setting, config.proxy_port).await
        };

        match started {
            Ok(ServiceState::Active) => {}
            Ok(_) => {
                warn!("Skipping '{}': service failed to start", setting);
                controller.lock().await.stop().await;
                continue;
            }
            Err(e) => {
                warn!("Skipping '{}': {:#}", setting, e);
                controller.lock().await.stop().await;
                continue;
            }
        }

        let outcomes =
            probe::dispatch(domains, config.proxy_port, config.concurrency_limit).await;

        // stop is unconditional, even when dispatch failed
        controller.lock().await.stop().await;

        match outcomes {
            Ok(outcomes) => {
                let trial = Trial::from_outcomes(setting.clone(), outcomes);
                info!(
                    "Trial {}/{}: {}/{} reachable ({}%)",
                    index + 1,
                    settings.len(),
                    trial.success_count,
                    trial.total_count,
                    trial.success_rate
                );
                trials.push(trial);
            }
            Err(e) => {
                warn!("Skipping '{}': probe dispatch failed: {:#}", setting, e);
            }
        }
    }

    Ok(trials)
}
