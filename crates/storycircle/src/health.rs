// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `storycircle health` command implementation.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use storycircle_core::{HealthStatus, PluginAdapter};

/// Result of checking one adapter.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub adapter_type: String,
    pub status: HealthStatus,
    pub duration: Duration,
}

/// Runs every adapter's health check in turn.
pub async fn check_all(adapters: &[Arc<dyn PluginAdapter>]) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(adapters.len());
    for adapter in adapters {
        let start = Instant::now();
        let status = match adapter.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        results.push(CheckResult {
            name: adapter.name().to_string(),
            adapter_type: adapter.adapter_type().to_string(),
            status,
            duration: start.elapsed(),
        });
    }
    results
}

/// Prints the results and returns how many adapters are unhealthy.
pub fn print_results(results: &[CheckResult], plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  storycircle health");
    println!("  {}", "-".repeat(50));

    let mut failures = 0;
    for result in results {
        let label = format!("{}/{}", result.adapter_type, result.name);
        let ms = result.duration.as_millis();
        let line = match &result.status {
            HealthStatus::Healthy => {
                if use_color {
                    use colored::Colorize;
                    format!("    {} {label:<28} ok ({ms}ms)", "✓".green())
                } else {
                    format!("    [OK]   {label:<28} ok ({ms}ms)")
                }
            }
            HealthStatus::Degraded(reason) => {
                if use_color {
                    use colored::Colorize;
                    format!("    {} {label:<28} {} ({ms}ms)", "!".yellow(), reason.yellow())
                } else {
                    format!("    [WARN] {label:<28} {reason} ({ms}ms)")
                }
            }
            HealthStatus::Unhealthy(reason) => {
                failures += 1;
                if use_color {
                    use colored::Colorize;
                    format!("    {} {label:<28} {} ({ms}ms)", "✗".red(), reason.red())
                } else {
                    format!("    [FAIL] {label:<28} {reason} ({ms}ms)")
                }
            }
        };
        println!("{line}");
    }
    println!();
    failures
}

/// Heap and resident memory in MB, as reported by jemalloc.
#[cfg(not(target_env = "msvc"))]
pub fn memory_usage() -> Option<(f64, f64)> {
    const MB: f64 = 1024.0 * 1024.0;
    tikv_jemalloc_ctl::epoch::advance().ok()?;
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().ok()?;
    let resident = tikv_jemalloc_ctl::stats::resident::read().ok()?;
    Some((allocated as f64 / MB, resident as f64 / MB))
}

#[cfg(target_env = "msvc")]
pub fn memory_usage() -> Option<(f64, f64)> {
    None
}

/// Prints the process memory line under the adapter results.
pub fn print_memory() {
    match memory_usage() {
        Some((heap_mb, resident_mb)) => {
            println!("    memory: heap {heap_mb:.1} MB, resident {resident_mb:.1} MB");
        }
        None => println!("    memory: jemalloc stats unavailable"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storycircle_core::CircleError;
    use storycircle_core::types::AdapterType;

    struct Fixed(Result<HealthStatus, &'static str>);

    #[async_trait]
    impl PluginAdapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, CircleError> {
            self.0.clone().map_err(|m| CircleError::Internal(m.into()))
        }
        async fn shutdown(&self) -> Result<(), CircleError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn errors_count_as_unhealthy() {
        let adapters: Vec<Arc<dyn PluginAdapter>> = vec![
            Arc::new(Fixed(Ok(HealthStatus::Healthy))),
            Arc::new(Fixed(Ok(HealthStatus::Degraded("slow".into())))),
            Arc::new(Fixed(Err("down"))),
        ];
        let results = check_all(&adapters).await;
        assert_eq!(results.len(), 3);
        assert!(matches!(results[2].status, HealthStatus::Unhealthy(_)));
        assert_eq!(print_results(&results, true), 1);
    }

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn memory_usage_reports_heap_and_resident() {
        let (heap_mb, resident_mb) = memory_usage().unwrap();
        assert!(heap_mb > 0.0);
        assert!(resident_mb >= heap_mb);
    }
}
