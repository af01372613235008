/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;

use crate::config::{BrokerKind, Config, Overrides};
use anyhow::{bail, Context};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rule_router::{
    load_rules_dir, Broker, BrokerManager, BrokerRole, InProcBroker, IngressListener, Processor,
    ProcessorOptions,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "configurable-router", about = "Rule-driven message router")]
struct RouterArgs {
    /// Path to the router configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: String,

    /// Directory holding the rule files.
    #[arg(short, long, value_name = "DIR")]
    rules: String,

    /// Override the number of worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Override the ingress queue capacity.
    #[arg(long)]
    queue_size: Option<usize>,

    /// Override the advisory batch size.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override the metrics listen address.
    #[arg(long)]
    metrics_addr: Option<String>,

    /// Override the metrics endpoint path.
    #[arg(long)]
    metrics_path: Option<String>,

    /// Override the metrics refresh interval, in seconds.
    #[arg(long)]
    metrics_interval: Option<u64>,
}

async fn serve_metrics(
    handle: PrometheusHandle,
    addr: SocketAddr,
    path: String,
) -> std::io::Result<()> {
    let app = axum::Router::new().route(
        &path,
        axum::routing::get(move || async move { handle.render() }),
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await
}

fn build_brokers(manager: &BrokerManager, config: &Config) -> anyhow::Result<()> {
    for broker_config in &config.brokers {
        let has_connection_details = broker_config.address.is_some()
            || broker_config.client_id.is_some()
            || broker_config.username.is_some()
            || broker_config.password.is_some();

        let broker = match broker_config.kind {
            BrokerKind::Memory => {
                if has_connection_details {
                    warn!(
                        broker_id = broker_config.id.as_str(),
                        "connection details are ignored by the in-process broker kind"
                    );
                }
                Arc::new(InProcBroker::new(
                    broker_config.id.clone(),
                    broker_config.role,
                ))
            }
        };
        manager
            .add_broker(broker)
            .with_context(|| format!("unable to register broker `{}`", broker_config.id))?;
    }

    if manager.brokers_by_role(BrokerRole::Source).is_empty() {
        bail!("no source brokers configured");
    }
    if manager.brokers_by_role(BrokerRole::Target).is_empty() {
        bail!("no target brokers configured");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = RouterArgs::parse();

    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("unable to read config file {}", args.config))?;
    let mut config: Config = json5::from_str(&contents)
        .with_context(|| format!("unable to parse config file {}", args.config))?;
    config.apply_overrides(Overrides {
        workers: args.workers,
        queue_size: args.queue_size,
        batch_size: args.batch_size,
        metrics_addr: args.metrics_addr,
        metrics_path: args.metrics_path,
        metrics_interval_secs: args.metrics_interval,
    });

    let mut metrics_tasks = Vec::new();
    if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("unable to install metrics recorder")?;
        let addr: SocketAddr = config
            .metrics
            .address
            .parse()
            .with_context(|| format!("invalid metrics address {}", config.metrics.address))?;
        let path = config.metrics.path.clone();
        info!(address = %addr, path = path.as_str(), "starting metrics endpoint");
        metrics_tasks.push(tokio::spawn(async move {
            if let Err(err) = serve_metrics(handle, addr, path).await {
                warn!(err = %err, "metrics endpoint stopped");
            }
        }));

        let started = Instant::now();
        let interval = Duration::from_secs(config.metrics.update_interval_secs.max(1));
        metrics_tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                metrics::gauge!("router_uptime_seconds").set(started.elapsed().as_secs_f64());
            }
        }));
    }

    let manager = Arc::new(BrokerManager::new());
    build_brokers(&manager, &config)?;

    let rules = load_rules_dir(Path::new(&args.rules))
        .with_context(|| format!("unable to load rules from {}", args.rules))?;
    manager
        .check_rule_targets(&rules)
        .context("rule target validation failed")?;

    let processor = Arc::new(Processor::with_publisher(
        ProcessorOptions {
            workers: config.processing.workers,
            queue_size: config.processing.queue_size,
            batch_size: config.processing.batch_size,
        },
        Some(manager.clone() as _),
    ));

    // Subscription patterns are the enabled rules' source topics.
    let mut patterns: Vec<String> = rules
        .iter()
        .filter(|rule| rule.enabled)
        .map(|rule| rule.topic.clone())
        .collect();
    patterns.sort();
    patterns.dedup();

    let rule_count = processor
        .load_rules(rules)
        .context("unable to install rules")?;

    for broker in manager.brokers_by_role(BrokerRole::Source) {
        let listener = Arc::new(IngressListener::new(processor.clone(), broker.id()));
        broker
            .subscribe(&patterns, listener)
            .await
            .with_context(|| format!("unable to subscribe via broker `{}`", broker.id()))?;
    }

    manager
        .connect_all()
        .await
        .context("unable to connect brokers")?;

    info!(
        workers = config.processing.workers,
        queue_size = config.processing.queue_size,
        batch_size = config.processing.batch_size,
        rule_count,
        broker_count = config.brokers.len(),
        metrics_enabled = config.metrics.enabled,
        "configurable-router started"
    );

    let mut terminate = signal(SignalKind::terminate()).context("unable to install SIGTERM handler")?;
    let mut interrupt = signal(SignalKind::interrupt()).context("unable to install SIGINT handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("unable to install SIGHUP handler")?;

    loop {
        tokio::select! {
            _ = terminate.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = interrupt.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = hangup.recv() => {
                // Log re-open request; stdout logging has nothing to rotate.
                info!("received SIGHUP, log re-open requested");
            }
        }
    }

    let drained = {
        let processor = processor.clone();
        tokio::task::spawn_blocking(move || processor.close())
    };
    drained.await.context("worker drain failed")?;

    manager.disconnect_all().await;
    for task in metrics_tasks {
        task.abort();
    }

    let stats = processor.stats();
    info!(
        processed = stats.processed,
        matched = stats.matched,
        errors = stats.errors,
        "shutdown complete"
    );
    Ok(())
}
