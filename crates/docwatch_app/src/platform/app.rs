use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use docwatch_core::Token;
use docwatch_engine::{
    ChannelNotifier, CommandRouter, HttpPageChecker, MemoryStore, Notice, PageChecker,
    RequestSupervisor, ShutdownReport, Store, TrackerError, WatcherDeps,
};
use docwatch_logging::{watch_error, watch_info, watch_warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc::UnboundedReceiver;

use super::config::AppConfig;
use super::console::{self, LineError};
use super::logging;
use super::persistence::RonStore;

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    logging::initialize(config.log_file.as_deref());
    watch_info!(
        "docwatch starting: page {} every {}s",
        config.page_url,
        config.poll_interval_secs
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(serve(config))
}

fn open_store(state_file: Option<&Path>) -> anyhow::Result<Arc<dyn Store>> {
    match state_file {
        Some(path) => {
            let store = RonStore::open(path.to_path_buf())
                .with_context(|| format!("opening state file {}", path.display()))?;
            watch_info!("Pending requests are kept in {}", store.path().display());
            Ok(Arc::new(store))
        }
        None => {
            watch_warn!("No state file configured, pending requests are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = open_store(config.state_file.as_deref())?;
    let checker = HttpPageChecker::new(&config.page_url, config.fetch_settings())
        .map_err(TrackerError::from)
        .context("configuring page checker")?;
    let checker = Arc::new(checker);
    let (notifier, mut notices) = ChannelNotifier::channel();

    let supervisor = Arc::new(RequestSupervisor::new(WatcherDeps {
        checker: checker.clone(),
        store,
        notifier: Arc::new(notifier),
        settings: config.watch_settings(),
    }));

    let recovery = supervisor
        .recover()
        .context("resuming stored tracking requests")?;
    watch_info!("Resumed {} stored requests", recovery.spawned);
    for (key, reason) in &recovery.skipped {
        watch_warn!("Not resuming {}: {}", key, reason);
    }

    check_reachable(checker.as_ref()).await;

    let router = CommandRouter::new(supervisor.clone(), config.page_url.clone());
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                watch_info!("Interrupt received, shutting down");
                break;
            }
            Some(notice) = notices.recv() => write_notice(&mut stdout, &notice).await?,
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    watch_info!("Input closed, shutting down");
                    break;
                };
                match console::parse_line(&line) {
                    Ok(inbound) => {
                        let reply = router.handle(&inbound);
                        write_notice(&mut stdout, &reply).await?;
                    }
                    Err(LineError::Blank) => {}
                    Err(err) => watch_warn!("Ignoring input line: {}", err),
                }
            }
        }
    }

    let report = supervisor.shutdown().await;
    flush_notices(&mut stdout, &mut notices).await?;
    log_shutdown(&report);
    Ok(())
}

/// One check at startup so a bad URL or an unreachable site shows up in the
/// log right away instead of after the first poll interval.
async fn check_reachable(checker: &dyn PageChecker) {
    let Ok(sample) = Token::new("docwatch-startup-check") else {
        return;
    };
    match checker.check(&sample).await.map_err(TrackerError::from) {
        Ok(_) => watch_info!("Watched page is reachable"),
        Err(err) => watch_warn!("{}; watchers will keep retrying", err),
    }
}

async fn write_notice(stdout: &mut Stdout, notice: &Notice) -> anyhow::Result<()> {
    let line = format!("{}\n", console::render_notice(notice));
    stdout
        .write_all(line.as_bytes())
        .await
        .context("writing to stdout")?;
    stdout.flush().await.context("flushing stdout")?;
    Ok(())
}

async fn flush_notices(
    stdout: &mut Stdout,
    notices: &mut UnboundedReceiver<Notice>,
) -> anyhow::Result<()> {
    while let Ok(notice) = notices.try_recv() {
        write_notice(stdout, &notice).await?;
    }
    Ok(())
}

fn log_shutdown(report: &ShutdownReport) {
    watch_info!(
        "Shutdown complete: {} watchers stopped, {} abandoned, {} failed",
        report.finished.len(),
        report.abandoned.len(),
        report.failed.len()
    );
    for key in &report.abandoned {
        watch_warn!("Watcher {} did not stop in time and was aborted", key);
    }
    for key in &report.failed {
        watch_error!("Watcher {} panicked", key);
    }
}
