//! The `scrape` and `sites` command handlers.
//!
//! Sites run concurrently and in isolation: a failed site is logged and
//! counted, and the others keep going. Rows are written to stdout as JSON
//! lines, one site's rows at a time, as each site finishes.

use std::io::Write;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use winecat_core::{AppConfig, CatalogItem, SiteId, SitesFile};
use winecat_scraper::{
    build_adapter, default_config, CatalogAdapter, ScrapeOutcome, ScraperSettings,
};

/// One output line: the run identifier followed by the item's columns.
#[derive(Serialize)]
struct Row<'a> {
    run_id: &'a str,
    #[serde(flatten)]
    item: &'a CatalogItem,
}

/// `YYYYMMDDHHMMSS` of the run start.
pub(crate) fn run_id(started: DateTime<Utc>) -> String {
    started.format("%Y%m%d%H%M%S").to_string()
}

pub(crate) fn load_sites_file(config: &AppConfig) -> anyhow::Result<SitesFile> {
    match &config.sites_path {
        Some(path) => Ok(winecat_core::load_site_overrides(path)?),
        None => Ok(SitesFile::default()),
    }
}

/// The sites a `scrape` run covers.
///
/// With no explicit selection every site not disabled in the sites file is
/// used. An explicit selection is honored as given, minus repeats.
pub(crate) fn select_sites(requested: &[SiteId], sites_file: &SitesFile) -> Vec<SiteId> {
    if requested.is_empty() {
        return SiteId::ALL
            .into_iter()
            .filter(|site| sites_file.is_enabled(*site))
            .collect();
    }

    let mut selected = Vec::with_capacity(requested.len());
    for site in requested {
        if !selected.contains(site) {
            selected.push(*site);
        }
    }
    selected
}

/// Writes `items` as JSON lines, each prefixed with `run_id`.
pub(crate) fn write_rows<W: Write>(
    out: &mut W,
    run_id: &str,
    items: &[CatalogItem],
) -> anyhow::Result<()> {
    for item in items {
        serde_json::to_writer(&mut *out, &Row { run_id, item })?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received; cancelling run");
        cancel.cancel();
    }
}

/// Runs every selected site and streams their rows to stdout.
///
/// # Errors
///
/// Returns an error if nothing is selected, an adapter cannot be built, the
/// output cannot be written, or every selected site failed.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    sites_file: &SitesFile,
    sites: &[SiteId],
) -> anyhow::Result<()> {
    if sites.is_empty() {
        anyhow::bail!("no sites selected; every site is disabled in the sites file");
    }

    let run_id = run_id(Utc::now());
    let settings = ScraperSettings::from_app_config(config);
    let adapters = sites
        .iter()
        .map(|&site| {
            build_adapter(site, settings.clone(), sites_file.get(site))
                .map_err(|e| anyhow::anyhow!("failed to build adapter for {site}: {e}"))
        })
        .collect::<anyhow::Result<Vec<Box<dyn CatalogAdapter>>>>()?;

    tracing::info!(%run_id, sites = adapters.len(), "starting scrape run");

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let max_concurrent = config.scraper_max_concurrent_sites.max(1);
    let mut outcomes = stream::iter(adapters)
        .map(|adapter| {
            let cancel = &cancel;
            async move { adapter.scrape_all(cancel).await }
        })
        .buffer_unordered(max_concurrent);

    let mut failed_sites = 0usize;
    let mut total_rows = 0usize;
    while let Some(outcome) = outcomes.next().await {
        if report(&outcome) {
            failed_sites += 1;
        }
        total_rows += outcome.items.len();
        write_rows(&mut std::io::stdout().lock(), &run_id, &outcome.items)?;
    }
    watcher.abort();

    tracing::info!(%run_id, total_rows, failed_sites, "scrape run finished");

    if failed_sites == sites.len() {
        anyhow::bail!("all {failed_sites} selected sites failed");
    }
    Ok(())
}

/// Logs a site's outcome; returns `true` if the site failed.
fn report(outcome: &ScrapeOutcome) -> bool {
    match &outcome.error {
        Some(err) => {
            tracing::error!(
                site = %outcome.site,
                rows = outcome.items.len(),
                pages = outcome.pages,
                error = %err,
                "site run failed"
            );
            true
        }
        None => {
            tracing::info!(
                site = %outcome.site,
                rows = outcome.items.len(),
                pages = outcome.pages,
                rejected = outcome.rejected,
                "site run complete"
            );
            false
        }
    }
}

/// Prints each site, its resolved root, and whether it is disabled.
pub(crate) fn list_sites(sites_file: &SitesFile) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    for site in SiteId::ALL {
        let mut config = default_config(site)?;
        if let Some(site_override) = sites_file.get(site) {
            config = config.apply_override(site_override)?;
        }
        let status = if sites_file.is_enabled(site) {
            ""
        } else {
            "\t(disabled)"
        };
        writeln!(out, "{site}\t{}{status}", config.root)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
