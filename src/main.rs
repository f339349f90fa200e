use anyhow::Result;
use chrono::Utc;
use url::Url;

use livecve_leaderboard::dataset::{self, Dataset};
use livecve_leaderboard::engine;
use livecve_leaderboard::logging::{json_log, log, obj, v_num, v_str, Domain, Level};
use livecve_leaderboard::render;
use livecve_leaderboard::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let source = cfg.data_url.clone().unwrap_or_else(|| cfg.data_path.clone());
    json_log("startup", obj(&[("source", v_str(&source))]));

    let ds = match load_dataset(&cfg).await {
        Ok(ds) => ds,
        Err(err) => {
            log(
                Level::Error,
                Domain::Dataset,
                "load_failed",
                obj(&[("source", v_str(&source)), ("error", v_str(&err.to_string()))]),
            );
            println!("{}", render::render_load_failure());
            return Ok(());
        }
    };

    let today = Utc::now().date_naive();
    let report = dataset::quality_report(&ds, cfg.ttl_days, today);
    for warning in &report.warnings {
        log(Level::Warn, Domain::Dataset, "quality", obj(&[("warning", v_str(warning))]));
    }
    if report.stale {
        log(
            Level::Warn,
            Domain::Dataset,
            "stale",
            obj(&[
                ("last_updated", v_str(&ds.metadata.last_updated)),
                ("ttl_days", v_num(cfg.ttl_days as f64)),
            ]),
        );
    }
    if cfg.data_url.is_none() {
        if let Ok(manifest) =
            dataset::build_manifest(std::path::Path::new(&cfg.data_path), &ds, cfg.ttl_days, today)
        {
            log(
                Level::Debug,
                Domain::Dataset,
                "manifest",
                obj(&[
                    ("hash", v_str(&manifest.hash_sha256)),
                    ("cves", v_num(manifest.cve_count as f64)),
                ]),
            );
        }
    }

    let view = cfg.view_state();
    let rows = engine::compute_display_rows(&ds, &view);
    let active = engine::active_cve_count(&ds, &view.filters.timeline);

    println!("{}", render::render_header(&ds, active));
    println!("Timeline: {} | Tab: {}", view.filters.timeline.label(), view.tab.as_str());
    print!("{}", render::render_table(&rows, ds.scale));
    if cfg.show_missing {
        for row in &rows {
            println!("  {} + {}: {}", row.model, row.agent, render::missing_tooltip(row));
        }
    }

    log(
        Level::Info,
        Domain::Render,
        "rendered",
        obj(&[
            ("rows", v_num(rows.len() as f64)),
            ("active_cves", v_num(active as f64)),
            ("sort", v_str(view.sort.field.as_str())),
            ("direction", v_str(view.sort.direction.as_str())),
        ]),
    );
    Ok(())
}

async fn load_dataset(cfg: &Config) -> Result<Dataset> {
    if let Some(raw) = &cfg.data_url {
        let url = Url::parse(raw)?;
        return dataset::fetch_dataset(url.as_str()).await;
    }
    dataset::load_file(std::path::Path::new(&cfg.data_path)).map_err(anyhow::Error::msg)
}
