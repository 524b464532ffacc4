use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;

use tennis_edge::chart::{self, ChartFrame, ChartKind};
use tennis_edge::details;
use tennis_edge::history::HistoryArchive;
use tennis_edge::keys::{Player, RatingMode, SurfaceScope};
use tennis_edge::odds;
use tennis_edge::record::FlatRecord;
use tennis_edge::timeline::{self, MergeInputs, day_ms};
use tennis_edge::win_prob::DEFAULT_EDGE_THRESHOLD;

/// Offline report: `match_report [details.json] [p1_history.json] [p2_history.json] [out.svg]`.
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let details_path = path_arg(args.next(), "tests/fixtures/match_details.json");
    let p1_path = path_arg(args.next(), "tests/fixtures/ts_history_p1.json");
    let p2_path = path_arg(args.next(), "tests/fixtures/ts_history_p2.json");
    let svg_path = path_arg(args.next(), "match_report.svg");

    let raw = fs::read_to_string(&details_path)
        .with_context(|| format!("read {}", details_path.display()))?;
    let record = FlatRecord::from_json(&raw)?;
    let p1 = load_history(&p1_path)?.unwrap_or_default();
    let p2 = load_history(&p2_path)?.unwrap_or_default();

    let ov = details::build_overview(&record, DEFAULT_EDGE_THRESHOLD, Utc::now().date_naive());
    println!("{} | {} | {}", ov.header.name, ov.header.round, ov.header.date_text);
    println!("{} vs {}", ov.p1.label(), ov.p2.label());
    if ov.finished {
        println!("result {} ({})", ov.score_main, ov.score_sets);
    }
    if let Some(side) = ov.value_side {
        println!(
            "value pick {} edge {:+.3} settled {}",
            ov.card(side).label(),
            match side {
                Player::P1 => ov.edge_p1.unwrap_or_default(),
                Player::P2 => ov.edge_p2.unwrap_or_default(),
            },
            ov.profit
                .map(|p| format!("{p:+.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let rows = record.odds_rows();
    for player in Player::ALL {
        if let Some(s) = odds::market_summary(&rows, player) {
            println!(
                "{} odds min {:.2} median {:.2} max {:.2}",
                player.label(),
                s.min,
                s.median,
                s.max
            );
        }
    }

    let match_day = record.match_day();
    for mode in RatingMode::ALL {
        for scope in SurfaceScope::ALL {
            let inputs = MergeInputs {
                p1_all: p1.series(mode, SurfaceScope::All),
                p2_all: p2.series(mode, SurfaceScope::All),
                p1_surface: p1.series(mode, scope),
                p2_surface: p2.series(mode, scope),
                match_day,
            };
            let series = timeline::merge_histories(inputs, scope);
            if series.is_empty() {
                continue;
            }
            println!(
                "{}_{}: {} points, {} mean changes",
                mode.code(),
                scope.code(),
                series.len(),
                timeline::count_mean_changes(&series)
            );
        }
    }

    let inputs = MergeInputs {
        p1_all: p1.series(RatingMode::M, SurfaceScope::All),
        p2_all: p2.series(RatingMode::M, SurfaceScope::All),
        p1_surface: &[],
        p2_surface: &[],
        match_day,
    };
    let series = timeline::merge_histories(inputs, SurfaceScope::All);
    let frame = ChartFrame::default();
    let match_time = match_day.map(day_ms);
    let pinned = match_time.and_then(|t| chart::nearest_index(&series, t));
    let Some(model) = chart::build_chart(&frame, &series, ChartKind::RatingMean, match_time, pinned, true)
    else {
        println!("not enough history for a chart");
        return Ok(());
    };
    if let Some(tip) = pinned.and_then(|i| chart::tooltip_at(&series, i, (&ov.p1.name, &ov.p2.name))) {
        println!(
            "{}: {} {:.2}±{:.2} ({:.0}%) | {} {:.2}±{:.2} ({:.0}%)",
            tip.date_label,
            tip.p1_label,
            tip.mu1,
            tip.sd1,
            tip.wp1 * 100.0,
            tip.p2_label,
            tip.mu2,
            tip.sd2,
            tip.wp2 * 100.0
        );
    }

    let title = format!("{} vs {}", ov.p1.name, ov.p2.name);
    let svg = match chart::build_win_prob_chart(&frame, &series, match_time, pinned) {
        Some(prob) => chart::to_svg_stack(&frame, &[&model, &prob], &title),
        None => chart::to_svg(&frame, &model, &title),
    };
    fs::write(&svg_path, svg).with_context(|| format!("write {}", svg_path.display()))?;
    println!("charts written to {}", svg_path.display());
    Ok(())
}

fn path_arg(arg: Option<String>, default: &str) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn load_history(path: &Path) -> anyhow::Result<Option<HistoryArchive>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    HistoryArchive::from_json(&raw)
}
