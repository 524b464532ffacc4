//! Chart geometry for the rating and win-probability charts.
//!
//! All coordinates live in a fixed virtual space (`ChartFrame`); the renderer scales the
//! result to real pixels. Time is unix milliseconds at day resolution.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::keys::Player;
use crate::timeline::MergedPoint;

const X_TICKS: usize = 5;
const Y_TICKS: usize = 5;
const VALUE_MARGIN: f64 = 0.05;

pub const TOOLTIP_WIDTH: f64 = 360.0;
pub const TOOLTIP_HEIGHT: f64 = 95.0;
pub const TOOLTIP_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartFrame {
    pub width: f64,
    pub height: f64,
    pub pad: f64,
}

impl Default for ChartFrame {
    fn default() -> Self {
        Self {
            width: 980.0,
            height: 320.0,
            pad: 28.0,
        }
    }
}

impl ChartFrame {
    fn inner_width(&self) -> f64 {
        self.width - self.pad * 2.0
    }

    fn inner_height(&self) -> f64 {
        self.height - self.pad * 2.0
    }

    pub fn scale_x(&self, t: f64, t_min: f64, t_max: f64) -> f64 {
        if t_max == t_min {
            return self.pad;
        }
        self.pad + (t - t_min) / (t_max - t_min) * self.inner_width()
    }

    /// Virtual x back to a time, clamped to `[t_min, t_max]`.
    pub fn inv_scale_x(&self, x: f64, t_min: f64, t_max: f64) -> f64 {
        let w = self.inner_width();
        if w <= 0.0 {
            return t_min;
        }
        let u = clamp((x - self.pad) / w, 0.0, 1.0);
        t_min + u * (t_max - t_min)
    }

    /// Virtual x for a pointer cell in a plot `cells` wide starting at `left`.
    pub fn x_from_cell(&self, column: u16, left: u16, cells: u16) -> f64 {
        if cells <= 1 {
            return self.pad;
        }
        let offset = f64::from(column.saturating_sub(left).min(cells - 1));
        self.pad + offset / f64::from(cells - 1) * self.inner_width()
    }

    pub fn scale_y(&self, v: f64, v_min: f64, v_max: f64) -> f64 {
        let h = self.inner_height();
        if v_max == v_min {
            return self.pad + h / 2.0;
        }
        self.pad + (1.0 - (v - v_min) / (v_max - v_min)) * h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotRange {
    pub t_min: f64,
    pub t_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeValue {
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    RatingMean,
    WinProbability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub pos: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverAnchor {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    pub kind: ChartKind,
    pub range: PlotRange,
    pub p1_path: String,
    pub p2_path: String,
    pub p1_trend: Option<String>,
    pub p2_trend: Option<String>,
    pub x_ticks: Vec<AxisTick>,
    pub y_ticks: Vec<AxisTick>,
    pub match_x: Option<f64>,
    pub hover: Option<HoverAnchor>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    pub y_at_min: f64,
    pub y_at_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub date_label: String,
    pub p1_label: String,
    pub p2_label: String,
    pub mu1: f64,
    pub sd1: f64,
    pub wp1: f64,
    pub mu2: f64,
    pub sd2: f64,
    pub wp2: f64,
}

/// Real on-screen size of a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPlacement {
    pub left: f64,
    pub top: f64,
}

/// Tight min/max over finite values; `min == max` widens by one, no finite values gives `[0, 1]`.
pub fn extent(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    (min, max)
}

/// At most one point per calendar day, keeping the last one seen for that day.
pub fn collapse_by_day(series: &[MergedPoint]) -> Vec<MergedPoint> {
    let mut by_day: BTreeMap<NaiveDate, MergedPoint> = BTreeMap::new();
    for p in series {
        by_day.insert(p.day, *p);
    }
    by_day.into_values().collect()
}

/// Straight segments between consecutive points; non-finite points are skipped.
pub fn line_path(frame: &ChartFrame, points: &[TimeValue], range: &PlotRange) -> String {
    let mut d = String::new();
    for p in points {
        if !p.time.is_finite() || !p.value.is_finite() {
            continue;
        }
        let x = frame.scale_x(p.time, range.t_min, range.t_max);
        let y = frame.scale_y(p.value, range.v_min, range.v_max);
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        if d.is_empty() {
            let _ = write!(d, "M {x} {y}");
        } else {
            let _ = write!(d, " L {x} {y}");
        }
    }
    d
}

/// Horizontal-then-vertical steps: the previous value holds until the next point's x.
pub fn step_path(frame: &ChartFrame, points: &[TimeValue], range: &PlotRange) -> String {
    let mut d = String::new();
    let mut prev_y: Option<f64> = None;
    for p in points {
        let x = frame.scale_x(p.time, range.t_min, range.t_max);
        let y = frame.scale_y(p.value, range.v_min, range.v_max);
        match prev_y {
            None => {
                let _ = write!(d, "M {x} {y}");
            }
            Some(py) => {
                let _ = write!(d, " L {x} {py} L {x} {y}");
            }
        }
        prev_y = Some(y);
    }
    d
}

/// Ordinary least squares of value against time, evaluated at both ends of the range.
pub fn regression_line(points: &[TimeValue], t_min: f64, t_max: f64) -> Option<RegressionLine> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    // Times are centred on t_min; raw epoch milliseconds squared lose precision.
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for p in points {
        let x = p.time - t_min;
        sx += x;
        sy += p.value;
        sxy += x * p.value;
        sxx += x * x;
    }
    let n = n as f64;
    let denom = n * sxx - sx * sx;
    if !denom.is_finite() || denom == 0.0 {
        return None;
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;

    let y_at_min = intercept;
    let y_at_max = intercept + slope * (t_max - t_min);
    if !y_at_min.is_finite() || !y_at_max.is_finite() {
        return None;
    }
    Some(RegressionLine { y_at_min, y_at_max })
}

/// Index of the point closest in time to `t`; ties go to the earlier point.
pub fn nearest_index(series: &[MergedPoint], t: f64) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let i = series.partition_point(|p| p.time_ms() < t);
    if i == 0 {
        return Some(0);
    }
    if i >= series.len() {
        return Some(series.len() - 1);
    }
    let a = series[i - 1].time_ms();
    let b = series[i].time_ms();
    Some(if (t - a).abs() <= (b - t).abs() { i - 1 } else { i })
}

/// Maps a pointer position (virtual x) to the nearest point of the full series.
pub fn hover_index_at(
    frame: &ChartFrame,
    model: &ChartModel,
    series: &[MergedPoint],
    x: f64,
) -> Option<usize> {
    let t = frame.inv_scale_x(x, model.range.t_min, model.range.t_max);
    nearest_index(series, t)
}

fn chart_values(kind: ChartKind, p: &MergedPoint) -> (f64, f64) {
    match kind {
        ChartKind::RatingMean => (p.p1_mean, p.p2_mean),
        ChartKind::WinProbability => (p.p1_win_prob, p.p2_win_prob()),
    }
}

fn series_points(data: &[MergedPoint], player: Player, kind: ChartKind) -> Vec<TimeValue> {
    data.iter()
        .map(|p| {
            let (y1, y2) = chart_values(kind, p);
            TimeValue {
                time: p.time_ms(),
                value: match player {
                    Player::P1 => y1,
                    Player::P2 => y2,
                },
            }
        })
        .collect()
}

/// Builds a chart whose value axis is the padded data extent.
///
/// Needs at least two distinct days; rating charts use straight lines and may carry trend
/// lines, probability charts use steps with the range clamped into `[0, 1]`.
pub fn build_chart(
    frame: &ChartFrame,
    series: &[MergedPoint],
    kind: ChartKind,
    match_time: Option<f64>,
    hover_idx: Option<usize>,
    show_trend: bool,
) -> Option<ChartModel> {
    if series.len() < 2 {
        return None;
    }
    let data = collapse_by_day(series);
    let (first, last) = (data.first()?, data.last()?);
    if data.len() < 2 {
        return None;
    }
    let (t_min, t_max) = (first.time_ms(), last.time_ms());

    let (min, max) = extent(data.iter().flat_map(|p| {
        let (a, b) = chart_values(kind, p);
        [a, b]
    }));
    let margin = (max - min).max(1e-9) * VALUE_MARGIN;
    let (mut v_min, mut v_max) = (min - margin, max + margin);
    if kind == ChartKind::WinProbability {
        v_min = v_min.max(0.0);
        v_max = v_max.min(1.0);
    }
    let range = PlotRange {
        t_min,
        t_max,
        v_min,
        v_max,
    };

    let p1_points = series_points(&data, Player::P1, kind);
    let p2_points = series_points(&data, Player::P2, kind);
    let (p1_path, p2_path) = match kind {
        ChartKind::RatingMean => (
            line_path(frame, &p1_points, &range),
            line_path(frame, &p2_points, &range),
        ),
        ChartKind::WinProbability => (
            step_path(frame, &p1_points, &range),
            step_path(frame, &p2_points, &range),
        ),
    };

    let (p1_trend, p2_trend) = if show_trend && kind == ChartKind::RatingMean {
        (
            trend_path(frame, &p1_points, &range),
            trend_path(frame, &p2_points, &range),
        )
    } else {
        (None, None)
    };

    let hover = hover_idx
        .and_then(|idx| series.get(idx))
        .map(|p| hover_anchor(frame, &range, p, kind));

    Some(ChartModel {
        kind,
        range,
        p1_path,
        p2_path,
        p1_trend,
        p2_trend,
        x_ticks: x_ticks(frame, &range),
        y_ticks: y_ticks(frame, &range, kind),
        match_x: match_marker(frame, &range, match_time),
        hover,
    })
}

/// Probability chart on a fixed `[0, 1]` value axis.
pub fn build_win_prob_chart(
    frame: &ChartFrame,
    series: &[MergedPoint],
    match_time: Option<f64>,
    hover_idx: Option<usize>,
) -> Option<ChartModel> {
    if series.len() < 2 {
        return None;
    }
    let data = collapse_by_day(series);
    if data.len() < 2 {
        return None;
    }
    let range = PlotRange {
        t_min: data[0].time_ms(),
        t_max: data[data.len() - 1].time_ms(),
        v_min: 0.0,
        v_max: 1.0,
    };

    let p1_points: Vec<TimeValue> = data
        .iter()
        .map(|p| TimeValue {
            time: p.time_ms(),
            value: clamp(p.p1_win_prob, 0.0, 1.0),
        })
        .collect();
    let p2_points: Vec<TimeValue> = p1_points
        .iter()
        .map(|p| TimeValue {
            time: p.time,
            value: 1.0 - p.value,
        })
        .collect();

    let hover = hover_idx
        .and_then(|idx| series.get(idx))
        .map(|p| hover_anchor(frame, &range, p, ChartKind::WinProbability));

    Some(ChartModel {
        kind: ChartKind::WinProbability,
        range,
        p1_path: step_path(frame, &p1_points, &range),
        p2_path: step_path(frame, &p2_points, &range),
        p1_trend: None,
        p2_trend: None,
        x_ticks: x_ticks(frame, &range),
        y_ticks: y_ticks(frame, &range, ChartKind::WinProbability),
        match_x: match_marker(frame, &range, match_time),
        hover,
    })
}

fn trend_path(frame: &ChartFrame, points: &[TimeValue], range: &PlotRange) -> Option<String> {
    let line = regression_line(points, range.t_min, range.t_max)?;
    let x1 = frame.scale_x(range.t_min, range.t_min, range.t_max);
    let x2 = frame.scale_x(range.t_max, range.t_min, range.t_max);
    let y1 = frame.scale_y(line.y_at_min, range.v_min, range.v_max);
    let y2 = frame.scale_y(line.y_at_max, range.v_min, range.v_max);
    Some(format!("M {x1} {y1} L {x2} {y2}"))
}

fn hover_anchor(frame: &ChartFrame, range: &PlotRange, p: &MergedPoint, kind: ChartKind) -> HoverAnchor {
    let t = clamp(p.time_ms(), range.t_min, range.t_max);
    let (y1, y2) = match kind {
        ChartKind::RatingMean => (p.p1_mean, p.p2_mean),
        ChartKind::WinProbability => {
            let wp1 = clamp(p.p1_win_prob, 0.0, 1.0);
            (wp1, 1.0 - wp1)
        }
    };
    HoverAnchor {
        x: frame.scale_x(t, range.t_min, range.t_max),
        y1: frame.scale_y(y1, range.v_min, range.v_max),
        y2: frame.scale_y(y2, range.v_min, range.v_max),
    }
}

fn match_marker(frame: &ChartFrame, range: &PlotRange, match_time: Option<f64>) -> Option<f64> {
    let t = match_time.filter(|t| t.is_finite())?;
    if t < range.t_min || t > range.t_max {
        return None;
    }
    Some(frame.scale_x(t, range.t_min, range.t_max))
}

fn x_ticks(frame: &ChartFrame, range: &PlotRange) -> Vec<AxisTick> {
    (0..X_TICKS)
        .map(|i| {
            let t = range.t_min + (range.t_max - range.t_min) * i as f64 / (X_TICKS - 1) as f64;
            AxisTick {
                pos: frame.scale_x(t, range.t_min, range.t_max),
                label: format_date_short(t),
            }
        })
        .collect()
}

fn y_ticks(frame: &ChartFrame, range: &PlotRange, kind: ChartKind) -> Vec<AxisTick> {
    (0..Y_TICKS)
        .map(|i| {
            let v = range.v_min + (range.v_max - range.v_min) * i as f64 / (Y_TICKS - 1) as f64;
            let label = match kind {
                ChartKind::WinProbability => format!("{}%", (v * 100.0).round() as i64),
                ChartKind::RatingMean => format!("{v:.1}"),
            };
            AxisTick {
                pos: frame.scale_y(v, range.v_min, range.v_max),
                label,
            }
        })
        .collect()
}

/// `dd.mm.yyyy` in UTC.
pub fn format_date_short(ms: f64) -> String {
    if !ms.is_finite() {
        return String::new();
    }
    DateTime::from_timestamp_millis(ms as i64)
        .map(|dt| dt.format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

/// Tooltip content for one point of the merged series.
pub fn tooltip_at(series: &[MergedPoint], idx: usize, labels: (&str, &str)) -> Option<Tooltip> {
    let p = series.get(idx)?;
    let wp1 = clamp(p.p1_win_prob, 0.0, 1.0);
    Some(Tooltip {
        date_label: format_date_short(p.time_ms()),
        p1_label: labels.0.to_string(),
        p2_label: labels.1.to_string(),
        mu1: p.p1_mean,
        sd1: p.p1_deviation,
        wp1,
        mu2: p.p2_mean,
        sd2: p.p2_deviation,
        wp2: 1.0 - wp1,
    })
}

/// Positions the tooltip box centred 10 px above a virtual anchor, kept inside the viewport.
pub fn place_tooltip(
    frame: &ChartFrame,
    anchor_x: f64,
    anchor_y: f64,
    viewport: Viewport,
) -> TooltipPlacement {
    let sx = viewport.width / frame.width;
    let sy = viewport.height / frame.height;
    let x_px = anchor_x * sx;
    let y_px = anchor_y * sy;
    TooltipPlacement {
        left: clamp(
            x_px - TOOLTIP_WIDTH / 2.0,
            TOOLTIP_MARGIN,
            viewport.width - TOOLTIP_WIDTH - TOOLTIP_MARGIN,
        ),
        top: clamp(
            y_px - TOOLTIP_HEIGHT - 10.0,
            TOOLTIP_MARGIN,
            viewport.height - TOOLTIP_HEIGHT - TOOLTIP_MARGIN,
        ),
    }
}

const P1_COLOR: &str = "#1f77b4";
const P2_COLOR: &str = "#d62728";

/// Standalone SVG document for one chart model.
pub fn to_svg(frame: &ChartFrame, model: &ChartModel, title: &str) -> String {
    to_svg_stack(frame, &[model], title)
}

/// Standalone SVG document with the models stacked vertically, one frame each.
pub fn to_svg_stack(frame: &ChartFrame, models: &[&ChartModel], title: &str) -> String {
    let mut svg = String::new();
    let w = frame.width;
    let total_h = frame.height * models.len().max(1) as f64;
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {total_h}" width="{w}" height="{total_h}" font-family="sans-serif" font-size="10">"#
    );
    let _ = writeln!(svg, "  <title>{}</title>", escape_xml(title));
    let _ = writeln!(
        svg,
        r##"  <rect x="0" y="0" width="{w}" height="{total_h}" fill="#ffffff"/>"##
    );
    for (i, model) in models.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"  <g transform="translate(0 {offset})">"#,
            offset = frame.height * i as f64
        );
        write_chart_body(&mut svg, frame, model);
        svg.push_str("  </g>\n");
    }
    svg.push_str("</svg>\n");
    svg
}

fn write_chart_body(svg: &mut String, frame: &ChartFrame, model: &ChartModel) {
    let (w, h, pad) = (frame.width, frame.height, frame.pad);
    for tick in &model.y_ticks {
        let _ = writeln!(
            svg,
            r##"  <line x1="{pad}" y1="{y}" x2="{x2}" y2="{y}" stroke="#e5e5e5"/>"##,
            y = tick.pos,
            x2 = w - pad
        );
        let _ = writeln!(
            svg,
            r##"  <text x="2" y="{y}" fill="#666666">{}</text>"##,
            escape_xml(&tick.label),
            y = tick.pos - 2.0
        );
    }
    for tick in &model.x_ticks {
        let _ = writeln!(
            svg,
            r##"  <text x="{x}" y="{y}" fill="#666666" text-anchor="middle">{}</text>"##,
            escape_xml(&tick.label),
            x = tick.pos,
            y = h - 8.0
        );
    }

    if let Some(x) = model.match_x {
        let _ = writeln!(
            svg,
            r##"  <line x1="{x}" y1="{pad}" x2="{x}" y2="{y2}" stroke="#999999" stroke-dasharray="4 3"/>"##,
            y2 = h - pad
        );
    }

    for (d, color) in [(&model.p1_path, P1_COLOR), (&model.p2_path, P2_COLOR)] {
        if d.is_empty() {
            continue;
        }
        let _ = writeln!(
            svg,
            r#"  <path d="{d}" fill="none" stroke="{color}" stroke-width="2"/>"#
        );
    }
    for (d, color) in [(&model.p1_trend, P1_COLOR), (&model.p2_trend, P2_COLOR)] {
        if let Some(d) = d {
            let _ = writeln!(
                svg,
                r#"  <path d="{d}" fill="none" stroke="{color}" stroke-width="1" stroke-dasharray="6 4" opacity="0.7"/>"#
            );
        }
    }

    if let Some(hover) = model.hover {
        let _ = writeln!(
            svg,
            r#"  <circle cx="{x}" cy="{y}" r="3" fill="{P1_COLOR}"/>"#,
            x = hover.x,
            y = hover.y1
        );
        let _ = writeln!(
            svg,
            r#"  <circle cx="{x}" cy="{y}" r="3" fill="{P2_COLOR}"/>"#,
            x = hover.x,
            y = hover.y2
        );
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
