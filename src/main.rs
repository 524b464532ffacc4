use std::cell::Cell;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Sparkline};

use tennis_edge::archive_fetch::ArchiveClient;
use tennis_edge::chart::ChartFrame;
use tennis_edge::config::Config;
use tennis_edge::details::{self, fmt_days};
use tennis_edge::feed::spawn_provider;
use tennis_edge::keys::{Player, RoleSide, SurfaceScope};
use tennis_edge::logging;
use tennis_edge::odds::{self, MarketSummary};
use tennis_edge::record::parse_timestamp;
use tennis_edge::state::{
    Delta, DetailsState, DetailsTab, HistoryStatus, LoadStatus, MatchRequest, ProviderCommand,
    apply_delta,
};
use tennis_edge::timeline::MergedPoint;

struct App {
    state: DetailsState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    input: String,
    request: Option<MatchRequest>,
    histories_requested: Option<u64>,
    help_overlay: bool,
    /// Plot cells of the chart drawn last frame, if any.
    plot_area: Cell<Option<Rect>>,
}

impl App {
    fn new(config: &Config, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: DetailsState::new(config.show_trend, config.edge_threshold),
            should_quit: false,
            cmd_tx,
            input: String::new(),
            request: None,
            histories_requested: None,
            help_overlay: false,
            plot_area: Cell::new(None),
        }
    }

    fn open(&mut self, request: MatchRequest) {
        self.request = Some(request);
        self.histories_requested = None;
        let cmd = self.state.open_match(request);
        self.send(cmd);
    }

    fn send(&self, cmd: ProviderCommand) {
        if let Some(tx) = self.cmd_tx.as_ref() {
            let _ = tx.send(cmd);
        }
    }

    /// Requests both players' histories once per loaded record.
    fn maybe_request_histories(&mut self) {
        let Some(active) = self.state.active else {
            return;
        };
        if self.state.status != LoadStatus::Ready
            || self.histories_requested == Some(active.generation)
        {
            return;
        }
        self.histories_requested = Some(active.generation);
        for cmd in self.state.history_commands() {
            self.send(cmd);
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(
            mouse.kind,
            MouseEventKind::Moved | MouseEventKind::Down(_) | MouseEventKind::Drag(_)
        ) {
            return;
        }
        let Some(area) = self.plot_area.get() else {
            return;
        };
        let inside = mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height;
        if inside {
            let frame = ChartFrame::default();
            let x = frame.x_from_cell(mouse.column, area.x, area.width);
            self.state.hover_at(&frame, x);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Esc => {
                self.input.clear();
                self.request = None;
                self.state.close();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                if let Ok(match_id) = self.input.trim().parse::<i64>() {
                    self.input.clear();
                    self.open(MatchRequest::new(match_id));
                } else if let Some(request) = self.request {
                    self.open(request);
                }
            }
            KeyCode::Tab => self.state.tab = self.state.tab.next(),
            KeyCode::BackTab => self.state.tab = self.state.tab.prev(),
            KeyCode::Left => self.state.step_hover(-1),
            KeyCode::Right => self.state.step_hover(1),
            KeyCode::Char('c') => self.state.clear_hover(),
            KeyCode::Char('m') => self.state.cycle_rating_mode(),
            KeyCode::Char('s') => self.state.cycle_surface_scope(),
            KeyCode::Char('t') => self.state.toggle_trend(),
            KeyCode::Char('u') => self.state.cycle_perf_unit(),
            KeyCode::Char('w') => self.state.cycle_perf_time(),
            KeyCode::Char('f') => self.state.cycle_perf_surface(),
            KeyCode::Char('r') => self.state.cycle_role_time(),
            KeyCode::Char('h') => self.state.cycle_h2h_mode(),
            KeyCode::Char('g') => self.state.cycle_h2h_surface(),
            KeyCode::Char('b') => {
                let rows = self
                    .state
                    .record
                    .as_ref()
                    .map(|r| r.odds_rows())
                    .unwrap_or_default();
                let latest = odds::latest_by_bookie(&rows);
                self.state.cycle_bookie(&latest);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let config = Config::load();
    let request = parse_args(std::env::args().skip(1))?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    logging::init(tx.clone(), config.log_level)?;
    let client = ArchiveClient::new(&config)?;
    spawn_provider(tx, cmd_rx, client);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config, Some(cmd_tx));
    if let Some(request) = request {
        app.open(request);
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

/// `[match_id] [--start <rfc3339>] [--finished]`
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<MatchRequest>> {
    let mut request: Option<MatchRequest> = None;
    let mut start_time = None;
    let mut finished = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--finished" => finished = true,
            "--start" => {
                let raw = args.next().context("--start needs a timestamp")?;
                start_time = Some(parse_timestamp(&raw).context("invalid --start timestamp")?);
            }
            other => {
                let match_id = other
                    .parse::<i64>()
                    .with_context(|| format!("invalid match id: {other}"))?;
                request = Some(MatchRequest::new(match_id));
            }
        }
    }
    Ok(request.map(|r| MatchRequest {
        start_time,
        finished,
        ..r
    }))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.maybe_request_histories();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let state = &app.state;
    let plot = match (&state.status, state.record.is_some()) {
        (LoadStatus::Ready, true) => render_tab(frame, chunks[1], state),
        _ => {
            let body = Paragraph::new(status_text(&state.status))
                .block(Block::default().title("Match").borders(Borders::ALL));
            frame.render_widget(body, chunks[1]);
            None
        }
    };
    app.plot_area.set(plot);

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "Tab/S-Tab Tabs | ←/→ Hover | m Mode | s Surface | t Trend | 0-9+Enter Open | Esc Close | ? Help | q Quit",
    );
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let tabs = DetailsTab::ALL
        .iter()
        .map(|t| {
            if *t == state.tab {
                format!("[{}]", t.label())
            } else {
                t.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let active = state
        .active
        .map(|a| format!("match {}", a.match_id))
        .unwrap_or_else(|| "no match".to_string());
    let input = if app.input.is_empty() {
        String::new()
    } else {
        format!(" | open: {}_", app.input)
    };
    format!(
        "TENNIS EDGE | {active} | {} {}{input}\n{tabs}",
        state.rating_mode.code(),
        state.surface_scope.code()
    )
}

fn status_text(status: &LoadStatus) -> String {
    match status {
        LoadStatus::Idle => "Type a match id and press Enter.".to_string(),
        LoadStatus::Loading => "Loading match details...".to_string(),
        LoadStatus::Ready => "No record.".to_string(),
        LoadStatus::Locked {
            unlocks_at,
            lock_hours,
        } => format!(
            "Details are locked until {} UTC ({lock_hours}h before start).\nPremium or trial access opens them now.",
            unlocks_at.format("%d.%m.%Y %H:%M")
        ),
        LoadStatus::Failed(message) => format!("Could not load match details.\n{message}"),
    }
}

/// Renders the selected tab; returns the chart cells that take pointer hover.
fn render_tab(frame: &mut Frame, area: Rect, state: &DetailsState) -> Option<Rect> {
    match state.tab {
        DetailsTab::Ratings => return Some(render_ratings(frame, area, state)),
        DetailsTab::WinProb => return Some(render_win_prob(frame, area, state)),
        DetailsTab::Overview => render_text(frame, area, "Overview", overview_text(state)),
        DetailsTab::Performance => render_text(frame, area, "Performance", performance_text(state)),
        DetailsTab::Form => render_text(frame, area, "Form", form_text(state)),
        DetailsTab::Roles => render_text(frame, area, "Favourite / Underdog", roles_text(state)),
        DetailsTab::H2h => render_text(frame, area, "Head to head", h2h_text(state)),
        DetailsTab::Odds => render_text(frame, area, "Odds", odds_text(state)),
    }
    None
}

fn render_text(frame: &mut Frame, area: Rect, title: &str, text: String) {
    let widget = Paragraph::new(text).block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn overview_text(state: &DetailsState) -> String {
    let Some(ov) = state.overview(Utc::now().date_naive()) else {
        return String::new();
    };
    let h = &ov.header;
    let mut lines = vec![
        format!("{} ({})  {}  {}", h.name, h.iso3, h.round, h.surface),
        format!(
            "{}  Prize {}  Strength {:.1}★",
            h.date_text,
            h.prize_text,
            details::rating_to_stars(h.strength)
        ),
        String::new(),
    ];
    for player in Player::ALL {
        let c = ov.card(player);
        lines.push(format!(
            "{}  rank {}  seed {}  born {}  plays {}  {} / {}",
            c.label(),
            c.rank.map(|r| format!("{r:.0}")).unwrap_or_else(|| "—".to_string()),
            c.seed.clone().unwrap_or_else(|| "—".to_string()),
            c.born,
            c.plays,
            c.height,
            c.weight
        ));
        lines.push(format!(
            "    model {}  odds {}",
            pct_or_dash(c.model_prob),
            c.odds.map(|o| format!("{o:.2}")).unwrap_or_else(|| "—".to_string())
        ));
    }
    lines.push(String::new());
    if ov.finished {
        lines.push(format!("Result {}  ({})", ov.score_main, ov.score_sets));
    } else {
        lines.push("Not played yet".to_string());
    }
    lines.push(format!(
        "Edge P1 {}  P2 {}",
        signed_pct(ov.edge_p1),
        signed_pct(ov.edge_p2)
    ));
    if let Some(side) = ov.value_side {
        let profit = ov
            .profit
            .map(|p| format!("  settled {p:+.2}u"))
            .unwrap_or_default();
        lines.push(format!("Value pick: {}{profit}", ov.card(side).label()));
    }
    lines.join("\n")
}

fn render_ratings(frame: &mut Frame, area: Rect, state: &DetailsState) -> Rect {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(44)])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    let mut plot = rows[0];
    for (player, row) in [(Player::P1, rows[0]), (Player::P2, rows[1])] {
        let data = spark_values(state, None, |p| match player {
            Player::P1 => p.p1_mean,
            Player::P2 => p.p2_mean,
        });
        let color = match player {
            Player::P1 => Color::Green,
            Player::P2 => Color::Red,
        };
        let block = Block::default()
            .title(format!("{} rating mean", player.label()))
            .borders(Borders::ALL);
        if player == Player::P1 {
            plot = block.inner(row);
        }
        let spark = Sparkline::default()
            .block(block)
            .data(&data)
            .style(Style::default().fg(color));
        frame.render_widget(spark, row);
    }

    render_text(frame, columns[1], "Snapshot", rating_side_text(state));
    plot
}

fn rating_side_text(state: &DetailsState) -> String {
    let mut lines = Vec::new();
    if let HistoryStatus::Unavailable(message) = &state.history_status {
        lines.push(format!("History unavailable: {message}"));
    } else if state.history_status == HistoryStatus::Loading {
        lines.push("Loading rating history...".to_string());
    }
    if let Some(model) = state.rating_chart(&ChartFrame::default()) {
        lines.push(format!(
            "Range {:.1} .. {:.1}  ({} points)",
            model.range.v_min,
            model.range.v_max,
            state.merged.len()
        ));
        if state.show_trend {
            lines.push(format!(
                "Trend P1 {}  P2 {}",
                trend_label(model.p1_trend.is_some()),
                trend_label(model.p2_trend.is_some())
            ));
        }
    }
    if let Some(tip) = state.tooltip() {
        lines.push(String::new());
        lines.push(tip.date_label.clone());
        lines.push(format!(
            "{}  μ {:.2}  σ {:.2}  {:.0}%",
            tip.p1_label,
            tip.mu1,
            tip.sd1,
            tip.wp1 * 100.0
        ));
        lines.push(format!(
            "{}  μ {:.2}  σ {:.2}  {:.0}%",
            tip.p2_label,
            tip.mu2,
            tip.sd2,
            tip.wp2 * 100.0
        ));
    }
    if let Some(record) = state.record.as_ref() {
        let summary = details::rating_summary(record, state.rating_mode, state.surface_scope);
        lines.push(String::new());
        lines.push(format!("Stored ({:?})", summary.phase));
        lines.push(format!(
            "P1 {}  P2 {}  win {}",
            num_or_dash(summary.p1_mean),
            num_or_dash(summary.p2_mean),
            pct_or_dash(summary.p1_win_prob)
        ));
    }
    lines.join("\n")
}

fn trend_label(present: bool) -> &'static str {
    if present { "on" } else { "n/a" }
}

fn render_win_prob(frame: &mut Frame, area: Rect, state: &DetailsState) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);

    let data = spark_values(state, Some(0.0), |p| p.p1_win_prob * 100.0);
    let block = Block::default().title("P1 win probability").borders(Borders::ALL);
    let plot = block.inner(rows[0]);
    let spark = Sparkline::default()
        .block(block)
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Green));
    frame.render_widget(spark, rows[0]);

    if let Some(tip) = state.tooltip() {
        let chart = win_bar_chart(tip.wp1, tip.wp2).block(
            Block::default()
                .title(format!("{}  {} / {}", tip.date_label, tip.p1_label, tip.p2_label))
                .borders(Borders::ALL),
        );
        frame.render_widget(chart, rows[1]);
    }
    plot
}

fn win_bar_chart(p1: f64, p2: f64) -> BarChart<'static> {
    let p1_bar = Bar::default()
        .value((p1 * 100.0).round() as u64)
        .text_value(format!("{:.0}%", p1 * 100.0))
        .style(Style::default().fg(Color::Green));
    let p2_bar = Bar::default()
        .value((p2 * 100.0).round() as u64)
        .text_value(format!("{:.0}%", p2 * 100.0))
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[p1_bar, p2_bar]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

/// Chart values shifted to start at `floor` (the series minimum by default), in tenths.
fn spark_values(
    state: &DetailsState,
    floor: Option<f64>,
    value: impl Fn(&MergedPoint) -> f64,
) -> Vec<u64> {
    let values: Vec<f64> = state.merged.iter().map(value).collect();
    let Some(floor) = floor.or_else(|| values.iter().copied().reduce(f64::min)) else {
        return Vec::new();
    };
    values
        .iter()
        .map(|v| ((v - floor) * 10.0).max(0.0).round() as u64)
        .collect()
}

fn performance_text(state: &DetailsState) -> String {
    let Some(record) = state.record.as_ref() else {
        return String::new();
    };
    let mut lines = vec![format!(
        "{} | {} | {}   (u unit, w window, f surface)",
        state.perf_unit.label(),
        state.perf_time.label(),
        state.perf_surface.code()
    )];
    for player in Player::ALL {
        let line = details::perf(
            record,
            state.perf_unit,
            player,
            state.perf_time,
            state.perf_surface,
        );
        lines.push(format!(
            "{}  W {:.0}  L {:.0}  {:.1}%",
            player.label(),
            line.wins,
            line.losses,
            line.win_pct
        ));
    }
    lines.join("\n")
}

fn form_text(state: &DetailsState) -> String {
    let Some(record) = state.record.as_ref() else {
        return String::new();
    };
    let mut lines = vec![format!("Surface {}   (f surface)", state.perf_surface.code())];
    for player in Player::ALL {
        let f = details::form(record, player, state.perf_surface);
        lines.push(format!(
            "{}  last {} ({} days)  since win {}  since loss {}",
            player.label(),
            f.last_result.label(),
            fmt_days(f.days_since_match),
            fmt_days(f.days_since_win),
            fmt_days(f.days_since_loss)
        ));
    }
    lines.join("\n")
}

fn roles_text(state: &DetailsState) -> String {
    let Some(record) = state.record.as_ref() else {
        return String::new();
    };
    let mut lines = vec![format!("Window {}   (r window)", state.role_time.label())];
    for player in Player::ALL {
        for side in [RoleSide::Favourite, RoleSide::Underdog] {
            let r = details::role_line(record, player, side, state.role_time);
            lines.push(format!(
                "{} {:<9} {:.0}-{:.0}  {:.1}%  share {:.1}%  avg p won {:.2} lost {:.2}",
                player.label(),
                format!("{side:?}"),
                r.wins,
                r.losses,
                r.win_pct,
                r.share_pct,
                r.avg_win_prob_won,
                r.avg_win_prob_lost
            ));
        }
    }
    lines.join("\n")
}

fn h2h_text(state: &DetailsState) -> String {
    let Some(record) = state.record.as_ref() else {
        return String::new();
    };
    let old = !record.is_finished();
    let (w1, w2) = details::h2h_record(record, state.h2h_surface, old);
    let mut lines = vec![
        format!(
            "{} {}   (h mode, g surface)",
            state.h2h_mode.code(),
            state.h2h_surface.code()
        ),
        format!("Wins  P1 {w1:.0} - {w2:.0} P2"),
    ];
    for player in Player::ALL {
        let pair = match state.h2h_surface {
            SurfaceScope::All => details::h2h_rating(record, state.h2h_mode, player, old),
            SurfaceScope::Only(surface) => {
                details::h2h_surface_rating(record, state.h2h_mode, surface, player, old)
            }
        };
        lines.push(format!(
            "{}  μ {:.2}  σ {:.2}",
            player.label(),
            pair.mean,
            pair.deviation
        ));
    }
    let wp = details::h2h_win_prob(record, state.h2h_mode, state.h2h_surface);
    lines.push(format!("P1 win probability {:.1}%", wp * 100.0));
    lines.join("\n")
}

fn odds_text(state: &DetailsState) -> String {
    let Some(record) = state.record.as_ref() else {
        return String::new();
    };
    let rows = record.odds_rows();
    let latest = odds::latest_by_bookie(&rows);
    if latest.is_empty() {
        return "No bookmaker quotes.".to_string();
    }
    let mut lines = Vec::new();
    for player in Player::ALL {
        let best = odds::best_price(&rows, player)
            .map(|r| format!("{:.2} @ {}", r.price(player), r.bookie_name))
            .unwrap_or_else(|| "—".to_string());
        lines.push(format!(
            "{}  {}  best {best}",
            player.label(),
            summary_text(odds::market_summary(&rows, player))
        ));
    }
    lines.push(String::new());
    for row in &latest {
        let marker = if state.selected_bookie == Some(row.bookie_id) {
            ">"
        } else {
            " "
        };
        lines.push(format!(
            "{marker} {:<18} {:>6.2} {:>6.2}  margin {}  {}",
            row.bookie_name,
            row.p1_odds,
            row.p2_odds,
            row.overround()
                .map(|o| format!("{:.1}%", o * 100.0))
                .unwrap_or_else(|| "—".to_string()),
            quoted_text(row.quoted_at)
        ));
    }
    if let Some(id) = state.selected_bookie {
        lines.push(String::new());
        lines.push("History (b next bookie)".to_string());
        for row in odds::bookie_history(&rows, id) {
            lines.push(format!(
                "  {}  {:.2} / {:.2}",
                quoted_text(row.quoted_at),
                row.p1_odds,
                row.p2_odds
            ));
        }
    }
    lines.join("\n")
}

fn summary_text(summary: Option<MarketSummary>) -> String {
    match summary {
        Some(s) => format!("min {:.2}  median {:.2}  max {:.2}", s.min, s.median, s.max),
        None => "no clean quotes".to_string(),
    }
}

fn quoted_text(at: Option<chrono::DateTime<Utc>>) -> String {
    at.map(|t| t.format("%d.%m %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn pct_or_dash(p: Option<f64>) -> String {
    p.map(|p| format!("{:.1}%", p * 100.0))
        .unwrap_or_else(|| "—".to_string())
}

fn signed_pct(p: Option<f64>) -> String {
    p.map(|p| format!("{:+.1}%", p * 100.0))
        .unwrap_or_else(|| "—".to_string())
}

fn num_or_dash(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "—".to_string())
}

fn console_text(state: &DetailsState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Tennis Edge - Help",
        "",
        "  0-9 Enter    Open match id (Enter alone reloads)",
        "  Esc          Close match",
        "  Tab / S-Tab  Next / previous tab",
        "  ← / →, mouse Move hover, c clears",
        "  m / s        Rating mode / surface",
        "  t            Trend lines",
        "  u / w / f    Performance unit / window / surface",
        "  r            Fav/Dog window",
        "  h / g        H2H mode / surface",
        "  b            Next bookmaker history",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
