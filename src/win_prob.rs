use crate::keys::Player;

/// Default skill prior of the rating system.
pub const DEFAULT_MEAN: f64 = 25.0;
pub const DEFAULT_DEVIATION: f64 = DEFAULT_MEAN / 3.0;

/// Per-performance variance constant (beta) of the rating system.
pub const BETA: f64 = DEFAULT_MEAN / 6.0;

/// Edge a side must reach before it is flagged as a value bet.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinProbability {
    pub p1: f64,
}

impl WinProbability {
    pub fn from_ratings(p1_mean: f64, p1_dev: f64, p2_mean: f64, p2_dev: f64) -> Self {
        Self {
            p1: p1_win_probability(p1_mean, p1_dev, p2_mean, p2_dev),
        }
    }

    pub fn p2(self) -> f64 {
        1.0 - self.p1
    }

    pub fn for_player(self, player: Player) -> f64 {
        match player {
            Player::P1 => self.p1,
            Player::P2 => self.p2(),
        }
    }
}

/// `P(player 1 beats player 2)` under the Gaussian skill model.
pub fn p1_win_probability(p1_mean: f64, p1_dev: f64, p2_mean: f64, p2_dev: f64) -> f64 {
    let denom = (2.0 * BETA * BETA + p1_dev * p1_dev + p2_dev * p2_dev).sqrt();
    normal_cdf((p1_mean - p2_mean) / denom)
}

pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

pub fn implied_probability(odds: f64) -> Option<f64> {
    if !odds.is_finite() || odds <= 0.0 {
        return None;
    }
    Some(1.0 / odds)
}

/// Model probability minus the bookmaker's implied probability.
pub fn edge(model_prob: f64, odds: f64) -> Option<f64> {
    if !model_prob.is_finite() {
        return None;
    }
    implied_probability(odds).map(|imp| model_prob - imp)
}

/// The single side whose edge reaches `threshold`; `None` when neither or both do.
pub fn pick_value_side(edge_p1: Option<f64>, edge_p2: Option<f64>, threshold: f64) -> Option<Player> {
    let ok1 = edge_p1.is_some_and(|e| e >= threshold);
    let ok2 = edge_p2.is_some_and(|e| e >= threshold);
    match (ok1, ok2) {
        (true, false) => Some(Player::P1),
        (false, true) => Some(Player::P2),
        _ => None,
    }
}

/// Profit/loss of a one-unit stake on `side` once the match is finished.
///
/// Archived finished records list the winner as player 1, so a player-1 pick pays
/// `odds - 1` and a player-2 pick loses the stake.
pub fn settle_flat_stake(side: Option<Player>, finished: bool, p1_odds: Option<f64>) -> Option<f64> {
    if !finished {
        return None;
    }
    match side? {
        Player::P1 => p1_odds.filter(|o| o.is_finite() && *o > 0.0).map(|o| o - 1.0),
        Player::P2 => Some(-1.0),
    }
}

/// Percent (0..100) model output to a probability in [0, 1].
pub fn prob_from_pct(pct: f64) -> Option<f64> {
    if !pct.is_finite() {
        return None;
    }
    Some((pct / 100.0).clamp(0.0, 1.0))
}

/// Accepts either a 0..1 probability or a percent value.
pub fn normalize_prob(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    Some(if raw > 1.0 { raw / 100.0 } else { raw })
}
