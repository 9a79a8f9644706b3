//! Time-decay feed ranking.
//!
//! An item's score combines a piecewise freshness factor over its age with a
//! vote weight that boosts upvotes logarithmically and amplifies downvotes.
//! Scores are clamped so extreme vote counts cannot destabilise the ordering.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::item::{age_hours_between, MapItem};
use crate::GeofeedError;

/// Ranking configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    // Freshness curve
    pub fresh_boost: f64,
    pub fresh_window_hours: f64,
    pub peak_window_hours: f64,
    pub grace_factor: f64,
    pub grace_period_hours: f64,
    pub floor_factor: f64,
    pub decay_period_hours: f64,

    // Votes
    pub engagement_boost: f64,
    pub downvote_penalty: f64,

    // Bounds
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            // Freshness curve
            fresh_boost: 1.5,
            fresh_window_hours: 12.0,
            peak_window_hours: 24.0,
            grace_factor: 0.5,
            grace_period_hours: 48.0,
            floor_factor: 0.05,
            decay_period_hours: 168.0,

            // Votes
            engagement_boost: 0.5,
            downvote_penalty: 1.5,

            // Bounds
            min_score: -100.0,
            max_score: 1000.0,
        }
    }
}

impl RankingConfig {
    pub fn with_engagement_boost(mut self, engagement_boost: f64) -> Self {
        self.engagement_boost = engagement_boost;
        self
    }

    pub fn with_downvote_penalty(mut self, downvote_penalty: f64) -> Self {
        self.downvote_penalty = downvote_penalty;
        self
    }

    pub fn with_score_bounds(mut self, min_score: f64, max_score: f64) -> Self {
        self.min_score = min_score;
        self.max_score = max_score;
        self
    }

    /// Strict check for configuration supplied from outside the process.
    pub fn validate(&self) -> Result<(), GeofeedError> {
        let all_finite = [
            self.fresh_boost,
            self.fresh_window_hours,
            self.peak_window_hours,
            self.grace_factor,
            self.grace_period_hours,
            self.floor_factor,
            self.decay_period_hours,
            self.engagement_boost,
            self.downvote_penalty,
            self.min_score,
            self.max_score,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(GeofeedError::InvalidConfig(
                "ranking parameters must be finite numbers",
            ));
        }
        if !(self.fresh_window_hours >= 0.0
            && self.fresh_window_hours <= self.peak_window_hours
            && self.peak_window_hours <= self.grace_period_hours
            && self.grace_period_hours <= self.decay_period_hours)
        {
            return Err(GeofeedError::InvalidConfig(
                "decay windows must satisfy 0 <= fresh <= peak <= grace <= decay",
            ));
        }
        if !(self.fresh_boost >= 1.0
            && self.grace_factor <= 1.0
            && self.floor_factor > 0.0
            && self.floor_factor <= self.grace_factor)
        {
            return Err(GeofeedError::InvalidConfig(
                "freshness factors must satisfy \
                 fresh_boost >= 1 >= grace_factor >= floor_factor > 0",
            ));
        }
        if self.engagement_boost < 0.0 || self.downvote_penalty < 0.0 {
            return Err(GeofeedError::InvalidConfig(
                "engagement_boost and downvote_penalty must be non-negative",
            ));
        }
        if self.min_score > self.max_score {
            return Err(GeofeedError::InvalidConfig(
                "min_score must not exceed max_score",
            ));
        }
        Ok(())
    }
}

/// Freshness multiplier for an item `age_hours` old.
///
/// Future timestamps (negative age) get the full fresh boost. The curve is
/// non-increasing in age for any config that passes
/// [`RankingConfig::validate`]; degenerate windows collapse instead of
/// dividing by zero. A NaN age falls through to the floor factor.
pub fn time_factor(age_hours: f64, config: &RankingConfig) -> f64 {
    let c = config;
    if age_hours < 0.0 {
        c.fresh_boost
    } else if age_hours <= c.fresh_window_hours {
        let t = progress(age_hours, 0.0, c.fresh_window_hours);
        lerp(c.fresh_boost, 1.0, t)
    } else if age_hours <= c.peak_window_hours {
        1.0
    } else if age_hours <= c.grace_period_hours {
        let t = progress(age_hours, c.peak_window_hours, c.grace_period_hours);
        lerp(1.0, c.grace_factor, t)
    } else if age_hours <= c.decay_period_hours {
        let t = progress(age_hours, c.grace_period_hours, c.decay_period_hours);
        exp_interp(c.grace_factor, c.floor_factor, t)
    } else {
        c.floor_factor
    }
}

/// Engagement-weighted vote count.
///
/// Upvotes are scaled by `1 + log10(votes) * engagement_boost`; downvotes are
/// multiplied by `downvote_penalty`.
pub fn vote_weight(votes: i64, config: &RankingConfig) -> f64 {
    let v = votes as f64;
    if votes >= 0 {
        v * (1.0 + v.max(1.0).log10() * config.engagement_boost)
    } else {
        v * config.downvote_penalty
    }
}

/// Feed score for an item with `votes` net votes, `age_hours` old.
///
/// `(vote_weight + 1)` is scaled by the freshness factor and clamped to
/// `[min_score, max_score]`. A negative base is divided by the factor instead,
/// so ageing never lifts a disliked item. Non-finite results map to
/// `min_score`.
pub fn ranking_score(votes: i64, age_hours: f64, config: &RankingConfig) -> f64 {
    let base = vote_weight(votes, config) + 1.0;
    let factor = time_factor(age_hours, config);
    let raw = if base >= 0.0 { base * factor } else { base / factor };
    bound_score(raw, config)
}

fn bound_score(raw: f64, config: &RankingConfig) -> f64 {
    let (lo, hi) = if config.min_score <= config.max_score {
        (config.min_score, config.max_score)
    } else {
        (config.max_score, config.min_score)
    };
    if !raw.is_finite() {
        return lo;
    }
    raw.max(lo).min(hi)
}

#[inline]
fn progress(value: f64, start: f64, end: f64) -> f64 {
    if end > start {
        ((value - start) / (end - start)).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Geometric interpolation; falls back to linear when either end is not positive.
#[inline]
fn exp_interp(from: f64, to: f64, t: f64) -> f64 {
    if from > 0.0 && to > 0.0 {
        from * (to / from).powf(t)
    } else {
        lerp(from, to, t)
    }
}

/// Source of "now" for age computation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant, for reproducible rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The ranking-relevant view of an item.
pub trait Rankable {
    fn vote_score(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Rankable for MapItem {
    fn vote_score(&self) -> i64 {
        self.vote_score
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl<T: Rankable + ?Sized> Rankable for &T {
    fn vote_score(&self) -> i64 {
        (**self).vote_score()
    }

    fn created_at(&self) -> DateTime<Utc> {
        (**self).created_at()
    }
}

/// An item paired with the score it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem<T> {
    pub item: T,
    pub score: f64,
    pub age_hours: f64,
}

/// Score every item at `now` and return them best first.
///
/// Equal scores keep their input order. `items` is left untouched.
pub fn score_items<T>(items: &[T], config: &RankingConfig, now: DateTime<Utc>) -> Vec<ScoredItem<T>>
where
    T: Rankable + Clone + Send + Sync,
{
    let mut scored: Vec<ScoredItem<T>> = items
        .par_iter()
        .map(|item| {
            let age_hours = age_hours_between(item.created_at(), now);
            ScoredItem {
                item: item.clone(),
                score: ranking_score(item.vote_score(), age_hours, config),
                age_hours,
            }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Items re-ordered for feed display, best first, using `clock` for "now".
pub fn rank_items<T, C>(items: &[T], config: &RankingConfig, clock: &C) -> Vec<T>
where
    T: Rankable + Clone + Send + Sync,
    C: Clock + ?Sized,
{
    score_items(items, config, clock.now())
        .into_iter()
        .map(|scored| scored.item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use chrono::{Duration, TimeZone};

    fn cfg() -> RankingConfig {
        RankingConfig::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn defaults_validate() {
        assert!(cfg().validate().is_ok());
    }

    #[test]
    fn time_factor_breakpoints() {
        let c = cfg();
        assert!(approx(time_factor(-3.0, &c), 1.5));
        assert!(approx(time_factor(0.0, &c), 1.5));
        assert!(approx(time_factor(6.0, &c), 1.25));
        assert!(approx(time_factor(12.0, &c), 1.0));
        assert!(approx(time_factor(18.0, &c), 1.0));
        assert!(approx(time_factor(24.0, &c), 1.0));
        assert!(approx(time_factor(36.0, &c), 0.75));
        assert!(approx(time_factor(48.0, &c), 0.5));
        assert!(approx(time_factor(168.0, &c), 0.05));
        assert!(approx(time_factor(1000.0, &c), 0.05));

        let mid = time_factor(108.0, &c);
        assert!(approx(mid, (0.5f64 * 0.05).sqrt()), "geometric midpoint, got {mid}");
    }

    #[test]
    fn time_factor_is_non_increasing() {
        let c = cfg();
        let mut previous = time_factor(0.0, &c);
        let mut age = 0.0;
        while age <= 400.0 {
            let current = time_factor(age, &c);
            assert!(current <= previous + 1e-12, "factor rose at {age}h");
            previous = current;
            age += 0.25;
        }
    }

    #[test]
    fn degenerate_windows_do_not_divide_by_zero() {
        let c = RankingConfig {
            fresh_window_hours: 0.0,
            peak_window_hours: 0.0,
            grace_period_hours: 0.0,
            decay_period_hours: 0.0,
            ..cfg()
        };
        for age in [0.0, 0.5, 10.0] {
            assert!(time_factor(age, &c).is_finite());
        }
        assert!(ranking_score(3, f64::NAN, &c).is_finite());
    }

    #[test]
    fn infinite_scores_fall_to_min_score() {
        let c = cfg().with_engagement_boost(f64::INFINITY);
        assert_eq!(vote_weight(10, &c), f64::INFINITY);
        assert_eq!(ranking_score(10, 0.0, &c), c.min_score);

        let c = cfg().with_downvote_penalty(f64::INFINITY);
        assert_eq!(ranking_score(-10, 0.0, &c), c.min_score);
    }

    #[test]
    fn vote_weight_is_asymmetric_and_logarithmic() {
        let c = cfg();
        assert!(approx(vote_weight(0, &c), 0.0));
        assert!(approx(vote_weight(1, &c), 1.0));
        assert!(approx(vote_weight(10, &c), 15.0));
        assert!(approx(vote_weight(100, &c), 200.0));
        assert!(approx(vote_weight(-10, &c), -15.0));
    }

    #[test]
    fn fresh_item_outscores_day_old_item() {
        let c = cfg();
        assert!(ranking_score(0, 0.0, &c) > ranking_score(0, 24.0, &c));
        assert!(approx(ranking_score(0, 0.0, &c), 1.5));
    }

    #[test]
    fn score_is_non_increasing_with_age_for_any_votes() {
        let c = cfg();
        for votes in [-50, -3, -1, 0, 1, 7, 250] {
            let mut previous = ranking_score(votes, 0.0, &c);
            for step in 1..=800 {
                let age = step as f64 * 0.5;
                let current = ranking_score(votes, age, &c);
                assert!(current <= previous + 1e-9, "votes {votes} rose at {age}h");
                previous = current;
            }
        }
    }

    #[test]
    fn downvotes_cost_more_than_upvotes_gain() {
        let penalised = cfg();
        let symmetric = cfg().with_downvote_penalty(1.0);
        for age in [0.0, 30.0, 100.0] {
            let gap = ranking_score(5, age, &penalised) - ranking_score(-5, age, &penalised);
            let symmetric_gap =
                ranking_score(5, age, &symmetric) - ranking_score(-5, age, &symmetric);
            assert!(gap > symmetric_gap, "age {age}: {gap} <= {symmetric_gap}");
        }
    }

    #[test]
    fn scores_are_clamped() {
        let c = cfg();
        for age in [-5.0, 0.0, 6.0, 30.0, 100.0, 168.0, 5000.0] {
            assert_eq!(ranking_score(-1000, age, &c), c.min_score);
        }
        assert_eq!(ranking_score(100_000, 0.0, &c), c.max_score);
        assert_eq!(ranking_score(i64::MAX, 0.0, &c), c.max_score);
        assert_eq!(ranking_score(i64::MIN, 0.0, &c), c.min_score);
    }

    #[test]
    fn swapped_bounds_do_not_panic() {
        let c = cfg().with_score_bounds(10.0, -10.0);
        assert_eq!(ranking_score(1_000, 0.0, &c), 10.0);
        assert_eq!(ranking_score(-1_000, 0.0, &c), -10.0);
    }

    #[test]
    fn validate_rejects_inconsistent_windows() {
        let c = RankingConfig {
            peak_window_hours: 100.0,
            grace_period_hours: 48.0,
            ..cfg()
        };
        assert!(c.validate().is_err());
        assert!(cfg().with_score_bounds(5.0, 1.0).validate().is_err());
        assert!(cfg().with_downvote_penalty(f64::NAN).validate().is_err());
    }

    #[test]
    fn ranks_with_injected_clock() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let item = |id: &str, votes: i64, hours: i64| {
            MapItem::new(id, GeoPoint::new(0.0, 0.0), now - Duration::hours(hours), votes)
        };
        let items = vec![item("old", 3, 200), item("new", 3, 1), item("mid", 3, 30)];
        let ranked = rank_items(&items, &cfg(), &FixedClock::new(now));
        let ids: Vec<&str> = ranked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        // Input untouched.
        assert_eq!(items[0].id, "old");
    }

    #[test]
    fn ties_keep_input_order() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let items: Vec<MapItem> = (0..50)
            .map(|i| MapItem::new(format!("t{i}"), GeoPoint::new(0.0, 0.0), now, 2))
            .collect();
        let ranked = rank_items(&items, &cfg(), &FixedClock::new(now));
        assert_eq!(ranked, items);
    }

    #[test]
    fn references_are_rankable() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let a = MapItem::new("a", GeoPoint::new(0.0, 0.0), now, 1);
        let b = MapItem::new("b", GeoPoint::new(0.0, 0.0), now, 9);
        let refs = vec![&a, &b];
        let scored = score_items(&refs, &cfg(), now);
        assert_eq!(scored[0].item.id, "b");
        assert!(approx(scored[0].age_hours, 0.0));
    }
}
