//! Table-driven recommendation rules.
//!
//! Rules are evaluated in table order. Once a sphere produces a CRITICAL or
//! WARNING recommendation, every later rule for that sphere is skipped, so a
//! pass never yields two non-INFO findings for one sphere. The tier ranges
//! inside each sphere are disjoint as well.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::AppError;
use crate::models::life_score::SphereStatus;
use crate::models::metrics::{present_values, tracked_in_window, DailyMetricRecord, MetricField};
use crate::models::recommendation::{Recommendation, RuleAnalysis, RuleDescriptor, Severity};
use crate::models::sphere::{Sphere, SphereWeights};
use crate::models::window::DateWindow;
use crate::services::life_score_service::{compute_life_score, sphere_status};
use crate::utils::math::{positive_mean, safe_ratio};

const WEEKLY_INCOME_TARGET: f64 = 50_000.0;

/// Why a predicate could not be decided.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFault {
    pub reason: String,
}

type Condition = fn(&RuleContext<'_>) -> Result<bool, RuleFault>;
type MessageFn = fn(&RuleContext<'_>) -> String;

pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub sphere: Sphere,
    pub severity: Severity,
    condition: Condition,
    message: MessageFn,
    suggestion: &'static str,
}

impl Rule {
    pub fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: self.id.to_string(),
            name: self.name.to_string(),
            severity: self.severity,
            sphere: self.sphere,
        }
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Recommendation>, AppError> {
        let fired = (self.condition)(ctx)
            .map_err(|fault| AppError::rule_evaluation(self.id, fault.reason))?;
        if !fired {
            return Ok(None);
        }

        Ok(Some(Recommendation {
            rule_id: self.id.to_string(),
            rule_name: self.name.to_string(),
            severity: self.severity,
            sphere: self.sphere,
            message: (self.message)(ctx),
            suggestion: self.suggestion.to_string(),
        }))
    }
}

/// Aggregates over the tracked records of one window.
///
/// `avg` is the mean of strictly positive values, treating zero as "not
/// logged". `sum` counts absent values as zero.
pub struct RuleContext<'a> {
    records: Vec<&'a DailyMetricRecord>,
}

impl<'a> RuleContext<'a> {
    pub fn new(records: Vec<&'a DailyMetricRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn avg(&self, field: MetricField) -> Result<Option<f64>, RuleFault> {
        match positive_mean(&present_values(&self.records, field)) {
            Some(value) if !value.is_finite() => Err(RuleFault {
                reason: format!("average of {field} is not finite"),
            }),
            other => Ok(other),
        }
    }

    pub fn sum(&self, field: MetricField) -> Result<f64, RuleFault> {
        let total: f64 = present_values(&self.records, field).iter().sum();
        if total.is_finite() {
            Ok(total)
        } else {
            Err(RuleFault {
                reason: format!("sum of {field} is not finite"),
            })
        }
    }

    fn avg_or_zero(&self, field: MetricField) -> f64 {
        self.avg(field).ok().flatten().unwrap_or(0.0)
    }

    fn sum_or_zero(&self, field: MetricField) -> f64 {
        self.sum(field).unwrap_or(0.0)
    }
}

fn avg_matches(
    ctx: &RuleContext<'_>,
    field: MetricField,
    predicate: impl Fn(f64) -> bool,
) -> Result<bool, RuleFault> {
    Ok(ctx.avg(field)?.map(predicate).unwrap_or(false))
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(build_rules);

fn build_rules() -> Vec<Rule> {
    use MetricField::*;

    vec![
        Rule {
            id: "SLEEP_CRITICAL",
            name: "Critical sleep deprivation",
            sphere: Sphere::Sleep,
            severity: Severity::Critical,
            condition: |ctx| avg_matches(ctx, SleepHours, |avg| avg < 5.0),
            message: |ctx| {
                format!(
                    "You sleep {:.1} hours on average. That is critically low!",
                    ctx.avg_or_zero(SleepHours)
                )
            },
            suggestion: "Fix your sleep schedule urgently. Chronic sleep loss leads to serious health problems.",
        },
        Rule {
            id: "SLEEP_WARNING",
            name: "Insufficient sleep",
            sphere: Sphere::Sleep,
            severity: Severity::Warning,
            condition: |ctx| avg_matches(ctx, SleepHours, |avg| (5.0..7.0).contains(&avg)),
            message: |ctx| {
                format!(
                    "You sleep {:.1} hours on average. 7-8 hours is recommended.",
                    ctx.avg_or_zero(SleepHours)
                )
            },
            suggestion: "Go to bed 30-60 minutes earlier and avoid screens before sleep.",
        },
        Rule {
            id: "SLEEP_EXCELLENT",
            name: "Excellent sleep",
            sphere: Sphere::Sleep,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, SleepHours, |avg| (7.0..=9.0).contains(&avg)),
            message: |ctx| {
                format!(
                    "Great! You sleep {:.1} hours on average.",
                    ctx.avg_or_zero(SleepHours)
                )
            },
            suggestion: "Keep it up. Quality sleep is the foundation of productivity.",
        },
        Rule {
            id: "WATER_CRITICAL",
            name: "Dehydration",
            sphere: Sphere::Water,
            severity: Severity::Critical,
            condition: |ctx| avg_matches(ctx, WaterMl, |avg| avg < 1000.0),
            message: |ctx| {
                format!(
                    "You drink only {:.0} ml of water a day. That is dangerously low!",
                    ctx.avg_or_zero(WaterMl)
                )
            },
            suggestion: "Drink water right after waking up and keep a bottle on your desk.",
        },
        Rule {
            id: "WATER_WARNING",
            name: "Insufficient hydration",
            sphere: Sphere::Water,
            severity: Severity::Warning,
            condition: |ctx| avg_matches(ctx, WaterMl, |avg| (1000.0..2000.0).contains(&avg)),
            message: |ctx| {
                format!(
                    "You drink {:.0} ml of water a day. Aim for 2000 ml or more.",
                    ctx.avg_or_zero(WaterMl)
                )
            },
            suggestion: "Drink a glass of water before every meal.",
        },
        Rule {
            id: "WATER_EXCELLENT",
            name: "Excellent hydration",
            sphere: Sphere::Water,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, WaterMl, |avg| avg >= 2000.0),
            message: |ctx| {
                format!(
                    "Excellent! You drink {:.0} ml of water a day.",
                    ctx.avg_or_zero(WaterMl)
                )
            },
            suggestion: "Keep up the great hydration.",
        },
        Rule {
            id: "FITNESS_NONE",
            name: "No physical activity",
            sphere: Sphere::Fitness,
            severity: Severity::Warning,
            condition: |ctx| Ok(ctx.sum(WorkoutMinutes)? == 0.0),
            message: |_| "No workouts were logged in this period.".to_string(),
            suggestion: "Start with a 15-minute walk or light stretching. Starting is what counts.",
        },
        Rule {
            id: "FITNESS_LOW",
            name: "Low physical activity",
            sphere: Sphere::Fitness,
            severity: Severity::Warning,
            condition: |ctx| {
                let total = ctx.sum(WorkoutMinutes)?;
                Ok(total > 0.0 && total < 90.0)
            },
            message: |ctx| {
                format!(
                    "Only {:.0} minutes of exercise in this period. 150+ minutes is recommended.",
                    ctx.sum_or_zero(WorkoutMinutes)
                )
            },
            suggestion: "Add 2-3 more 30-minute workouts per week.",
        },
        Rule {
            id: "FITNESS_GOOD",
            name: "Good physical activity",
            sphere: Sphere::Fitness,
            severity: Severity::Info,
            condition: |ctx| Ok((90.0..150.0).contains(&ctx.sum(WorkoutMinutes)?)),
            message: |ctx| {
                format!(
                    "Good! {:.0} minutes of activity in this period.",
                    ctx.sum_or_zero(WorkoutMinutes)
                )
            },
            suggestion: "Solid result. Try adding one more short session.",
        },
        Rule {
            id: "FITNESS_EXCELLENT",
            name: "Excellent fitness",
            sphere: Sphere::Fitness,
            severity: Severity::Info,
            condition: |ctx| Ok(ctx.sum(WorkoutMinutes)? >= 150.0),
            message: |ctx| {
                format!(
                    "Outstanding! {:.0} minutes of activity, you are in great shape!",
                    ctx.sum_or_zero(WorkoutMinutes)
                )
            },
            suggestion: "Keep going and remember to schedule recovery days.",
        },
        Rule {
            id: "WORK_OVERWORK",
            name: "Burnout risk",
            sphere: Sphere::Work,
            severity: Severity::Critical,
            condition: |ctx| avg_matches(ctx, WorkHours, |avg| avg > 10.0),
            message: |ctx| {
                format!(
                    "You work {:.1} hours a day on average. High risk of burnout!",
                    ctx.avg_or_zero(WorkHours)
                )
            },
            suggestion: "Cut working hours now and delegate. Rest is an investment in productivity.",
        },
        Rule {
            id: "WORK_WARNING",
            name: "Overwork",
            sphere: Sphere::Work,
            severity: Severity::Warning,
            condition: |ctx| avg_matches(ctx, WorkHours, |avg| avg > 8.0 && avg <= 10.0),
            message: |ctx| {
                format!(
                    "You work {:.1} hours a day on average. That is above the norm.",
                    ctx.avg_or_zero(WorkHours)
                )
            },
            suggestion: "Streamline your tasks. Try the Pomodoro technique.",
        },
        Rule {
            id: "WORK_BALANCED",
            name: "Balanced workload",
            sphere: Sphere::Work,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, WorkHours, |avg| (6.0..=8.0).contains(&avg)),
            message: |ctx| {
                format!(
                    "Good balance! You work {:.1} hours a day on average.",
                    ctx.avg_or_zero(WorkHours)
                )
            },
            suggestion: "Keep maintaining a healthy balance of work and rest.",
        },
        Rule {
            id: "FINANCE_NEGATIVE",
            name: "Negative balance",
            sphere: Sphere::Finance,
            severity: Severity::Critical,
            condition: |ctx| {
                let income = ctx.sum(Income)?;
                let expenses = ctx.sum(Expenses)?;
                Ok(income > 0.0 && expenses > income)
            },
            message: |ctx| {
                format!(
                    "Expenses ({:.0}) exceed income ({:.0}).",
                    ctx.sum_or_zero(Expenses),
                    ctx.sum_or_zero(Income)
                )
            },
            suggestion: "Review your budget right away and cut non-essential spending.",
        },
        Rule {
            id: "FINANCE_LOW_INCOME",
            name: "No recorded income",
            sphere: Sphere::Finance,
            severity: Severity::Warning,
            condition: |ctx| Ok(ctx.sum(Income)? == 0.0),
            message: |_| "No income was recorded in this period.".to_string(),
            suggestion: "Consider additional income sources or investing in your skills.",
        },
        Rule {
            id: "FINANCE_POSITIVE",
            name: "Positive balance",
            sphere: Sphere::Finance,
            severity: Severity::Info,
            condition: |ctx| {
                let income = ctx.sum(Income)?;
                let expenses = ctx.sum(Expenses)?;
                Ok(income > 0.0 && expenses <= income * 0.8)
            },
            message: |ctx| {
                let income = ctx.sum_or_zero(Income);
                let saved = income - ctx.sum_or_zero(Expenses);
                format!(
                    "Great! You save {:.0}% of your income ({:.0}).",
                    safe_ratio(saved, income) * 100.0,
                    saved
                )
            },
            suggestion: "Consider investing or building an emergency fund.",
        },
        Rule {
            id: "MOOD_LOW",
            name: "Low mood",
            sphere: Sphere::Mood,
            severity: Severity::Warning,
            condition: |ctx| avg_matches(ctx, Mood, |avg| avg < 5.0),
            message: |ctx| {
                format!(
                    "Your average mood is {:.1}/10. That is below normal.",
                    ctx.avg_or_zero(Mood)
                )
            },
            suggestion: "Look at what drives your mood: sleep, exercise, time with people.",
        },
        Rule {
            id: "MOOD_GOOD",
            name: "Good mood",
            sphere: Sphere::Mood,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, Mood, |avg| (5.0..8.0).contains(&avg)),
            message: |ctx| format!("Your mood is fine at {:.1}/10.", ctx.avg_or_zero(Mood)),
            suggestion: "Keep looking after your mental health.",
        },
        Rule {
            id: "MOOD_EXCELLENT",
            name: "Excellent mood",
            sphere: Sphere::Mood,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, Mood, |avg| avg >= 8.0),
            message: |ctx| format!("Excellent mood at {:.1}/10!", ctx.avg_or_zero(Mood)),
            suggestion: "Share the good energy with the people around you.",
        },
        Rule {
            id: "SELF_DEV_NONE",
            name: "No self-development",
            sphere: Sphere::SelfDevelopment,
            severity: Severity::Warning,
            condition: |ctx| Ok(ctx.avg(SelfDevMinutes)?.is_none()),
            message: |_| "You are not spending time on self-development.".to_string(),
            suggestion: "Start with 15 minutes a day: reading, courses, podcasts.",
        },
        Rule {
            id: "SELF_DEV_GOOD",
            name: "Steady self-development",
            sphere: Sphere::SelfDevelopment,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, SelfDevMinutes, |avg| avg >= 30.0),
            message: |ctx| {
                format!(
                    "Great! You spend {:.0} minutes a day on self-development.",
                    ctx.avg_or_zero(SelfDevMinutes)
                )
            },
            suggestion: "Keep growing and consider going deeper on one topic.",
        },
        Rule {
            id: "PERSONAL_LOW",
            name: "Low personal life rating",
            sphere: Sphere::PersonalLife,
            severity: Severity::Warning,
            condition: |ctx| avg_matches(ctx, PersonalLifeScore, |avg| avg < 6.0),
            message: |ctx| {
                format!(
                    "Personal life rating is {:.1}/10. There is room to grow.",
                    ctx.avg_or_zero(PersonalLifeScore)
                )
            },
            suggestion: "Spend more quality time with the people close to you.",
        },
        Rule {
            id: "PERSONAL_GOOD",
            name: "Healthy personal life",
            sphere: Sphere::PersonalLife,
            severity: Severity::Info,
            condition: |ctx| avg_matches(ctx, PersonalLifeScore, |avg| avg >= 6.0),
            message: |ctx| {
                format!(
                    "Good personal life rating at {:.1}/10.",
                    ctx.avg_or_zero(PersonalLifeScore)
                )
            },
            suggestion: "Keep balancing work and personal life.",
        },
    ]
}

pub fn rules() -> &'static [Rule] {
    RULES.as_slice()
}

pub fn rule_catalog() -> Vec<RuleDescriptor> {
    rules().iter().map(Rule::descriptor).collect()
}

/// Runs `table` in order with per-sphere suppression, then sorts by severity.
pub fn run_rules(table: &[Rule], ctx: &RuleContext<'_>) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let mut resolved: HashSet<Sphere> = HashSet::new();

    for rule in table {
        if resolved.contains(&rule.sphere) {
            continue;
        }

        match rule.evaluate(ctx) {
            Ok(Some(recommendation)) => {
                if rule.severity.resolves_sphere() {
                    resolved.insert(rule.sphere);
                }
                recommendations.push(recommendation);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(
                    target: "app::engine::rules",
                    rule_id = rule.id,
                    error = %err,
                    "skipping rule"
                );
            }
        }
    }

    recommendations.sort_by_key(|rec| rec.severity);
    recommendations
}

/// Evaluates the rule table over `window` and derives per-sphere statuses.
///
/// An empty window produces no recommendations, a zero LifeScore, and
/// statuses computed from default values.
pub fn evaluate_rules(
    records: &[DailyMetricRecord],
    weights: &SphereWeights,
    window: &DateWindow,
) -> RuleAnalysis {
    let life_score = compute_life_score(records, weights, window).total;
    let ctx = RuleContext::new(tracked_in_window(records, window));

    let recommendations = if ctx.is_empty() {
        Vec::new()
    } else {
        run_rules(rules(), &ctx)
    };

    debug!(
        target: "app::engine::rules",
        start = %window.start,
        end = %window.end,
        recommendations = recommendations.len(),
        "rule evaluation finished"
    );

    RuleAnalysis {
        recommendations,
        life_score,
        sphere_statuses: sphere_statuses(&ctx, window),
    }
}

/// Status of each sphere against its daily target, independent of the rule table.
///
/// Finance compares the window's average daily income with the daily share
/// of the weekly income target.
pub fn sphere_statuses(
    ctx: &RuleContext<'_>,
    window: &DateWindow,
) -> BTreeMap<Sphere, SphereStatus> {
    Sphere::ALL
        .iter()
        .map(|sphere| {
            let target = sphere.config().target;
            let status = match sphere {
                Sphere::Finance => {
                    let daily_income = safe_ratio(
                        ctx.sum_or_zero(MetricField::Income),
                        window.days() as f64,
                    );
                    sphere_status(daily_income, WEEKLY_INCOME_TARGET / 7.0)
                }
                Sphere::Mood | Sphere::PersonalLife => {
                    let value = ctx.avg(sphere.field()).ok().flatten().unwrap_or(1.0);
                    sphere_status(value, target)
                }
                _ => sphere_status(ctx.avg_or_zero(sphere.field()), target),
            };
            (*sphere, status)
        })
        .collect()
}
