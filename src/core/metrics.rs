use serde::Serialize;

use super::plan::FinancialPlan;
use super::types::{InvestorStyle, QuizAnswers};

pub const ANNUAL_RETURN: f64 = 0.12;
pub const MONTHS_PER_YEAR: u32 = 12;

const STABLE_MAX_SCORE: u32 = 2;
const BALANCED_MAX_SCORE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub monthly_sip: f64,
    pub years: u32,
    pub months: u32,
    pub future_value: f64,
    pub invested_total: f64,
    pub gains: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub label: &'static str,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetrics {
    pub surplus: f64,
    pub total_leaks: f64,
    pub emergency_fund_target: f64,
    pub projection: Projection,
    pub quiz_score: Option<u32>,
    pub investor_style: Option<InvestorStyle>,
    pub allocation: Vec<AllocationSlice>,
}

pub fn surplus(plan: &FinancialPlan) -> f64 {
    let leaks = plan.leaks();
    plan.monthly_income() - plan.monthly_bills() - leaks.subscriptions - leaks.impulse - leaks.dining
}

pub fn total_leaks(plan: &FinancialPlan) -> f64 {
    plan.leaks().total()
}

pub fn emergency_fund_target(plan: &FinancialPlan) -> f64 {
    plan.monthly_bills() * plan.emergency_months() as f64
}

fn monthly_rate() -> f64 {
    ANNUAL_RETURN / MONTHS_PER_YEAR as f64
}

// Future value of a monthly SIP, annuity-due: every contribution is made at
// the start of its month and earns that month's return.
pub fn future_value(monthly_sip: f64, years: u32) -> f64 {
    let r = monthly_rate();
    let months = (years * MONTHS_PER_YEAR) as f64;
    monthly_sip * (((1.0 + r).powf(months) - 1.0) / r) * (1.0 + r)
}

pub fn invested_total(monthly_sip: f64, years: u32) -> f64 {
    monthly_sip * (years * MONTHS_PER_YEAR) as f64
}

pub fn project(monthly_sip: f64, years: u32) -> Projection {
    let future_value = future_value(monthly_sip, years);
    let invested_total = invested_total(monthly_sip, years);
    Projection {
        monthly_sip,
        years,
        months: years * MONTHS_PER_YEAR,
        future_value,
        invested_total,
        gains: future_value - invested_total,
    }
}

pub fn quiz_score(answers: &QuizAnswers) -> Option<u32> {
    match (answers.q1, answers.q2, answers.q3) {
        (Some(q1), Some(q2), Some(q3)) => Some(q1.weight() + q2.weight() + q3.weight()),
        _ => None,
    }
}

pub fn investor_style(answers: &QuizAnswers) -> Option<InvestorStyle> {
    quiz_score(answers).map(style_for_score)
}

pub fn style_for_score(score: u32) -> InvestorStyle {
    if score <= STABLE_MAX_SCORE {
        InvestorStyle::Stable
    } else if score <= BALANCED_MAX_SCORE {
        InvestorStyle::Balanced
    } else {
        InvestorStyle::Active
    }
}

pub fn allocation_breakdown(plan: &FinancialPlan) -> Vec<AllocationSlice> {
    let sip = plan.monthly_sip();
    let parts = [
        ("SIP Investment", sip),
        ("Emergency Fund", emergency_fund_target(plan) / MONTHS_PER_YEAR as f64),
        ("Available", (surplus(plan) - sip).max(0.0)),
    ];
    let total: f64 = parts.iter().map(|(_, v)| v).sum();

    parts
        .into_iter()
        .map(|(label, value)| AllocationSlice {
            label,
            value,
            percentage: if total > 0.0 { value / total * 100.0 } else { 0.0 },
        })
        .collect()
}

pub fn compute_metrics(plan: &FinancialPlan) -> PlanMetrics {
    PlanMetrics {
        surplus: surplus(plan),
        total_leaks: total_leaks(plan),
        emergency_fund_target: emergency_fund_target(plan),
        projection: project(plan.monthly_sip(), plan.investment_years()),
        quiz_score: quiz_score(plan.quiz_answers()),
        investor_style: investor_style(plan.quiz_answers()),
        allocation: allocation_breakdown(plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DipReaction, Goal, Horizon, LeakCategory, QuizAnswer};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_plan() -> FinancialPlan {
        let mut plan = FinancialPlan::default();
        plan.set_monthly_income(80_000.0);
        plan.set_monthly_bills(45_000.0);
        plan
    }

    fn answers(q1: DipReaction, q2: Horizon, q3: Goal) -> QuizAnswers {
        let mut answers = QuizAnswers::default();
        answers.record(QuizAnswer::Q1(q1));
        answers.record(QuizAnswer::Q2(q2));
        answers.record(QuizAnswer::Q3(q3));
        answers
    }

    #[test]
    fn surplus_without_leaks_is_income_minus_bills() {
        assert_approx(surplus(&sample_plan()), 35_000.0);
    }

    #[test]
    fn surplus_goes_negative_when_spending_exceeds_income() {
        let mut plan = sample_plan();
        plan.set_leak(LeakCategory::Dining, 30_000.0);
        plan.set_leak(LeakCategory::Impulse, 10_000.0);
        assert_approx(surplus(&plan), -5_000.0);
        assert_approx(total_leaks(&plan), 40_000.0);
    }

    #[test]
    fn emergency_target_is_bills_times_months() {
        let mut plan = sample_plan();
        plan.set_emergency_months(6);
        assert_approx(emergency_fund_target(&plan), 270_000.0);
    }

    #[test]
    fn oracle_future_value_matches_hand_calculation() {
        let projection = project(5_000.0, 15);
        assert_eq!(projection.months, 180);
        assert_approx(projection.future_value, 2_522_879.997_554_869_4);
        assert_approx(projection.invested_total, 900_000.0);
        assert_approx(projection.gains, 1_622_879.997_554_869_4);
    }

    #[test]
    fn future_value_is_annuity_due() {
        let r = ANNUAL_RETURN / 12.0;
        let ordinary = 1_000.0 * ((1.0 + r).powf(60.0) - 1.0) / r;
        assert_approx(future_value(1_000.0, 5), ordinary * (1.0 + r));
        assert_approx(future_value(1_000.0, 5), 82_486.366_554_973_22);
    }

    #[test]
    fn investor_style_needs_every_answer() {
        let mut partial = QuizAnswers::default();
        partial.record(QuizAnswer::Q1(DipReaction::Accept));
        partial.record(QuizAnswer::Q2(Horizon::Long));
        assert_eq!(investor_style(&partial), None);
        assert_eq!(quiz_score(&partial), None);
    }

    #[test]
    fn investor_style_bands() {
        let stable = answers(DipReaction::Avoid, Horizon::Medium, Goal::Balanced);
        assert_eq!(quiz_score(&stable), Some(2));
        assert_eq!(investor_style(&stable), Some(InvestorStyle::Stable));

        let balanced = answers(DipReaction::Accept, Horizon::Medium, Goal::Balanced);
        assert_eq!(quiz_score(&balanced), Some(4));
        assert_eq!(investor_style(&balanced), Some(InvestorStyle::Balanced));

        let active = answers(DipReaction::Accept, Horizon::Long, Goal::Balanced);
        assert_eq!(quiz_score(&active), Some(5));
        assert_eq!(investor_style(&active), Some(InvestorStyle::Active));
    }

    #[test]
    fn allocation_percentages_sum_to_hundred() {
        let plan = sample_plan();
        let slices = allocation_breakdown(&plan);
        assert_eq!(slices.len(), 3);
        assert_approx(slices[0].value, 5_000.0);
        assert_approx(slices[1].value, 45_000.0 * 6.0 / 12.0);
        assert_approx(slices[2].value, 30_000.0);
        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert_approx(total, 100.0);
    }

    #[test]
    fn allocation_available_never_negative() {
        let mut plan = FinancialPlan::default();
        plan.set_monthly_sip(50_000.0);
        let slices = allocation_breakdown(&plan);
        assert_approx(slices[2].value, 0.0);
        assert!(slices.iter().all(|s| s.percentage.is_finite()));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_surplus_identity_holds(
            income in 0u32..1_000_000,
            bills in 0u32..1_000_000,
            subscriptions in 0u32..50_000,
            impulse in 0u32..50_000,
            dining in 0u32..50_000
        ) {
            let mut plan = FinancialPlan::default();
            plan.set_monthly_income(income as f64);
            plan.set_monthly_bills(bills as f64);
            plan.set_leak(LeakCategory::Subscriptions, subscriptions as f64);
            plan.set_leak(LeakCategory::Impulse, impulse as f64);
            plan.set_leak(LeakCategory::Dining, dining as f64);

            let expected = income as f64 - bills as f64 - subscriptions as f64 - impulse as f64 - dining as f64;
            prop_assert!((surplus(&plan) - expected).abs() <= EPS);
        }

        #[test]
        fn prop_future_value_strictly_increasing_in_sip_and_years(
            sip_steps in 1u32..100,
            extra_steps in 1u32..20,
            years in 5u32..30,
            extra_years in 1u32..10
        ) {
            let sip = sip_steps as f64 * 500.0;
            let bigger_sip = sip + extra_steps as f64 * 500.0;
            prop_assert!(future_value(bigger_sip, years) > future_value(sip, years));
            prop_assert!(future_value(sip, years + extra_years) > future_value(sip, years));
        }

        #[test]
        fn prop_invested_and_gains_are_consistent(sip_steps in 1u32..101, years in 5u32..31) {
            let sip = sip_steps as f64 * 500.0;
            let projection = project(sip, years);
            prop_assert_eq!(projection.invested_total, sip * years as f64 * 12.0);
            prop_assert_eq!(projection.gains, projection.future_value - projection.invested_total);
            prop_assert!(projection.gains > 0.0);
        }

        #[test]
        fn prop_investor_style_is_pure(q1 in 0usize..3, q2 in 0usize..3, q3 in 0usize..3) {
            let quiz = answers(
                [DipReaction::Accept, DipReaction::Cautious, DipReaction::Avoid][q1],
                [Horizon::Long, Horizon::Medium, Horizon::Short][q2],
                [Goal::Growth, Goal::Balanced, Goal::Safety][q3],
            );
            let first = investor_style(&quiz);
            prop_assert!(first.is_some());
            prop_assert_eq!(first, investor_style(&quiz));
        }
    }
}
