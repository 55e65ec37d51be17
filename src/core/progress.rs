use serde::Serialize;

use super::plan::FinancialPlan;
use super::types::{InsuranceKind, LeakCategory, MAX_POWER_LEVEL};
use crate::export::format_inr;

pub const STEP_ADVANCED_REWARD: u8 = 15;
pub const LEAK_CLEARED_REWARD: u8 = 5;
pub const ALL_LEAKS_CLEARED_REWARD: u8 = 15;
pub const INSURANCE_REWARD: u8 = 5;

pub const GROWTH_MINDSET_MIN_SIP: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    StepAdvanced { to_step: u8 },
    LeakCleared { category: LeakCategory, amount: f64 },
    AllLeaksCleared { amount: f64 },
    InsuranceToggledOn { kind: InsuranceKind },
}

impl ProgressEvent {
    pub fn reward(&self) -> u8 {
        match self {
            ProgressEvent::StepAdvanced { .. } => STEP_ADVANCED_REWARD,
            ProgressEvent::LeakCleared { .. } => LEAK_CLEARED_REWARD,
            ProgressEvent::AllLeaksCleared { .. } => ALL_LEAKS_CLEARED_REWARD,
            ProgressEvent::InsuranceToggledOn { .. } => INSURANCE_REWARD,
        }
    }
}

pub fn apply_event(event: &ProgressEvent, power_level: u8) -> u8 {
    power_level
        .min(MAX_POWER_LEVEL)
        .saturating_add(event.reward())
        .min(MAX_POWER_LEVEL)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coaching {
    pub message: String,
    pub trigger: &'static str,
}

pub fn coaching_for(event: &ProgressEvent) -> Coaching {
    match event {
        ProgressEvent::StepAdvanced { to_step } => Coaching {
            message: format!("Great progress! You've unlocked Step {to_step}!"),
            trigger: "step_complete",
        },
        ProgressEvent::LeakCleared { category, amount } => Coaching {
            message: format!(
                "Awesome! You just reclaimed ₹{} by optimizing your {}!",
                format_inr(*amount),
                category.label()
            ),
            trigger: "leak_fixed",
        },
        ProgressEvent::AllLeaksCleared { amount } => Coaching {
            message: format!(
                "Amazing! You just optimized ₹{} in monthly spending!",
                format_inr(*amount)
            ),
            trigger: "all_leaks_fixed",
        },
        ProgressEvent::InsuranceToggledOn { kind } => Coaching {
            message: format!("{} added to your safety net!", kind.label()),
            trigger: "insurance_added",
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

impl Achievement {
    const fn new(id: &'static str, title: &'static str, description: &'static str) -> Self {
        Self {
            id,
            title,
            description,
            unlocked: false,
        }
    }
}

pub fn all_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "planning_champion",
            "Planning Champion",
            "Completed full financial assessment",
        ),
        Achievement::new("safety_first", "Safety First", "Configured insurance coverage"),
        Achievement::new("growth_mindset", "Growth Mindset", "Set up investment strategy"),
        Achievement::new("leak_stopper", "Leak Stopper", "Identified expense optimizations"),
    ]
}

fn is_unlocked(id: &str, plan: &FinancialPlan) -> bool {
    match id {
        "planning_champion" => true,
        "safety_first" => plan.insurance().any(),
        "growth_mindset" => plan.monthly_sip() >= GROWTH_MINDSET_MIN_SIP,
        "leak_stopper" => plan.leaks().all_clear(),
        _ => false,
    }
}

pub fn check_achievements(plan: &FinancialPlan) -> Vec<Achievement> {
    let mut achievements = all_achievements();
    for achievement in &mut achievements {
        achievement.unlocked = is_unlocked(achievement.id, plan);
    }
    achievements
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn unlocked(plan: &FinancialPlan, id: &str) -> bool {
        check_achievements(plan)
            .into_iter()
            .find(|a| a.id == id)
            .map(|a| a.unlocked)
            .unwrap_or(false)
    }

    #[test]
    fn rewards_are_capped_at_hundred() {
        let step = ProgressEvent::StepAdvanced { to_step: 2 };
        assert_eq!(apply_event(&step, 0), 15);
        assert_eq!(apply_event(&step, 90), 100);
        assert_eq!(apply_event(&step, 100), 100);
        assert_eq!(apply_event(&step, 250), 100);
    }

    #[test]
    fn coaching_messages_name_the_event() {
        let message = coaching_for(&ProgressEvent::StepAdvanced { to_step: 3 });
        assert_eq!(message.message, "Great progress! You've unlocked Step 3!");
        assert_eq!(message.trigger, "step_complete");

        let message = coaching_for(&ProgressEvent::AllLeaksCleared { amount: 125_000.0 });
        assert!(message.message.contains("₹1,25,000"));
    }

    #[test]
    fn default_plan_achievements() {
        let plan = FinancialPlan::default();
        assert!(unlocked(&plan, "planning_champion"));
        assert!(!unlocked(&plan, "safety_first"));
        assert!(unlocked(&plan, "growth_mindset"));
        assert!(unlocked(&plan, "leak_stopper"));
    }

    #[test]
    fn achievements_follow_the_plan() {
        let mut plan = FinancialPlan::default();
        plan.set_insurance(InsuranceKind::Term, true);
        plan.set_monthly_sip(500.0);
        plan.set_leak(LeakCategory::Subscriptions, 99.0);
        assert!(unlocked(&plan, "safety_first"));
        assert!(!unlocked(&plan, "growth_mindset"));
        assert!(!unlocked(&plan, "leak_stopper"));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_fold_never_leaves_range(kinds in proptest::collection::vec(0usize..4, 0..60)) {
            let mut level = 0u8;
            for kind in kinds {
                let event = match kind {
                    0 => ProgressEvent::StepAdvanced { to_step: 2 },
                    1 => ProgressEvent::LeakCleared { category: LeakCategory::Dining, amount: 10.0 },
                    2 => ProgressEvent::AllLeaksCleared { amount: 10.0 },
                    _ => ProgressEvent::InsuranceToggledOn { kind: InsuranceKind::Life },
                };
                let next = apply_event(&event, level);
                prop_assert!(next >= level);
                prop_assert!(next <= MAX_POWER_LEVEL);
                level = next;
            }
        }
    }
}
