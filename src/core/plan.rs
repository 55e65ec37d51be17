use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::investor_style;
use super::progress::{Coaching, ProgressEvent, apply_event, coaching_for};
use super::types::{
    DEFAULT_EMERGENCY_MONTHS, DEFAULT_INVESTMENT_YEARS, DEFAULT_MONTHLY_SIP, Insurance,
    InsuranceKind, InvestorStyle, LeakCategory, Leaks, MAX_EMERGENCY_MONTHS,
    MAX_INVESTMENT_YEARS, MAX_MONTHLY_SIP, MAX_POWER_LEVEL, MAX_STEP, MIN_EMERGENCY_MONTHS,
    MIN_INVESTMENT_YEARS, MIN_MONTHLY_SIP, MIN_STEP, MONTHLY_SIP_STEP, QUIZ_STEP, QuizAnswer,
    QuizAnswers, blank_as_none,
};

// Fields are only reachable through setters so the slider bounds always
// hold. Money fields reject non-finite input and floor at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialPlan {
    monthly_income: f64,
    monthly_bills: f64,
    leaks: Leaks,
    #[serde(flatten)]
    insurance: Insurance,
    emergency_months: u32,
    #[serde(rename = "monthlySIP")]
    monthly_sip: f64,
    investment_years: u32,
    quiz_answers: QuizAnswers,
    #[serde(with = "blank_as_none")]
    investor_style: Option<InvestorStyle>,
    completed: bool,
}

impl Default for FinancialPlan {
    fn default() -> Self {
        Self {
            monthly_income: 0.0,
            monthly_bills: 0.0,
            leaks: Leaks::default(),
            insurance: Insurance::default(),
            emergency_months: DEFAULT_EMERGENCY_MONTHS,
            monthly_sip: DEFAULT_MONTHLY_SIP,
            investment_years: DEFAULT_INVESTMENT_YEARS,
            quiz_answers: QuizAnswers::default(),
            investor_style: None,
            completed: false,
        }
    }
}

fn sanitize_amount(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.max(0.0))
}

fn clamp_sip(value: f64) -> f64 {
    let snapped = (value / MONTHLY_SIP_STEP).round() * MONTHLY_SIP_STEP;
    snapped.clamp(MIN_MONTHLY_SIP, MAX_MONTHLY_SIP)
}

impl FinancialPlan {
    pub fn monthly_income(&self) -> f64 {
        self.monthly_income
    }

    pub fn monthly_bills(&self) -> f64 {
        self.monthly_bills
    }

    pub fn leaks(&self) -> &Leaks {
        &self.leaks
    }

    pub fn insurance(&self) -> &Insurance {
        &self.insurance
    }

    pub fn emergency_months(&self) -> u32 {
        self.emergency_months
    }

    pub fn monthly_sip(&self) -> f64 {
        self.monthly_sip
    }

    pub fn investment_years(&self) -> u32 {
        self.investment_years
    }

    pub fn quiz_answers(&self) -> &QuizAnswers {
        &self.quiz_answers
    }

    pub fn investor_style(&self) -> Option<InvestorStyle> {
        self.investor_style
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn set_monthly_income(&mut self, amount: f64) {
        if let Some(v) = sanitize_amount(amount) {
            self.monthly_income = v;
        }
    }

    pub fn set_monthly_bills(&mut self, amount: f64) {
        if let Some(v) = sanitize_amount(amount) {
            self.monthly_bills = v;
        }
    }

    pub fn set_leak(&mut self, category: LeakCategory, amount: f64) {
        if let Some(v) = sanitize_amount(amount) {
            *self.leaks.slot_mut(category) = v;
        }
    }

    pub fn reset_leak(&mut self, category: LeakCategory) -> f64 {
        std::mem::take(self.leaks.slot_mut(category))
    }

    pub fn clear_all_leaks(&mut self) -> f64 {
        LeakCategory::ALL
            .into_iter()
            .map(|c| self.reset_leak(c))
            .sum()
    }

    // Returns true only when the flag flips from off to on.
    pub fn set_insurance(&mut self, kind: InsuranceKind, enabled: bool) -> bool {
        let slot = self.insurance.slot_mut(kind);
        let toggled_on = enabled && !*slot;
        *slot = enabled;
        toggled_on
    }

    pub fn set_emergency_months(&mut self, months: i64) {
        self.emergency_months =
            months.clamp(MIN_EMERGENCY_MONTHS as i64, MAX_EMERGENCY_MONTHS as i64) as u32;
    }

    pub fn set_monthly_sip(&mut self, amount: f64) {
        if amount.is_finite() {
            self.monthly_sip = clamp_sip(amount);
        }
    }

    pub fn set_investment_years(&mut self, years: i64) {
        self.investment_years =
            years.clamp(MIN_INVESTMENT_YEARS as i64, MAX_INVESTMENT_YEARS as i64) as u32;
    }

    pub fn set_quiz_answer(&mut self, answer: QuizAnswer) {
        self.quiz_answers.record(answer);
        self.investor_style = investor_style(&self.quiz_answers);
    }

    fn finish_quiz(&mut self) {
        self.investor_style = investor_style(&self.quiz_answers);
        self.completed = true;
    }

    pub(crate) fn normalize(&mut self) {
        let raw = self.clone();
        self.monthly_income = sanitize_amount(raw.monthly_income).unwrap_or(0.0);
        self.monthly_bills = sanitize_amount(raw.monthly_bills).unwrap_or(0.0);
        for category in LeakCategory::ALL {
            *self.leaks.slot_mut(category) =
                sanitize_amount(raw.leaks.get(category)).unwrap_or(0.0);
        }
        self.set_emergency_months(raw.emergency_months as i64);
        self.monthly_sip = if raw.monthly_sip.is_finite() {
            clamp_sip(raw.monthly_sip)
        } else {
            DEFAULT_MONTHLY_SIP
        };
        self.set_investment_years(raw.investment_years as i64);
        self.investor_style = investor_style(&raw.quiz_answers);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    SetIncome { amount: f64 },
    SetBills { amount: f64 },
    SetLeak { category: LeakCategory, amount: f64 },
    ResetLeak { category: LeakCategory },
    ClearAllLeaks,
    SetInsurance { kind: InsuranceKind, enabled: bool },
    SetEmergencyMonths { months: i64 },
    SetMonthlySip { amount: f64 },
    SetInvestmentYears { years: i64 },
    SetQuizAnswer { answer: QuizAnswer },
    AdvanceStep,
    GoBack,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub events: Vec<ProgressEvent>,
    pub coaching: Option<Coaching>,
    pub power_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "financeData")]
    plan: FinancialPlan,
    current_step: u8,
    power_level: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            plan: FinancialPlan::default(),
            current_step: MIN_STEP,
            power_level: 0,
        }
    }
}

impl Session {
    pub fn plan(&self) -> &FinancialPlan {
        &self.plan
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn power_level(&self) -> u8 {
        self.power_level
    }

    pub fn can_advance(&self) -> bool {
        match self.current_step {
            MAX_STEP => false,
            MIN_STEP => self.plan.monthly_income > 0.0 && self.plan.monthly_bills > 0.0,
            QUIZ_STEP => self.plan.quiz_answers.is_complete(),
            _ => true,
        }
    }

    pub fn advance_step(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        if self.current_step == QUIZ_STEP {
            self.plan.finish_quiz();
        }
        self.current_step += 1;
        true
    }

    pub fn go_back(&mut self) -> bool {
        if self.current_step <= MIN_STEP {
            return false;
        }
        self.current_step -= 1;
        true
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        let events = self.mutate(action);
        for event in &events {
            self.power_level = apply_event(event, self.power_level);
        }
        debug!(
            ?action,
            events = events.len(),
            step = self.current_step,
            power = self.power_level,
            "applied action"
        );
        Transition {
            coaching: events.last().map(coaching_for),
            events,
            power_level: self.power_level,
        }
    }

    fn mutate(&mut self, action: Action) -> Vec<ProgressEvent> {
        let plan = &mut self.plan;
        match action {
            Action::SetIncome { amount } => plan.set_monthly_income(amount),
            Action::SetBills { amount } => plan.set_monthly_bills(amount),
            Action::SetLeak { category, amount } => plan.set_leak(category, amount),
            Action::ResetLeak { category } => {
                let amount = plan.reset_leak(category);
                if amount > 0.0 {
                    return vec![ProgressEvent::LeakCleared { category, amount }];
                }
            }
            Action::ClearAllLeaks => {
                let amount = plan.clear_all_leaks();
                if amount > 0.0 {
                    return vec![ProgressEvent::AllLeaksCleared { amount }];
                }
            }
            Action::SetInsurance { kind, enabled } => {
                if plan.set_insurance(kind, enabled) {
                    return vec![ProgressEvent::InsuranceToggledOn { kind }];
                }
            }
            Action::SetEmergencyMonths { months } => plan.set_emergency_months(months),
            Action::SetMonthlySip { amount } => plan.set_monthly_sip(amount),
            Action::SetInvestmentYears { years } => plan.set_investment_years(years),
            Action::SetQuizAnswer { answer } => plan.set_quiz_answer(answer),
            Action::AdvanceStep => {
                if self.advance_step() {
                    return vec![ProgressEvent::StepAdvanced {
                        to_step: self.current_step,
                    }];
                }
            }
            Action::GoBack => {
                self.go_back();
            }
        }
        Vec::new()
    }

    pub(crate) fn normalize(&mut self) {
        self.plan.normalize();
        self.current_step = self.current_step.clamp(MIN_STEP, MAX_STEP);
        self.power_level = self.power_level.min(MAX_POWER_LEVEL);
    }
}
