pub mod metrics;
mod plan;
pub mod progress;
mod types;

pub use metrics::{AllocationSlice, PlanMetrics, Projection, compute_metrics, project};
pub use plan::{Action, FinancialPlan, Session, Transition};
pub use progress::{Achievement, Coaching, ProgressEvent, check_achievements};
pub use types::{
    DEFAULT_INVESTMENT_YEARS, DEFAULT_MONTHLY_SIP, DipReaction, Goal, Horizon, Insurance,
    InsuranceKind, InvestorStyle, LeakCategory, Leaks, MAX_INVESTMENT_YEARS, MAX_MONTHLY_SIP,
    MAX_POWER_LEVEL, MAX_STEP, MIN_INVESTMENT_YEARS, MIN_MONTHLY_SIP, MIN_STEP, QuizAnswer,
    QuizAnswers,
};
