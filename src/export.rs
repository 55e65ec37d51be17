use crate::core::{InsuranceKind, Session, metrics};

pub const EXPORT_FILE_NAME: &str = "financial-warrior-plan.txt";

pub fn format_inr(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.3}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && (whole.bytes().any(|b| b != b'0') || !fraction.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_indian(whole));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = vec![tail];
    while head.len() > 2 {
        let (rest, pair) = head.split_at(head.len() - 2);
        groups.push(pair);
        head = rest;
    }
    groups.push(head);
    groups.reverse();
    groups.join(",")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

pub fn render_plan(session: &Session) -> String {
    let plan = session.plan();
    let insurance = plan.insurance();
    let emergency_target = metrics::emergency_fund_target(plan);
    let projection = metrics::project(plan.monthly_sip(), plan.investment_years());
    let style = match plan.investor_style() {
        Some(style) => format!("{} - {}", style.label(), style.description()),
        None => "Not assessed yet".to_string(),
    };
    let health_action = if insurance.get(InsuranceKind::Health) {
        "Review health insurance coverage annually"
    } else {
        "Research and purchase health insurance"
    };

    let lines = [
        "FINANCIAL WARRIOR - YOUR PERSONALIZED PLAN".to_string(),
        String::new(),
        "Income & Surplus:".to_string(),
        format!("- Monthly Income: ₹{}", format_inr(plan.monthly_income())),
        format!("- Monthly Bills: ₹{}", format_inr(plan.monthly_bills())),
        format!("- Surplus: ₹{}", format_inr(metrics::surplus(plan))),
        String::new(),
        "Safety Net:".to_string(),
        format!("- Health Insurance: {}", yes_no(insurance.health)),
        format!("- Life Insurance: {}", yes_no(insurance.life)),
        format!("- Term Insurance: {}", yes_no(insurance.term)),
        format!(
            "- Emergency Fund Goal: ₹{} ({} months)",
            format_inr(emergency_target),
            plan.emergency_months()
        ),
        String::new(),
        "Investment Plan:".to_string(),
        format!("- Monthly SIP: ₹{}", format_inr(plan.monthly_sip())),
        format!("- Investment Horizon: {} years", plan.investment_years()),
        format!(
            "- Projected Value: ₹{} (invested ₹{}, gains ₹{})",
            format_inr(projection.future_value.round()),
            format_inr(projection.invested_total),
            format_inr(projection.gains.round())
        ),
        format!("- Investor Style: {style}"),
        String::new(),
        "Next Actions:".to_string(),
        format!("1. Set up automated SIP for ₹{}", format_inr(plan.monthly_sip())),
        format!("2. {health_action}"),
        format!("3. Build emergency fund of ₹{}", format_inr(emergency_target)),
    ];

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn share_text(session: &Session) -> String {
    let plan = session.plan();
    format!(
        "I just completed my Financial Warrior journey! My personalized plan includes ₹{} monthly SIP and {} months emergency fund.",
        format_inr(plan.monthly_sip()),
        plan.emergency_months()
    )
}
