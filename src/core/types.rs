use serde::{Deserialize, Serialize};

pub const MIN_STEP: u8 = 1;
pub const MAX_STEP: u8 = 5;
pub const QUIZ_STEP: u8 = 4;

pub const MIN_EMERGENCY_MONTHS: u32 = 3;
pub const MAX_EMERGENCY_MONTHS: u32 = 12;
pub const DEFAULT_EMERGENCY_MONTHS: u32 = 6;

pub const MIN_MONTHLY_SIP: f64 = 500.0;
pub const MAX_MONTHLY_SIP: f64 = 50_000.0;
pub const MONTHLY_SIP_STEP: f64 = 500.0;
pub const DEFAULT_MONTHLY_SIP: f64 = 5_000.0;

pub const MIN_INVESTMENT_YEARS: u32 = 5;
pub const MAX_INVESTMENT_YEARS: u32 = 30;
pub const DEFAULT_INVESTMENT_YEARS: u32 = 15;

pub const MAX_POWER_LEVEL: u8 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakCategory {
    Subscriptions,
    Impulse,
    Dining,
}

impl LeakCategory {
    pub const ALL: [LeakCategory; 3] = [
        LeakCategory::Subscriptions,
        LeakCategory::Impulse,
        LeakCategory::Dining,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LeakCategory::Subscriptions => "subscriptions",
            LeakCategory::Impulse => "impulse",
            LeakCategory::Dining => "dining",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Leaks {
    pub subscriptions: f64,
    pub impulse: f64,
    pub dining: f64,
}

impl Leaks {
    pub fn get(&self, category: LeakCategory) -> f64 {
        match category {
            LeakCategory::Subscriptions => self.subscriptions,
            LeakCategory::Impulse => self.impulse,
            LeakCategory::Dining => self.dining,
        }
    }

    pub(crate) fn slot_mut(&mut self, category: LeakCategory) -> &mut f64 {
        match category {
            LeakCategory::Subscriptions => &mut self.subscriptions,
            LeakCategory::Impulse => &mut self.impulse,
            LeakCategory::Dining => &mut self.dining,
        }
    }

    pub fn total(&self) -> f64 {
        self.subscriptions + self.impulse + self.dining
    }

    pub fn all_clear(&self) -> bool {
        LeakCategory::ALL.iter().all(|&c| self.get(c) == 0.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceKind {
    Health,
    Life,
    Term,
}

impl InsuranceKind {
    pub fn label(self) -> &'static str {
        match self {
            InsuranceKind::Health => "Health Insurance",
            InsuranceKind::Life => "Life Insurance",
            InsuranceKind::Term => "Term Insurance",
        }
    }
}

// Insurance flags. Serialized flat into the plan with the `has*Insurance`
// keys the stored snapshot has always used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insurance {
    #[serde(rename = "hasHealthInsurance")]
    pub health: bool,
    #[serde(rename = "hasLifeInsurance")]
    pub life: bool,
    #[serde(rename = "hasTermInsurance")]
    pub term: bool,
}

impl Insurance {
    pub fn get(&self, kind: InsuranceKind) -> bool {
        match kind {
            InsuranceKind::Health => self.health,
            InsuranceKind::Life => self.life,
            InsuranceKind::Term => self.term,
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: InsuranceKind) -> &mut bool {
        match kind {
            InsuranceKind::Health => &mut self.health,
            InsuranceKind::Life => &mut self.life,
            InsuranceKind::Term => &mut self.term,
        }
    }

    pub fn any(&self) -> bool {
        self.health || self.life || self.term
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DipReaction {
    Accept,
    Cautious,
    Avoid,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Long,
    Medium,
    Short,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Growth,
    Balanced,
    Safety,
}

impl DipReaction {
    pub fn weight(self) -> u32 {
        match self {
            DipReaction::Accept => 2,
            DipReaction::Cautious => 1,
            DipReaction::Avoid => 0,
        }
    }
}

impl Horizon {
    pub fn weight(self) -> u32 {
        match self {
            Horizon::Long => 2,
            Horizon::Medium => 1,
            Horizon::Short => 0,
        }
    }
}

impl Goal {
    pub fn weight(self) -> u32 {
        match self {
            Goal::Growth => 2,
            Goal::Balanced => 1,
            Goal::Safety => 0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "question", content = "option", rename_all = "lowercase")]
pub enum QuizAnswer {
    Q1(DipReaction),
    Q2(Horizon),
    Q3(Goal),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizAnswers {
    #[serde(with = "blank_as_none")]
    pub q1: Option<DipReaction>,
    #[serde(with = "blank_as_none")]
    pub q2: Option<Horizon>,
    #[serde(with = "blank_as_none")]
    pub q3: Option<Goal>,
}

impl QuizAnswers {
    pub fn record(&mut self, answer: QuizAnswer) {
        match answer {
            QuizAnswer::Q1(v) => self.q1 = Some(v),
            QuizAnswer::Q2(v) => self.q2 = Some(v),
            QuizAnswer::Q3(v) => self.q3 = Some(v),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.q1.is_some() && self.q2.is_some() && self.q3.is_some()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InvestorStyle {
    Stable,
    Balanced,
    Active,
}

impl InvestorStyle {
    pub fn label(self) -> &'static str {
        match self {
            InvestorStyle::Stable => "Stable",
            InvestorStyle::Balanced => "Balanced",
            InvestorStyle::Active => "Active",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            InvestorStyle::Stable => {
                "You prefer steady, low-risk investments with predictable returns."
            }
            InvestorStyle::Balanced => {
                "You balance growth potential with risk management - a thoughtful approach!"
            }
            InvestorStyle::Active => {
                "You embrace market dynamics and seek growth opportunities actively."
            }
        }
    }
}

// Unset enum fields travel as `""` in the stored snapshot.
pub(crate) mod blank_as_none {
    use serde::de::{DeserializeOwned, IntoDeserializer, value::StrDeserializer};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => {
                let de: StrDeserializer<'_, D::Error> = token.into_deserializer();
                T::deserialize(de).map(Some)
            }
        }
    }
}
