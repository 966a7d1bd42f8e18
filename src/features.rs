//! Feature catalog
//!
//! Closed set of features the assistant offers, grouped the way the menu
//! shows them. Each feature knows its kind, its input requirement, which
//! roles may use it, and an example input for the "fill example" action.

use crate::error::AssistantError;
use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Overview,
    BudgetTools,
    Savings,
    Investments,
    Taxes,
    Documents,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 6] = [
        FeatureGroup::Overview,
        FeatureGroup::BudgetTools,
        FeatureGroup::Savings,
        FeatureGroup::Investments,
        FeatureGroup::Taxes,
        FeatureGroup::Documents,
    ];
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureGroup::Overview => "Overview",
            FeatureGroup::BudgetTools => "Budget Tools",
            FeatureGroup::Savings => "Savings",
            FeatureGroup::Investments => "Investments",
            FeatureGroup::Taxes => "Taxes",
            FeatureGroup::Documents => "Documents",
        };
        write!(f, "{}", s)
    }
}

/// How a feature produces its answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Arithmetic and formatting over the profile; never calls upstream.
    Template,
    /// Handled in-process without a completion call.
    Local,
    /// Prompted completion with a role-specific fallback tip.
    Advice,
    /// Prompted completion over document text; apology on failure.
    DocumentAnalysis,
}

/// Deterministic outputs computed from the profile or a typed balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    BudgetSummary,
    ExpenseBreakdown,
    NetWorth,
    BillReminders,
    SubscriptionAudit,
    CashFlowProjection,
    BudgetSplit,
}

/// Dispatch route for a feature. `FeatureKind` is its catalog-facing summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Template(Template),
    ExtractText,
    Advice,
    DocumentAnalysis,
}

/// What the caller must supply besides the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputRequirement {
    None,
    Balance,
    Text,
    TextOrFile,
    File,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // Overview
    BudgetSummary,
    ExpenseBreakdown,
    NetWorth,
    BillReminders,
    SubscriptionAudit,
    CashFlowProjection,
    // Budget Tools
    BudgetSplit,
    // Savings
    QuickBudget,
    SmartCategorize,
    SpendingAlerts,
    SavingsGoals,
    SavingsChallenges,
    BucketTransfer,
    // Investments
    StarterInvestments,
    InvestAdvice,
    ReturnForecast,
    MarketSummary,
    // Taxes
    TaxTips,
    AnalyzeSalarySlip,
    Form16Analysis,
    // Documents
    ExtractFileText,
    EntityExtraction,
    SimplifyClauses,
    ImageAnalysis,
}

impl Feature {
    /// Menu order.
    pub const ALL: [Feature; 24] = [
        Feature::BudgetSummary,
        Feature::ExpenseBreakdown,
        Feature::NetWorth,
        Feature::BillReminders,
        Feature::SubscriptionAudit,
        Feature::CashFlowProjection,
        Feature::BudgetSplit,
        Feature::QuickBudget,
        Feature::SmartCategorize,
        Feature::SpendingAlerts,
        Feature::SavingsGoals,
        Feature::SavingsChallenges,
        Feature::BucketTransfer,
        Feature::StarterInvestments,
        Feature::InvestAdvice,
        Feature::ReturnForecast,
        Feature::MarketSummary,
        Feature::TaxTips,
        Feature::AnalyzeSalarySlip,
        Feature::Form16Analysis,
        Feature::ExtractFileText,
        Feature::EntityExtraction,
        Feature::SimplifyClauses,
        Feature::ImageAnalysis,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Feature::BudgetSummary => "budget_summary",
            Feature::ExpenseBreakdown => "expense_breakdown",
            Feature::NetWorth => "net_worth",
            Feature::BillReminders => "bill_reminders",
            Feature::SubscriptionAudit => "subscription_audit",
            Feature::CashFlowProjection => "cash_flow_projection",
            Feature::BudgetSplit => "budget_split",
            Feature::QuickBudget => "quick_budget",
            Feature::SmartCategorize => "smart_categorize",
            Feature::SpendingAlerts => "spending_alerts",
            Feature::SavingsGoals => "savings_goals",
            Feature::SavingsChallenges => "savings_challenges",
            Feature::BucketTransfer => "bucket_transfer",
            Feature::StarterInvestments => "starter_investments",
            Feature::InvestAdvice => "invest_advice",
            Feature::ReturnForecast => "return_forecast",
            Feature::MarketSummary => "market_summary",
            Feature::TaxTips => "tax_tips",
            Feature::AnalyzeSalarySlip => "analyze_salary_slip",
            Feature::Form16Analysis => "form16_analysis",
            Feature::ExtractFileText => "extract_file_text",
            Feature::EntityExtraction => "entity_extraction",
            Feature::SimplifyClauses => "simplify_clauses",
            Feature::ImageAnalysis => "image_analysis",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feature::BudgetSummary => "Budget Summary",
            Feature::ExpenseBreakdown => "Expense Breakdown",
            Feature::NetWorth => "Net Worth",
            Feature::BillReminders => "Bill Reminders",
            Feature::SubscriptionAudit => "Subscription Audit",
            Feature::CashFlowProjection => "Cash-Flow Projection",
            Feature::BudgetSplit => "Budget Split Calculator",
            Feature::QuickBudget => "Quick Budget",
            Feature::SmartCategorize => "Smart Categorize",
            Feature::SpendingAlerts => "Spending Alerts",
            Feature::SavingsGoals => "Savings Goals",
            Feature::SavingsChallenges => "Savings Challenges",
            Feature::BucketTransfer => "Bucket Transfer",
            Feature::StarterInvestments => "Starter Investments",
            Feature::InvestAdvice => "Invest Advice",
            Feature::ReturnForecast => "Return Forecast",
            Feature::MarketSummary => "Market Summary",
            Feature::TaxTips => "Tax Tips",
            Feature::AnalyzeSalarySlip => "Analyze Salary Slip",
            Feature::Form16Analysis => "Form16 Analysis",
            Feature::ExtractFileText => "Extract File Text",
            Feature::EntityExtraction => "Get Entities (NER)",
            Feature::SimplifyClauses => "Simplify Clauses",
            Feature::ImageAnalysis => "Analyze Receipt Image",
        }
    }

    pub fn group(&self) -> FeatureGroup {
        match self {
            Feature::BudgetSummary
            | Feature::ExpenseBreakdown
            | Feature::NetWorth
            | Feature::BillReminders
            | Feature::SubscriptionAudit
            | Feature::CashFlowProjection => FeatureGroup::Overview,
            Feature::BudgetSplit => FeatureGroup::BudgetTools,
            Feature::QuickBudget
            | Feature::SmartCategorize
            | Feature::SpendingAlerts
            | Feature::SavingsGoals
            | Feature::SavingsChallenges
            | Feature::BucketTransfer => FeatureGroup::Savings,
            Feature::StarterInvestments
            | Feature::InvestAdvice
            | Feature::ReturnForecast
            | Feature::MarketSummary => FeatureGroup::Investments,
            Feature::TaxTips | Feature::AnalyzeSalarySlip | Feature::Form16Analysis => {
                FeatureGroup::Taxes
            }
            Feature::ExtractFileText
            | Feature::EntityExtraction
            | Feature::SimplifyClauses
            | Feature::ImageAnalysis => FeatureGroup::Documents,
        }
    }

    /// Which code path answers this feature.
    pub fn handler(&self) -> Handler {
        match self {
            Feature::BudgetSummary => Handler::Template(Template::BudgetSummary),
            Feature::ExpenseBreakdown => Handler::Template(Template::ExpenseBreakdown),
            Feature::NetWorth => Handler::Template(Template::NetWorth),
            Feature::BillReminders => Handler::Template(Template::BillReminders),
            Feature::SubscriptionAudit => Handler::Template(Template::SubscriptionAudit),
            Feature::CashFlowProjection => Handler::Template(Template::CashFlowProjection),
            Feature::BudgetSplit => Handler::Template(Template::BudgetSplit),
            Feature::QuickBudget
            | Feature::SmartCategorize
            | Feature::SpendingAlerts
            | Feature::SavingsGoals
            | Feature::SavingsChallenges
            | Feature::BucketTransfer
            | Feature::StarterInvestments
            | Feature::InvestAdvice
            | Feature::ReturnForecast
            | Feature::MarketSummary
            | Feature::TaxTips
            | Feature::AnalyzeSalarySlip
            | Feature::Form16Analysis => Handler::Advice,
            Feature::ExtractFileText => Handler::ExtractText,
            Feature::EntityExtraction | Feature::SimplifyClauses | Feature::ImageAnalysis => {
                Handler::DocumentAnalysis
            }
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self.handler() {
            Handler::Template(_) => FeatureKind::Template,
            Handler::ExtractText => FeatureKind::Local,
            Handler::Advice => FeatureKind::Advice,
            Handler::DocumentAnalysis => FeatureKind::DocumentAnalysis,
        }
    }

    pub fn input(&self) -> InputRequirement {
        match self {
            Feature::BudgetSplit => InputRequirement::Balance,
            Feature::ExtractFileText => InputRequirement::File,
            Feature::AnalyzeSalarySlip
            | Feature::Form16Analysis
            | Feature::EntityExtraction
            | Feature::SimplifyClauses => InputRequirement::TextOrFile,
            _ if self.kind() == FeatureKind::Template => InputRequirement::None,
            _ => InputRequirement::Text,
        }
    }

    /// Salary-slip and Form 16 reviews only make sense with a salary.
    pub fn available_to(&self, role: Role) -> bool {
        match self {
            Feature::AnalyzeSalarySlip | Feature::Form16Analysis => role == Role::Professional,
            _ => true,
        }
    }

    pub fn is_generative(&self) -> bool {
        matches!(self.kind(), FeatureKind::Advice | FeatureKind::DocumentAnalysis)
    }

    /// Output length budget for the completion call.
    pub fn max_new_tokens(&self) -> u32 {
        match self {
            Feature::ImageAnalysis => 450,
            Feature::EntityExtraction => 500,
            _ => 700,
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            Feature::BudgetSummary
            | Feature::ExpenseBreakdown
            | Feature::NetWorth
            | Feature::BillReminders
            | Feature::SubscriptionAudit
            | Feature::CashFlowProjection => "Runs on your profile; no input needed.",
            Feature::BudgetSplit => "Enter your bank balance and click Calculate (e.g. 10000).",
            Feature::QuickBudget => {
                "I earn ₹22,000. Rent 8000, Food 3000, Travel 1200, Books 500. Suggest a budget."
            }
            Feature::SmartCategorize => {
                "Cafe - 300; Hostel - 6500; Train - 120; Books - 450; Netflix - 299. Categorize."
            }
            Feature::SpendingAlerts => "Alert me when weekly food spending exceeds ₹1500.",
            Feature::SavingsGoals => {
                "I want to save ₹10,000 in 6 months. I can save monthly. Suggest a plan."
            }
            Feature::SavingsChallenges => "Give me a 30-day no-spend challenge for eating out.",
            Feature::BucketTransfer => "Split 40% to buckets equally: Travel, Future, Emergency.",
            Feature::StarterInvestments => {
                "I can invest ₹2,000/month. Recommend beginner-friendly options."
            }
            Feature::InvestAdvice => "I have ₹100,000 to invest for 5 years, moderate risk.",
            Feature::ReturnForecast => "Forecast 5-year returns for ₹5,000/month SIP at 10% annual.",
            Feature::MarketSummary => "Summarize current market trends briefly.",
            Feature::TaxTips => "Tax-saving options for salaried 12 LPA in India under 80C/80D.",
            Feature::AnalyzeSalarySlip => {
                "Basic 50,000; HRA 20,000; PF 6000; TDS 8000. Analyze and suggest proofs."
            }
            Feature::Form16Analysis => {
                "Check Form 16 for taxable income and tax deducted accuracy."
            }
            Feature::ExtractFileText => "Upload invoice PDF and extract text.",
            Feature::EntityExtraction => "Extract dates and amounts from this bill.",
            Feature::SimplifyClauses => "Upload a contract and break into simple clauses.",
            Feature::ImageAnalysis => "Paste the OCR text of a receipt to extract vendor and totals.",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Feature {
    type Err = AssistantError;

    /// Accepts the snake_case key or, case-insensitively, the menu label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.key() == needle || f.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AssistantError::InputError(format!("Unknown feature: {}", needle)))
    }
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Serialize)]
pub struct FeatureListing {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FeatureKind,
    pub input: InputRequirement,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupListing {
    pub group: FeatureGroup,
    pub label: String,
    pub features: Vec<FeatureListing>,
}

pub struct FeatureCatalog;

impl FeatureCatalog {
    /// Groups and features offered to a role, in menu order.
    /// Groups with nothing to offer are left out.
    pub fn for_role(role: Role) -> Vec<GroupListing> {
        FeatureGroup::ALL
            .iter()
            .filter_map(|group| {
                let features: Vec<FeatureListing> = Feature::ALL
                    .iter()
                    .filter(|f| f.group() == *group && f.available_to(role))
                    .map(|f| FeatureListing {
                        key: f.key(),
                        label: f.label(),
                        kind: f.kind(),
                        input: f.input(),
                    })
                    .collect();

                if features.is_empty() {
                    None
                } else {
                    Some(GroupListing {
                        group: *group,
                        label: group.to_string(),
                        features,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip_through_from_str() {
        for feature in Feature::ALL {
            assert_eq!(feature.key().parse::<Feature>().unwrap(), feature);
        }
        assert_eq!("budget split calculator".parse::<Feature>().unwrap(), Feature::BudgetSplit);
    }

    #[test]
    fn test_unknown_key_is_input_error() {
        let err = "crypto_moonshot".parse::<Feature>().unwrap_err();
        assert!(matches!(err, AssistantError::InputError(_)));
    }

    #[test]
    fn test_serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&Feature::CashFlowProjection).unwrap();
        assert_eq!(json, "\"cash_flow_projection\"");
        let parsed: Feature = serde_json::from_str("\"form16_analysis\"").unwrap();
        assert_eq!(parsed, Feature::Form16Analysis);
    }

    #[test]
    fn test_template_features_need_no_network() {
        let templates: Vec<_> = Feature::ALL
            .iter()
            .filter(|f| f.kind() == FeatureKind::Template)
            .collect();
        assert_eq!(templates.len(), 7);
        assert!(templates.iter().all(|f| !f.is_generative()));
        assert_eq!(Feature::ExtractFileText.kind(), FeatureKind::Local);
    }

    #[test]
    fn test_handler_agrees_with_group() {
        assert_eq!(Feature::NetWorth.handler(), Handler::Template(Template::NetWorth));
        assert_eq!(Feature::BudgetSplit.handler(), Handler::Template(Template::BudgetSplit));
        assert_eq!(Feature::ExtractFileText.handler(), Handler::ExtractText);
        for feature in Feature::ALL {
            let expected = match feature.group() {
                FeatureGroup::Overview | FeatureGroup::BudgetTools => FeatureKind::Template,
                FeatureGroup::Savings | FeatureGroup::Investments | FeatureGroup::Taxes => {
                    FeatureKind::Advice
                }
                FeatureGroup::Documents if feature == Feature::ExtractFileText => FeatureKind::Local,
                FeatureGroup::Documents => FeatureKind::DocumentAnalysis,
            };
            assert_eq!(feature.kind(), expected, "{}", feature.key());
        }
    }

    #[test]
    fn test_input_requirements() {
        assert_eq!(Feature::BudgetSplit.input(), InputRequirement::Balance);
        assert_eq!(Feature::NetWorth.input(), InputRequirement::None);
        assert_eq!(Feature::TaxTips.input(), InputRequirement::Text);
        assert_eq!(Feature::SimplifyClauses.input(), InputRequirement::TextOrFile);
        assert_eq!(Feature::ExtractFileText.input(), InputRequirement::File);
    }

    #[test]
    fn test_catalog_scopes_by_role() {
        let student = FeatureCatalog::for_role(Role::Student);
        let pro = FeatureCatalog::for_role(Role::Professional);

        let count = |groups: &[GroupListing]| groups.iter().map(|g| g.features.len()).sum::<usize>();
        assert_eq!(count(&pro), Feature::ALL.len());
        assert_eq!(count(&student), Feature::ALL.len() - 2);

        let student_taxes = student
            .iter()
            .find(|g| g.group == FeatureGroup::Taxes)
            .unwrap();
        assert_eq!(student_taxes.features.len(), 1);
        assert_eq!(student_taxes.features[0].key, "tax_tips");
    }

    #[test]
    fn test_every_feature_has_an_example() {
        for feature in Feature::ALL {
            assert!(!feature.example().is_empty(), "{}", feature.key());
        }
    }
}
