//! Deterministic finance templates
//!
//! Pure arithmetic over a balance or a profile. No network, no randomness:
//! the same profile always renders the same text.

use crate::error::AssistantError;
use crate::models::{Role, UserProfile};
use crate::Result;
use serde::Serialize;

pub const BUCKET_CATEGORIES: [&str; 3] = ["Travel", "Future Expenses", "Emergency Funds"];

const BUCKET_SHARE: f64 = 0.40;
const DAILY_SHARE: f64 = 0.30;
const PROJECTION_MONTHS: u32 = 6;
const SUBSCRIPTION_REVIEW_SHARE: f64 = 0.05;
/// Largest balance the calculator accepts (₹1 lakh crore).
pub const MAX_BALANCE: f64 = 1_000_000_000_000.0;

/// Format as rupees with comma grouping and two decimals, e.g. `₹1,333.33`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = whole.bytes().all(|b| b == b'0') && frac.bytes().all(|b| b == b'0');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, frac)
}

//
// ================= Budget Split =================
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSplit {
    pub total: f64,
    pub bucket: f64,
    pub per_category: f64,
    pub daily: f64,
    pub loans: f64,
}

impl BudgetSplit {
    /// 40% bucket list, 30% daily use, remainder to personal loans.
    pub fn compute(balance: f64) -> Self {
        let bucket = balance * BUCKET_SHARE;
        let daily = balance * DAILY_SHARE;
        // Remainder rather than 0.30 * balance so the parts sum to the total.
        let loans = balance - bucket - daily;

        Self {
            total: balance,
            bucket,
            per_category: bucket / BUCKET_CATEGORIES.len() as f64,
            daily,
            loans,
        }
    }

    pub fn render(&self) -> String {
        let mut text = format!(
            "Total Balance: {}\n\nBucket List (40%) = {}\n",
            format_currency(self.total),
            format_currency(self.bucket)
        );
        for category in BUCKET_CATEGORIES {
            text.push_str(&format!(" - {}: {}\n", category, format_currency(self.per_category)));
        }
        text.push_str(&format!(
            "\nDaily Use (30%) = {}\nPersonal Loans (30%) = {}",
            format_currency(self.daily),
            format_currency(self.loans)
        ));
        text
    }
}

/// Parse a user-typed balance. Accepts a leading `₹` and comma grouping.
pub fn parse_balance(input: &str) -> Result<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let value: f64 = cleaned
        .trim()
        .parse()
        .map_err(|_| AssistantError::InputError("Enter a valid numeric balance.".to_string()))?;

    if !value.is_finite() {
        return Err(AssistantError::InputError(
            "Enter a valid numeric balance.".to_string(),
        ));
    }
    if value < 0.0 {
        return Err(AssistantError::InputError(
            "Balance cannot be negative.".to_string(),
        ));
    }
    if value > MAX_BALANCE {
        return Err(AssistantError::InputError(format!(
            "Balance cannot exceed {}.",
            format_currency(MAX_BALANCE)
        )));
    }

    Ok(value)
}

/// Calculator entry point: validation failures come back as display text.
pub fn budget_split_text(input: &str) -> String {
    match parse_balance(input) {
        Ok(balance) => BudgetSplit::compute(balance).render(),
        Err(e) => e.to_string(),
    }
}

//
// ================= Profile Templates =================
//

fn basis_label(profile: &UserProfile) -> &'static str {
    match profile.role {
        Role::Professional => "monthly salary",
        Role::Student => "10% of balance",
    }
}

pub fn budget_summary(profile: &UserProfile) -> String {
    let basis = profile.monthly_basis();
    format!(
        "Budget Summary for {} ({})\n\
         Current Balance: {}\n\
         Monthly Basis: {} ({})\n\n\
         Needs (50%) = {}\n\
         Wants (30%) = {}\n\
         Savings (20%) = {}",
        profile.display_name,
        profile.role,
        format_currency(profile.balance),
        format_currency(basis),
        basis_label(profile),
        format_currency(basis * 0.50),
        format_currency(basis * 0.30),
        format_currency(basis * 0.20),
    )
}

const STUDENT_EXPENSES: &[(&str, f64)] = &[
    ("Hostel/Rent", 35.0),
    ("Food", 25.0),
    ("Transport", 10.0),
    ("Books & Supplies", 15.0),
    ("Entertainment", 5.0),
    ("Savings", 10.0),
];

const PROFESSIONAL_EXPENSES: &[(&str, f64)] = &[
    ("Housing", 30.0),
    ("Food", 15.0),
    ("Transport", 10.0),
    ("Utilities", 8.0),
    ("Insurance", 7.0),
    ("Investments", 20.0),
    ("Lifestyle", 10.0),
];

pub fn expense_breakdown(profile: &UserProfile) -> String {
    let basis = profile.monthly_basis();
    let table = match profile.role {
        Role::Student => STUDENT_EXPENSES,
        Role::Professional => PROFESSIONAL_EXPENSES,
    };

    let mut text = format!(
        "Expense Breakdown ({}) on {} per month\n",
        profile.role,
        format_currency(basis)
    );
    for (category, pct) in table {
        text.push_str(&format!(
            " - {} ({:.0}%): {}\n",
            category,
            pct,
            format_currency(basis * pct / 100.0)
        ));
    }
    text.trim_end().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorth {
    pub assets: f64,
    pub liabilities: f64,
    pub net_worth: f64,
}

impl NetWorth {
    /// Professionals: balance plus 24 months of salary, less 8 months of
    /// salary in liabilities. Students: balance only.
    pub fn compute(profile: &UserProfile) -> Self {
        let (assets, liabilities) = match profile.salary {
            Some(salary) if profile.role == Role::Professional => {
                (profile.balance + salary * 24.0, salary * 8.0)
            }
            _ => (profile.balance, 0.0),
        };

        Self {
            assets,
            liabilities,
            net_worth: assets - liabilities,
        }
    }
}

pub fn net_worth(profile: &UserProfile) -> String {
    let nw = NetWorth::compute(profile);
    let mut text = format!(
        "Net Worth Statement for {}\nAssets: {}\n - Cash Balance: {}\n",
        profile.display_name,
        format_currency(nw.assets),
        format_currency(profile.balance)
    );
    if let (Role::Professional, Some(salary)) = (profile.role, profile.salary) {
        text.push_str(&format!(
            " - Salary Reserve (24 months): {}\n",
            format_currency(salary * 24.0)
        ));
        text.push_str(&format!(
            "Liabilities (8 months of salary): {}\n",
            format_currency(nw.liabilities)
        ));
    } else {
        text.push_str(&format!("Liabilities: {}\n", format_currency(nw.liabilities)));
    }
    text.push_str(&format!("Net Worth: {}", format_currency(nw.net_worth)));
    text
}

// (bill, % of basis, due day of month)
const STUDENT_BILLS: &[(&str, f64, u32)] = &[
    ("Hostel Fee", 35.0, 5),
    ("Mobile Recharge", 2.0, 12),
    ("Internet", 3.0, 15),
    ("Course Material", 5.0, 20),
];

const PROFESSIONAL_BILLS: &[(&str, f64, u32)] = &[
    ("Rent", 30.0, 1),
    ("Electricity", 3.0, 10),
    ("Internet", 1.5, 12),
    ("Credit Card", 10.0, 18),
    ("Insurance Premium", 5.0, 25),
];

pub fn bill_reminders(profile: &UserProfile) -> String {
    let basis = profile.monthly_basis();
    let bills = match profile.role {
        Role::Student => STUDENT_BILLS,
        Role::Professional => PROFESSIONAL_BILLS,
    };

    let mut total = 0.0;
    let mut text = String::from("Upcoming Bills This Month\n");
    for (bill, pct, due_day) in bills {
        let amount = basis * pct / 100.0;
        total += amount;
        text.push_str(&format!(
            " - {}: {} due on day {}\n",
            bill,
            format_currency(amount),
            due_day
        ));
    }
    text.push_str(&format!("Total Due: {}", format_currency(total)));
    text
}

const STUDENT_SUBSCRIPTIONS: &[(&str, f64)] = &[
    ("Netflix", 199.0),
    ("Spotify", 119.0),
    ("Cloud Storage", 130.0),
    ("Learning Platform", 399.0),
];

const PROFESSIONAL_SUBSCRIPTIONS: &[(&str, f64)] = &[
    ("Netflix", 649.0),
    ("Spotify", 119.0),
    ("Gym Membership", 1500.0),
    ("LinkedIn Premium", 1600.0),
    ("Cloud Storage", 130.0),
];

pub fn subscription_audit(profile: &UserProfile) -> String {
    let basis = profile.monthly_basis();
    let subscriptions = match profile.role {
        Role::Student => STUDENT_SUBSCRIPTIONS,
        Role::Professional => PROFESSIONAL_SUBSCRIPTIONS,
    };

    let mut text = String::from("Subscription Audit\n");
    for (name, cost) in subscriptions {
        text.push_str(&format!(" - {}: {} / month\n", name, format_currency(*cost)));
    }

    let monthly: f64 = subscriptions.iter().map(|(_, cost)| cost).sum();
    let share = if basis > 0.0 { monthly / basis } else { 1.0 };
    text.push_str(&format!(
        "\nMonthly Total: {}\nYearly Total: {}\nShare of Monthly Budget: {:.1}%\n",
        format_currency(monthly),
        format_currency(monthly * 12.0),
        share * 100.0
    ));

    if share > SUBSCRIPTION_REVIEW_SHARE {
        let priciest = subscriptions
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| *name)
            .unwrap_or_default();
        text.push_str(&format!(
            "Review: subscriptions exceed 5% of your monthly budget. Start with {}.",
            priciest
        ));
    } else {
        text.push_str("Subscriptions are within 5% of your monthly budget.");
    }
    text
}

pub fn cash_flow_projection(profile: &UserProfile) -> String {
    let (inflow, outflow) = match (profile.role, profile.salary) {
        (Role::Professional, Some(salary)) => (salary, salary * 0.70),
        _ => (0.0, profile.monthly_basis()),
    };

    let mut text = format!(
        "Cash-Flow Projection ({} months)\nMonthly Inflow: {} | Monthly Outflow: {}\n",
        PROJECTION_MONTHS,
        format_currency(inflow),
        format_currency(outflow)
    );

    let mut balance = profile.balance;
    for month in 1..=PROJECTION_MONTHS {
        balance += inflow - outflow;
        let flag = if balance < 0.0 { " (shortfall)" } else { "" };
        text.push_str(&format!(
            " - Month {}: {}{}\n",
            month,
            format_currency(balance),
            flag
        ));
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn professional() -> UserProfile {
        UserProfile::professional("PRO001", "pro123", "Rohan Mehta", 150000.0, 75000.0)
    }

    fn student() -> UserProfile {
        UserProfile::student("STU001", "student123", "Aarav Sharma", 15000.0)
    }

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(0.0), "₹0.00");
        assert_eq!(format_currency(999.5), "₹999.50");
        assert_eq!(format_currency(1333.3333), "₹1,333.33");
        assert_eq!(format_currency(1950000.0), "₹1,950,000.00");
        assert_eq!(format_currency(-2500.0), "-₹2,500.00");
    }

    #[test]
    fn test_budget_split_ten_thousand() {
        let split = BudgetSplit::compute(10000.0);
        assert_eq!(split.bucket, 4000.0);
        assert_eq!(split.daily, 3000.0);
        assert_eq!(split.loans, 3000.0);
        assert!((split.per_category - 1333.333).abs() < 0.001);

        let text = split.render();
        assert!(text.starts_with("Total Balance: ₹10,000.00"));
        assert!(text.contains("Bucket List (40%) = ₹4,000.00"));
        assert_eq!(text.matches("₹1,333.33").count(), 3);
        assert!(text.contains("Daily Use (30%) = ₹3,000.00"));
        assert!(text.ends_with("Personal Loans (30%) = ₹3,000.00"));
    }

    #[test]
    fn test_budget_split_parts_sum_to_balance() {
        for balance in [0.0, 0.01, 1.0, 99.99, 12345.67, 1_000_000.0, 7.3e9] {
            let split = BudgetSplit::compute(balance);
            let sum = split.bucket + split.daily + split.loans;
            assert!((sum - balance).abs() <= balance.abs() * 1e-12);
            let buckets = split.per_category * BUCKET_CATEGORIES.len() as f64;
            assert!((buckets - split.bucket).abs() <= split.bucket * 1e-12 + 1e-12);
        }
    }

    #[test]
    fn test_parse_balance_validation() {
        assert_eq!(parse_balance(" 10000 ").unwrap(), 10000.0);
        assert_eq!(parse_balance("₹1,50,000").unwrap(), 150000.0);
        assert!(parse_balance("ten thousand").is_err());
        assert!(parse_balance("").is_err());
        assert!(parse_balance("NaN").is_err());
        assert!(parse_balance("inf").is_err());
    }

    #[test]
    fn test_balance_ceiling() {
        assert_eq!(parse_balance("1000000000000").unwrap(), MAX_BALANCE);
        let err = parse_balance("1000000000000.01").unwrap_err();
        assert_eq!(err.to_string(), "Balance cannot exceed ₹1,000,000,000,000.00.");
        assert_eq!(
            budget_split_text("1e20"),
            "Balance cannot exceed ₹1,000,000,000,000.00."
        );
    }

    #[test]
    fn test_format_currency_large_amounts_do_not_saturate() {
        assert_eq!(format_currency(1e20), "₹100,000,000,000,000,000,000.00");
        assert_eq!(format_currency(-1e18), "-₹1,000,000,000,000,000,000.00");
        assert_eq!(format_currency(-0.001), "₹0.00");

        let split = BudgetSplit::compute(MAX_BALANCE);
        let text = split.render();
        assert!(text.contains("Total Balance: ₹1,000,000,000,000.00"));
        assert!(text.contains("₹400,000,000,000.00"));
    }

    #[test]
    fn test_budget_split_text_reports_validation_messages() {
        assert_eq!(budget_split_text("abc"), "Enter a valid numeric balance.");
        assert_eq!(budget_split_text("-5"), "Balance cannot be negative.");
        assert!(budget_split_text("10000").contains("₹4,000.00"));
    }

    #[test]
    fn test_net_worth_professional() {
        let nw = NetWorth::compute(&professional());
        assert_eq!(nw.assets, 150000.0 + 75000.0 * 24.0);
        assert_eq!(nw.liabilities, 75000.0 * 8.0);
        assert_eq!(nw.net_worth, nw.assets - nw.liabilities);
        assert_eq!(nw.net_worth, 1_350_000.0);

        let text = net_worth(&professional());
        assert!(text.contains("Assets: ₹1,950,000.00"));
        assert!(text.contains("₹600,000.00"));
        assert!(text.ends_with("Net Worth: ₹1,350,000.00"));
    }

    #[test]
    fn test_net_worth_student_has_no_liabilities() {
        let nw = NetWorth::compute(&student());
        assert_eq!(nw.assets, 15000.0);
        assert_eq!(nw.liabilities, 0.0);
        assert_eq!(nw.net_worth, 15000.0);
    }

    #[test]
    fn test_budget_summary_uses_role_basis() {
        let text = budget_summary(&professional());
        assert!(text.contains("Needs (50%) = ₹37,500.00"));
        assert!(text.contains("monthly salary"));

        let text = budget_summary(&student());
        assert!(text.contains("Monthly Basis: ₹1,500.00 (10% of balance)"));
        assert!(text.contains("Savings (20%) = ₹300.00"));
    }

    #[test]
    fn test_expense_breakdown_tables() {
        let text = expense_breakdown(&student());
        assert!(text.contains("Hostel/Rent (35%): ₹525.00"));
        assert!(!text.contains("Insurance"));

        let text = expense_breakdown(&professional());
        assert!(text.contains("Investments (20%): ₹15,000.00"));
    }

    #[test]
    fn test_bill_reminders_total() {
        let text = bill_reminders(&professional());
        // 30 + 3 + 1.5 + 10 + 5 = 49.5% of 75,000
        assert!(text.ends_with("Total Due: ₹37,125.00"));
        assert!(text.contains("Rent: ₹22,500.00 due on day 1"));
    }

    #[test]
    fn test_subscription_audit_flags_heavy_spend() {
        let text = subscription_audit(&student());
        assert!(text.contains("Monthly Total: ₹847.00"));
        assert!(text.contains("Start with Learning Platform."));

        let text = subscription_audit(&professional());
        assert!(text.contains("Yearly Total: ₹47,976.00"));
        assert!(text.contains("Start with LinkedIn Premium."));
    }

    #[test]
    fn test_cash_flow_projection_months() {
        let text = cash_flow_projection(&professional());
        assert!(text.contains("Month 1: ₹172,500.00"));
        assert!(text.ends_with("Month 6: ₹285,000.00"));

        let text = cash_flow_projection(&student());
        assert!(text.ends_with("Month 6: ₹6,000.00"));
        assert!(!text.contains("shortfall"));
    }

    #[test]
    fn test_templates_are_deterministic() {
        let profile = professional();
        assert_eq!(net_worth(&profile), net_worth(&profile));
        assert_eq!(cash_flow_projection(&profile), cash_flow_projection(&profile));
        assert_eq!(subscription_audit(&profile), subscription_audit(&profile));
    }
}
