//! Canned text used when the completion call fails

use crate::models::Role;
use uuid::Uuid;

pub const APOLOGY: &str =
    "Sorry, the assistant could not analyse this right now. Please try again in a moment.";

pub const STUDENT_TIPS: &[&str] = &[
    "Tip: Put 10% of any pocket money or stipend into savings before you spend the rest.",
    "Tip: Track every expense for one week; small cafe and snack spends add up fast.",
    "Tip: Use student discounts and shared subscriptions instead of paying full price.",
    "Tip: Keep one month of hostel and food costs aside as an emergency fund.",
    "Tip: Buy second-hand textbooks or use the library before buying new.",
];

pub const PROFESSIONAL_TIPS: &[&str] = &[
    "Tip: Automate a SIP on salary day so investing happens before spending.",
    "Tip: Keep six months of expenses in a liquid emergency fund.",
    "Tip: Use 80C options like PPF or ELSS early in the year, not in March.",
    "Tip: Review insurance cover every year; term cover should be 10-15x annual income.",
    "Tip: Pay credit card bills in full to avoid interest above 36% a year.",
];

pub fn tips_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Student => STUDENT_TIPS,
        Role::Professional => PROFESSIONAL_TIPS,
    }
}

/// One tip for the role, picked at random.
pub fn random_tip(role: Role) -> &'static str {
    let tips = tips_for(role);
    let index = (Uuid::new_v4().as_u128() % tips.len() as u128) as usize;
    tips[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_tip_comes_from_role_list() {
        for _ in 0..50 {
            assert!(STUDENT_TIPS.contains(&random_tip(Role::Student)));
            assert!(PROFESSIONAL_TIPS.contains(&random_tip(Role::Professional)));
        }
    }

    #[test]
    fn test_tip_lists_are_non_empty() {
        assert!(!STUDENT_TIPS.is_empty());
        assert!(PROFESSIONAL_TIPS.iter().all(|t| !t.is_empty()));
    }
}
