//! Prompt construction for generative features

use crate::features::Feature;
use crate::models::UserProfile;
use crate::templates::format_currency;

const PERSONA: &str = "You are a friendly, professional personal-finance assistant for \
students and working professionals in India. Be accurate, practical and concise, and \
say when a question needs a licensed advisor.";

fn profile_line(profile: &UserProfile) -> String {
    let mut line = format!(
        "User profile: name {}, role {}, balance {}",
        profile.display_name,
        profile.role.as_str(),
        format_currency(profile.balance)
    );
    if let Some(salary) = profile.salary {
        line.push_str(&format!(", monthly salary {}", format_currency(salary)));
    }
    line.push('.');
    line
}

/// Advice prompt: profile, feature context and the user's own words.
pub fn advice_prompt(
    feature: Feature,
    profile: &UserProfile,
    language: &str,
    user_text: &str,
    document_text: Option<&str>,
) -> String {
    let mut prompt = format!(
        "{}\nLanguage: {}.\nCategory: {}. Feature: {}.\n{}\n\nUser input:\n{}\n",
        PERSONA,
        language,
        feature.group(),
        feature.label(),
        profile_line(profile),
        user_text.trim()
    );
    if let Some(doc) = document_text {
        prompt.push_str(&format!("\nDocument text:\n\"\"\"{}\"\"\"\n", doc.trim()));
    }
    prompt.push_str("\nProvide a concise professional answer.");
    prompt
}

/// Document-analysis prompt. The instruction depends on the feature;
/// `content` is typed text, extracted file text or OCR text.
pub fn document_prompt(
    feature: Feature,
    profile: &UserProfile,
    language: &str,
    content: &str,
) -> String {
    let requested_by = format!(
        "Requested by {} ({}).",
        profile.display_name,
        profile.role.as_str()
    );

    match feature {
        Feature::EntityExtraction => format!(
            "Extract named entities (persons, organizations, dates, monetary amounts) from the \
             text. Return JSON only. Language: {}\n{}\n\nText:\n{}",
            language, requested_by, content
        ),
        Feature::SimplifyClauses => format!(
            "Break the following into numbered clauses and provide a one-line simple \
             explanation for each. Return JSON only. Language: {}\n{}\n\n{}",
            language, requested_by, content
        ),
        _ => format!(
            "{}\nLanguage: {}.\n{}\nOCR text:\n\"\"\"{}\"\"\"\nTask:\n\
             1) Identify if the image is a receipt/invoice/document/photo.\n\
             2) If receipt/invoice, extract vendor, dates, amounts, currency, and item lines.\n\
             Return structured JSON.",
            PERSONA, language, requested_by, content
        ),
    }
}
