use finance_assistant::{
    auth::StaticDirectory,
    config::AppConfig,
    features::{Feature, FeatureCatalog, InputRequirement},
    inference::client_from_config,
    FeatureDispatcher, FeatureRequest, Session,
};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Usage: assistant [ACCOUNT_ID PASSWORD [FEATURE_KEY [TEXT...]]]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    info!("Finance Assistant starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let account_id = args.first().map(String::as_str).unwrap_or("STU001");
    let password = args.get(1).map(String::as_str).unwrap_or("student123");
    let feature: Feature = args
        .get(2)
        .map(String::as_str)
        .unwrap_or("budget_summary")
        .parse()?;
    let text = args.get(3..).map(|rest| rest.join(" ")).unwrap_or_default();

    let config = AppConfig::from_env()?;
    let directory = StaticDirectory::demo();

    let mut session = Session::new();
    session.login(&directory, account_id, password)?;
    let Some(profile) = session.profile() else {
        return Err("login did not produce a profile".into());
    };

    println!("\nWelcome, {} ({})", profile.display_name, profile.role);
    for group in FeatureCatalog::for_role(profile.role) {
        let keys: Vec<&str> = group.features.iter().map(|f| f.key).collect();
        println!("  {}: {}", group.label, keys.join(", "));
    }

    let mut request = FeatureRequest::new(feature);
    match feature.input() {
        InputRequirement::Balance => request = request.with_balance(text),
        InputRequirement::None => {}
        _ if text.is_empty() => request = request.with_text(feature.example()),
        _ => request = request.with_text(text),
    }

    info!(feature = feature.key(), "Running feature");
    println!("\n=== {} ===", feature.label());

    let dispatcher = FeatureDispatcher::new(client_from_config(&config.inference), config.inference);
    let answer = dispatcher
        .stream_feature(&session, request, None, |chunk| {
            print!("{}", chunk);
            let _ = std::io::stdout().flush();
        })
        .await;
    println!();

    info!(chars = answer.len(), "Feature finished");
    Ok(())
}
