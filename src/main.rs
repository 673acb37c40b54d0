use anyhow::{Context, Result};
use kuraz_core::Config;
use kuraz_session::{build_controller, SessionController, SessionError};

#[tokio::main]
async fn main() -> Result<()> {
    kuraz_core::init()?;

    // Warnings are logged by the loader
    let (config, _) = Config::load_validated(None)?;

    let controller = build_controller(&config).context("Failed to set up session")?;
    tracing::info!("Kuraz session started");

    let mut args = std::env::args().skip(1);
    let latitude = args.next().unwrap_or_default();
    let longitude = args.next().unwrap_or_default();

    println!("Kuraz - weather and things to do");

    controller.start_search()?;
    if let Err(e) = controller
        .submit_coordinate_text(&latitude, &longitude)
        .await
    {
        tracing::error!("Weather lookup failed: {}", e);
        report(&e);
        controller.return_to_welcome();
        return Ok(());
    }
    print_weather(&controller);

    if controller.suggestions_enabled() {
        println!("\nFinding things to do...");
        match controller.request_suggestions().await {
            Ok(()) => print_suggestions(&controller),
            Err(e) => {
                tracing::error!("Suggestion request failed: {}", e);
                report(&e);
            }
        }
    } else {
        println!("\nSet GEMINI_API_KEY to get activity suggestions.");
    }

    controller.return_to_welcome();
    Ok(())
}

fn report(error: &SessionError) {
    println!("\n{}", error.user_message());
    if error.is_retryable() {
        println!("Run kuraz again in a moment.");
    }
}

fn print_weather(controller: &SessionController) {
    let Some(weather) = controller.snapshot().weather else {
        return;
    };

    println!("\n{}", weather.location_label);
    println!(
        "  {}°C  {}  wind {} km/h",
        weather.current.temperature_c, weather.current.condition_label, weather.current.wind_speed
    );
    println!("\nForecast:");
    for day in &weather.forecast {
        println!(
            "  {:<8} {:>4}°C  {}",
            day.label,
            day.temperature_c,
            day.condition.label()
        );
    }
}

fn print_suggestions(controller: &SessionController) {
    let state = controller.snapshot();
    if state.suggestions.is_empty() {
        println!("No suggestions this time.");
        return;
    }
    for (i, suggestion) in state.suggestions.iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion.title);
        println!("     {}", suggestion.description);
    }
}
