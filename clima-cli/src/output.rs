//! Terminal rendering of lookup results. Upstream text is passed through
//! [`terminal_safe`] before printing.

use clima_core::{
    LookupError, WeatherResult,
    render::{forecast_label, format_temp, map_url},
    sanitize::terminal_safe,
};

pub fn print_result(result: &WeatherResult) {
    let current = result.current();

    println!();
    println!("  {}", terminal_safe(&current.city_name));
    println!(
        "  {}°C, {}",
        format_temp(current.temperature_c),
        terminal_safe(&current.description)
    );
    println!(
        "  Viento: {} m/s   Humedad: {}%",
        current.wind_speed_mps, current.humidity_pct
    );
    println!("  Mapa: {}", map_url(current.coordinates));

    match (result.forecast(), result.error()) {
        (Some(forecast), _) => {
            println!();
            println!("  Pronóstico:");
            for entry in &forecast.entries {
                println!(
                    "    {:<10} {:>6}°C  {}",
                    forecast_label(forecast, entry),
                    format_temp(entry.temperature_c),
                    terminal_safe(&entry.description)
                );
            }
            println!();
        }
        (None, Some(err)) => print_notice(err),
        (None, None) => {}
    }
}

/// The single notice shown for a failed search.
pub fn print_notice(err: &LookupError) {
    eprintln!("⚠ {}", err.user_message());
}
