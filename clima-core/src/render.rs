//! HTML fragments for the result view. Every upstream-derived value goes through
//! [`escape_html`], numbers included, since they arrive as untrusted JSON.

use chrono::{Datelike, Timelike, Weekday};

use crate::{
    model::{Coordinates, Forecast, ForecastEntry, WeatherResult, WeatherSnapshot},
    sanitize::escape_html,
};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

pub fn icon_url(code: &str) -> String {
    format!("{ICON_BASE_URL}/{code}@2x.png")
}

/// Link standing in for the map overlay: a marker at the searched city.
pub fn map_url(coords: Coordinates) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=10/{lat}/{lon}",
        lat = coords.lat,
        lon = coords.lon
    )
}

pub fn format_temp(celsius: f64) -> String {
    format!("{celsius:.1}")
}

pub fn weekday_es(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lun",
        Weekday::Tue => "mar",
        Weekday::Wed => "mié",
        Weekday::Thu => "jue",
        Weekday::Fri => "vie",
        Weekday::Sat => "sáb",
        Weekday::Sun => "dom",
    }
}

/// "sáb 15:00", in the searched city's local time.
pub fn forecast_label(forecast: &Forecast, entry: &ForecastEntry) -> String {
    let local = forecast.local_time(entry);
    format!("{} {:02}:00", weekday_es(local.weekday()), local.hour())
}

pub fn current_html(snapshot: &WeatherSnapshot) -> String {
    let mut html = String::from("<section class=\"weather-result\">\n");
    html.push_str(&format!(
        "  <h2 class=\"city-name\">{}</h2>\n",
        escape_html(&snapshot.city_name)
    ));
    if let Some(icon) = &snapshot.icon_code {
        html.push_str(&format!(
            "  <img class=\"weather-icon\" src=\"{}\" alt=\"{}\">\n",
            escape_html(&icon_url(icon)),
            escape_html(&snapshot.description)
        ));
    }
    html.push_str(&format!(
        "  <p class=\"temperature\">{}°C</p>\n",
        escape_html(&format_temp(snapshot.temperature_c))
    ));
    html.push_str(&format!(
        "  <p class=\"description\">{}</p>\n",
        escape_html(&snapshot.description)
    ));
    html.push_str(&format!(
        "  <p class=\"wind\">Viento: {} m/s</p>\n",
        escape_html(&snapshot.wind_speed_mps.to_string())
    ));
    html.push_str(&format!(
        "  <p class=\"humidity\">Humedad: {}%</p>\n",
        escape_html(&snapshot.humidity_pct.to_string())
    ));
    html.push_str(&format!(
        "  <a class=\"map\" href=\"{}\">Ver en el mapa</a>\n",
        escape_html(&map_url(snapshot.coordinates))
    ));
    html.push_str("</section>\n");
    html
}

fn forecast_item_html(forecast: &Forecast, entry: &ForecastEntry) -> String {
    let mut html = String::from("  <div class=\"forecast-item\">\n");
    html.push_str(&format!(
        "    <div class=\"forecast-time\">{}</div>\n",
        escape_html(&forecast_label(forecast, entry))
    ));
    if !entry.icon_code.is_empty() {
        html.push_str(&format!(
            "    <img class=\"forecast-icon\" src=\"{}\" alt=\"\">\n",
            escape_html(&icon_url(&entry.icon_code))
        ));
    }
    html.push_str(&format!(
        "    <div class=\"forecast-temp\">{}°C</div>\n",
        escape_html(&format_temp(entry.temperature_c))
    ));
    html.push_str(&format!(
        "    <div class=\"forecast-desc\">{}</div>\n",
        escape_html(&entry.description)
    ));
    html.push_str("  </div>\n");
    html
}

pub fn forecast_html(forecast: &Forecast) -> String {
    let mut html = String::from("<section id=\"forecast\">\n");
    for entry in &forecast.entries {
        html.push_str(&forecast_item_html(forecast, entry));
    }
    html.push_str("</section>\n");
    html
}

/// Standalone page for one lookup. A failed forecast leaves its section out and adds the
/// notice instead.
pub fn report_html(result: &WeatherResult) -> String {
    let current = result.current();
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Clima en {}</title>\n",
        escape_html(&current.city_name)
    ));
    html.push_str("</head>\n<body>\n");
    html.push_str(&current_html(current));
    match (result.forecast(), result.error()) {
        (Some(forecast), _) => html.push_str(&forecast_html(forecast)),
        (None, Some(err)) => html.push_str(&format!(
            "<p class=\"notice\">{}</p>\n",
            escape_html(&err.user_message())
        )),
        (None, None) => {}
    }
    html.push_str("</body>\n</html>\n");
    html
}
