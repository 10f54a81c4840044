/// Glyph for an OpenWeatherMap icon code ("10d") or a free-text description
/// ("light rain"). Unknown input gets the partly-sunny glyph.
pub fn glyph(code_or_description: Option<&str>) -> &'static str {
    let raw = code_or_description.unwrap_or("").trim();

    if let Some(glyph) = glyph_for_code(raw) {
        return glyph;
    }

    let key = raw.to_lowercase();
    if key.contains("clear") {
        "☀️"
    } else if key.contains("cloud") {
        "☁️"
    } else if key.contains("rain") {
        "🌧"
    } else if key.contains("storm") || key.contains("thunder") {
        "⚡"
    } else if key.contains("snow") {
        "❄️"
    } else {
        "🌤"
    }
}

fn glyph_for_code(code: &str) -> Option<&'static str> {
    let glyph = match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "🌤",
        "02n" => "☁️",
        "03d" | "03n" => "⛅",
        "04d" | "04n" => "☁️",
        "09d" | "09n" => "🌧",
        "10d" => "🌦",
        "10n" => "🌧",
        "11d" | "11n" => "⚡",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫",
        _ => return None,
    };
    Some(glyph)
}
