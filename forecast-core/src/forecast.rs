//! Text shown above the patient tabs.

use crate::model::{GeoLocation, WeatherOverview};

const OVERVIEW_MARKER: &str = "overall";

/// `FORECAST for <zip>: <excerpt>`; missing pieces render as empty text.
pub fn forecast_title(location: Option<&GeoLocation>, weather: Option<&WeatherOverview>) -> String {
    let zip = location.map(|l| l.zip.as_str()).unwrap_or_default();
    let excerpt = weather
        .map(|w| overview_excerpt(&w.weather_overview))
        .unwrap_or_default();

    format!("FORECAST for {zip}: {excerpt}")
}

/// Tail of the overview starting at the first case-insensitive "overall".
///
/// Returns an empty string when the marker does not occur.
pub fn overview_excerpt(overview: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with the original text.
    match overview.to_ascii_lowercase().find(OVERVIEW_MARKER) {
        Some(idx) => &overview[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cambridge() -> GeoLocation {
        GeoLocation {
            zip: "02139".into(),
            name: "Cambridge".into(),
            lat: 42.36,
            lon: -71.09,
            country: "US".into(),
        }
    }

    fn overview(text: &str) -> WeatherOverview {
        WeatherOverview {
            lat: None,
            lon: None,
            tz: None,
            date: None,
            units: None,
            weather_overview: text.into(),
        }
    }

    #[test]
    fn title_with_location_and_overview() {
        let weather = overview("Clear skies. Overall pleasant conditions expected.");

        assert_eq!(
            forecast_title(Some(&cambridge()), Some(&weather)),
            "FORECAST for 02139: Overall pleasant conditions expected."
        );
    }

    #[test]
    fn title_without_anything() {
        assert_eq!(forecast_title(None, None), "FORECAST for : ");
    }

    #[test]
    fn title_with_location_only() {
        assert_eq!(forecast_title(Some(&cambridge()), None), "FORECAST for 02139: ");
    }

    #[test]
    fn excerpt_is_case_insensitive() {
        assert_eq!(
            overview_excerpt("Windy. OVERALL mild, overall dry."),
            "OVERALL mild, overall dry."
        );
    }

    #[test]
    fn excerpt_without_marker_is_empty() {
        assert_eq!(overview_excerpt("Sunny all day."), "");
        assert_eq!(overview_excerpt(""), "");
    }

    #[test]
    fn excerpt_handles_multibyte_prefix() {
        assert_eq!(overview_excerpt("Température 20°C. Overall fine."), "Overall fine.");
    }
}
