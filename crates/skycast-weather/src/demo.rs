//! Placeholder data served when no credential is configured.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::types::{
    Astro, Condition, CurrentConditions, DaySummary, Forecast, ForecastDay, ForecastSnapshot,
    HourForecast, Location, LocationInfo, WeatherSnapshot,
};

const ICON_URL: &str = "//cdn.weatherapi.com/weather/64x64/day/116.png";

/// Code/text pairs the synthesized forecast picks from
const DEMO_CONDITIONS: &[(i32, &str)] = &[
    (1000, "Sunny"),
    (1003, "Partly cloudy"),
    (1006, "Cloudy"),
    (1183, "Light rain"),
];

const WIND_DIRECTIONS: &[&str] = &["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

const TEMP_MIN_C: f64 = -10.0;
const TEMP_MAX_C: f64 = 40.0;

fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn kph_to_mph(kph: f64) -> f64 {
    kph * 0.621_371
}

fn london() -> LocationInfo {
    LocationInfo {
        name: "London".to_string(),
        region: "City of London, Greater London".to_string(),
        country: "United Kingdom".to_string(),
        lat: 51.52,
        lon: -0.11,
        tz_id: "Europe/London".to_string(),
        localtime_epoch: 1_701_259_200,
        localtime: "2023-11-29 12:00".to_string(),
    }
}

fn demo_current() -> CurrentConditions {
    CurrentConditions {
        last_updated_epoch: 1_701_259_200,
        last_updated: "2023-11-29 12:00".to_string(),
        temp_c: 12.0,
        temp_f: 53.6,
        is_day: 1,
        condition: Condition {
            text: "Partly cloudy".to_string(),
            icon: ICON_URL.to_string(),
            code: 1003,
        },
        wind_mph: 8.1,
        wind_kph: 13.0,
        wind_degree: 230,
        wind_dir: "SW".to_string(),
        pressure_mb: 1012.0,
        pressure_in: 29.88,
        precip_mm: 0.0,
        precip_in: 0.0,
        humidity: 71,
        cloud: 50,
        feelslike_c: 10.5,
        feelslike_f: 50.9,
        vis_km: 10.0,
        vis_miles: 6.0,
        uv: 3.0,
        gust_mph: 12.1,
        gust_kph: 19.4,
    }
}

/// Fixed current conditions; identical on every call.
pub fn current_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        location: london(),
        current: demo_current(),
    }
}

/// Synthesized forecast of exactly `days` days with 24 hourly entries each.
///
/// Values are random but each day is self-consistent: min <= avg <= max,
/// hourly temperatures stay within the day's range, and every value sits
/// inside its plausible physical range.
pub fn forecast_snapshot(days: u8) -> ForecastSnapshot {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();

    let forecast_day = (0..i64::from(days))
        .map(|offset| {
            let date = today + Duration::days(offset);
            let date_epoch = date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or_default();

            let min_c = rng.gen_range(TEMP_MIN_C..TEMP_MAX_C - 2.0);
            let max_c = (min_c + rng.gen_range(2.0..12.0)).min(TEMP_MAX_C);
            let avg_c = (min_c + max_c) / 2.0;
            let (code, text) = DEMO_CONDITIONS[rng.gen_range(0..DEMO_CONDITIONS.len())];
            let condition = Condition {
                text: text.to_string(),
                icon: ICON_URL.to_string(),
                code,
            };
            let chance_of_rain: u8 = rng.gen_range(0..=100);
            let max_wind_kph = rng.gen_range(5.0..50.0);
            let precip_mm = if chance_of_rain > 50 {
                rng.gen_range(0.0..10.0)
            } else {
                0.0
            };
            let avg_vis_km = rng.gen_range(8.0..12.0);

            let hour = (0..24)
                .map(|h: i64| {
                    let temp_c = rng.gen_range(min_c..=max_c);
                    let wind_kph = rng.gen_range(0.0..=max_wind_kph);
                    let hour_rain: u8 = rng.gen_range(0..=100);
                    let daylight = (7..=16).contains(&h);
                    HourForecast {
                        time_epoch: date_epoch + h * 3600,
                        time: format!("{} {:02}:00", date.format("%Y-%m-%d"), h),
                        temp_c,
                        temp_f: c_to_f(temp_c),
                        is_day: u8::from(daylight),
                        condition: condition.clone(),
                        wind_mph: kph_to_mph(wind_kph),
                        wind_kph,
                        wind_degree: rng.gen_range(0..360),
                        wind_dir: WIND_DIRECTIONS[rng.gen_range(0..WIND_DIRECTIONS.len())]
                            .to_string(),
                        pressure_mb: rng.gen_range(1000.0..1030.0),
                        precip_mm: if hour_rain > 80 { rng.gen_range(0.0..2.0) } else { 0.0 },
                        humidity: rng.gen_range(0..=100),
                        cloud: rng.gen_range(0..=100),
                        feelslike_c: (temp_c + rng.gen_range(-3.0..1.0)).clamp(TEMP_MIN_C, TEMP_MAX_C),
                        dewpoint_c: temp_c - rng.gen_range(2.0..8.0),
                        will_it_rain: u8::from(hour_rain > 80),
                        chance_of_rain: hour_rain,
                        will_it_snow: 0,
                        chance_of_snow: 0,
                        vis_km: rng.gen_range(5.0..12.0),
                        gust_kph: wind_kph + rng.gen_range(0.0..15.0),
                        uv: if (10..=14).contains(&h) { rng.gen_range(2.0..8.0) } else { 0.0 },
                    }
                })
                .collect();

            ForecastDay {
                date: date.format("%Y-%m-%d").to_string(),
                date_epoch,
                day: DaySummary {
                    maxtemp_c: max_c,
                    maxtemp_f: c_to_f(max_c),
                    mintemp_c: min_c,
                    mintemp_f: c_to_f(min_c),
                    avgtemp_c: avg_c,
                    avgtemp_f: c_to_f(avg_c),
                    maxwind_mph: kph_to_mph(max_wind_kph),
                    maxwind_kph: max_wind_kph,
                    totalprecip_mm: precip_mm,
                    totalprecip_in: precip_mm / 25.4,
                    totalsnow_cm: 0.0,
                    avgvis_km: avg_vis_km,
                    avgvis_miles: avg_vis_km * 0.621_371,
                    avghumidity: rng.gen_range(0.0..=100.0),
                    daily_will_it_rain: u8::from(chance_of_rain > 50),
                    daily_chance_of_rain: chance_of_rain,
                    daily_will_it_snow: 0,
                    daily_chance_of_snow: 0,
                    condition,
                    uv: rng.gen_range(0.0..=11.0),
                },
                astro: Astro {
                    sunrise: "07:30 AM".to_string(),
                    sunset: "04:30 PM".to_string(),
                    moonrise: "08:45 PM".to_string(),
                    moonset: "06:15 AM".to_string(),
                    moon_phase: "Waxing Crescent".to_string(),
                    moon_illumination: 25,
                },
                hour,
            }
        })
        .collect();

    ForecastSnapshot {
        location: london(),
        current: demo_current(),
        forecast: Forecast { forecast_day },
    }
}

/// Fixed search results, regardless of the query.
pub fn locations() -> Vec<Location> {
    vec![
        Location::new("London", "England", "United Kingdom", 51.52, -0.11),
        Location::new("New York", "New York", "USA", 40.71, -74.01),
        Location::new("Tokyo", "Tokyo", "Japan", 35.69, 139.69),
    ]
}
