use chrono::{DateTime, Local, Locale, Timelike};

use super::phrases;

/// Wall-clock source for time and date answers.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant. Used by tests and demos.
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

fn chrono_locale(tag: &str) -> Locale {
    match tag.replace('-', "_").as_str() {
        "es_MX" => Locale::es_MX,
        "es_AR" => Locale::es_AR,
        "en_US" => Locale::en_US,
        "en_GB" => Locale::en_GB,
        "pt_BR" => Locale::pt_BR,
        "pt_PT" => Locale::pt_PT,
        "fr_FR" => Locale::fr_FR,
        "it_IT" => Locale::it_IT,
        _ => Locale::es_ES,
    }
}

/// "Son las {H} y {M} minutos." with unpadded 24h hour and minute.
pub fn spoken_time(now: &DateTime<Local>) -> String {
    phrases::time_of_day(now.hour(), now.minute())
}

/// "Hoy es {weekday, day month year}." in the given locale.
pub fn spoken_date(now: &DateTime<Local>, locale: &str) -> String {
    let pattern = if locale.starts_with("en") {
        "%A, %B %-d, %Y"
    } else {
        "%A, %-d de %B de %Y"
    };
    let long_date = now.format_localized(pattern, chrono_locale(locale)).to_string();
    phrases::today(&long_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn morning() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 17, 9, 5, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn time_is_unpadded() {
        assert_eq!(spoken_time(&morning()), "Son las 9 y 5 minutos.");
    }

    #[test]
    fn date_uses_long_spanish_form() {
        let text = spoken_date(&morning(), "es-ES");
        assert!(text.starts_with("Hoy es "));
        assert!(text.contains("17 de octubre de 2026"), "got {text}");
        assert!(text.ends_with('.'));
    }
}
