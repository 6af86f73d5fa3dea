//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Format a publication date for display
///
/// This is the only place dates are turned into text; listing pages,
/// load-more fragments and post pages all go through it.
///
/// # Examples
/// ```ignore
/// format_publication_date(&date, "dd MMM yyyy", "America/Sao_Paulo", "pt-BR") // -> "15 mar 2021"
/// ```
pub fn format_publication_date(
    date: &DateTime<Utc>,
    format: &str,
    timezone: &str,
    language: &str,
) -> String {
    let chrono_format = date_fns_to_chrono_format(format);
    let locale = locale_for(language);

    match timezone.parse::<Tz>() {
        Ok(tz) => date
            .with_timezone(&tz)
            .format_localized(&chrono_format, locale)
            .to_string(),
        Err(_) => {
            tracing::debug!("Unknown timezone {:?}, formatting in UTC", timezone);
            date.format_localized(&chrono_format, locale).to_string()
        }
    }
}

/// Format a date in ISO 8601 for `<time datetime>` attributes
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Map a site language tag to a chrono locale
pub fn locale_for(language: &str) -> Locale {
    match language.replace('-', "_").as_str() {
        "pt_BR" | "pt" => Locale::pt_BR,
        "pt_PT" => Locale::pt_PT,
        "es" | "es_ES" => Locale::es_ES,
        "fr" | "fr_FR" => Locale::fr_FR,
        "de" | "de_DE" => Locale::de_DE,
        "en_GB" => Locale::en_GB,
        _ => Locale::en_US,
    }
}

/// Convert date-fns format tokens to chrono format
fn date_fns_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each field
    let replacements = [
        // Year
        ("yyyy", "%Y"),
        ("yy", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("dd", "%d"),
        // Day of week
        ("EEEE", "%A"),
        ("EEE", "%a"),
        // Time
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
