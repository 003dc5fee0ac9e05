//! Normalization of date entities into field values.

use chrono::NaiveDate;
use lexscan_catalog::Vocabulary;
use lexscan_model::ExtractedEntity;

/// Day, month and year strings of the Gregorian component, composite groups first.
pub fn gregorian_parts(entity: &ExtractedEntity) -> Option<(&str, &str, &str)> {
    if let (Some(day), Some(month), Some(year)) =
        (entity.meta("g_day"), entity.meta("g_month"), entity.meta("g_year"))
    {
        return Some((day, month, year));
    }
    match (entity.meta("day"), entity.meta("month"), entity.meta("year")) {
        (Some(day), Some(month), Some(year)) => Some((day, month, year)),
        _ => None,
    }
}

/// True when the entity carries a month from the Gregorian vocabulary or a numeric month.
pub fn has_gregorian(entity: &ExtractedEntity, vocabulary: &Vocabulary) -> bool {
    gregorian_parts(entity).is_some_and(|(_, month, _)| vocabulary.gregorian_month(month).is_some())
}

pub fn has_hijri(entity: &ExtractedEntity, vocabulary: &Vocabulary) -> bool {
    entity
        .meta("hijri_month")
        .is_some_and(|month| vocabulary.hijri_month(month).is_some())
}

/// `YYYY-MM-DD`, or `None` when the components do not form a calendar date.
pub fn gregorian_iso(entity: &ExtractedEntity, vocabulary: &Vocabulary) -> Option<String> {
    let (day, month, year) = gregorian_parts(entity)?;
    let month = vocabulary.gregorian_month(month)?;
    let day = day.parse::<u32>().ok()?;
    let year = year.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}

/// `D <canonical month> YYYY`.
pub fn hijri_text(entity: &ExtractedEntity, vocabulary: &Vocabulary) -> Option<String> {
    let month = vocabulary.hijri_month(entity.meta("hijri_month")?)?;
    let day = entity.meta("day")?.parse::<u32>().ok()?;
    let year = entity.meta("hijri_year")?.parse::<u32>().ok()?;
    if !(1..=30).contains(&day) {
        return None;
    }
    Some(format!("{day} {} {year}", month.canonical))
}
