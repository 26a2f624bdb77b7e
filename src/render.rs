//! Terminal formatting for biographical data. Pure string helpers, kept out
//! of the core types so the data model stays presentation-free.

use crate::person::Person;

/// Format a signed year for display. Negative years are shown in the era
/// before the present one.
pub fn format_year(year: i32) -> String {
    if year < 0 {
        format!("{} BCE", -(year as i64))
    } else {
        year.to_string()
    }
}

/// Format a birth–death range. A missing side renders as "?"; if neither
/// year is known the result is empty.
pub fn format_lifespan(birth_year: Option<i32>, death_year: Option<i32>) -> String {
    if birth_year.is_none() && death_year.is_none() {
        return String::new();
    }
    let birth = birth_year.map(format_year).unwrap_or_else(|| "?".to_string());
    let death = death_year.map(format_year).unwrap_or_else(|| "?".to_string());
    format!("{} – {}", birth, death)
}

/// Badge for a completed lifespan.
pub fn age_badge(age: u32) -> String {
    format!("died at {}", age)
}

/// One-line summary of a person: label, lifespan, age badge.
pub fn person_line(person: &Person) -> String {
    let mut line = person.label.clone();
    let lifespan = format_lifespan(person.birth_year, person.death_year);
    if !lifespan.is_empty() {
        line.push_str(&format!(" ({})", lifespan));
    }
    if let Some(age) = person.age {
        line.push_str(&format!(" [{}]", age_badge(age)));
    }
    line
}
