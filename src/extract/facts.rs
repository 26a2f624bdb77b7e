//! Biographical fact extraction from a raw entity record.

use crate::kb::{
    LanguageValue, RawEntity, PRECISION_YEAR, PROP_DATE_OF_BIRTH, PROP_DATE_OF_DEATH, PROP_IMAGE,
};
use std::collections::BTreeMap;

/// Validated biographical facts for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Facts {
    pub label: String,
    pub description: String,
    pub wikipedia_url: Option<String>,
    pub image_url: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub age: Option<u32>,
}

/// Extract facts from a raw record. Pure, no I/O.
///
/// Contradictory year pairs (birth after death) are discarded wholesale
/// rather than guessing which side is wrong; the age is derived only from a
/// surviving pair.
pub fn extract_facts(entity: &RawEntity, fallback_id: &str) -> Facts {
    let label = pick_language(&entity.labels, fallback_id);
    let description = pick_language(&entity.descriptions, fallback_id);

    let wikipedia_url = entity
        .sitelinks
        .get("enwiki")
        .filter(|link| !link.title.is_empty())
        .map(|link| {
            format!(
                "https://en.wikipedia.org/wiki/{}",
                link.title.replace(' ', "_")
            )
        });

    let image_url = entity
        .claims
        .get(PROP_IMAGE)
        .into_iter()
        .flatten()
        .filter_map(|claim| claim.string_value())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string);

    let mut birth_year = year_from_claims(entity, PROP_DATE_OF_BIRTH);
    let mut death_year = year_from_claims(entity, PROP_DATE_OF_DEATH);

    if let (Some(birth), Some(death)) = (birth_year, death_year) {
        if birth > death {
            log::warn!(
                "Discarding contradictory years for {}: born {} after death {}",
                fallback_id,
                birth,
                death
            );
            birth_year = None;
            death_year = None;
        }
    }

    let age = match (birth_year, death_year) {
        (Some(birth), Some(death)) if death >= birth => {
            Some((i64::from(death) - i64::from(birth)) as u32)
        }
        _ => None,
    };

    Facts {
        label,
        description,
        wikipedia_url,
        image_url,
        birth_year,
        death_year,
        age,
    }
}

/// English if present, else the first available language, else the fallback.
fn pick_language(values: &BTreeMap<String, LanguageValue>, fallback: &str) -> String {
    if let Some(en) = values.get("en") {
        return en.value.clone();
    }
    values
        .values()
        .next()
        .map(|v| v.value.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Year of the first statement for `property` whose temporal value carries
/// year-or-finer precision. Coarser statements (decade, century, millennium)
/// are rejected, not approximated.
fn year_from_claims(entity: &RawEntity, property: &str) -> Option<i32> {
    entity
        .claims
        .get(property)
        .into_iter()
        .flatten()
        .filter_map(|claim| claim.time_value())
        .find(|(_, precision)| *precision >= PRECISION_YEAR)
        .and_then(|(time, _)| parse_era_year(time))
}

/// Parse the year out of a signed-era date string `[+-]YYYY...-MM-DD...`.
/// Year zero and negative years denote the era before the present one.
fn parse_era_year(time: &str) -> Option<i32> {
    let mut chars = time.chars();
    let sign = match chars.next()? {
        '+' => 1i64,
        '-' => -1i64,
        _ => return None,
    };

    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let year = sign * digits.parse::<i64>().ok()?;
    i32::try_from(year).ok()
}
