use super::domain::{Candidate, PreferenceVector};

type DimensionFilter = fn(&Candidate, &PreferenceVector) -> bool;

/// The seven preference dimensions in their fixed application order. The
/// dimensions commute; the order only controls the early exit.
pub(crate) const DIMENSIONS: [DimensionFilter; 7] = [
    by_city,
    by_category,
    by_employment_type,
    by_languages,
    by_gender,
    by_document_type,
    by_demanded,
];

/// Keep the candidates satisfying every constrained dimension of the
/// preference vector. Unconstrained dimensions are skipped, so an empty
/// vector returns the input unchanged.
pub fn matching_candidates(candidates: &[Candidate], prefs: &PreferenceVector) -> Vec<Candidate> {
    let mut survivors: Vec<Candidate> = candidates.to_vec();
    for dimension in DIMENSIONS {
        if survivors.is_empty() {
            break;
        }
        survivors.retain(|candidate| dimension(candidate, prefs));
    }
    survivors
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn by_city(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    if prefs.cities.is_empty() {
        return true;
    }
    candidate.city.as_deref().map_or(false, |city| {
        prefs
            .cities
            .iter()
            .any(|preferred| contains_ci(city, preferred))
    })
}

fn by_category(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    if prefs.categories.is_empty() {
        return true;
    }
    candidate.category.as_deref().map_or(false, |category| {
        prefs
            .categories
            .iter()
            .any(|preferred| contains_ci(category, preferred))
    })
}

fn by_employment_type(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    if prefs.employment_types.is_empty() {
        return true;
    }
    candidate.employment_type.as_deref().map_or(false, |kind| {
        prefs
            .employment_types
            .iter()
            .any(|preferred| contains_ci(kind, preferred))
    })
}

// Existential across both sets: the candidate speaks some language whose
// name appears inside some preferred language.
fn by_languages(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    if prefs.languages.is_empty() {
        return true;
    }
    candidate.languages.iter().any(|language| {
        prefs
            .languages
            .iter()
            .any(|preferred| contains_ci(preferred, language))
    })
}

fn by_gender(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    match prefs.gender.as_deref() {
        None => true,
        Some(preferred) => candidate
            .gender
            .as_deref()
            .map_or(false, |gender| gender.eq_ignore_ascii_case(preferred)),
    }
}

fn by_document_type(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    if prefs.document_types.is_empty() {
        return true;
    }
    candidate.document_type.as_deref().map_or(false, |document| {
        prefs
            .document_types
            .iter()
            .any(|preferred| contains_ci(document, preferred))
    })
}

fn by_demanded(candidate: &Candidate, prefs: &PreferenceVector) -> bool {
    !prefs.demanded_only || candidate.demanded
}
