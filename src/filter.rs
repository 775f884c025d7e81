use crate::models::{Lead, LeadFilters, Property, PropertyFilters};

// Filtering runs client-side over the full fetched set on every criteria
// change; record counts are dozens to low hundreds, so no indexing.

pub fn filter_properties<'a>(
    properties: &'a [Property],
    filters: &PropertyFilters,
) -> Vec<&'a Property> {
    properties
        .iter()
        .filter(|property| property_matches(property, filters))
        .collect()
}

pub fn filter_leads<'a>(leads: &'a [Lead], filters: &LeadFilters) -> Vec<&'a Lead> {
    leads.iter().filter(|lead| lead_matches(lead, filters)).collect()
}

pub fn property_matches(property: &Property, filters: &PropertyFilters) -> bool {
    let matches_query = match normalized_query(&filters.query) {
        None => true,
        Some(query) => {
            contains_ci(&property.location, &query)
                || contains_ci(property.property_type.as_str(), &query)
                || property
                    .description
                    .as_deref()
                    .is_some_and(|description| contains_ci(description, &query))
        }
    };

    let matches_type = filters
        .property_type
        .is_none_or(|wanted| property.property_type == wanted);

    let matches_price = filters
        .price_range
        .is_none_or(|(min, max)| property.price >= min && property.price <= max);

    matches_query && matches_type && matches_price
}

pub fn lead_matches(lead: &Lead, filters: &LeadFilters) -> bool {
    let Some(query) = normalized_query(&filters.query) else {
        return true;
    };

    contains_ci(&lead.name, &query)
        || contains_ci(&lead.phone, &query)
        || lead
            .location
            .as_deref()
            .is_some_and(|location| contains_ci(location, &query))
        || lead
            .property_type
            .as_deref()
            .is_some_and(|property_type| contains_ci(property_type, &query))
}

fn normalized_query(query: &Option<String>) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}
