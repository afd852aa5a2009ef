//! Wire query construction for remote filtering.
//!
//! Queries are rendered as raw strings in the bracketed filter syntax the
//! remote content API expects. Values are percent-encoded; field names and
//! locale codes come from trusted schema configuration and pass through.

/// Build the identity filter matching entities by main field value.
///
/// Every value becomes one indexed `$in` clause. The page limit is lifted
/// high enough to return the whole match set, and drafts are included so
/// unpublished remote entities still count as existing.
pub fn main_field_filter(values: &[String], main_field: &str) -> String {
    let mut query = String::new();
    for (index, value) in values.iter().enumerate() {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!(
            "filters[{main_field}][$in][{index}]={}",
            urlencoding::encode(value)
        ));
    }
    query.push_str("&pagination[limit]=10000&publicationState=preview");
    query
}

/// Identity filter extended with localization stubs and optional extra clauses.
pub fn filtered_entities_query(values: &[String], main_field: &str, extra: Option<&str>) -> String {
    let base = format!(
        "{}&populate[localizations]=true",
        main_field_filter(values, main_field)
    );
    match extra {
        Some(extra) => format!("{base}&{extra}"),
        None => base,
    }
}

/// Single-entity lookup filter for a parent in a given locale.
pub fn parent_lookup_query(main_field: &str, value: &str, locale: &str) -> String {
    format!(
        "filters[{main_field}][$eq]={}&locale={locale}&publicationState=preview",
        urlencoding::encode(value)
    )
}
