//! Case-insensitive substring filtering over entity lists

/// Implemented by entities that can be matched against a free-text filter.
pub trait Searchable {
    /// Fields to consider when matching a query.
    fn search_fields(&self) -> Vec<&str>;
}

/// Filter a slice of entities by case-insensitive substring match.
///
/// An empty or whitespace-only query matches everything. The match is a
/// plain substring test over each of the entity's searchable fields.
pub fn filter_entities<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        name: String,
        code: String,
    }

    impl Searchable for Named {
        fn search_fields(&self) -> Vec<&str> {
            vec![&self.name, &self.code]
        }
    }

    fn sample() -> Vec<Named> {
        vec![
            Named {
                name: "Reports".into(),
                code: "RPT".into(),
            },
            Named {
                name: "Billing".into(),
                code: "BIL".into(),
            },
            Named {
                name: "Advanced Reports".into(),
                code: "ARPT".into(),
            },
        ]
    }

    #[test]
    fn test_empty_query_matches_all() {
        let items = sample();
        assert_eq!(filter_entities(&items, "").len(), 3);
        assert_eq!(filter_entities(&items, "   ").len(), 3);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let items = sample();
        let hits = filter_entities(&items, "report");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Reports");
        assert_eq!(hits[1].name, "Advanced Reports");
    }

    #[test]
    fn test_matches_any_field() {
        let items = sample();
        let hits = filter_entities(&items, "bil");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Billing");
    }

    #[test]
    fn test_no_match_returns_empty() {
        let items = sample();
        assert!(filter_entities(&items, "zzz").is_empty());
    }
}
