//! Listing filters for organizations and news.
//!
//! Every step takes the candidate set and returns the subset satisfying one
//! predicate; a [`ListFilter`] chains the supplied steps, so combined filters
//! are the intersection of each filter applied alone.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::errors::AppError;
use crate::models::{NewsItem, Nko};

/// Upper bound on the compiled size of a user-supplied pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Fields a listing can be filtered on.
pub trait Listable {
    fn id(&self) -> i64;
    fn city_name(&self) -> Option<&str>;
    fn categories(&self) -> &[String];
    /// Name/title and description, searched by the text pattern.
    fn text_fields(&self) -> [&str; 2];
}

impl Listable for Nko {
    fn id(&self) -> i64 {
        self.id
    }

    fn city_name(&self) -> Option<&str> {
        self.city.as_deref()
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn text_fields(&self) -> [&str; 2] {
        [&self.name, &self.description]
    }
}

impl Listable for NewsItem {
    fn id(&self) -> i64 {
        self.id
    }

    fn city_name(&self) -> Option<&str> {
        self.city.as_deref()
    }

    fn categories(&self) -> &[String] {
        &[]
    }

    fn text_fields(&self) -> [&str; 2] {
        [&self.title, &self.description]
    }
}

/// A compiled, case-insensitive search pattern.
#[derive(Debug, Clone)]
pub struct TextPattern(Regex);

impl TextPattern {
    /// Compile the value of query parameter `parameter`. Blank input means no filter.
    pub fn parse(parameter: &'static str, raw: Option<&str>) -> Result<Option<Self>, AppError> {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        RegexBuilder::new(raw)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map(|re| Some(TextPattern(re)))
            .map_err(|e| AppError::InvalidFilter {
                parameter: parameter.to_string(),
                message: e.to_string(),
            })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

/// Conjunction of the optional listing filters.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub city: Option<String>,
    pub category: Option<String>,
    pub pattern: Option<TextPattern>,
    /// `Some` restricts the listing to these ids; an empty set shows nothing.
    pub favorites: Option<HashSet<i64>>,
}

impl ListFilter {
    /// Build a filter from raw query values. Empty strings are ignored.
    pub fn new(
        city: Option<&str>,
        category: Option<&str>,
        regex: Option<&str>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            city: non_blank(city),
            category: non_blank(category),
            pattern: TextPattern::parse("regex", regex)?,
            favorites: None,
        })
    }

    pub fn with_favorites(mut self, favorites: HashSet<i64>) -> Self {
        self.favorites = Some(favorites);
        self
    }

    /// Apply every supplied filter and order the result by id.
    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Vec<T> {
        let items = by_city(items, self.city.as_deref());
        let items = by_category(items, self.category.as_deref());
        let items = by_pattern(items, self.pattern.as_ref());
        let mut items = by_favorites(items, self.favorites.as_ref());
        items.sort_by_key(|item| item.id());
        items
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Exact, case-sensitive city match. Items without a city never match.
pub fn by_city<T: Listable>(items: Vec<T>, city: Option<&str>) -> Vec<T> {
    match city {
        Some(city) => items
            .into_iter()
            .filter(|item| item.city_name() == Some(city))
            .collect(),
        None => items,
    }
}

/// Keep items tagged with `category`.
pub fn by_category<T: Listable>(items: Vec<T>, category: Option<&str>) -> Vec<T> {
    match category {
        Some(category) => items
            .into_iter()
            .filter(|item| item.categories().iter().any(|c| c == category))
            .collect(),
        None => items,
    }
}

/// Keep items whose name/title or description contains a match.
pub fn by_pattern<T: Listable>(items: Vec<T>, pattern: Option<&TextPattern>) -> Vec<T> {
    match pattern {
        Some(pattern) => items
            .into_iter()
            .filter(|item| item.text_fields().iter().any(|f| pattern.is_match(f)))
            .collect(),
        None => items,
    }
}

pub fn by_favorites<T: Listable>(items: Vec<T>, favorites: Option<&HashSet<i64>>) -> Vec<T> {
    match favorites {
        Some(ids) => items
            .into_iter()
            .filter(|item| ids.contains(&item.id()))
            .collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nko(id: i64, name: &str, city: Option<&str>, categories: &[&str]) -> Nko {
        Nko {
            id,
            name: name.to_string(),
            description: format!("{} helps people", name),
            logo: None,
            logo_url: "/static/default.png".to_string(),
            address: None,
            city: city.map(str::to_string),
            latitude: None,
            longitude: None,
            meta: None,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn sample() -> Vec<Nko> {
        vec![
            nko(3, "Food Bank", Some("Moscow"), &["Food"]),
            nko(1, "Test Fund", Some("Moscow"), &["Education", "Children"]),
            nko(2, "River Care", Some("Kazan"), &["Ecology"]),
            nko(4, "Reading Club", Some("Kazan"), &["Education"]),
            nko(5, "Nomad", None, &[]),
        ]
    }

    fn ids<T: Listable>(items: &[T]) -> Vec<i64> {
        items.iter().map(|i| i.id()).collect()
    }

    #[test]
    fn test_no_filters_returns_everything_ordered() {
        let filter = ListFilter::new(None, None, None).unwrap();
        assert_eq!(ids(&filter.apply(sample())), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_city_is_empty() {
        for city in ["Petersburg", "moscow", "Mosc", ""] {
            let filter = ListFilter::new(Some(city), None, None).unwrap();
            let result = filter.apply(sample());
            if city.is_empty() {
                assert_eq!(result.len(), 5);
            } else {
                assert!(result.is_empty(), "city {:?} matched", city);
            }
        }
    }

    #[test]
    fn test_category_matches_any_tag() {
        let filter = ListFilter::new(None, Some("Education"), None).unwrap();
        assert_eq!(ids(&filter.apply(sample())), vec![1, 4]);
    }

    #[test]
    fn test_pattern_searches_name_and_description() {
        let filter = ListFilter::new(None, None, Some("^river")).unwrap();
        assert_eq!(ids(&filter.apply(sample())), vec![2]);

        let filter = ListFilter::new(None, None, Some("HELPS")).unwrap();
        assert_eq!(filter.apply(sample()).len(), 5);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = ListFilter::new(None, None, Some("(unclosed")).unwrap_err();
        match err {
            AppError::InvalidFilter { parameter, .. } => assert_eq!(parameter, "regex"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_favorites_show_nothing() {
        let filter = ListFilter::default().with_favorites(HashSet::new());
        assert!(filter.apply(sample()).is_empty());

        let filter = ListFilter::default().with_favorites(HashSet::from([2, 4, 99]));
        assert_eq!(ids(&filter.apply(sample())), vec![2, 4]);
    }

    #[test]
    fn test_combined_filters_are_intersection() {
        let cities = [None, Some("Moscow"), Some("Kazan")];
        let categories = [None, Some("Education"), Some("Food")];
        let patterns = [None, Some("fund|club"), Some("e")];
        let favorite_sets = [None, Some(HashSet::from([1, 4]))];

        for city in cities {
            for category in categories {
                for pattern in patterns {
                    for favorites in &favorite_sets {
                        let mut combined = ListFilter::new(city, category, pattern).unwrap();
                        combined.favorites = favorites.clone();
                        let got: HashSet<i64> =
                            ids(&combined.apply(sample())).into_iter().collect();

                        let mut singles = vec![
                            ListFilter::new(city, None, None).unwrap(),
                            ListFilter::new(None, category, None).unwrap(),
                            ListFilter::new(None, None, pattern).unwrap(),
                        ];
                        if let Some(set) = favorites {
                            singles.push(ListFilter::default().with_favorites(set.clone()));
                        }
                        let expected = singles
                            .iter()
                            .map(|f| ids(&f.apply(sample())).into_iter().collect::<HashSet<_>>())
                            .reduce(|a, b| a.intersection(&b).copied().collect())
                            .unwrap_or_default();

                        assert_eq!(got, expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_news_has_no_categories() {
        let news = NewsItem {
            id: 1,
            title: "Volunteer day".to_string(),
            description: "Join us".to_string(),
            image: None,
            city_id: Some(1),
            city: Some("Moscow".to_string()),
            created_by: None,
            approved_by: None,
            meta: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let filter = ListFilter::new(Some("Moscow"), None, Some("volunteer")).unwrap();
        assert_eq!(filter.apply(vec![news.clone()]).len(), 1);

        let filter = ListFilter::new(None, Some("Education"), None).unwrap();
        assert!(filter.apply(vec![news]).is_empty());
    }
}
