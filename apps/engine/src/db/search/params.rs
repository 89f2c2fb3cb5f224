//! Search criteria parsing
//!
//! Criteria keep request order. Repeating a parameter name is AND across
//! occurrences; comma-separated values inside one occurrence are OR.

use std::fmt;

use crate::config::SearchConfig;
use crate::{Error, Result};

/// Recognized search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Content,
    Classification,
    ClassificationText,
    ClassificationBelow,
    Title,
    TitleContains,
    CurrentState,
    Publisher,
    ArtifactType,
    LastUpdated,
    LastUpdatedMissing,
    ArticleDate,
    ArticleDateMissing,
    Count,
    Page,
}

impl ParamKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "_content" | "content" => Self::Content,
            "classification" => Self::Classification,
            "classification:text" => Self::ClassificationText,
            "classification:below" => Self::ClassificationBelow,
            "title" => Self::Title,
            "title:contains" => Self::TitleContains,
            "artifact-current-state" => Self::CurrentState,
            "artifact-publisher" => Self::Publisher,
            "artifact-type" => Self::ArtifactType,
            "_lastUpdated" => Self::LastUpdated,
            "_lastUpdated:missing" => Self::LastUpdatedMissing,
            "article-date" => Self::ArticleDate,
            "article-date:missing" => Self::ArticleDateMissing,
            "_count" | "count" => Self::Count,
            "page" => Self::Page,
            _ => return None,
        })
    }

    /// Canonical name, as written to the search log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Classification => "classification",
            Self::ClassificationText => "classification:text",
            Self::ClassificationBelow => "classification:below",
            Self::Title => "title",
            Self::TitleContains => "title:contains",
            Self::CurrentState => "artifact-current-state",
            Self::Publisher => "artifact-publisher",
            Self::ArtifactType => "artifact-type",
            Self::LastUpdated => "_lastUpdated",
            Self::LastUpdatedMissing => "_lastUpdated:missing",
            Self::ArticleDate => "article-date",
            Self::ArticleDateMissing => "article-date:missing",
            Self::Count => "_count",
            Self::Page => "page",
        }
    }

    /// Parameters recorded in the search log.
    pub fn is_logged(&self) -> bool {
        matches!(
            self,
            Self::Content
                | Self::Classification
                | Self::ClassificationText
                | Self::Title
                | Self::TitleContains
        )
    }

    /// Paging directives, handled outside the filter.
    pub fn is_paging(&self) -> bool {
        matches!(self, Self::Count | Self::Page)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recognized parameter occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParam {
    pub kind: ParamKind,
    /// Name as sent by the client.
    pub raw_name: String,
    /// Raw value, still comma-joined and escaped.
    pub value: String,
}

/// Ordered multimap of request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    items: Vec<(String, String)>,
}

impl SearchCriteria {
    pub fn from_items(items: Vec<(String, String)>) -> Self {
        Self { items }
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn from_query_string(query: &str) -> Self {
        let items = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[(String, String)] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All values given for `name`, in request order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.items
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Recognized filter parameters (paging excluded), in request order.
    pub fn params(&self) -> Vec<SearchParam> {
        self.items
            .iter()
            .filter_map(|(name, value)| {
                let kind = ParamKind::from_name(name)?;
                (!kind.is_paging()).then(|| SearchParam {
                    kind,
                    raw_name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// Names that are not recognized search parameters.
    pub fn unknown_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .items
            .iter()
            .filter(|(name, _)| ParamKind::from_name(name).is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        names.dedup();
        names
    }

    pub fn has(&self, kind: ParamKind) -> bool {
        self.items
            .iter()
            .any(|(name, _)| ParamKind::from_name(name) == Some(kind))
    }

    fn last_value(&self, kind: ParamKind) -> Option<(&str, &str)> {
        self.items
            .iter()
            .rev()
            .find(|(name, _)| ParamKind::from_name(name) == Some(kind))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Resolve page size and page number.
    pub fn paging(&self, config: &SearchConfig) -> Result<Paging> {
        let size = match self.last_value(ParamKind::Count) {
            Some((name, raw)) => parse_integer(name, raw)?,
            None => config.default_count,
        };

        if size < 0 {
            return Ok(Paging::All);
        }
        if size == 0 {
            return Ok(Paging::CountOnly);
        }

        let page = match self.last_value(ParamKind::Page) {
            Some((name, raw)) => parse_integer(name, raw)?.max(1),
            None => 1,
        };

        Ok(Paging::Page {
            page,
            size: size.min(config.max_count),
        })
    }
}

fn parse_integer(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::invalid_parameter(name, raw, "expected an integer"))
}

/// Paging convention for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Every match, no navigation beyond `self`.
    All,
    /// Total only, no rows.
    CountOnly,
    /// One 1-based page of `size` rows.
    Page { page: i64, size: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn criteria(items: &[(&str, &str)]) -> SearchCriteria {
        SearchCriteria::from_items(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn search_config() -> SearchConfig {
        Config::defaults().unwrap().search
    }

    #[test]
    fn params_keep_request_order_and_skip_paging() {
        let c = criteria(&[
            ("classification", "A,B"),
            ("_count", "10"),
            ("classification", "C"),
            ("foo", "bar"),
            ("artifact-current-state", "active"),
        ]);
        let params = c.params();
        let kinds: Vec<_> = params.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParamKind::Classification,
                ParamKind::Classification,
                ParamKind::CurrentState
            ]
        );
        assert_eq!(params[0].value, "A,B");
        assert_eq!(c.unknown_names(), vec!["foo"]);
    }

    #[test]
    fn query_string_is_decoded() {
        let c = SearchCriteria::from_query_string("?_content=%22lung+cancer%22&page=2");
        assert_eq!(c.values("_content").collect::<Vec<_>>(), vec!["\"lung cancer\""]);
        assert_eq!(c.values("page").collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn paging_conventions() {
        let cfg = search_config();
        assert_eq!(criteria(&[]).paging(&cfg).unwrap(), Paging::All);
        assert_eq!(criteria(&[("_count", "-1")]).paging(&cfg).unwrap(), Paging::All);
        assert_eq!(criteria(&[("_count", "0")]).paging(&cfg).unwrap(), Paging::CountOnly);
        assert_eq!(
            criteria(&[("_count", "5"), ("page", "0")]).paging(&cfg).unwrap(),
            Paging::Page { page: 1, size: 5 }
        );
        assert_eq!(
            criteria(&[("count", "100000"), ("page", "3")]).paging(&cfg).unwrap(),
            Paging::Page {
                page: 3,
                size: cfg.max_count
            }
        );
    }

    #[test]
    fn non_numeric_paging_is_invalid() {
        let cfg = search_config();
        let err = criteria(&[("_count", "ten")]).paging(&cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "_count"));
        let err = criteria(&[("_count", "10"), ("page", "x")]).paging(&cfg).unwrap_err();
        assert_eq!(err.issue_code(), "value");
    }

    #[test]
    fn logged_kinds() {
        assert!(ParamKind::Content.is_logged());
        assert!(ParamKind::TitleContains.is_logged());
        assert!(!ParamKind::ClassificationBelow.is_logged());
        assert!(!ParamKind::CurrentState.is_logged());
        assert_eq!(ParamKind::from_name("_content"), Some(ParamKind::Content));
    }
}
