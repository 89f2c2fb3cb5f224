//! Citation filter builder
//!
//! Turns [`SearchCriteria`] into a [`CitationQuery`] plus the parameter entries
//! recorded in the search log. Every recognized parameter kind has its own
//! handler; unknown names are skipped.

use std::time::Duration;

use citeline_query::{compile_parsed, parse, ConceptIndex, StopWords, SynonymResolver};

use super::classification::{ClassificationMatcher, Occurrence};
use super::dates::to_predicate;
use super::escape::{split_or_escaped, split_or_values, unescape_search_value};
use super::params::{ParamKind, SearchCriteria, SearchParam};
use super::predicate::{CitationQuery, Column, DateColumn, FilterPredicate, TextField};
use super::rank::RankKey;
use crate::config::SearchConfig;
use crate::db::traits::{CitationStore, ConceptStore, MeshTreeStore};
use crate::db::with_timeout;
use crate::models::LoggedParameter;
use crate::{Error, Result};

/// Output of [`FilterBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltFilter {
    pub query: CitationQuery,
    /// Named parameters for the search log.
    pub log_entries: Vec<LoggedParameter>,
    /// Parameter names that were not recognized.
    pub ignored: Vec<String>,
}

pub struct FilterBuilder<'a> {
    citations: &'a dyn CitationStore,
    concepts: &'a dyn ConceptStore,
    mesh: &'a dyn MeshTreeStore,
    stop_words: &'a StopWords,
    config: &'a SearchConfig,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(
        citations: &'a dyn CitationStore,
        concepts: &'a dyn ConceptStore,
        mesh: &'a dyn MeshTreeStore,
        stop_words: &'a StopWords,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            citations,
            concepts,
            mesh,
            stop_words,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        self.config.store_timeout()
    }

    pub async fn build(&self, criteria: &SearchCriteria) -> Result<BuiltFilter> {
        if !criteria.has(ParamKind::CurrentState) {
            return Err(Error::MissingParameter(ParamKind::CurrentState.name().to_string()));
        }

        let ignored: Vec<String> = criteria.unknown_names().into_iter().map(String::from).collect();
        if !ignored.is_empty() {
            tracing::debug!(?ignored, "Ignoring unknown search parameters");
        }

        let mut predicates = Vec::new();
        let mut rank = RankKey::new();
        let mut log_entries = Vec::new();
        let mut occurrences = Vec::new();

        for param in criteria.params() {
            if param.kind.is_logged() {
                log_entries.push(LoggedParameter::new(param.kind.name(), param.value.clone()));
            }
            match param.kind {
                ParamKind::Classification | ParamKind::ClassificationBelow => {
                    let terms = split_or_escaped(&param.value);
                    if !terms.is_empty() {
                        occurrences.push(Occurrence {
                            terms,
                            below: param.kind == ParamKind::ClassificationBelow,
                        });
                    }
                }
                _ => {
                    if let Some(predicate) = self.build_param(&param, &mut rank).await? {
                        predicates.push(predicate);
                    }
                }
            }
        }

        if !occurrences.is_empty() {
            let matcher = ClassificationMatcher::new(self.citations, self.concepts, self.mesh, self.config);
            let matched = matcher.match_occurrences(&occurrences).await?;
            tracing::debug!(matches = matched.ids.len(), "Classification filter resolved");
            predicates.push(FilterPredicate::IdIn(matched.sorted_ids()));
            rank.push_frequency(&matched.frequency);
        }

        Ok(BuiltFilter {
            query: CitationQuery::new(FilterPredicate::all_of(predicates), rank.with_default_ordering()),
            log_entries,
            ignored,
        })
    }

    /// Predicate for one parameter occurrence; `None` when it filters nothing.
    async fn build_param(&self, param: &SearchParam, rank: &mut RankKey) -> Result<Option<FilterPredicate>> {
        let value = param.value.as_str();
        let predicate = match param.kind {
            ParamKind::Content => self.full_text(value, TextField::Content, rank).await?,
            ParamKind::ClassificationText => self.full_text(value, TextField::Keywords, rank).await?,
            ParamKind::Title => any_value(value, |v| FilterPredicate::Prefix {
                column: Column::Title,
                value: v,
            }),
            ParamKind::TitleContains => any_value(value, |v| FilterPredicate::Contains {
                column: Column::Title,
                value: v,
            }),
            ParamKind::CurrentState => membership(value, Column::CurrentState, false),
            ParamKind::ArtifactType => membership(value, Column::ArtifactType, true),
            ParamKind::Publisher => {
                let publisher = unescape_search_value(value).unwrap_or_else(|| value.to_string());
                let publisher = publisher.trim();
                (!publisher.is_empty()).then(|| FilterPredicate::InSet {
                    column: Column::Publisher,
                    values: vec![publisher.to_string()],
                    case_insensitive: true,
                })
            }
            ParamKind::LastUpdated => date_filter(param, DateColumn::LastUpdated)?,
            ParamKind::ArticleDate => date_filter(param, DateColumn::ArticleDate)?,
            ParamKind::LastUpdatedMissing => Some(missing_filter(param, DateColumn::LastUpdated)?),
            ParamKind::ArticleDateMissing => Some(missing_filter(param, DateColumn::ArticleDate)?),
            ParamKind::Classification
            | ParamKind::ClassificationBelow
            | ParamKind::Count
            | ParamKind::Page => None,
        };
        Ok(predicate)
    }

    /// Parse, expand against the concept store and compile a free-text value.
    async fn full_text(
        &self,
        expression: &str,
        field: TextField,
        rank: &mut RankKey,
    ) -> Result<Option<FilterPredicate>> {
        let parsed = parse(expression);
        if parsed.is_empty() {
            return Ok(None);
        }

        let keys = SynonymResolver::new(self.stop_words).lookup_keys(&parsed);
        let concepts = if keys.is_empty() {
            Vec::new()
        } else {
            with_timeout(self.timeout(), "concepts.matching", self.concepts.matching(&keys)).await?
        };
        let index = ConceptIndex::new(concepts);

        let query = compile_parsed(&parsed, self.stop_words, &index);
        tracing::debug!(expression, query = %query, concepts = index.len(), "Compiled full-text query");
        if query.is_empty() {
            return Ok(None);
        }

        rank.push_relevance(field, query.clone());
        Ok(Some(FilterPredicate::TextMatch { field, query }))
    }
}

fn any_value(value: &str, to_predicate: impl Fn(String) -> FilterPredicate) -> Option<FilterPredicate> {
    let values = split_or_values(value);
    if values.is_empty() {
        return None;
    }
    Some(FilterPredicate::any_of(values.into_iter().map(to_predicate).collect()))
}

fn membership(value: &str, column: Column, case_insensitive: bool) -> Option<FilterPredicate> {
    let values = split_or_values(value);
    (!values.is_empty()).then_some(FilterPredicate::InSet {
        column,
        values,
        case_insensitive,
    })
}

fn date_filter(param: &SearchParam, column: DateColumn) -> Result<Option<FilterPredicate>> {
    let values = split_or_values(&param.value);
    if values.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(values.len());
    for value in &values {
        let predicate = to_predicate(value, column)
            .map_err(|e| Error::invalid_parameter(&param.raw_name, &param.value, e.to_string()))?;
        parts.push(predicate);
    }
    Ok(Some(FilterPredicate::any_of(parts)))
}

fn missing_filter(param: &SearchParam, column: DateColumn) -> Result<FilterPredicate> {
    let missing = match param.value.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => {
            return Err(Error::invalid_parameter(
                &param.raw_name,
                &param.value,
                "expected true or false",
            ))
        }
    };
    Ok(FilterPredicate::IsNull { column, missing })
}
