//! PostgreSQL rendering for filters and ordering
//!
//! Values never reach SQL text: each one is pushed onto the bind list and
//! referenced as `$n`. Identifiers come only from the closed column enums.

use chrono::{DateTime, Utc};

use super::predicate::{CitationQuery, FilterPredicate};
use super::rank::{RankKey, SortKey};
use crate::models::CurrentState;

/// Alias of the citation table in generated SQL.
pub const CITATION_ALIAS: &str = "c";

#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    BigIntArray(Vec<i64>),
    IntArray(Vec<i32>),
    Timestamp(DateTime<Utc>),
}

pub(crate) fn push_bind(bind_params: &mut Vec<BindValue>, value: BindValue) -> usize {
    bind_params.push(value);
    bind_params.len()
}

pub(crate) fn push_text(bind_params: &mut Vec<BindValue>, value: String) -> usize {
    push_bind(bind_params, BindValue::Text(value))
}

/// Escape SQL LIKE meta-characters so user input is treated literally.
pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render a predicate as a boolean SQL expression.
pub fn build_filter_sql(predicate: &FilterPredicate, bind_params: &mut Vec<BindValue>) -> String {
    let a = CITATION_ALIAS;
    match predicate {
        FilterPredicate::All => "TRUE".to_string(),
        FilterPredicate::And(parts) => join_parts(parts, " AND ", "TRUE", bind_params),
        FilterPredicate::Or(parts) => join_parts(parts, " OR ", "FALSE", bind_params),
        FilterPredicate::DateCompare { column, op, value } => {
            let idx = push_bind(bind_params, BindValue::Timestamp(*value));
            format!("{a}.{} {} ${}", column.sql_name(), op.sql(), idx)
        }
        FilterPredicate::IsNull { column, missing } => {
            if *missing {
                format!("{a}.{} IS NULL", column.sql_name())
            } else {
                format!("{a}.{} IS NOT NULL", column.sql_name())
            }
        }
        FilterPredicate::TextMatch { field, query } => {
            let idx = push_text(bind_params, query.clone());
            format!("{a}.{} @@ to_tsquery('english', ${})", field.sql_name(), idx)
        }
        FilterPredicate::Prefix { column, value } => {
            let idx = push_text(bind_params, format!("{}%", escape_like_pattern(value)));
            format!("{a}.{} ILIKE ${} ESCAPE E'\\\\'", column.sql_name(), idx)
        }
        FilterPredicate::Contains { column, value } => {
            let idx = push_text(bind_params, format!("%{}%", escape_like_pattern(value)));
            format!("{a}.{} ILIKE ${} ESCAPE E'\\\\'", column.sql_name(), idx)
        }
        FilterPredicate::InSet {
            column,
            values,
            case_insensitive,
        } => {
            if *case_insensitive {
                let lowered = values.iter().map(|v| v.to_lowercase()).collect();
                let idx = push_bind(bind_params, BindValue::TextArray(lowered));
                format!("lower({a}.{}) = ANY(${}::text[])", column.sql_name(), idx)
            } else {
                let idx = push_bind(bind_params, BindValue::TextArray(values.clone()));
                format!("{a}.{} = ANY(${}::text[])", column.sql_name(), idx)
            }
        }
        FilterPredicate::IdIn(ids) => {
            let idx = push_bind(bind_params, BindValue::BigIntArray(ids.clone()));
            format!("{a}.id = ANY(${}::bigint[])", idx)
        }
    }
}

fn join_parts(
    parts: &[FilterPredicate],
    separator: &str,
    empty: &str,
    bind_params: &mut Vec<BindValue>,
) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts
        .iter()
        .map(|p| build_filter_sql(p, bind_params))
        .collect();
    format!("({})", rendered.join(separator))
}

/// Render the `ORDER BY` list (without the keyword).
pub fn build_order_sql(rank: &RankKey, bind_params: &mut Vec<BindValue>) -> String {
    let a = CITATION_ALIAS;
    let mut parts = Vec::new();
    for directive in rank.directives() {
        let dir = directive.direction.sql();
        let expr = match &directive.key {
            SortKey::TextRelevance { field, query } => {
                let idx = push_text(bind_params, query.clone());
                format!(
                    "ts_rank({a}.{}, to_tsquery('english', ${}))",
                    field.sql_name(),
                    idx
                )
            }
            SortKey::MatchFrequency(counts) => {
                let ids: Vec<i64> = counts.iter().map(|(id, _)| *id).collect();
                let freq: Vec<i32> = counts
                    .iter()
                    .map(|(_, n)| i32::try_from(*n).unwrap_or(i32::MAX))
                    .collect();
                let ids_idx = push_bind(bind_params, BindValue::BigIntArray(ids));
                let freq_idx = push_bind(bind_params, BindValue::IntArray(freq));
                format!(
                    "COALESCE((SELECT f.n FROM unnest(${}::bigint[], ${}::int[]) AS f(id, n) WHERE f.id = {a}.id), 0)",
                    ids_idx, freq_idx
                )
            }
            SortKey::CurrentStatePriority => state_priority_sql(),
            SortKey::PublishedDate => format!("{a}.published_date"),
            SortKey::RecommendationStrength => format!("{a}.recommendation_strength"),
            SortKey::EvidenceQuality => format!("{a}.evidence_quality"),
            SortKey::Id => format!("{a}.id"),
        };
        parts.push(format!("{} {} NULLS LAST", expr, dir));
    }
    parts.join(", ")
}

fn state_priority_sql() -> String {
    let mut sql = format!("CASE lower({CITATION_ALIAS}.current_state)");
    for state in CurrentState::ALL {
        sql.push_str(&format!(" WHEN '{}' THEN {}", state.code(), state.priority()));
    }
    sql.push_str(&format!(" ELSE {} END", CurrentState::UNRECOGNIZED_PRIORITY));
    sql
}

/// `SELECT` for one page (or all rows when `limit` is `None`).
pub fn build_select_sql(
    query: &CitationQuery,
    limit: Option<(i64, i64)>,
) -> (String, Vec<BindValue>) {
    let a = CITATION_ALIAS;
    let mut bind_params = Vec::new();

    let score = match query.rank.relevance() {
        Some((field, text)) => {
            let idx = push_text(&mut bind_params, text.to_string());
            format!(
                "ts_rank({a}.{}, to_tsquery('english', ${}))::float8",
                field.sql_name(),
                idx
            )
        }
        None => "NULL::float8".to_string(),
    };

    let where_sql = build_filter_sql(&query.filter, &mut bind_params);
    let order_sql = build_order_sql(&query.rank, &mut bind_params);

    let mut sql = format!(
        "SELECT {a}.id, {a}.repository, {a}.resource, {score} AS score FROM citations {a} WHERE {where_sql}"
    );
    if !order_sql.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_sql);
    }
    if let Some((limit, offset)) = limit {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit.max(0), offset.max(0)));
    }
    (sql, bind_params)
}

pub fn build_count_sql(query: &CitationQuery) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let where_sql = build_filter_sql(&query.filter, &mut bind_params);
    (
        format!("SELECT COUNT(*) FROM citations {CITATION_ALIAS} WHERE {where_sql}"),
        bind_params,
    )
}

/// Matches per repository; citations without one are not counted.
pub fn build_repository_count_sql(query: &CitationQuery) -> (String, Vec<BindValue>) {
    let a = CITATION_ALIAS;
    let mut bind_params = Vec::new();
    let where_sql = build_filter_sql(&query.filter, &mut bind_params);
    (
        format!(
            "SELECT {a}.repository, COUNT(*) FROM citations {a} WHERE {where_sql} AND {a}.repository IS NOT NULL GROUP BY {a}.repository"
        ),
        bind_params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::search::predicate::{Column, CompareOp, DateColumn, TextField};
    use chrono::TimeZone;

    #[test]
    fn renders_nested_predicates_with_binds() {
        let predicate = FilterPredicate::And(vec![
            FilterPredicate::InSet {
                column: Column::CurrentState,
                values: vec!["active".into(), "draft".into()],
                case_insensitive: false,
            },
            FilterPredicate::Or(vec![
                FilterPredicate::Prefix {
                    column: Column::Title,
                    value: "100%_lung".into(),
                },
                FilterPredicate::DateCompare {
                    column: DateColumn::ArticleDate,
                    op: CompareOp::Ge,
                    value: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
                },
            ]),
        ]);
        let mut binds = Vec::new();
        let sql = build_filter_sql(&predicate, &mut binds);
        assert_eq!(
            sql,
            "(c.current_state = ANY($1::text[]) AND (c.title ILIKE $2 ESCAPE E'\\\\' OR c.article_date >= $3))"
        );
        assert_eq!(binds[1], BindValue::Text("100\\%\\_lung%".into()));
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn empty_disjunction_matches_nothing() {
        let mut binds = Vec::new();
        assert_eq!(build_filter_sql(&FilterPredicate::Or(vec![]), &mut binds), "FALSE");
        assert_eq!(
            build_filter_sql(&FilterPredicate::IdIn(vec![]), &mut binds),
            "c.id = ANY($1::bigint[])"
        );
    }

    #[test]
    fn select_orders_by_relevance_then_defaults() {
        let mut rank = RankKey::new();
        rank.push_relevance(TextField::Content, "lung&cancer");
        let query = CitationQuery::new(
            FilterPredicate::TextMatch {
                field: TextField::Content,
                query: "lung&cancer".into(),
            },
            rank.with_default_ordering(),
        );
        let (sql, binds) = build_select_sql(&query, Some((10, 20)));
        assert!(sql.contains("AS score FROM citations c WHERE c.content_tsv @@ to_tsquery('english', $2)"));
        assert!(sql.contains("ORDER BY ts_rank(c.content_tsv, to_tsquery('english', $3)) DESC NULLS LAST, CASE lower(c.current_state) WHEN 'active' THEN 0"));
        assert!(sql.contains("ELSE 5 END ASC NULLS LAST, c.published_date DESC NULLS LAST"));
        assert!(sql.ends_with("c.id ASC NULLS LAST LIMIT 10 OFFSET 20"));
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn count_has_no_ordering() {
        let query = CitationQuery::new(FilterPredicate::All, RankKey::new().with_default_ordering());
        let (sql, binds) = build_count_sql(&query);
        assert_eq!(sql, "SELECT COUNT(*) FROM citations c WHERE TRUE");
        assert!(binds.is_empty());
    }
}
