//! Search building: parameters, filters, ordering and SQL rendering

pub mod classification;
pub mod dates;
pub(crate) mod escape;
pub mod filter;
pub mod params;
pub mod predicate;
pub mod rank;
pub mod sql;

pub use classification::{combine_occurrences, ClassificationMatch, ClassificationMatcher, CodeQuery, Occurrence};
pub use dates::{parse_comparator_search, parse_range, to_predicate, Comparator, ComparatorSearch, DateRange, InvalidDate};
pub use filter::{BuiltFilter, FilterBuilder};
pub use params::{ParamKind, Paging, SearchCriteria, SearchParam};
pub use predicate::{CitationQuery, Column, CompareOp, DateColumn, FilterPredicate, TextField};
pub use rank::{RankKey, SortDirection, SortDirective, SortKey};
pub use sql::BindValue;
