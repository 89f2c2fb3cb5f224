//! End-to-end tests: parse, expand and compile to `tsquery` syntax

use citeline_query::{to_postgres_query, Concept, ConceptIndex, StopWords};

fn concept(id: &str, synonyms: &[&str]) -> Concept {
    Concept {
        id: id.to_string(),
        description: synonyms[0].to_string(),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        codes: Vec::new(),
    }
}

fn compile_plain(expr: &str) -> String {
    to_postgres_query(expr, &StopWords::english(), &ConceptIndex::empty())
}

#[test]
fn test_operators_are_substituted() {
    assert_eq!(compile_plain("aa AND bb OR NOT cc"), "aa&bb|!cc");
}

#[test]
fn test_not_after_operand_conjoins() {
    assert_eq!(compile_plain("aa NOT bb"), "aa&!bb");
    assert_eq!(compile_plain("aa OR bb NOT cc"), "aa|bb&!cc");
}

#[test]
fn test_phrase_and_group() {
    assert_eq!(
        compile_plain("\"lung cancer\" AND (screening OR NOT procedure)"),
        "lung<->cancer & (screening | ! procedure)"
    );
}

#[test]
fn test_term_synonyms() {
    let index = ConceptIndex::new(vec![concept("C1", &["foo", "bar", "baz"])]);
    assert_eq!(
        to_postgres_query("aa foo cc", &StopWords::english(), &index),
        "aa&('foo'|'bar'|'baz')&cc"
    );
}

#[test]
fn test_synonym_lookup_is_case_insensitive() {
    let index = ConceptIndex::new(vec![concept("C1", &["Foo", "Bar"])]);
    assert_eq!(
        to_postgres_query("FOO", &StopWords::english(), &index),
        "('foo'|'bar')"
    );
}

#[test]
fn test_hyphen_without_concept() {
    assert_eq!(compile_plain("aa-cc"), "(aa-cc|aacc|aa<->cc)");
}

#[test]
fn test_empty_phrases() {
    assert_eq!(compile_plain("\"\""), "");
    assert_eq!(compile_plain("\"\" aa"), "aa");
    assert_eq!(compile_plain("aa \"\""), "aa");
}

#[test]
fn test_stop_words_are_not_expanded() {
    let index = ConceptIndex::new(vec![concept("C1", &["the", "le"])]);
    assert_eq!(to_postgres_query("the", &StopWords::english(), &index), "the");
    assert_eq!(to_postgres_query("the", &StopWords::none(), &index), "('the'|'le')");
}

#[test]
fn test_phrase_synonyms() {
    let index = ConceptIndex::new(vec![concept("C1", &["heart attack", "myocardial infarction"])]);
    assert_eq!(
        to_postgres_query("\"heart attack\"", &StopWords::english(), &index),
        "('heart'<->'attack' | 'myocardial'<->'infarction')"
    );
}

#[test]
fn test_whole_phrase_expansion() {
    let index = ConceptIndex::new(vec![concept("C1", &["heart attack", "myocardial infarction"])]);
    assert_eq!(
        to_postgres_query("heart attack", &StopWords::english(), &index),
        "(heart&attack)|('heart'<->'attack'|'myocardial'<->'infarction')"
    );
}

#[test]
fn test_whole_phrase_needs_more_than_one_synonym() {
    let index = ConceptIndex::new(vec![concept("C1", &["heart attack"])]);
    assert_eq!(
        to_postgres_query("heart attack", &StopWords::english(), &index),
        "heart&attack"
    );
}

#[test]
fn test_whole_phrase_threshold_with_hyphen() {
    let two = ConceptIndex::new(vec![concept("C1", &["non-small cell", "nsclc"])]);
    assert_eq!(
        to_postgres_query("non-small cell", &StopWords::english(), &two),
        "(non-small|nonsmall|non<->small)&cell"
    );

    let three = ConceptIndex::new(vec![concept(
        "C1",
        &["non-small cell", "nsclc", "non small cell lung"],
    )]);
    assert_eq!(
        to_postgres_query("non-small cell", &StopWords::english(), &three),
        "((non-small|nonsmall|non<->small)&cell)|('non-small'<->'cell'|'nsclc'|'non'<->'small'<->'cell'<->'lung')"
    );
}

#[test]
fn test_whole_phrase_not_applied_with_explicit_operator() {
    let index = ConceptIndex::new(vec![concept("C1", &["heart attack", "myocardial infarction"])]);
    assert_eq!(
        to_postgres_query("heart AND attack", &StopWords::english(), &index),
        "heart&attack"
    );
}
