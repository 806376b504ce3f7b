use std::fs;

use kira_citations::domain::{Metric, OpenAccess, UNKNOWN};
use kira_citations::providers::{
    BibliographicSource, ImpactSource, PlosSource, SemanticScholarSource, SpringerSource,
};
use serde_json::{Value, json};

fn fixture(name: &str) -> Value {
    let raw = fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn springer_records_normalize() {
    let source = SpringerSource::new("key");
    let docs = source.normalize("Chemistry", &fixture("springer_chemistry.json"));

    assert_eq!(docs.len(), 3);
    let first = &docs[0];
    assert_eq!(first.doi.as_str(), "10.1007/s11121-016-0635-6");
    assert_eq!(first.title, "Effects of a School-Based Programon Chemistry Outcomes");
    assert_eq!(first.author, "Smith, Jane");
    assert_eq!(first.year, "2016");
    assert_eq!(first.journal, "Prevention Science");
    assert_eq!(first.subject, "Chemistry");
    assert_eq!(first.publisher, "Springer");
    assert_eq!(first.open_access, OpenAccess::Subscription);

    assert_eq!(docs[1].open_access, OpenAccess::Open);

    let anonymous = &docs[2];
    assert_eq!(anonymous.author, UNKNOWN);
    assert_eq!(anonymous.journal, UNKNOWN);
    assert_eq!(anonymous.title, "Anonymous Review");
    assert_eq!(anonymous.open_access, OpenAccess::Unspecified);
}

#[test]
fn plos_docs_normalize_with_independent_fallbacks() {
    let source = PlosSource::new("key");
    let docs = source.normalize("Chemistry", &fixture("plos_chemistry.json"));

    assert_eq!(docs.len(), 2);
    let first = &docs[0];
    assert_eq!(first.doi.as_str(), "10.1371/journal.pone.0172383");
    assert_eq!(first.title, "Soil chemistryacross land-use gradients");
    assert_eq!(first.author, "Ana Garcia");
    assert_eq!(first.year, "2017");
    assert_eq!(first.journal, "PLOS ONE");
    assert_eq!(first.publisher, "PLOS");
    assert_eq!(first.open_access, OpenAccess::Open);

    let sparse = &docs[1];
    assert_eq!(sparse.title, UNKNOWN);
    assert_eq!(sparse.author, UNKNOWN);
    assert_eq!(sparse.journal, UNKNOWN);
    assert_eq!(sparse.year, "2012");
}

#[test]
fn error_payloads_yield_no_documents() {
    let error = json!({"error": "Invalid API key"});
    assert!(SpringerSource::new("key").normalize("Law", &error).is_empty());
    assert!(PlosSource::new("key").normalize("Law", &error).is_empty());
}

#[test]
fn results_are_capped_at_page_size() {
    let docs: Vec<Value> = (0..60)
        .map(|i| json!({"id": format!("10.1371/journal.pone.{i:07}"), "publication_date": "2020-01-01"}))
        .collect();
    let payload = json!({"response": {"docs": docs}});
    assert_eq!(PlosSource::new("key").normalize("Law", &payload).len(), 50);
}

#[test]
fn search_requests_carry_credentials_and_page_size() {
    let springer = SpringerSource::new("s-key").search_request("Law");
    assert_eq!(
        springer.fingerprint(),
        "http://api.springer.com/meta/v1/json?api_key-s-key_p-50_q-[keyword:Law,country:\"United States\",type:Journal]"
    );

    let plos = PlosSource::new("p-key").search_request("Law");
    assert_eq!(
        plos.fingerprint(),
        "http://api.plos.org/searchapi_key-p-key_q-abstract:Law_rows-50_wt-json"
    );
}

#[test]
fn semantic_scholar_metrics() {
    let source = SemanticScholarSource::new();
    let metrics = source.extract_metrics(&fixture("semantic_scholar_paper.json"));
    assert_eq!(metrics.citation_count, Metric::Count(3));
    assert_eq!(metrics.influential_citation_count, Metric::Count(4));

    let missing = source.extract_metrics(&fixture("semantic_scholar_missing.json"));
    assert_eq!(missing.citation_count, Metric::Unknown);
    assert_eq!(missing.influential_citation_count, Metric::Unknown);

    let partial = source.extract_metrics(&json!({"citations": []}));
    assert_eq!(partial.citation_count, Metric::Count(0));
    assert_eq!(partial.influential_citation_count, Metric::Unknown);
}

#[test]
fn semantic_scholar_lookup_is_keyed_by_doi() {
    let doi = "10.1371/journal.pgen.1002625".parse().unwrap();
    let request = SemanticScholarSource::new().lookup_request(&doi);
    assert_eq!(
        request.fingerprint(),
        "https://api.semanticscholar.org/v1/paper/10.1371/journal.pgen.1002625include_unknown_references-true"
    );
}
