use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_citations::domain::{
    Doi, ImpactMetrics, MergedArticle, Metric, NormalizedDocument, OpenAccess,
};
use kira_citations::error::CiteError;
use kira_citations::merge::ArticleMap;
use kira_citations::query::{GroupMean, SubjectImpact};
use kira_citations::store::SchemaStore;

fn article(
    doi: &str,
    subject: &str,
    year: &str,
    open_access: OpenAccess,
    citations: Metric,
    influential: Metric,
) -> MergedArticle {
    MergedArticle::new(
        NormalizedDocument {
            doi: doi.parse().unwrap(),
            title: format!("Title of {doi}"),
            author: "Unknown".to_string(),
            year: year.to_string(),
            journal: "Journal".to_string(),
            subject: subject.to_string(),
            publisher: "Publisher".to_string(),
            open_access,
        },
        ImpactMetrics {
            citation_count: citations,
            influential_citation_count: influential,
        },
    )
}

fn map(articles: Vec<MergedArticle>) -> ArticleMap {
    articles
        .into_iter()
        .map(|article| (article.doi().clone(), article))
        .collect()
}

fn subjects(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn mean(label: &str, mean: f64) -> GroupMean {
    GroupMean {
        label: label.to_string(),
        mean,
    }
}

fn sample_map() -> ArticleMap {
    map(vec![
        article("10.1000/a1", "Chemistry", "2016", OpenAccess::Open, Metric::Count(10), Metric::Count(2)),
        article("10.1000/a2", "Chemistry", "2017", OpenAccess::Unspecified, Metric::Count(4), Metric::Count(0)),
        article("10.1000/a3", "Law", "2016", OpenAccess::Subscription, Metric::Count(3), Metric::Count(1)),
        article("10.1000/a4", "Law", "2017", OpenAccess::Subscription, Metric::Count(1), Metric::Count(1)),
        article("10.1000/a5", "Law", "2018", OpenAccess::Open, Metric::Unknown, Metric::Unknown),
        article("10.1000/a6", "Chemistry", "Unknown", OpenAccess::Open, Metric::Count(7), Metric::Unknown),
    ])
}

#[test]
fn single_open_access_article_forms_one_group() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    store.rebuild().unwrap();
    let articles = map(vec![article(
        "10.1000/only",
        "Chemistry",
        "2020",
        OpenAccess::Open,
        Metric::Count(6),
        Metric::Count(3),
    )]);
    store.populate(&articles, &subjects(&["Chemistry"])).unwrap();

    let queries = store.queries();
    assert_eq!(queries.citations_by_access().unwrap(), vec![mean("Open Access", 6.0)]);
    assert_eq!(queries.influence_by_access().unwrap(), vec![mean("Open Access", 3.0)]);
    assert_eq!(queries.citations_by_year().unwrap(), vec![mean("2020", 6.0)]);
}

#[test]
fn explicit_false_flag_is_subscription_required() {
    let doi: Doi = "10.1000/flip".parse().unwrap();
    let mut articles = ArticleMap::new();
    for flag in [OpenAccess::Open, OpenAccess::Subscription] {
        let record = article(doi.as_str(), "Law", "2019", flag, Metric::Count(1), Metric::Count(0));
        articles.insert(doi.clone(), record);
    }

    let mut store = SchemaStore::open_in_memory().unwrap();
    store.reload(&articles, &subjects(&["Law"])).unwrap();

    assert_eq!(
        store.access_level_of(&doi).unwrap().as_deref(),
        Some("Subscription Required")
    );
}

#[test]
fn missing_flag_counts_as_open_access() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    store
        .reload(&sample_map(), &subjects(&["Chemistry", "Law"]))
        .unwrap();
    let doi: Doi = "10.1000/a2".parse().unwrap();
    assert_eq!(store.access_level_of(&doi).unwrap().as_deref(), Some("Open Access"));
    let absent: Doi = "10.1000/zz".parse().unwrap();
    assert_eq!(store.access_level_of(&absent).unwrap(), None);
}

#[test]
fn rebuild_empties_every_view() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    store
        .reload(&sample_map(), &subjects(&["Chemistry", "Law"]))
        .unwrap();
    store.rebuild().unwrap();

    let queries = store.queries();
    assert!(queries.citations_by_access().unwrap().is_empty());
    assert!(queries.influence_by_access().unwrap().is_empty());
    assert!(queries.citations_by_year().unwrap().is_empty());
    assert!(queries.citations_by_subject().unwrap().is_empty());
    assert!(queries.sample_articles(10).unwrap().is_empty());
}

#[test]
fn unknown_metrics_are_excluded_from_means() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    let summary = store
        .reload(&sample_map(), &subjects(&["Chemistry", "Law"]))
        .unwrap();
    assert_eq!(summary.articles, 6);
    assert_eq!(summary.unknown_metrics, 1);

    let queries = store.queries();
    // a1 10, a2 4, a6 7 are open; a3 3, a4 1 need a subscription
    assert_eq!(
        queries.citations_by_access().unwrap(),
        vec![mean("Open Access", 7.0), mean("Subscription Required", 2.0)]
    );
    // a6 has no influential figure
    assert_eq!(
        queries.influence_by_access().unwrap(),
        vec![mean("Open Access", 1.0), mean("Subscription Required", 1.0)]
    );
    assert_eq!(
        queries.citations_by_year().unwrap(),
        vec![
            mean("2016", 6.5),
            mean("2017", 2.5),
            mean("Unknown", 7.0),
        ]
    );
    assert_eq!(
        queries.citations_by_subject().unwrap(),
        vec![
            SubjectImpact {
                subject: "Chemistry".to_string(),
                avg_citations: 7.0,
                avg_influential: 1.0,
            },
            SubjectImpact {
                subject: "Law".to_string(),
                avg_citations: 2.0,
                avg_influential: 1.0,
            },
        ]
    );
}

#[test]
fn sample_is_bounded_and_fully_known() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    store
        .reload(&sample_map(), &subjects(&["Chemistry", "Law"]))
        .unwrap();
    let queries = store.queries();

    let all = queries.sample_articles(100).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|row| !row.citation_count.is_unknown()
        && !row.influential_citation_count.is_unknown()));
    let mut dois: Vec<&str> = all.iter().map(|row| row.doi.as_str()).collect();
    dois.sort();
    assert_eq!(dois, vec!["10.1000/a1", "10.1000/a2", "10.1000/a3", "10.1000/a4"]);

    assert_eq!(queries.sample_articles(2).unwrap().len(), 2);
    assert!(queries.sample_articles(0).unwrap().is_empty());
}

#[test]
fn unlisted_subject_rolls_back_population() {
    let mut store = SchemaStore::open_in_memory().unwrap();
    store.rebuild().unwrap();

    let result = store.populate(&sample_map(), &subjects(&["Chemistry"]));

    assert_matches!(
        result,
        Err(CiteError::LabelNotFound { table: "Subjects", label }) if label == "Law"
    );
    assert_eq!(store.article_count().unwrap(), 0);
    assert!(store.subject_labels().unwrap().is_empty());
}

#[test]
fn failed_reload_keeps_previous_contents() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("db").join("articles.db")).unwrap();
    let mut store = SchemaStore::open(&path).unwrap();
    store
        .reload(&sample_map(), &subjects(&["Chemistry", "Law"]))
        .unwrap();

    let result = store.reload(&sample_map(), &subjects(&["Law"]));
    assert_matches!(result, Err(CiteError::LabelNotFound { .. }));
    drop(store);

    let reopened = SchemaStore::open(&path).unwrap();
    assert_eq!(reopened.article_count().unwrap(), 6);
    assert_eq!(reopened.subject_labels().unwrap(), subjects(&["Chemistry", "Law"]));
}
