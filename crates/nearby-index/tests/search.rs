//! End-to-end searches through Tantivy, checked against the in-memory
//! segment on the numbers-as-English corpus.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::sync::OnceLock;

use nearby_index::{IndexDocument, IndexError, IndexSettings, IndexWriter, Searcher};
use nearby_query::SpanQuery;
use nearby_spans::{MemorySegment, SpanError, Spans};
use rstest::rstest;
use tempfile::TempDir;

/// Spells out `n` in words.
fn english(n: u32) -> String {
    const ONES: [&str; 20] = [
        "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 10] = [
        "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    if n == 0 {
        return "zero".to_string();
    }
    let mut words = Vec::new();
    if n >= 1000 {
        words.push(format!("{} thousand", english(n / 1000)));
    }
    if n % 1000 >= 100 {
        words.push(format!("{} hundred", ONES[(n % 1000 / 100) as usize]));
    }
    let rest = n % 100;
    if rest >= 20 {
        let ones = ONES[(rest % 10) as usize];
        if ones.is_empty() {
            words.push(TENS[(rest / 10) as usize].to_string());
        } else {
            words.push(format!("{}-{}", TENS[(rest / 10) as usize], ones));
        }
    } else if rest > 0 {
        words.push(ONES[rest as usize].to_string());
    }
    words.join(" ")
}

fn unstemmed() -> IndexSettings {
    IndexSettings {
        stemmer: "none".to_string(),
        ..IndexSettings::default()
    }
}

/// RAM index with one document per body, ids counting from zero.
fn searcher(bodies: &[String], settings: &IndexSettings) -> Searcher {
    let mut writer = IndexWriter::in_memory(settings).unwrap();
    let docs: Vec<IndexDocument> = (0..)
        .zip(bodies)
        .map(|(id, body)| IndexDocument::new(id, body.clone()))
        .collect();
    writer.add_documents(&docs).unwrap();
    writer.commit().unwrap();
    Searcher::from_index(writer.index().clone(), settings).unwrap()
}

fn numbers() -> &'static [String] {
    static TEXTS: OnceLock<Vec<String>> = OnceLock::new();
    TEXTS.get_or_init(|| (0..2000).map(english).collect())
}

/// Documents matching `query` in the in-memory segment.
fn memory_ids(segment: &MemorySegment, query: &SpanQuery) -> Vec<u64> {
    let mut spans = query.spans(segment).unwrap();
    let mut ids = Vec::new();
    while spans.next() {
        let id = u64::from(spans.doc());
        if ids.last() != Some(&id) {
            ids.push(id);
        }
    }
    ids
}

#[rstest]
#[case("nine 5W six")]
#[case("nine 5N six")]
#[case("\"seventy seven\"")]
#[case("\"thirty three\" OR \"forty seven\"")]
#[case("eight 5W one NOT (forty OR sixty OR eighty)")]
#[case("\"nine hundred\" 1W (ninety OR eighty)")]
#[case("thousand 3N (five OR six) 3N hundred")]
#[case("zero OR eleventy")]
fn tantivy_agrees_with_memory(#[case] text: &str) {
    let mut searcher = searcher(numbers(), &unstemmed());
    let segment = MemorySegment::from_texts("body", numbers());
    let query = searcher.parse(text).unwrap().unwrap();
    let expected = memory_ids(&segment, &query);
    assert_eq!(searcher.matching_ids(&query).unwrap(), expected, "{text}");
}

#[test]
fn proximity_counts() {
    let mut searcher = searcher(numbers(), &unstemmed());
    let ordered = searcher.parse("nine 5W six").unwrap().unwrap();
    let ids = searcher.matching_ids(&ordered).unwrap();
    assert_eq!(ids.len(), 18);
    assert!(ids.contains(&906) && !ids.contains(&609));

    let unordered = searcher.parse("nine 5N six").unwrap().unwrap();
    assert_eq!(searcher.matching_ids(&unordered).unwrap().len(), 36);
}

#[test]
fn tighter_matches_rank_higher() {
    let bodies = ["six x x nine", "nine six", "nine x six"].map(String::from);
    let mut searcher = searcher(&bodies, &unstemmed());
    let ids: Vec<u64> = searcher
        .search_text("nine 5N six")
        .unwrap()
        .iter()
        .map(|hit| hit.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 0]);
}

#[test]
fn limit_caps_hits() {
    let mut searcher = searcher(numbers(), &unstemmed());
    let query = searcher.parse("hundred").unwrap().unwrap();
    assert_eq!(searcher.search(&query, 5).unwrap().len(), 5);
    let settings = IndexSettings {
        default_limit: 3,
        ..unstemmed()
    };
    let mut limited = self::searcher(numbers(), &settings);
    assert_eq!(limited.search_text("hundred").unwrap().len(), 3);
}

#[test]
fn positionless_field_is_an_error() {
    let mut searcher = searcher(&["red".to_string()], &unstemmed());
    let err = searcher.search_text("tags:red").unwrap_err();
    assert!(matches!(
        err,
        IndexError::Span(SpanError::PositionsNotIndexed { .. })
    ));
    assert!(err.to_string().contains("without positions"));
}

#[test]
fn unknown_field_is_an_error() {
    let mut searcher = searcher(&["red".to_string()], &unstemmed());
    assert!(matches!(
        searcher.search_text("colour:red"),
        Err(IndexError::UnknownField(field)) if field == "colour"
    ));
}

#[test]
fn syntax_errors_surface() {
    let mut searcher = searcher(&["red".to_string()], &unstemmed());
    let err = searcher.search_text("red 3W").unwrap_err();
    assert!(matches!(err, IndexError::Query(_)));
}

#[test]
fn stemming_applies_to_documents_and_queries() {
    let bodies = ["the dog runs fast", "running is fast"].map(String::from);
    let mut searcher = searcher(&bodies, &IndexSettings::default());
    let ids: Vec<u64> = searcher
        .search_text("running 1W fast")
        .unwrap()
        .iter()
        .map(|hit| hit.id)
        .collect();
    assert_eq!(ids, vec![0]);
    assert_eq!(searcher.analyze("Runs"), vec!["run"]);
}

#[test]
fn title_field_is_searchable() {
    let settings = unstemmed();
    let mut writer = IndexWriter::in_memory(&settings).unwrap();
    writer
        .add_document(&IndexDocument {
            id: 9,
            title: "Nine Lives".to_string(),
            body: "six".to_string(),
            tags: vec!["cats".to_string()],
        })
        .unwrap();
    writer.commit().unwrap();
    let mut searcher = Searcher::from_index(writer.index().clone(), &settings).unwrap();
    let hits = searcher.search_text("title:(nine 1W lives)").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Nine Lives");
    assert!(searcher.search_text("nine 1W lives").unwrap().is_empty());
}

#[test]
fn reopen_from_disk_and_explain() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index");
    let settings = unstemmed();
    {
        let mut writer = IndexWriter::open(&path, &settings).unwrap();
        let docs: Vec<IndexDocument> = (0..200)
            .map(|n| IndexDocument::new(n, english(n as u32)))
            .collect();
        writer.add_documents(&docs).unwrap();
        writer.commit().unwrap();
    }

    let mut searcher = Searcher::open(&path, &settings).unwrap();
    assert_eq!(searcher.num_docs().unwrap(), 200);
    let query = searcher.parse("one 1W hundred").unwrap().unwrap();
    let hits = searcher.search(&query, 200).unwrap();
    assert_eq!(hits.len(), 100);
    assert!(hits.iter().all(|hit| (100..200).contains(&hit.id)));

    let explanation = searcher.explain(&query, hits[0].address).unwrap();
    assert!((explanation.value() - hits[0].score).abs() < 1e-5);
}
