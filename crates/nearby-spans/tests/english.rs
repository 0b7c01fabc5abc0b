//! End-to-end checks over the numbers-as-English corpus: document `n`
//! holds the spelled-out number `n`, e.g. 1906 is "one thousand nine
//! hundred six".

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::sync::OnceLock;

use nearby_spans::{
    DocId, FilterSpans, MemorySegment, NotSpans, OrSpans, OrderedNearSpans, PositionWindow, Spans,
    TermSource, TermSpans, UnorderedNearSpans,
};
use rstest::rstest;

/// Spells out `n` the way the corpus does.
fn english(n: u32) -> String {
    if n == 0 {
        return "zero".to_string();
    }
    let mut out = String::new();
    spell(n, &mut out);
    out
}

fn spell(mut n: u32, out: &mut String) {
    const ONES: [&str; 20] = [
        "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 10] = [
        "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    if n >= 1000 {
        spell(n / 1000, out);
        out.push_str("thousand ");
        n %= 1000;
    }
    if n >= 100 {
        spell(n / 100, out);
        out.push_str("hundred ");
        n %= 100;
    }
    if n >= 20 {
        out.push_str(TENS[(n / 10) as usize]);
        n %= 10;
        out.push(if n == 0 { ' ' } else { '-' });
    }
    if n > 0 {
        out.push_str(ONES[n as usize]);
        out.push(' ');
    }
}

fn corpus() -> &'static MemorySegment {
    static CORPUS: OnceLock<MemorySegment> = OnceLock::new();
    CORPUS.get_or_init(|| {
        let texts: Vec<String> = (0..2000).map(english).collect();
        MemorySegment::from_texts("field", &texts)
    })
}

fn term(text: &str) -> Box<dyn Spans> {
    Box::new(TermSpans::new(corpus().postings("field", text).unwrap().unwrap()))
}

fn ordered(clauses: Vec<Box<dyn Spans>>, slop: u32) -> Box<dyn Spans> {
    Box::new(OrderedNearSpans::new(clauses, slop, true).unwrap())
}

fn unordered(clauses: Vec<Box<dyn Spans>>, slop: u32) -> Box<dyn Spans> {
    Box::new(UnorderedNearSpans::new(clauses, slop).unwrap())
}

/// Distinct documents with at least one match.
fn hits(mut spans: Box<dyn Spans>) -> Vec<DocId> {
    let mut docs = Vec::new();
    while spans.next() {
        if docs.last() != Some(&spans.doc()) {
            docs.push(spans.doc());
        }
    }
    docs
}

#[rstest]
#[case(0, "zero")]
#[case(42, "forty-two ")]
#[case(500, "five hundred ")]
#[case(1906, "one thousand nine hundred six ")]
fn spelling(#[case] n: u32, #[case] expected: &str) {
    assert_eq!(english(n), expected);
}

#[test]
fn term_hits() {
    assert_eq!(hits(term("seventy")).len(), 200);
    assert_eq!(hits(term("zero")), vec![0]);
}

#[test]
fn near_exact() {
    let expected: Vec<DocId> = (0..20).map(|i| i * 100 + 77).collect();
    assert_eq!(hits(ordered(vec![term("seventy"), term("seven")], 0)), expected);
}

#[test]
fn near_ordered() {
    assert_eq!(
        hits(ordered(vec![term("nine"), term("six")], 4)),
        vec![
            906, 926, 936, 946, 956, 966, 976, 986, 996, 1906, 1926, 1936, 1946, 1956, 1966, 1976,
            1986, 1996
        ]
    );
}

#[test]
fn near_unordered() {
    assert_eq!(
        hits(unordered(vec![term("nine"), term("six")], 4)),
        vec![
            609, 629, 639, 649, 659, 669, 679, 689, 699, 906, 926, 936, 946, 956, 966, 976, 986,
            996, 1609, 1629, 1639, 1649, 1659, 1669, 1679, 1689, 1699, 1906, 1926, 1936, 1946,
            1956, 1966, 1976, 1986, 1996
        ]
    );
}

#[test]
fn or_of_exact_nears() {
    let or = Box::new(OrSpans::new(vec![
        ordered(vec![term("thirty"), term("three")], 0),
        ordered(vec![term("forty"), term("seven")], 0),
    ]));
    let expected: Vec<DocId> = (0..2000).filter(|n| n % 100 == 33 || n % 100 == 47).collect();
    assert_eq!(hits(or), expected);
}

const EIGHT_ONE: [DocId; 16] = [
    801, 821, 831, 851, 861, 871, 881, 891, 1801, 1821, 1831, 1851, 1861, 1871, 1881, 1891,
];

#[rstest]
#[case(0, 0)]
#[case(-2, -2)]
fn not_without_window(#[case] pre: i32, #[case] post: i32) {
    let near = ordered(vec![term("eight"), term("one")], 4);
    let not = Box::new(NotSpans::new(near, term("forty"), pre, post));
    assert_eq!(hits(not), EIGHT_ONE);
}

#[test]
fn not_with_union_exclusion() {
    let near = ordered(vec![term("eight"), term("one")], 4);
    let exclude = Box::new(OrSpans::new(vec![term("forty"), term("sixty"), term("eighty")]));
    let not = Box::new(NotSpans::new(near, exclude, 0, 0));
    assert_eq!(
        hits(not),
        vec![801, 821, 831, 851, 871, 891, 1801, 1821, 1831, 1851, 1871, 1891]
    );
}

#[rstest]
#[case(1, 1, &[840, 842, 843, 844, 845, 846, 847, 848, 849, 1840, 1842, 1843, 1844, 1845, 1846, 1847, 1848, 1849])]
#[case(2, 0, &[840, 841, 842, 843, 844, 845, 846, 847, 848, 849])]
fn not_with_window(#[case] pre: i32, #[case] post: i32, #[case] expected: &[DocId]) {
    let near = ordered(vec![term("eight"), term("forty")], 4);
    let not = Box::new(NotSpans::new(near, term("one"), pre, post));
    assert_eq!(hits(not), expected);
}

#[test]
fn not_skipping_two_exclusions_before_include() {
    let near = ordered(vec![term("forty"), term("two")], 2);
    let not = Box::new(NotSpans::new(near, term("one"), 4, 1));
    assert_eq!(hits(not), vec![42, 242, 342, 442, 542, 642, 742, 842, 942]);
}

#[test]
fn first() {
    let first = Box::new(FilterSpans::new(term("five"), PositionWindow::first(1)));
    let mut expected = vec![5];
    expected.extend(500..600);
    assert_eq!(hits(first), expected);
}

#[rstest]
#[case(1, 2, vec![25, 35, 45, 55, 65, 75, 85, 95])]
#[case(0, 1, [5].into_iter().chain(500..600).collect())]
#[case(6, 7, vec![])]
fn position_range(#[case] start: u32, #[case] end: u32, #[case] expected: Vec<DocId>) {
    let range = Box::new(FilterSpans::new(term("five"), PositionWindow::new(start, end)));
    assert_eq!(hits(range), expected);
}

#[test]
fn nested_near_of_nears() {
    // "nine hundred" followed closely by "ninety-nine" or similar tens.
    let inner = ordered(vec![term("nine"), term("hundred")], 0);
    let tens = Box::new(OrSpans::new(vec![term("ninety"), term("eighty")]));
    let outer = ordered(vec![inner, tens], 0);
    let expected: Vec<DocId> = (0..2000)
        .filter(|n| n % 1000 / 100 == 9 && matches!(n % 100 / 10, 8 | 9))
        .collect();
    assert_eq!(hits(outer), expected);
}
