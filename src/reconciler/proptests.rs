//! Property-based tests for response reconciliation
//!
//! - Anything that is not an analysis object is shown verbatim
//! - Analysis objects are recovered exactly, extra fields ignored
//! - Streaming a response in any fragmentation matches finalizing it whole
//! - Partial streams always display the literal concatenation so far

use super::*;
use crate::message::{Entity, EntityKind, MessageState, Sentiment};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Strategies
// ============================================================================

fn arb_sentiment() -> impl Strategy<Value = Sentiment> {
    prop_oneof![
        Just(Sentiment::Positive),
        Just(Sentiment::Negative),
        Just(Sentiment::Neutral),
    ]
}

/// Scores in hundredths so they survive a JSON round trip exactly
fn arb_score() -> impl Strategy<Value = f64> {
    (-100i32..=100).prop_map(|n| f64::from(n) / 100.0)
}

fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::Company),
        Just(EntityKind::Person),
        Just(EntityKind::TickerSymbol),
        Just(EntityKind::Product),
        Just(EntityKind::Currency),
        Just(EntityKind::Other),
        "[A-Z][a-z]{3,12}"
            .prop_filter("collides with a known label", |s| {
                !EntityKind::from(s.clone()).is_recognized()
            })
            .prop_map(EntityKind::Unrecognized),
    ]
}

fn arb_entity() -> impl Strategy<Value = Entity> {
    ("[A-Za-z0-9 .]{1,20}", arb_entity_kind(), "[A-Za-z0-9 ,.']{0,60}")
        .prop_map(|(name, kind, description)| Entity {
            name,
            kind,
            description,
        })
}

fn arb_analysis() -> impl Strategy<Value = Analysis> {
    (
        "[A-Za-z0-9 ,.%$'\"\\\\{}]{0,80}",
        arb_sentiment(),
        arb_score(),
        proptest::collection::vec(arb_entity(), 0..4),
    )
        .prop_map(|(summary, sentiment, sentiment_score, entities)| Analysis {
            summary,
            sentiment,
            sentiment_score,
            entities,
        })
}

/// Serialized analysis, optionally with unknown fields and without `entities`
fn arb_analysis_json() -> impl Strategy<Value = (Analysis, String)> {
    (arb_analysis(), any::<bool>(), any::<bool>()).prop_map(|(analysis, extra, drop_entities)| {
        let mut value = serde_json::to_value(&analysis).unwrap();
        let obj = value.as_object_mut().unwrap();
        if extra {
            obj.insert("confidence".to_string(), json!("high"));
            obj.insert("sources".to_string(), json!([1, 2, 3]));
        }
        let mut expected = analysis;
        if drop_entities {
            obj.remove("entities");
            expected.entities.clear();
        }
        (expected, value.to_string())
    })
}

/// Free text that can never be a JSON object
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[^{}]{0,120}"
}

/// Split `text` at arbitrary char boundaries
fn fragments(text: &str, cuts: &[usize]) -> Vec<String> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut points: Vec<usize> = cuts.iter().map(|c| boundaries[c % boundaries.len()]).collect();
    points.push(0);
    points.push(text.len());
    points.sort_unstable();
    points.dedup();

    points
        .windows(2)
        .filter_map(|w| text.get(w[0]..w[1]))
        .map(str::to_string)
        .collect()
}

fn stream(reconciler: &Reconciler, parts: &[String]) -> Message {
    parts.iter().fold(reconciler.begin_streaming(), |msg, part| {
        reconciler.append_fragment(msg, part)
    })
}

/// Compare everything except identity and timestamps
fn same_content(a: &Message, b: &Message) -> bool {
    a.speaker() == b.speaker()
        && a.display_text() == b.display_text()
        && a.analysis() == b.analysis()
        && a.state() == b.state()
        && a.interruption() == b.interruption()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_plain_text_is_verbatim(text in arb_plain_text()) {
        let msg = Reconciler::default().finalize(&text);
        prop_assert_eq!(msg.display_text(), text.as_str());
        prop_assert!(msg.analysis().is_none());
        prop_assert_eq!(msg.state(), MessageState::PlainText);
    }

    #[test]
    fn prop_analysis_recovered((expected, raw) in arb_analysis_json()) {
        let msg = Reconciler::default().finalize(&raw);
        prop_assert_eq!(msg.display_text(), expected.summary.as_str());
        prop_assert_eq!(msg.analysis(), Some(&expected));
        prop_assert_eq!(msg.state(), MessageState::Structured);
    }

    #[test]
    fn prop_missing_summary_is_plain_text((_, raw) in arb_analysis_json()) {
        let mut value: Value = serde_json::from_str(&raw).unwrap();
        value.as_object_mut().unwrap().remove("summary");
        let raw = value.to_string();

        let msg = Reconciler::default().finalize(&raw);
        prop_assert_eq!(msg.display_text(), raw.as_str());
        prop_assert!(msg.analysis().is_none());
    }

    #[test]
    fn prop_out_of_range_score_is_plain_text(
        (_, raw) in arb_analysis_json(),
        score in prop_oneof![1.001f64..1e6, -1e6f64..-1.001],
    ) {
        let mut value: Value = serde_json::from_str(&raw).unwrap();
        value["sentimentScore"] = json!(score);
        let raw = value.to_string();

        let msg = Reconciler::default().finalize(&raw);
        prop_assert!(msg.analysis().is_none());
        prop_assert_eq!(msg.display_text(), raw.as_str());
    }

    #[test]
    fn prop_streamed_structured_matches_finalize(
        (_, raw) in arb_analysis_json(),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let reconciler = Reconciler::default();
        let parts = fragments(&raw, &cuts);
        let open = stream(&reconciler, &parts);
        let id = open.id().clone();

        let streamed = reconciler.end_streaming(open);
        let whole = reconciler.finalize(&raw);
        prop_assert_eq!(streamed.id(), &id);
        prop_assert!(same_content(&streamed, &whole));
    }

    #[test]
    fn prop_streamed_plain_matches_finalize(
        text in arb_plain_text(),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let reconciler = Reconciler::default();
        let streamed = reconciler.end_streaming(stream(&reconciler, &fragments(&text, &cuts)));
        prop_assert!(same_content(&streamed, &reconciler.finalize(&text)));
    }

    #[test]
    fn prop_partial_stream_is_literal(
        (_, raw) in arb_analysis_json(),
        cuts in proptest::collection::vec(any::<usize>(), 1..8),
    ) {
        let reconciler = Reconciler::default();
        let parts = fragments(&raw, &cuts);
        let mut msg = reconciler.begin_streaming();
        let mut shown = String::new();

        for part in &parts[..parts.len() - 1] {
            msg = reconciler.append_fragment(msg, part);
            shown.push_str(part);
            prop_assert_eq!(msg.display_text(), shown.as_str());
            prop_assert!(msg.analysis().is_none());
            prop_assert!(msg.is_streaming());
        }
    }

    #[test]
    fn prop_classify_never_panics(text in "\\PC{0,200}") {
        let _ = Reconciler::default().classify(&text);
        let _ = Reconciler::new(ReconcilerConfig {
            structured_replies: true,
            unwrap_code_fences: true,
        })
        .classify(&text);
    }
}
