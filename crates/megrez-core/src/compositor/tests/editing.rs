use std::sync::Arc;

use crate::compositor::testutil::{
    compositor_with, grid_snapshot, sample_model, tokens, type_readings, MockModel,
};
use crate::compositor::{Compositor, TypingDirection};
use crate::lm::{LanguageModel, TextModel, Unigram};
use crate::settings::settings;

fn mock(separator: &str) -> Compositor {
    compositor_with(Arc::new(MockModel), separator)
}

fn key_at(compositor: &Compositor, start: usize, length: usize) -> Option<String> {
    compositor
        .spans()
        .get(start)
        .and_then(|s| s.get(length))
        .map(|n| n.key().to_string())
}

#[test]
fn test_basic_insert_and_delete() {
    let mut compositor = Compositor::new(Arc::new(MockModel));
    assert_eq!(compositor.separator(), settings().compositor.separator);
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 0);

    assert!(compositor.insert_reading("a"));
    assert_eq!(compositor.cursor(), 1);
    assert_eq!(compositor.length(), 1);
    assert_eq!(compositor.spans().len(), 1);
    assert_eq!(compositor.spans()[0].max_length(), 1);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("a"));

    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 0);
    assert!(compositor.spans().is_empty());
}

#[test]
fn test_invalid_operations() {
    let lm = Arc::new(TextModel::parse("foo foo -1\n").unwrap());
    let mut compositor = compositor_with(lm, ";");
    assert!(!compositor.insert_reading("bar"));
    assert!(!compositor.insert_reading(""));
    assert!(!compositor.insert_reading(";"));
    assert!(!compositor.delete_reading(TypingDirection::Rear));
    assert!(!compositor.delete_reading(TypingDirection::Front));

    assert!(compositor.insert_reading("foo"));
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.length(), 0);

    assert!(compositor.insert_reading("foo"));
    compositor.set_cursor(0);
    assert!(compositor.delete_reading(TypingDirection::Front));
    assert_eq!(compositor.length(), 0);
}

#[test]
fn test_rejected_insert_leaves_state_untouched() {
    let mut compositor = compositor_with(sample_model(), "");
    type_readings(&mut compositor, "gao1 ke1 ji4");
    compositor.set_cursor(1);
    let readings = compositor.readings().to_vec();
    let snapshot = grid_snapshot(&compositor);

    assert!(!compositor.insert_reading("xyz9"));
    assert!(!compositor.insert_reading(""));
    assert_eq!(compositor.readings(), readings.as_slice());
    assert_eq!(compositor.cursor(), 1);
    assert_eq!(grid_snapshot(&compositor), snapshot);
}

/// A model whose existence check disagrees with its lookup.
struct Inconsistent;

impl LanguageModel for Inconsistent {
    fn unigrams_for(&self, _key_tokens: &[String]) -> Vec<Unigram> {
        Vec::new()
    }

    fn has_unigrams(&self, _key_tokens: &[String]) -> bool {
        true
    }
}

#[test]
fn test_insert_rejects_reading_without_leaf_unigrams() {
    let mut compositor = Compositor::new(Arc::new(Inconsistent));
    assert!(!compositor.insert_reading("a"));
    assert!(compositor.is_empty());
    assert!(compositor.grid().is_empty());
}

#[test]
fn test_delete_to_the_front_of_cursor() {
    let mut compositor = mock("");
    compositor.insert_reading("a");
    compositor.set_cursor(0);
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 1);
    assert!(!compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 1);
    assert!(compositor.delete_reading(TypingDirection::Front));
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 0);
    assert!(compositor.spans().is_empty());
}

#[test]
fn test_multiple_spans() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c");
    assert_eq!(compositor.cursor(), 3);
    assert_eq!(compositor.length(), 3);
    assert_eq!(compositor.spans().len(), 3);
    assert_eq!(compositor.spans()[0].max_length(), 3);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("a"));
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a;b"));
    assert_eq!(key_at(&compositor, 0, 3).as_deref(), Some("a;b;c"));
    assert_eq!(compositor.spans()[1].max_length(), 2);
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("b"));
    assert_eq!(key_at(&compositor, 1, 2).as_deref(), Some("b;c"));
    assert_eq!(compositor.spans()[2].max_length(), 1);
    assert_eq!(key_at(&compositor, 2, 1).as_deref(), Some("c"));
}

#[test]
fn test_span_deletion_from_front() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c");
    assert!(!compositor.delete_reading(TypingDirection::Front));
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 2);
    assert_eq!(compositor.length(), 2);
    assert_eq!(compositor.spans().len(), 2);
    assert_eq!(compositor.spans()[0].max_length(), 2);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("a"));
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a;b"));
    assert_eq!(compositor.spans()[1].max_length(), 1);
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("b"));
}

#[test]
fn test_span_deletion_from_middle() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c");
    compositor.set_cursor(2);
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 1);
    assert_eq!(compositor.length(), 2);
    assert_eq!(compositor.spans()[0].max_length(), 2);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("a"));
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a;c"));
    assert_eq!(compositor.spans()[1].max_length(), 1);
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("c"));

    compositor.clear();
    type_readings(&mut compositor, "a b c");
    compositor.set_cursor(1);
    assert!(compositor.delete_reading(TypingDirection::Front));
    assert_eq!(compositor.cursor(), 1);
    assert_eq!(compositor.length(), 2);
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a;c"));
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("c"));
}

#[test]
fn test_span_deletion_from_rear() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c");
    compositor.set_cursor(0);
    assert!(!compositor.delete_reading(TypingDirection::Rear));
    assert!(compositor.delete_reading(TypingDirection::Front));
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(compositor.length(), 2);
    assert_eq!(compositor.spans()[0].max_length(), 2);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("b"));
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("b;c"));
    assert_eq!(compositor.spans()[1].max_length(), 1);
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("c"));
}

#[test]
fn test_span_insertion() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c");
    compositor.set_cursor(1);
    assert!(compositor.insert_reading("X"));

    assert_eq!(compositor.cursor(), 2);
    assert_eq!(compositor.length(), 4);
    assert_eq!(compositor.spans()[0].max_length(), 4);
    assert_eq!(key_at(&compositor, 0, 1).as_deref(), Some("a"));
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a;X"));
    assert_eq!(key_at(&compositor, 0, 3).as_deref(), Some("a;X;b"));
    assert_eq!(key_at(&compositor, 0, 4).as_deref(), Some("a;X;b;c"));
    assert_eq!(compositor.spans()[1].max_length(), 3);
    assert_eq!(key_at(&compositor, 1, 1).as_deref(), Some("X"));
    assert_eq!(key_at(&compositor, 1, 2).as_deref(), Some("X;b"));
    assert_eq!(key_at(&compositor, 1, 3).as_deref(), Some("X;b;c"));
    assert_eq!(compositor.spans()[2].max_length(), 2);
    assert_eq!(key_at(&compositor, 2, 2).as_deref(), Some("b;c"));
    assert_eq!(compositor.spans()[3].max_length(), 1);
    assert_eq!(key_at(&compositor, 3, 1).as_deref(), Some("c"));
}

#[test]
fn test_long_grid_deletion() {
    let mut compositor = mock("");
    type_readings(&mut compositor, "a b c d e f g h i j k l m n");
    compositor.set_cursor(7);
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 6);
    assert_eq!(compositor.length(), 13);
    assert_eq!(compositor.spans().len(), 13);
    assert_eq!(key_at(&compositor, 0, 6).as_deref(), Some("abcdef"));
    assert_eq!(key_at(&compositor, 1, 6).as_deref(), Some("bcdefh"));
    assert_eq!(key_at(&compositor, 1, 5).as_deref(), Some("bcdef"));
    assert_eq!(key_at(&compositor, 2, 6).as_deref(), Some("cdefhi"));
    assert_eq!(key_at(&compositor, 2, 5).as_deref(), Some("cdefh"));
    assert_eq!(key_at(&compositor, 3, 6).as_deref(), Some("defhij"));
    assert_eq!(key_at(&compositor, 4, 6).as_deref(), Some("efhijk"));
    assert_eq!(key_at(&compositor, 5, 6).as_deref(), Some("fhijkl"));
    assert_eq!(key_at(&compositor, 6, 6).as_deref(), Some("hijklm"));
    assert_eq!(key_at(&compositor, 7, 6).as_deref(), Some("ijklmn"));
    assert_eq!(key_at(&compositor, 8, 5).as_deref(), Some("jklmn"));
}

#[test]
fn test_long_grid_insertion() {
    let mut compositor = mock("");
    type_readings(&mut compositor, "a b c d e f g h i j k l m n");
    compositor.set_cursor(7);
    assert!(compositor.insert_reading("X"));
    assert_eq!(compositor.cursor(), 8);
    assert_eq!(compositor.length(), 15);
    assert_eq!(compositor.spans().len(), 15);
    assert_eq!(key_at(&compositor, 0, 6).as_deref(), Some("abcdef"));
    assert_eq!(key_at(&compositor, 1, 6).as_deref(), Some("bcdefg"));
    assert_eq!(key_at(&compositor, 2, 6).as_deref(), Some("cdefgX"));
    assert_eq!(key_at(&compositor, 3, 6).as_deref(), Some("defgXh"));
    assert_eq!(key_at(&compositor, 3, 5).as_deref(), Some("defgX"));
    assert_eq!(key_at(&compositor, 4, 6).as_deref(), Some("efgXhi"));
    assert_eq!(key_at(&compositor, 4, 5).as_deref(), Some("efgXh"));
    assert_eq!(key_at(&compositor, 4, 4).as_deref(), Some("efgX"));
    assert_eq!(key_at(&compositor, 4, 3).as_deref(), Some("efg"));
    assert_eq!(key_at(&compositor, 5, 6).as_deref(), Some("fgXhij"));
    assert_eq!(key_at(&compositor, 6, 6).as_deref(), Some("gXhijk"));
    assert_eq!(key_at(&compositor, 7, 6).as_deref(), Some("Xhijkl"));
    assert_eq!(key_at(&compositor, 8, 6).as_deref(), Some("hijklm"));
}

#[test]
fn test_deletion_drops_crossing_nodes_in_neighbor_spans() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c d");
    compositor.set_cursor(2);
    assert!(compositor.delete_reading(TypingDirection::Rear));

    for (start, node) in compositor.grid().nodes() {
        assert!(
            !node.key_tokens().contains(&"b".to_string()),
            "stale node {} at {start}",
            node.key()
        );
        assert_eq!(
            node.key_tokens(),
            &compositor.readings()[start..start + node.span_length()]
        );
    }
    assert_eq!(key_at(&compositor, 0, 3).as_deref(), Some("a;c;d"));
}

#[test]
fn test_max_span_length_limits_nodes() {
    let mut compositor = Compositor::with_max_span_length(Arc::new(MockModel), 2);
    type_readings(&mut compositor, "a b c d");
    assert_eq!(compositor.max_span_length(), 2);
    assert!(compositor.spans().iter().all(|s| s.max_length() <= 2));
    assert_eq!(compositor.spans()[0].max_length(), 2);
}

#[test]
fn test_remove_leading_readings() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b c d");
    compositor.set_cursor(1);
    assert!(!compositor.remove_leading_readings(5));
    assert_eq!(compositor.length(), 4);

    assert!(compositor.remove_leading_readings(2));
    assert_eq!(compositor.readings(), tokens(&["c", "d"]).as_slice());
    assert_eq!(compositor.cursor(), 0);
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("c;d"));
    assert_eq!(compositor.spans()[1].max_length(), 1);

    assert!(compositor.remove_leading_readings(0));
    assert!(compositor.remove_leading_readings(2));
    assert!(compositor.is_empty());
    assert!(compositor.grid().is_empty());
}

#[test]
fn test_set_cursor_clamps() {
    let mut compositor = mock("");
    type_readings(&mut compositor, "a b");
    compositor.set_cursor(99);
    assert_eq!(compositor.cursor(), 2);
    compositor.set_cursor(0);
    assert_eq!(compositor.cursor(), 0);
}

#[test]
fn test_clear() {
    let mut compositor = mock("");
    type_readings(&mut compositor, "a b c");
    compositor.clear();
    assert_eq!(compositor.cursor(), 0);
    assert!(compositor.readings().is_empty());
    assert!(compositor.grid().is_empty());
    assert!(compositor.walk().is_empty());
}

#[test]
fn test_set_separator_rejoins_keys() {
    let mut compositor = mock(";");
    type_readings(&mut compositor, "a b");
    compositor.set_separator("+");
    assert_eq!(compositor.separator(), "+");
    assert_eq!(key_at(&compositor, 0, 2).as_deref(), Some("a+b"));
}

#[test]
fn test_insert_then_delete_round_trip() {
    let mut compositor = compositor_with(sample_model(), "");
    type_readings(&mut compositor, "gao1 ke1 ji4 gong1 si1");
    let snapshot = grid_snapshot(&compositor);

    compositor.set_cursor(2);
    assert!(compositor.insert_reading("de5"));
    assert_ne!(grid_snapshot(&compositor), snapshot);
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert_eq!(compositor.cursor(), 2);
    assert_eq!(grid_snapshot(&compositor), snapshot);

    compositor.set_cursor(4);
    assert!(compositor.insert_reading("de5"));
    compositor.set_cursor(4);
    assert!(compositor.delete_reading(TypingDirection::Front));
    assert_eq!(grid_snapshot(&compositor), snapshot);
}

#[test]
fn test_copy_is_independent() {
    let mut original = compositor_with(sample_model(), "");
    type_readings(&mut original, "gao1 ke1 ji4 gong1 si1 de5 nian2 zhong1 jiang3 jin1");
    let mut copy = original.copy();
    assert_eq!(original.walk().values(), copy.walk().values());

    assert!(copy.override_candidate_by_value("膏", 0));
    copy.set_cursor(5);
    assert!(copy.delete_reading(TypingDirection::Rear));

    assert_eq!(original.length(), 10);
    assert_eq!(original.cursor(), 10);
    assert!(original.grid().nodes().all(|(_, n)| !n.is_overridden()));
    assert_eq!(
        original.walk().values(),
        vec!["高科技", "公司", "的", "年中", "獎金"]
    );

    let before = grid_snapshot(&copy);
    original.clear();
    assert_eq!(grid_snapshot(&copy), before);
    assert_eq!(copy.length(), 9);
}

#[test]
fn test_update_syncs_changed_model_data() {
    let lm = sample_model();
    let mut compositor = compositor_with(lm.clone(), "");
    type_readings(&mut compositor, "nian2 zhong1 jiang3 jin1");
    assert_eq!(compositor.walk().values().concat(), "年中獎金");

    assert!(lm.trim("nian2zhong1", "年中"));
    assert_eq!(compositor.update(true), 1);
    assert_eq!(compositor.walk().values().concat(), "年終獎金");

    compositor.set_cursor(4);
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert!(compositor.delete_reading(TypingDirection::Rear));
    assert!(lm.trim("nian2zhong1", "年終"));
    compositor.update(true);
    assert!(compositor.spans()[0].get(2).is_none());
    assert_eq!(compositor.walk().values(), vec!["年", "中"]);
}

#[test]
fn test_update_keeps_override_while_value_exists() {
    let lm = sample_model();
    let mut compositor = compositor_with(lm.clone(), "");
    type_readings(&mut compositor, "nian2 zhong1");
    assert!(compositor.override_candidate_by_value("年終", 0));

    // Another value disappears; the pinned one survives.
    assert!(lm.trim("nian2zhong1", "年中"));
    compositor.update(true);
    let node = compositor.spans()[0].get(2).unwrap();
    assert_eq!(node.value(), "年終");
    assert!(node.is_overridden());

    // The pinned value itself disappears after a new one is added.
    assert!(lm.insert("nian2zhong1", "黏鐘", -20.0));
    assert!(lm.trim("nian2zhong1", "年終"));
    compositor.update(true);
    let node = compositor.spans()[0].get(2).unwrap();
    assert_eq!(node.value(), "黏鐘");
    assert!(!node.is_overridden());
}

#[test]
fn test_update_without_existing_fills_new_keys_only() {
    let lm = sample_model();
    let mut compositor = compositor_with(lm.clone(), "");
    type_readings(&mut compositor, "gao1 ke1");
    assert!(compositor.spans()[0].get(2).is_none());

    assert!(lm.insert("gao1ke1", "高科", -4.0));
    assert!(lm.insert("gao1", "羔", 0.0));
    assert_eq!(compositor.update(false), 1);
    assert_eq!(compositor.spans()[0].get(2).map(|n| n.value()), Some("高科"));
    // Existing single-token node was not re-synced.
    assert_eq!(compositor.spans()[0].get(1).map(|n| n.value()), Some("高"));
}

#[test]
fn test_shared_model_behind_lock() {
    let lm = Arc::new(std::sync::RwLock::new(TextModel::parse("a A -1\nb B -1\n").unwrap()));
    let mut compositor = compositor_with(lm.clone(), "");
    type_readings(&mut compositor, "a b");
    assert_eq!(compositor.walk().values(), vec!["A", "B"]);

    lm.write().unwrap().insert("ab", "AB", -1.5);
    compositor.update(true);
    assert_eq!(compositor.walk().values(), vec!["AB"]);
}

#[test]
fn test_zero_max_span_length_is_raised_to_one() {
    let mut compositor = Compositor::with_max_span_length(Arc::new(MockModel), 0);
    assert_eq!(compositor.max_span_length(), 1);
    type_readings(&mut compositor, "a b c");
    assert!(compositor.spans().iter().all(|s| s.max_length() == 1));
    assert_eq!(compositor.walk().values(), vec!["a", "b", "c"]);
}
