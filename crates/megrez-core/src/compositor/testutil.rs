#![cfg(test)]

use std::sync::Arc;

use crate::lm::{LanguageModel, TextModel, Unigram};

use super::Compositor;

/// Shared reading → value table for compositor tests.
///
/// Scores are tuned so that "gao1 ke1 ji4 gong1 si1 de5 nian2 zhong1 jiang3
/// jin1" walks to 高科技 公司 的 年中 獎金.
pub const SAMPLE_DATA: &str = "\
# reading value score
gao1 高 -2.9396
gao1 膏 -11.0
gao1 糕 -11.5
ke1 科 -7.1715
ke1 柯 -9.0
ke1 顆 -8.2
ke1ke1 顆顆 -14.0
ji4 際 -3.5
ji4 暨 -9.5
ji4 濟 -8.6
gao1ke1ji4 高科技 -9.8424
ke1ji4 科技 -7.5
ji4gong1 濟公 -13.3
gong1 工 -3.5
gong1 公 -4.0
si1 斯 -6.0
si1 司 -7.0
gong1si1 公司 -6.3
de5 的 -3.5
nian2 年 -5.0
zhong1 中 -3.6
zhong1 鍾 -9.0
zhong1 終 -8.8
nian2zhong1 年中 -7.0
nian2zhong1 年終 -7.1
jiang3 獎 -8.0
jiang3 槳 -9.2
jin1 金 -6.0
jin1 斤 -7.5
jiang3jin1 獎金 -10.3
nai3 乃 -6.5
ji1 雞 -6.0
nai3ji1 荔枝 -8.0
";

pub const EMOJI_DATA: &str = "\
gao1 高 -2.9396
re4 熱 -7.0
gao1re4 高熱 -8.0
huo3 火 -6.0
huo3 🔥 -8.0
yan4 焰 -7.0
huo3yan4 火焰 -9.0
huo3yan4 🔥 -12.0
wei2 危 -6.0
xian3 險 -7.0
wei2xian3 危險 -8.5
";

/// Model that knows every key: one unigram whose value is the concatenated tokens.
pub struct MockModel;

impl LanguageModel for MockModel {
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram> {
        if key_tokens.is_empty() {
            return Vec::new();
        }
        vec![Unigram::new(key_tokens.concat(), -1.0)]
    }
}

pub fn sample_model() -> Arc<TextModel> {
    Arc::new(TextModel::parse(SAMPLE_DATA).expect("sample data parses"))
}

pub fn model_from(data: &str) -> Arc<TextModel> {
    Arc::new(TextModel::parse(data).expect("test data parses"))
}

pub fn compositor_with(lm: Arc<dyn LanguageModel>, separator: &str) -> Compositor {
    let mut compositor = Compositor::new(lm);
    compositor.set_separator(separator);
    compositor
}

pub fn type_readings(compositor: &mut Compositor, readings: &str) {
    for reading in readings.split_whitespace() {
        assert!(compositor.insert_reading(reading), "rejected {reading}");
    }
}

pub fn tokens(t: &[&str]) -> Vec<String> {
    t.iter().map(|s| s.to_string()).collect()
}

/// Comparable picture of a grid: (start, key, value, override kind) per node.
pub fn grid_snapshot(compositor: &Compositor) -> Vec<(usize, String, String, String)> {
    compositor
        .grid()
        .nodes()
        .map(|(start, n)| {
            (
                start,
                n.key().to_string(),
                n.value().to_string(),
                format!("{:?}", n.override_kind()),
            )
        })
        .collect()
}
