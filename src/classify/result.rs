use serde::Serialize;

/// Per-label confidence for one frame.
///
/// Values are normalized to [0, 1]. Labels keep the order they were
/// inserted in, which is what [`ClassConfidence::top`] breaks ties by.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassConfidence {
    entries: Vec<(String, f32)>,
}

impl ClassConfidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize neighbor vote counts by `k`
    pub fn from_votes<'a, I>(votes: I, k: usize) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut result = Self::new();
        for (label, count) in votes {
            result.set(label, count as f32 / k as f32);
        }
        result
    }

    pub fn set(&mut self, label: &str, confidence: f32) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = confidence,
            None => self.entries.push((label.to_string(), confidence)),
        }
    }

    /// Confidence for `label`; labels never seen read as 0.0
    pub fn get(&self, label: &str) -> f32 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(l, _)| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-confidence label, first inserted wins ties
    pub fn top(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for (label, c) in self.iter() {
            if best.map_or(true, |(_, b)| c > b) {
                best = Some((label, c));
            }
        }
        best
    }
}
