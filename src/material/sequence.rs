use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classify::{classify, Classification, ANIMATION_MARKER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFrame {
    pub index: u8,
    /// Texture name as it appeared in the archive.
    pub name: String,
}

/// Recoverable problems with a sequence's frame numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceIntegrityWarning {
    /// No frame with index `missing`, although a later one exists.
    Gap {
        key: String,
        alternate: bool,
        missing: u8,
    },
    /// A second frame claimed `index`; `name` was dropped.
    Duplicate {
        key: String,
        alternate: bool,
        index: u8,
        name: String,
    },
}

impl SequenceIntegrityWarning {
    pub fn code(&self) -> &'static str {
        match self {
            SequenceIntegrityWarning::Gap { .. } => "SEQUENCE_GAP",
            SequenceIntegrityWarning::Duplicate { .. } => "SEQUENCE_DUPLICATE",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SequenceIntegrityWarning::Gap { key, .. } | SequenceIntegrityWarning::Duplicate { key, .. } => key,
        }
    }

    pub fn message(&self) -> String {
        let loop_name = |alternate: bool| if alternate { "alternate" } else { "primary" };
        match self {
            SequenceIntegrityWarning::Gap { key, alternate, missing } => format!(
                "sequence '{}' {} loop has no frame {}",
                key,
                loop_name(*alternate),
                missing
            ),
            SequenceIntegrityWarning::Duplicate {
                key,
                alternate,
                index,
                name,
            } => format!(
                "sequence '{}' {} loop repeats frame {}; '{}' ignored",
                key,
                loop_name(*alternate),
                index,
                name
            ),
        }
    }
}

/// A `+`-prefixed name that is not a valid frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclassifiedFrame {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSequence {
    pub key: String,
    pub frames: Vec<SequenceFrame>,
    pub alternate_frames: Vec<SequenceFrame>,
    pub warnings: Vec<SequenceIntegrityWarning>,
}

impl AnimationSequence {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            frames: Vec::new(),
            alternate_frames: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_alternate(&self) -> bool {
        !self.alternate_frames.is_empty()
    }

    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.frames
            .iter()
            .chain(self.alternate_frames.iter())
            .map(|f| f.name.as_str())
    }

    /// Frame shown first: primary frame 0, else the first alternate.
    pub fn lead_frame(&self) -> Option<&SequenceFrame> {
        self.frames.first().or_else(|| self.alternate_frames.first())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub sequences: BTreeMap<String, AnimationSequence>,
    pub unclassified: Vec<UnclassifiedFrame>,
}

impl Aggregation {
    pub fn warnings(&self) -> impl Iterator<Item = &SequenceIntegrityWarning> {
        self.sequences.values().flat_map(|s| s.warnings.iter())
    }
}

/// Sort one loop, drop repeats, report holes.
fn settle_loop(
    key: &str,
    alternate: bool,
    frames: &mut Vec<SequenceFrame>,
    warnings: &mut Vec<SequenceIntegrityWarning>,
) {
    frames.sort_by_key(|f| f.index);

    let mut kept: Vec<SequenceFrame> = Vec::with_capacity(frames.len());
    for frame in frames.drain(..) {
        match kept.last() {
            Some(last) if last.index == frame.index => {
                warnings.push(SequenceIntegrityWarning::Duplicate {
                    key: key.to_string(),
                    alternate,
                    index: frame.index,
                    name: frame.name,
                });
            }
            _ => kept.push(frame),
        }
    }

    let mut expected = 0u8;
    for frame in &kept {
        while expected < frame.index {
            warnings.push(SequenceIntegrityWarning::Gap {
                key: key.to_string(),
                alternate,
                missing: expected,
            });
            expected += 1;
        }
        expected = frame.index + 1;
    }

    *frames = kept;
}

/// Group the animated frames among `names` into sequences.
///
/// Non-frame names are ignored except for `+`-prefixed ones, which come back
/// as [`UnclassifiedFrame`]s.
pub fn aggregate<'a, I>(names: I) -> Aggregation
where
    I: IntoIterator<Item = &'a str>,
{
    let mut aggregation = Aggregation::default();

    for name in names {
        match classify(name) {
            Classification::AnimatedFrame {
                sequence_key,
                frame_index,
                is_alternate,
            } => {
                let sequence = aggregation
                    .sequences
                    .entry(sequence_key.clone())
                    .or_insert_with(|| AnimationSequence::new(&sequence_key));
                let frame = SequenceFrame {
                    index: frame_index,
                    name: name.to_string(),
                };
                if is_alternate {
                    sequence.alternate_frames.push(frame);
                } else {
                    sequence.frames.push(frame);
                }
            }
            _ if name.starts_with(ANIMATION_MARKER) => {
                aggregation.unclassified.push(UnclassifiedFrame {
                    name: name.to_string(),
                });
            }
            _ => {}
        }
    }

    for sequence in aggregation.sequences.values_mut() {
        let AnimationSequence {
            key,
            frames,
            alternate_frames,
            warnings,
        } = sequence;
        settle_loop(key, false, frames, warnings);
        settle_loop(key, true, alternate_frames, warnings);
        for warning in warnings.iter() {
            tracing::debug!(code = warning.code(), "{}", warning.message());
        }
    }

    aggregation
}
