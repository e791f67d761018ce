use serde::{Deserialize, Serialize};

use crate::material::sequence::SequenceIntegrityWarning;
use crate::material::SynthError;
use crate::wad::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    /// Something was left out of the import.
    Error,
    /// Imported, but not quite as authored.
    Warning,
    Info,
}

/// A recoverable problem met during an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    /// A lump could not be decoded and was skipped.
    Lump {
        source: String,
        index: usize,
        error: DecodeError,
    },
    /// Frame numbering problem in an animation sequence.
    Sequence {
        scope: String,
        warning: SequenceIntegrityWarning,
    },
    /// `+`-prefixed name that is not a frame; imported as a plain material.
    UnclassifiedFrame { scope: String, name: String },
    /// Source outside the base path; the short name was used.
    RelativeNameFallback { source: String, texture: String },
    /// A material could not be described.
    Material { name: String, error: SynthError },
}

impl ImportWarning {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ImportWarning::Lump { error, .. } => error.code(),
            ImportWarning::Sequence { warning, .. } => warning.code(),
            ImportWarning::UnclassifiedFrame { .. } => "SEQUENCE_UNCLASSIFIED",
            ImportWarning::RelativeNameFallback { .. } => "NAME_RELATIVE_FALLBACK",
            ImportWarning::Material { .. } => "MATERIAL_INCOMPLETE",
        }
    }

    pub fn severity(&self) -> WarningSeverity {
        match self {
            ImportWarning::Lump { .. } | ImportWarning::Material { .. } => WarningSeverity::Error,
            ImportWarning::Sequence { .. } | ImportWarning::RelativeNameFallback { .. } => {
                WarningSeverity::Warning
            }
            ImportWarning::UnclassifiedFrame { .. } => WarningSeverity::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ImportWarning::Lump { source, index, error } => {
                format!("{}: lump #{} skipped: {}", source, index, error)
            }
            ImportWarning::Sequence { scope, warning } if scope.is_empty() => warning.message(),
            ImportWarning::Sequence { scope, warning } => format!("{}: {}", scope, warning.message()),
            ImportWarning::UnclassifiedFrame { scope, name } => {
                format!("{}{} looks like an animation frame but is not one", scope, name)
            }
            ImportWarning::RelativeNameFallback { source, texture } => format!(
                "{} is not under the base path; '{}' keeps its short name",
                source, texture
            ),
            ImportWarning::Material { name, error } => format!("material '{}': {}", name, error),
        }
    }

    pub fn to_record(&self) -> WarningRecord {
        WarningRecord {
            code: self.code().to_string(),
            message: self.message(),
            severity: self.severity(),
        }
    }
}

/// Serializable form of an [`ImportWarning`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    /// Stable code, e.g. "LUMP_UNSUPPORTED".
    pub code: String,
    pub message: String,
    pub severity: WarningSeverity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lump_warning_record() {
        let warning = ImportWarning::Lump {
            source: "gfx.wad".to_string(),
            index: 3,
            error: DecodeError::UnsupportedLumpType {
                name: "odd".to_string(),
                tag: 0x43,
            },
        };
        let record = warning.to_record();
        assert_eq!(record.code, "LUMP_UNSUPPORTED");
        assert_eq!(record.severity, WarningSeverity::Error);
        assert_eq!(
            record.message,
            "gfx.wad: lump #3 skipped: lump 'odd' has unsupported type tag 0x43"
        );
    }

    #[test]
    fn sequence_warning_uses_its_code() {
        let warning = ImportWarning::Sequence {
            scope: String::new(),
            warning: SequenceIntegrityWarning::Gap {
                key: "lava".to_string(),
                alternate: false,
                missing: 1,
            },
        };
        assert_eq!(warning.code(), "SEQUENCE_GAP");
        assert_eq!(warning.message(), "sequence 'lava' primary loop has no frame 1");
        let json = serde_json::to_string(&warning.to_record()).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
