//! Name-driven material classification and description synthesis.

pub mod classify;
pub mod naming;
pub mod nodes;
pub mod sequence;
pub mod synth;

pub use classify::{classify, surface_traits, Classification, SurfaceTraits};
pub use naming::NamingMode;
pub use nodes::NodeLayout;
pub use sequence::{aggregate, Aggregation, AnimationSequence, SequenceIntegrityWarning, UnclassifiedFrame};
pub use synth::{
    synthesize, ImageLibrary, ImageRef, MaterialDescription, MaterialKind, ShadowMode, Subject, SynthError,
    TextureLibrary,
};
