pub mod model;
pub mod geometry {
    pub mod bezier;
    pub mod math;
    pub mod placement;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod minimize;
    pub mod refine;
}
pub mod config;
pub mod edge;
pub mod error;
pub mod factory;
pub mod interface;
pub mod panel;
pub mod pattern;
pub mod registry;
pub mod stitch;
pub mod templates;

pub use config::{DesignConfig, Tolerances};
pub use edge::EdgeSequence;
pub use error::{PatternError, Result};
pub use interface::{Interface, InterfaceEdge};
pub use model::{Edge, EdgeId, EdgeKind, GeometricId, PanelId, Vec2};
pub use panel::Panel;
pub use pattern::{EdgeSplit, Pattern};
pub use registry::{ComponentKind, Garment};
pub use stitch::{RuleState, StitchRecord, Stitches, StitchingRule};
pub use templates::Component;
