//! Closed set of garment components selectable by name.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::config::DesignConfig;
use crate::error::{PatternError, Result};
use crate::pattern::Pattern;
use crate::stitch::StitchRecord;
use crate::templates::{self, Component};

/// Builds a component's panels into `pattern`.
pub type ComponentFn = fn(&DesignConfig, &mut Pattern) -> Result<Component>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Skirt2,
    SkirtManyPanels,
    PencilSkirt,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::Skirt2,
        ComponentKind::SkirtManyPanels,
        ComponentKind::PencilSkirt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Skirt2 => "Skirt2",
            ComponentKind::SkirtManyPanels => "SkirtManyPanels",
            ComponentKind::PencilSkirt => "PencilSkirt",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| PatternError::UnknownComponent { name: name.to_string() })
    }

    pub fn constructor(self) -> ComponentFn {
        match self {
            ComponentKind::Skirt2 => templates::skirt2,
            ComponentKind::SkirtManyPanels => templates::skirt_many_panels,
            ComponentKind::PencilSkirt => templates::pencil_skirt,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pattern together with the component that laid it out.
#[derive(Debug)]
pub struct Garment {
    pub pattern: Pattern,
    pub component: Component,
}

impl Garment {
    /// Build the component selected by `meta.bottom`.
    pub fn build(config: &DesignConfig) -> Result<Self> {
        let kind = match (config.bottom(), config.meta.bottom.as_deref()) {
            (Some(kind), _) => kind,
            (None, Some(name)) => ComponentKind::from_name(name)?,
            (None, None) => return Err(PatternError::config("meta.bottom", "no component selected")),
        };
        Self::build_kind(kind, config)
    }

    pub fn build_kind(kind: ComponentKind, config: &DesignConfig) -> Result<Self> {
        let mut pattern = Pattern::with_tolerances(config.tolerances);
        let component = (kind.constructor())(config, &mut pattern)?;
        info!(
            component = %kind,
            panels = pattern.len(),
            rules = component.stitches.len(),
            "garment built"
        );
        Ok(Garment { pattern, component })
    }

    /// Match every seam and emit the stitch list.
    pub fn assembly(&mut self) -> Result<Vec<StitchRecord>> {
        self.component.stitches.assembly(&mut self.pattern)
    }
}
