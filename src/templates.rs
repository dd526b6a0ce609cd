//! Garment components built from the edge constructors.
//!
//! A component adds its panels to a shared [`Pattern`], declares the seams
//! between them and exposes named interfaces for seams with other
//! components. Exposed interfaces are stored as panel interface names and
//! resolved on request, so they always reflect the current edge ids.

use nalgebra::{Rotation3, Vector3};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::debug;

use crate::config::DesignConfig;
use crate::edge::EdgeSequence;
use crate::error::{PatternError, Result};
use crate::factory::{self, DartByLen};
use crate::interface::Interface;
use crate::model::{Edge, EdgeId, PanelId, Vec2};
use crate::pattern::Pattern;
use crate::stitch::Stitches;

/// A named interface of one panel, optionally read in reverse.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfacePart {
    pub panel: PanelId,
    pub name: String,
    pub reversed: bool,
}

impl InterfacePart {
    pub fn new(panel: PanelId, name: &str) -> Self {
        InterfacePart { panel, name: name.to_string(), reversed: false }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Component {
    pub name: String,
    pub panels: Vec<PanelId>,
    pub stitches: Stitches,
    interfaces: BTreeMap<String, Vec<InterfacePart>>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            panels: Vec::new(),
            stitches: Stitches::new(),
            interfaces: BTreeMap::new(),
        }
    }

    pub fn expose(&mut self, name: impl Into<String>, parts: Vec<InterfacePart>) -> &mut Self {
        self.interfaces.insert(name.into(), parts);
        self
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Current edges of an exposed interface, parts concatenated in order.
    pub fn interface(&self, pattern: &Pattern, name: &str) -> Result<Interface> {
        let parts = self.interfaces.get(name).ok_or_else(|| PatternError::UnknownInterface {
            panel: self.name.clone(),
            name: name.to_string(),
        })?;
        let resolved = parts
            .iter()
            .map(|part| {
                let i = pattern.interface(part.panel, &part.name)?;
                Ok(if part.reversed { i.reversed() } else { i })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Interface::from_multiple(resolved))
    }
}

/// Ids of a chain appended at `offset` in a boundary.
fn id_range(offset: usize, len: usize) -> Vec<EdgeId> {
    (offset..offset + len).map(|i| EdgeId(i as u32)).collect()
}

/// One panel of a two-panel skirt, gathered at the waist.
///
/// Side seams are cut `bottom_cut` (fraction of `length`) above the hem so
/// only their upper part is stitched.
pub fn skirt_panel(
    pattern: &mut Pattern,
    name: &str,
    waist: f64,
    length: f64,
    ruffle: f64,
    bottom_cut: f64,
    flare: f64,
) -> Result<PanelId> {
    let top_width = waist / 2.0 * ruffle;
    let low_width = top_width + 2.0 * flare;
    let x_shift_top = flare;

    let right = if bottom_cut > 0.0 {
        factory::side_with_cut(Vec2::ZERO, Vec2::new(x_shift_top, length), bottom_cut, 0.0)?
    } else {
        EdgeSequence::single(Edge::line(Vec2::ZERO, Vec2::new(x_shift_top, length)))
    };
    let waist_edge = Edge::line(Vec2::new(x_shift_top, length), Vec2::new(x_shift_top + top_width, length));
    let left = if bottom_cut > 0.0 {
        factory::side_with_cut(waist_edge.end, Vec2::new(low_width, 0.0), 0.0, bottom_cut)?
    } else {
        EdgeSequence::single(Edge::line(waist_edge.end, Vec2::new(low_width, 0.0)))
    };
    let bottom = Edge::line(Vec2::new(low_width, 0.0), Vec2::ZERO);

    let right_ids = id_range(0, right.len());
    let waist_id = EdgeId(right.len() as u32);
    let left_ids = id_range(right.len() + 1, left.len());
    let bottom_id = EdgeId((right.len() + 1 + left.len()) as u32);

    let mut boundary = right;
    boundary.push(waist_edge).append(left).push(bottom);
    let id = pattern.add_panel(name, boundary)?;

    let panel = pattern.panel_mut(id)?;
    if let (Some(&r), Some(&l)) = (right_ids.last(), left_ids.first()) {
        panel.add_interface("right", &[r])?;
        panel.add_interface("left", &[l])?;
    }
    panel.set_interface("top", Interface::single(id, waist_id).with_ruffle(ruffle).reversed());
    panel.add_interface("bottom", &[bottom_id])?;
    panel.top_center_pivot();
    Ok(id)
}

/// Trapezoid panel of a many-panel skirt, pivot at its top left corner.
pub fn thin_skirt_panel(
    pattern: &mut Pattern,
    name: &str,
    top_width: f64,
    bottom_width: f64,
    length: f64,
) -> Result<PanelId> {
    let flare = (bottom_width - top_width) / 2.0;
    let boundary = factory::from_verts(
        &[
            Vec2::ZERO,
            Vec2::new(flare, length),
            Vec2::new(flare + top_width, length),
            Vec2::new(2.0 * flare + top_width, 0.0),
        ],
        true,
    )?;
    let id = pattern.add_panel(name, boundary)?;
    let panel = pattern.panel_mut(id)?;
    panel.set_pivot(Vec2::new(flare, length));
    for (name, edge) in [("right", 0), ("top", 1), ("left", 2), ("bottom", 3)] {
        panel.add_interface(name, &[EdgeId(edge)])?;
    }
    Ok(id)
}

/// Front or back panel of a pencil skirt with one waist dart.
///
/// Half of the hip to waist difference is taken in at the side seams, the
/// other half by the dart. Returns the panel and its dart legs.
pub fn pencil_panel(pattern: &mut Pattern, name: &str, config: &DesignConfig) -> Result<(PanelId, [EdgeId; 2])> {
    let body = &config.body;
    let design = &config.pencil_skirt;
    let hips = body.hips / 2.0;
    let waist = body.waist / 2.0;
    let shift = (hips - waist) / 4.0;
    let length = design.length * body.leg_length;
    let top = length + body.hips_line;
    let fit = pattern.tolerances().fit_residual;

    let mut boundary = EdgeSequence::single(Edge::line(Vec2::ZERO, Vec2::new(0.0, length)));
    boundary.push(factory::curve_from_tangents_within(
        Vec2::new(0.0, length),
        Vec2::new(shift, top),
        Some(Vec2::new(0.0, 1.0)),
        None,
        None,
        fit,
    )?);
    let darted = factory::side_with_dart_by_len_within(
        Vec2::new(shift, top),
        Vec2::new(hips - shift, top),
        &DartByLen {
            target_len: waist,
            depth: design.dart_depth * body.hips_line,
            position: waist / 2.0,
            dart_angle: design.dart_angle,
            right: true,
        },
        fit,
    )?;
    boundary.append(darted.into_side());
    boundary.push(factory::curve_from_tangents_within(
        Vec2::new(hips - shift, top),
        Vec2::new(hips, length),
        None,
        Some(Vec2::new(0.0, -1.0)),
        None,
        fit,
    )?);
    boundary.push(Edge::line(Vec2::new(hips, length), Vec2::new(hips, 0.0)));
    boundary.push(Edge::line(Vec2::new(hips, 0.0), Vec2::ZERO));

    let id = pattern.add_panel(name, boundary)?;
    let panel = pattern.panel_mut(id)?;
    panel.add_interface("right", &id_range(0, 2))?;
    panel.add_interface("top", &[EdgeId(2), EdgeId(5)])?;
    panel.add_interface("left", &id_range(6, 2))?;
    panel.add_interface("bottom", &[EdgeId(8)])?;
    panel.top_center_pivot();
    Ok((id, [EdgeId(3), EdgeId(4)]))
}

/// Front and back panels stitched at both sides.
pub fn skirt2(config: &DesignConfig, pattern: &mut Pattern) -> Result<Component> {
    let body = &config.body;
    let d = &config.skirt;
    let mut c = Component::new("Skirt2");
    for (name, z) in [("front", 25.0), ("back", -20.0)] {
        let id = skirt_panel(pattern, name, body.waist, d.length, d.ruffle, d.bottom_cut, d.flare)?;
        pattern.panel_mut(id)?.translate_to([0.0, body.waist_level, z]).center_x();
        c.panels.push(id);
    }
    let (front, back) = (c.panels[0], c.panels[1]);
    for side in ["right", "left"] {
        c.stitches.add(pattern.interface(front, side)?, pattern.interface(back, side)?);
    }
    c.expose("top_f", vec![InterfacePart::new(front, "top")])
        .expose("top_b", vec![InterfacePart::new(back, "top")])
        .expose("top", vec![InterfacePart::new(front, "top"), InterfacePart::new(back, "top")])
        .expose("bottom", vec![InterfacePart::new(front, "bottom"), InterfacePart::new(back, "bottom")]);
    Ok(c)
}

/// Flared skirt of `n_panels` identical panels arranged around the body.
pub fn skirt_many_panels(config: &DesignConfig, pattern: &mut Pattern) -> Result<Component> {
    let body = &config.body;
    let d = &config.flare_skirt;
    let n = d.n_panels as usize;
    let length = body.hips_line + d.length * body.leg_length;
    let flare_coeff = 1.0 + d.suns * length * 2.0 * PI / body.waist;
    let panel_w = body.waist / n as f64;
    // Distance of each panel's waist from the body axis so the waists close
    // into a regular polygon
    let apothem = panel_w / (2.0 * (PI / n as f64).tan());

    let mut c = Component::new(format!("SkirtManyPanels_{}", n));
    for i in 0..n {
        let id = thin_skirt_panel(pattern, &format!("panel_{}", i), panel_w, panel_w * flare_coeff, length)?;
        let angle = 360.0 * i as f64 / n as f64;
        let rot = Rotation3::from_euler_angles(0.0, angle.to_radians(), 0.0);
        let t = rot * Vector3::new(-panel_w / 2.0, body.waist_level, apothem);
        pattern.panel_mut(id)?.rotate_by(0.0, angle, 0.0).translate_to([t.x, t.y, t.z]);
        c.panels.push(id);
    }
    for i in 0..n {
        let (prev, next) = (c.panels[i], c.panels[(i + 1) % n]);
        c.stitches.add(pattern.interface(prev, "left")?, pattern.interface(next, "right")?);
    }
    let tops = c.panels.iter().map(|&p| InterfacePart::new(p, "top")).collect();
    c.expose("top", tops);
    debug!(panels = n, length, "many-panel skirt built");
    Ok(c)
}

/// Fitted two-panel skirt with waist darts.
pub fn pencil_skirt(config: &DesignConfig, pattern: &mut Pattern) -> Result<Component> {
    let body = &config.body;
    let mut c = Component::new("PencilSkirt");
    for (name, z) in [("skirt_f", 25.0), ("skirt_b", -20.0)] {
        let (id, legs) = pencil_panel(pattern, name, config)?;
        pattern.panel_mut(id)?.translate_to([0.0, body.waist_level, z]);
        let (a, b) = pattern.panel(id)?.dart_stitch(legs)?;
        c.stitches.add(a, b);
        c.panels.push(id);
    }
    let (front, back) = (c.panels[0], c.panels[1]);
    for side in ["right", "left"] {
        c.stitches.add(pattern.interface(front, side)?, pattern.interface(back, side)?);
    }
    c.expose("top_f", vec![InterfacePart::new(front, "top")])
        .expose("top_b", vec![InterfacePart::new(back, "top")])
        .expose("top", vec![InterfacePart::new(front, "top"), InterfacePart::new(back, "top").reversed()])
        .expose("bottom", vec![InterfacePart::new(front, "bottom"), InterfacePart::new(back, "bottom")]);
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DesignConfig {
        let mut c = DesignConfig::default();
        c.resolve().unwrap();
        c
    }

    #[test]
    fn skirt2_sides_pair_front_to_back() {
        let mut pattern = Pattern::new();
        let mut c = skirt2(&config(), &mut pattern).unwrap();
        assert_eq!(pattern.len(), 2);
        assert_eq!(c.stitches.len(), 2);
        let records = c.stitches.assembly(&mut pattern).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].a.panel, "front");
        assert_eq!(records[0].b.panel, "back");
        assert_eq!(c.interface(&pattern, "top").unwrap().len(), 2);
        assert!(c.interface(&pattern, "waistband").is_err());
    }

    #[test]
    fn bottom_cut_leaves_hem_part_unstitched() {
        let mut cfg = config();
        cfg.skirt.bottom_cut = 0.2;
        let mut pattern = Pattern::new();
        let c = skirt2(&cfg, &mut pattern).unwrap();
        let front = c.panels[0];
        assert_eq!(pattern.panel(front).unwrap().edge_count(), 6);
        let right = pattern.interface(front, "right").unwrap();
        let len = right.lengths(&pattern).unwrap()[0];
        let full = pattern.edge(front, EdgeId(0)).unwrap().length() + len;
        assert!((len / full - 0.8).abs() < 1e-9);
    }

    #[test]
    fn many_panel_waists_close_into_a_ring() {
        let cfg = config();
        let mut pattern = Pattern::new();
        let c = skirt_many_panels(&cfg, &mut pattern).unwrap();
        let n = c.panels.len();
        assert_eq!(n, cfg.flare_skirt.n_panels as usize);
        for i in 0..n {
            let (_, right_end) = pattern.interface(c.panels[i], "top").unwrap().corners_3d(&pattern).unwrap();
            let (next_start, _) = pattern.interface(c.panels[(i + 1) % n], "top").unwrap().corners_3d(&pattern).unwrap();
            assert!((right_end - next_start).norm() < 1e-9, "gap after panel {}", i);
            assert!((right_end.y - cfg.body.waist_level).abs() < 1e-9);
        }
    }

    #[test]
    fn pencil_panel_takes_in_the_waist() {
        let cfg = config();
        let mut pattern = Pattern::new();
        let (id, legs) = pencil_panel(&mut pattern, "p", &cfg).unwrap();
        let top: f64 = pattern.interface(id, "top").unwrap().lengths(&pattern).unwrap().iter().sum();
        assert!((top - cfg.body.waist / 2.0).abs() < 1e-3);
        let depth = cfg.pencil_skirt.dart_depth * cfg.body.hips_line;
        for leg in legs {
            assert!((pattern.edge(id, leg).unwrap().length() - depth).abs() < 1e-3);
        }
    }
}
