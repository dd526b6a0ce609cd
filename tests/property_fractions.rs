use proptest::prelude::*;

use seamline::factory;
use seamline::{Interface, Pattern, Stitches, Vec2};

/// Positive weights normalised into a partition of the unit interval.
fn fractions() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.05f64..1.0, 1..6).prop_map(|w| {
        let total: f64 = w.iter().sum();
        w.into_iter().map(|x| x / total).collect()
    })
}

fn strip(pattern: &mut Pattern, name: &str, fracs: &[f64], z: f64) -> Interface {
    let mut seq = factory::from_fractions(Vec2::new(0.0, 0.0), Vec2::new(30.0, 0.0), fracs).unwrap();
    let n = seq.len();
    let rest = [Vec2::new(30.0, 0.0), Vec2::new(30.0, 4.0), Vec2::new(0.0, 4.0), Vec2::new(0.0, 0.0)];
    seq.append(factory::from_verts(&rest, false).unwrap());
    let id = pattern.add_panel(name, seq).unwrap();
    pattern.panel_mut(id).unwrap().translate_to([0.0, 0.0, z]);
    Interface::new(id, &pattern.panel(id).unwrap().edge_ids()[..n])
}

proptest! {
    #[test]
    fn fractions_preserve_length(fracs in fractions(), len in 1.0f64..200.0) {
        let seq = factory::from_fractions(Vec2::new(0.0, 0.0), Vec2::new(len, 0.0), &fracs).unwrap();
        prop_assert_eq!(seq.len(), fracs.len());
        prop_assert!((seq.length() - len).abs() < 1e-9 * len);
        for (l, f) in seq.lengths().iter().zip(&fracs) {
            prop_assert!((l - f * len).abs() < 1e-9 * len);
        }
    }

    #[test]
    fn matched_seams_conserve_length(a in fractions(), b in fractions()) {
        let mut pattern = Pattern::new();
        let s1 = strip(&mut pattern, "a", &a, 0.0);
        let s2 = strip(&mut pattern, "b", &b, -3.0);
        let mut stitches = Stitches::new();
        stitches.add(s1, s2);
        let records = stitches.assembly(&mut pattern).unwrap();
        let (s1, s2) = stitches.rules()[0].sides();
        prop_assert_eq!(s1.len(), s2.len());
        prop_assert_eq!(records.len(), s1.len());
        prop_assert!(records.len() <= a.len() + b.len() - 1);
        for side in [s1, s2] {
            let total: f64 = side.lengths(&pattern).unwrap().iter().sum();
            prop_assert!((total - 30.0).abs() < 1e-9);
        }
        if a.len() != b.len() {
            let (l1, l2) = (s1.lengths(&pattern).unwrap(), s2.lengths(&pattern).unwrap());
            for (x, y) in l1.iter().zip(&l2) {
                prop_assert!((x - y).abs() <= 2.0 * pattern.tolerances().seam_match + 1e-9);
            }
        }
    }
}
