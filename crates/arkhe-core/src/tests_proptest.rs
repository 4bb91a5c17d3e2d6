use proptest::prelude::*;

/// Property-based suite for the algebra and geometry invariants.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArkheConfig;
    use crate::projection::{project, Point3, ProjectionCamera};
    use crate::space::{AlgebraError, Role, SemanticVector, SemanticVectorSpace};
    use crate::torus::{ToroidalLayout, TorusGeometry};

    const OMEGA_MAX: f64 = 0.33;
    const DELTA_OMEGA_MAX: f64 = 0.10;

    fn coords() -> impl Strategy<Value = [f64; 3]> {
        prop::array::uniform3(-100.0f64..100.0)
    }

    prop_compose! {
        fn semantic_vector(id: &'static str)(
            coords in coords(),
            omega in 0.0..=OMEGA_MAX,
            phase in 0.0..std::f64::consts::TAU,
            c in 0.0f64..=1.0,
            f in 0.0f64..=1.0,
            satoshi in 0.0f64..1_000.0,
        ) -> SemanticVector {
            SemanticVector {
                id: id.to_string(),
                name: id.to_string(),
                role: Role::Node,
                coords,
                omega,
                phase,
                c,
                f,
                satoshi,
            }
        }
    }

    fn space(vectors: Vec<SemanticVector>) -> SemanticVectorSpace {
        SemanticVectorSpace::new(vectors, OMEGA_MAX, DELTA_OMEGA_MAX).unwrap()
    }

    // =========================================================================
    // Norm never exceeds Euclidean length
    // =========================================================================
    proptest! {
        #[test]
        fn norm_bounded_by_euclidean(v in semantic_vector("v")) {
            let s = space(vec![v.clone()]);
            prop_assert!(s.norm(&v) <= v.euclidean_norm() + 1e-9);
        }

        #[test]
        fn norm_equals_euclidean_when_fully_coherent(coords in coords()) {
            let v = SemanticVector {
                id: "v".to_string(),
                name: "v".to_string(),
                role: Role::Node,
                coords,
                omega: 0.1,
                phase: 0.0,
                c: 1.0,
                f: 0.0,
                satoshi: 0.0,
            };
            let s = space(vec![v.clone()]);
            prop_assert!((s.norm(&v) - v.euclidean_norm()).abs() < 1e-9);
        }

        #[test]
        fn norm_strictly_smaller_when_damped(
            mut v in semantic_vector("v"),
            c in 0.0f64..0.99,
        ) {
            prop_assume!(v.euclidean_norm() > 1e-3);
            v.c = c;
            let s = space(vec![v.clone()]);
            prop_assert!(s.norm(&v) < v.euclidean_norm());
        }
    }

    // =========================================================================
    // Inner product
    // =========================================================================
    proptest! {
        #[test]
        fn self_inner_product_is_dot_times_coherence(v in semantic_vector("v")) {
            let s = space(vec![v.clone()]);
            let ip = s.inner_product(&v, &v);
            let expected = v.dot(&v) * v.c;
            prop_assert!((ip.magnitude - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            prop_assert_eq!(ip.phase, 0.0);
        }

        #[test]
        fn inner_product_magnitude_is_symmetric(
            a in semantic_vector("a"),
            b in semantic_vector("b"),
        ) {
            let s = space(vec![a.clone(), b.clone()]);
            let ab = s.inner_product(&a, &b).magnitude;
            let ba = s.inner_product(&b, &a).magnitude;
            prop_assert!((ab - ba).abs() <= 1e-9 * ab.abs().max(1.0));
        }

        #[test]
        fn inner_product_vanishes_beyond_omega_gap(
            a in semantic_vector("a"),
            b in semantic_vector("b"),
        ) {
            prop_assume!((a.omega - b.omega).abs() >= DELTA_OMEGA_MAX);
            let s = space(vec![a.clone(), b.clone()]);
            prop_assert_eq!(s.inner_product(&a, &b).magnitude, 0.0);
        }
    }

    // =========================================================================
    // Gated addition
    // =========================================================================
    proptest! {
        #[test]
        fn add_gate_matches_omega_gap(
            a in semantic_vector("a"),
            b in semantic_vector("b"),
        ) {
            let s = space(vec![a.clone(), b.clone()]);
            let gap = (a.omega - b.omega).abs();
            match s.add(&a, &b) {
                Ok(_) => prop_assert!(gap < DELTA_OMEGA_MAX),
                Err(AlgebraError::IncompatibleOmega { delta, .. }) => {
                    prop_assert!(gap >= DELTA_OMEGA_MAX);
                    prop_assert_eq!(delta, gap);
                }
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
        }

        #[test]
        fn add_is_commutative_in_coords_and_satoshi(
            a in semantic_vector("a"),
            b in semantic_vector("b"),
        ) {
            prop_assume!((a.omega - b.omega).abs() < DELTA_OMEGA_MAX);
            let s = space(vec![a.clone(), b.clone()]);
            let ab = s.add(&a, &b).unwrap();
            let ba = s.add(&b, &a).unwrap();
            prop_assert_eq!(ab.coords, ba.coords);
            prop_assert_eq!(ab.satoshi, ba.satoshi);
            prop_assert_eq!(ab.c, a.c.min(b.c));
            prop_assert!(ab.omega >= 0.0 && ab.omega <= OMEGA_MAX);
        }

        #[test]
        fn sum_can_be_admitted_into_a_space(
            a in semantic_vector("a"),
            b in semantic_vector("b"),
        ) {
            prop_assume!((a.omega - b.omega).abs() < DELTA_OMEGA_MAX);
            let s = space(vec![a.clone(), b.clone()]);
            let sum = s.add(&a, &b).unwrap();
            prop_assert!(
                SemanticVectorSpace::new(vec![a, b, sum], OMEGA_MAX, DELTA_OMEGA_MAX).is_ok()
            );
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================
    proptest! {
        #[test]
        fn placement_on_torus_surface(
            v in semantic_vector("v"),
            offset in -10.0f64..10.0,
        ) {
            let cfg = ArkheConfig::default();
            let layout = ToroidalLayout::from_config(&cfg.torus, OMEGA_MAX);
            let p = layout.place_on_torus(&v, offset);
            let g = layout.geometry();
            let radial = p.x.hypot(p.y) - g.major_radius;
            let lhs = radial * radial + p.z * p.z;
            let rhs = g.minor_radius * g.minor_radius;
            prop_assert!((lhs - rhs).abs() < 1e-6 * rhs);
        }

        #[test]
        fn origin_projects_to_centre(
            tilt_x in -6.3f64..6.3,
            tilt_y in -6.3f64..6.3,
            fov in 50.0f64..2_000.0,
            distance in 0.0f64..2_000.0,
            user_scale in 0.1f64..10.0,
            width in 1u32..4_000,
            height in 1u32..4_000,
        ) {
            let camera = ProjectionCamera {
                fov,
                viewer_distance: distance,
                tilt_x,
                tilt_y,
                user_scale,
                viewport_width: width as f64,
                viewport_height: height as f64,
                spin: 0.0,
            };
            let p = project(&Point3::origin(), &camera);
            prop_assert!((p.x - width as f64 / 2.0).abs() < 1e-9);
            prop_assert!((p.y - height as f64 / 2.0).abs() < 1e-9);
        }

        #[test]
        fn wireframe_points_on_same_torus(
            major in 50.0f64..300.0,
            ratio in 0.05f64..0.95,
            offset in -3.0f64..3.0,
        ) {
            let layout = ToroidalLayout::new(TorusGeometry::new(major, major * ratio), OMEGA_MAX, 16);
            for ring in layout.wireframe_rings(5, 5, offset) {
                for p in &ring.points {
                    prop_assert!(layout.geometry().surface_residual(p).abs() < 1e-6 * major * major);
                }
            }
        }
    }
}
