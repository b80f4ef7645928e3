use rand::Rng;
use std::f64::consts::TAU;

/// Pick a uniformly distributed point inside the disc of `radius` around
/// `(center_x, center_y)`.
///
/// The distance is `radius * sqrt(u)` so that density is uniform per unit of
/// area; a plain uniform distance would crowd samples near the center.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, center_x: i32, center_y: i32, radius: u32) -> (i32, i32) {
    if radius == 0 {
        return (center_x, center_y);
    }
    let r = radius as f64 * rng.gen::<f64>().sqrt();
    let theta = rng.gen_range(0.0..TAU);
    // Offsets truncate toward zero so the pixel never leaves the disc.
    let dx = (r * theta.cos()) as i32;
    let dy = (r * theta.sin()) as i32;
    (center_x.saturating_add(dx), center_y.saturating_add(dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dist(cx: i32, cy: i32, p: (i32, i32)) -> f64 {
        let (dx, dy) = ((p.0 - cx) as f64, (p.1 - cy) as f64);
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn test_extreme_center_saturates() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let (x, y) = sample(&mut rng, i32::MAX, i32::MIN, 10);
            assert!(x > i32::MAX - 10);
            assert!(y < i32::MIN + 10);
        }
    }

    #[test]
    fn test_zero_radius_returns_center() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(sample(&mut rng, 100, 100, 0), (100, 100));
            assert_eq!(sample(&mut rng, -7, 2999, 0), (-7, 2999));
        }
    }

    #[test]
    fn test_points_stay_inside_disc() {
        let mut rng = StdRng::seed_from_u64(7);
        for radius in [1u32, 5, 20, 500] {
            for _ in 0..2_000 {
                let p = sample(&mut rng, 1000, 800, radius);
                assert!(dist(1000, 800, p) <= radius as f64, "{p:?} outside r={radius}");
            }
        }
    }

    #[test]
    fn test_areal_uniformity() {
        // Within half the radius lies a quarter of the area.
        let mut rng = StdRng::seed_from_u64(42);
        let radius = 400u32;
        let n = 40_000;
        let inner = (0..n)
            .filter(|_| dist(0, 0, sample(&mut rng, 0, 0, radius)) <= radius as f64 / 2.0)
            .count();
        let frac = inner as f64 / n as f64;
        assert!((0.22..0.28).contains(&frac), "inner fraction {frac}");
    }

    #[test]
    fn test_thread_rng_is_reusable() {
        let mut rng = rand::thread_rng();
        let a: Vec<_> = (0..50).map(|_| sample(&mut rng, 50, 50, 30)).collect();
        assert!(a.iter().all(|p| dist(50, 50, *p) <= 30.0));
    }
}
