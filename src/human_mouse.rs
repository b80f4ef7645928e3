use enigo::MouseControllable;
use rand::Rng;
use std::time::Duration;

/// Points along a cubic Bézier from `from` to `to` with jittered control
/// points, so the pointer travels in a slight arc instead of a straight line.
/// The last point is always exactly `to`.
pub fn glide_path<R: Rng + ?Sized>(rng: &mut R, from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
    let (start_x, start_y) = from;
    let (end_x, end_y) = to;

    let control1_x = start_x + (end_x - start_x) / 3 + rng.gen_range(-20..=20);
    let control1_y = start_y + (end_y - start_y) / 3 + rng.gen_range(-20..=20);
    let control2_x = start_x + 2 * (end_x - start_x) / 3 + rng.gen_range(-20..=20);
    let control2_y = start_y + 2 * (end_y - start_y) / 3 + rng.gen_range(-20..=20);

    let dist = ((end_x - start_x) as f64).hypot((end_y - start_y) as f64);
    let steps = ((dist / 2.0) as i32).clamp(10, 50);

    let bezier = |t: f64, p0: i32, p1: i32, p2: i32, p3: i32| {
        (1.0 - t).powi(3) * p0 as f64
            + 3.0 * (1.0 - t).powi(2) * t * p1 as f64
            + 3.0 * (1.0 - t) * t.powi(2) * p2 as f64
            + t.powi(3) * p3 as f64
    };

    let mut path: Vec<(i32, i32)> = (1..steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            (
                bezier(t, start_x, control1_x, control2_x, end_x).round() as i32,
                bezier(t, start_y, control1_y, control2_y, end_y).round() as i32,
            )
        })
        .collect();
    path.push(to);
    path
}

/// Walk the pointer through `path`, pausing 5-15ms between points.
pub fn move_along<R: Rng + ?Sized>(enigo: &mut enigo::Enigo, rng: &mut R, path: &[(i32, i32)]) {
    for &(x, y) in path {
        enigo.mouse_move_to(x, y);
        std::thread::sleep(Duration::from_millis(rng.gen_range(5..=15)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_path_ends_on_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let path = glide_path(&mut rng, (0, 0), (640, 480));
        assert_eq!(path.last(), Some(&(640, 480)));
    }

    #[test]
    fn test_path_length_is_bounded() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(glide_path(&mut rng, (10, 10), (12, 10)).len(), 10);
        assert_eq!(glide_path(&mut rng, (0, 0), (2000, 2000)).len(), 50);
    }

    #[test]
    fn test_path_stays_near_segment() {
        // Control points jitter by at most 20px, so the curve stays close.
        let mut rng = StdRng::seed_from_u64(11);
        let path = glide_path(&mut rng, (100, 100), (400, 100));
        assert!(path.iter().all(|&(x, y)| (80..=420).contains(&x) && (y - 100).abs() <= 21));
    }
}
