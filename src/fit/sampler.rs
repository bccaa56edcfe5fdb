use rand::Rng;

/// Synthesize a VTT sample of roughly `np` draws from a binned CDF.
///
/// Bin `i` (for `i >= 1`) spans `[grid[i-1], grid[i]]` and carries mass
/// `cdf[i] - cdf[i-1]`; it receives `round(mass·np)` uniform draws. Bins with
/// zero, negative or undefined mass receive none, and the total is not
/// reconciled to exactly `np`.
pub fn predicted_vtt<R: Rng + ?Sized>(cdf: &[f64], grid: &[f64], np: usize, rng: &mut R) -> Vec<f64> {
    let bins = cdf.len().min(grid.len());
    let mut out = Vec::with_capacity(np);
    for i in 1..bins {
        let mass = cdf[i] - cdf[i - 1];
        if !(mass > 0.0) {
            continue;
        }
        let draws = (mass * np as f64).round() as usize;
        let lo = grid[i - 1].min(grid[i]);
        let hi = grid[i - 1].max(grid[i]);
        out.extend((0..draws).map(|_| rng.gen_range(lo..=hi)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn draws_follow_bin_masses() {
        let mut rng = StdRng::seed_from_u64(11);
        let cdf = [0.0, 0.25, 0.25, 1.0];
        let grid = [0.0, 1.0, 2.0, 4.0];
        let sample = predicted_vtt(&cdf, &grid, 100, &mut rng);

        assert_eq!(sample.len(), 100);
        assert_eq!(sample.iter().filter(|&&v| v <= 1.0).count(), 25);
        assert!(sample[25..].iter().all(|&v| (2.0..=4.0).contains(&v)));
    }

    #[test]
    fn non_positive_masses_draw_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let sample = predicted_vtt(&[0.5, 0.4, f64::NAN], &[0.0, 1.0, 2.0], 50, &mut rng);
        assert!(sample.is_empty());
    }
}
