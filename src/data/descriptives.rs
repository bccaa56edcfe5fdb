use crate::domain::{DescriptiveStats, ModelArrays};

/// Respondent counts, non-traders and BVTT range of a set of arrays.
pub fn compute_descriptives(arrays: &ModelArrays) -> DescriptiveStats {
    let t = arrays.t();
    let accepts = arrays.accepts();

    let mut chosen_sum = 0.0;
    let mut chosen_n = 0usize;
    for (&b, &c) in arrays.bvtt().iter().zip(arrays.choice().iter()) {
        if c {
            chosen_sum += b;
            chosen_n += 1;
        }
    }

    DescriptiveStats {
        np: arrays.np(),
        t,
        nt_fast_exp: accepts.iter().filter(|&&a| a == t).count(),
        nt_cheap_slow: accepts.iter().filter(|&&a| a == 0).count(),
        chosen_bvtt_mean: if chosen_n > 0 { chosen_sum / chosen_n as f64 } else { f64::NAN },
        bvtt_min: arrays.bvtt().iter().copied().fold(f64::NAN, f64::min),
        bvtt_max: arrays.bvtt_max(),
    }
}
