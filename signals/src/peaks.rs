//! Local extrema with a minimum-separation constraint.
//!
//! A peak is a sample strictly greater than its left neighbour and greater
//! than the first differing sample to its right. Flat tops count once, at
//! their midpoint (rounded down). The first and last samples are never
//! peaks.
//!
//! When two peaks sit closer than `distance` samples, the higher one is
//! kept; on equal height the later one wins. Selection runs from the
//! highest peak downwards, so a removed peak never suppresses others.

/// Indices of peaks in `values`, ascending.
pub fn find_peaks(values: &[f64], distance: usize) -> Vec<usize> {
    let candidates = local_maxima(values);
    if distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        values[candidates[b]]
            .total_cmp(&values[candidates[a]])
            .then(b.cmp(&a))
    });

    let mut keep = vec![true; candidates.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && candidates[j] - candidates[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }

        let mut k = j + 1;
        while k < candidates.len() && candidates[k] - candidates[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect()
}

/// Indices of troughs (peaks of the negated series), ascending.
pub fn find_troughs(values: &[f64], distance: usize) -> Vec<usize> {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    find_peaks(&negated, distance)
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}
