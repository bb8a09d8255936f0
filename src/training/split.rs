//! Stratified train/test split

use crate::pipeline::PipelineError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices for each side of a split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of held-out rows: `ceil(test_size * n)`
pub fn test_count(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Split row indices so both sides keep the label proportions.
///
/// The test side gets exactly [`test_count`] rows. Each class's share of
/// them is proportional to its frequency, with leftover rows going to the
/// classes with the largest fractional remainder.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<SplitIndices, PipelineError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_size must lie strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n = labels.len();
    let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        match label {
            0 | 1 => by_class[label as usize].push(i),
            other => return Err(PipelineError::InvalidLabel(other.to_string())),
        }
    }
    if by_class.iter().any(Vec::is_empty) {
        return Err(PipelineError::SingleClass);
    }

    let n_test = test_count(n, test_size);
    let n_train = n - n_test;
    if n_test < 2 || n_train < 2 {
        return Err(PipelineError::InvalidParameter(format!(
            "{} rows are too few for a {} train / {} test split",
            n, n_train, n_test
        )));
    }

    let allocation = allocate(n_test, [by_class[0].len(), by_class[1].len()]);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (indices, take) in by_class.iter_mut().zip(allocation) {
        indices.shuffle(&mut rng);
        test.extend_from_slice(&indices[..take]);
        train.extend_from_slice(&indices[take..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(SplitIndices { train, test })
}

/// Largest-remainder apportionment of `total` rows across class counts
fn allocate(total: usize, counts: [usize; 2]) -> [usize; 2] {
    let n: usize = counts.iter().sum();
    let exact = counts.map(|c| total as f64 * c as f64 / n as f64);
    let mut alloc = exact.map(|e| e.floor() as usize);

    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(counts[b].cmp(&counts[a]))
    });

    let mut left = total - alloc.iter().sum::<usize>();
    for &class in order.iter().cycle() {
        if left == 0 {
            break;
        }
        if alloc[class] < counts[class] {
            alloc[class] += 1;
            left -= 1;
        }
    }
    alloc
}
