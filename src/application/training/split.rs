use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices assigned to each side of a train/validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified shuffle split over 0/1 labels.
///
/// Each class contributes `round(n_class * valid_size)` rows to the
/// validation side, so both sides keep the overall positive rate. The same
/// labels and seed always produce the same split.
pub fn stratified_split(labels: &[u8], valid_size: f64, seed: u64) -> anyhow::Result<DatasetSplit> {
    if !(valid_size > 0.0 && valid_size < 1.0) {
        anyhow::bail!("valid_size must be in (0, 1), got {}", valid_size);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut validation = Vec::new();

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_valid = (members.len() as f64 * valid_size).round() as usize;
        validation.extend_from_slice(&members[..n_valid]);
        train.extend_from_slice(&members[n_valid..]);
    }

    // interleave classes so downstream consumers never see label-sorted rows
    train.shuffle(&mut rng);
    validation.shuffle(&mut rng);

    Ok(DatasetSplit { train, validation })
}
