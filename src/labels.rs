use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

// One label per line, ILSVRC-2012 synset_words format. The whole line is the
// label, synset id included.
pub fn load_labels(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut labels = Vec::new();

    for line in reader.lines() {
        labels.push(line?);
    }

    Ok(labels)
}

// Indices of the k highest scores, descending. Lower index wins ties and NaN
// sorts last, so the ranking is deterministic for a fixed score vector.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();

    indices.sort_by(|&a, &b| {
        sort_key(scores[b])
            .partial_cmp(&sort_key(scores[a]))
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    indices.truncate(k);
    indices
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ranks_descending() {
        let scores = [0.1f32, 0.9, 0.3, 0.7, 0.5];
        assert_eq!(top_k_indices(&scores, 3), vec![1, 3, 4]);
    }

    #[test]
    fn lower_index_wins_ties() {
        let scores = [0.5f32, 0.9, 0.5, 0.9];
        assert_eq!(top_k_indices(&scores, 4), vec![1, 3, 0, 2]);
    }

    #[test]
    fn nan_ranks_last() {
        let scores = [f32::NAN, 0.2, 0.8];
        assert_eq!(top_k_indices(&scores, 3), vec![2, 1, 0]);
    }

    #[test]
    fn k_larger_than_input() {
        let scores = [0.3f32, 0.1];
        assert_eq!(top_k_indices(&scores, 5), vec![0, 1]);
    }

    #[test]
    fn loads_whole_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join("ncs_usb_oxidized_labels_test.txt");
        let mut file = File::create(&path).expect("create");
        writeln!(file, "n01440764 tench, Tinca tinca").expect("write");
        writeln!(file, "n01443537 goldfish, Carassius auratus").expect("write");
        drop(file);

        let labels = load_labels(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "n01440764 tench, Tinca tinca");
    }
}
