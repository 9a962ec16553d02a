// Ratcliff/Obershelp similarity over chars: 2*M / (|a| + |b|), where M is the
// total length of the longest common block plus, recursively, the blocks found
// left and right of it. No junk heuristics are applied.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

// Longest common block in a[alo..ahi] x b[blo..bhi]; earliest wins on ties.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            cur[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            let k = cur[col];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_and_disjoint() {
        assert!(close(sequence_ratio("deep-set eyes", "deep-set eyes"), 1.0));
        assert!(close(sequence_ratio("abc", "xyz"), 0.0));
        assert!(close(sequence_ratio("", ""), 1.0));
        assert!(close(sequence_ratio("abc", ""), 0.0));
    }

    #[test]
    fn known_ratios() {
        // 2 * 3 / 8
        assert!(close(sequence_ratio("abcd", "bcde"), 0.75));
        // "ab" then "d" on the right: 2 * 3 / 8
        assert!(close(sequence_ratio("abxd", "abyd"), 0.75));
        // "ab" is the longest block and "c" falls outside it: 2 * 2 / 6
        assert!(close(sequence_ratio("abc", "cab"), 2.0 * 2.0 / 6.0));
    }

    #[test]
    fn misspelling_scores_above_default_threshold() {
        assert!(sequence_ratio("deep set eyes", "deep-set eyes") > 0.9);
        assert!(sequence_ratio("broad nasal bas", "broad nasal base") > 0.9);
        assert!(sequence_ratio("small ears", "broad nasal base") < 0.6);
    }
}
