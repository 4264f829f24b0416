fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }

    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0usize; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }
    prev[b_len]
}

fn score(input: &str, candidate: &str) -> usize {
    let a = normalize_token(input);
    let b = normalize_token(candidate);
    if a.is_empty() || b.is_empty() {
        return usize::MAX;
    }
    if a == b {
        return 0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 1;
    }
    levenshtein(&a, &b)
}

fn max_distance(input: &str) -> usize {
    match normalize_token(input).len() {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        n => (n as f32 * 0.35).floor().max(3.0) as usize,
    }
}

pub fn suggest(input: &str, candidates: &[String], limit: usize) -> Vec<String> {
    if input.trim().is_empty() || candidates.is_empty() {
        return Vec::new();
    }
    let allowed = max_distance(input);

    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .map(|candidate| (score(input, candidate), candidate))
        .filter(|(distance, _)| *distance <= allowed)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut out: Vec<String> = Vec::new();
    for (_, candidate) in scored {
        if !out.contains(candidate) {
            out.push(candidate.clone());
        }
        if out.len() >= limit.max(1) {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<String> {
        ["linkedin", "indeed", "glassdoor", "search_jobs"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn suggests_close_match_for_typo() {
        assert_eq!(suggest("linkedn", &candidates(), 1), vec!["linkedin"]);
        assert_eq!(suggest("indead", &candidates(), 1), vec!["indeed"]);
    }

    #[test]
    fn returns_nothing_for_distant_input() {
        assert!(suggest("kubernetes", &candidates(), 3).is_empty());
        assert!(suggest("", &candidates(), 3).is_empty());
    }

    #[test]
    fn containment_counts_as_near_match() {
        assert_eq!(suggest("search_job", &candidates(), 1), vec!["search_jobs"]);
    }
}
