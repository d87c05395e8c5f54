//! Fuzzy filtering of small in-memory lists (events, members, announcements).

/// Score `query` against `text`: `None` unless every query character
/// appears in order. Higher is better; contiguous runs and matches at word
/// starts are rewarded, gaps are penalised.
pub fn fuzzy_score(query: &str, text: &str) -> Option<i64> {
    let query: Vec<char> = query.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    if query.is_empty() {
        return Some(0);
    }
    let text: Vec<char> = text.to_lowercase().chars().collect();

    let mut score = 0i64;
    let mut qi = 0;
    let mut last_match: Option<usize> = None;
    for (ti, &c) in text.iter().enumerate() {
        if qi == query.len() {
            break;
        }
        if c != query[qi] {
            continue;
        }
        score += 1;
        let word_start = ti == 0 || !text[ti - 1].is_alphanumeric();
        if word_start {
            score += 8;
        }
        match last_match {
            Some(prev) if prev + 1 == ti => score += 5,
            Some(prev) => score -= (ti - prev - 1).min(10) as i64,
            None => score -= ti.min(10) as i64,
        }
        last_match = Some(ti);
        qi += 1;
    }
    (qi == query.len()).then_some(score)
}

/// Items whose best field matches, best first. Ties keep list order; a
/// blank query returns everything unchanged.
pub fn fuzzy_search<'a, T, F>(items: &'a [T], query: &str, fields: F) -> Vec<&'a T>
where
    F: Fn(&T) -> Vec<&str>,
{
    if query.trim().is_empty() {
        return items.iter().collect();
    }
    let mut scored: Vec<(i64, usize, &T)> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            fields(item)
                .into_iter()
                .filter_map(|field| fuzzy_score(query, field))
                .max()
                .map(|score| (score, i, item))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, item)| item).collect()
}
