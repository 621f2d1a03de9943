//! Best-model selection

/// Pick the candidate with the highest score.
///
/// Candidates are considered in order and a later one replaces the current
/// best only when its score is strictly greater, so ties go to the earliest
/// candidate. NaN scores never win. Returns `None` for an empty slice or when
/// every score is NaN.
pub fn select_best<I: Clone>(candidates: &[(I, f64)]) -> Option<I> {
    let mut best: Option<(&I, f64)> = None;
    for (id, score) in candidates {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if *score <= best_score => {}
            _ => best = Some((id, *score)),
        }
    }
    best.map(|(id, _)| id.clone())
}
