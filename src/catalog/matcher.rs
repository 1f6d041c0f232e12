use crate::catalog::index::{BezelId, CatalogIndex};
use crate::foundation::core::{Orientation, ScreenRect};

/// Scores closer than this are treated as ties.
pub const SCORE_EPSILON: f64 = 1e-6;

/// One scored catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCandidate {
    /// Entry identity.
    pub id: BezelId,
    /// Dissimilarity score, lower is better.
    pub score: f64,
    /// Whether the bezel orientation equals the screenshot orientation.
    pub orientation_match: bool,
}

/// Dissimilarity between a screen cutout and a `shot_w x shot_h` screenshot.
///
/// `2·|Δaspect| + |Δw|/sw + |Δh|/sh + |Δarea|/area`.
pub fn score_screen(screen: ScreenRect, shot_w: u32, shot_h: u32) -> f64 {
    let sw = f64::from(screen.width);
    let sh = f64::from(screen.height);
    let w = f64::from(shot_w);
    let h = f64::from(shot_h);

    let aspect_diff = (screen.aspect() - w / h).abs();
    let width_diff = (sw - w).abs() / sw;
    let height_diff = (sh - h).abs() / sh;
    let area_diff = (sw * sh - w * h).abs() / (sw * sh);
    aspect_diff * 2.0 + width_diff + height_diff + area_diff
}

/// Score every entry with a usable screen rectangle, in catalog order.
pub fn score_candidates(catalog: &CatalogIndex, shot_w: u32, shot_h: u32) -> Vec<MatchCandidate> {
    if shot_w == 0 || shot_h == 0 {
        return Vec::new();
    }
    let target = Orientation::of_dimensions(shot_w, shot_h);
    catalog
        .entries()
        .filter(|e| !e.screen.is_degenerate())
        .map(|e| MatchCandidate {
            id: e.id(),
            score: score_screen(e.screen, shot_w, shot_h),
            orientation_match: e.orientation == target,
        })
        .collect()
}

/// Pick the bezel that best fits a `shot_w x shot_h` screenshot.
///
/// Orientation-matching candidates win whenever any exist. Among near-equal scores the candidate
/// sharing the device, then color, then orientation of `current` is kept, so re-running the match
/// does not flip the selection on ties.
#[tracing::instrument(skip(catalog, current))]
pub fn find_best_match(
    catalog: &CatalogIndex,
    shot_w: u32,
    shot_h: u32,
    current: Option<&BezelId>,
) -> Option<BezelId> {
    let candidates = score_candidates(catalog, shot_w, shot_h);
    if candidates.is_empty() {
        return None;
    }

    let any_oriented = candidates.iter().any(|c| c.orientation_match);
    let pool = candidates
        .iter()
        .filter(|c| !any_oriented || c.orientation_match);

    let mut best: Option<&MatchCandidate> = None;
    for candidate in pool {
        let replace = match best {
            None => true,
            Some(b) => {
                candidate.score < b.score - SCORE_EPSILON
                    || ((candidate.score - b.score).abs() <= SCORE_EPSILON
                        && is_better_tie(candidate, b, current))
            }
        };
        if replace {
            best = Some(candidate);
        }
    }

    let best = best?;
    tracing::debug!(bezel = %best.id, score = best.score, "auto-matched bezel");
    Some(best.id.clone())
}

fn is_better_tie(candidate: &MatchCandidate, best: &MatchCandidate, current: Option<&BezelId>) -> bool {
    let Some(cur) = current else {
        return false;
    };
    if candidate.id.device == cur.device && best.id.device != cur.device {
        return true;
    }
    if candidate.id.color == cur.color && best.id.color != cur.color {
        return true;
    }
    candidate.id.orientation == cur.orientation && best.id.orientation != cur.orientation
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/matcher.rs"]
mod tests;
