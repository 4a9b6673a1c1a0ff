//! Break-point selection within segment text.
//!
//! Shared by the splitter (duration/character limits) and the silence
//! splitter in the VAD stage (apportioning text across a confirmed silence).
//! Candidates are punctuation boundaries ranked by proximity to the ideal
//! position, then whitespace boundaries; a split never lands inside a
//! word/character token. All positions are character indices into the text,
//! which callers are expected to have trimmed.

/// Sentence-terminal punctuation, Latin and CJK.
fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？' | '…')
}

/// Clause-break punctuation, Latin and CJK.
fn is_clause_break(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '，' | '、' | '；' | '：')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BreakKind {
    Sentence,
    Clause,
    Space,
}

/// All break candidates in `text`: a split position in characters plus the
/// strongest kind claiming it. A punctuation break lands after the mark; a
/// whitespace break lands before the whitespace run.
pub(crate) fn break_candidates(text: &str) -> Vec<(usize, BreakKind)> {
    let total = text.chars().count();
    let mut candidates: Vec<(usize, BreakKind)> = Vec::new();

    for (pos, c) in text.chars().enumerate() {
        let candidate = if is_sentence_end(c) {
            Some((pos + 1, BreakKind::Sentence))
        } else if is_clause_break(c) {
            Some((pos + 1, BreakKind::Clause))
        } else if c.is_whitespace() {
            Some((pos, BreakKind::Space))
        } else {
            None
        };

        if let Some((pos, kind)) = candidate {
            if pos == 0 || pos >= total {
                continue;
            }
            match candidates.last_mut() {
                // Same position claimed twice (e.g. ". "): keep the stronger kind.
                Some((last_pos, last_kind)) if *last_pos == pos => {
                    *last_kind = (*last_kind).min(kind);
                }
                _ => candidates.push((pos, kind)),
            }
        }
    }
    candidates
}

/// Chooses the split position nearest `ideal`.
///
/// Punctuation candidates win when one lies within `tolerance` characters of
/// the ideal point; otherwise the nearest whitespace anywhere in the text is
/// used. Returns `None` when the text has no valid break at all (a single
/// unbreakable token), or when every break would leave an empty side.
pub(crate) fn choose_break(text: &str, ideal: usize, tolerance: usize) -> Option<usize> {
    let candidates = break_candidates(text);

    let distance = |pos: usize| pos.abs_diff(ideal);
    let valid = |pos: &usize| {
        let (left, right) = split_at_char(text, *pos);
        !left.is_empty() && !right.is_empty()
    };

    let mut punctuation: Vec<usize> = candidates
        .iter()
        .filter(|(pos, kind)| *kind != BreakKind::Space && distance(*pos) <= tolerance)
        .map(|(pos, _)| *pos)
        .collect();
    // Nearest first; sentence marks were kept over clause marks at equal
    // positions, and ties on distance resolve to the earlier position.
    punctuation.sort_by_key(|pos| (distance(*pos), *pos));
    if let Some(pos) = punctuation.into_iter().find(|pos| valid(pos)) {
        return Some(pos);
    }

    let mut spaces: Vec<usize> = candidates
        .iter()
        .filter(|(_, kind)| *kind == BreakKind::Space)
        .map(|(pos, _)| *pos)
        .collect();
    spaces.sort_by_key(|pos| (distance(*pos), *pos));
    spaces.into_iter().find(|pos| valid(pos))
}

/// Splits `text` at a character position, trimming both halves.
pub(crate) fn split_at_char(text: &str, pos: usize) -> (String, String) {
    let byte = text
        .char_indices()
        .nth(pos)
        .map(|(b, _)| b)
        .unwrap_or(text.len());
    (
        text[..byte].trim().to_string(),
        text[byte..].trim().to_string(),
    )
}
