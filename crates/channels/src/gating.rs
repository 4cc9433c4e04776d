/// Check whether a user is on a group's ignore list.
///
/// Entries are matched case-insensitively against the user id and support
/// glob-style `*` wildcards (e.g. `5511*@c.us`). An empty list ignores nobody.
pub fn is_ignored(user_id: &str, ignored: &[String]) -> bool {
    let user_lower = user_id.to_lowercase();
    ignored.iter().any(|pattern| {
        let pat = pattern.to_lowercase();
        if pat.contains('*') {
            glob_match(&pat, &user_lower)
        } else {
            pat == user_lower
        }
    })
}

/// Participants to mention: everyone in the group except ignored users.
/// Order follows the participant list.
pub fn mention_targets(participants: &[String], ignored: &[String]) -> Vec<String> {
    participants
        .iter()
        .filter(|p| !is_ignored(p, ignored))
        .cloned()
        .collect()
}

/// Glob matching with `*` standing for any sequence of chars. The first
/// segment anchors at the start, the last at the end, and the ones between
/// match left to right in the remaining middle.
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(last) = parts.next_back() else {
        return pattern == text;
    };

    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last) {
        return false;
    }

    let mut middle = &text[first.len()..text.len() - last.len()];
    for part in parts.filter(|p| !p.is_empty()) {
        match middle.find(part) {
            Some(idx) => middle = &middle[idx + part.len()..],
            None => return false,
        }
    }
    true
}
