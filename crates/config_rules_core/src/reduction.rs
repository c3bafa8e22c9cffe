//! All-of reduction used to decide whether a parent resource is compliant.

/// True iff every item satisfies `predicate`. Stops at the first item that
/// does not, so later items are never inspected. An empty input is satisfied.
pub fn all_satisfy<T, E, I, P>(items: I, mut predicate: P) -> Result<bool, E>
where
    I: IntoIterator<Item = T>,
    P: FnMut(&T) -> Result<bool, E>,
{
    for item in items {
        if !predicate(&item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Two-level predicate: `item` passes when `satisfied_directly` holds, or else
/// when every child fetched for it passes `child_predicate`.
///
/// When `satisfied_directly` holds the children are never fetched or
/// inspected, so it decides the outcome for that item on its own.
pub fn satisfied_directly_or_by_children<T, C, E, D, F, P>(
    item: &T,
    satisfied_directly: D,
    fetch_children: F,
    child_predicate: P,
) -> Result<bool, E>
where
    D: Fn(&T) -> bool,
    F: FnOnce(&T) -> Result<Vec<C>, E>,
    P: Fn(&C) -> bool,
{
    if satisfied_directly(item) {
        return Ok(true);
    }

    let children = fetch_children(item)?;
    Ok(children.iter().all(child_predicate))
}
