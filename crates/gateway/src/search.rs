// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Paginated batch query execution.
//!
//! Pages overlap at the tail when issues change mid-scan, so results are
//! collected into a uniqueness set; paging stops as soon as a page comes
//! back short, which is the remote's signal that the results are
//! exhausted.

use crate::jira::{JiraApi, JiraResult};

/// Issue count requested when the caller gives none (or a non-positive
/// value).
pub const DEFAULT_QUERY_LIMIT: u32 = 200;

/// Result of a paged query.
#[derive(Debug, Default)]
pub struct QueryOutcome {
    /// Unique issue keys in first-seen order.
    pub keys: Vec<String>,
    /// Issues dropped because their project is ignored.
    pub ignored: u32,
    /// Pages fetched, for diagnostics.
    pub fetches: u32,
}

/// Run a JQL query page by page.
///
/// The page size is the configured batch size capped by `limit`. Issues
/// whose project `is_ignored` are counted but not returned.
pub fn run_paged_query(
    api: &dyn JiraApi,
    query: &str,
    limit: u32,
    batch_size: u32,
    is_ignored: impl Fn(&str) -> bool,
) -> JiraResult<QueryOutcome> {
    let limit = if limit > 0 { limit } else { DEFAULT_QUERY_LIMIT };
    let page_size = batch_size.min(limit).max(1);

    let mut outcome = QueryOutcome::default();
    let mut seen_so_far: u32 = 0;
    let mut last_page_len = page_size;

    while last_page_len == page_size {
        let page = api.search(query, page_size, seen_so_far)?;
        outcome.fetches += 1;
        last_page_len = page.issues.len() as u32;
        for issue in page.issues {
            seen_so_far += 1;
            if is_ignored(&issue.project_key) {
                outcome.ignored += 1;
                tracing::debug!("ignored issue: {}", issue.key);
                continue;
            }
            if !outcome.keys.contains(&issue.key) {
                outcome.keys.push(issue.key);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
