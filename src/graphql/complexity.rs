//! Query cost estimation
//!
//! A connection field costs `page size × cost of one node`. Connection
//! resolvers declare
//! `#[graphql(complexity = "estimate_cost(first, last, child_complexity)")]`
//! and the schema is built with `limit_complexity`, so an operation over the
//! budget is rejected during validation, before any resolver touches the
//! database.

/// Estimated cost of a connection field.
///
/// The page size is `max(first, last)` when both are given, whichever one is
/// given otherwise, and `1` when neither is. Negative sizes count as zero
/// here; the paginator rejects them when the field executes.
pub fn estimate_cost(first: Option<i32>, last: Option<i32>, child_complexity: usize) -> usize {
    let page_size = match (first, last) {
        (Some(first), Some(last)) => first.max(last),
        (Some(n), None) | (None, Some(n)) => n,
        (None, None) => 1,
    };

    usize::try_from(page_size)
        .unwrap_or(0)
        .saturating_mul(child_complexity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_only() {
        assert_eq!(estimate_cost(Some(5), None, 2), 10);
    }

    #[test]
    fn test_no_arguments_costs_one_node() {
        assert_eq!(estimate_cost(None, None, 7), 7);
    }

    #[test]
    fn test_larger_of_first_and_last() {
        assert_eq!(estimate_cost(Some(3), Some(8), 2), 16);
        assert_eq!(estimate_cost(Some(8), Some(3), 2), 16);
        assert_eq!(estimate_cost(None, Some(4), 3), 12);
    }

    #[test]
    fn test_negative_and_huge_sizes() {
        assert_eq!(estimate_cost(Some(-5), None, 3), 0);
        assert_eq!(estimate_cost(Some(i32::MAX), None, usize::MAX), usize::MAX);
    }
}
