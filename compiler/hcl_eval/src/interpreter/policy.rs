//! Run policies: what happens on error, and which blocks run at all.

use rustc_hash::FxHashSet;

/// How the interpreter reacts to a failed block.
///
/// Enum with query methods, so callers branch on intent (`collects_errors`)
/// rather than on a variant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorPolicy {
    /// Record the failure and continue with sibling blocks.
    #[default]
    BestEffort,
    /// Abort the whole run on the first failure.
    FailFast,
}

impl ErrorPolicy {
    /// Whether a failed block is recorded and its siblings still run.
    #[inline]
    pub fn collects_errors(self) -> bool {
        matches!(self, Self::BestEffort)
    }

    /// Whether the first failure ends the run.
    #[inline]
    pub fn aborts_on_error(self) -> bool {
        matches!(self, Self::FailFast)
    }
}

/// Which block types are executed.
///
/// A block is skipped when an allow-list is set and does not name its type, or
/// when its type is on the deny-list. The deny-list wins. Skipping applies at
/// every nesting level and a skipped block's subtree never runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockFilter {
    enabled: Option<FxHashSet<String>>,
    disabled: FxHashSet<String>,
}

impl BlockFilter {
    pub fn enable<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled
            .get_or_insert_with(FxHashSet::default)
            .extend(names.into_iter().map(Into::into));
    }

    pub fn disable<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
    }

    pub fn allows(&self, type_name: &str) -> bool {
        if self.disabled.contains(type_name) {
            return false;
        }
        self.enabled
            .as_ref()
            .map_or(true, |enabled| enabled.contains(type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_best_effort() {
        let policy = ErrorPolicy::default();
        assert!(policy.collects_errors());
        assert!(!policy.aborts_on_error());
        assert!(ErrorPolicy::FailFast.aborts_on_error());
    }

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = BlockFilter::default();
        assert!(filter.allows("anything"));
    }

    #[test]
    fn test_enable_list() {
        let mut filter = BlockFilter::default();
        filter.enable(["service"]);
        assert!(filter.allows("service"));
        assert!(!filter.allows("job"));
    }

    #[test]
    fn test_disable_wins_over_enable() {
        let mut filter = BlockFilter::default();
        filter.enable(["service", "job"]);
        filter.disable(["job"]);
        assert!(filter.allows("service"));
        assert!(!filter.allows("job"));
    }
}
