use thiserror::Error;

/// Errors produced while configuring a [`BPlusTree`](crate::BPlusTree).
///
/// Lookups and deletions of missing keys are not errors; they are reported
/// through `Option` and `bool` return values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum OrderError {
    /// The requested branching factor cannot produce a valid split.
    #[error("order {order} is too small; a B+ tree needs an order of at least {min}", min = crate::Order::MIN)]
    TooSmall {
        /// The rejected order.
        order: usize,
    },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn too_small_display() {
        let err = OrderError::TooSmall { order: 2 };
        assert_eq!(err.to_string(), "order 2 is too small; a B+ tree needs an order of at least 3");
    }
}
