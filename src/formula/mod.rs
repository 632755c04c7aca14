//! 并发迁移集合上的门限公式：是否存在一个并发集合，其中至少 `n` 个迁移满足条件。

pub mod expression;
pub mod parallel;

pub use expression::{ArcSubExpression, ContextCondition};
pub use parallel::n_parallel_transitions_with_condition;
