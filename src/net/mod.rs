//! # Petri 网核心定义（Place/Transition Net，弧权重恒为 1）
//!
//! 网由库所集合 `P`、迁移集合 `T` 与弧集合 `F ⊆ (P×T) ∪ (T×P)` 构成，
//! 每个库所携带非负标记数 `M(p)`。对任意迁移 `t`：
//!
//! * `t` **可发生** 当且仅当 `∀p ∈ •t: M(p) ≥ 1`；若 `•t` 为空则恒可发生；
//! * `t` **发生** 后 `M'(p) = M(p) - [p ∈ •t] + [p ∈ t•]`。
//!
//! 节点以 [`NodeId`] 为键存放在 arena 中，弧仅保存两端的 id。
//! [`PetriNet::deep_copy`] 即值拷贝，副本上的发生不会影响原网。
//!
//! ## 示例
//!
//! ```rust
//! use pn_step::net::*;
//!
//! let mut net = PetriNet::new();
//! let p0 = net.add_place("p0", 1);
//! let t0 = net.add_transition("t0", ContextObject::reading("t0"));
//! let p1 = net.add_place("p1", 0);
//!
//! net.add_arc(p0, t0).unwrap();
//! net.add_arc(t0, p1).unwrap();
//!
//! assert_eq!(net.enabled_transitions(), vec![t0]);
//! let mut next = net.deep_copy();
//! assert!(next.fire(t0));
//! assert_eq!(next.markers(p0), Some(0));
//! assert_eq!(next.markers(p1), Some(1));
//! assert_eq!(net.markers(p0), Some(1));
//! ```

pub mod core;
pub mod ids;
pub mod io;
pub mod structure;

pub use self::core::{DiagnosticReport, NetError, PetriNet};
pub use ids::{NodeId, StepId};
pub use structure::{Arc, ContextObject, Node, Place, Transition, Weight};
