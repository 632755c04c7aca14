use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::structure::Transition;

/// A predicate over a single transition.
pub trait ArcSubExpression {
    fn evaluate(&self, transition: &Transition) -> bool;
}

impl<F> ArcSubExpression for F
where
    F: Fn(&Transition) -> bool,
{
    fn evaluate(&self, transition: &Transition) -> bool {
        self(transition)
    }
}

/// Conditions over a transition's [`ContextObject`](crate::net::ContextObject).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ContextCondition {
    True,
    False,
    Reads(String),
    Writes(String),
    Erases(String),
    HasContext(String),
    Not(Box<ContextCondition>),
    And(Box<ContextCondition>, Box<ContextCondition>),
    Or(Box<ContextCondition>, Box<ContextCondition>),
}

impl ContextCondition {
    pub fn not(self) -> Self {
        ContextCondition::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        ContextCondition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        ContextCondition::Or(Box::new(self), Box::new(other))
    }
}

impl ArcSubExpression for ContextCondition {
    fn evaluate(&self, transition: &Transition) -> bool {
        let context = &transition.context;
        match self {
            ContextCondition::True => true,
            ContextCondition::False => false,
            ContextCondition::Reads(label) => context.read.as_deref() == Some(label.as_str()),
            ContextCondition::Writes(label) => context.write.as_deref() == Some(label.as_str()),
            ContextCondition::Erases(label) => context.erase.as_deref() == Some(label.as_str()),
            ContextCondition::HasContext(tag) => context.context.iter().any(|t| t == tag),
            ContextCondition::Not(e) => !e.evaluate(transition),
            ContextCondition::And(e1, e2) => e1.evaluate(transition) && e2.evaluate(transition),
            ContextCondition::Or(e1, e2) => e1.evaluate(transition) || e2.evaluate(transition),
        }
    }
}

impl fmt::Display for ContextCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextCondition::True => write!(f, "T"),
            ContextCondition::False => write!(f, "⊥"),
            ContextCondition::Reads(l) => write!(f, "read({})", l),
            ContextCondition::Writes(l) => write!(f, "write({})", l),
            ContextCondition::Erases(l) => write!(f, "erase({})", l),
            ContextCondition::HasContext(t) => write!(f, "context({})", t),
            ContextCondition::Not(e) => write!(f, "¬{}", e),
            ContextCondition::And(e1, e2) => write!(f, "({} ∧ {})", e1, e2),
            ContextCondition::Or(e1, e2) => write!(f, "({} ∨ {})", e1, e2),
        }
    }
}
