//! 网的静态结构元素：库所、迁移、弧以及迁移上下文。
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::ids::NodeId;

pub type Weight = u64;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct Place {
    pub id: NodeId,
    pub name: String,
    pub markers: Weight,
}

impl Place {
    pub fn new(id: NodeId, name: impl Into<String>, markers: Weight) -> Self {
        Self {
            id,
            name: name.into(),
            markers,
        }
    }
}

/// Metadata carried by a transition.
///
/// `read` doubles as the label under which the transition is reported by the
/// parallel evaluator.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct ContextObject {
    #[serde(default)]
    pub read: Option<String>,
    #[serde(default)]
    pub write: Option<String>,
    #[serde(default)]
    pub erase: Option<String>,
    #[serde(default)]
    pub context: Vec<String>,
}

impl ContextObject {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn reading(read: impl Into<String>) -> Self {
        Self {
            read: Some(read.into()),
            ..Self::default()
        }
    }

    pub fn with_write(mut self, write: impl Into<String>) -> Self {
        self.write = Some(write.into());
        self
    }

    pub fn with_erase(mut self, erase: impl Into<String>) -> Self {
        self.erase = Some(erase.into());
        self
    }

    pub fn with_context(mut self, tag: impl Into<String>) -> Self {
        self.context.push(tag.into());
        self
    }

    pub fn label(&self) -> &str {
        self.read.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub context: ContextObject,
}

impl Transition {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            context: ContextObject::empty(),
        }
    }

    pub fn with_context(id: NodeId, name: impl Into<String>, context: ContextObject) -> Self {
        Self {
            id,
            name: name.into(),
            context,
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition")
            .field(&self.id)
            .field(&self.name)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum Node {
    Place(Place),
    Transition(Transition),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Place(place) => place.id,
            Node::Transition(transition) => transition.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Place(place) => &place.name,
            Node::Transition(transition) => &transition.name,
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Node::Place(place) => Some(place),
            Node::Transition(_) => None,
        }
    }

    pub fn as_place_mut(&mut self) -> Option<&mut Place> {
        match self {
            Node::Place(place) => Some(place),
            Node::Transition(_) => None,
        }
    }

    pub fn as_transition(&self) -> Option<&Transition> {
        match self {
            Node::Transition(transition) => Some(transition),
            Node::Place(_) => None,
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self, Node::Place(_))
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Node::Transition(_))
    }
}

impl From<Place> for Node {
    fn from(place: Place) -> Self {
        Node::Place(place)
    }
}

impl From<Transition> for Node {
    fn from(transition: Transition) -> Self {
        Node::Transition(transition)
    }
}

/// A directed arc between two nodes, referenced by id.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arc {
    pub source: NodeId,
    pub target: NodeId,
}

impl Arc {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

impl fmt::Debug for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arc({} -> {})", self.source, self.target)
    }
}
