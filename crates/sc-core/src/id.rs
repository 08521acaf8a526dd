//! Identifiers for everything a selection can point at.
//!
//! Three kinds of names share one id space:
//! - blocks, minted as `block_<uuid>`;
//! - inserted elements, minted as `el_<uuid>`;
//! - template element keys (`title`, `navItem-0`), which are fixed names
//!   scoped to their block.
//!
//! Ids loaded from a saved page keep whatever string they were saved with.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// What a minted id was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Block,
    Element,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Block => "block_",
            Self::Element => "el_",
        }
    }
}

/// Interned, `Copy` id of a block, an inserted element or a template
/// element key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// A new id that no saved page or other session can already hold.
    pub fn mint(kind: IdKind) -> Self {
        let uuid = uuid::Uuid::new_v4().simple();
        Self::intern(&format!("{}{uuid}", kind.prefix()))
    }

    /// Kind of a minted id. `None` for template keys and for ids that
    /// came from elsewhere (`"hero"` in a hand-written page).
    pub fn minted_kind(&self) -> Option<IdKind> {
        let s = self.as_str();
        [IdKind::Block, IdKind::Element]
            .into_iter()
            .find(|k| s.starts_with(k.prefix()))
    }

    /// The id for `s` if anything ever used that string. Lets a key typed
    /// by the host be checked against inserted elements without growing
    /// the interner.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(NodeId)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}
