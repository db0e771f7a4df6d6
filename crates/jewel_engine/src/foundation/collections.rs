//! Specialized collection types and resource identities

use std::sync::atomic::{AtomicU64, Ordering};

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Stable key of a node inside a scene graph arena
    pub struct NodeKey;
}

/// Source of process-unique resource identities
///
/// Identities are never reused, so a stale handle can always be told apart
/// from the resource that replaced it.
static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Allocate a fresh, never-before-used identity
            pub fn fresh() -> Self {
                Self(next_resource_id())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

resource_id! {
    /// Identity of a geometry buffer
    GeometryId
}

resource_id! {
    /// Identity of a material object
    ///
    /// Two materials with the same id are the same GPU program binding; the
    /// renderer only rebuilds a shader program when a mesh's id changes.
    MaterialId
}

resource_id! {
    /// Identity of a GPU texture
    TextureId
}

resource_id! {
    /// Identity of a scene graph instance (source asset or clone)
    SceneId
}
