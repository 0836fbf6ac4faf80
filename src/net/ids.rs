use std::fmt;

use crate::net::index_vec::Idx;

/// Dense positional handles. These index the declaration-order vectors inside
/// a model; the user-facing identity of a node is always its string id.
macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, stringify!($name))?;
                f.debug_tuple("").field(&self.0).finish()
            }
        }

        impl Idx for $name {
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_usize(idx: usize) -> Self {
                Self(idx as u32)
            }
        }
    };
}

define_idx!(
    /// Position of a place in the model's place list.
    PlaceIdx
);
define_idx!(
    /// Position of a transition in declaration order.
    TransitionIdx
);
define_idx!(ArcIdx);
