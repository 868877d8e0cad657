//! Name hashes and the name registry.
//!
//! Type names in TweakDB blobs are stored as 64-bit FNV-1a hashes
//! ([`CName`]). The [`NameRegistry`] maps hashes back to text. It is an
//! explicit handle: loaders borrow it for the duration of an operation
//! instead of reaching for process-wide state, and the host application
//! decides how long it lives and who shares it.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Type names the TweakDB format uses for its flat pools.
pub const BUILTIN_TYPE_NAMES: [&str; 21] = [
    "String",
    "Quaternion",
    "array:Bool",
    "array:CName",
    "array:Int32",
    "array:raRef:CResource",
    "array:Vector2",
    "array:String",
    "array:Float",
    "array:Vector3",
    "array:TweakDBID",
    "Vector3",
    "EulerAngles",
    "Vector2",
    "TweakDBID",
    "CName",
    "raRef:CResource",
    "gamedataLocKeyWrapper",
    "Float",
    "Int32",
    "Bool",
];

/// A hashed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct CName(u64);

impl CName {
    /// The empty name.
    pub const NONE: Self = Self(0);

    /// Hashes a name. The empty string maps to [`CName::NONE`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() {
            return Self::NONE;
        }
        let hash = name.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        });
        Self(hash)
    }

    /// Wraps a raw hash read from a blob.
    #[must_use]
    pub const fn from_hash(hash: u64) -> Self {
        Self(hash)
    }

    /// The raw hash.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the empty name.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Registry resolving [`CName`] hashes to their text.
///
/// All methods take `&self`; the registry is internally locked so one
/// instance can be shared by several loaders, including across threads.
///
/// ```rust
/// use cpsave_core::{CName, NameRegistry};
///
/// let names = NameRegistry::new();
/// let id = names.register_name("Vector3");
/// assert_eq!(id, CName::from_name("Vector3"));
/// assert_eq!(names.resolve(id).as_deref(), Some("Vector3"));
/// ```
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: RwLock<HashMap<CName, Option<Arc<str>>>>,
}

impl NameRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding [`BUILTIN_TYPE_NAMES`].
    #[must_use]
    pub fn with_builtin_types() -> Self {
        let registry = Self::new();
        for name in BUILTIN_TYPE_NAMES {
            registry.register_name(name);
        }
        registry
    }

    /// Registers `name` and returns its hash.
    ///
    /// Registering a name whose hash was previously seen anonymously attaches
    /// the text to it. If a different name already owns the hash the first
    /// one is kept.
    pub fn register_name(&self, name: &str) -> CName {
        let id = CName::from_name(name);
        let mut names = self.names.write();
        match names.get_mut(&id) {
            Some(Some(existing)) => {
                if existing.as_ref() != name {
                    tracing::warn!(%id, existing = %existing, name, "name hash collision");
                }
            }
            Some(slot) => *slot = Some(Arc::from(name)),
            None => {
                names.insert(id, Some(Arc::from(name)));
            }
        }
        id
    }

    /// Records a hash whose text is unknown.
    ///
    /// Returns true if the hash had not been seen before.
    pub fn register_id(&self, id: CName) -> bool {
        let mut names = self.names.write();
        if names.contains_key(&id) {
            return false;
        }
        names.insert(id, None);
        true
    }

    /// Resolves a hash to its text, if the text is known.
    #[must_use]
    pub fn resolve(&self, id: CName) -> Option<Arc<str>> {
        self.names.read().get(&id).cloned().flatten()
    }

    /// Resolves a hash to its text, or renders the hash.
    #[must_use]
    pub fn display_name(&self, id: CName) -> String {
        self.resolve(id)
            .map_or_else(|| id.to_string(), |name| name.to_string())
    }

    /// Whether the hash has been registered, named or not.
    #[must_use]
    pub fn contains(&self, id: CName) -> bool {
        self.names.read().contains_key(&id)
    }

    /// Number of registered hashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}
