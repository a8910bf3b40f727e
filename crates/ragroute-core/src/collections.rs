//! Static collection descriptors
//!
//! The set of collections is closed and fixed at compile time. Every routed
//! collection is a [`CollectionKey`], so an out-of-set key cannot exist.

use crate::error::{RagRouteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of a topical document collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKey {
    Products,
    Support,
    Finance,
}

impl CollectionKey {
    /// All keys in declaration order
    pub const ALL: [CollectionKey; 3] = [
        CollectionKey::Products,
        CollectionKey::Support,
        CollectionKey::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKey::Products => "products",
            CollectionKey::Support => "support",
            CollectionKey::Finance => "finance",
        }
    }

    /// Descriptor for this key
    pub fn descriptor(&self) -> &'static CollectionDescriptor {
        match self {
            CollectionKey::Products => &COLLECTIONS[0],
            CollectionKey::Support => &COLLECTIONS[1],
            CollectionKey::Finance => &COLLECTIONS[2],
        }
    }

    /// Name of the backing vector database collection
    pub fn collection_name(&self) -> &'static str {
        self.descriptor().collection_name
    }

    /// Exact, case-sensitive membership test used for classifier output
    pub fn from_exact(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKey {
    type Err = RagRouteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_exact(&s.trim().to_lowercase())
            .ok_or_else(|| RagRouteError::UnknownCollection(s.to_string()))
    }
}

/// Immutable description of one collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionDescriptor {
    pub key: CollectionKey,
    pub name: &'static str,
    pub description: &'static str,
    pub collection_name: &'static str,
}

/// Every collection known to the system
pub static COLLECTIONS: [CollectionDescriptor; 3] = [
    CollectionDescriptor {
        key: CollectionKey::Products,
        name: "Product Information",
        description: "Product details, specifications and features",
        collection_name: "products_collection",
    },
    CollectionDescriptor {
        key: CollectionKey::Support,
        name: "Customer Support & FAQ",
        description: "Customer support information, frequently asked questions and guides",
        collection_name: "support_collection",
    },
    CollectionDescriptor {
        key: CollectionKey::Finance,
        name: "Financial Information",
        description: "Financial data, revenue, costs and liabilities",
        collection_name: "finance_collection",
    },
];
