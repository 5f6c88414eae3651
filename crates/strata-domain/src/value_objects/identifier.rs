//! Service identifiers
//!
//! A [`ServiceId`] is the key every record is stored and resolved under. It is
//! a closed set of variants rather than an open trait so that lookups stay a
//! plain hash-map probe.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::{HOST_CONTAINER_NAME, MASKED_ID_PREFIX};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
static NEXT_MASKED: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier object with no inherent value
///
/// Two tokens are equal only if one is a clone of the other; the optional
/// name is purely diagnostic.
#[derive(Clone)]
pub struct Token {
    id: u64,
    name: Option<Arc<str>>,
}

impl Token {
    /// Create an anonymous token
    pub fn new() -> Self {
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: None,
        }
    }

    /// Create a token carrying a diagnostic name
    pub fn named<S: AsRef<str>>(name: S) -> Self {
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: Some(Arc::from(name.as_ref())),
        }
    }

    /// Diagnostic name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Token({name})"),
            None => write!(f, "Token(#{})", self.id),
        }
    }
}

/// A Rust type used as an identifier
///
/// Compared by [`TypeId`]; the type name only shows up in diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag for the type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying [`TypeId`]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag names one of the reserved built-in types
    ///
    /// Built-ins carry no construction semantics, so they can only be
    /// provided by a factory or an explicit value.
    pub fn is_builtin(&self) -> bool {
        builtin_type_ids().contains(&self.id)
    }
}

fn builtin_type_ids() -> [TypeId; 19] {
    [
        TypeId::of::<String>(),
        TypeId::of::<&'static str>(),
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<()>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
    ]
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

/// Reserved identifiers that resolve without ever being stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualId {
    /// Resolves to the registry node performing the lookup
    HostContainer,
}

/// Internally generated identifier standing in for one multi-group entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskedId(u64);

impl MaskedId {
    /// Mint a process-unique masked identifier
    pub fn mint() -> Self {
        Self(NEXT_MASKED.fetch_add(1, Ordering::Relaxed))
    }

    /// Sequence number of this identifier
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Key used to register and resolve a service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceId {
    /// Plain string key
    Name(Arc<str>),
    /// Opaque token key
    Token(Token),
    /// Rust type used by identity
    Type(TypeTag),
    /// Reserved virtual identifier
    Virtual(VirtualId),
    /// Internal multi-group member
    Masked(MaskedId),
}

impl ServiceId {
    /// Identifier for the Rust type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeTag::of::<T>())
    }

    /// Identifier for a string key
    pub fn name<S: AsRef<str>>(name: S) -> Self {
        Self::Name(Arc::from(name.as_ref()))
    }

    /// The host-container virtual identifier
    pub fn host_container() -> Self {
        Self::Virtual(VirtualId::HostContainer)
    }

    /// Whether this identifier is virtual
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    /// Whether this identifier was minted for a multi-group
    pub fn is_masked(&self) -> bool {
        matches!(self, Self::Masked(_))
    }

    /// Whether this identifier may be used with `set_value`
    pub fn accepts_plain_value(&self) -> bool {
        matches!(self, Self::Name(_) | Self::Token(_))
    }

    /// Type tag when this identifier names a reserved built-in type
    pub fn builtin_type(&self) -> Option<&TypeTag> {
        match self {
            Self::Type(tag) if tag.is_builtin() => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "\"{name}\""),
            Self::Token(token) => write!(f, "{token:?}"),
            Self::Type(tag) => f.write_str(tag.name()),
            Self::Virtual(VirtualId::HostContainer) => f.write_str(HOST_CONTAINER_NAME),
            Self::Masked(masked) => write!(f, "{MASKED_ID_PREFIX}#{}", masked.0),
        }
    }
}

impl From<&str> for ServiceId {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<Token> for ServiceId {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<&Token> for ServiceId {
    fn from(token: &Token) -> Self {
        Self::Token(token.clone())
    }
}

impl From<TypeTag> for ServiceId {
    fn from(tag: TypeTag) -> Self {
        Self::Type(tag)
    }
}

impl From<VirtualId> for ServiceId {
    fn from(id: VirtualId) -> Self {
        Self::Virtual(id)
    }
}

impl From<MaskedId> for ServiceId {
    fn from(id: MaskedId) -> Self {
        Self::Masked(id)
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}
