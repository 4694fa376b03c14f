use serde::{Deserialize, Serialize};

/// Stable identifier of a composite type in the binary's type database.
///
/// `0` is reserved for anonymous or unresolved types.
pub type TypeOrdinal = u32;

/// Byte offset of a field within its owning composite type.
pub type FieldOffset = u64;

/// Flavor of a composite type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompositeKind {
    #[default]
    Struct,
    Union,
}

impl CompositeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            CompositeKind::Struct => "struct",
            CompositeKind::Union => "union",
        }
    }
}

/// Type reference attached to every expression node.
///
/// This mirrors what a decompiler hands out: enough structure to walk through
/// pointers to the composite being accessed, plus a spelling for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeRef {
    #[default]
    Void,
    Int {
        size: u32,
        #[serde(default)]
        signed: bool,
    },
    Float {
        size: u32,
    },
    Ptr {
        target: Box<TypeRef>,
    },
    Array {
        elem: Box<TypeRef>,
        #[serde(default)]
        len: Option<u64>,
    },
    Composite {
        name: String,
        /// `0` for forward-declared or stripped composites.
        #[serde(default)]
        ordinal: TypeOrdinal,
        #[serde(default)]
        kind: CompositeKind,
    },
    /// Typedef or otherwise unresolved named type.
    Named {
        name: String,
    },
    Func,
}

impl TypeRef {
    pub fn ptr(target: TypeRef) -> Self {
        TypeRef::Ptr { target: Box::new(target) }
    }

    pub fn structure(name: impl Into<String>, ordinal: TypeOrdinal) -> Self {
        TypeRef::Composite { name: name.into(), ordinal, kind: CompositeKind::Struct }
    }

    pub fn union(name: impl Into<String>, ordinal: TypeOrdinal) -> Self {
        TypeRef::Composite { name: name.into(), ordinal, kind: CompositeKind::Union }
    }

    pub fn int(size: u32) -> Self {
        TypeRef::Int { size, signed: true }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TypeRef::Composite { .. })
    }

    /// Ordinal of the composite this type names, `0` otherwise.
    pub fn ordinal(&self) -> TypeOrdinal {
        match self {
            TypeRef::Composite { ordinal, .. } => *ordinal,
            _ => 0,
        }
    }

    /// Type behind a pointer (or array element), if any.
    pub fn pointed_to(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Ptr { target } => Some(target),
            TypeRef::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// C spelling of the type, e.g. `struct Foo *`.
    pub fn display(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Int { size, signed } => {
                let base = match size {
                    1 => "char",
                    2 => "short",
                    4 => "int",
                    8 => "__int64",
                    _ => "_UNKNOWN",
                };
                if *signed {
                    base.to_string()
                } else {
                    format!("unsigned {base}")
                }
            }
            TypeRef::Float { size } => {
                if *size == 4 { "float".to_string() } else { "double".to_string() }
            }
            TypeRef::Ptr { target } => format!("{} *", target.display()),
            TypeRef::Array { elem, len } => match len {
                Some(n) => format!("{}[{n}]", elem.display()),
                None => format!("{}[]", elem.display()),
            },
            TypeRef::Composite { name, kind, .. } => format!("{} {name}", kind.keyword()),
            TypeRef::Named { name } => name.clone(),
            TypeRef::Func => "func".to_string(),
        }
    }

    /// Name to use when asking the type database for this type.
    ///
    /// Drops leading keywords such as `struct`.
    pub fn lookup_name(&self) -> String {
        let spelled = self.display();
        spelled.split_whitespace().last().unwrap_or_default().to_string()
    }
}

/// One member of a composite layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeMember {
    pub name: String,
    pub offset: FieldOffset,
    #[serde(default)]
    pub ty: TypeRef,
}

/// Layout of a composite type as recorded in the type database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeType {
    pub ordinal: TypeOrdinal,
    pub name: String,
    #[serde(default)]
    pub kind: CompositeKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub members: Vec<CompositeMember>,
}

impl CompositeType {
    pub fn member_named(&self, name: &str) -> Option<&CompositeMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_at(&self, offset: FieldOffset) -> Option<&CompositeMember> {
        self.members.iter().find(|m| m.offset == offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_name_strips_keyword() {
        let ty = TypeRef::structure("Player", 0);
        assert_eq!(ty.display(), "struct Player");
        assert_eq!(ty.lookup_name(), "Player");
        assert_eq!(TypeRef::Named { name: "PLAYER".into() }.lookup_name(), "PLAYER");
    }

    #[test]
    fn ordinal_is_zero_for_non_composites() {
        assert_eq!(TypeRef::int(4).ordinal(), 0);
        assert_eq!(TypeRef::ptr(TypeRef::structure("A", 7)).ordinal(), 0);
        assert_eq!(TypeRef::union("U", 9).ordinal(), 9);
    }

    #[test]
    fn pointed_to_walks_one_level() {
        let ty = TypeRef::ptr(TypeRef::structure("A", 3));
        assert_eq!(ty.pointed_to().map(TypeRef::ordinal), Some(3));
        assert!(TypeRef::Void.pointed_to().is_none());
    }
}
