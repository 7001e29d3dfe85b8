use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "short" => Self::Short,
            "char" => Self::Char,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => return None,
        })
    }

    pub fn java_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Char => "char",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    pub fn rust_name(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Byte => "i8",
            Self::Short => "i16",
            Self::Char => "char",
            Self::Int => "i32",
            Self::Long => "i64",
            Self::Float => "f32",
            Self::Double => "f64",
        }
    }

    /// Wrapper class in `java.lang` boxing this primitive
    pub fn boxed_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Char => "Character",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        Some(match simple {
            "Boolean" => Self::Boolean,
            "Byte" => Self::Byte,
            "Short" => Self::Short,
            "Character" => Self::Char,
            "Integer" => Self::Int,
            "Long" => Self::Long,
            "Float" => Self::Float,
            "Double" => Self::Double,
            _ => return None,
        })
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

/// Type as written in the source, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Void,
    /// Simple or dotted name with type arguments
    Named { name: String, args: Vec<TypeRef> },
    Array { element: Box<TypeRef>, dims: usize },
    Wildcard { bound: Option<Box<TypeRef>>, is_super: bool },
    /// `var`
    Inferred,
    Unknown(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add array dimensions, merging with an existing array type
    pub fn with_extra_dims(self, extra: usize) -> Self {
        if extra == 0 {
            return self;
        }
        match self {
            TypeRef::Array { element, dims } => TypeRef::Array {
                element,
                dims: dims + extra,
            },
            other => TypeRef::Array {
                element: Box::new(other),
                dims: extra,
            },
        }
    }

    /// Number of array dimensions (0 for non-arrays)
    pub fn array_depth(&self) -> usize {
        match self {
            TypeRef::Array { dims, .. } => *dims,
            _ => 0,
        }
    }

    /// Element type of an array, or the type itself
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Array { element, .. } => element,
            other => other,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Last segment of a named type
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => name.rsplit('.').next(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    /// Java spelling, used inside symbol identifiers
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.java_name()),
            TypeRef::Void => f.write_str("void"),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
                    write!(f, "<{}>", args.join(","))?;
                }
                Ok(())
            }
            TypeRef::Array { element, dims } => {
                write!(f, "{element}")?;
                for _ in 0..*dims {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeRef::Wildcard { bound: None, .. } => f.write_str("?"),
            TypeRef::Wildcard {
                bound: Some(bound),
                is_super,
            } => {
                let keyword = if *is_super { "super" } else { "extends" };
                write!(f, "? {keyword} {bound}")
            }
            TypeRef::Inferred => f.write_str("var"),
            TypeRef::Unknown(text) => f.write_str(text),
        }
    }
}

/// Generic parameter with its bounds: `T extends A & B`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub bounds: Vec<TypeRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_dims_merge_into_existing_arrays() {
        let ty = TypeRef::Primitive(PrimitiveType::Int).with_extra_dims(1);
        let ty = ty.with_extra_dims(2);
        assert_eq!(ty.array_depth(), 3);
        assert_eq!(ty.to_string(), "int[][][]");
    }

    #[test]
    fn display_uses_java_spelling() {
        let ty = TypeRef::Named {
            name: "java.util.Map".into(),
            args: vec![TypeRef::named("String"), TypeRef::Primitive(PrimitiveType::Int)],
        };
        assert_eq!(ty.to_string(), "java.util.Map<String,int>");
        assert_eq!(ty.simple_name(), Some("Map"));
    }

    #[test]
    fn boxed_names_round_trip() {
        for p in [PrimitiveType::Int, PrimitiveType::Char, PrimitiveType::Double] {
            assert_eq!(PrimitiveType::from_boxed_name(p.boxed_name()), Some(p));
        }
        assert_eq!(PrimitiveType::from_boxed_name("java.lang.Long"), Some(PrimitiveType::Long));
    }
}
