// Mapping of resolved Java types to Rust type text
use crate::ast::{NodeId, PrimitiveType, TypeRef};
use crate::resolve::{last_segment, Resolve, ResolvedType};

use super::Emitter;

/// Zero value of a primitive
pub fn primitive_default(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Boolean => "false",
        PrimitiveType::Char => "'\\0'",
        PrimitiveType::Float | PrimitiveType::Double => "0.0",
        PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Int | PrimitiveType::Long => "0",
    }
}

impl Emitter<'_, '_> {
    pub(crate) fn rust_type(&self, ty: &ResolvedType) -> String {
        match ty {
            ResolvedType::Primitive(p) => p.rust_name().to_string(),
            ResolvedType::Void => "()".to_string(),
            ResolvedType::Library { name, args } => {
                if ty.is_string() {
                    return "String".to_string();
                }
                if let Some(p) = ty.as_primitive() {
                    return p.rust_name().to_string();
                }
                format!("{}{}", last_segment(name), self.type_args(args))
            }
            ResolvedType::Declared { id, args } => {
                let name = self
                    .ctx
                    .registry
                    .display_type(id, self.module)
                    .unwrap_or_else(|| last_segment(id).to_string());
                format!("{name}{}", self.type_args(args))
            }
            ResolvedType::TypeVar(name) => name.clone(),
            ResolvedType::Array { element, dims } => {
                let mut text = self.rust_type(element);
                for _ in 0..*dims {
                    text = format!("Vec<{text}>");
                }
                text
            }
            ResolvedType::Unknown(name) if name.is_empty() => "/* unresolved */ _".to_string(),
            ResolvedType::Unknown(name) => format!("/* unresolved */ {name}"),
        }
    }

    fn type_args(&self, args: &[ResolvedType]) -> String {
        if args.is_empty() {
            return String::new();
        }
        let args: Vec<String> = args.iter().map(|a| self.rust_type(a)).collect();
        format!("<{}>", args.join(", "))
    }

    /// Resolve a written type at `node` and map it
    pub(crate) fn written_type(&self, node: NodeId, ty: &TypeRef) -> String {
        self.rust_type(&self.resolve_at(node, ty))
    }

    pub(crate) fn resolve_at(&self, node: NodeId, ty: &TypeRef) -> ResolvedType {
        self.ctx.index.resolve_type(self.site(node), ty)
    }

    /// Parameter type: primitive scalars by value, everything else borrowed
    pub(crate) fn param_type(&self, ty: &ResolvedType) -> String {
        if ty.is_primitive() || matches!(ty, ResolvedType::TypeVar(_)) {
            self.rust_type(ty)
        } else {
            format!("&{}", self.rust_type(ty))
        }
    }

    /// Default element value: zero, `false`, or the absent-value sentinel
    pub(crate) fn default_value(&self, ty: &ResolvedType) -> String {
        match ty.as_primitive() {
            Some(p) if ty.is_primitive() => primitive_default(p).to_string(),
            _ => "None".to_string(),
        }
    }

    /// Name a type is reached by in a `Type::member` path
    pub(crate) fn type_path(&self, ty: &ResolvedType) -> String {
        match ty {
            ResolvedType::Library { name, .. } => match ty.as_primitive() {
                Some(p) => p.rust_name().to_string(),
                None => last_segment(name).to_string(),
            },
            ResolvedType::Declared { id, .. } => self
                .ctx
                .registry
                .display_type(id, self.module)
                .unwrap_or_else(|| last_segment(id).to_string()),
            other => self.rust_type(other),
        }
    }
}
