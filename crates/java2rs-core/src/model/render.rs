// Source generation for the target item model
// Every model entity knows how to print itself; containers indent their
// children by one configured indentation unit.

use super::{Field, Item, ItemKind, Method, Module};

/// Trait for model entities that can generate their Rust source text
pub trait ToRust {
    fn to_rust(&self, indent: &str) -> String;
}

/// Prefix every non-empty line of `text` with `indent`
pub fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{` + indented body + `}`, or `{}` when there is nothing inside
pub fn braced(body: &str, indent: &str) -> String {
    if body.trim().is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n}}", indent_lines(body, indent))
    }
}

fn push_docs(out: &mut String, docs: &[String]) {
    for doc in docs {
        out.push_str(doc);
        out.push('\n');
    }
}

impl ToRust for Method {
    fn to_rust(&self, _indent: &str) -> String {
        let mut out = String::new();
        push_docs(&mut out, &self.docs);
        out.push_str(self.visibility.prefix());
        out.push_str("fn ");
        out.push_str(&self.name);
        out.push_str(&self.generics.bounded());

        let mut params: Vec<String> = Vec::new();
        if !self.is_static {
            if let Some(receiver) = self.receiver.as_param() {
                params.push(receiver.to_string());
            }
        }
        params.extend(self.params.iter().map(|p| format!("{}: {}", p.name, p.ty)));
        out.push('(');
        out.push_str(&params.join(", "));
        out.push(')');

        match self.error_type() {
            Some(error) => {
                let ok = self.return_type.as_deref().unwrap_or("()");
                out.push_str(&format!(
                    " -> Result<{ok}, {error}> /* throws {} */",
                    self.thrown.join(" | ")
                ));
            }
            None => {
                if let Some(ret) = &self.return_type {
                    out.push_str(" -> ");
                    out.push_str(ret);
                }
            }
        }

        match &self.body {
            Some(body) => {
                out.push(' ');
                out.push_str(body);
            }
            None => out.push(';'),
        }
        out
    }
}

/// Struct member line: `name: Type,` or `name: Type = init,`
impl ToRust for Field {
    fn to_rust(&self, _indent: &str) -> String {
        let mut out = String::new();
        push_docs(&mut out, &self.docs);
        out.push_str(self.visibility.prefix());
        out.push_str(&format!("{}: {}", self.name, self.ty));
        if let Some(init) = &self.init {
            out.push_str(&format!(" = {init}"));
        }
        out.push(',');
        out
    }
}

/// Associated constant line of an impl or trait block
fn const_item(field: &Field, in_trait: bool) -> String {
    let mut out = String::new();
    push_docs(&mut out, &field.docs);
    if !in_trait {
        out.push_str(field.visibility.prefix());
    }
    out.push_str(&format!("const {}: {}", field.name, field.ty));
    if let Some(init) = &field.init {
        out.push_str(&format!(" = {init}"));
    }
    out.push(';');
    out
}

impl Item {
    /// Constants then methods, separated by blank lines
    fn impl_members(&self, indent: &str) -> String {
        let mut parts = Vec::new();
        let consts: Vec<String> = self.static_fields().map(|f| const_item(f, false)).collect();
        if !consts.is_empty() {
            parts.push(consts.join("\n"));
        }
        parts.extend(self.methods.iter().map(|m| m.to_rust(indent)));
        parts.join("\n\n")
    }

    fn impl_block(&self, indent: &str) -> String {
        format!(
            "impl{} {}{} {}",
            self.generics.bounded(),
            self.name,
            self.generics.names(),
            braced(&self.impl_members(indent), indent)
        )
    }

    fn conformance_blocks(&self) -> Vec<String> {
        self.traits
            .iter()
            .map(|t| {
                format!(
                    "impl{} {t} for {}{} {{}}",
                    self.generics.bounded(),
                    self.name,
                    self.generics.names()
                )
            })
            .collect()
    }

    fn render_struct(&self, indent: &str) -> String {
        let mut out = String::new();
        push_docs(&mut out, &self.docs);
        let header = format!(
            "{}struct {}{}",
            self.visibility.prefix(),
            self.name,
            self.generics.names()
        );
        let mut members: Vec<String> = Vec::new();
        if let Some(base) = &self.base {
            members.push(format!("base: {base},"));
        }
        members.extend(self.instance_fields().map(|f| f.to_rust(indent)));
        if members.is_empty() {
            out.push_str(&header);
            out.push(';');
        } else {
            out.push_str(&header);
            out.push(' ');
            out.push_str(&braced(&members.join("\n"), indent));
        }

        let mut blocks = vec![out, self.impl_block(indent)];
        blocks.extend(self.conformance_blocks());
        blocks.join("\n\n")
    }

    fn render_enum(&self, indent: &str) -> String {
        let mut out = String::new();
        push_docs(&mut out, &self.docs);
        out.push_str(&format!(
            "{}enum {}{} ",
            self.visibility.prefix(),
            self.name,
            self.generics.names()
        ));
        let variants: Vec<String> = self
            .variants
            .iter()
            .map(|v| {
                let mut line = String::new();
                push_docs(&mut line, &v.docs);
                line.push_str(&v.name);
                line.push(',');
                if let Some(note) = &v.note {
                    line.push_str(&format!(" /* {note} */"));
                }
                line
            })
            .collect();
        out.push_str(&braced(&variants.join("\n"), indent));

        let mut blocks = vec![out];
        if !self.methods.is_empty() || self.static_fields().next().is_some() {
            blocks.push(self.impl_block(indent));
        }
        blocks.extend(self.conformance_blocks());
        blocks.join("\n\n")
    }

    fn render_trait(&self, indent: &str) -> String {
        let mut out = String::new();
        push_docs(&mut out, &self.docs);
        out.push_str(&format!(
            "{}trait {}{}",
            self.visibility.prefix(),
            self.name,
            self.generics.bounded()
        ));
        if !self.supertraits.is_empty() {
            out.push_str(": ");
            out.push_str(&self.supertraits.join(" + "));
        }
        out.push(' ');

        let mut parts = Vec::new();
        let consts: Vec<String> = self.static_fields().map(|f| const_item(f, true)).collect();
        if !consts.is_empty() {
            parts.push(consts.join("\n"));
        }
        parts.extend(self.methods.iter().map(|m| m.to_rust(indent)));
        out.push_str(&braced(&parts.join("\n\n"), indent));
        out
    }
}

impl ToRust for Item {
    fn to_rust(&self, indent: &str) -> String {
        match self.kind {
            ItemKind::Class | ItemKind::Record => self.render_struct(indent),
            ItemKind::Enum => self.render_enum(indent),
            ItemKind::Trait => self.render_trait(indent),
        }
    }
}

impl ToRust for Module {
    fn to_rust(&self, indent: &str) -> String {
        let mut sections = Vec::new();

        let mut header = Vec::new();
        if let Some(package) = &self.package {
            header.push(format!("// package {package};"));
        }
        header.extend(self.imports.iter().map(|i| format!("// import {i};")));
        if !header.is_empty() {
            sections.push(header.join("\n"));
        }
        if !self.docs.is_empty() {
            sections.push(self.docs.join("\n"));
        }
        if !self.submodules.is_empty() {
            let mods: Vec<String> = self
                .submodules
                .iter()
                .map(|m| format!("pub mod {m};"))
                .collect();
            sections.push(mods.join("\n"));
        }
        sections.extend(self.items.iter().map(|item| item.to_rust(indent)));

        if sections.is_empty() {
            return String::new();
        }
        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }
}
