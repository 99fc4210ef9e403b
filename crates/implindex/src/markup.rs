//! Renders the human-readable `text` of an implementor record.

use std::fmt::Write;

use crate::contract::ContractPath;
use crate::decl::{DeclKind, GenericParam, ImplDecl, LinkRoot, ResolvedPath, TypeRef};

/// Renders `impl<..> Trait for Type` as HTML markup with links to each item.
pub fn render_impl(contract: &ContractPath, root: &LinkRoot, decl: &ImplDecl) -> String {
    let mut out = String::from("impl");
    render_generics(&mut out, &decl.generics);
    out.push(' ');

    let trait_path = ResolvedPath::new(contract.segments().to_vec(), DeclKind::Trait)
        .with_root(root.clone());
    render_link(&mut out, &trait_path);
    out.push_str(" for ");
    render_type(&mut out, &decl.for_type);
    out
}

fn render_generics(out: &mut String, generics: &[GenericParam]) {
    if generics.is_empty() {
        return;
    }
    out.push_str("&lt;");
    for (i, param) in generics.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&escape_html(&param.name));
        for (j, bound) in param.bounds.iter().enumerate() {
            out.push_str(if j == 0 { ": " } else { " + " });
            render_path(out, bound);
        }
    }
    out.push_str("&gt;");
}

fn render_type(out: &mut String, ty: &TypeRef) {
    match ty {
        TypeRef::Path(path) => render_path(out, path),
        TypeRef::Primitive(name) | TypeRef::Generic(name) => out.push_str(&escape_html(name)),
        TypeRef::Ref { mutable, inner } => {
            out.push_str(if *mutable { "&amp;mut " } else { "&amp;" });
            render_type(out, inner);
        }
        TypeRef::RawPointer { mutable, inner } => {
            out.push_str(if *mutable { "*mut " } else { "*const " });
            render_type(out, inner);
        }
        TypeRef::Tuple(types) => {
            out.push('(');
            render_list(out, types);
            out.push(')');
        }
        TypeRef::Slice(inner) => {
            out.push('[');
            render_type(out, inner);
            out.push(']');
        }
        TypeRef::Array { inner, len } => {
            out.push('[');
            render_type(out, inner);
            let _ = write!(out, "; {}]", escape_html(len));
        }
        TypeRef::TraitObject(bounds) => {
            out.push_str("dyn ");
            for (i, bound) in bounds.iter().enumerate() {
                if i > 0 {
                    out.push_str(" + ");
                }
                render_path(out, bound);
            }
        }
        TypeRef::Dangling(reference) => out.push_str(&escape_html(reference)),
        TypeRef::Opaque => out.push('_'),
    }
}

fn render_list(out: &mut String, types: &[TypeRef]) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_type(out, ty);
    }
}

fn render_path(out: &mut String, path: &ResolvedPath) {
    render_link(out, path);
    if !path.args.is_empty() {
        out.push_str("&lt;");
        render_list(out, &path.args);
        out.push_str("&gt;");
    }
}

fn render_link(out: &mut String, path: &ResolvedPath) {
    let name = escape_html(path.name());
    let Some(target) = href(path) else {
        out.push_str(&name);
        return;
    };
    let kind = path.kind.as_str();
    let _ = write!(
        out,
        r#"<a class="{kind}" href="{}" title="{kind} {}">{name}</a>"#,
        escape_html(&target),
        escape_html(&path.full()),
    );
}

/// `byteorder/enum.BigEndian.html`, prefixed with the root for remote items.
fn href(path: &ResolvedPath) -> Option<String> {
    let prefix = match &path.root {
        LinkRoot::Local => String::new(),
        LinkRoot::Remote(url) if url.ends_with('/') => url.clone(),
        LinkRoot::Remote(url) => format!("{url}/"),
        LinkRoot::Unknown => return None,
    };
    let (name, modules) = path.segments.split_last()?;
    let mut href = prefix;
    for module in modules {
        href.push_str(module);
        href.push('/');
    }
    let _ = write!(href, "{}.{name}.html", path.kind.as_str());
    Some(href)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
