//! Handlebars helpers producing Python source fragments

use handlebars::{Context, Handlebars, Helper, JsonRender, Output, RenderContext, RenderError};

/// Escape text for the inside of a `"""` string literal
///
/// Backslashes and triple quotes are escaped, as are quotes at the very end
/// that would otherwise merge with the closing delimiter.
pub fn escape_triple_quoted(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\");
    let body = escaped.trim_end_matches('"');
    let trailing = escaped.len() - body.len();
    let mut out = String::with_capacity(escaped.len() + trailing);
    out.push_str(&body.replace("\"\"\"", "\\\"\\\"\\\""));
    for _ in 0..trailing {
        out.push_str("\\\"");
    }
    out
}

/// Double-quoted Python string literal
pub fn string_literal(text: &str) -> String {
    // JSON string escapes are a subset of Python's
    serde_json::Value::String(text.to_string()).to_string()
}

/// Indent every non-blank line by `width` spaces; blank lines stay empty
pub fn indent_lines(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.trim_end_matches(['\n', '\r'])
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn py_str(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let param = h
        .param(0)
        .ok_or_else(|| RenderError::new("py_str helper requires exactly one parameter"))?;

    out.write(&string_literal(&param.value().render()))?;
    Ok(())
}

pub fn py_doc(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let param = h
        .param(0)
        .ok_or_else(|| RenderError::new("py_doc helper requires exactly one parameter"))?;

    out.write(&escape_triple_quoted(&param.value().render()))?;
    Ok(())
}

pub fn join(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let list = h
        .param(0)
        .ok_or_else(|| RenderError::new("join helper requires two parameters"))?;
    let separator = h
        .param(1)
        .ok_or_else(|| RenderError::new("join helper requires two parameters"))?;

    let items = list
        .value()
        .as_array()
        .ok_or_else(|| RenderError::new("join helper expects an array"))?;
    let joined = items
        .iter()
        .map(|item| item.render())
        .collect::<Vec<_>>()
        .join(&separator.value().render());

    out.write(&joined)?;
    Ok(())
}

pub fn indent(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let text = h
        .param(0)
        .ok_or_else(|| RenderError::new("indent helper requires two parameters"))?;
    let width = h
        .param(1)
        .and_then(|p| p.value().as_u64())
        .ok_or_else(|| RenderError::new("indent helper requires a numeric width"))?;

    out.write(&indent_lines(&text.value().render(), width as usize))?;
    Ok(())
}
