//! Template engine for rewrite replacements
//!
//! Replacement values are handlebars templates rendered against the flattened
//! dependency, e.g. `http://{{import}}`. Besides plain substitution a single
//! helper is available:
//!
//! `{{replace value pattern replacement}}` - regex substitution of every match
//! of `pattern` in `value`, with `$1`-style group references in `replacement`.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
};
use regex::Regex;

pub(crate) fn engine() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // Values are urls and paths, not html
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    handlebars.register_helper("replace", Box::new(replace_helper));
    handlebars
}

fn string_param<'a>(h: &'a Helper, idx: usize) -> Result<&'a str, RenderError> {
    h.param(idx)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| {
            RenderError::new(format!(
                "replace: expected string argument at position {}",
                idx + 1
            ))
        })
}

fn replace_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = string_param(h, 0)?;
    let pattern = string_param(h, 1)?;
    let replacement = string_param(h, 2)?;

    let regex = Regex::new(pattern).map_err(|e| {
        RenderError::new(format!("replace: invalid expression '{}': {}", pattern, e))
    })?;
    out.write(&regex.replace_all(value, replacement))?;
    Ok(())
}
