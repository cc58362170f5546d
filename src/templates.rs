//! Handlebars template registry
//!
//! Templates live in `views/` and partials in `views/partials/`; both are
//! embedded at compile time and registered once at startup, so a missing
//! or broken template fails the process before it ever accepts a request.

use std::path::Path;

use chrono::{Datelike, Local};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, TemplateError,
};
use rust_embed::RustEmbed;
use serde::Serialize;

pub const HOME_TEMPLATE: &str = "home";
pub const ABOUT_TEMPLATE: &str = "about";
pub const MAINTENANCE_TEMPLATE: &str = "maintenance";

const PARTIALS_DIR: &str = "partials/";
const TEMPLATE_EXT: &str = ".hbs";

#[derive(RustEmbed)]
#[folder = "views/"]
struct Views;

pub struct TemplateRegistry {
    hbs: Handlebars<'static>,
}

impl TemplateRegistry {
    pub fn new() -> Result<Self, TemplateError> {
        let mut hbs = Handlebars::new();

        for file in Views::iter() {
            let name = file.as_ref();
            if !name.ends_with(TEMPLATE_EXT) {
                continue;
            }

            let Some(asset) = Views::get(name) else {
                continue;
            };
            let source = String::from_utf8_lossy(&asset.data);

            let stem = Path::new(name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name);

            if name.starts_with(PARTIALS_DIR) {
                hbs.register_partial(stem, source.as_ref())?;
            } else {
                hbs.register_template_string(stem, source.as_ref())?;
            }
        }

        hbs.register_helper("current_year", Box::new(current_year));
        hbs.register_helper("scream_it", Box::new(scream_it));

        Ok(Self { hbs })
    }

    /// Render a registered template with the given context.
    pub fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<String, RenderError> {
        self.hbs.render(name, ctx)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.hbs.has_template(name)
    }
}

// {{current_year}} -> the current calendar year
fn current_year(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&Local::now().year().to_string())?;

    Ok(())
}

// {{scream_it text}} -> TEXT
fn scream_it(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("scream_it", 0))?;

    let text = param
        .value()
        .as_str()
        .ok_or(RenderErrorReason::InvalidParamType("string expected"))?;

    out.write(&text.to_uppercase())?;

    Ok(())
}
