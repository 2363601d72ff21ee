//! Presentation - turning a composite result into markup

use crate::result::CompositeResult;

/// Renders a finished composite result
///
/// Rendering happens after a run succeeded; a failed run never reaches it.
pub trait PresentationRenderer {
    type Markup;
    type Error: std::fmt::Display;

    fn render(&mut self, result: &CompositeResult) -> Result<Self::Markup, Self::Error>;
}

/// Renders the composite result as a JSON value
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl PresentationRenderer for JsonRenderer {
    type Markup = serde_json::Value;
    type Error = serde_json::Error;

    fn render(&mut self, result: &CompositeResult) -> Result<Self::Markup, Self::Error> {
        serde_json::to_value(result)
    }
}
