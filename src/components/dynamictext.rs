use bevy_ecs::prelude::Component;

use crate::render::Color;

#[derive(Component, Clone, Debug)]
/// Text drawn with a bitmap font from the [`FontStore`](crate::resources::fontstore::FontStore).
pub struct DynamicText {
    /// The text content to render.
    pub content: String,
    /// Font key.
    pub font: String,
    pub color: Color,
}

impl DynamicText {
    pub fn new(content: impl Into<String>, font: impl Into<String>, color: Color) -> Self {
        Self {
            content: content.into(),
            font: font.into(),
            color,
        }
    }

    /// Updates the text content.
    pub fn set_content(&mut self, new_content: impl Into<String>) {
        self.content = new_content.into();
    }
}
