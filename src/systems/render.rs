//! Rendering system.
//!
//! [`render_pass`] draws every entity with a [`Sprite`] or [`DynamicText`]
//! and a [`MapPosition`] through whichever [`RenderBackend`] the game loop
//! built at startup. Items are ordered by [`ZIndex`] before drawing, and text
//! goes through the fonts of the [`FontStore`] so cached strings replay their
//! display lists.

use bevy_ecs::prelude::*;

use crate::components::animation::Animation;
use crate::components::dynamictext::DynamicText;
use crate::components::mapposition::MapPosition;
use crate::components::sprite::Sprite;
use crate::components::zindex::ZIndex;
use crate::error::EngineResult;
use crate::image::Image;
use crate::render::{Color, RenderBackend};
use crate::resources::fontstore::FontStore;
use crate::resources::texturestore::TextureStore;

enum DrawItem {
    Sprite {
        image: Image,
        rect: (f32, f32, f32, f32),
        tint: Color,
    },
    Text {
        font: String,
        content: String,
        x: f32,
        y: f32,
        color: Color,
    },
}

/// Draw every sprite and text entity of the world, back to front.
///
/// Sprites with an [`Animation`] draw its current frame; the others draw
/// their whole texture from the [`TextureStore`]. Draw order is by
/// [`ZIndex`] (missing counts as 0), ties keep query order. Pending batched
/// geometry is flushed at the end. Returns how many items were drawn.
pub fn render_pass(world: &mut World, renderer: &mut dyn RenderBackend) -> EngineResult<usize> {
    let mut items: Vec<(ZIndex, DrawItem)> = Vec::new();

    {
        let mut q = world.query::<(&Sprite, &MapPosition, Option<&ZIndex>, Option<&Animation>)>();
        let textures = world.get_resource::<TextureStore>();
        for (sprite, pos, z, anim) in q.iter(world) {
            let image = match anim {
                Some(anim) if anim.frame_count() > 0 => Some(*anim.current_image()?),
                _ => textures
                    .and_then(|t| t.get_plain(&sprite.tex_key))
                    .map(|tex| Image::new(*tex)),
            };
            let Some(image) = image else {
                log::trace!("No texture '{}' for sprite; skipped", sprite.tex_key);
                continue;
            };
            items.push((
                z.copied().unwrap_or_default(),
                DrawItem::Sprite {
                    image,
                    rect: sprite.dest_rect(pos.x, pos.y),
                    tint: sprite.tint,
                },
            ));
        }
    }

    {
        let mut q = world.query::<(&DynamicText, &MapPosition, Option<&ZIndex>)>();
        for (text, pos, z) in q.iter(world) {
            items.push((
                z.copied().unwrap_or_default(),
                DrawItem::Text {
                    font: text.font.clone(),
                    content: text.content.clone(),
                    x: pos.x,
                    y: pos.y,
                    color: text.color,
                },
            ));
        }
    }

    items.sort_by_key(|(z, _)| *z);

    let mut fonts = world.get_resource_mut::<FontStore>();
    let mut drawn = 0;
    for (_, item) in &items {
        match item {
            DrawItem::Sprite { image, rect, tint } => {
                let (x, y, w, h) = *rect;
                image.draw_sized(renderer, x, y, w, h, *tint)?;
                drawn += 1;
            }
            DrawItem::Text {
                font: font_key,
                content,
                x,
                y,
                color,
            } => {
                let Some(font) = fonts.as_mut().and_then(|f| FontStore::get_mut(f, font_key)) else {
                    log::warn!("Font '{}' not loaded; text skipped", font_key);
                    continue;
                };
                font.draw_string(renderer, *x, *y, content, *color)?;
                drawn += 1;
            }
        }
    }

    renderer.flush();
    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Texture;
    use crate::render::{DrawCommand, RecordingBackend};
    use crate::resources::texturestore::TextureFlags;

    fn world_with_textures() -> World {
        let mut world = World::new();
        let mut textures = TextureStore::new();
        textures.insert("back", TextureFlags::NONE, Texture::exact(1, 8, 8));
        textures.insert("front", TextureFlags::NONE, Texture::exact(2, 8, 8));
        world.insert_resource(textures);
        world
    }

    fn bound_textures(r: &RecordingBackend) -> Vec<u32> {
        r.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindTexture(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sprites_drawn_by_z() {
        let mut world = world_with_textures();
        world.spawn((Sprite::new("front", 8.0, 8.0), MapPosition::new(0.0, 0.0), ZIndex(5)));
        world.spawn((Sprite::new("back", 8.0, 8.0), MapPosition::new(0.0, 0.0), ZIndex(-1)));
        let mut r = RecordingBackend::new();
        assert_eq!(render_pass(&mut world, &mut r).unwrap(), 2);
        assert_eq!(bound_textures(&r), vec![1, 2]);
    }

    #[test]
    fn test_missing_texture_skipped() {
        let mut world = world_with_textures();
        world.spawn((Sprite::new("nowhere", 8.0, 8.0), MapPosition::new(0.0, 0.0)));
        let mut r = RecordingBackend::new();
        assert_eq!(render_pass(&mut world, &mut r).unwrap(), 0);
        assert!(r.commands().is_empty());
    }

    #[test]
    fn test_animation_frame_replaces_texture() {
        let mut world = world_with_textures();
        let frames = [Image::new(Texture::exact(10, 8, 8)), Image::new(Texture::exact(11, 8, 8))];
        let mut anim = Animation::from_images(&frames, 100).unwrap();
        anim.advance(150.0);
        world.spawn((Sprite::new("back", 8.0, 8.0), MapPosition::new(4.0, 4.0), anim));
        let mut r = RecordingBackend::new();
        render_pass(&mut world, &mut r).unwrap();
        assert_eq!(bound_textures(&r), vec![11]);
    }
}
