//! Texture references and their resolution into backend texture handles.
//!
//! Decoding images and uploading them is someone else's job. A shape only
//! names its texture; a [`TextureProvider`] turns that name into a handle the
//! backend can bind, or reports that it is not ready yet.

use rustc_hash::FxHashMap;

/// Backend handle for a bindable texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A shape's reference to a texture image: a path, URL, or catalog key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef(String);

impl TextureRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextureRef {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

/// Resolves texture references for drawing.
///
/// `None` means "not available yet" (still loading, or unknown); the shape
/// draws untextured this frame and asks again next frame.
pub trait TextureProvider {
    fn resolve(&mut self, texture: &TextureRef) -> Option<TextureId>;
}

/// A provider with no textures at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTextures;

impl TextureProvider for NoTextures {
    fn resolve(&mut self, _texture: &TextureRef) -> Option<TextureId> {
        None
    }
}

/// A fixed table of already-uploaded textures.
#[derive(Clone, Debug, Default)]
pub struct StaticTextures {
    entries: FxHashMap<TextureRef, TextureId>,
    misses: u64,
}

impl StaticTextures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `texture` resolve to `id`.
    pub fn insert(&mut self, texture: TextureRef, id: TextureId) {
        self.entries.insert(texture, id);
    }

    /// How many lookups found nothing.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl TextureProvider for StaticTextures {
    fn resolve(&mut self, texture: &TextureRef) -> Option<TextureId> {
        let id = self.entries.get(texture).copied();
        if id.is_none() {
            self.misses += 1;
            tracing::trace!(texture = texture.as_str(), "texture not available");
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_textures_resolve() {
        let mut textures = StaticTextures::new();
        textures.insert(TextureRef::from("earth.png"), TextureId(3));
        assert_eq!(textures.resolve(&"earth.png".into()), Some(TextureId(3)));
        assert_eq!(textures.resolve(&"moon.png".into()), None);
        assert_eq!(textures.misses(), 1);
    }

    #[test]
    fn test_no_textures() {
        assert_eq!(NoTextures.resolve(&TextureRef::new("x")), None);
    }
}
