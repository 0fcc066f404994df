//! Loaded game description: declared resolution tier, color depth category,
//! and the legacy data tables that are rescaled when old game files are
//! brought up to native coordinates.

use crate::graphics::Size;

/// Resolution tiers a game can declare in its header.
///
/// These correspond to the fixed set of resolutions supported by the classic
/// data format; `Custom` games take their size from the configured base size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameResolutionTier {
    #[default]
    Custom,
    R320x200,
    R320x240,
    R640x400,
    R640x480,
    R800x600,
    R1024x768,
}

impl GameResolutionTier {
    /// Whether the tier counts as a high-resolution game.
    #[must_use]
    pub fn is_hi_res(self) -> bool {
        matches!(
            self,
            Self::R640x400 | Self::R640x480 | Self::R800x600 | Self::R1024x768
        )
    }
}

/// Color depth category declared by the game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepthCategory {
    /// 256-color palette game; may never be promoted to hi-color.
    #[default]
    Palette,
    /// 16-bit hi-color game.
    HiColor,
    /// 32-bit true-color game.
    TrueColor,
}

/// Mouse cursor hotspot data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorInfo {
    pub hot_x: i32,
    pub hot_y: i32,
}

/// Inventory item hotspot data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryItemInfo {
    pub hot_x: i32,
    pub hot_y: i32,
}

/// A control placed on a GUI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuiControl {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub activated: bool,
}

/// A GUI definition from the game data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuiDef {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Y position the GUI pops up at.
    pub popup_y: i32,
    pub controls: Vec<GuiControl>,
}

/// Character placement data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterInfo {
    pub x: i32,
    pub y: i32,
}

/// Inventory window item display sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryWindowInfo {
    pub item_width: i32,
    pub item_height: i32,
}

/// Everything the graphics negotiation needs to know about the loaded game.
#[derive(Debug, Clone, Default)]
pub struct GameDescriptor {
    pub resolution_tier: GameResolutionTier,
    pub color_depth: ColorDepthCategory,
    /// Whether the game data was authored in native (unscaled) coordinates.
    pub native_coordinates: bool,
    /// Version of the game data file this descriptor was loaded from.
    pub file_version: i32,
    pub cursors: Vec<CursorInfo>,
    pub inventory_items: Vec<InventoryItemInfo>,
    pub guis: Vec<GuiDef>,
    pub characters: Vec<CharacterInfo>,
    pub inventory_windows: Vec<InventoryWindowInfo>,
}

impl GameDescriptor {
    /// Create a descriptor for a game at the given tier and depth category.
    #[must_use]
    pub fn new(resolution_tier: GameResolutionTier, color_depth: ColorDepthCategory) -> Self {
        Self {
            resolution_tier,
            color_depth,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_hi_res(&self) -> bool {
        self.resolution_tier.is_hi_res()
    }

    #[must_use]
    pub fn is_palette_game(&self) -> bool {
        self.color_depth == ColorDepthCategory::Palette
    }

    /// Declared size of the tier, or `None` for custom-resolution games.
    #[must_use]
    pub fn declared_size(&self) -> Option<Size> {
        match self.resolution_tier {
            GameResolutionTier::Custom => None,
            GameResolutionTier::R320x200 => Some(Size::new(320, 200)),
            GameResolutionTier::R320x240 => Some(Size::new(320, 240)),
            GameResolutionTier::R640x400 => Some(Size::new(640, 400)),
            GameResolutionTier::R640x480 => Some(Size::new(640, 480)),
            GameResolutionTier::R800x600 => Some(Size::new(800, 600)),
            GameResolutionTier::R1024x768 => Some(Size::new(1024, 768)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_hi_res() {
        assert!(!GameResolutionTier::R320x200.is_hi_res());
        assert!(!GameResolutionTier::R320x240.is_hi_res());
        assert!(!GameResolutionTier::Custom.is_hi_res());
        assert!(GameResolutionTier::R640x400.is_hi_res());
        assert!(GameResolutionTier::R1024x768.is_hi_res());
    }

    #[test]
    fn test_descriptor_defaults() {
        let game = GameDescriptor::default();
        assert_eq!(game.resolution_tier, GameResolutionTier::Custom);
        assert_eq!(game.color_depth, ColorDepthCategory::Palette);
        assert!(game.is_palette_game());
        assert!(!game.native_coordinates);
        assert!(game.cursors.is_empty());
    }

    #[test]
    fn test_declared_size() {
        let game = GameDescriptor::new(GameResolutionTier::R640x400, ColorDepthCategory::HiColor);
        assert_eq!(game.declared_size(), Some(Size::new(640, 400)));
        let custom = GameDescriptor::default();
        assert_eq!(custom.declared_size(), None);
    }
}
