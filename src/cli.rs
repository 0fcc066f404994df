use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_resolution, Options, RenderPlacement};
use crate::game::{ColorDepthCategory, GameDescriptor, GameResolutionTier};
use crate::graphics::rescale::NATIVE_COORD_FILE_VERSION;

/// Folio adventure engine - display mode negotiation probe
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Folio adventure engine - display mode negotiation probe", long_about = None)]
pub struct Cli {
    /// Screen resolution (e.g., 640x480)
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    pub res: Option<String>,

    /// Run in a window instead of fullscreen
    #[arg(short, long)]
    pub windowed: bool,

    /// Graphics driver id (SDL2, Soft)
    #[arg(short = 'd', long, value_name = "DRIVER")]
    pub gfxdriver: Option<String>,

    /// Scaling filter (None, StdScale2..StdScale8, or max)
    #[arg(short, long, value_name = "FILTER")]
    pub filter: Option<String>,

    /// Frame placement (center, stretch, proportional, resize)
    #[arg(short, long, value_name = "MODE")]
    pub placement: Option<String>,

    /// Match the desktop aspect ratio in fullscreen
    #[arg(long)]
    pub matchratio: bool,

    /// Requested refresh rate in Hz
    #[arg(long, value_name = "HZ")]
    pub refresh: Option<i32>,

    /// Force a 16-bit display
    #[arg(long = "force16bit")]
    pub force_16bit: bool,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Game resolution tier to emulate
    #[arg(long, value_name = "TIER", default_value = "320x200")]
    pub game_res: String,

    /// Game color depth category in bits (8, 16, 32)
    #[arg(long, value_name = "BITS", default_value_t = 32)]
    pub game_depth: i32,
}

impl Cli {
    /// Fold the command line over configuration-file options.
    pub fn merge_into_options(&self, options: &mut Options) -> Result<()> {
        if let Some(res) = &self.res {
            options.screen_size = parse_resolution(res).context("Invalid --res value")?;
        }
        if self.windowed {
            options.windowed = true;
        }
        if let Some(driver) = &self.gfxdriver {
            options.driver_id = driver.clone();
        }
        if let Some(filter) = &self.filter {
            options.filter_id = Some(filter.clone());
        }
        if let Some(placement) = &self.placement {
            options.placement = RenderPlacement::parse(placement)?;
        }
        if self.matchratio {
            options.match_desktop_ratio = true;
        }
        if let Some(refresh) = self.refresh {
            options.refresh_rate = Some(refresh);
        }
        if self.force_16bit {
            options.force_16bit = true;
        }
        Ok(())
    }

    /// Build the game descriptor the probe pretends to have loaded.
    pub fn game_descriptor(&self) -> Result<GameDescriptor> {
        let tier = match self.game_res.as_str() {
            "320x200" => GameResolutionTier::R320x200,
            "320x240" => GameResolutionTier::R320x240,
            "640x400" => GameResolutionTier::R640x400,
            "640x480" => GameResolutionTier::R640x480,
            "800x600" => GameResolutionTier::R800x600,
            "1024x768" => GameResolutionTier::R1024x768,
            "custom" => GameResolutionTier::Custom,
            other => anyhow::bail!("Unknown game resolution tier '{}'", other),
        };
        let color_depth = match self.game_depth {
            8 => ColorDepthCategory::Palette,
            16 => ColorDepthCategory::HiColor,
            32 => ColorDepthCategory::TrueColor,
            other => anyhow::bail!("Unsupported game depth {} (use 8, 16 or 32)", other),
        };
        let mut game = GameDescriptor::new(tier, color_depth);
        game.file_version = NATIVE_COORD_FILE_VERSION;
        game.native_coordinates = true;
        Ok(game)
    }
}
