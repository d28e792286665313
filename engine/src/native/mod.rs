use crate::{channel::ChannelId, device::Purpose, error::Result};

pub type ChannelMap = Vec<ChannelId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `None` when the hint is usable in both directions.
    pub direction: Option<Purpose>,
}

/// A sample-rate bound as reported by the system. `dir` follows the ALSA
/// convention: negative means the real bound lies just below `rate`,
/// positive just above it, zero means exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateBound {
    pub rate: u32,
    pub dir: i32,
}

impl RateBound {
    pub fn exact(rate: u32) -> Self {
        Self { rate, dir: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PcmCaps {
    pub current_map: Option<ChannelMap>,
    pub offered_maps: Vec<ChannelMap>,
    pub rate_min: RateBound,
    pub rate_max: RateBound,
}

pub trait CardControl {
    fn card_name(&self) -> Result<String>;
    fn pcm_devices(&self) -> Result<Vec<u32>>;
    /// Name of the PCM device in the given direction, `None` when the device
    /// has no stream in that direction.
    fn pcm_name(&self, device: u32, purpose: Purpose) -> Result<Option<String>>;
}

pub trait SoundSystem: Send + 'static {
    type Control: CardControl;

    fn pcm_hints(&self) -> Result<Vec<Hint>>;
    fn cards(&self) -> Result<Vec<u32>>;
    /// Opens the control interface of a card, `None` when the card is gone.
    fn open_control(&self, card: u32) -> Result<Option<Self::Control>>;
    fn open_pcm(&self, name: &str, purpose: Purpose) -> Result<PcmCaps>;
    fn hw_channel_maps(&self, card: u32, device: u32, purpose: Purpose) -> Option<Vec<ChannelMap>>;
}

#[cfg(target_os = "linux")]
pub mod alsa;
