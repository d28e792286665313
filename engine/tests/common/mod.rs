#![allow(dead_code)]

use soundwatch_engine::{
    ChannelId, Error, Purpose, Result,
    native::{CardControl, ChannelMap, Hint, PcmCaps, RateBound, SoundSystem},
};
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, Default)]
pub struct FakePcm {
    pub device: u32,
    pub output: Option<String>,
    pub input: Option<String>,
    pub maps: Vec<ChannelMap>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeCard {
    pub index: u32,
    pub name: String,
    pub pcms: Vec<FakePcm>,
    pub gone: bool,
    pub open_error: Option<Error>,
    pub info_error: Option<Error>,
    pub devices_error: Option<Error>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub hints: Vec<Hint>,
    pub cards: Vec<FakeCard>,
    pub caps: HashMap<String, PcmCaps>,
    pub unopenable: HashSet<String>,
    pub sweeps: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSystem {
    pub state: Arc<Mutex<FakeState>>,
}

pub struct FakeControl {
    card: FakeCard,
}

pub fn hint(name: &str, description: &str, direction: Option<Purpose>) -> Hint {
    Hint {
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        direction,
    }
}

pub fn stereo_caps() -> PcmCaps {
    PcmCaps {
        current_map: Some(vec![ChannelId::FrontLeft, ChannelId::FrontRight]),
        offered_maps: vec![],
        rate_min: RateBound::exact(8_000),
        rate_max: RateBound::exact(192_000),
    }
}

impl FakeSystem {
    pub fn with_hints(hints: Vec<Hint>) -> Self {
        let system = Self::default();
        system.edit(|state| state.hints = hints);
        system
    }

    pub fn edit(&self, f: impl FnOnce(&mut FakeState)) {
        let mut state = self.state.lock().expect("fake state");
        f(&mut state);
    }

    pub fn sweeps(&self) -> usize {
        self.state.lock().expect("fake state").sweeps
    }
}

impl CardControl for FakeControl {
    fn card_name(&self) -> Result<String> {
        match &self.card.info_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.card.name.clone()),
        }
    }

    fn pcm_devices(&self) -> Result<Vec<u32>> {
        if let Some(e) = &self.card.devices_error {
            return Err(e.clone());
        }
        Ok(self.card.pcms.iter().map(|pcm| pcm.device).collect())
    }

    fn pcm_name(&self, device: u32, purpose: Purpose) -> Result<Option<String>> {
        let Some(pcm) = self.card.pcms.iter().find(|pcm| pcm.device == device) else {
            return Err(Error::SystemResources(format!("no pcm {device}")));
        };
        Ok(match purpose {
            Purpose::Output => pcm.output.clone(),
            Purpose::Input => pcm.input.clone(),
        })
    }
}

impl SoundSystem for FakeSystem {
    type Control = FakeControl;

    fn pcm_hints(&self) -> Result<Vec<Hint>> {
        let mut state = self.state.lock().expect("fake state");
        state.sweeps += 1;
        Ok(state.hints.clone())
    }

    fn cards(&self) -> Result<Vec<u32>> {
        let state = self.state.lock().expect("fake state");
        Ok(state.cards.iter().map(|card| card.index).collect())
    }

    fn open_control(&self, card: u32) -> Result<Option<FakeControl>> {
        let state = self.state.lock().expect("fake state");
        let Some(card) = state.cards.iter().find(|c| c.index == card) else {
            return Ok(None);
        };
        if let Some(e) = &card.open_error {
            return Err(e.clone());
        }
        if card.gone {
            return Ok(None);
        }
        Ok(Some(FakeControl { card: card.clone() }))
    }

    fn open_pcm(&self, name: &str, purpose: Purpose) -> Result<PcmCaps> {
        let state = self.state.lock().expect("fake state");
        if state.unopenable.contains(name) {
            return Err(Error::OpeningDevice(format!("{} {}", purpose.label(), name)));
        }
        Ok(state.caps.get(name).cloned().unwrap_or_else(stereo_caps))
    }

    fn hw_channel_maps(&self, card: u32, device: u32, _purpose: Purpose) -> Option<Vec<ChannelMap>> {
        let state = self.state.lock().expect("fake state");
        let maps = state
            .cards
            .iter()
            .find(|c| c.index == card)?
            .pcms
            .iter()
            .find(|pcm| pcm.device == device)?
            .maps
            .clone();
        (!maps.is_empty()).then_some(maps)
    }
}

/// A fresh, empty directory under the system temp dir, removed on drop.
pub struct TempDir {
    pub path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "soundwatch-{}-{}-{}",
            label,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn touch(&self, name: &str) {
        std::fs::write(self.path.join(name), b"").expect("create node");
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
