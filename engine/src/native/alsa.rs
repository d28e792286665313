use crate::{
    channel::from_alsa_position,
    device::Purpose,
    error::{Error, Result},
    native::{CardControl, ChannelMap, Hint, PcmCaps, RateBound, SoundSystem},
};
use alsa::{Direction, card, device_name::HintIter};
use alsa_sys as sys;
use nix::libc;
use std::{
    ffi::{CStr, CString},
    os::raw::{c_int, c_uint},
    ptr,
};

fn stream(purpose: Purpose) -> sys::snd_pcm_stream_t {
    match purpose {
        Purpose::Output => sys::SND_PCM_STREAM_PLAYBACK,
        Purpose::Input => sys::SND_PCM_STREAM_CAPTURE,
    }
}

fn purpose(direction: Direction) -> Purpose {
    match direction {
        Direction::Playback => Purpose::Output,
        Direction::Capture => Purpose::Input,
    }
}

fn check(func: &'static str, rc: c_int) -> std::result::Result<c_int, alsa::Error> {
    if rc < 0 {
        Err(alsa::Error::new(func, -rc))
    } else {
        Ok(rc)
    }
}

fn system_error(what: &str, err: alsa::Error) -> Error {
    if err.errno() == libc::ENOMEM {
        Error::NoMemory
    } else {
        Error::SystemResources(format!("{what}: {err}"))
    }
}

fn open_error(what: &str, err: alsa::Error) -> Error {
    if err.errno() == libc::ENOMEM {
        Error::NoMemory
    } else {
        Error::OpeningDevice(format!("{what}: {err}"))
    }
}

fn c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::OpeningDevice(format!("invalid device name {name:?}")))
}

fn owned_str(s: *const libc::c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
}

/// Heap objects from the `*_malloc` family, freed on drop.
macro_rules! alsa_object {
    ($name:ident, $raw:ty, $malloc:ident, $free:ident) => {
        struct $name(*mut $raw);

        impl $name {
            fn new() -> Result<Self> {
                let mut raw = ptr::null_mut();
                check(stringify!($malloc), unsafe { sys::$malloc(&mut raw) })
                    .map_err(|_| Error::NoMemory)?;
                Ok(Self(raw))
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                unsafe { sys::$free(self.0) }
            }
        }
    };
}

alsa_object!(CardInfo, sys::snd_ctl_card_info_t, snd_ctl_card_info_malloc, snd_ctl_card_info_free);
alsa_object!(PcmInfo, sys::snd_pcm_info_t, snd_pcm_info_malloc, snd_pcm_info_free);
alsa_object!(HwParams, sys::snd_pcm_hw_params_t, snd_pcm_hw_params_malloc, snd_pcm_hw_params_free);

struct Pcm(*mut sys::snd_pcm_t);

impl Pcm {
    fn open(name: &CStr, purpose: Purpose) -> std::result::Result<Self, alsa::Error> {
        let mut raw = ptr::null_mut();
        check("snd_pcm_open", unsafe {
            sys::snd_pcm_open(&mut raw, name.as_ptr(), stream(purpose), 0)
        })?;
        Ok(Self(raw))
    }
}

impl Drop for Pcm {
    fn drop(&mut self) {
        unsafe { sys::snd_pcm_close(self.0) };
    }
}

unsafe fn read_map(map: &sys::snd_pcm_chmap_t) -> ChannelMap {
    unsafe { map.pos.as_slice(map.channels as usize) }
        .iter()
        .map(|pos| from_alsa_position(*pos))
        .collect()
}

/// Copies out and frees a NULL-terminated list from the chmap query calls.
fn take_maps(list: *mut *mut sys::snd_pcm_chmap_query_t) -> Option<Vec<ChannelMap>> {
    if list.is_null() {
        return None;
    }
    let mut maps = Vec::new();
    unsafe {
        let mut cursor = list;
        while !(*cursor).is_null() {
            maps.push(read_map(&(**cursor).map));
            cursor = cursor.add(1);
        }
        sys::snd_pcm_free_chmaps(list);
    }
    (!maps.is_empty()).then_some(maps)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaSystem;

pub struct AlsaControl {
    ctl: *mut sys::snd_ctl_t,
    card: u32,
}

impl Drop for AlsaControl {
    fn drop(&mut self) {
        unsafe { sys::snd_ctl_close(self.ctl) };
    }
}

impl CardControl for AlsaControl {
    fn card_name(&self) -> Result<String> {
        let info = CardInfo::new()?;
        check("snd_ctl_card_info", unsafe { sys::snd_ctl_card_info(self.ctl, info.0) })
            .map_err(|e| system_error(&format!("card {} info", self.card), e))?;
        Ok(owned_str(unsafe { sys::snd_ctl_card_info_get_name(info.0) }))
    }

    fn pcm_devices(&self) -> Result<Vec<u32>> {
        let mut devices = Vec::new();
        let mut device: c_int = -1;
        loop {
            check("snd_ctl_pcm_next_device", unsafe {
                sys::snd_ctl_pcm_next_device(self.ctl, &mut device)
            })
            .map_err(|e| system_error(&format!("card {} devices", self.card), e))?;
            if device < 0 {
                break;
            }
            devices.push(device as u32);
        }
        Ok(devices)
    }

    fn pcm_name(&self, device: u32, purpose: Purpose) -> Result<Option<String>> {
        let info = PcmInfo::new()?;
        let rc = unsafe {
            sys::snd_pcm_info_set_device(info.0, device as c_uint);
            sys::snd_pcm_info_set_subdevice(info.0, 0);
            sys::snd_pcm_info_set_stream(info.0, stream(purpose));
            sys::snd_ctl_pcm_info(self.ctl, info.0)
        };
        if rc == -libc::ENOENT {
            return Ok(None);
        }
        check("snd_ctl_pcm_info", rc).map_err(|e| {
            system_error(
                &format!("hw:{},{} {} info", self.card, device, purpose.label()),
                e,
            )
        })?;
        Ok(Some(owned_str(unsafe { sys::snd_pcm_info_get_name(info.0) })))
    }
}

impl SoundSystem for AlsaSystem {
    type Control = AlsaControl;

    fn pcm_hints(&self) -> Result<Vec<Hint>> {
        let hints = HintIter::new_str(None, "pcm").map_err(|_| Error::NoMemory)?;
        Ok(hints
            .map(|hint| Hint {
                name: hint.name,
                description: hint.desc,
                direction: hint.direction.map(purpose),
            })
            .collect())
    }

    fn cards(&self) -> Result<Vec<u32>> {
        card::Iter::new()
            .map(|card| {
                card.map(|c| c.get_index() as u32)
                    .map_err(|e| system_error("card iteration", e))
            })
            .collect()
    }

    fn open_control(&self, card: u32) -> Result<Option<AlsaControl>> {
        let name = format!("hw:{card}");
        let c_card = c_name(&name)?;
        let mut ctl = ptr::null_mut();
        let rc = unsafe { sys::snd_ctl_open(&mut ctl, c_card.as_ptr(), 0) };
        if rc == -libc::ENOENT {
            return Ok(None);
        }
        check("snd_ctl_open", rc).map_err(|e| open_error(&name, e))?;
        Ok(Some(AlsaControl { ctl, card }))
    }

    fn open_pcm(&self, name: &str, purpose: Purpose) -> Result<PcmCaps> {
        let failed = |e: alsa::Error| open_error(&format!("{} {}", purpose.label(), name), e);
        let pcm = Pcm::open(&c_name(name)?, purpose).map_err(failed)?;
        let hwp = HwParams::new()?;
        let mut channels: c_uint = 0;
        let mut min = RateBound::default();
        let mut max = RateBound::default();
        unsafe {
            check("snd_pcm_hw_params_any", sys::snd_pcm_hw_params_any(pcm.0, hwp.0))
                .map_err(failed)?;
            check(
                "snd_pcm_hw_params_set_rate_resample",
                sys::snd_pcm_hw_params_set_rate_resample(pcm.0, hwp.0, 0),
            )
            .map_err(failed)?;
            check(
                "snd_pcm_hw_params_set_access",
                sys::snd_pcm_hw_params_set_access(pcm.0, hwp.0, sys::SND_PCM_ACCESS_RW_INTERLEAVED),
            )
            .map_err(failed)?;
            check(
                "snd_pcm_hw_params_set_channels_last",
                sys::snd_pcm_hw_params_set_channels_last(pcm.0, hwp.0, &mut channels),
            )
            .map_err(failed)?;
            check(
                "snd_pcm_hw_params_get_rate_max",
                sys::snd_pcm_hw_params_get_rate_max(hwp.0, &mut max.rate, &mut max.dir),
            )
            .map_err(failed)?;
            check(
                "snd_pcm_hw_params_get_rate_min",
                sys::snd_pcm_hw_params_get_rate_min(hwp.0, &mut min.rate, &mut min.dir),
            )
            .map_err(failed)?;
        }

        let current = unsafe { sys::snd_pcm_get_chmap(pcm.0) };
        let current_map = if current.is_null() {
            None
        } else {
            let map = unsafe { read_map(&*current) };
            unsafe { libc::free(current.cast()) };
            Some(map)
        };
        let offered_maps = if current_map.is_some() {
            Vec::new()
        } else {
            take_maps(unsafe { sys::snd_pcm_query_chmaps(pcm.0) }).unwrap_or_default()
        };
        Ok(PcmCaps {
            current_map,
            offered_maps,
            rate_min: min,
            rate_max: max,
        })
    }

    fn hw_channel_maps(&self, card: u32, device: u32, purpose: Purpose) -> Option<Vec<ChannelMap>> {
        take_maps(unsafe {
            sys::snd_pcm_query_chmaps_from_hw(card as c_int, device as c_int, -1, stream(purpose))
        })
    }
}
