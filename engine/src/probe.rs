use crate::{
    channel::ChannelLayout,
    device::Device,
    error::Result,
    native::{ChannelMap, PcmCaps, RateBound, SoundSystem},
};
use tracing::debug;

/// `maps` known for the hardware path win over what the open handle reports.
pub fn probe<S: SoundSystem + ?Sized>(
    system: &S,
    device: &mut Device,
    maps: Option<Vec<ChannelMap>>,
    preferred_rate: u32,
) -> Result<()> {
    let caps = match system.open_pcm(&device.name, device.purpose) {
        Ok(caps) => caps,
        Err(e) => {
            if let Some(maps) = maps.as_deref() {
                apply_best_map(device, maps);
            }
            return Err(e);
        }
    };
    apply_caps(device, caps, maps, preferred_rate);
    debug!(
        "probed {} {}: {} channels ({}) {}..{} Hz",
        device.purpose.label(),
        device.name,
        device.layout.channel_count(),
        device.layout.name.unwrap_or("custom"),
        device.sample_rate_min,
        device.sample_rate_max
    );
    Ok(())
}

fn apply_caps(
    device: &mut Device,
    caps: PcmCaps,
    maps: Option<Vec<ChannelMap>>,
    preferred_rate: u32,
) {
    let PcmCaps {
        current_map,
        offered_maps,
        rate_min,
        rate_max,
    } = caps;

    let maps = match current_map {
        Some(map) => {
            device.layout = ChannelLayout::from_channels(map);
            maps
        }
        None => maps.or(Some(offered_maps)),
    };
    if let Some(maps) = maps.as_deref() {
        apply_best_map(device, maps);
    }

    let (min, max) = rate_range(rate_min, rate_max);
    device.sample_rate_min = min;
    device.sample_rate_max = max;
    device.sample_rate_default = default_rate(min, max, preferred_rate);
}

fn apply_best_map(device: &mut Device, maps: &[ChannelMap]) {
    if let Some(best) = best_map(maps) {
        device.layout = ChannelLayout::from_channels(best.iter().copied());
    }
}

pub fn best_map(maps: &[ChannelMap]) -> Option<&ChannelMap> {
    maps.iter()
        .fold(None, |best: Option<&ChannelMap>, map| match best {
            Some(b) if b.len() >= map.len() => Some(b),
            _ => Some(map),
        })
}

/// Narrows open bounds to the closest rate that is actually supported.
pub fn rate_range(min: RateBound, max: RateBound) -> (u32, u32) {
    let min_rate = if min.dir > 0 {
        min.rate.saturating_add(1)
    } else {
        min.rate
    };
    let max_rate = if max.dir < 0 {
        max.rate.saturating_sub(1)
    } else {
        max.rate
    };
    (min_rate, max_rate)
}

pub fn default_rate(min: u32, max: u32, preferred: u32) -> u32 {
    if (min..=max).contains(&preferred) {
        preferred
    } else {
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId::{self, *};

    #[test]
    fn picks_widest_map() {
        let maps: Vec<ChannelMap> = vec![
            vec![FrontLeft, FrontRight],
            vec![FrontLeft, FrontRight, FrontCenter, Lfe, SideLeft, SideRight],
        ];
        assert_eq!(best_map(&maps).map(Vec::len), Some(6));
        assert!(best_map(&[]).is_none());
    }

    #[test]
    fn widest_map_tie_keeps_first() {
        let maps: Vec<ChannelMap> = vec![
            vec![FrontLeft, FrontRight],
            vec![SideLeft, SideRight],
        ];
        assert_eq!(best_map(&maps), Some(&vec![FrontLeft, FrontRight]));
    }

    #[test]
    fn corrects_open_bounds() {
        let min = RateBound { rate: 4000, dir: 1 };
        let max = RateBound { rate: 192_000, dir: -1 };
        assert_eq!(rate_range(min, max), (4001, 191_999));
        assert_eq!(
            rate_range(RateBound::exact(8000), RateBound::exact(96_000)),
            (8000, 96_000)
        );
        // an inward direction on the wrong side is not an open bound
        let min = RateBound { rate: 8000, dir: -1 };
        let max = RateBound { rate: 96_000, dir: 1 };
        assert_eq!(rate_range(min, max), (8000, 96_000));
    }

    #[test]
    fn default_rate_prefers_48k_in_range() {
        assert_eq!(default_rate(8000, 192_000, 48_000), 48_000);
        assert_eq!(default_rate(48_000, 48_000, 48_000), 48_000);
        assert_eq!(default_rate(8000, 44_100, 48_000), 44_100);
        assert_eq!(default_rate(88_200, 192_000, 48_000), 192_000);
    }

    #[test]
    fn current_map_is_overridden_by_known_maps() {
        let mut device = Device::new(
            "hw:0,0".into(),
            "Card".into(),
            crate::device::Purpose::Output,
            true,
        );
        let caps = PcmCaps {
            current_map: Some(vec![FrontLeft, FrontRight]),
            offered_maps: vec![],
            rate_min: RateBound::exact(44_100),
            rate_max: RateBound::exact(96_000),
        };
        let known: Vec<Vec<ChannelId>> = vec![vec![FrontLeft, FrontRight, FrontCenter, BackCenter]];
        apply_caps(&mut device, caps, Some(known), 48_000);
        assert_eq!(device.layout.name, Some("4.0"));
        assert_eq!(device.sample_rate_min, 44_100);
        assert_eq!(device.sample_rate_max, 96_000);
        assert_eq!(device.sample_rate_default, 48_000);
    }

    #[test]
    fn offered_maps_used_without_current_map() {
        let mut device = Device::new(
            "default".into(),
            "Default".into(),
            crate::device::Purpose::Input,
            false,
        );
        let caps = PcmCaps {
            current_map: None,
            offered_maps: vec![vec![FrontCenter]],
            rate_min: RateBound::exact(8000),
            rate_max: RateBound::exact(16_000),
        };
        apply_caps(&mut device, caps, None, 48_000);
        assert_eq!(device.layout.name, Some("Mono"));
        assert_eq!(device.sample_rate_default, 16_000);
    }
}
