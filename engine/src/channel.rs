use serde::Serialize;

pub const MAX_CHANNELS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelId {
    Invalid,
    FrontLeft,
    FrontRight,
    FrontCenter,
    Lfe,
    BackLeft,
    BackRight,
    FrontLeftCenter,
    FrontRightCenter,
    BackCenter,
    SideLeft,
    SideRight,
    TopCenter,
    TopFrontLeft,
    TopFrontCenter,
    TopFrontRight,
    TopBackLeft,
    TopBackCenter,
    TopBackRight,
    BackLeftCenter,
    BackRightCenter,
    FrontLeftWide,
    FrontRightWide,
    FrontLeftHigh,
    FrontCenterHigh,
    FrontRightHigh,
    TopFrontLeftCenter,
    TopFrontRightCenter,
    TopSideLeft,
    TopSideRight,
    LeftLfe,
    RightLfe,
    BottomCenter,
    BottomLeftCenter,
    BottomRightCenter,
}

/// Translates an ALSA channel-map position (`SND_CHMAP_*`) into a channel role.
pub fn from_alsa_position(pos: u32) -> ChannelId {
    use ChannelId::*;
    match pos {
        2 => FrontCenter, // mono
        3 => FrontLeft,
        4 => FrontRight,
        5 => BackLeft,
        6 => BackRight,
        7 => FrontCenter,
        8 => Lfe,
        9 => SideLeft,
        10 => SideRight,
        11 => BackCenter,
        12 => FrontLeftCenter,
        13 => FrontRightCenter,
        14 => BackLeftCenter,
        15 => BackRightCenter,
        16 => FrontLeftWide,
        17 => FrontRightWide,
        18 => FrontLeftHigh,
        19 => FrontCenterHigh,
        20 => FrontRightHigh,
        21 => TopCenter,
        22 => TopFrontLeft,
        23 => TopFrontRight,
        24 => TopFrontCenter,
        25 => TopBackLeft,
        26 => TopBackRight,
        27 => TopBackCenter,
        28 => TopFrontLeftCenter,
        29 => TopFrontRightCenter,
        30 => TopSideLeft,
        31 => TopSideRight,
        32 => LeftLfe,
        33 => RightLfe,
        34 => BottomCenter,
        35 => BottomLeftCenter,
        36 => BottomRightCenter,
        // unknown, N/A and anything newer than this table
        _ => Invalid,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChannelLayout {
    pub name: Option<&'static str>,
    pub channels: Vec<ChannelId>,
}

impl ChannelLayout {
    pub fn from_channels(channels: impl IntoIterator<Item = ChannelId>) -> Self {
        let mut layout = Self {
            name: None,
            channels: channels.into_iter().take(MAX_CHANNELS).collect(),
        };
        layout.name = detect_builtin(&layout.channels);
        layout
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

use ChannelId::{
    BackCenter as BC, BackLeft as BL, BackRight as BR, FrontCenter as FC, FrontLeft as FL,
    FrontLeftCenter as FLC, FrontRight as FR, FrontRightCenter as FRC, Lfe as LFE,
    SideLeft as SL, SideRight as SR,
};

const BUILTIN_LAYOUTS: &[(&str, &[ChannelId])] = &[
    ("Mono", &[FC]),
    ("Stereo", &[FL, FR]),
    ("2.1", &[FL, FR, LFE]),
    ("3.0", &[FL, FR, FC]),
    ("3.0 (back)", &[FL, FR, BC]),
    ("3.1", &[FL, FR, FC, LFE]),
    ("4.0", &[FL, FR, FC, BC]),
    ("Quad", &[FL, FR, BL, BR]),
    ("Quad (side)", &[FL, FR, SL, SR]),
    ("4.1", &[FL, FR, BL, BR, LFE]),
    ("5.0 (back)", &[FL, FR, FC, BL, BR]),
    ("5.0 (side)", &[FL, FR, FC, SL, SR]),
    ("5.1", &[FL, FR, FC, SL, SR, LFE]),
    ("5.1 (back)", &[FL, FR, FC, BL, BR, LFE]),
    ("6.0 (side)", &[FL, FR, FC, SL, SR, BC]),
    ("6.0 (front)", &[FL, FR, SL, SR, FLC, FRC]),
    ("Hexagonal", &[FL, FR, FC, BL, BR, BC]),
    ("6.1", &[FL, FR, FC, SL, SR, BC, LFE]),
    ("6.1 (back)", &[FL, FR, FC, BL, BR, BC, LFE]),
    ("6.1 (front)", &[FL, FR, SL, SR, FLC, FRC, LFE]),
    ("7.0", &[FL, FR, FC, SL, SR, BL, BR]),
    ("7.0 (front)", &[FL, FR, FC, SL, SR, FLC, FRC]),
    ("7.1", &[FL, FR, FC, SL, SR, BL, BR, LFE]),
    ("7.1 (wide)", &[FL, FR, FC, SL, SR, FLC, FRC, LFE]),
    ("7.1 (wide back)", &[FL, FR, FC, BL, BR, FLC, FRC, LFE]),
    ("Octagonal", &[FL, FR, FC, SL, SR, BL, BR, BC]),
];

/// Finds the builtin layout carrying exactly the same set of channel roles,
/// whatever order the hardware reports them in.
pub fn detect_builtin(channels: &[ChannelId]) -> Option<&'static str> {
    BUILTIN_LAYOUTS.iter().find_map(|(name, layout)| {
        let same = layout.len() == channels.len()
            && layout.iter().all(|id| channels.contains(id))
            && channels.iter().all(|id| layout.contains(id));
        same.then_some(*name)
    })
}
