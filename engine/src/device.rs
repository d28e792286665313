use crate::{channel::ChannelLayout, error::Error};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Purpose {
    Output,
    Input,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::Output, Purpose::Input];

    pub fn label(self) -> &'static str {
        match self {
            Purpose::Output => "output",
            Purpose::Input => "input",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub name: String,
    pub description: String,
    pub purpose: Purpose,
    pub is_raw: bool,
    pub layout: ChannelLayout,
    pub sample_rate_min: u32,
    pub sample_rate_max: u32,
    pub sample_rate_default: u32,
    #[serde(skip)]
    pub probe_error: Option<Error>,
}

impl Device {
    pub fn new(name: String, description: String, purpose: Purpose, is_raw: bool) -> Self {
        Self {
            name,
            description,
            purpose,
            is_raw,
            layout: ChannelLayout::default(),
            sample_rate_min: 0,
            sample_rate_max: 0,
            sample_rate_default: 0,
            probe_error: None,
        }
    }

    pub fn is_probed(&self) -> bool {
        self.probe_error.is_none() && self.sample_rate_max > 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    outputs: Vec<Arc<Device>>,
    inputs: Vec<Arc<Device>>,
    default_output: Option<usize>,
    default_input: Option<usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device to the list matching its purpose and returns its
    /// position there. `is_default` records that position as the default.
    pub(crate) fn push(&mut self, device: Device, is_default: bool) -> usize {
        let purpose = device.purpose;
        let (list, default) = match purpose {
            Purpose::Output => (&mut self.outputs, &mut self.default_output),
            Purpose::Input => (&mut self.inputs, &mut self.default_input),
        };
        let idx = list.len();
        list.push(Arc::new(device));
        if is_default {
            *default = Some(idx);
        }
        idx
    }

    pub fn devices(&self, purpose: Purpose) -> &[Arc<Device>] {
        match purpose {
            Purpose::Output => &self.outputs,
            Purpose::Input => &self.inputs,
        }
    }

    pub fn outputs(&self) -> &[Arc<Device>] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[Arc<Device>] {
        &self.inputs
    }

    pub fn count(&self, purpose: Purpose) -> usize {
        self.devices(purpose).len()
    }

    pub fn device(&self, purpose: Purpose, idx: usize) -> Option<Arc<Device>> {
        self.devices(purpose).get(idx).cloned()
    }

    pub fn default_index(&self, purpose: Purpose) -> Option<usize> {
        match purpose {
            Purpose::Output => self.default_output,
            Purpose::Input => self.default_input,
        }
    }

    pub fn default_device(&self, purpose: Purpose) -> Option<Arc<Device>> {
        self.default_index(purpose)
            .and_then(|idx| self.device(purpose, idx))
    }

    pub fn find(&self, purpose: Purpose, name: &str) -> Option<Arc<Device>> {
        self.devices(purpose)
            .iter()
            .find(|device| device.name == name)
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.inputs.is_empty()
    }
}
