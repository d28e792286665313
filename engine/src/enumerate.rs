use crate::{
    device::{Device, Purpose, Snapshot},
    error::Result,
    native::{CardControl, Hint, SoundSystem},
    probe::probe,
};
use tracing::{debug, warn};

const DEFAULT_PREFIX: &str = "default:";

/// Runs one full sweep: named hints first, then raw hardware devices.
/// Any subsystem failure discards everything built so far; probe failures
/// only mark the affected device.
pub fn enumerate<S: SoundSystem + ?Sized>(system: &S, preferred_rate: u32) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    add_hint_devices(system, &mut snapshot, preferred_rate)?;
    add_hardware_devices(system, &mut snapshot, preferred_rate)?;
    debug!(
        "sweep found {} outputs, {} inputs",
        snapshot.outputs().len(),
        snapshot.inputs().len()
    );
    Ok(snapshot)
}

fn add_hint_devices<S: SoundSystem + ?Sized>(
    system: &S,
    snapshot: &mut Snapshot,
    preferred_rate: u32,
) -> Result<()> {
    for hint in system.pcm_hints()? {
        let Some(name) = hint.name.as_deref() else {
            continue;
        };
        if is_excluded_name(name) {
            continue;
        }
        let description = compose_description(hint.description.as_deref().unwrap_or(""));
        for purpose in hint_purposes(&hint) {
            if purpose == Purpose::Input && mentions_output(&description) {
                continue;
            }
            let mut device = Device::new(name.to_string(), description.clone(), purpose, false);
            if let Err(e) = probe(system, &mut device, None, preferred_rate) {
                warn!("probing {} {} failed: {}", purpose.label(), name, e);
                device.probe_error = Some(e);
            }
            snapshot.push(device, name.starts_with(DEFAULT_PREFIX));
        }
    }
    Ok(())
}

fn add_hardware_devices<S: SoundSystem + ?Sized>(
    system: &S,
    snapshot: &mut Snapshot,
    preferred_rate: u32,
) -> Result<()> {
    for card in system.cards()? {
        let Some(control) = system.open_control(card)? else {
            debug!("card {} disappeared during the sweep", card);
            break;
        };
        let card_name = control.card_name()?;
        for pcm in control.pcm_devices()? {
            for purpose in Purpose::ALL {
                let Some(pcm_name) = control.pcm_name(pcm, purpose)? else {
                    continue;
                };
                let mut device = Device::new(
                    format!("hw:{card},{pcm}"),
                    format!("{card_name} {pcm_name}"),
                    purpose,
                    true,
                );
                let maps = system.hw_channel_maps(card, pcm, purpose);
                if let Err(e) = probe(system, &mut device, maps, preferred_rate) {
                    warn!("probing {} {} failed: {}", purpose.label(), device.name, e);
                    device.probe_error = Some(e);
                }
                snapshot.push(device, false);
            }
        }
    }
    Ok(())
}

/// Hints that add clutter without adding a capability: the `null` sink, the
/// `sysdefault:` alias of `default:`, and the fixed-layout speaker aliases.
pub fn is_excluded_name(name: &str) -> bool {
    name == "null"
        || name.starts_with("sysdefault:")
        || name.starts_with("front:")
        || is_surround_alias(name)
}

fn is_surround_alias(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("surround") else {
        return false;
    };
    match rest.split_once(':') {
        Some((digits, _)) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

pub fn compose_description(raw: &str) -> String {
    match raw.split_once('\n') {
        Some((first, second)) => format!("{first}: {second}"),
        None => raw.to_string(),
    }
}

pub fn hint_purposes(hint: &Hint) -> Vec<Purpose> {
    match hint.direction {
        Some(purpose) => vec![purpose],
        None => Purpose::ALL.to_vec(),
    }
}

fn mentions_output(description: &str) -> bool {
    description.to_ascii_lowercase().contains("output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_noise_hints() {
        assert!(is_excluded_name("null"));
        assert!(is_excluded_name("sysdefault:CARD=PCH"));
        assert!(is_excluded_name("front:CARD=PCH,DEV=0"));
        assert!(is_excluded_name("surround51:CARD=PCH,DEV=0"));
        assert!(is_excluded_name("surround71:CARD=PCH,DEV=0"));
        assert!(is_excluded_name("surround21:CARD=PCH,DEV=0"));

        assert!(!is_excluded_name("nullsink"));
        assert!(!is_excluded_name("default"));
        assert!(!is_excluded_name("default:CARD=PCH"));
        assert!(!is_excluded_name("surround:CARD=PCH"));
        assert!(!is_excluded_name("surroundx:CARD=PCH"));
        assert!(!is_excluded_name("dmix:CARD=PCH,DEV=0"));
    }

    #[test]
    fn composes_two_line_descriptions() {
        assert_eq!(
            compose_description("Built-in Audio\nAnalog Output"),
            "Built-in Audio: Analog Output"
        );
        assert_eq!(compose_description("PulseAudio"), "PulseAudio");
        assert_eq!(compose_description(""), "");
    }

    #[test]
    fn undirected_hint_serves_both_purposes() {
        let hint = Hint {
            name: Some("pulse".into()),
            description: None,
            direction: None,
        };
        assert_eq!(hint_purposes(&hint), vec![Purpose::Output, Purpose::Input]);

        let hint = Hint {
            direction: Some(Purpose::Input),
            ..hint
        };
        assert_eq!(hint_purposes(&hint), vec![Purpose::Input]);
    }

    #[test]
    fn output_mention_is_case_insensitive() {
        assert!(mentions_output("HDA Intel: Analog OUTPUT"));
        assert!(mentions_output("Built-in Audio: Analog Output"));
        assert!(!mentions_output("USB Mic: Analog Input"));
    }
}
