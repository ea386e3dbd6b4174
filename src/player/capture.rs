use crate::player::mixer::{ChannelHandler, Mixer, MixerChannel};
use std::sync::{Arc, Mutex, MutexGuard};

/// An in-process mixer that records what its channels are told to play.
/// Frames are only pulled when `pump` is called.
#[derive(Default)]
pub struct CaptureMixer {
    channels: Mutex<Vec<Arc<CaptureChannel>>>,
}

impl CaptureMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels currently registered.
    pub fn channels(&self) -> Vec<Arc<CaptureChannel>> {
        lock(&self.channels).clone()
    }
}

impl Mixer for CaptureMixer {
    fn add_channel(
        &self,
        handler: ChannelHandler,
        rate: u32,
        name: &str,
    ) -> Arc<dyn MixerChannel> {
        let channel = Arc::new(CaptureChannel {
            name: name.to_string(),
            handler,
            state: Mutex::new(CaptureState {
                freq: rate,
                scale: [1.0, 1.0],
                map: [0, 1],
                ..CaptureState::default()
            }),
        });
        lock(&self.channels).push(channel.clone());
        channel
    }

    fn del_channel(&self, channel: &Arc<dyn MixerChannel>) {
        let target = Arc::as_ptr(channel) as *const ();
        lock(&self.channels).retain(|c| Arc::as_ptr(c) as *const () != target);
    }
}

#[derive(Debug, Default)]
struct CaptureState {
    enabled: bool,
    freq: u32,
    scale: [f32; 2],
    map: [u8; 2],
    samples: Vec<i16>,
}

pub struct CaptureChannel {
    name: String,
    handler: ChannelHandler,
    state: Mutex<CaptureState>,
}

impl CaptureChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks the channel's producer for `frames` frames, as the mixer thread
    /// would. Returns false without calling it while the channel is disabled.
    pub fn pump(&self, frames: usize) -> bool {
        if !self.is_enabled() {
            return false;
        }
        (self.handler)(frames);
        true
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    pub fn freq(&self) -> u32 {
        lock(&self.state).freq
    }

    pub fn scale(&self) -> [f32; 2] {
        lock(&self.state).scale
    }

    pub fn map(&self) -> [u8; 2] {
        lock(&self.state).map
    }

    /// Stereo frames collected so far.
    pub fn frames(&self) -> usize {
        lock(&self.state).samples.len() / 2
    }

    /// Drains the interleaved stereo samples collected so far.
    pub fn take_samples(&self) -> Vec<i16> {
        std::mem::take(&mut lock(&self.state).samples)
    }
}

impl MixerChannel for CaptureChannel {
    fn enable(&self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    fn set_freq(&self, rate: u32) {
        lock(&self.state).freq = rate;
    }

    fn set_scale(&self, left: f32, right: f32) {
        lock(&self.state).scale = [left, right];
    }

    fn map_channels(&self, left: u8, right: u8) {
        lock(&self.state).map = [left, right];
    }

    fn add_samples_s16(&self, frames: usize, samples: &[i16]) {
        let count = (frames * 2).min(samples.len());
        lock(&self.state).samples.extend_from_slice(&samples[..count]);
    }

    fn add_samples_m16(&self, frames: usize, samples: &[i16]) {
        let count = frames.min(samples.len());
        lock(&self.state)
            .samples
            .extend(samples[..count].iter().flat_map(|&sample| [sample, sample]));
    }
}

// Capture state stays usable after a panicking producer.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
