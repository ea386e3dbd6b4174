use byteorder::{ByteOrder, NativeEndian};
use std::sync::Arc;

#[cfg(target_endian = "little")]
type NonNativeEndian = byteorder::BigEndian;
#[cfg(target_endian = "big")]
type NonNativeEndian = byteorder::LittleEndian;

/// Pull handler the mixer calls with the number of frames it wants.
pub type ChannelHandler = Box<dyn Fn(usize) + Send + Sync>;

/// One output channel of the host mixer.
pub trait MixerChannel: Send + Sync {
    fn enable(&self, enabled: bool);
    fn set_freq(&self, rate: u32);
    fn set_scale(&self, left: f32, right: f32);
    fn map_channels(&self, left: u8, right: u8);
    /// Interleaved stereo, `frames * 2` samples.
    fn add_samples_s16(&self, frames: usize, samples: &[i16]);
    fn add_samples_m16(&self, frames: usize, samples: &[i16]);
}

pub trait Mixer: Send + Sync {
    fn add_channel(&self, handler: ChannelHandler, rate: u32, name: &str) -> Arc<dyn MixerChannel>;
    fn del_channel(&self, channel: &Arc<dyn MixerChannel>);
}

/// Forwards `frames` frames of raw PCM bytes to a channel.
pub type AddFrames = fn(&dyn MixerChannel, usize, &[u8]);

fn samples<E: ByteOrder>(bytes: &[u8]) -> Vec<i16> {
    let mut samples = vec![0i16; bytes.len() / 2];
    E::read_i16_into(&bytes[..samples.len() * 2], &mut samples);
    samples
}

fn add_stereo_native(channel: &dyn MixerChannel, frames: usize, bytes: &[u8]) {
    channel.add_samples_s16(frames, &samples::<NativeEndian>(bytes));
}

fn add_mono_native(channel: &dyn MixerChannel, frames: usize, bytes: &[u8]) {
    channel.add_samples_m16(frames, &samples::<NativeEndian>(bytes));
}

fn add_stereo_non_native(channel: &dyn MixerChannel, frames: usize, bytes: &[u8]) {
    channel.add_samples_s16(frames, &samples::<NonNativeEndian>(bytes));
}

fn add_mono_non_native(channel: &dyn MixerChannel, frames: usize, bytes: &[u8]) {
    channel.add_samples_m16(frames, &samples::<NonNativeEndian>(bytes));
}

/// Picks the forwarding function for a source's channel count and byte order.
pub fn select_add_frames(channels: u8, native: bool) -> AddFrames {
    match (channels == 2, native) {
        (true, true) => add_stereo_native,
        (false, true) => add_mono_native,
        (true, false) => add_stereo_non_native,
        (false, false) => add_mono_non_native,
    }
}
