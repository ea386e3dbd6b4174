//! CD-ROM drive emulation on top of disc images.
//!
//! A cue sheet (or a bare ISO) is turned into a [`image::disc::Disc`], a list
//! of tracks laid out in one sector address space. [`image::CdromImage`] serves
//! sector reads from it and drives Redbook audio through the shared
//! [`player::AudioPlayer`], which a host mixer pulls PCM from.
//! [`registry::DriveRegistry`] mounts images as drive letters.

pub mod cd;
pub mod image;
pub mod player;
pub mod registry;
pub mod wav;
