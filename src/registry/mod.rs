pub mod error;

use crate::image::CdromImage;
use crate::image::cue::path::{HostPathResolver, PathResolver};
use crate::player::AudioPlayer;
use crate::player::mixer::Mixer;
use crate::registry::error::{RegistryError, RegistryResult};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

pub const MAX_DRIVES: usize = 26;

pub fn drive_letter(drive: usize) -> char {
    (b'A' + drive as u8) as char
}

/// Maps `A`..`Z` (either case) to a drive index.
pub fn drive_index(letter: char) -> Option<usize> {
    let letter = letter.to_ascii_uppercase();
    letter
        .is_ascii_uppercase()
        .then(|| (letter as u8 - b'A') as usize)
}

/// Mounted images by drive letter. All drives share one audio player, whose
/// mixer channel exists while at least one image is mounted.
pub struct DriveRegistry {
    mixer: Arc<dyn Mixer>,
    resolver: Arc<dyn PathResolver>,
    drives: Vec<Option<CdromImage>>,
    player: Option<Arc<AudioPlayer>>,
}

impl DriveRegistry {
    pub fn new(mixer: Arc<dyn Mixer>) -> Self {
        Self {
            mixer,
            resolver: Arc::new(HostPathResolver),
            drives: (0..MAX_DRIVES).map(|_| None).collect(),
            player: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    fn check_drive(drive: usize) -> RegistryResult<()> {
        if drive >= MAX_DRIVES {
            return Err(RegistryError::InvalidDrive(drive));
        }
        Ok(())
    }

    fn shared_player(&mut self) -> Arc<AudioPlayer> {
        self.player
            .get_or_insert_with(|| {
                debug!("Creating the shared CD audio player");
                AudioPlayer::attach(self.mixer.as_ref())
            })
            .clone()
    }

    pub fn mount(&mut self, drive: usize, path: impl AsRef<Path>) -> RegistryResult<&CdromImage> {
        Self::check_drive(drive)?;
        if self.drives[drive].is_some() {
            return Err(RegistryError::DriveInUse(drive_letter(drive)));
        }

        let player = self.shared_player();
        let mut image = CdromImage::new(player).with_resolver(self.resolver.clone());
        if let Err(e) = image.set_device(path.as_ref()) {
            drop(image);
            self.release_player_if_unused();
            return Err(e.into());
        }

        info!(
            "Drive {}: mounted {}",
            drive_letter(drive),
            path.as_ref().display()
        );
        Ok(self.drives[drive].insert(image))
    }

    pub fn unmount(&mut self, drive: usize) -> RegistryResult<()> {
        Self::check_drive(drive)?;
        let image = self.drives[drive]
            .take()
            .ok_or(RegistryError::NotMounted(drive_letter(drive)))?;
        drop(image);
        debug!("Drive {}: unmounted", drive_letter(drive));

        self.release_player_if_unused();
        Ok(())
    }

    fn release_player_if_unused(&mut self) {
        if self.mounted_count() > 0 {
            return;
        }
        if let Some(player) = self.player.take() {
            player.stop_audio();
            if let Some(channel) = player.channel() {
                self.mixer.del_channel(channel);
            }
            debug!("Released the shared CD audio player");
        }
    }

    pub fn drive(&self, drive: usize) -> Option<&CdromImage> {
        self.drives.get(drive)?.as_ref()
    }

    pub fn mounted_count(&self) -> usize {
        self.drives.iter().filter(|drive| drive.is_some()).count()
    }

    pub fn player(&self) -> Option<&Arc<AudioPlayer>> {
        self.player.as_ref()
    }
}

impl Drop for DriveRegistry {
    fn drop(&mut self) {
        for drive in &mut self.drives {
            *drive = None;
        }
        self.release_player_if_unused();
    }
}
