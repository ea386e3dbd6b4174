use crate::commands::audio::RipCommand;
use crate::commands::image::{InfoCommand, ReadCommand};
use anyhow::{Context, Result, bail};
use cdrom_image::cd::{
    BYTES_PER_COOKED_REDBOOK_FRAME, BYTES_PER_RAW_REDBOOK_FRAME, REDBOOK_FRAMES_PER_SECOND,
    REDBOOK_PCM_FRAMES_PER_SECOND, sector_to_absolute_msf,
};
use cdrom_image::image::CdromImage;
use cdrom_image::player::AudioPlayer;
use cdrom_image::player::capture::CaptureMixer;
use cdrom_image::registry::DriveRegistry;
use cdrom_image::wav::write_wav;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";
const SECTORS_PER_CHUNK: u32 = 64;

fn progress_bar(pb: &MultiProgress, len: u64) -> Result<ProgressBar> {
    let bar = pb.add(ProgressBar::new(len));
    bar.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

fn check_output(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            output.display()
        );
    }
    Ok(())
}

pub fn print_info(cmd: InfoCommand) -> Result<()> {
    let image = CdromImage::open(&cmd.input, AudioPlayer::detached())?;
    let disc = image.disc();

    println!("Image:      {}", cmd.input.display());
    if !disc.mcn().is_empty() {
        println!("Catalog:    {}", disc.mcn());
    }
    println!("Data track: {}", if image.has_data_track() { "yes" } else { "no" });
    println!();
    println!("  #  type    start   length  sector  mode2  skip        position  file");

    let tracks = disc.tracks();
    let playable = &tracks[..tracks.len().saturating_sub(1)];
    for track in playable {
        println!(
            " {:>2}  {:<6} {:>7}  {:>7}  {:>6}  {:<5}  {:<10}  {}  {}",
            track.number,
            if track.is_audio() { "audio" } else { "data" },
            track.start,
            track.length,
            track.sector_size,
            track.mode2,
            track.skip,
            sector_to_absolute_msf(track.start),
            track
                .file
                .as_ref()
                .and_then(|file| file.path().file_name())
                .map(|name| name.to_string_lossy())
                .unwrap_or_default()
        );
    }

    let audio = image.audio_tracks()?;
    println!();
    println!(
        "Tracks {}-{}, lead-out at {}",
        audio.first, audio.last, audio.lead_out
    );
    Ok(())
}

pub fn read_sectors(pb: MultiProgress, cmd: ReadCommand) -> Result<()> {
    check_output(&cmd.output, cmd.force)?;

    let image = CdromImage::open(&cmd.input, AudioPlayer::detached())?;
    let lead_out = image
        .disc()
        .lead_out()
        .map(|track| track.start)
        .unwrap_or_default();
    let count = match cmd.count {
        Some(count) => count,
        None => lead_out.saturating_sub(cmd.start),
    };

    let sector_size = (if cmd.raw {
        BYTES_PER_RAW_REDBOOK_FRAME
    } else {
        BYTES_PER_COOKED_REDBOOK_FRAME
    }) as usize;

    debug!(
        "Reading {count} sectors of {sector_size} bytes from sector {}",
        cmd.start
    );

    let bar = progress_bar(&pb, count as u64)?;
    let mut writer = BufWriter::new(File::create(&cmd.output)?);
    let mut buffer = vec![0u8; sector_size * SECTORS_PER_CHUNK as usize];

    let mut done = 0;
    while done < count {
        let chunk = (count - done).min(SECTORS_PER_CHUNK);
        let bytes = chunk as usize * sector_size;
        let sector = cmd.start + done;
        image
            .read_sectors(&mut buffer[..bytes], cmd.raw, sector, chunk)
            .with_context(|| format!("Failed to read sectors starting at {sector}"))?;
        writer.write_all(&buffer[..bytes])?;

        done += chunk;
        bar.inc(chunk as u64);
    }
    writer.flush()?;
    bar.finish_with_message("Read complete");

    info!("Wrote {count} sectors to {}", cmd.output.display());
    Ok(())
}

pub fn rip_audio(pb: MultiProgress, cmd: RipCommand) -> Result<()> {
    check_output(&cmd.output, cmd.force)?;
    if cmd.frames == 0 {
        bail!("--frames must be at least 1");
    }

    let mixer = Arc::new(CaptureMixer::new());
    let mut registry = DriveRegistry::new(mixer.clone());
    let image = registry.mount(0, &cmd.input)?;

    let (start, length) = match (cmd.track, cmd.start, cmd.length) {
        (Some(number), _, _) => {
            let track = image
                .disc()
                .tracks()
                .iter()
                .rev()
                .skip(1)
                .find(|track| track.number == number)
                .with_context(|| format!("Track {number} does not exist"))?;
            if !track.is_audio() {
                bail!("Track {number} is a data track");
            }
            (track.start, track.length)
        }
        (None, Some(start), Some(length)) => (start, length),
        _ => bail!("Either --track or --start together with --length is required"),
    };

    image.play_audio_sector(start, length)?;

    let channel = mixer
        .channels()
        .into_iter()
        .next()
        .context("The audio player did not register a mixer channel")?;
    let total_frames =
        (channel.freq() as u64 * length as u64).div_ceil(REDBOOK_FRAMES_PER_SECOND as u64);

    let bar = progress_bar(&pb, total_frames)?;
    while channel.pump(cmd.frames) {
        bar.set_position(channel.frames() as u64);
    }
    bar.finish_with_message("Rip complete");

    let rate = match channel.freq() {
        0 => REDBOOK_PCM_FRAMES_PER_SECOND,
        rate => rate,
    };
    let samples = channel.take_samples();
    let mut writer = BufWriter::new(File::create(&cmd.output)?);
    write_wav(&mut writer, 2, rate, &samples)?;

    info!(
        "Ripped {} frames ({length} sectors from sector {start}) to {}",
        samples.len() / 2,
        cmd.output.display()
    );
    Ok(())
}
