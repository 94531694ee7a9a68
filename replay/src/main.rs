#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod driver;
mod savestate;

use abstutil::Timer;
use anyhow::Result;
use structopt::StructOpt;

use journey::{format_clock, Journey, JourneyPlayer, TimingConfig};

use self::driver::Driver;
use self::savestate::Savestate;

#[derive(StructOpt)]
struct Args {
    /// The path to a journey JSON file, listing tracks and transports
    #[structopt(long)]
    journey: String,
    /// The path to a JSON file with timing settings. Defaults are used otherwise.
    #[structopt(long)]
    config: Option<String>,
    /// Frames per real second
    #[structopt(long, default_value = "60")]
    fps: f64,
    /// Playback speed multiplier, from 0.1 to 64
    #[structopt(long)]
    speed: Option<f64>,
    /// Resume from and save playback position to this file
    #[structopt(long)]
    savestate: Option<String>,
    /// Write the timing table as CSV here
    #[structopt(long)]
    export_timing: Option<String>,
    /// Write segments with their timing as GeoJSON here
    #[structopt(long)]
    export_geojson: Option<String>,
    /// Log progress every this many seconds of journey time
    #[structopt(long, default_value = "10")]
    report_every: f64,
    /// Start from this fraction of the route, from 0 to 1
    #[structopt(long)]
    seek: Option<f64>,
}

impl Args {
    fn load(&self, timer: &mut Timer) -> Result<JourneyPlayer> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            bail!("--fps must be positive, not {}", self.fps);
        }
        if let Some(progress) = self.seek {
            if !(0.0..=1.0).contains(&progress) {
                bail!("--seek must be between 0 and 1, not {progress}");
            }
        }

        timer.start("load journey");
        let journey = Journey::load_file(&self.journey)?;
        timer.stop("load journey");

        let config = match self.config {
            Some(ref path) => TimingConfig::load(path)?,
            None => TimingConfig::default(),
        };
        Ok(JourneyPlayer::new(journey, config))
    }

    fn export(&self, player: &JourneyPlayer) -> Result<()> {
        let table = player.clock().table();
        if let Some(ref path) = self.export_timing {
            fs_err::write(path, table.export_to_csv(player.segments())?)?;
            info!("Wrote timing table to {path}");
        }
        if let Some(ref path) = self.export_geojson {
            fs_err::write(path, player.journey().export_to_geojson(table)?)?;
            info!("Wrote segments to {path}");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    let mut timer = Timer::new("replay journey");
    let mut player = args.load(&mut timer)?;
    args.export(&player)?;

    if player.segments().is_empty() {
        warn!("{} has nothing to play", args.journey);
        return Ok(());
    }
    info!(
        "{} segments, {} long",
        player.segments().len(),
        format_clock(player.clock().total_duration())
    );

    let mut restored = false;
    if let Some(ref path) = args.savestate {
        restored = Savestate::restore(path, &args.journey, player.clock_mut());
    }
    if let Some(speed) = args.speed {
        player.clock_mut().set_speed_multiplier(speed);
    }
    if let Some(progress) = args.seek {
        player.clock_mut().seek_to_progress(progress);
    } else if restored && player.clock().spatial_progress() >= 1.0 {
        // The last run finished; start over
        player.clock_mut().reset();
    }

    let mut driver = Driver::new(player, args.fps, args.report_every);
    let summary = driver.run();
    info!(
        "Finished after {} frames and {} updates, entering {} segments. Resynced {} times",
        summary.frames, summary.updates, summary.segments_entered, summary.resyncs
    );

    if let Some(ref path) = args.savestate {
        Savestate::capture(&args.journey, driver.player().clock()).save(path);
    }
    Ok(())
}
